pub mod alerts;
pub mod contact;
pub mod customer;
pub mod dashboard;
pub mod payment;
pub mod plan;
pub mod registration;
pub mod renewal;
pub mod schema;
pub mod subscription;

use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;

use subhub_core::ServiceError;
use subhub_sql::{SQLStore, Value};

/// CRM service — owns the store and provides all business logic.
pub struct CrmService {
    pub(crate) sql: Box<dyn SQLStore>,
}

impl CrmService {
    pub fn new(sql: Box<dyn SQLStore>) -> Result<Self, ServiceError> {
        schema::init_schema(sql.as_ref())?;
        Ok(Self { sql })
    }

    // ── Generic CRUD helpers ──

    /// Insert a record as JSON into a table with indexed columns.
    pub(crate) fn insert_record<T: Serialize>(
        &self,
        table: &str,
        id: &str,
        record: &T,
        indexes: &[(&str, Value)],
    ) -> Result<(), ServiceError> {
        let (sql, params) = insert_stmt(table, id, record, indexes)?;
        self.sql.exec(&sql, &params).map_err(|e| {
            let msg = e.to_string();
            if msg.contains("UNIQUE constraint") {
                ServiceError::Conflict(msg)
            } else {
                ServiceError::Storage(msg)
            }
        })?;
        Ok(())
    }

    /// Get a record by id, deserializing the JSON `data` column.
    pub(crate) fn get_record<T: DeserializeOwned>(
        &self,
        table: &str,
        id: &str,
    ) -> Result<T, ServiceError> {
        let sql = format!("SELECT data FROM {} WHERE id = ?1", table);
        let rows = self
            .sql
            .query(&sql, &[Value::Text(id.to_string())])
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        let row = rows
            .first()
            .ok_or_else(|| ServiceError::NotFound(format!("{}/{}", table, id)))?;
        let data = row
            .get_str("data")
            .ok_or_else(|| ServiceError::Internal("missing data column".into()))?;
        serde_json::from_str(data).map_err(|e| ServiceError::Internal(e.to_string()))
    }

    /// Update a record's JSON data and indexed columns.
    pub(crate) fn update_record<T: Serialize>(
        &self,
        table: &str,
        id: &str,
        record: &T,
        indexes: &[(&str, Value)],
    ) -> Result<(), ServiceError> {
        let json = serde_json::to_string(record)
            .map_err(|e| ServiceError::Internal(e.to_string()))?;

        let mut sets = vec!["data = ?1".to_string()];
        let mut params: Vec<Value> = vec![Value::Text(json)];

        for (i, (col, val)) in indexes.iter().enumerate() {
            let idx = i + 2;
            sets.push(format!("{} = ?{}", col, idx));
            params.push(val.clone());
        }

        let id_idx = params.len() + 1;
        params.push(Value::Text(id.to_string()));

        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            table,
            sets.join(", "),
            id_idx,
        );

        let affected = self
            .sql
            .exec(&sql, &params)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        if affected == 0 {
            return Err(ServiceError::NotFound(format!("{}/{}", table, id)));
        }

        Ok(())
    }

    /// Delete a record by id.
    pub(crate) fn delete_record(&self, table: &str, id: &str) -> Result<(), ServiceError> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", table);
        let affected = self
            .sql
            .exec(&sql, &[Value::Text(id.to_string())])
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        if affected == 0 {
            return Err(ServiceError::NotFound(format!("{}/{}", table, id)));
        }
        Ok(())
    }
}

/// Build an INSERT statement for the document-plus-indexed-columns shape.
/// Shared with the transactional customer create, which batches several
/// of these.
pub(crate) fn insert_stmt<T: Serialize>(
    table: &str,
    id: &str,
    record: &T,
    indexes: &[(&str, Value)],
) -> Result<(String, Vec<Value>), ServiceError> {
    let json =
        serde_json::to_string(record).map_err(|e| ServiceError::Internal(e.to_string()))?;

    let mut cols = vec!["id", "data"];
    let mut placeholders = vec!["?1".to_string(), "?2".to_string()];
    let mut params = vec![Value::Text(id.to_string()), Value::Text(json)];

    for (i, (col, val)) in indexes.iter().enumerate() {
        let idx = i + 3;
        cols.push(col);
        placeholders.push(format!("?{}", idx));
        params.push(val.clone());
    }

    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        cols.join(", "),
        placeholders.join(", "),
    );

    Ok((sql, params))
}

// ── Input normalization ──
//
// Form fields arrive as free text; blank means "not given".

/// Trim a field, mapping blank to None.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// A required text field: trimmed, must be non-empty.
pub(crate) fn require(value: &str, field: &str) -> Result<String, ServiceError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(ServiceError::Validation(format!("{} is required", field)));
    }
    Ok(v.to_string())
}

/// An optional ISO date field: trimmed, blank maps to None, anything
/// else must parse as `YYYY-MM-DD`.
pub(crate) fn valid_date(value: Option<String>, field: &str) -> Result<Option<String>, ServiceError> {
    match non_blank(value) {
        None => Ok(None),
        Some(s) => {
            NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|_| {
                ServiceError::Validation(format!("{}: invalid date '{}'", field, s))
            })?;
            Ok(Some(s))
        }
    }
}

/// Deserialize a JSON document column.
pub(crate) fn parse_doc<T: DeserializeOwned>(data: &str) -> Result<T, ServiceError> {
    serde_json::from_str(data).map_err(|e| ServiceError::Internal(e.to_string()))
}

/// Map a store failure.
pub(crate) fn storage_err(e: subhub_sql::SQLError) -> ServiceError {
    ServiceError::Storage(e.to_string())
}

#[cfg(test)]
pub(crate) mod test_support {
    use subhub_sql::SqliteStore;

    use super::CrmService;

    pub fn test_service() -> CrmService {
        let sql = Box::new(SqliteStore::open_in_memory().unwrap());
        CrmService::new(sql).unwrap()
    }
}
