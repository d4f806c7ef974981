use serde::{Deserialize, Serialize};

use subhub_core::{ListResult, PageParams, ServiceError, new_id, now_rfc3339};
use subhub_sql::Value;

use crate::model::{Customer, Payment};
use super::{CrmService, non_blank, parse_doc, storage_err, valid_date};

/// Payment form fields, shared by create and update.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInput {
    #[serde(default)]
    pub paid_at: Option<String>,

    #[serde(default)]
    pub method: Option<String>,

    #[serde(default)]
    pub amount: Option<f64>,

    #[serde(default)]
    pub details: Option<String>,

    #[serde(default)]
    pub kind: Option<String>,

    #[serde(default)]
    pub purchase_ref: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentListQuery {
    /// Matches customer name, details or purchase reference.
    #[serde(default)]
    pub q: Option<String>,

    #[serde(default)]
    pub customer_id: Option<String>,

    #[serde(flatten)]
    pub page: PageParams,
}

/// One row of the payment list, joined with the paying customer's name.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentListRow {
    #[serde(flatten)]
    pub payment: Payment,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
}

fn build_where(query: &PaymentListQuery, params: &mut Vec<Value>) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(q) = non_blank(query.q.clone()) {
        params.push(Value::Text(format!("%{}%", q)));
        let i = params.len();
        parts.push(format!(
            "(c.name LIKE ?{i} OR p.details LIKE ?{i} OR p.purchase_ref LIKE ?{i})"
        ));
    }

    if let Some(cid) = non_blank(query.customer_id.clone()) {
        params.push(Value::Text(cid));
        parts.push(format!("p.customer_id = ?{}", params.len()));
    }

    if parts.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", parts.join(" AND "))
    }
}

impl CrmService {
    pub fn list_payments(
        &self,
        query: &PaymentListQuery,
    ) -> Result<ListResult<PaymentListRow>, ServiceError> {
        let mut params: Vec<Value> = Vec::new();
        let where_sql = build_where(query, &mut params);

        let count_sql = format!(
            "SELECT COUNT(*) AS total
             FROM payments p
             LEFT JOIN customers c ON c.id = p.customer_id
             {}",
            where_sql,
        );
        let total = self
            .sql
            .query(&count_sql, &params)
            .map_err(storage_err)?
            .first()
            .and_then(|r| r.get_i64("total"))
            .unwrap_or(0) as usize;

        let limit_idx = params.len() + 1;
        let offset_idx = params.len() + 2;
        params.push(Value::Integer(query.page.page_size() as i64));
        params.push(Value::Integer(query.page.offset() as i64));

        let list_sql = format!(
            "SELECT p.data AS data, c.name AS customer_name
             FROM payments p
             LEFT JOIN customers c ON c.id = p.customer_id
             {}
             ORDER BY p.paid_at DESC NULLS LAST, p.id DESC
             LIMIT ?{} OFFSET ?{}",
            where_sql, limit_idx, offset_idx,
        );

        let rows = self.sql.query(&list_sql, &params).map_err(storage_err)?;
        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            let data = row
                .get_str("data")
                .ok_or_else(|| ServiceError::Internal("missing data column".into()))?;
            items.push(PaymentListRow {
                payment: parse_doc(data)?,
                customer_name: row.get_str("customer_name").map(String::from),
            });
        }

        Ok(ListResult { items, total })
    }

    /// Most recent payments on a customer's detail screen.
    pub fn payments_for_customer(
        &self,
        customer_id: &str,
        limit: usize,
    ) -> Result<Vec<Payment>, ServiceError> {
        let rows = self
            .sql
            .query(
                "SELECT data FROM payments
                 WHERE customer_id = ?1
                 ORDER BY paid_at DESC NULLS LAST, id DESC
                 LIMIT ?2",
                &[
                    Value::Text(customer_id.to_string()),
                    Value::Integer(limit as i64),
                ],
            )
            .map_err(storage_err)?;

        rows.iter()
            .map(|r| {
                let data = r
                    .get_str("data")
                    .ok_or_else(|| ServiceError::Internal("missing data column".into()))?;
                parse_doc(data)
            })
            .collect()
    }

    pub fn create_payment(
        &self,
        customer_id: &str,
        input: PaymentInput,
    ) -> Result<Payment, ServiceError> {
        let _customer: Customer = self.get_record("customers", customer_id)?;
        let now = now_rfc3339();

        let record = Payment {
            id: new_id(),
            customer_id: customer_id.to_string(),
            paid_at: valid_date(input.paid_at, "payment date")?,
            method: non_blank(input.method),
            amount: input.amount,
            details: non_blank(input.details),
            kind: non_blank(input.kind),
            purchase_ref: non_blank(input.purchase_ref),
            create_at: Some(now.clone()),
            update_at: Some(now.clone()),
        };

        self.insert_record("payments", &record.id, &record, &payment_indexes(&record, &now))?;
        Ok(record)
    }

    pub fn update_payment(&self, id: &str, input: PaymentInput) -> Result<Payment, ServiceError> {
        let current: Payment = self.get_record("payments", id)?;
        let now = now_rfc3339();

        let updated = Payment {
            paid_at: valid_date(input.paid_at, "payment date")?,
            method: non_blank(input.method),
            amount: input.amount,
            details: non_blank(input.details),
            kind: non_blank(input.kind),
            purchase_ref: non_blank(input.purchase_ref),
            update_at: Some(now.clone()),
            ..current
        };

        self.update_record("payments", id, &updated, &payment_indexes(&updated, &now))?;
        Ok(updated)
    }

    pub fn delete_payment(&self, id: &str) -> Result<(), ServiceError> {
        self.delete_record("payments", id)
    }
}

fn payment_indexes(p: &Payment, now: &str) -> Vec<(&'static str, Value)> {
    vec![
        ("customer_id", Value::Text(p.customer_id.clone())),
        ("paid_at", Value::opt_text(p.paid_at.clone())),
        ("method", Value::opt_text(p.method.clone())),
        ("amount", Value::opt_real(p.amount)),
        ("kind", Value::opt_text(p.kind.clone())),
        ("details", Value::opt_text(p.details.clone())),
        ("purchase_ref", Value::opt_text(p.purchase_ref.clone())),
        ("create_at", Value::opt_text(p.create_at.clone())),
        ("update_at", Value::Text(now.to_string())),
    ]
}
