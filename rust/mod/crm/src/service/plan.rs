use serde::Deserialize;

use subhub_core::{ServiceError, new_id, now_rfc3339};
use subhub_sql::Value;

use crate::model::{Package, Plan};
use super::{CrmService, non_blank, parse_doc, require, storage_err};

/// Plan form fields, shared by create and update.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanInput {
    pub kind: String,

    #[serde(default)]
    pub screens: Option<i64>,

    #[serde(default)]
    pub months: Option<i64>,

    #[serde(default)]
    pub price: Option<f64>,

    #[serde(default)]
    pub description: Option<String>,
}

impl CrmService {
    pub fn list_plans(&self) -> Result<Vec<Plan>, ServiceError> {
        let rows = self
            .sql
            .query(
                "SELECT data FROM plans
                 ORDER BY kind ASC NULLS LAST, months ASC NULLS LAST",
                &[],
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

    pub fn get_plan(&self, id: &str) -> Result<Plan, ServiceError> {
        self.get_record("plans", id)
    }

    pub fn create_plan(&self, input: PlanInput) -> Result<Plan, ServiceError> {
        let kind = require(&input.kind, "kind")?;
        let now = now_rfc3339();

        let record = Plan {
            id: new_id(),
            kind,
            screens: input.screens,
            months: input.months,
            price: input.price,
            description: non_blank(input.description),
            create_at: Some(now.clone()),
            update_at: Some(now.clone()),
        };

        self.insert_record("plans", &record.id, &record, &plan_indexes(&record, &now))?;
        Ok(record)
    }

    pub fn update_plan(&self, id: &str, input: PlanInput) -> Result<Plan, ServiceError> {
        let kind = require(&input.kind, "kind")?;
        let current: Plan = self.get_record("plans", id)?;
        let now = now_rfc3339();

        let updated = Plan {
            kind,
            screens: input.screens,
            months: input.months,
            price: input.price,
            description: non_blank(input.description),
            update_at: Some(now.clone()),
            ..current
        };

        self.update_record("plans", id, &updated, &plan_indexes(&updated, &now))?;
        Ok(updated)
    }

    pub fn delete_plan(&self, id: &str) -> Result<(), ServiceError> {
        self.delete_record("plans", id)
    }

    /// The package reference table, ordered by contract label.
    pub fn list_packages(&self) -> Result<Vec<Package>, ServiceError> {
        let rows = self
            .sql
            .query(
                "SELECT data FROM packages
                 ORDER BY contract_label ASC NULLS LAST",
                &[],
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
}

fn plan_indexes(p: &Plan, now: &str) -> Vec<(&'static str, Value)> {
    vec![
        ("kind", Value::Text(p.kind.clone())),
        ("screens", Value::opt_integer(p.screens)),
        ("months", Value::opt_integer(p.months)),
        ("price", Value::opt_real(p.price)),
        ("create_at", Value::opt_text(p.create_at.clone())),
        ("update_at", Value::Text(now.to_string())),
    ]
}
