use serde::Deserialize;

use subhub_core::{ServiceError, new_id, now_rfc3339};
use subhub_sql::Value;

use crate::model::{Contact, Customer};
use super::{CrmService, non_blank, parse_doc, require, storage_err};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInput {
    pub phone: String,

    #[serde(default)]
    pub name: Option<String>,
}

impl CrmService {
    pub fn contacts_for_customer(&self, customer_id: &str) -> Result<Vec<Contact>, ServiceError> {
        let rows = self
            .sql
            .query(
                "SELECT data FROM contacts
                 WHERE customer_id = ?1
                 ORDER BY update_at DESC NULLS LAST,
                          create_at DESC NULLS LAST, id ASC",
                &[Value::Text(customer_id.to_string())],
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

    pub fn add_contact(&self, customer_id: &str, input: ContactInput) -> Result<Contact, ServiceError> {
        let phone = require(&input.phone, "phone")?;
        let _customer: Customer = self.get_record("customers", customer_id)?;

        let now = now_rfc3339();
        let record = contact_record(customer_id, phone, input.name, &now);
        self.insert_record("contacts", &record.id, &record, &contact_indexes(&record, &now))?;
        Ok(record)
    }

    pub fn update_contact(&self, id: &str, input: ContactInput) -> Result<Contact, ServiceError> {
        let phone = require(&input.phone, "phone")?;
        let current: Contact = self.get_record("contacts", id)?;
        let now = now_rfc3339();

        let updated = Contact {
            phone,
            name: non_blank(input.name),
            update_at: Some(now.clone()),
            ..current
        };

        self.update_record("contacts", id, &updated, &contact_indexes(&updated, &now))?;
        Ok(updated)
    }

    pub fn delete_contact(&self, id: &str) -> Result<(), ServiceError> {
        self.delete_record("contacts", id)
    }
}

pub(crate) fn contact_record(
    customer_id: &str,
    phone: String,
    name: Option<String>,
    now: &str,
) -> Contact {
    Contact {
        id: new_id(),
        customer_id: customer_id.to_string(),
        phone,
        name: non_blank(name),
        reference: None,
        create_at: Some(now.to_string()),
        update_at: Some(now.to_string()),
    }
}

pub(crate) fn contact_indexes(c: &Contact, now: &str) -> Vec<(&'static str, Value)> {
    vec![
        ("customer_id", Value::Text(c.customer_id.clone())),
        ("phone", Value::Text(c.phone.clone())),
        ("name", Value::opt_text(c.name.clone())),
        ("create_at", Value::opt_text(c.create_at.clone())),
        ("update_at", Value::Text(now.to_string())),
    ]
}
