use serde::{Deserialize, Serialize};

use subhub_core::{ServiceError, new_id, now_rfc3339};
use subhub_sql::Value;

use crate::model::{AppCatalogEntry, AppRegistration, Customer, STATUS_ACTIVE};
use super::{CrmService, non_blank, parse_doc, storage_err, valid_date};

/// App registration form fields, shared by create and update.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationInput {
    #[serde(default)]
    pub app_id: Option<String>,

    #[serde(default)]
    pub mac: Option<String>,

    #[serde(default)]
    pub license_key: Option<String>,

    #[serde(default)]
    pub valid_until: Option<String>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub note: Option<String>,

    #[serde(default)]
    pub subscription_id: Option<String>,

    #[serde(default)]
    pub account_id: Option<String>,

    #[serde(default)]
    pub device_id: Option<String>,
}

/// A registration joined with its catalog entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationView {
    #[serde(flatten)]
    pub registration: AppRegistration,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_license: Option<bool>,
}

/// A MAC-search hit: the registration plus who owns it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MacSearchRow {
    #[serde(flatten)]
    pub registration: AppRegistration,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_license: Option<bool>,
}

impl CrmService {
    pub fn registrations_for_customer(
        &self,
        customer_id: &str,
    ) -> Result<Vec<RegistrationView>, ServiceError> {
        let rows = self
            .sql
            .query(
                "SELECT ap.data AS data, app.data AS app_data
                 FROM app_registrations ap
                 LEFT JOIN apps app ON app.id = ap.app_id
                 WHERE ap.customer_id = ?1
                 ORDER BY ap.update_at DESC NULLS LAST, ap.id DESC",
                &[Value::Text(customer_id.to_string())],
            )
            .map_err(storage_err)?;

        let mut views = Vec::with_capacity(rows.len());
        for row in &rows {
            let data = row
                .get_str("data")
                .ok_or_else(|| ServiceError::Internal("missing data column".into()))?;
            let app = match row.get_str("app_data") {
                Some(d) => Some(parse_doc::<AppCatalogEntry>(d)?),
                None => None,
            };
            views.push(RegistrationView {
                registration: parse_doc(data)?,
                app_name: app.as_ref().map(|a| a.name.clone()),
                requires_license: app.as_ref().map(|a| a.requires_license),
            });
        }
        Ok(views)
    }

    /// Find registrations by MAC substring. Blank input short-circuits;
    /// at most 20 hits, most recently updated first.
    pub fn search_by_mac(&self, mac: &str) -> Result<Vec<MacSearchRow>, ServiceError> {
        let mac = mac.trim();
        if mac.is_empty() {
            return Ok(Vec::new());
        }

        let rows = self
            .sql
            .query(
                "SELECT ap.data AS data,
                        c.name AS customer_name,
                        app.data AS app_data
                 FROM app_registrations ap
                 LEFT JOIN customers c ON c.id = ap.customer_id
                 LEFT JOIN apps app ON app.id = ap.app_id
                 WHERE ap.mac LIKE ?1
                 ORDER BY ap.update_at DESC NULLS LAST
                 LIMIT 20",
                &[Value::Text(format!("%{}%", mac))],
            )
            .map_err(storage_err)?;

        let mut hits = Vec::with_capacity(rows.len());
        for row in &rows {
            let data = row
                .get_str("data")
                .ok_or_else(|| ServiceError::Internal("missing data column".into()))?;
            let app = match row.get_str("app_data") {
                Some(d) => Some(parse_doc::<AppCatalogEntry>(d)?),
                None => None,
            };
            hits.push(MacSearchRow {
                registration: parse_doc(data)?,
                customer_name: row.get_str("customer_name").map(String::from),
                app_name: app.as_ref().map(|a| a.name.clone()),
                requires_license: app.as_ref().map(|a| a.requires_license),
            });
        }
        Ok(hits)
    }

    pub fn create_registration(
        &self,
        customer_id: &str,
        input: RegistrationInput,
    ) -> Result<AppRegistration, ServiceError> {
        let _customer: Customer = self.get_record("customers", customer_id)?;
        let now = now_rfc3339();

        let record = AppRegistration {
            id: new_id(),
            customer_id: customer_id.to_string(),
            app_id: non_blank(input.app_id),
            mac: non_blank(input.mac),
            license_key: non_blank(input.license_key),
            valid_until: valid_date(input.valid_until, "validity")?,
            status: non_blank(input.status).unwrap_or_else(|| STATUS_ACTIVE.to_string()),
            note: non_blank(input.note),
            subscription_id: non_blank(input.subscription_id),
            account_id: non_blank(input.account_id),
            device_id: non_blank(input.device_id),
            create_at: Some(now.clone()),
            update_at: Some(now.clone()),
        };

        self.insert_record(
            "app_registrations",
            &record.id,
            &record,
            &registration_indexes(&record, &now),
        )?;
        Ok(record)
    }

    pub fn update_registration(
        &self,
        id: &str,
        input: RegistrationInput,
    ) -> Result<AppRegistration, ServiceError> {
        let current: AppRegistration = self.get_record("app_registrations", id)?;
        let now = now_rfc3339();

        let updated = AppRegistration {
            app_id: non_blank(input.app_id),
            mac: non_blank(input.mac),
            license_key: non_blank(input.license_key),
            valid_until: valid_date(input.valid_until, "validity")?,
            status: non_blank(input.status).unwrap_or_else(|| current.status.clone()),
            note: non_blank(input.note),
            subscription_id: non_blank(input.subscription_id),
            account_id: non_blank(input.account_id),
            device_id: non_blank(input.device_id),
            update_at: Some(now.clone()),
            ..current
        };

        self.update_record(
            "app_registrations",
            id,
            &updated,
            &registration_indexes(&updated, &now),
        )?;
        Ok(updated)
    }

    pub fn delete_registration(&self, id: &str) -> Result<(), ServiceError> {
        self.delete_record("app_registrations", id)
    }

    /// The app catalog, ordered by name.
    pub fn list_apps(&self) -> Result<Vec<AppCatalogEntry>, ServiceError> {
        let rows = self
            .sql
            .query("SELECT data FROM apps ORDER BY name ASC", &[])
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

fn registration_indexes(r: &AppRegistration, now: &str) -> Vec<(&'static str, Value)> {
    vec![
        ("customer_id", Value::Text(r.customer_id.clone())),
        ("app_id", Value::opt_text(r.app_id.clone())),
        ("subscription_id", Value::opt_text(r.subscription_id.clone())),
        ("mac", Value::opt_text(r.mac.clone())),
        ("valid_until", Value::opt_text(r.valid_until.clone())),
        ("status", Value::Text(r.status.clone())),
        ("create_at", Value::opt_text(r.create_at.clone())),
        ("update_at", Value::Text(now.to_string())),
    ]
}

#[cfg(test)]
pub(crate) mod test_seed {
    use super::*;

    /// Seed an app catalog row directly; the panel treats the catalog
    /// as read-only reference data.
    pub fn seed_app(svc: &CrmService, name: &str, requires_license: bool) -> String {
        let now = now_rfc3339();
        let record = AppCatalogEntry {
            id: new_id(),
            name: name.into(),
            requires_license,
            note: None,
            reference_url: None,
            create_at: Some(now.clone()),
            update_at: Some(now.clone()),
        };
        svc.insert_record(
            "apps",
            &record.id,
            &record,
            &[
                ("name", Value::Text(record.name.clone())),
                ("create_at", Value::opt_text(record.create_at.clone())),
                ("update_at", Value::opt_text(record.update_at.clone())),
            ],
        )
        .unwrap();
        record.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::customer::CreateCustomer;
    use crate::service::test_support::test_service;
    use test_seed::seed_app;

    fn customer(svc: &CrmService, name: &str) -> String {
        svc.create_customer(CreateCustomer {
            name: name.into(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn registration_view_joins_catalog() {
        let svc = test_service();
        let cid = customer(&svc, "Ana");
        let app = seed_app(&svc, "StreamBox", true);

        svc.create_registration(&cid, RegistrationInput {
            app_id: Some(app),
            mac: Some("AA:BB:CC:DD:EE:FF".into()),
            valid_until: Some("2025-01-01".into()),
            ..Default::default()
        })
        .unwrap();

        let views = svc.registrations_for_customer(&cid).unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].app_name.as_deref(), Some("StreamBox"));
        assert_eq!(views[0].requires_license, Some(true));
        assert_eq!(views[0].registration.status, "active");
    }

    #[test]
    fn mac_search_is_substring_and_bounded() {
        let svc = test_service();
        let cid = customer(&svc, "Ana");
        for i in 0..25 {
            svc.create_registration(&cid, RegistrationInput {
                mac: Some(format!("AA:BB:{:02X}", i)),
                ..Default::default()
            })
            .unwrap();
        }

        assert!(svc.search_by_mac("  ").unwrap().is_empty());

        let all = svc.search_by_mac("aa:bb").unwrap();
        assert_eq!(all.len(), 20);
        assert_eq!(all[0].customer_name.as_deref(), Some("Ana"));

        let one = svc.search_by_mac("AA:BB:03").unwrap();
        assert_eq!(one.len(), 1);
    }

    #[test]
    fn update_and_delete_registration() {
        let svc = test_service();
        let cid = customer(&svc, "Ana");
        let reg = svc
            .create_registration(&cid, RegistrationInput {
                mac: Some("AA".into()),
                ..Default::default()
            })
            .unwrap();

        let updated = svc
            .update_registration(&reg.id, RegistrationInput {
                mac: Some("BB".into()),
                status: Some("expired".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(updated.mac.as_deref(), Some("BB"));
        assert_eq!(updated.status, "expired");

        svc.delete_registration(&reg.id).unwrap();
        assert!(matches!(
            svc.delete_registration(&reg.id).unwrap_err(),
            ServiceError::NotFound(_)
        ));
    }
}
