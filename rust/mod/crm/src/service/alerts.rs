//! Due-soon queries feeding the alerts screen.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use subhub_core::{ServiceError, today};
use subhub_sql::Value;

use super::{CrmService, storage_err};

/// A subscription whose billing due date is at hand while the contract
/// still runs past it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingAlert {
    pub customer_id: String,
    pub customer_name: String,
    pub subscription_id: String,
    pub billing_due: String,
    pub contract_due: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_screens: Option<i64>,
}

/// An app registration expiring within the window.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppAlert {
    pub customer_id: String,
    pub customer_name: String,
    pub registration_id: String,
    pub valid_until: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
    pub app_name: String,
}

impl CrmService {
    /// Active subscriptions billed within `days` days (overdue
    /// included) whose contract runs strictly past the billing date.
    pub fn billing_alerts(&self, days: u32) -> Result<Vec<BillingAlert>, ServiceError> {
        self.billing_alerts_at(today(), days)
    }

    pub(crate) fn billing_alerts_at(
        &self,
        today: NaiveDate,
        days: u32,
    ) -> Result<Vec<BillingAlert>, ServiceError> {
        let cutoff = today + Duration::days(days as i64);

        let rows = self
            .sql
            .query(
                "SELECT c.id AS customer_id,
                        c.name AS customer_name,
                        a.id AS subscription_id,
                        a.billing_due AS billing_due,
                        a.contract_due AS contract_due,
                        p.contract_label AS package_label,
                        p.screens AS package_screens
                 FROM subscriptions a
                 JOIN customers c ON c.id = a.customer_id
                 LEFT JOIN packages p ON p.id = a.package_id
                 WHERE lower(trim(a.status)) = 'active'
                   AND a.billing_due IS NOT NULL
                   AND a.contract_due IS NOT NULL
                   AND a.billing_due <= ?1
                   AND a.contract_due > a.billing_due
                 ORDER BY a.billing_due ASC",
                &[Value::Text(cutoff.to_string())],
            )
            .map_err(storage_err)?;

        Ok(rows
            .iter()
            .map(|r| BillingAlert {
                customer_id: r.get_str("customer_id").unwrap_or_default().to_string(),
                customer_name: r.get_str("customer_name").unwrap_or_default().to_string(),
                subscription_id: r.get_str("subscription_id").unwrap_or_default().to_string(),
                billing_due: r.get_str("billing_due").unwrap_or_default().to_string(),
                contract_due: r.get_str("contract_due").unwrap_or_default().to_string(),
                package_label: r.get_str("package_label").map(String::from),
                package_screens: r.get_i64("package_screens"),
            })
            .collect())
    }

    /// Active app registrations expiring between today and today +
    /// `days`. Already-expired registrations are not alerted.
    pub fn app_alerts(&self, days: u32) -> Result<Vec<AppAlert>, ServiceError> {
        self.app_alerts_at(today(), days)
    }

    pub(crate) fn app_alerts_at(
        &self,
        today: NaiveDate,
        days: u32,
    ) -> Result<Vec<AppAlert>, ServiceError> {
        let cutoff = today + Duration::days(days as i64);

        let rows = self
            .sql
            .query(
                "SELECT c.id AS customer_id,
                        c.name AS customer_name,
                        ap.id AS registration_id,
                        ap.valid_until AS valid_until,
                        ap.mac AS mac,
                        app.name AS app_name
                 FROM app_registrations ap
                 JOIN customers c ON c.id = ap.customer_id
                 JOIN apps app ON app.id = ap.app_id
                 WHERE lower(trim(ap.status)) = 'active'
                   AND ap.valid_until IS NOT NULL
                   AND ap.valid_until <= ?1
                   AND ap.valid_until >= ?2
                 ORDER BY ap.valid_until ASC",
                &[
                    Value::Text(cutoff.to_string()),
                    Value::Text(today.to_string()),
                ],
            )
            .map_err(storage_err)?;

        Ok(rows
            .iter()
            .map(|r| AppAlert {
                customer_id: r.get_str("customer_id").unwrap_or_default().to_string(),
                customer_name: r.get_str("customer_name").unwrap_or_default().to_string(),
                registration_id: r.get_str("registration_id").unwrap_or_default().to_string(),
                valid_until: r.get_str("valid_until").unwrap_or_default().to_string(),
                mac: r.get_str("mac").map(String::from),
                app_name: r.get_str("app_name").unwrap_or_default().to_string(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::customer::CreateCustomer;
    use crate::service::registration::RegistrationInput;
    use crate::service::registration::test_seed::seed_app;
    use crate::service::subscription::SubscriptionInput;
    use crate::service::test_support::test_service;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn customer(svc: &CrmService, name: &str) -> String {
        svc.create_customer(CreateCustomer {
            name: name.into(),
            ..Default::default()
        })
        .unwrap()
    }

    fn sub(svc: &CrmService, cid: &str, billing: &str, contract: &str, status: &str) {
        svc.create_subscription(cid, SubscriptionInput {
            billing_due: Some(billing.into()),
            contract_due: Some(contract.into()),
            status: Some(status.into()),
            ..Default::default()
        })
        .unwrap();
    }

    #[test]
    fn billing_alerts_window_and_contract_guard() {
        let svc = test_service();
        let cid = customer(&svc, "Ana");
        let today = d("2024-03-10");

        // Overdue billing with running contract: alerted.
        sub(&svc, &cid, "2024-03-01", "2024-06-01", "active");
        // Due inside the window.
        sub(&svc, &cid, "2024-03-14", "2024-06-01", "active");
        // Due past the window.
        sub(&svc, &cid, "2024-03-20", "2024-06-01", "active");
        // Contract not past billing: the contract itself is what
        // expires, so no billing alert.
        sub(&svc, &cid, "2024-03-12", "2024-03-12", "active");
        // Inactive: ignored.
        sub(&svc, &cid, "2024-03-11", "2024-06-01", "paused");

        let alerts = svc.billing_alerts_at(today, 5).unwrap();
        let dues: Vec<&str> = alerts.iter().map(|a| a.billing_due.as_str()).collect();
        assert_eq!(dues, vec!["2024-03-01", "2024-03-14"]);
        assert_eq!(alerts[0].customer_name, "Ana");
    }

    #[test]
    fn app_alerts_exclude_expired_and_unscoped_windows() {
        let svc = test_service();
        let cid = customer(&svc, "Ana");
        let app = seed_app(&svc, "StreamBox", false);
        let today = d("2024-03-10");

        let reg = |valid: &str, status: &str| {
            svc.create_registration(&cid, RegistrationInput {
                app_id: Some(app.clone()),
                valid_until: Some(valid.into()),
                status: Some(status.into()),
                ..Default::default()
            })
            .unwrap();
        };

        reg("2024-03-09", "active"); // already expired
        reg("2024-03-10", "active"); // today
        reg("2024-03-17", "active"); // window edge
        reg("2024-03-18", "active"); // past the window
        reg("2024-03-12", "blocked"); // wrong status

        let alerts = svc.app_alerts_at(today, 7).unwrap();
        let valids: Vec<&str> = alerts.iter().map(|a| a.valid_until.as_str()).collect();
        assert_eq!(valids, vec!["2024-03-10", "2024-03-17"]);
        assert_eq!(alerts[0].app_name, "StreamBox");
    }
}
