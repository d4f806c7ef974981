use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use subhub_core::{ServiceError, add_months, new_id, now_rfc3339, today};
use subhub_sql::Value;

use crate::model::{Customer, Package, Plan, STATUS_ACTIVE, Subscription};
use super::renewal::{self, Period};
use super::{CrmService, non_blank, parse_doc, require, storage_err, valid_date};

/// Subscription form fields, shared by create and update.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionInput {
    #[serde(default)]
    pub package_id: Option<String>,

    #[serde(default)]
    pub plan_id: Option<String>,

    #[serde(default)]
    pub contract_due: Option<String>,

    #[serde(default)]
    pub billing_due: Option<String>,

    /// Blank defaults to "active" on create and keeps the stored
    /// status on update.
    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub identification: Option<String>,

    #[serde(default)]
    pub note: Option<String>,
}

/// Renewal request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenewInput {
    #[serde(default)]
    pub period: Period,

    /// Explicit contract due date overriding the period arithmetic.
    #[serde(default)]
    pub manual_date: Option<String>,

    /// Force the status to "active". Defaults to on.
    #[serde(default = "default_activate")]
    pub activate: bool,
}

fn default_activate() -> bool {
    true
}

impl Default for RenewInput {
    fn default() -> Self {
        Self {
            period: Period::default(),
            manual_date: None,
            activate: default_activate(),
        }
    }
}

/// A subscription joined with its package and plan reference rows, as
/// the customer detail screen shows it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionView {
    #[serde(flatten)]
    pub subscription: Subscription,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<Package>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<Plan>,
}

impl CrmService {
    pub fn subscriptions_for_customer(
        &self,
        customer_id: &str,
    ) -> Result<Vec<SubscriptionView>, ServiceError> {
        let rows = self
            .sql
            .query(
                "SELECT a.data AS data,
                        p.data AS package_data,
                        pl.data AS plan_data
                 FROM subscriptions a
                 LEFT JOIN packages p ON p.id = a.package_id
                 LEFT JOIN plans pl ON pl.id = a.plan_id
                 WHERE a.customer_id = ?1
                 ORDER BY a.update_at DESC NULLS LAST,
                          a.create_at DESC NULLS LAST",
                &[Value::Text(customer_id.to_string())],
            )
            .map_err(storage_err)?;

        let mut views = Vec::with_capacity(rows.len());
        for row in &rows {
            let data = row
                .get_str("data")
                .ok_or_else(|| ServiceError::Internal("missing data column".into()))?;
            let package = match row.get_str("package_data") {
                Some(d) => Some(parse_doc::<Package>(d)?),
                None => None,
            };
            let plan = match row.get_str("plan_data") {
                Some(d) => Some(parse_doc::<Plan>(d)?),
                None => None,
            };
            views.push(SubscriptionView {
                subscription: parse_doc(data)?,
                package,
                plan,
            });
        }
        Ok(views)
    }

    pub fn create_subscription(
        &self,
        customer_id: &str,
        input: SubscriptionInput,
    ) -> Result<Subscription, ServiceError> {
        let customer_id = require(customer_id, "customer id")?;
        // The customer must exist; foreign keys are not enforced by the store.
        let _customer: Customer = self.get_record("customers", &customer_id)?;

        let now = now_rfc3339();
        let record = subscription_record(&customer_id, input, &now)?;
        self.insert_record(
            "subscriptions",
            &record.id,
            &record,
            &subscription_indexes(&record, &now),
        )?;
        Ok(record)
    }

    pub fn update_subscription(
        &self,
        id: &str,
        input: SubscriptionInput,
    ) -> Result<Subscription, ServiceError> {
        let current: Subscription = self.get_record("subscriptions", id)?;
        let now = now_rfc3339();

        let updated = Subscription {
            package_id: non_blank(input.package_id),
            plan_id: non_blank(input.plan_id),
            contract_due: valid_date(input.contract_due, "contract due")?,
            billing_due: valid_date(input.billing_due, "billing due")?,
            status: non_blank(input.status).unwrap_or_else(|| current.status.clone()),
            identification: non_blank(input.identification),
            note: non_blank(input.note),
            update_at: Some(now.clone()),
            ..current
        };

        self.update_record(
            "subscriptions",
            id,
            &updated,
            &subscription_indexes(&updated, &now),
        )?;
        Ok(updated)
    }

    pub fn delete_subscription(&self, id: &str) -> Result<(), ServiceError> {
        self.delete_record("subscriptions", id)
    }

    // ── Renewal ──

    /// Renew a subscription for the chosen period. Fails with NotFound
    /// when the id matches no row.
    pub fn renew_subscription(
        &self,
        id: &str,
        input: RenewInput,
    ) -> Result<Subscription, ServiceError> {
        self.renew_subscription_at(today(), id, input)
    }

    pub(crate) fn renew_subscription_at(
        &self,
        today: NaiveDate,
        id: &str,
        input: RenewInput,
    ) -> Result<Subscription, ServiceError> {
        let current: Subscription = self.get_record("subscriptions", id)?;

        let manual = valid_date(input.manual_date, "manual date")?
            .as_deref()
            .and_then(parse_stored_date);

        let renewed = renewal::compute(
            current.contract_due.as_deref().and_then(parse_stored_date),
            current.billing_due.as_deref().and_then(parse_stored_date),
            input.period,
            manual,
            today,
        );

        let now = now_rfc3339();
        let updated = Subscription {
            contract_due: Some(renewed.contract_due.to_string()),
            billing_due: Some(renewed.billing_due.to_string()),
            status: if input.activate {
                STATUS_ACTIVE.to_string()
            } else {
                current.status.clone()
            },
            update_at: Some(now.clone()),
            ..current
        };

        self.update_record(
            "subscriptions",
            id,
            &updated,
            &subscription_indexes(&updated, &now),
        )?;
        Ok(updated)
    }

    /// Quick action from the alerts screen: push the billing due date
    /// one month out. A subscription that never billed is left alone.
    pub fn add_billing_month(&self, id: &str) -> Result<Subscription, ServiceError> {
        let current: Subscription = self.get_record("subscriptions", id)?;
        let now = now_rfc3339();

        let billing_due = match current.billing_due.as_deref().and_then(parse_stored_date) {
            Some(d) => Some(add_months(d, 1).to_string()),
            None => current.billing_due.clone(),
        };

        let updated = Subscription {
            billing_due,
            update_at: Some(now.clone()),
            ..current
        };

        self.update_record(
            "subscriptions",
            id,
            &updated,
            &subscription_indexes(&updated, &now),
        )?;
        Ok(updated)
    }
}

fn parse_stored_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Build a subscription record from form input.
pub(crate) fn subscription_record(
    customer_id: &str,
    input: SubscriptionInput,
    now: &str,
) -> Result<Subscription, ServiceError> {
    Ok(Subscription {
        id: new_id(),
        customer_id: customer_id.to_string(),
        package_id: non_blank(input.package_id),
        plan_id: non_blank(input.plan_id),
        contract_due: valid_date(input.contract_due, "contract due")?,
        billing_due: valid_date(input.billing_due, "billing due")?,
        status: non_blank(input.status).unwrap_or_else(|| STATUS_ACTIVE.to_string()),
        identification: non_blank(input.identification),
        note: non_blank(input.note),
        create_at: Some(now.to_string()),
        update_at: Some(now.to_string()),
    })
}

pub(crate) fn subscription_indexes(s: &Subscription, now: &str) -> Vec<(&'static str, Value)> {
    vec![
        ("customer_id", Value::Text(s.customer_id.clone())),
        ("package_id", Value::opt_text(s.package_id.clone())),
        ("plan_id", Value::opt_text(s.plan_id.clone())),
        ("contract_due", Value::opt_text(s.contract_due.clone())),
        ("billing_due", Value::opt_text(s.billing_due.clone())),
        ("status", Value::Text(s.status.clone())),
        ("create_at", Value::opt_text(s.create_at.clone())),
        ("update_at", Value::Text(now.to_string())),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::customer::CreateCustomer;
    use crate::service::plan::test_seed::seed_package;
    use crate::service::test_support::test_service;

    fn customer(svc: &CrmService, name: &str) -> String {
        svc.create_customer(CreateCustomer {
            name: name.into(),
            ..Default::default()
        })
        .unwrap()
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn create_defaults_status_to_active() {
        let svc = test_service();
        let cid = customer(&svc, "Ana");

        let sub = svc
            .create_subscription(&cid, SubscriptionInput {
                status: Some("  ".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(sub.status, "active");
    }

    #[test]
    fn create_rejects_unknown_customer() {
        let svc = test_service();
        let err = svc
            .create_subscription("ghost", SubscriptionInput::default())
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn customer_view_joins_package_details() {
        let svc = test_service();
        let cid = customer(&svc, "Ana");
        let pkg = seed_package(&svc, "Full HD", 2);

        svc.create_subscription(&cid, SubscriptionInput {
            package_id: Some(pkg.clone()),
            contract_due: Some("2024-06-10".into()),
            ..Default::default()
        })
        .unwrap();

        let views = svc.subscriptions_for_customer(&cid).unwrap();
        assert_eq!(views.len(), 1);
        let view = &views[0];
        assert_eq!(view.subscription.package_id.as_deref(), Some(pkg.as_str()));
        assert_eq!(
            view.package.as_ref().unwrap().contract_label.as_deref(),
            Some("Full HD")
        );
        assert!(view.plan.is_none());
    }

    #[test]
    fn renew_missing_subscription_is_not_found() {
        let svc = test_service();
        let err = svc
            .renew_subscription("missing", RenewInput::default())
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn renew_first_then_annual_follows_the_billing_cadence() {
        let svc = test_service();
        let cid = customer(&svc, "Ana");
        let sub = svc
            .create_subscription(&cid, SubscriptionInput {
                contract_due: Some("2024-01-10".into()),
                ..Default::default()
            })
            .unwrap();

        // First renewal: monthly, never billed.
        let renewed = svc
            .renew_subscription_at(d("2024-01-08"), &sub.id, RenewInput::default())
            .unwrap();
        assert_eq!(renewed.contract_due.as_deref(), Some("2024-02-10"));
        assert_eq!(renewed.billing_due.as_deref(), Some("2024-02-10"));

        // Second renewal: annual. Contract jumps a year, billing one month.
        let renewed = svc
            .renew_subscription_at(
                d("2024-02-05"),
                &sub.id,
                RenewInput {
                    period: Period::Annual,
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(renewed.contract_due.as_deref(), Some("2025-02-10"));
        assert_eq!(renewed.billing_due.as_deref(), Some("2024-03-10"));
    }

    #[test]
    fn renew_activate_flag_controls_status() {
        let svc = test_service();
        let cid = customer(&svc, "Ana");
        let sub = svc
            .create_subscription(&cid, SubscriptionInput {
                status: Some("pending".into()),
                contract_due: Some("2024-01-10".into()),
                ..Default::default()
            })
            .unwrap();

        let kept = svc
            .renew_subscription_at(
                d("2024-01-08"),
                &sub.id,
                RenewInput {
                    activate: false,
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(kept.status, "pending");

        let activated = svc
            .renew_subscription_at(d("2024-01-08"), &sub.id, RenewInput::default())
            .unwrap();
        assert_eq!(activated.status, "active");
    }

    #[test]
    fn renew_manual_date_overrides_period() {
        let svc = test_service();
        let cid = customer(&svc, "Ana");
        let sub = svc
            .create_subscription(&cid, SubscriptionInput {
                contract_due: Some("2024-01-10".into()),
                billing_due: Some("2024-01-15".into()),
                ..Default::default()
            })
            .unwrap();

        let renewed = svc
            .renew_subscription_at(
                d("2024-01-08"),
                &sub.id,
                RenewInput {
                    period: Period::Semiannual,
                    manual_date: Some("2024-09-01".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(renewed.contract_due.as_deref(), Some("2024-09-01"));
        assert_eq!(renewed.billing_due.as_deref(), Some("2024-02-15"));
    }

    #[test]
    fn add_billing_month_is_independent_of_contract() {
        let svc = test_service();
        let cid = customer(&svc, "Ana");
        let sub = svc
            .create_subscription(&cid, SubscriptionInput {
                contract_due: Some("2024-06-10".into()),
                billing_due: Some("2024-01-31".into()),
                ..Default::default()
            })
            .unwrap();

        let updated = svc.add_billing_month(&sub.id).unwrap();
        assert_eq!(updated.billing_due.as_deref(), Some("2024-02-29"));
        assert_eq!(updated.contract_due.as_deref(), Some("2024-06-10"));

        // Never-billed subscriptions are left alone.
        let bare = svc
            .create_subscription(&cid, SubscriptionInput::default())
            .unwrap();
        let untouched = svc.add_billing_month(&bare.id).unwrap();
        assert_eq!(untouched.billing_due, None);
    }

    #[test]
    fn update_keeps_status_when_blank() {
        let svc = test_service();
        let cid = customer(&svc, "Ana");
        let sub = svc
            .create_subscription(&cid, SubscriptionInput {
                status: Some("pending".into()),
                ..Default::default()
            })
            .unwrap();

        let updated = svc
            .update_subscription(&sub.id, SubscriptionInput {
                identification: Some("screen 2".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(updated.status, "pending");
        assert_eq!(updated.identification.as_deref(), Some("screen 2"));
    }
}
