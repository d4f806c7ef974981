//! Dashboard aggregation queries.

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::Serialize;

use subhub_core::{ServiceError, today};
use subhub_sql::Value;

use super::{CrmService, storage_err};

/// Headline numbers for the dashboard cards.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_customers: i64,
    /// Customers with an active subscription still inside its contract.
    pub active_customers: i64,
    /// Customers whose active subscription's contract already ended.
    pub lapsed_customers: i64,
    pub without_subscription: i64,
    pub due_today: i64,
    pub due_in_7_days: i64,
    pub overdue: i64,
    pub revenue_current_month: f64,
    pub revenue_previous_month: f64,
}

/// One month of the payments chart.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPayments {
    /// ISO month key, `YYYY-MM`.
    pub month: String,
    /// Short month label ("Jan", "Feb", ...).
    pub label: String,
    pub year: i32,
    pub total: f64,
    pub count: i64,
}

/// One slice of the payment-method chart.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodPayments {
    pub method: String,
    pub total: f64,
    pub count: i64,
}

/// Active-subscription share per package.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageStats {
    pub package: String,
    pub count: i64,
    /// Share of active subscriptions, percent with one decimal.
    pub share: f64,
}

/// Active-subscription count and plan revenue per plan kind.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanStats {
    pub plan: String,
    pub count: i64,
    pub revenue: f64,
}

/// A contract ending within the dashboard's lookahead window.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingRenewal {
    pub customer_id: String,
    pub name: String,
    pub contract_due: String,
    pub days_left: i64,
    pub package: String,
}

const NO_PACKAGE: &str = "No package";
const NO_PLAN: &str = "No plan";
const UNSPECIFIED: &str = "Unspecified";

fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

fn month_label(month: u32) -> &'static str {
    const LABELS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun",
        "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    LABELS[((month.clamp(1, 12)) - 1) as usize]
}

impl CrmService {
    pub fn dashboard_metrics(&self) -> Result<DashboardMetrics, ServiceError> {
        self.dashboard_metrics_at(today())
    }

    pub(crate) fn dashboard_metrics_at(
        &self,
        today: NaiveDate,
    ) -> Result<DashboardMetrics, ServiceError> {
        let today_s = today.to_string();

        // Customer split over active subscriptions. A customer holding
        // both a running and a lapsed active subscription counts on
        // both sides, as the cards always have.
        let customers = self
            .sql
            .query(
                "SELECT
                   COUNT(DISTINCT c.id) AS total_customers,
                   COUNT(DISTINCT CASE WHEN a.id IS NOT NULL
                     AND a.contract_due >= ?1 THEN c.id END) AS active_customers,
                   COUNT(DISTINCT CASE WHEN a.id IS NOT NULL
                     AND a.contract_due < ?1 THEN c.id END) AS lapsed_customers,
                   COUNT(DISTINCT CASE WHEN a.id IS NULL THEN c.id END) AS without_subscription
                 FROM customers c
                 LEFT JOIN subscriptions a
                   ON a.customer_id = c.id
                   AND lower(trim(a.status)) = 'active'",
                &[Value::Text(today_s.clone())],
            )
            .map_err(storage_err)?;
        let c = customers
            .first()
            .ok_or_else(|| ServiceError::Internal("empty aggregate".into()))?;

        let week = (today + Duration::days(7)).to_string();
        let dues = self
            .sql
            .query(
                "SELECT
                   COUNT(DISTINCT CASE WHEN contract_due = ?1 THEN customer_id END) AS due_today,
                   COUNT(DISTINCT CASE WHEN contract_due BETWEEN ?1 AND ?2 THEN customer_id END) AS due_week,
                   COUNT(DISTINCT CASE WHEN contract_due < ?1 THEN customer_id END) AS overdue
                 FROM subscriptions
                 WHERE lower(trim(status)) = 'active'",
                &[Value::Text(today_s), Value::Text(week)],
            )
            .map_err(storage_err)?;
        let d = dues
            .first()
            .ok_or_else(|| ServiceError::Internal("empty aggregate".into()))?;

        let current = month_key(today);
        let previous = month_key(
            today
                .checked_sub_months(Months::new(1))
                .unwrap_or(today),
        );
        let revenue = self
            .sql
            .query(
                "SELECT
                   COALESCE(SUM(CASE WHEN substr(paid_at, 1, 7) = ?1 THEN amount END), 0) AS current_month,
                   COALESCE(SUM(CASE WHEN substr(paid_at, 1, 7) = ?2 THEN amount END), 0) AS previous_month
                 FROM payments
                 WHERE paid_at IS NOT NULL",
                &[Value::Text(current), Value::Text(previous)],
            )
            .map_err(storage_err)?;
        let r = revenue
            .first()
            .ok_or_else(|| ServiceError::Internal("empty aggregate".into()))?;

        Ok(DashboardMetrics {
            total_customers: c.get_i64("total_customers").unwrap_or(0),
            active_customers: c.get_i64("active_customers").unwrap_or(0),
            lapsed_customers: c.get_i64("lapsed_customers").unwrap_or(0),
            without_subscription: c.get_i64("without_subscription").unwrap_or(0),
            due_today: d.get_i64("due_today").unwrap_or(0),
            due_in_7_days: d.get_i64("due_week").unwrap_or(0),
            overdue: d.get_i64("overdue").unwrap_or(0),
            revenue_current_month: r.get_f64("current_month").unwrap_or(0.0),
            revenue_previous_month: r.get_f64("previous_month").unwrap_or(0.0),
        })
    }

    /// Payment totals per calendar month over the trailing window,
    /// oldest first.
    pub fn payments_by_month(&self, months: u32) -> Result<Vec<MonthlyPayments>, ServiceError> {
        self.payments_by_month_at(today(), months)
    }

    pub(crate) fn payments_by_month_at(
        &self,
        today: NaiveDate,
        months: u32,
    ) -> Result<Vec<MonthlyPayments>, ServiceError> {
        let start = today
            .checked_sub_months(Months::new(months))
            .unwrap_or(today);

        let rows = self
            .sql
            .query(
                "SELECT substr(paid_at, 1, 7) AS month,
                        COALESCE(SUM(amount), 0) AS total,
                        COUNT(*) AS count
                 FROM payments
                 WHERE paid_at IS NOT NULL AND paid_at >= ?1
                 GROUP BY substr(paid_at, 1, 7)
                 ORDER BY month ASC",
                &[Value::Text(start.to_string())],
            )
            .map_err(storage_err)?;

        Ok(rows
            .iter()
            .map(|r| {
                let month = r.get_str("month").unwrap_or_default().to_string();
                let year = month.get(0..4).and_then(|y| y.parse().ok()).unwrap_or(0);
                let month_no: u32 = month.get(5..7).and_then(|m| m.parse().ok()).unwrap_or(1);
                MonthlyPayments {
                    label: month_label(month_no).to_string(),
                    year,
                    month,
                    total: r.get_f64("total").unwrap_or(0.0),
                    count: r.get_i64("count").unwrap_or(0),
                }
            })
            .collect())
    }

    /// Payment totals per method over the trailing window, largest
    /// first. Payments with no method land under a placeholder label.
    pub fn payments_by_method(&self, days: u32) -> Result<Vec<MethodPayments>, ServiceError> {
        self.payments_by_method_at(today(), days)
    }

    pub(crate) fn payments_by_method_at(
        &self,
        today: NaiveDate,
        days: u32,
    ) -> Result<Vec<MethodPayments>, ServiceError> {
        let start = today - Duration::days(days as i64);

        let rows = self
            .sql
            .query(
                "SELECT COALESCE(method, ?2) AS method,
                        COALESCE(SUM(amount), 0) AS total,
                        COUNT(*) AS count
                 FROM payments
                 WHERE paid_at IS NOT NULL AND paid_at >= ?1
                 GROUP BY method
                 ORDER BY total DESC",
                &[
                    Value::Text(start.to_string()),
                    Value::Text(UNSPECIFIED.to_string()),
                ],
            )
            .map_err(storage_err)?;

        Ok(rows
            .iter()
            .map(|r| MethodPayments {
                method: r.get_str("method").unwrap_or(UNSPECIFIED).to_string(),
                total: r.get_f64("total").unwrap_or(0.0),
                count: r.get_i64("count").unwrap_or(0),
            })
            .collect())
    }

    /// Active subscriptions per package, with each package's share of
    /// the active total as a one-decimal percentage.
    pub fn package_stats(&self) -> Result<Vec<PackageStats>, ServiceError> {
        let rows = self
            .sql
            .query(
                "WITH total AS (
                   SELECT COUNT(*) AS total FROM subscriptions
                   WHERE lower(trim(status)) = 'active'
                 )
                 SELECT COALESCE(p.contract_label, ?1) AS package,
                        COUNT(*) AS count,
                        t.total AS total
                 FROM subscriptions a
                 LEFT JOIN packages p ON p.id = a.package_id
                 CROSS JOIN total t
                 WHERE lower(trim(a.status)) = 'active'
                 GROUP BY p.contract_label, t.total
                 ORDER BY count DESC",
                &[Value::Text(NO_PACKAGE.to_string())],
            )
            .map_err(storage_err)?;

        Ok(rows
            .iter()
            .map(|r| {
                let count = r.get_i64("count").unwrap_or(0);
                let total = r.get_i64("total").unwrap_or(0);
                let share = if total > 0 {
                    ((count as f64 / total as f64) * 1000.0).round() / 10.0
                } else {
                    0.0
                };
                PackageStats {
                    package: r.get_str("package").unwrap_or(NO_PACKAGE).to_string(),
                    count,
                    share,
                }
            })
            .collect())
    }

    /// Active subscriptions per plan kind with the summed plan price.
    pub fn plan_stats(&self) -> Result<Vec<PlanStats>, ServiceError> {
        let rows = self
            .sql
            .query(
                "SELECT COALESCE(pl.kind, ?1) AS plan,
                        COUNT(*) AS count,
                        COALESCE(SUM(pl.price), 0) AS revenue
                 FROM subscriptions a
                 LEFT JOIN plans pl ON pl.id = a.plan_id
                 WHERE lower(trim(a.status)) = 'active'
                 GROUP BY pl.kind
                 ORDER BY count DESC",
                &[Value::Text(NO_PLAN.to_string())],
            )
            .map_err(storage_err)?;

        Ok(rows
            .iter()
            .map(|r| PlanStats {
                plan: r.get_str("plan").unwrap_or(NO_PLAN).to_string(),
                count: r.get_i64("count").unwrap_or(0),
                revenue: r.get_f64("revenue").unwrap_or(0.0),
            })
            .collect())
    }

    /// The next contracts to end, at most 10, soonest first.
    pub fn upcoming_renewals(&self, days: u32) -> Result<Vec<UpcomingRenewal>, ServiceError> {
        self.upcoming_renewals_at(today(), days)
    }

    pub(crate) fn upcoming_renewals_at(
        &self,
        today: NaiveDate,
        days: u32,
    ) -> Result<Vec<UpcomingRenewal>, ServiceError> {
        let cutoff = today + Duration::days(days as i64);

        let rows = self
            .sql
            .query(
                "SELECT c.id AS customer_id,
                        c.name AS name,
                        a.contract_due AS contract_due,
                        COALESCE(p.contract_label, ?3) AS package
                 FROM subscriptions a
                 JOIN customers c ON c.id = a.customer_id
                 LEFT JOIN packages p ON p.id = a.package_id
                 WHERE lower(trim(a.status)) = 'active'
                   AND a.contract_due BETWEEN ?1 AND ?2
                 ORDER BY a.contract_due ASC
                 LIMIT 10",
                &[
                    Value::Text(today.to_string()),
                    Value::Text(cutoff.to_string()),
                    Value::Text(NO_PACKAGE.to_string()),
                ],
            )
            .map_err(storage_err)?;

        Ok(rows
            .iter()
            .map(|r| {
                let contract_due = r.get_str("contract_due").unwrap_or_default().to_string();
                let days_left = NaiveDate::parse_from_str(&contract_due, "%Y-%m-%d")
                    .map(|d| (d - today).num_days())
                    .unwrap_or(0);
                UpcomingRenewal {
                    customer_id: r.get_str("customer_id").unwrap_or_default().to_string(),
                    name: r.get_str("name").unwrap_or_default().to_string(),
                    contract_due,
                    days_left,
                    package: r.get_str("package").unwrap_or(NO_PACKAGE).to_string(),
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::customer::CreateCustomer;
    use crate::service::payment::PaymentInput;
    use crate::service::plan::PlanInput;
    use crate::service::plan::test_seed::seed_package;
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

    fn sub(svc: &CrmService, cid: &str, contract: Option<&str>, status: &str, package: Option<&str>, plan: Option<&str>) {
        svc.create_subscription(cid, SubscriptionInput {
            contract_due: contract.map(String::from),
            status: Some(status.into()),
            package_id: package.map(String::from),
            plan_id: plan.map(String::from),
            ..Default::default()
        })
        .unwrap();
    }

    fn pay(svc: &CrmService, cid: &str, date: &str, method: Option<&str>, amount: f64) {
        svc.create_payment(cid, PaymentInput {
            paid_at: Some(date.into()),
            method: method.map(String::from),
            amount: Some(amount),
            ..Default::default()
        })
        .unwrap();
    }

    #[test]
    fn metrics_split_customers_and_months() {
        let svc = test_service();
        let today = d("2024-03-15");

        let current = customer(&svc, "Current");
        sub(&svc, &current, Some("2024-04-01"), "active", None, None);

        let lapsed = customer(&svc, "Lapsed");
        sub(&svc, &lapsed, Some("2024-03-01"), "active", None, None);

        customer(&svc, "Bare");

        let due_today = customer(&svc, "Due Today");
        sub(&svc, &due_today, Some("2024-03-15"), "active", None, None);

        pay(&svc, &current, "2024-03-10", Some("pix"), 100.0);
        pay(&svc, &current, "2024-03-12", Some("pix"), 50.0);
        pay(&svc, &lapsed, "2024-02-20", Some("card"), 70.0);
        pay(&svc, &lapsed, "2023-12-01", Some("card"), 999.0);

        let m = svc.dashboard_metrics_at(today).unwrap();
        assert_eq!(m.total_customers, 4);
        assert_eq!(m.active_customers, 2); // Current + Due Today
        assert_eq!(m.lapsed_customers, 1);
        assert_eq!(m.without_subscription, 1);
        assert_eq!(m.due_today, 1);
        assert_eq!(m.due_in_7_days, 1);
        assert_eq!(m.overdue, 1);
        assert_eq!(m.revenue_current_month, 150.0);
        assert_eq!(m.revenue_previous_month, 70.0);
    }

    #[test]
    fn monthly_buckets_are_oldest_first() {
        let svc = test_service();
        let cid = customer(&svc, "Ana");
        pay(&svc, &cid, "2024-01-10", None, 10.0);
        pay(&svc, &cid, "2024-01-20", None, 15.0);
        pay(&svc, &cid, "2024-03-05", None, 40.0);
        pay(&svc, &cid, "2023-01-01", None, 99.0); // outside the window

        let months = svc.payments_by_month_at(d("2024-03-15"), 6).unwrap();
        assert_eq!(months.len(), 2);
        assert_eq!(months[0].month, "2024-01");
        assert_eq!(months[0].label, "Jan");
        assert_eq!(months[0].year, 2024);
        assert_eq!(months[0].total, 25.0);
        assert_eq!(months[0].count, 2);
        assert_eq!(months[1].month, "2024-03");
        assert_eq!(months[1].total, 40.0);
    }

    #[test]
    fn method_buckets_sort_by_total() {
        let svc = test_service();
        let cid = customer(&svc, "Ana");
        pay(&svc, &cid, "2024-03-10", Some("pix"), 30.0);
        pay(&svc, &cid, "2024-03-11", Some("pix"), 30.0);
        pay(&svc, &cid, "2024-03-12", Some("card"), 80.0);
        pay(&svc, &cid, "2024-03-13", None, 5.0);
        pay(&svc, &cid, "2024-01-01", Some("cash"), 999.0); // outside the window

        let methods = svc.payments_by_method_at(d("2024-03-15"), 30).unwrap();
        let keys: Vec<(&str, f64)> = methods
            .iter()
            .map(|m| (m.method.as_str(), m.total))
            .collect();
        assert_eq!(
            keys,
            vec![("card", 80.0), ("pix", 60.0), ("Unspecified", 5.0)]
        );
    }

    #[test]
    fn package_share_has_one_decimal() {
        let svc = test_service();
        let cid = customer(&svc, "Ana");
        let gold = seed_package(&svc, "Gold", 2);

        sub(&svc, &cid, None, "active", Some(&gold), None);
        sub(&svc, &cid, None, "active", Some(&gold), None);
        sub(&svc, &cid, None, "active", None, None);

        let stats = svc.package_stats().unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].package, "Gold");
        assert_eq!(stats[0].count, 2);
        assert_eq!(stats[0].share, 66.7);
        assert_eq!(stats[1].package, "No package");
        assert_eq!(stats[1].share, 33.3);
    }

    #[test]
    fn plan_stats_sum_plan_prices() {
        let svc = test_service();
        let cid = customer(&svc, "Ana");
        let premium = svc
            .create_plan(PlanInput {
                kind: "premium".into(),
                price: Some(50.0),
                ..Default::default()
            })
            .unwrap();

        sub(&svc, &cid, None, "active", None, Some(&premium.id));
        sub(&svc, &cid, None, "active", None, Some(&premium.id));
        sub(&svc, &cid, None, "active", None, None);

        let stats = svc.plan_stats().unwrap();
        assert_eq!(stats[0].plan, "premium");
        assert_eq!(stats[0].count, 2);
        assert_eq!(stats[0].revenue, 100.0);
        assert_eq!(stats[1].plan, "No plan");
    }

    #[test]
    fn upcoming_renewals_window_and_days_left() {
        let svc = test_service();
        let today = d("2024-03-15");
        let cid = customer(&svc, "Ana");

        sub(&svc, &cid, Some("2024-03-14"), "active", None, None); // past
        sub(&svc, &cid, Some("2024-03-16"), "active", None, None);
        sub(&svc, &cid, Some("2024-03-22"), "active", None, None); // edge
        sub(&svc, &cid, Some("2024-03-23"), "active", None, None); // beyond

        let upcoming = svc.upcoming_renewals_at(today, 7).unwrap();
        let dues: Vec<&str> = upcoming.iter().map(|u| u.contract_due.as_str()).collect();
        assert_eq!(dues, vec!["2024-03-16", "2024-03-22"]);
        assert_eq!(upcoming[0].days_left, 1);
        assert_eq!(upcoming[0].package, "No package");
    }
}
