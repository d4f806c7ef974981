use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use subhub_core::{ListResult, PageParams, ServiceError, new_id, now_rfc3339, today};
use subhub_sql::Value;

use crate::model::Customer;
use super::subscription::SubscriptionInput;
use super::{CrmService, contact, insert_stmt, non_blank, require, storage_err, subscription};

/// Derived per-customer status shown on the list screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenStatus {
    NoSubscription,
    Overdue,
    Ok,
}

impl ScreenStatus {
    fn as_str(self) -> &'static str {
        match self {
            ScreenStatus::NoSubscription => "no_subscription",
            ScreenStatus::Overdue => "overdue",
            ScreenStatus::Ok => "ok",
        }
    }

    fn from_str(s: &str) -> ScreenStatus {
        match s {
            "no_subscription" => ScreenStatus::NoSubscription,
            "overdue" => ScreenStatus::Overdue,
            _ => ScreenStatus::Ok,
        }
    }
}

/// Next-due-date tab filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DueFilter {
    Yesterday,
    Today,
    Tomorrow,
}

impl DueFilter {
    fn day_offset(self) -> i64 {
        match self {
            DueFilter::Yesterday => -1,
            DueFilter::Today => 0,
            DueFilter::Tomorrow => 1,
        }
    }
}

/// Sort order for the customer list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerOrder {
    #[default]
    Name,
    Due,
}

#[derive(Debug, Default, Deserialize)]
pub struct CustomerListQuery {
    #[serde(default)]
    pub q: Option<String>,

    #[serde(default)]
    pub status: Option<ScreenStatus>,

    #[serde(default)]
    pub due: Option<DueFilter>,

    #[serde(default)]
    pub order: CustomerOrder,

    #[serde(flatten)]
    pub page: PageParams,
}

/// One row of the customer list: the customer plus everything the
/// screen derives from its active subscriptions and contacts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerListRow {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_label: Option<String>,
    pub active_subscriptions: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_due: Option<String>,
    pub screen_status: ScreenStatus,
}

/// Customer detail header: the record plus its display phone.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetail {
    #[serde(flatten)]
    pub customer: Customer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Quick-search hit.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerMatch {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomer {
    pub name: String,

    #[serde(default)]
    pub note: Option<String>,

    /// First contact phone; a contact row is created when given.
    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub contact_name: Option<String>,

    /// First subscription; created together with the customer.
    #[serde(default)]
    pub subscription: Option<SubscriptionInput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerUpdate {
    pub name: String,
    #[serde(default)]
    pub note: Option<String>,
}

/// Lowercase, strip diacritics, trim — the normalized form kept in the
/// `name_norm` column for accent-insensitive lookups.
pub fn normalize_name(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
        .trim()
        .to_string()
}

/// The aggregation every customer-list read shares: one row per
/// customer with its active-subscription count, latest contract due
/// and derived screen status. The detail variant adds the display
/// phone and package label subqueries the count path does not need.
fn base_cte(where_sql: &str, today_idx: usize, with_detail: bool) -> String {
    let detail_cols = if with_detail {
        "
        (SELECT ct.phone FROM contacts ct
          WHERE ct.customer_id = c.id
            AND ct.phone IS NOT NULL AND trim(ct.phone) <> ''
          ORDER BY ct.update_at DESC NULLS LAST,
                   ct.create_at DESC NULLS LAST, ct.id DESC
          LIMIT 1) AS phone,
        (SELECT p.contract_label FROM subscriptions a2
          LEFT JOIN packages p ON p.id = a2.package_id
          WHERE a2.customer_id = c.id
            AND lower(trim(a2.status)) = 'active'
          ORDER BY a2.contract_due DESC NULLS LAST
          LIMIT 1) AS package_label,"
    } else {
        ""
    };

    format!(
        "WITH base AS (
          SELECT
            c.id AS id,
            c.name AS name,
            c.note AS note,{detail_cols}
            COUNT(a.id) AS active_subscriptions,
            MAX(a.contract_due) AS next_due,
            CASE
              WHEN COUNT(a.id) = 0 THEN 'no_subscription'
              WHEN MAX(a.contract_due) < ?{today_idx} THEN 'overdue'
              ELSE 'ok'
            END AS screen_status
          FROM customers c
          LEFT JOIN subscriptions a
            ON a.customer_id = c.id
            AND lower(trim(a.status)) = 'active'
          {where_sql}
          GROUP BY c.id, c.name, c.note
        )"
    )
}

impl CrmService {
    // ── Reads ──

    pub fn list_customers(
        &self,
        query: &CustomerListQuery,
    ) -> Result<ListResult<CustomerListRow>, ServiceError> {
        self.list_customers_at(today(), query)
    }

    pub(crate) fn list_customers_at(
        &self,
        today: chrono::NaiveDate,
        query: &CustomerListQuery,
    ) -> Result<ListResult<CustomerListRow>, ServiceError> {
        let mut params: Vec<Value> = Vec::new();

        // Pre-aggregation filter: name/note text search.
        let where_sql = match non_blank(query.q.clone()) {
            Some(q) => {
                params.push(Value::Text(format!("%{}%", q)));
                let i = params.len();
                format!("WHERE (c.name LIKE ?{i} OR COALESCE(c.note,'') LIKE ?{i})")
            }
            None => String::new(),
        };

        params.push(Value::Text(today.to_string()));
        let today_idx = params.len();

        // Post-aggregation filters: derived status and due-date tab.
        let mut post_parts: Vec<String> = Vec::new();
        if let Some(status) = query.status {
            params.push(Value::Text(status.as_str().to_string()));
            post_parts.push(format!("screen_status = ?{}", params.len()));
        }
        if let Some(due) = query.due {
            let target = today + chrono::Duration::days(due.day_offset());
            params.push(Value::Text(target.to_string()));
            post_parts.push(format!("next_due = ?{}", params.len()));
        }
        let post_where = if post_parts.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", post_parts.join(" AND "))
        };

        // Unpaged total over the same filters.
        let count_sql = format!(
            "{} SELECT COUNT(*) AS total FROM base {}",
            base_cte(&where_sql, today_idx, false),
            post_where,
        );
        let total = self
            .sql
            .query(&count_sql, &params)
            .map_err(storage_err)?
            .first()
            .and_then(|r| r.get_i64("total"))
            .unwrap_or(0) as usize;

        let order_sql = match query.order {
            CustomerOrder::Name => "ORDER BY name ASC",
            CustomerOrder::Due => {
                "ORDER BY (next_due IS NULL) ASC, next_due ASC, name ASC"
            }
        };

        let limit_idx = params.len() + 1;
        let offset_idx = params.len() + 2;
        let mut page_params = params.clone();
        page_params.push(Value::Integer(query.page.page_size() as i64));
        page_params.push(Value::Integer(query.page.offset() as i64));

        let list_sql = format!(
            "{} SELECT * FROM base {} {} LIMIT ?{} OFFSET ?{}",
            base_cte(&where_sql, today_idx, true),
            post_where,
            order_sql,
            limit_idx,
            offset_idx,
        );

        let rows = self.sql.query(&list_sql, &page_params).map_err(storage_err)?;
        let items = rows
            .iter()
            .map(|r| CustomerListRow {
                id: r.get_str("id").unwrap_or_default().to_string(),
                name: r.get_str("name").unwrap_or_default().to_string(),
                note: r.get_str("note").map(String::from),
                phone: r.get_str("phone").map(String::from),
                package_label: r.get_str("package_label").map(String::from),
                active_subscriptions: r.get_i64("active_subscriptions").unwrap_or(0),
                next_due: r.get_str("next_due").map(String::from),
                screen_status: ScreenStatus::from_str(
                    r.get_str("screen_status").unwrap_or("ok"),
                ),
            })
            .collect();

        Ok(ListResult { items, total })
    }

    pub fn get_customer(&self, id: &str) -> Result<CustomerDetail, ServiceError> {
        let customer: Customer = self.get_record("customers", id)?;

        let rows = self
            .sql
            .query(
                "SELECT phone FROM contacts
                 WHERE customer_id = ?1
                   AND phone IS NOT NULL AND trim(phone) <> ''
                 ORDER BY update_at DESC NULLS LAST,
                          create_at DESC NULLS LAST, id DESC
                 LIMIT 1",
                &[Value::Text(id.to_string())],
            )
            .map_err(storage_err)?;
        let phone = rows
            .first()
            .and_then(|r| r.get_str("phone"))
            .map(String::from);

        Ok(CustomerDetail { customer, phone })
    }

    /// Name quick-search for the lookup box: at most 10 hits, blank
    /// input short-circuits.
    pub fn search_customers(&self, q: &str) -> Result<Vec<CustomerMatch>, ServiceError> {
        let q = q.trim();
        if q.is_empty() {
            return Ok(Vec::new());
        }

        let rows = self
            .sql
            .query(
                "SELECT id, name FROM customers
                 WHERE name LIKE ?1
                 ORDER BY name ASC
                 LIMIT 10",
                &[Value::Text(format!("%{}%", q))],
            )
            .map_err(storage_err)?;

        Ok(rows
            .iter()
            .map(|r| CustomerMatch {
                id: r.get_str("id").unwrap_or_default().to_string(),
                name: r.get_str("name").unwrap_or_default().to_string(),
            })
            .collect())
    }

    // ── Writes ──

    /// Create a customer, an optional first contact and an optional
    /// first subscription in one transaction. Returns the customer id.
    pub fn create_customer(&self, input: CreateCustomer) -> Result<String, ServiceError> {
        let name = require(&input.name, "name")?;
        let now = now_rfc3339();
        let id = new_id();

        let record = Customer {
            id: id.clone(),
            name: name.clone(),
            note: non_blank(input.note),
            create_at: Some(now.clone()),
            update_at: Some(now.clone()),
        };

        let mut stmts = vec![insert_stmt(
            "customers",
            &id,
            &record,
            &customer_indexes(&record, &now),
        )?];

        if let Some(phone) = non_blank(input.phone) {
            let contact = contact::contact_record(&id, phone, input.contact_name, &now);
            stmts.push(insert_stmt(
                "contacts",
                &contact.id,
                &contact,
                &contact::contact_indexes(&contact, &now),
            )?);
        }

        if let Some(sub_input) = input.subscription {
            let sub = subscription::subscription_record(&id, sub_input, &now)?;
            stmts.push(insert_stmt(
                "subscriptions",
                &sub.id,
                &sub,
                &subscription::subscription_indexes(&sub, &now),
            )?);
        }

        self.sql.exec_batch(&stmts).map_err(storage_err)?;
        Ok(id)
    }

    pub fn update_customer(&self, id: &str, input: CustomerUpdate) -> Result<Customer, ServiceError> {
        let name = require(&input.name, "name")?;
        let current: Customer = self.get_record("customers", id)?;
        let now = now_rfc3339();

        let updated = Customer {
            name,
            note: non_blank(input.note),
            update_at: Some(now.clone()),
            ..current
        };

        self.update_record("customers", id, &updated, &customer_indexes(&updated, &now))?;
        Ok(updated)
    }

    /// Note-only update used by the inline note editor. Blank clears.
    pub fn update_customer_note(
        &self,
        id: &str,
        note: Option<String>,
    ) -> Result<Customer, ServiceError> {
        let current: Customer = self.get_record("customers", id)?;
        let now = now_rfc3339();

        let updated = Customer {
            note: non_blank(note),
            update_at: Some(now.clone()),
            ..current
        };

        self.update_record("customers", id, &updated, &customer_indexes(&updated, &now))?;
        Ok(updated)
    }

    pub fn delete_customer(&self, id: &str) -> Result<(), ServiceError> {
        self.delete_record("customers", id)
    }
}

fn customer_indexes(c: &Customer, now: &str) -> Vec<(&'static str, Value)> {
    vec![
        ("name", Value::Text(c.name.clone())),
        ("name_norm", Value::Text(normalize_name(&c.name))),
        ("note", Value::opt_text(c.note.clone())),
        ("create_at", Value::opt_text(c.create_at.clone())),
        ("update_at", Value::Text(now.to_string())),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::test_support::test_service;

    fn days_from_today(n: i64) -> String {
        (today() + chrono::Duration::days(n)).to_string()
    }

    fn create_named(svc: &CrmService, name: &str) -> String {
        svc.create_customer(CreateCustomer {
            name: name.into(),
            ..Default::default()
        })
        .unwrap()
    }

    fn create_with_sub(svc: &CrmService, name: &str, contract_due: Option<String>, status: &str) -> String {
        svc.create_customer(CreateCustomer {
            name: name.into(),
            subscription: Some(SubscriptionInput {
                contract_due,
                status: Some(status.into()),
                ..Default::default()
            }),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn normalize_name_strips_accents_and_case() {
        assert_eq!(normalize_name("  José Açaí "), "jose acai");
        assert_eq!(normalize_name("João"), "joao");
        assert_eq!(normalize_name("plain"), "plain");
    }

    #[test]
    fn create_and_get_roundtrip() {
        let svc = test_service();
        let id = svc
            .create_customer(CreateCustomer {
                name: "  Maria Silva ".into(),
                note: Some("  vip ".into()),
                phone: Some("11 99999-0000".into()),
                contact_name: Some("Maria".into()),
                subscription: None,
            })
            .unwrap();

        let detail = svc.get_customer(&id).unwrap();
        assert_eq!(detail.customer.name, "Maria Silva");
        assert_eq!(detail.customer.note.as_deref(), Some("vip"));
        assert_eq!(detail.phone.as_deref(), Some("11 99999-0000"));
    }

    #[test]
    fn create_requires_name() {
        let svc = test_service();
        let err = svc
            .create_customer(CreateCustomer {
                name: "   ".into(),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn failed_create_writes_nothing() {
        let svc = test_service();
        let err = svc.create_customer(CreateCustomer {
            name: "Ana".into(),
            phone: Some("11 98888-0000".into()),
            subscription: Some(SubscriptionInput {
                contract_due: Some("not-a-date".into()),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert!(err.is_err());

        let list = svc.list_customers(&CustomerListQuery::default()).unwrap();
        assert_eq!(list.total, 0);
    }

    #[test]
    fn screen_status_derivation() {
        let svc = test_service();
        create_named(&svc, "No Sub");
        create_with_sub(&svc, "Overdue", Some(days_from_today(-3)), "active");
        create_with_sub(&svc, "Current", Some(days_from_today(30)), "active");
        // Inactive subscription does not count.
        create_with_sub(&svc, "Inactive Sub", Some(days_from_today(30)), "inactive");

        let list = svc.list_customers(&CustomerListQuery::default()).unwrap();
        assert_eq!(list.total, 4);

        let by_name = |n: &str| {
            list.items
                .iter()
                .find(|r| r.name == n)
                .unwrap_or_else(|| panic!("missing {}", n))
                .clone()
        };
        assert_eq!(by_name("No Sub").screen_status, ScreenStatus::NoSubscription);
        assert_eq!(by_name("Overdue").screen_status, ScreenStatus::Overdue);
        assert_eq!(by_name("Current").screen_status, ScreenStatus::Ok);
        assert_eq!(by_name("Inactive Sub").screen_status, ScreenStatus::NoSubscription);
        assert_eq!(by_name("Current").active_subscriptions, 1);
        assert_eq!(by_name("Inactive Sub").active_subscriptions, 0);
    }

    #[test]
    fn status_filter_and_text_search() {
        let svc = test_service();
        create_with_sub(&svc, "Alice", Some(days_from_today(-1)), "active");
        create_with_sub(&svc, "Bob", Some(days_from_today(10)), "active");

        let overdue = svc
            .list_customers(&CustomerListQuery {
                status: Some(ScreenStatus::Overdue),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(overdue.total, 1);
        assert_eq!(overdue.items[0].name, "Alice");

        let hit = svc
            .list_customers(&CustomerListQuery {
                q: Some("bo".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(hit.total, 1);
        assert_eq!(hit.items[0].name, "Bob");
    }

    #[test]
    fn due_filter_matches_exact_day() {
        let svc = test_service();
        create_with_sub(&svc, "Today", Some(days_from_today(0)), "active");
        create_with_sub(&svc, "Tomorrow", Some(days_from_today(1)), "active");
        create_with_sub(&svc, "Later", Some(days_from_today(5)), "active");

        let due = svc
            .list_customers(&CustomerListQuery {
                due: Some(DueFilter::Tomorrow),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(due.total, 1);
        assert_eq!(due.items[0].name, "Tomorrow");
    }

    #[test]
    fn due_order_puts_dateless_last() {
        let svc = test_service();
        create_with_sub(&svc, "Soon", Some(days_from_today(2)), "active");
        create_named(&svc, "Dateless");
        create_with_sub(&svc, "Later", Some(days_from_today(9)), "active");

        let list = svc
            .list_customers(&CustomerListQuery {
                order: CustomerOrder::Due,
                ..Default::default()
            })
            .unwrap();
        let names: Vec<&str> = list.items.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Soon", "Later", "Dateless"]);
    }

    #[test]
    fn total_counts_all_pages_and_overflow_page_is_empty() {
        let svc = test_service();
        for i in 0..15 {
            create_named(&svc, &format!("Customer {:02}", i));
        }

        let page1 = svc
            .list_customers(&CustomerListQuery {
                page: PageParams { page: 1, page_size: 10 },
                ..Default::default()
            })
            .unwrap();
        assert_eq!(page1.total, 15);
        assert_eq!(page1.items.len(), 10);

        let page2 = svc
            .list_customers(&CustomerListQuery {
                page: PageParams { page: 2, page_size: 10 },
                ..Default::default()
            })
            .unwrap();
        assert_eq!(page2.total, 15);
        assert_eq!(page2.items.len(), 5);

        let beyond = svc
            .list_customers(&CustomerListQuery {
                page: PageParams { page: 9, page_size: 10 },
                ..Default::default()
            })
            .unwrap();
        assert_eq!(beyond.total, 15);
        assert!(beyond.items.is_empty());
    }

    #[test]
    fn quick_search_limits_and_short_circuits() {
        let svc = test_service();
        for i in 0..12 {
            create_named(&svc, &format!("Prefix {:02}", i));
        }

        assert!(svc.search_customers("  ").unwrap().is_empty());
        let hits = svc.search_customers("prefix").unwrap();
        assert_eq!(hits.len(), 10);
    }

    #[test]
    fn note_update_clears_on_blank_and_404s_on_missing() {
        let svc = test_service();
        let id = create_named(&svc, "Zed");

        let updated = svc.update_customer_note(&id, Some("call back".into())).unwrap();
        assert_eq!(updated.note.as_deref(), Some("call back"));

        let cleared = svc.update_customer_note(&id, Some("   ".into())).unwrap();
        assert_eq!(cleared.note, None);

        let err = svc.update_customer_note("nope", None).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn update_and_delete_customer() {
        let svc = test_service();
        let id = create_named(&svc, "Old Name");

        let updated = svc
            .update_customer(&id, CustomerUpdate { name: "New Name".into(), note: None })
            .unwrap();
        assert_eq!(updated.name, "New Name");

        svc.delete_customer(&id).unwrap();
        assert!(matches!(
            svc.get_customer(&id).unwrap_err(),
            ServiceError::NotFound(_)
        ));
        assert!(matches!(
            svc.delete_customer(&id).unwrap_err(),
            ServiceError::NotFound(_)
        ));
    }
}
