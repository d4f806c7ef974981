use serde::{Deserialize, Serialize};

/// Subscription — links a customer to a package/plan and carries the two
/// independently tracked due dates.
///
/// `contract_due` is when the contract term ends; `billing_due` is when
/// the next monthly bill is expected. Renewal advances them by different
/// amounts (see `service::renewal`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: String,

    pub customer_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,

    /// Contract due date, ISO `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_due: Option<String>,

    /// Billing due date, ISO `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_due: Option<String>,

    /// Free-form status text ("active", "inactive", "pending", ...).
    pub status: String,

    /// Free-text identification of the account/screen this covers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identification: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_at: Option<String>,
}
