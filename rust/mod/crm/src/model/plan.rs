use serde::{Deserialize, Serialize};

/// Plan — pricing reference: what a subscription of a given kind,
/// screen count and duration costs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: String,

    /// Plan kind label ("standard", "premium", ...).
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screens: Option<i64>,

    /// Contract duration in months.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub months: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_at: Option<String>,
}
