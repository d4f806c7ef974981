use serde::{Deserialize, Serialize};

/// Package — contract reference table: the channel package a
/// subscription resells, with its screen count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screens: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_at: Option<String>,
}
