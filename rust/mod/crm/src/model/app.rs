use serde::{Deserialize, Serialize};

/// Catalog entry for a known app (the things customers install).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppCatalogEntry {
    pub id: String,

    pub name: String,

    /// Whether registrations of this app need a license key.
    #[serde(default)]
    pub requires_license: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_at: Option<String>,
}
