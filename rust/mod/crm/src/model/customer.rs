use serde::{Deserialize, Serialize};

/// Customer — the person a reseller sells subscriptions to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,

    pub name: String,

    /// Free-text operator note, shown on the customer list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_json_roundtrip() {
        let c = Customer {
            id: "c1".into(),
            name: "Maria Silva".into(),
            note: Some("prefers pix".into()),
            create_at: None,
            update_at: None,
        };
        let json = serde_json::to_string(&c).unwrap();
        let back: Customer = serde_json::from_str(&json).unwrap();
        assert_eq!(c, back);
    }
}
