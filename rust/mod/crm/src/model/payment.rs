use serde::{Deserialize, Serialize};

/// Payment — a single payment recorded against a customer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,

    pub customer_id: String,

    /// Payment date, ISO `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<String>,

    /// Payment method ("pix", "card", ...), free text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    /// Payment kind ("renewal", "credit", ...), free text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Reference of the purchase this payment settles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_ref: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_json_roundtrip() {
        let p = Payment {
            id: "p1".into(),
            customer_id: "c1".into(),
            paid_at: Some("2024-03-01".into()),
            method: Some("pix".into()),
            amount: Some(35.0),
            details: None,
            kind: Some("renewal".into()),
            purchase_ref: None,
            create_at: None,
            update_at: None,
        };
        let json = serde_json::to_string(&p).unwrap();
        let back: Payment = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }
}
