//! Renewal date arithmetic.
//!
//! A renewal advances the two due dates by different amounts: the
//! contract due date moves by the full chosen period, while the billing
//! due date always moves by exactly one month — billing stays on a
//! monthly cadence regardless of the contract term.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use subhub_core::add_months;

/// Renewal period, in whole contract terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Monthly,
    Quarterly,
    Semiannual,
    Annual,
}

impl Default for Period {
    fn default() -> Self {
        Self::Monthly
    }
}

impl Period {
    /// Number of calendar months the contract advances.
    pub fn months(self) -> u32 {
        match self {
            Period::Monthly => 1,
            Period::Quarterly => 3,
            Period::Semiannual => 6,
            Period::Annual => 12,
        }
    }
}

/// The dates a renewal produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenewedDates {
    pub contract_due: NaiveDate,
    pub billing_due: NaiveDate,
}

/// Compute the post-renewal due dates from the pre-renewal row.
///
/// - New contract due: `manual` when given, else the current contract
///   due (or `today` when the subscription never had one) plus the
///   period.
/// - New billing due: a subscription that never billed adopts the new
///   contract due as its first billing date; otherwise the existing
///   billing due advances one month, independent of the period.
pub fn compute(
    contract_due: Option<NaiveDate>,
    billing_due: Option<NaiveDate>,
    period: Period,
    manual: Option<NaiveDate>,
    today: NaiveDate,
) -> RenewedDates {
    let new_contract = match manual {
        Some(d) => d,
        None => add_months(contract_due.unwrap_or(today), period.months()),
    };

    let new_billing = match billing_due {
        None => new_contract,
        Some(d) => add_months(d, 1),
    };

    RenewedDates {
        contract_due: new_contract,
        billing_due: new_billing,
    }
}
