use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use super::risk_state::RiskState;

/// Number of months in a year, used for MRR normalization
const MONTHS_PER_YEAR: i64 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Frozen,
    Pending,
    Cancelled,
    Expired,
    /// Any status string we don't model. Classified like `Active`.
    Unknown,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Frozen => "frozen",
            SubscriptionStatus::Pending => "pending",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Expired => "expired",
            SubscriptionStatus::Unknown => "unknown",
        }
    }
}

impl From<&str> for SubscriptionStatus {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "active" => SubscriptionStatus::Active,
            "frozen" => SubscriptionStatus::Frozen,
            "pending" => SubscriptionStatus::Pending,
            "cancelled" | "canceled" => SubscriptionStatus::Cancelled,
            "expired" => SubscriptionStatus::Expired,
            _ => SubscriptionStatus::Unknown,
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Billing cadence, inferred from the spacing of recurring charges.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    sqlx::Type,
    AsRefStr,
    Display,
    EnumString,
)]
#[sqlx(type_name = "billing_interval", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum BillingInterval {
    Monthly,
    Annual,
}

impl BillingInterval {
    pub fn months(&self) -> u32 {
        match self {
            BillingInterval::Monthly => 1,
            BillingInterval::Annual => 12,
        }
    }

    /// Advance `date` by exactly one billing interval (calendar month or year).
    ///
    /// Month-end dates clamp to the last day of the target month.
    /// Returns `None` only if the result is out of chrono's range.
    pub fn advance(&self, date: DateTime<Utc>) -> Option<DateTime<Utc>> {
        date.checked_add_months(Months::new(self.months()))
    }

    /// Monthly equivalent of `price_cents`. Annual prices use integer division.
    pub fn monthly_amount_cents(&self, price_cents: i64) -> i64 {
        match self {
            BillingInterval::Monthly => price_cents,
            BillingInterval::Annual => price_cents / MONTHS_PER_YEAR,
        }
    }
}

/// Current billing relationship of one store domain with an app.
///
/// Derived entirely from the domain's transaction history and a reference
/// time; identified only by `(app_id, domain)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub app_id: Uuid,
    pub domain: String,
    pub plan_price_cents: i64,
    pub currency: String,
    pub billing_interval: BillingInterval,
    pub status: SubscriptionStatus,
    pub last_charge_date: Option<DateTime<Utc>>,
    pub expected_next_charge_date: Option<DateTime<Utc>>,
    pub risk_state: RiskState,
}

impl Subscription {
    pub fn monthly_normalized_price_cents(&self) -> i64 {
        self.billing_interval
            .monthly_amount_cents(self.plan_price_cents)
    }
}
