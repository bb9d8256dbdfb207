use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Payment delinquency severity of a subscription.
///
/// Variants are declared in severity order so `Ord` follows it
/// (`Safe < OneCycleMissed < TwoCyclesMissed < Churned`). A subscription can
/// move back down the scale when new recurring charges arrive.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    sqlx::Type,
    AsRefStr,
    Display,
    EnumString,
)]
#[sqlx(type_name = "risk_state", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RiskState {
    Safe,
    OneCycleMissed,
    TwoCyclesMissed,
    Churned,
}

impl RiskState {
    /// Late but still recoverable: revenue counted as at risk rather than active or lost.
    pub fn is_at_risk(&self) -> bool {
        matches!(self, RiskState::OneCycleMissed | RiskState::TwoCyclesMissed)
    }

    pub fn is_churned(&self) -> bool {
        matches!(self, RiskState::Churned)
    }
}
