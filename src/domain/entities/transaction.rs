use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Kind of charge recorded on the ledger.
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
#[sqlx(type_name = "charge_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ChargeType {
    Recurring,
    Usage,
    OneTime,
    Refund,
}

/// A single immutable ledger entry supplied by the payment platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub app_id: Uuid,
    /// Store domain the charge belongs to (one billing relationship per domain).
    pub domain: String,
    pub charge_type: ChargeType,
    pub gross_amount_cents: i64,
    pub net_amount_cents: i64,
    pub currency: String,
    pub transaction_date: DateTime<Utc>,
}

impl Transaction {
    pub fn is_recurring(&self) -> bool {
        self.charge_type == ChargeType::Recurring
    }

    /// Gross amount, or net when the platform did not report a gross figure.
    pub fn price_cents(&self) -> i64 {
        if self.gross_amount_cents == 0 {
            self.net_amount_cents
        } else {
            self.gross_amount_cents
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn tx(gross: i64, net: i64) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            app_id: Uuid::new_v4(),
            domain: "shop.example.com".to_string(),
            charge_type: ChargeType::Recurring,
            gross_amount_cents: gross,
            net_amount_cents: net,
            currency: "USD".to_string(),
            transaction_date: Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_price_prefers_gross() {
        assert_eq!(tx(2999, 2399).price_cents(), 2999);
    }

    #[test]
    fn test_price_falls_back_to_net() {
        assert_eq!(tx(0, 2399).price_cents(), 2399);
    }

    #[test]
    fn test_charge_type_parse() {
        assert_eq!("one_time".parse::<ChargeType>().unwrap(), ChargeType::OneTime);
        assert_eq!("REFUND".parse::<ChargeType>().unwrap(), ChargeType::Refund);
    }
}
