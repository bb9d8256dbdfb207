pub mod ledger;
pub mod metrics;
pub mod period_metrics;
pub mod risk_classifier;
