pub mod metrics_snapshot;
pub mod risk_state;
pub mod subscription;
pub mod transaction;
