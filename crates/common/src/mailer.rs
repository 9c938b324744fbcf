use async_trait::async_trait;

use crate::{Alert, Result};

/// Delivery channel for the alert digest collected during a pass.
/// Flushed at most once per run; a delivery failure is non-fatal.
#[async_trait]
pub trait AlertMailer: Send + Sync {
    async fn deliver(&self, alerts: &[Alert]) -> Result<()>;
}

/// Default mailer: writes the digest to the log. Stands in for the external
/// email collaborator when none is configured.
pub struct LogMailer;

#[async_trait]
impl AlertMailer for LogMailer {
    async fn deliver(&self, alerts: &[Alert]) -> Result<()> {
        for alert in alerts {
            tracing::info!(alert = %alert, "alert");
        }
        Ok(())
    }
}
