use async_trait::async_trait;

use crate::{plugins::Plugin, prelude::*, state::AppState};

/// Pushes tutor statuses that failed to reach the identity provider.
pub struct Reconcile;

#[async_trait]
impl Plugin for Reconcile {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let period = app.config.reconcile_interval;
    if period.is_zero() {
      info!("Reconcile disabled via config (0 interval)");
      return std::future::pending().await;
    }

    info!(
      "Reconcile started (interval: {}, batch: {})",
      humantime::format_duration(period),
      app.config.reconcile_batch
    );

    let mut interval = tokio::time::interval(period);
    loop {
      interval.tick().await;

      match app.sv().moderation.reconcile(app.config.reconcile_batch).await {
        Ok(0) => debug!("Reconcile: nothing to push"),
        Ok(synced) => info!("Reconcile: pushed {synced} tutor status(es)"),
        Err(err) => error!("Reconcile failed: {err}"),
      }
    }
  }
}
