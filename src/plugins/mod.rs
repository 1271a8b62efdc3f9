pub mod cron;
pub mod server;

use tokio::{task::JoinHandle, time::sleep};

use crate::{prelude::*, state::AppState};

const RESTART_DELAY: Duration = Duration::from_secs(5);

#[async_trait::async_trait]
pub trait Plugin: Send + Sync {
  fn name(&self) -> &'static str {
    std::any::type_name::<Self>()
  }

  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()>;
}

#[derive(Default)]
pub struct App {
  plugins: Vec<Arc<dyn Plugin>>,
}

impl App {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register<P: Plugin + 'static>(mut self, plugin: P) -> Self {
    self.plugins.push(Arc::new(plugin));
    self
  }

  /// Keeps a plugin alive, restarting it whenever it returns or panics.
  fn supervise(plugin: Arc<dyn Plugin>, app: Arc<AppState>) -> JoinHandle<()> {
    tokio::spawn(async move {
      let name = plugin.name();
      info!("SYSTEM: Service `{}` initialized", name);

      loop {
        let app = app.clone();
        let plugin = plugin.clone();

        let handle = tokio::spawn(async move { plugin.start(app).await });

        match handle.await {
          Ok(Ok(())) => {
            warn!("Service `{name}` stopped unexpectedly (Ok).");
          }
          Ok(Err(err)) => {
            error!("Service `{name}` crashed with error: {err:#}.");
          }
          Err(join_err) => {
            if join_err.is_cancelled() {
              info!("Service `{}` shutdown.", name);
              break;
            } else {
              error!("Service `{}` PANICKED!", name);
            }
          }
        }

        sleep(RESTART_DELAY).await;
        info!("SYSTEM: Restarting service `{}`...", name);
      }
    })
  }

  /// Runs every plugin until the process receives Ctrl+C.
  pub async fn run(self, app: Arc<AppState>) -> anyhow::Result<()> {
    let handles: Vec<_> = self
      .plugins
      .into_iter()
      .map(|plugin| Self::supervise(plugin, app.clone()))
      .collect();

    tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl+C")?;
    info!("SYSTEM: Shutting down {} service(s)", handles.len());

    for handle in handles {
      handle.abort();
    }
    Ok(())
  }
}
