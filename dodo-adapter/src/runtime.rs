//! Adapter runtime: owns the configured bots, runs one gateway session per
//! bot, and coordinates bounded shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::bot::{DodoBot, EventHandler};
use crate::config::AdapterConfig;
use crate::session::GatewaySession;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Owns the set of configured bots and their session tasks. No global state:
/// shutdown fans out over the handles held here.
pub struct AdapterRuntime {
    handler: Arc<dyn EventHandler>,
    bots: Vec<Arc<DodoBot>>,
    tasks: Vec<JoinHandle<()>>,
}

impl AdapterRuntime {
    pub fn new(config: AdapterConfig, handler: Arc<dyn EventHandler>) -> Self {
        let bots = config
            .bots
            .iter()
            .map(|bot| Arc::new(DodoBot::new(bot.clone(), &config.api_base)))
            .collect();
        Self {
            handler,
            bots,
            tasks: Vec::new(),
        }
    }

    pub fn bots(&self) -> &[Arc<DodoBot>] {
        &self.bots
    }

    pub fn bot(&self, client_id: &str) -> Option<Arc<DodoBot>> {
        self.bots
            .iter()
            .find(|bot| bot.client_id() == client_id)
            .cloned()
    }

    /// Spawns one gateway session per configured bot.
    pub fn start(&mut self) {
        for bot in &self.bots {
            let session = GatewaySession::new(bot.clone(), self.handler.clone());
            self.tasks.push(tokio::spawn(session.run()));
        }
        info!(bots = self.tasks.len(), "adapter runtime started");
    }

    /// Cancels every session and waits up to a bounded timeout per task.
    /// Tasks that do not finish in time are abandoned, not treated as fatal.
    pub async fn shutdown(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
            if timeout(SHUTDOWN_TIMEOUT, task).await.is_err() {
                warn!("session task did not finish within shutdown timeout, abandoning");
            }
        }
        info!("adapter runtime stopped");
    }
}
