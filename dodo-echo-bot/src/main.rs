//! Echo bot demo: connects the configured bots and echoes every channel
//! message that @-mentions the bot back into the channel, as a reply.
//! Config comes from env (`.env` supported); credentials can be overridden
//! on the command line.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use tracing::{error, info};

use dodo_adapter::{
    init_tracing, AdapterConfig, AdapterRuntime, BotConfig, BotInfo, DodoBot, Event, EventHandler,
};

#[derive(Parser)]
#[command(name = "dodo-echo-bot")]
#[command(about = "DoDo echo bot: replies to channel messages that mention it", long_about = None)]
#[command(version)]
struct Cli {
    /// Bot client id (overrides DODO_CLIENT_ID).
    #[arg(long)]
    client_id: Option<String>,
    /// Bot token (overrides DODO_TOKEN).
    #[arg(long)]
    token: Option<String>,
}

struct EchoHandler;

#[async_trait]
impl EventHandler for EchoHandler {
    async fn dispatch(&self, bot: Arc<DodoBot>, event: Event) {
        if let Event::ChannelMessage(ev) = &event {
            info!(
                channel_id = %ev.channel_id,
                user_id = %ev.dodo_source_id,
                content = %ev.message(),
                to_me = ev.to_me,
                "received channel message"
            );
            if ev.to_me {
                if let Err(e) = bot.send_with(&event, ev.message(), false, true).await {
                    error!(error = %e, channel_id = %ev.channel_id, "failed to echo message");
                }
            }
        }
    }

    async fn on_connect(&self, bot_info: &BotInfo) {
        info!(bot = %bot_info.nick_name, "bot connected");
    }

    async fn on_disconnect(&self, bot_info: &BotInfo) {
        info!(bot = %bot_info.nick_name, "bot disconnected");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = AdapterConfig::load()?;
    if let (Some(client_id), Some(token)) = (cli.client_id, cli.token) {
        config.bots = vec![BotConfig { client_id, token }];
    }
    config.validate()?;

    std::fs::create_dir_all("logs")?;
    init_tracing(&config.log_file)?;

    let mut runtime = AdapterRuntime::new(config, Arc::new(EchoHandler));
    runtime.start();

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    runtime.shutdown().await;

    Ok(())
}
