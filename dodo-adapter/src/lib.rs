//! # DoDo adapter
//!
//! Client-side adapter for the DoDo open platform: authenticated REST calls,
//! the realtime event gateway (connect, heartbeat, receive/dispatch,
//! reconnect), and the segment-based message model with mention resolution.
//! Host frameworks implement [`EventHandler`] and drive sends through
//! [`DodoBot`]; [`AdapterRuntime`] runs one [`session::GatewaySession`] per
//! configured bot.

pub mod api;
pub mod bot;
pub mod card;
pub mod config;
pub mod error;
pub mod event;
pub mod logger;
pub mod mention;
pub mod message;
pub mod model;
pub mod runtime;
pub mod session;

pub use api::ApiClient;
pub use bot::{DodoBot, EventHandler};
pub use config::{AdapterConfig, BotConfig, DEFAULT_API_BASE};
pub use error::{AdapterError, Result};
pub use event::{decode_frame, DispatchResult, Event};
pub use logger::init_tracing;
pub use message::{Message, MessageSegment};
pub use model::{BotInfo, MessageBody, MessageType};
pub use runtime::AdapterRuntime;
pub use session::{GatewaySession, SessionState};
