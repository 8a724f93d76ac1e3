//! Linkprobe server: configuration, WebSocket routes and per-connection sessions.
pub mod config;
pub mod routes;
pub mod session;

pub use config::{config_path, load_config, ConfigError, ServerConfig, CONFIG_ENV};
pub use routes::{router, serve};
pub use session::{run_session, Inbound, SessionError, SessionSummary, Transport};
