//! Jobscout client: session controller, configuration and terminal rendering.
mod backend;
pub mod config;
mod controller;
pub mod logging;
mod observer;
pub mod reconnect;
pub mod render;

pub use backend::Backend;
pub use config::{ConfigError, ReconnectConfig, ScoutConfig};
pub use controller::SessionController;
pub use observer::{NullObserver, SessionObserver};
pub use reconnect::{ExponentialBackoff, NeverReconnect, ReconnectPolicy};
