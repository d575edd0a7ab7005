pub mod config;
pub mod dispatcher;
pub mod error;
pub mod interfaces;
pub mod logging;

pub type Result<T> = std::result::Result<T, error::PacerError>;

pub use config::{DispatcherConfig, DispatcherSettings};
pub use dispatcher::Dispatcher;
pub use interfaces::worker::Worker;
