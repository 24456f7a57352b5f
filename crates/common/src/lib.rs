pub mod channel;
pub mod config;
pub mod error;
pub mod types;

pub use channel::{IndicatorStore, NotificationSink, TriggerSource};
pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use types::*;
