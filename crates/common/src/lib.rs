pub mod broker;
pub mod config;
pub mod error;
pub mod mailer;
pub mod types;

pub use broker::BrokerClient;
pub use config::Config;
pub use error::{Error, Result};
pub use mailer::{AlertMailer, LogMailer};
pub use types::*;
