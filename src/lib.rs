pub mod config;
pub mod error;
pub mod mail;
pub mod models;

pub use config::Config;
pub use error::{MailError, Result};
pub use mail::{Mailer, Message, SendResult};
