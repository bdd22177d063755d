pub mod address_book;
pub mod assembler;
pub mod content;
pub mod dispatcher;
pub mod job;
pub mod message;
pub mod planner;
pub mod postmark;
pub mod transport;
pub mod variables;

use std::sync::Arc;

pub use address_book::{AddressBook, AddressInput};
pub use assembler::Defaults;
pub use content::{GuessMime, HtmlToText, MimeLookup, StripTags};
pub use dispatcher::SendResult;
pub use job::SendJob;
pub use message::{Message, TemplateSpec};
pub use planner::{SendPlan, Strategy, BATCH_LIMIT, TO_LIMIT};
pub use postmark::PostmarkClient;
pub use transport::Transport;
pub use variables::RecipientVariables;

use crate::config::Config;
use crate::error::Result;
use crate::models::SendResponse;

/// Sender bound to one transport and the process-wide defaults.
///
/// Holds the result of the most recent `send`; one send at a time per instance.
pub struct Mailer<T: Transport = PostmarkClient> {
    transport: T,
    defaults: Defaults,
    html_to_text: Arc<dyn HtmlToText>,
    mime: Arc<dyn MimeLookup>,
    last: SendResult,
}

impl Mailer<PostmarkClient> {
    /// Create mailer from env (POSTMARK_SERVER_TOKEN, POSTMARK_SENDER_SIGNATURE, etc.)
    pub fn new_from_env() -> Result<Self> {
        let config = Config::from_env()?;
        Self::from_config(&config)
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::with_transport(PostmarkClient::from_config(config)?, config))
    }
}

impl<T: Transport> Mailer<T> {
    pub fn with_transport(transport: T, config: &Config) -> Self {
        Self {
            transport,
            defaults: Defaults::from(config),
            html_to_text: Arc::new(StripTags),
            mime: Arc::new(GuessMime),
            last: SendResult::default(),
        }
    }

    pub fn with_html_to_text(mut self, renderer: Arc<dyn HtmlToText>) -> Self {
        self.html_to_text = renderer;
        self
    }

    pub fn with_mime_lookup(mut self, lookup: Arc<dyn MimeLookup>) -> Self {
        self.mime = lookup;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    /// Build the plan for `message` without sending it
    pub async fn plan(&self, message: &Message) -> Result<SendPlan> {
        let base = assembler::assemble(
            message,
            &self.defaults,
            self.html_to_text.as_ref(),
            self.mime.as_ref(),
        )
        .await?;
        planner::plan(message, &base)
    }

    /// Send `message` and return the number of recipients reported as sent.
    ///
    /// Transport failures are logged and show up as a 0 (or partial) count,
    /// never as `Err`. `Err` is reserved for messages that cannot be planned:
    /// no recipients, no sender, bad template reference.
    pub async fn send(&mut self, message: &Message) -> Result<usize> {
        self.last = SendResult::default();

        let plan = self.plan(message).await?;
        let result = dispatcher::dispatch(&self.transport, &plan).await;

        tracing::info!(
            strategy = ?plan.strategy,
            recipients = plan.recipients,
            payloads = plan.payloads.len(),
            accepted = result.accepted(),
            sent = result.sent(),
            "Send finished"
        );

        let sent = result.sent();
        self.last = result;
        Ok(sent)
    }

    /// Response by position, or the latest response when `index` is `None`
    pub fn response(&self, index: Option<usize>) -> Option<&SendResponse> {
        match index {
            Some(index) => self.last.response_at(index),
            None => self.last.latest(),
        }
    }

    /// Accepted responses of the last batch send
    pub fn responses(&self) -> &[SendResponse] {
        self.last.responses()
    }

    pub fn last_result(&self) -> &SendResult {
        &self.last
    }
}
