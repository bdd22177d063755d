pub mod address;
pub mod payload;
pub mod response;

pub use address::{join_addresses, mailbox, Address, RecipientClass};
pub use payload::{Attachment, Header, Payload, TemplateRef, TrackLinks, Variables};
pub use response::SendResponse;
