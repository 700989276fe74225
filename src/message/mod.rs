//! Turning caller-supplied fields into a transport-ready message.

pub mod address;
pub mod body;
mod draft;
pub mod encoding;
mod envelope;

pub use address::Mailbox;
pub use draft::Draft;
pub use envelope::{CONTENT_TYPE, Envelope};
