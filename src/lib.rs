//! Compose a plain-text email and relay it through one authenticated SMTP
//! endpoint.
//!
//! ```no_run
//! use mail_sender::{Draft, Endpoint, config::Settings, dispatch};
//!
//! # async fn example() -> Result<(), mail_sender::SendError> {
//! let endpoint = Endpoint::new("smtp.example.com:587", "bot", "secret");
//! let draft = Draft::new(
//!     "Alerts <alerts@example.com>",
//!     "a@x.com,b@y.com",
//!     "Build failed",
//!     r"line1\nline2",
//! );
//!
//! dispatch(&endpoint, &draft, &Settings::default()).await?;
//! # Ok(())
//! # }
//! ```
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
mod dispatch;
mod endpoint;
mod error;
pub mod logging;
pub mod message;

pub use dispatch::{Dispatch, Stage, Submission, dispatch};
pub use endpoint::Endpoint;
pub use error::SendError;
pub use message::{Draft, Envelope};
pub use tracing;
