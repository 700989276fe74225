//! A minimal SMTP submission client.
//!
//! This is just enough of RFC 5321 to hand one message to one relay:
//!
//! - Plain TCP connections with an optional STARTTLS upgrade
//! - `AUTH PLAIN` with an initial response
//! - Reply parsing, including multi-line EHLO replies
//! - DATA transparency (CRLF normalisation and dot-stuffing)
//! - Per-exchange deadlines
//!
//! # Example
//!
//! ```no_run
//! use mail_sender::{client::SmtpClient, config::Timeouts};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut client = SmtpClient::connect("localhost", 2525, Timeouts::default()).await?;
//! client.read_greeting().await?;
//! client.ehlo("localhost").await?;
//! client.mail_from("sender@example.com").await?;
//! client.rcpt_to("recipient@example.com").await?;
//! client.data().await?;
//! client.send_data(b"Subject: Test\r\n\r\nHello World").await?;
//! client.quit().await?;
//! # Ok(())
//! # }
//! ```

mod auth;
#[allow(clippy::module_inception)]
mod client;
mod data;
mod error;
mod response;

pub use auth::{Credentials, PLAIN, is_loopback};
pub use client::SmtpClient;
pub use error::{ClientError, Result};
pub use response::{Response, ResponseLine};
