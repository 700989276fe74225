//! Test support for dispatching against a local relay.

pub mod mock_server;

pub use mock_server::{MockSmtpServer, SmtpCommand};
