//! Where and as whom to submit.

use std::fmt;

use crate::{client::Credentials, error::SendError};

/// Connection and credential parameters for one relay.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Endpoint {
    /// `host:port`; IPv6 literals are bracketed (`[::1]:25`).
    pub address: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("address", &self.address)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Endpoint {
    #[must_use]
    pub fn new(
        address: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Splits the address into host and port.
    ///
    /// The host, without brackets, is also the authentication domain and the
    /// TLS server name.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::MissingEndpoint`] for an empty address and
    /// [`SendError::InvalidEndpoint`] when there is no usable host or port.
    pub fn host_port(&self) -> Result<(&str, u16), SendError> {
        if self.address.is_empty() {
            return Err(SendError::MissingEndpoint);
        }

        let invalid = |reason: &str| SendError::InvalidEndpoint {
            address: self.address.clone(),
            reason: reason.to_string(),
        };

        let (host, port) = if let Some(rest) = self.address.strip_prefix('[') {
            let (host, rest) = rest
                .split_once(']')
                .ok_or_else(|| invalid("missing ']' in address"))?;
            let port = rest
                .strip_prefix(':')
                .ok_or_else(|| invalid("missing port in address"))?;
            (host, port)
        } else {
            let (host, port) = self
                .address
                .rsplit_once(':')
                .ok_or_else(|| invalid("missing port in address"))?;
            if host.contains(':') {
                return Err(invalid("too many colons in address"));
            }
            (host, port)
        };

        if host.is_empty() {
            return Err(invalid("missing host in address"));
        }

        let port = port
            .parse::<u16>()
            .ok()
            .filter(|&port| port != 0)
            .ok_or_else(|| invalid("invalid port"))?;

        Ok((host, port))
    }

    /// Credentials to authenticate with, or `None` for anonymous submission.
    #[must_use]
    pub fn credentials(&self) -> Option<Credentials> {
        (!self.username.is_empty()).then(|| Credentials::new(&self.username, &self.password))
    }
}
