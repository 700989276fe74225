//! SASL `PLAIN` (RFC 4616), the only mechanism the relay session offers.

use std::fmt;

use base64::{Engine, engine::general_purpose::STANDARD};

pub const PLAIN: &str = "PLAIN";

/// Username and password presented to the relay.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The base64 initial response: an empty authorization identity, then
    /// the authentication identity and password, NUL separated.
    #[must_use]
    pub fn plain_initial_response(&self) -> String {
        STANDARD.encode(format!("\0{}\0{}", self.username, self.password))
    }
}

/// Hosts for which credentials may go over an unencrypted session.
#[must_use]
pub fn is_loopback(host: &str) -> bool {
    host.eq_ignore_ascii_case("localhost")
        || host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<std::net::IpAddr>()
            .is_ok_and(|ip| ip.is_loopback())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_response() {
        let credentials = Credentials::new("bot", "secret");
        let decoded = STANDARD
            .decode(credentials.plain_initial_response())
            .unwrap();
        assert_eq!(decoded, b"\0bot\0secret");
    }

    #[test]
    fn password_not_in_debug() {
        let rendered = format!("{:?}", Credentials::new("bot", "hunter2"));
        assert!(rendered.contains("bot"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn loopback_hosts() {
        assert!(is_loopback("localhost"));
        assert!(is_loopback("127.0.0.1"));
        assert!(is_loopback("::1"));
        assert!(is_loopback("[::1]"));
        assert!(!is_loopback("smtp.example.com"));
        assert!(!is_loopback("10.0.0.1"));
    }
}
