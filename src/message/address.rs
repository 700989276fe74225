//! Parsing and rendering of the `From` mailbox.

use std::fmt::{self, Display};

use mailparse::{MailAddr, addrparse};

use super::encoding::{encode_word, needs_encoding};
use crate::error::SendError;

/// RFC 5322 `specials`; a plain display name containing any of these must
/// be quoted.
const SPECIALS: &[char] = &['(', ')', '<', '>', '[', ']', ':', ';', '@', '\\', ',', '.', '"'];

/// A single mailbox: an optional display name and an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    pub name: Option<String>,
    pub address: String,
}

impl Mailbox {
    /// Parses `Name <user@host>` or a bare `user@host`.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::InvalidAddress`] unless `input` holds exactly
    /// one mailbox with a local part and a domain.
    pub fn parse(input: &str) -> Result<Self, SendError> {
        let invalid = |reason: String| SendError::InvalidAddress {
            address: input.to_string(),
            reason,
        };

        let list = addrparse(input).map_err(|e| invalid(e.to_string()))?;

        let info = match &list[..] {
            [MailAddr::Single(info)] => info,
            [MailAddr::Group(_)] => return Err(invalid("expected a mailbox, found a group".into())),
            [] => return Err(invalid("no address found".into())),
            _ => return Err(invalid("expected a single mailbox".into())),
        };

        validate_addr_spec(&info.addr).map_err(|reason| invalid(reason.into()))?;

        Ok(Self {
            name: info
                .display_name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
            address: info.addr.clone(),
        })
    }

    /// Renders the mailbox as a header value.
    ///
    /// A name outside printable ASCII becomes an encoded word; a printable
    /// name with specials is quoted; anything else is emitted as is.
    #[must_use]
    pub fn to_header(&self) -> String {
        self.to_string()
    }
}

impl Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            None => f.write_str(&self.address),
            Some(name) if needs_encoding(name) => {
                write!(f, "{} <{}>", encode_word(name), self.address)
            }
            Some(name) if name.contains(SPECIALS) => {
                let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "\"{escaped}\" <{}>", self.address)
            }
            Some(name) => write!(f, "{name} <{}>", self.address),
        }
    }
}

fn validate_addr_spec(addr: &str) -> Result<(), &'static str> {
    let (local, domain) = addr.rsplit_once('@').ok_or("missing '@'")?;

    if local.is_empty() {
        return Err("missing local part");
    }
    if domain.is_empty() {
        return Err("missing domain");
    }
    if addr.chars().any(|c| c.is_whitespace() || c.is_control() || c == '<' || c == '>') {
        return Err("unexpected character in address");
    }

    Ok(())
}

/// Normalises the `from` field.
///
/// An empty field yields `None` and the header is left out.
///
/// # Errors
///
/// Returns [`SendError::InvalidAddress`] if a non-empty field doesn't parse.
pub fn normalize_from(from: &str) -> Result<Option<Mailbox>, SendError> {
    if from.is_empty() {
        return Ok(None);
    }

    Mailbox::parse(from).map(Some)
}
