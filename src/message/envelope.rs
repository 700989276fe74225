//! The rendered message handed to the relay after DATA.

use std::fmt::{self, Display};

use super::{
    address::{Mailbox, normalize_from},
    body::unescape,
    draft::Draft,
    encoding::{encode_word, force_encode_word},
};
use crate::{config::SubjectEncoding, error::SendError};

pub const CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Header block and body, ready for transport.
///
/// Headers are emitted in a fixed order: `From` (if any), `To`, `Subject`
/// (if any), `Content-Type`, then a blank line and the body. Every header
/// line ends in CRLF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub from: Option<Mailbox>,
    pub to: String,
    pub subject: Option<String>,
    pub body: String,
}

impl Envelope {
    /// Normalises a draft. The draft itself is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::InvalidAddress`] if `from` isn't a mailbox.
    pub fn compose(draft: &Draft, subject_encoding: SubjectEncoding) -> Result<Self, SendError> {
        let from = normalize_from(&draft.from)?;

        let subject = (!draft.subject.is_empty()).then(|| match subject_encoding {
            SubjectEncoding::Always => force_encode_word(&draft.subject),
            SubjectEncoding::WhenNeeded => encode_word(&draft.subject).into_owned(),
        });

        Ok(Self {
            from,
            to: draft.to.clone(),
            subject,
            body: unescape(&draft.body).into_owned(),
        })
    }

    #[must_use]
    pub fn render(&self) -> String {
        self.to_string()
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.render().into_bytes()
    }
}

impl Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(from) = &self.from {
            write!(f, "From: {from}\r\n")?;
        }
        write!(f, "To: {}\r\n", self.to)?;
        if let Some(subject) = &self.subject {
            write!(f, "Subject: {subject}\r\n")?;
        }
        write!(f, "Content-Type: {CONTENT_TYPE}\r\n\r\n{}", self.body)
    }
}
