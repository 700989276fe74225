/// Message fields as supplied by the caller, before any encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    /// `Name <user@host>`, a bare `user@host`, or empty.
    pub from: String,
    /// Comma separated recipients.
    pub to: String,
    pub subject: String,
    /// May contain literal `\r` / `\n` escapes, see [`super::body::unescape`].
    pub body: String,
}

impl Draft {
    #[must_use]
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// The envelope recipients: `to` split on commas, verbatim.
    ///
    /// Entries are neither trimmed nor validated; that is left to the relay.
    #[must_use]
    pub fn recipients(&self) -> Vec<&str> {
        self.to.split(',').collect()
    }
}
