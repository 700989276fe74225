//! One delivery attempt: validate, encode, connect, authenticate, submit.
//!
//! The session is owned by [`Dispatch::send`] and dropped on every exit
//! path. Nothing is retried; the first failure ends the attempt.

use std::fmt::{self, Display};

use crate::{
    client::{ClientError, Credentials, Response, SmtpClient, is_loopback, PLAIN},
    config::{Settings, StartTls},
    endpoint::Endpoint,
    error::SendError,
    internal,
    message::{Draft, Envelope},
};

/// Where a dispatch is, or where it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    NotStarted,
    Validating,
    Encoding,
    Connecting,
    Authenticating,
    Submitting,
    Done,
    Failed,
}

impl Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Everything needed on the wire, computed before any connection is made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub host: String,
    pub port: u16,
    /// The `MAIL FROM` reverse path.
    pub sender: String,
    pub recipients: Vec<String>,
    pub envelope: Envelope,
}

/// A single delivery attempt against one relay.
#[derive(Debug)]
pub struct Dispatch<'a> {
    endpoint: &'a Endpoint,
    settings: &'a Settings,
    stage: Stage,
}

/// Sends `draft` through `endpoint`.
///
/// # Errors
///
/// See [`SendError`].
pub async fn dispatch(
    endpoint: &Endpoint,
    draft: &Draft,
    settings: &Settings,
) -> Result<(), SendError> {
    Dispatch::new(endpoint, settings).send(draft).await
}

impl<'a> Dispatch<'a> {
    #[must_use]
    pub const fn new(endpoint: &'a Endpoint, settings: &'a Settings) -> Self {
        Self {
            endpoint,
            settings,
            stage: Stage::NotStarted,
        }
    }

    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    fn advance(&mut self, stage: Stage) {
        internal!(level = DEBUG, "{} -> {stage}", self.stage);
        self.stage = stage;
    }

    /// Runs validation and encoding, without touching the network.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::MissingEndpoint`], [`SendError::MissingRecipient`],
    /// [`SendError::InvalidAddress`] or [`SendError::InvalidEndpoint`].
    pub fn prepare(&mut self, draft: &Draft) -> Result<Submission, SendError> {
        self.advance(Stage::Validating);

        if self.endpoint.address.is_empty() {
            return Err(SendError::MissingEndpoint);
        }
        if draft.to.is_empty() {
            return Err(SendError::MissingRecipient);
        }

        self.advance(Stage::Encoding);

        let envelope = Envelope::compose(draft, self.settings.subject_encoding)?;
        let (host, port) = self.endpoint.host_port()?;

        let sender = if self.endpoint.username.is_empty() {
            envelope
                .from
                .as_ref()
                .map(|mailbox| mailbox.address.clone())
                .unwrap_or_default()
        } else {
            self.endpoint.username.clone()
        };

        Ok(Submission {
            host: host.to_string(),
            port,
            sender,
            recipients: draft.recipients().into_iter().map(str::to_string).collect(),
            envelope,
        })
    }

    /// Performs the whole attempt.
    ///
    /// On return the stage is either [`Stage::Done`] or [`Stage::Failed`].
    ///
    /// # Errors
    ///
    /// See [`SendError`]. Validation errors are raised before connecting.
    #[tracing::instrument(level = "info", skip_all, fields(relay = %self.endpoint.address))]
    pub async fn send(&mut self, draft: &Draft) -> Result<(), SendError> {
        let result = self.run(draft).await;

        if let Err(err) = &result {
            internal!(level = DEBUG, "Dispatch failed while {}: {err}", self.stage);
            self.stage = Stage::Failed;
        } else {
            self.advance(Stage::Done);
        }

        result
    }

    async fn run(&mut self, draft: &Draft) -> Result<(), SendError> {
        let submission = self.prepare(draft)?;

        self.advance(Stage::Connecting);
        let mut client =
            SmtpClient::connect(&submission.host, submission.port, self.settings.timeouts).await?;

        expect(
            "Greeting",
            client.read_greeting().await?,
            Response::is_success,
        )?;
        let ehlo = self.hello(&mut client).await?;
        let ehlo = self.negotiate_tls(&mut client, ehlo).await?;

        self.advance(Stage::Authenticating);
        if let Some(credentials) = self.endpoint.credentials() {
            authenticate(
                &mut client,
                &ehlo,
                &credentials,
                &submission.host,
                self.settings.starttls,
            )
            .await?;
        }

        self.advance(Stage::Submitting);
        submit(&mut client, &submission).await?;

        if let Err(e) = client.quit().await {
            internal!(
                level = WARN,
                "QUIT failed after the message was accepted: {e}"
            );
        }

        Ok(())
    }

    /// EHLO, falling back to HELO for relays that reject it.
    async fn hello(&self, client: &mut SmtpClient) -> Result<Response, ClientError> {
        let helo_name = &self.settings.helo_name;

        let ehlo = client.ehlo(helo_name).await?;
        if ehlo.is_success() {
            return Ok(ehlo);
        }

        internal!(
            level = DEBUG,
            "EHLO rejected with {}, falling back to HELO",
            ehlo.code
        );
        expect("HELO", client.helo(helo_name).await?, Response::is_success)
    }

    /// Upgrades the session according to the STARTTLS policy, returning the
    /// EHLO reply that describes the session from here on.
    async fn negotiate_tls(
        &self,
        client: &mut SmtpClient,
        ehlo: Response,
    ) -> Result<Response, ClientError> {
        let policy = self.settings.starttls;

        if policy == StartTls::Never {
            return Ok(ehlo);
        }

        if !ehlo.has_extension("STARTTLS") {
            if policy == StartTls::Required {
                return Err(ClientError::TlsError(
                    "relay does not offer STARTTLS".to_string(),
                ));
            }
            internal!(
                level = DEBUG,
                "Relay does not offer STARTTLS, continuing unencrypted"
            );
            return Ok(ehlo);
        }

        expect("STARTTLS", client.starttls().await?, Response::is_success)?;
        expect(
            "EHLO",
            client.ehlo(&self.settings.helo_name).await?,
            Response::is_success,
        )
    }
}

/// `AUTH PLAIN`, refusing to expose credentials on an unencrypted session
/// unless the relay is local or cleartext was explicitly chosen.
async fn authenticate(
    client: &mut SmtpClient,
    ehlo: &Response,
    credentials: &Credentials,
    host: &str,
    policy: StartTls,
) -> Result<(), ClientError> {
    if !client.is_encrypted() && policy != StartTls::Never && !is_loopback(host) {
        return Err(ClientError::AuthError(
            "refusing to send credentials over an unencrypted connection".to_string(),
        ));
    }

    let mechanisms = ehlo
        .extension("AUTH")
        .ok_or_else(|| ClientError::AuthError("relay does not support AUTH".to_string()))?;

    if !mechanisms.iter().any(|m| m.eq_ignore_ascii_case(PLAIN)) {
        return Err(ClientError::AuthError(format!(
            "relay does not offer {PLAIN} (offered: {})",
            mechanisms.join(" ")
        )));
    }

    expect(
        "AUTH",
        client.auth_plain(credentials).await?,
        Response::is_success,
    )?;

    internal!(
        level = DEBUG,
        "Authenticated as {}",
        credentials.username()
    );
    Ok(())
}

async fn submit(client: &mut SmtpClient, submission: &Submission) -> Result<(), ClientError> {
    expect(
        "MAIL FROM",
        client.mail_from(&submission.sender).await?,
        Response::is_success,
    )?;

    for recipient in &submission.recipients {
        expect(
            "RCPT TO",
            client.rcpt_to(recipient).await?,
            Response::is_success,
        )?;
    }

    expect("DATA", client.data().await?, Response::is_intermediate)?;

    let message = submission.envelope.render();
    expect(
        "Message data",
        client.send_data(message.as_bytes()).await?,
        Response::is_success,
    )?;

    Ok(())
}

fn expect(
    command: &'static str,
    response: Response,
    accept: impl Fn(&Response) -> bool,
) -> Result<Response, ClientError> {
    if accept(&response) {
        Ok(response)
    } else {
        Err(ClientError::Rejected {
            command,
            code: response.code,
            message: response.message(),
        })
    }
}
