//! SMTP client connection with STARTTLS support.

use std::{sync::Arc, time::Duration};

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};
use tokio_rustls::{
    TlsConnector,
    rustls::{ClientConfig, RootCertStore, pki_types::ServerName},
};

use super::{
    auth::{Credentials, PLAIN},
    data,
    error::{ClientError, Result},
    response::Response,
};
use crate::{config::Timeouts, incoming, internal, outgoing};

/// Initial size of the read buffer for SMTP responses.
const BUFFER_SIZE: usize = 8192;

/// Maximum size of the read buffer to prevent unbounded growth (1MB).
const MAX_BUFFER_SIZE: usize = 1024 * 1024;

enum ClientConnection {
    Plain(TcpStream),
    Tls(Box<tokio_rustls::client::TlsStream<TcpStream>>),
}

impl ClientConnection {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        match self {
            Self::Plain(stream) => {
                stream.write_all(data).await?;
                stream.flush().await?;
            }
            Self::Tls(stream) => {
                stream.write_all(data).await?;
                stream.flush().await?;
            }
        }
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = match self {
            Self::Plain(stream) => stream.read(buf).await?,
            Self::Tls(stream) => stream.read(buf).await?,
        };
        if n == 0 {
            return Err(ClientError::ConnectionClosed);
        }
        Ok(n)
    }

    async fn upgrade_to_tls(self, domain: &str) -> Result<Self> {
        let Self::Plain(stream) = self else {
            return Err(ClientError::TlsError(
                "Connection is already TLS".to_string(),
            ));
        };

        let mut root_store = RootCertStore::empty();
        let certs = rustls_native_certs::load_native_certs();
        for cert in certs.certs {
            root_store.add(cert).map_err(|e| {
                ClientError::TlsError(format!("Failed to add certificate: {e}"))
            })?;
        }
        if !certs.errors.is_empty() {
            internal!(
                level = WARN,
                "Some native certificates could not be loaded: {:?}",
                certs.errors
            );
        }

        let config = ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        let server_name = ServerName::try_from(domain.to_string())
            .map_err(|e| ClientError::TlsError(format!("Invalid domain: {e}")))?;

        let tls_stream = TlsConnector::from(Arc::new(config))
            .connect(server_name, stream)
            .await
            .map_err(|e| ClientError::TlsError(e.to_string()))?;

        Ok(Self::Tls(Box::new(tls_stream)))
    }
}

/// One SMTP session with a relay.
///
/// Every exchange is bounded by the [`Timeouts`] the client was connected
/// with. Dropping the client closes the connection.
pub struct SmtpClient {
    connection: Option<ClientConnection>,
    buffer: Vec<u8>,
    buffer_pos: usize,
    server_domain: String,
    timeouts: Timeouts,
}

impl SmtpClient {
    /// Opens a TCP connection to `host:port`.
    ///
    /// `host` doubles as the TLS server name should the session be upgraded.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails or doesn't complete within
    /// the connect timeout.
    pub async fn connect(host: &str, port: u16, timeouts: Timeouts) -> Result<Self> {
        let limit = timeouts.connect();
        let stream = tokio::time::timeout(limit, TcpStream::connect((host, port)))
            .await
            .map_err(|_| ClientError::Timeout("Connect", limit))??;

        internal!(level = DEBUG, "Connected to {host}:{port}");

        Ok(Self {
            connection: Some(ClientConnection::Plain(stream)),
            buffer: vec![0u8; BUFFER_SIZE],
            buffer_pos: 0,
            server_domain: host.to_string(),
            timeouts,
        })
    }

    /// Whether the session has been upgraded with STARTTLS.
    #[must_use]
    pub const fn is_encrypted(&self) -> bool {
        matches!(self.connection, Some(ClientConnection::Tls(_)))
    }

    /// Reads the server greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails or times out.
    pub async fn read_greeting(&mut self) -> Result<Response> {
        let limit = self.timeouts.command();
        tokio::time::timeout(limit, self.read_response())
            .await
            .map_err(|_| ClientError::Timeout("Greeting", limit))?
    }

    /// Sends one command line and waits for its reply.
    ///
    /// `name` labels the exchange in errors; `line` is sent verbatim
    /// followed by CRLF.
    ///
    /// # Errors
    ///
    /// Returns an error if sending or reading fails or times out.
    pub async fn command(&mut self, name: &'static str, line: &str) -> Result<Response> {
        self.exchange(name, line, line, self.timeouts.command()).await
    }

    /// Sends EHLO with the specified domain.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails.
    pub async fn ehlo(&mut self, domain: &str) -> Result<Response> {
        self.command("EHLO", &format!("EHLO {domain}")).await
    }

    /// Sends HELO with the specified domain.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails.
    pub async fn helo(&mut self, domain: &str) -> Result<Response> {
        self.command("HELO", &format!("HELO {domain}")).await
    }

    /// Sends `AUTH PLAIN` with an initial response.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails.
    pub async fn auth_plain(&mut self, credentials: &Credentials) -> Result<Response> {
        let line = format!("AUTH {PLAIN} {}", credentials.plain_initial_response());
        let redacted = format!("AUTH {PLAIN} <redacted>");
        self.exchange("AUTH", &line, &redacted, self.timeouts.command())
            .await
    }

    /// Sends MAIL FROM command.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails.
    pub async fn mail_from(&mut self, from: &str) -> Result<Response> {
        self.command("MAIL FROM", &format!("MAIL FROM:<{from}>"))
            .await
    }

    /// Sends RCPT TO command.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails.
    pub async fn rcpt_to(&mut self, to: &str) -> Result<Response> {
        self.command("RCPT TO", &format!("RCPT TO:<{to}>")).await
    }

    /// Sends DATA command.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails.
    pub async fn data(&mut self) -> Result<Response> {
        self.command("DATA", "DATA").await
    }

    /// Transmits the message after a `354`, applying dot-stuffing and the
    /// end-of-data marker, and returns the relay's verdict.
    ///
    /// # Errors
    ///
    /// Returns an error if sending or reading fails or the data timeout
    /// elapses.
    pub async fn send_data(&mut self, message: &[u8]) -> Result<Response> {
        let limit = self.timeouts.data();
        let encoded = data::encode(message);

        outgoing!("<message data: {} bytes>", encoded.len());

        tokio::time::timeout(limit, async {
            self.connection
                .as_mut()
                .ok_or(ClientError::ConnectionClosed)?
                .send(&encoded)
                .await?;
            self.read_response().await
        })
        .await
        .map_err(|_| ClientError::Timeout("Message data", limit))?
    }

    /// Sends QUIT command.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails.
    pub async fn quit(&mut self) -> Result<Response> {
        self.command("QUIT", "QUIT").await
    }

    /// Sends STARTTLS and, if the relay agrees, upgrades the connection.
    ///
    /// The caller must send EHLO again afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange or the TLS handshake fails.
    pub async fn starttls(&mut self) -> Result<Response> {
        let response = self.command("STARTTLS", "STARTTLS").await?;

        if response.is_success() {
            let connection = self
                .connection
                .take()
                .ok_or(ClientError::ConnectionClosed)?;

            let limit = self.timeouts.command();
            self.connection = Some(
                tokio::time::timeout(limit, connection.upgrade_to_tls(&self.server_domain))
                    .await
                    .map_err(|_| ClientError::Timeout("TLS handshake", limit))??,
            );

            // Anything the server sent before the handshake is not trusted.
            self.buffer_pos = 0;
            internal!(level = DEBUG, "Connection upgraded to TLS");
        }

        Ok(response)
    }

    async fn exchange(
        &mut self,
        name: &'static str,
        line: &str,
        logged: &str,
        limit: Duration,
    ) -> Result<Response> {
        outgoing!("{logged}");

        tokio::time::timeout(limit, async {
            self.connection
                .as_mut()
                .ok_or(ClientError::ConnectionClosed)?
                .send(format!("{line}\r\n").as_bytes())
                .await?;
            self.read_response().await
        })
        .await
        .map_err(|_| ClientError::Timeout(name, limit))?
    }

    async fn read_response(&mut self) -> Result<Response> {
        loop {
            if let Some((response, consumed)) =
                Response::parse_response(&self.buffer[..self.buffer_pos])?
            {
                self.buffer.copy_within(consumed..self.buffer_pos, 0);
                self.buffer_pos -= consumed;

                incoming!("{response}");
                return Ok(response);
            }

            if self.buffer_pos >= self.buffer.len() {
                let new_size = self.buffer.len() * 2;
                if new_size > MAX_BUFFER_SIZE {
                    return Err(ClientError::ParseError(format!(
                        "Response too large (exceeds {MAX_BUFFER_SIZE} bytes)"
                    )));
                }
                self.buffer.resize(new_size, 0);
            }

            let connection = self
                .connection
                .as_mut()
                .ok_or(ClientError::ConnectionClosed)?;
            let n = connection.read(&mut self.buffer[self.buffer_pos..]).await?;
            self.buffer_pos += n;
        }
    }
}
