#![deny(clippy::pedantic, clippy::all, clippy::nursery)]
#![allow(clippy::must_use_candidate)]

use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use mail_sender::{
    Draft, Endpoint,
    config::{FileConfig, Settings, StartTls, SubjectEncoding},
    logging,
};

/// Send a plain-text email through an SMTP relay
#[derive(Parser, Debug)]
#[command(name = "mail-sender", version, long_about = None)]
struct Cli {
    /// Relay address (host:port)
    #[arg(long, env = "MAIL_SENDER_ADDR")]
    addr: Option<String>,

    /// Username to authenticate with; also the envelope sender
    #[arg(long, env = "MAIL_SENDER_USER")]
    user: Option<String>,

    /// Password to authenticate with
    #[arg(long, env = "MAIL_SENDER_PASS", hide_env_values = true)]
    pass: Option<String>,

    /// From header, e.g. "Name <user@example.com>"
    #[arg(long, env = "MAIL_SENDER_FROM")]
    from: Option<String>,

    /// Comma separated recipients
    #[arg(long, env = "MAIL_SENDER_TO")]
    to: Option<String>,

    /// Subject line
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    subject: String,

    /// Message body; the escapes \r and \n become line breaks
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    body: String,

    /// When to upgrade the session with STARTTLS
    #[arg(long, value_enum)]
    starttls: Option<StartTls>,

    /// How to encode the subject line
    #[arg(long, value_enum)]
    subject_encoding: Option<SubjectEncoding>,

    /// Name to greet the relay with
    #[arg(long)]
    helo: Option<String>,

    /// Seconds allowed for establishing the connection
    #[arg(long, value_name = "SECS")]
    connect_timeout: Option<u64>,

    /// Seconds allowed for each command
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Seconds allowed for transmitting the message
    #[arg(long, value_name = "SECS")]
    data_timeout: Option<u64>,

    /// Configuration file (RON); defaults to ./mail-sender.config.ron if present
    #[arg(short, long, env = "MAIL_SENDER_CONFIG")]
    config: Option<PathBuf>,
}

impl Cli {
    /// Flags and environment win over the configuration file.
    fn resolve(self, file: FileConfig) -> (Endpoint, Draft, Settings) {
        let endpoint = Endpoint::new(
            self.addr.or(file.addr).unwrap_or_default(),
            self.user.or(file.user).unwrap_or_default(),
            self.pass.or(file.pass).unwrap_or_default(),
        );

        let draft = Draft::new(
            self.from.or(file.from).unwrap_or_default(),
            self.to.or(file.to).unwrap_or_default(),
            self.subject,
            self.body,
        );

        let mut settings = file.settings;
        if let Some(starttls) = self.starttls {
            settings.starttls = starttls;
        }
        if let Some(subject_encoding) = self.subject_encoding {
            settings.subject_encoding = subject_encoding;
        }
        if let Some(helo) = self.helo {
            settings.helo_name = helo;
        }
        if let Some(secs) = self.connect_timeout {
            settings.timeouts.connect_secs = secs;
        }
        if let Some(secs) = self.timeout {
            settings.timeouts.command_secs = secs;
        }
        if let Some(secs) = self.data_timeout {
            settings.timeouts.data_secs = secs;
        }

        (endpoint, draft, settings)
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let file = FileConfig::discover(cli.config.as_deref())?;
    let (endpoint, draft, settings) = cli.resolve(file);

    mail_sender::dispatch(&endpoint, &draft, &settings).await?;

    tracing::info!(relay = %endpoint.address, "Message accepted");
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    logging::init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("Send failed: {err:#}");
            ExitCode::FAILURE
        }
    }
}
