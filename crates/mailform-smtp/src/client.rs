//! Type-state SMTP client.
//!
//! ```text
//! Connected ── mail_from() ──→ MailTransaction ── data() ──→ Data
//!     ↑                              │                        │
//!     └────────── reset() ───────────┘                        │
//!     └───────────────────── send_content() ──────────────────┘
//! ```
//!
//! EHLO, STARTTLS and authentication all keep the client `Connected`.

use crate::command::Command;
use crate::envelope::Envelope;
use crate::error::{Error, Result};
use crate::extension::{AuthMechanism, ServerInfo};
use crate::reply::{Reply, ReplyCode, is_last_line};
use crate::stream::SmtpStream;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::marker::PhantomData;
use tracing::{debug, trace, warn};

/// Ready for a new transaction.
#[derive(Debug)]
pub struct Connected;

/// MAIL FROM accepted; recipients may be added.
#[derive(Debug)]
pub struct MailTransaction;

/// DATA accepted; the message content comes next.
#[derive(Debug)]
pub struct Data;

/// SMTP client whose state is tracked in its type.
#[derive(Debug)]
pub struct Client<State> {
    stream: SmtpStream,
    server_info: ServerInfo,
    _state: PhantomData<State>,
}

impl<S> Client<S> {
    /// Returns what the server advertised in its last EHLO reply.
    #[must_use]
    pub const fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// Sends QUIT and closes the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the server does not answer 221.
    pub async fn quit(mut self) -> Result<()> {
        self.command(Command::Quit).await?.require(ReplyCode::CLOSING)?;
        Ok(())
    }

    fn into_state<T>(self) -> Client<T> {
        Client {
            stream: self.stream,
            server_info: self.server_info,
            _state: PhantomData,
        }
    }

    async fn command(&mut self, command: Command) -> Result<Reply> {
        debug!(command = command.verb(), "Sending SMTP command");
        self.stream.write_all(&command.to_bytes()).await?;
        self.read_reply().await
    }

    async fn read_reply(&mut self) -> Result<Reply> {
        let mut lines = Vec::new();
        loop {
            let line = self.stream.read_line().await?;
            let last = is_last_line(&line);
            lines.push(line);
            if last {
                break;
            }
        }
        let reply = Reply::from_lines(&lines)?;
        trace!(code = reply.code.as_u16(), "Received SMTP reply");
        Ok(reply)
    }
}

impl Client<Connected> {
    /// Reads the server greeting from a fresh connection.
    ///
    /// # Errors
    ///
    /// Returns an error unless the server greets with 220.
    pub async fn greet(stream: SmtpStream) -> Result<Self> {
        let mut client = Self {
            stream,
            server_info: ServerInfo::default(),
            _state: PhantomData,
        };
        let greeting = client.read_reply().await?.require(ReplyCode::SERVICE_READY)?;
        debug!(greeting = %greeting.text(), "Connected to SMTP server");
        Ok(client)
    }

    /// Sends EHLO and records the advertised extensions.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects EHLO.
    pub async fn ehlo(mut self, client_hostname: &str) -> Result<Self> {
        let reply = self
            .command(Command::Ehlo(client_hostname.to_string()))
            .await?
            .require_success()?;
        self.server_info = ServerInfo::from_ehlo(&reply.lines);
        Ok(self)
    }

    /// Upgrades the session with STARTTLS, then repeats EHLO.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSupported`] if STARTTLS was not advertised, or an
    /// error if the server refuses or the handshake fails.
    pub async fn starttls(mut self, server_name: &str, client_hostname: &str) -> Result<Self> {
        if !self.server_info.supports_starttls() {
            return Err(Error::NotSupported("STARTTLS".into()));
        }
        self.command(Command::StartTls)
            .await?
            .require(ReplyCode::SERVICE_READY)?;

        self.stream = self.stream.upgrade_to_tls(server_name).await?;
        debug!("TLS established");
        self.ehlo(client_hostname).await
    }

    /// Authenticates with the best advertised mechanism, PLAIN before LOGIN.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSupported`] if the server offers no AUTH or no
    /// usable mechanism, or an error if the credentials are refused.
    pub async fn login(self, username: &str, password: &str) -> Result<Self> {
        let mechanisms = self
            .server_info
            .auth_mechanisms()
            .ok_or_else(|| Error::NotSupported("AUTH".into()))?;
        let mechanism = [AuthMechanism::Plain, AuthMechanism::Login]
            .into_iter()
            .find(|m| mechanisms.contains(m))
            .ok_or_else(|| Error::NotSupported("AUTH PLAIN or LOGIN".into()))?;

        match mechanism {
            AuthMechanism::Plain => self.auth_plain(username, password).await,
            AuthMechanism::Login => self.auth_login(username, password).await,
        }
    }

    /// Authenticates with PLAIN and an initial response.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are refused.
    pub async fn auth_plain(mut self, username: &str, password: &str) -> Result<Self> {
        let initial = STANDARD.encode(format!("\0{username}\0{password}"));
        self.command(Command::Auth(AuthMechanism::Plain, Some(initial)))
            .await?
            .require_success()?;
        debug!(mechanism = "PLAIN", "Authenticated");
        Ok(self)
    }

    /// Authenticates with LOGIN, answering the username and password
    /// challenges in turn.
    ///
    /// # Errors
    ///
    /// Returns an error if the server leaves the exchange or refuses.
    pub async fn auth_login(mut self, username: &str, password: &str) -> Result<Self> {
        self.command(Command::Auth(AuthMechanism::Login, None))
            .await?
            .require(ReplyCode::AUTH_CONTINUE)?;
        self.command(Command::AuthResponse(STANDARD.encode(username)))
            .await?
            .require(ReplyCode::AUTH_CONTINUE)?;
        self.command(Command::AuthResponse(STANDARD.encode(password)))
            .await?
            .require_success()?;
        debug!(mechanism = "LOGIN", "Authenticated");
        Ok(self)
    }

    /// Starts a transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the sender.
    pub async fn mail_from(
        mut self,
        from: &str,
        params: Vec<&'static str>,
    ) -> Result<Client<MailTransaction>> {
        self.command(Command::MailFrom {
            from: from.to_string(),
            params,
        })
        .await?
        .require_success()?;
        Ok(self.into_state())
    }

    /// Runs a whole transaction for one envelope.
    ///
    /// Refused recipients are skipped as long as at least one is accepted.
    /// Envelope addresses that are not plain ASCII need the SMTPUTF8
    /// extension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecipientsRefused`] if no recipient is accepted,
    /// [`Error::NotSupported`] if SMTPUTF8 is needed but missing, or the
    /// first error the server reports otherwise.
    pub async fn send_mail(self, envelope: &Envelope, content: &[u8]) -> Result<Self> {
        if envelope.recipients.is_empty() {
            return Err(Error::RecipientsRefused("the message has no recipients".into()));
        }

        let mut params = Vec::new();
        if envelope.needs_smtputf8() {
            if !self.server_info.supports_smtputf8() {
                return Err(Error::NotSupported("SMTPUTF8".into()));
            }
            params.extend(["SMTPUTF8", "BODY=8BITMIME"]);
        }

        let mut transaction = self.mail_from(&envelope.from, params).await?;
        let mut refused = Vec::new();
        for recipient in &envelope.recipients {
            match transaction.rcpt_to(recipient).await {
                Ok(()) => {}
                Err(error @ Error::Reply { .. }) => {
                    warn!(recipient = %recipient, error = %error, "Recipient refused");
                    refused.push(recipient.as_str());
                }
                Err(error) => return Err(error),
            }
        }

        if refused.len() == envelope.recipients.len() {
            let refused = refused.join(", ");
            transaction.reset().await?;
            return Err(Error::RecipientsRefused(refused));
        }

        transaction.data().await?.send_content(content).await
    }
}

impl Client<MailTransaction> {
    /// Adds a recipient.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Reply`] if the server refuses the recipient. The
    /// transaction stays open.
    pub async fn rcpt_to(&mut self, to: &str) -> Result<()> {
        self.command(Command::RcptTo(to.to_string()))
            .await?
            .require_success()?;
        Ok(())
    }

    /// Begins the message content.
    ///
    /// # Errors
    ///
    /// Returns an error unless the server answers 354.
    pub async fn data(mut self) -> Result<Client<Data>> {
        self.command(Command::Data)
            .await?
            .require(ReplyCode::START_DATA)?;
        Ok(self.into_state())
    }

    /// Aborts the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects RSET.
    pub async fn reset(mut self) -> Result<Client<Connected>> {
        self.command(Command::Rset).await?.require_success()?;
        Ok(self.into_state())
    }
}

impl Client<Data> {
    /// Sends the message content and completes the transaction.
    ///
    /// Lines are sent with CRLF endings, lines starting with `.` are
    /// dot-stuffed and the terminating `.` line is appended.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails or the server rejects the message.
    pub async fn send_content(mut self, content: &[u8]) -> Result<Client<Connected>> {
        self.stream.write_all(&dot_stuff(content)).await?;
        self.read_reply().await?.require_success()?;
        debug!(bytes = content.len(), "Message accepted");
        Ok(self.into_state())
    }
}

/// Frames content for DATA.
fn dot_stuff(content: &[u8]) -> Vec<u8> {
    let mut framed = Vec::with_capacity(content.len() + content.len() / 64 + 5);
    let content = content.strip_suffix(b"\n").unwrap_or(content);

    if !content.is_empty() {
        for line in content.split(|&b| b == b'\n') {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if line.first() == Some(&b'.') {
                framed.push(b'.');
            }
            framed.extend_from_slice(line);
            framed.extend_from_slice(b"\r\n");
        }
    }

    framed.extend_from_slice(b".\r\n");
    framed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_stuff() {
        assert_eq!(dot_stuff(b"a\r\n.b\r\n..c"), b"a\r\n..b\r\n...c\r\n.\r\n");
    }

    #[test]
    fn test_dot_stuff_line_endings() {
        assert_eq!(dot_stuff(b"a\nb\n"), b"a\r\nb\r\n.\r\n");
        assert_eq!(dot_stuff(b"a\r\n\r\nb\r\n"), b"a\r\n\r\nb\r\n.\r\n");
    }

    #[test]
    fn test_dot_stuff_empty() {
        assert_eq!(dot_stuff(b""), b".\r\n");
        assert_eq!(dot_stuff(b"."), b"..\r\n.\r\n");
    }
}
