//! Client commands.

use crate::extension::AuthMechanism;
use std::fmt;

/// A command line sent to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// EHLO - Extended greeting
    Ehlo(String),
    /// STARTTLS - Upgrade to TLS
    StartTls,
    /// AUTH - Begin authentication, with an optional initial response
    Auth(AuthMechanism, Option<String>),
    /// A bare SASL response line following a 334 challenge
    AuthResponse(String),
    /// MAIL FROM - Start a transaction; an empty path is the null sender
    MailFrom {
        /// Reverse path
        from: String,
        /// ESMTP parameters such as `SMTPUTF8`
        params: Vec<&'static str>,
    },
    /// RCPT TO - Add a recipient
    RcptTo(String),
    /// DATA - Begin message content
    Data,
    /// RSET - Abort the transaction
    Rset,
    /// QUIT - Close the session
    Quit,
}

impl Command {
    /// Returns the command verb, safe to log.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Ehlo(_) => "EHLO",
            Self::StartTls => "STARTTLS",
            Self::Auth(..) => "AUTH",
            Self::AuthResponse(_) => "(auth response)",
            Self::MailFrom { .. } => "MAIL FROM",
            Self::RcptTo(_) => "RCPT TO",
            Self::Data => "DATA",
            Self::Rset => "RSET",
            Self::Quit => "QUIT",
        }
    }

    /// Returns the CRLF terminated bytes to send.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        format!("{self}\r\n").into_bytes()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ehlo(hostname) => write!(f, "EHLO {hostname}"),
            Self::StartTls => f.write_str("STARTTLS"),
            Self::Auth(mechanism, None) => write!(f, "AUTH {}", mechanism.as_str()),
            Self::Auth(mechanism, Some(initial)) => {
                write!(f, "AUTH {} {initial}", mechanism.as_str())
            }
            Self::AuthResponse(response) => f.write_str(response),
            Self::MailFrom { from, params } => {
                write!(f, "MAIL FROM:<{from}>")?;
                for param in params {
                    write!(f, " {param}")?;
                }
                Ok(())
            }
            Self::RcptTo(to) => write!(f, "RCPT TO:<{to}>"),
            Self::Data => f.write_str("DATA"),
            Self::Rset => f.write_str("RSET"),
            Self::Quit => f.write_str("QUIT"),
        }
    }
}
