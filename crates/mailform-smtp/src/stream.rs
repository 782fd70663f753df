//! Byte transport under the client, plain or TLS.

use crate::error::{Error, Result};
use rustls::pki_types::ServerName;
use std::fmt;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};

/// Any duplex byte stream the client can run over.
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Transport for T {}

type BoxedTransport = Box<dyn Transport>;

/// A buffered connection to the server.
pub enum SmtpStream {
    /// Unencrypted transport.
    Plain(BufReader<BoxedTransport>),
    /// TLS over the transport.
    Tls(Box<BufReader<TlsStream<BoxedTransport>>>),
}

impl SmtpStream {
    /// Wraps an already connected transport without TLS.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::Plain(BufReader::new(Box::new(transport)))
    }

    /// Returns true once TLS is active.
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        matches!(self, Self::Tls(_))
    }

    /// Reads one line without its line ending.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] at end of stream, or an I/O error.
    pub async fn read_line(&mut self) -> Result<String> {
        let mut line = Vec::new();
        let read = match self {
            Self::Plain(reader) => reader.read_until(b'\n', &mut line).await?,
            Self::Tls(reader) => reader.read_until(b'\n', &mut line).await?,
        };
        if read == 0 {
            return Err(Error::ConnectionClosed);
        }
        while matches!(line.last(), Some(b'\n' | b'\r')) {
            line.pop();
        }
        Ok(String::from_utf8_lossy(&line).into_owned())
    }

    /// Writes and flushes `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        match self {
            Self::Plain(reader) => {
                let writer = reader.get_mut();
                writer.write_all(data).await?;
                writer.flush().await?;
            }
            Self::Tls(reader) => {
                let writer = reader.get_mut();
                writer.write_all(data).await?;
                writer.flush().await?;
            }
        }
        Ok(())
    }

    /// Runs the TLS handshake over the current transport.
    ///
    /// # Errors
    ///
    /// Returns an error if TLS is already active, the server name is invalid
    /// or the handshake fails.
    pub async fn upgrade_to_tls(self, server_name: &str) -> Result<Self> {
        let transport = match self {
            Self::Plain(reader) => reader.into_inner(),
            Self::Tls(_) => return Err(Error::Protocol("TLS is already active".into())),
        };
        handshake(transport, server_name).await
    }
}

impl fmt::Debug for SmtpStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpStream")
            .field("tls", &self.is_tls())
            .finish_non_exhaustive()
    }
}

/// Opens a TCP connection, with TLS from the start when `tls` is set.
///
/// # Errors
///
/// Returns an error if the connection or the TLS handshake fails.
pub async fn connect(host: &str, port: u16, tls: bool) -> Result<SmtpStream> {
    let tcp = TcpStream::connect((host, port)).await?;
    let transport: BoxedTransport = Box::new(tcp);
    if tls {
        handshake(transport, host).await
    } else {
        Ok(SmtpStream::Plain(BufReader::new(transport)))
    }
}

async fn handshake(transport: BoxedTransport, server_name: &str) -> Result<SmtpStream> {
    let name = ServerName::try_from(server_name.to_string())
        .map_err(|_| Error::ServerName(server_name.to_string()))?;
    let tls = tls_connector().connect(name, transport).await?;
    Ok(SmtpStream::Tls(Box::new(BufReader::new(tls))))
}

/// Creates a TLS connector trusting the webpki roots.
fn tls_connector() -> TlsConnector {
    let roots = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };
    let config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    TlsConnector::from(Arc::new(config))
}
