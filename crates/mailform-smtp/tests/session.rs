//! Integration tests for SMTP delivery.
//!
//! Most tests run the client over a mock stream that replays scripted server
//! replies and records what the client wrote. One test runs a small server on
//! a local TCP port to cover the full handler path.

#![allow(clippy::unwrap_used)]

use std::io::{self, Cursor};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, ReadBuf};
use tokio::net::TcpListener;

use mailform::{EmailHandler, Message};
use mailform_smtp::{Error, SmtpConfig, SmtpEmailHandler, SmtpStream};

/// Mock stream that returns predefined replies.
struct MockStream {
    /// Replies to return (in order).
    replies: Cursor<Vec<u8>>,
    /// Bytes written by the client, shared with the test.
    sent: Arc<Mutex<Vec<u8>>>,
}

impl MockStream {
    fn new(replies: &str) -> (Self, Arc<Mutex<Vec<u8>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let stream = Self {
            replies: Cursor::new(replies.as_bytes().to_vec()),
            sent: Arc::clone(&sent),
        };
        (stream, sent)
    }
}

impl AsyncRead for MockStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let pos = usize::try_from(self.replies.position()).unwrap();
        let data = self.replies.get_ref();
        if pos >= data.len() {
            return Poll::Ready(Ok(()));
        }

        let remaining = &data[pos..];
        let to_read = remaining.len().min(buf.remaining());
        buf.put_slice(&remaining[..to_read]);
        self.replies.set_position((pos + to_read) as u64);
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.sent.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("mailform_smtp=trace")
        .with_test_writer()
        .try_init();
}

fn sent_text(sent: &Arc<Mutex<Vec<u8>>>) -> String {
    String::from_utf8(sent.lock().unwrap().clone()).unwrap()
}

fn handler(config: serde_json::Value) -> SmtpEmailHandler {
    SmtpEmailHandler::from_config(&config).unwrap()
}

#[tokio::test]
async fn test_authenticated_batched_send() {
    init_tracing();
    let (stream, sent) = MockStream::new(concat!(
        "220 mx.test ESMTP\r\n",
        "250-mx.test\r\n",
        "250-AUTH LOGIN PLAIN\r\n",
        "250 SIZE 1000000\r\n",
        "235 2.7.0 accepted\r\n",
        // first batch
        "250 sender ok\r\n",
        "250 rcpt ok\r\n",
        "250 rcpt ok\r\n",
        "354 go ahead\r\n",
        "250 queued\r\n",
        // second batch
        "250 sender ok\r\n",
        "250 rcpt ok\r\n",
        "354 go ahead\r\n",
        "250 queued\r\n",
        "221 bye\r\n",
    ));

    let handler = handler(serde_json::json!({
        "username": "u",
        "password": "p",
        "recipients_per_message": 2,
    }));
    let message = Message::new()
        .with_from_addr("Sender <s@example.com>")
        .with_to(["a@example.com", "b@example.com"])
        .with_bcc(["c@example.com"])
        .with_text(".starts with a dot");

    let client = handler.setup(SmtpStream::new(stream)).await.unwrap();
    assert!(client.server_info().auth_mechanisms().is_some());
    let client = handler.send_with(client, vec![message.into()]).await.unwrap();
    client.quit().await.unwrap();

    let sent = sent_text(&sent);
    assert!(sent.starts_with(&format!("EHLO {}\r\n", mailform::local_hostname())));
    assert!(sent.contains("AUTH PLAIN AHUAcA==\r\n"));
    assert_eq!(sent.matches("MAIL FROM:<s@example.com>\r\n").count(), 2);
    assert!(sent.contains("RCPT TO:<a@example.com>\r\nRCPT TO:<b@example.com>\r\nDATA\r\n"));
    assert!(sent.contains("RCPT TO:<c@example.com>\r\nDATA\r\n"));
    assert_eq!(sent.matches("\r\n..starts with a dot\r\n.\r\n").count(), 2);
    assert!(sent.contains("To: a@example.com, b@example.com\r\n"));
    assert!(!sent.contains("BCC:"));
    assert!(sent.ends_with("QUIT\r\n"));
}

#[tokio::test]
async fn test_auth_login() {
    let (stream, sent) = MockStream::new(concat!(
        "220 mx.test\r\n",
        "250-mx.test\r\n",
        "250 AUTH LOGIN\r\n",
        "334 VXNlcm5hbWU6\r\n",
        "334 UGFzc3dvcmQ6\r\n",
        "235 ok\r\n",
    ));

    let handler = handler(serde_json::json!({"username": "user", "password": "pass"}));
    handler.setup(SmtpStream::new(stream)).await.unwrap();

    let sent = sent_text(&sent);
    assert!(sent.contains("AUTH LOGIN\r\ndXNlcg==\r\ncGFzcw==\r\n"));
}

#[tokio::test]
async fn test_login_without_auth_extension() {
    let (stream, _) = MockStream::new("220 mx.test\r\n250 mx.test\r\n");
    let handler = handler(serde_json::json!({"username": "u", "password": "p"}));
    let result = handler.setup(SmtpStream::new(stream)).await;
    assert!(matches!(result, Err(Error::NotSupported(ext)) if ext == "AUTH"));
}

#[tokio::test]
async fn test_starttls_not_advertised() {
    let (stream, _) = MockStream::new("220 mx.test\r\n250 mx.test\r\n");
    let handler = handler(serde_json::json!({"use_starttls": true}));
    let result = handler.setup(SmtpStream::new(stream)).await;
    assert!(matches!(result, Err(Error::NotSupported(ext)) if ext == "STARTTLS"));
}

#[tokio::test]
async fn test_partially_refused_recipients() {
    let (stream, sent) = MockStream::new(concat!(
        "220 mx.test\r\n",
        "250 mx.test\r\n",
        "250 ok\r\n",
        "550 5.1.1 no such user\r\n",
        "250 ok\r\n",
        "354 go ahead\r\n",
        "250 queued\r\n",
    ));

    let handler = SmtpEmailHandler::default();
    let client = handler.setup(SmtpStream::new(stream)).await.unwrap();
    let message = Message::new()
        .with_from_addr("s@example.com")
        .with_to(["missing@example.com", "b@example.com"])
        .with_text("x");
    handler.send_with(client, vec![message.into()]).await.unwrap();

    assert!(sent_text(&sent).contains("DATA\r\n"));
}

#[tokio::test]
async fn test_all_recipients_refused() {
    let (stream, sent) = MockStream::new(concat!(
        "220 mx.test\r\n",
        "250 mx.test\r\n",
        "250 ok\r\n",
        "550 no such user\r\n",
        "250 reset\r\n",
    ));

    let handler = SmtpEmailHandler::default();
    let client = handler.setup(SmtpStream::new(stream)).await.unwrap();
    let message = Message::new().with_to(["missing@example.com"]).with_text("x");
    let result = handler.send_with(client, vec![message.into()]).await;

    assert!(matches!(result, Err(Error::RecipientsRefused(list)) if list == "missing@example.com"));
    let sent = sent_text(&sent);
    assert!(sent.contains("MAIL FROM:<>\r\n"));
    assert!(sent.ends_with("RSET\r\n"));
}

#[tokio::test]
async fn test_default_from_and_no_recipients() {
    let (stream, sent) = MockStream::new("220 mx.test\r\n250 mx.test\r\n");
    let handler = handler(serde_json::json!({"default_from": "noreply@example.com"}));
    let client = handler.setup(SmtpStream::new(stream)).await.unwrap();

    let result = handler
        .send_with(client, vec![Message::new().with_subject("a").into()])
        .await;
    assert!(matches!(result, Err(Error::RecipientsRefused(_))));
    assert!(!sent_text(&sent).contains("MAIL FROM"));
}

#[tokio::test]
async fn test_smtputf8_required() {
    let (stream, _) = MockStream::new("220 mx.test\r\n250 mx.test\r\n");
    let handler = SmtpEmailHandler::default();
    let client = handler.setup(SmtpStream::new(stream)).await.unwrap();

    let message = Message::new().with_to(["jörg@example.com"]).with_text("x");
    let result = handler.send_with(client, vec![message.into()]).await;
    assert!(matches!(result, Err(Error::NotSupported(ext)) if ext == "SMTPUTF8"));
}

#[tokio::test]
async fn test_smtputf8_parameters() {
    let (stream, sent) = MockStream::new(concat!(
        "220 mx.test\r\n",
        "250-mx.test\r\n",
        "250 SMTPUTF8\r\n",
        "250 ok\r\n",
        "250 ok\r\n",
        "354 go ahead\r\n",
        "250 queued\r\n",
    ));
    let handler = SmtpEmailHandler::default();
    let client = handler.setup(SmtpStream::new(stream)).await.unwrap();

    let message = Message::new()
        .with_from_addr("jörg@example.com")
        .with_to(["a@example.com"])
        .with_text("x");
    handler.send_with(client, vec![message.into()]).await.unwrap();

    assert!(sent_text(&sent).contains("MAIL FROM:<jörg@example.com> SMTPUTF8 BODY=8BITMIME\r\n"));
}

#[tokio::test]
async fn test_non_ascii_names_without_smtputf8() {
    let (stream, sent) = MockStream::new(concat!(
        "220 mx.test\r\n",
        "250 mx.test\r\n",
        "250 ok\r\n",
        "250 ok\r\n",
        "354 go ahead\r\n",
        "250 queued\r\n",
    ));
    let handler = SmtpEmailHandler::default();
    let client = handler.setup(SmtpStream::new(stream)).await.unwrap();

    let message = Message::new()
        .with_subject("Grüße")
        .with_from_addr("Jörg <j@example.com>")
        .with_to(["Zoë <z@example.com>"])
        .with_text("héllo");
    handler.send_with(client, vec![message.into()]).await.unwrap();

    let sent = sent_text(&sent);
    assert!(sent.is_ascii());
    assert!(sent.contains("MAIL FROM:<j@example.com>\r\n"));
    assert!(sent.contains("RCPT TO:<z@example.com>\r\n"));
}

#[tokio::test]
async fn test_bad_greeting() {
    let (stream, _) = MockStream::new("554 go away\r\n");
    let result = SmtpEmailHandler::default().setup(SmtpStream::new(stream)).await;
    let error = result.unwrap_err();
    assert!(error.is_permanent());
    assert_eq!(error.to_string(), "SMTP error 554: go away");
}

#[tokio::test]
async fn test_connection_closed_mid_reply() {
    let (stream, _) = MockStream::new("220 mx.test\r\n250-mx.test\r\n");
    let result = SmtpEmailHandler::default().setup(SmtpStream::new(stream)).await;
    assert!(matches!(result, Err(Error::ConnectionClosed)));
}

/// Answers every command and records the lines it receives.
async fn serve_once(listener: TcpListener) -> Vec<String> {
    let (socket, _) = listener.accept().await.unwrap();
    let (read, mut write) = socket.into_split();
    let mut lines = BufReader::new(read).lines();
    let mut received = Vec::new();
    let mut in_data = false;

    write.write_all(b"220 local.test ESMTP\r\n").await.unwrap();
    while let Some(line) = lines.next_line().await.unwrap() {
        received.push(line.clone());
        let reply: &[u8] = if in_data {
            if line != "." {
                continue;
            }
            in_data = false;
            b"250 queued\r\n"
        } else {
            match line.split([' ', ':']).next().unwrap_or_default() {
                "EHLO" => b"250-local.test\r\n250 8BITMIME\r\n",
                "DATA" => {
                    in_data = true;
                    b"354 go ahead\r\n"
                }
                "QUIT" => b"221 bye\r\n",
                _ => b"250 ok\r\n",
            }
        };
        write.write_all(reply).await.unwrap();
        if line == "QUIT" {
            break;
        }
    }
    received
}

#[tokio::test]
async fn test_handler_over_tcp() {
    init_tracing();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = tokio::spawn(serve_once(listener));

    let handler = SmtpEmailHandler::new(SmtpConfig {
        host: Some("127.0.0.1".into()),
        port: Some(port),
        timeout: Some(5.0),
        ..SmtpConfig::default()
    });
    let messages = vec![
        Message::new().with_subject("a").with_to(["a@example.com"]).into(),
        Message::new()
            .with_subject("b")
            .with_from_addr("b@example.com")
            .with_to(["b@example.com"])
            .to_document()
            .into(),
    ];
    handler.send(messages).await.unwrap();

    let received = server.await.unwrap();
    assert_eq!(received.iter().filter(|l| *l == "DATA").count(), 2);
    assert!(received.contains(&"MAIL FROM:<>".to_string()));
    assert!(received.contains(&"MAIL FROM:<b@example.com>".to_string()));
    assert!(received.contains(&"Subject: b".to_string()));
    assert_eq!(received.last().map(String::as_str), Some("QUIT"));
}

#[tokio::test]
async fn test_connection_refused_is_handler_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let handler = SmtpEmailHandler::new(SmtpConfig {
        host: Some("127.0.0.1".into()),
        port: Some(port),
        ..SmtpConfig::default()
    });
    let result = handler
        .send(vec![Message::new().with_to(["a@example.com"]).into()])
        .await;
    assert!(matches!(result, Err(mailform::Error::Handler(_))));
}
