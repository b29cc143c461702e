//! IMAP adapter against a scripted plaintext server on localhost.

use std::time::Duration;

use inboxbridge_core::provider::{ImapAdapter, MailProvider};
use inboxbridge_core::{Credentials, ErrorKind, ImapCredential, service};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// One expected client line (by prefix) and the server's reply.
type Step = (&'static str, String);

/// Accepts one connection and plays `steps` against it.
async fn scripted_server(steps: Vec<Step>) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let (read, mut write) = socket.into_split();
        let mut lines = BufReader::new(read).lines();
        write.write_all(b"* OK IMAP4rev1 test server ready\r\n").await.unwrap();
        for (expected, reply) in steps {
            let Some(line) = lines.next_line().await.unwrap() else {
                return;
            };
            assert!(line.starts_with(expected), "expected {expected:?}, got {line:?}");
            write.write_all(reply.as_bytes()).await.unwrap();
        }
    });
    port
}

fn login(port: u16, password: &str) -> Credentials {
    Credentials::Imap(ImapCredential {
        host: "127.0.0.1".to_string(),
        port,
        user: "ada".to_string(),
        password: password.to_string(),
        use_tls: false,
        accept_invalid_certs: false,
    })
}

fn adapter() -> ImapAdapter {
    ImapAdapter::new(Duration::from_secs(2), Duration::from_secs(5))
}

fn examine(exists: u32) -> String {
    format!("* {exists} EXISTS\r\n* OK [UIDVALIDITY 1] ok\r\nA0002 OK [READ-ONLY] done\r\n")
}

#[tokio::test]
async fn lists_newest_first() {
    let mut fetch = String::new();
    for (seq, subject, from) in [
        (2, "Older", "bob@example.org"),
        (3, "Newest", "\"Ada L\" <ada@example.org>"),
    ] {
        let block = format!("Subject: {subject}\r\nFrom: {from}\r\nDate: Mon, 6 Oct 2025 0{seq}:00:00 +0000\r\n\r\n");
        fetch.push_str(&format!(
            "* {seq} FETCH (UID {} BODY[HEADER.FIELDS (FROM TO SUBJECT DATE)] {{{}}}\r\n{block})\r\n",
            100 + seq,
            block.len()
        ));
    }
    fetch.push_str("A0003 OK done\r\n");

    let port = scripted_server(vec![
        ("A0001 LOGIN ada secret", "A0001 OK logged in\r\n".to_string()),
        ("A0002 EXAMINE INBOX", examine(3)),
        ("A0003 FETCH 2:3", fetch),
        ("A0004 LOGOUT", "* BYE\r\nA0004 OK bye\r\n".to_string()),
    ])
    .await;

    let listed = service::list_messages(&adapter(), &login(port, "secret"), 2)
        .await
        .unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, "103");
    assert_eq!(listed[0].subject, "Newest");
    assert_eq!(listed[0].from, "Ada L <ada@example.org>");
    assert_eq!(listed[1].from, "bob@example.org");
    assert_eq!(listed[1].date, "Mon, 6 Oct 2025 02:00:00 +0000");
}

#[tokio::test]
async fn detail_parses_fetched_message() {
    let raw = "From: Ada <ada@example.org>\r\n\
               To: \"Bob B\" <bob@example.org>\r\n\
               Subject: Minutes\r\n\
               Date: Tue, 7 Oct 2025 10:00:00 +0000\r\n\
               Content-Type: text/plain; charset=utf-8\r\n\
               \r\n\
               Decisions:\r\n  ship it.\r\n";
    let fetch = format!(
        "* 1 FETCH (UID 55 BODY[] {{{}}}\r\n{raw})\r\nA0003 OK done\r\n",
        raw.len()
    );
    let port = scripted_server(vec![
        ("A0001 LOGIN", "A0001 OK logged in\r\n".to_string()),
        ("A0002 EXAMINE INBOX", examine(1)),
        ("A0003 UID FETCH 55", fetch),
        ("A0004 LOGOUT", "A0004 OK bye\r\n".to_string()),
    ])
    .await;

    let detail = service::get_message_detail(&adapter(), &login(port, "pw"), "55")
        .await
        .unwrap();
    assert_eq!(detail.summary.id, "55");
    assert_eq!(detail.summary.subject, "Minutes");
    assert_eq!(detail.summary.date, "Tue, 7 Oct 2025 10:00:00 +0000");
    assert_eq!(detail.summary.snippet, "Decisions: ship it.");
    assert_eq!(detail.to.as_deref(), Some("Bob B <bob@example.org>"));
    assert!(detail.body.contains("ship it."));
}

#[tokio::test]
async fn rejected_login_fails_connection_test() {
    let port = scripted_server(vec![
        (
            "A0001 LOGIN ada wrong",
            "A0001 NO [AUTHENTICATIONFAILED] Invalid credentials\r\n".to_string(),
        ),
        ("A0002 LOGOUT", "A0002 OK bye\r\n".to_string()),
    ])
    .await;

    let result = adapter().test_connection(&login(port, "wrong")).await;
    assert!(!result.success);
    assert_eq!(result.kind, Some(ErrorKind::AuthenticationFailed));
}

/// Accepts one connection, never greets, and reports what the first read
/// returns once the client gives up.
async fn silent_server() -> (u16, JoinHandle<std::io::Result<usize>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 64];
        socket.read(&mut buf).await
    });
    (port, handle)
}

fn quick_adapter() -> ImapAdapter {
    ImapAdapter::new(Duration::from_millis(200), Duration::from_millis(400))
}

/// The client must have closed its socket, so the server reads EOF.
async fn assert_closed(handle: JoinHandle<std::io::Result<usize>>) {
    let read = tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("socket left open after timeout")
        .unwrap();
    assert_eq!(read.unwrap(), 0);
}

#[tokio::test]
async fn silent_server_list_times_out_and_closes() {
    let (port, server) = silent_server().await;

    let err = quick_adapter().list(&login(port, "pw"), 5).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_closed(server).await;
}

#[tokio::test]
async fn silent_server_connection_test_times_out_and_closes() {
    let (port, server) = silent_server().await;

    let result = quick_adapter().test_connection(&login(port, "pw")).await;
    assert!(!result.success);
    assert_eq!(result.kind, Some(ErrorKind::Timeout));
    assert_closed(server).await;
}
