//! Wire-level tests for the INBOX operations.
//!
//! Each test scripts a full server conversation with `tokio_test::io::Builder`,
//! so every byte the client writes is checked in order.

use std::fmt::Write as _;

use inboxbridge_imap::mailbox::{fetch_inbox_message, list_inbox, login};
use inboxbridge_imap::{Error, Uid};
use tokio_test::io::Builder;

const GREETING: &[u8] = b"* OK [CAPABILITY IMAP4rev1 AUTH=PLAIN] Dovecot ready.\r\n";

fn examine_reply(exists: u32) -> String {
    format!(
        "* FLAGS (\\Answered \\Flagged \\Deleted \\Seen \\Draft)\r\n\
         * OK [PERMANENTFLAGS ()] Read-only mailbox.\r\n\
         * {exists} EXISTS\r\n\
         * 0 RECENT\r\n\
         * OK [UIDVALIDITY 1700000000] UIDs valid\r\n\
         * OK [UIDNEXT 9001] Predicted next UID\r\n\
         A0002 OK [READ-ONLY] Examine completed.\r\n"
    )
}

fn header_block(seq: u32) -> String {
    format!(
        "From: \"Sender {seq}\" <sender{seq}@example.org>\r\n\
         Subject: Message number\r\n {seq}\r\n\
         Date: Mon, 6 Oct 2025 09:{:02}:00 +0000\r\n\r\n",
        seq % 60
    )
}

fn fetch_reply(range: std::ops::RangeInclusive<u32>) -> String {
    let mut out = String::new();
    for seq in range {
        let block = header_block(seq);
        let _ = write!(
            out,
            "* {seq} FETCH (UID {} BODY[HEADER.FIELDS (FROM TO SUBJECT DATE)] {{{}}}\r\n{block})\r\n",
            1000 + seq,
            block.len()
        );
    }
    out.push_str("A0003 OK Fetch completed.\r\n");
    out
}

#[tokio::test]
async fn lists_newest_window_newest_first() {
    let mock = Builder::new()
        .read(GREETING)
        .write(b"A0001 LOGIN ada@example.org hunter2\r\n")
        .read(b"A0001 OK Logged in\r\n")
        .write(b"A0002 EXAMINE INBOX\r\n")
        .read(examine_reply(30).as_bytes())
        .write(b"A0003 FETCH 6:30 (UID BODY.PEEK[HEADER.FIELDS (FROM TO SUBJECT DATE)])\r\n")
        .read(fetch_reply(6..=30).as_bytes())
        .write(b"A0004 LOGOUT\r\n")
        .read(b"* BYE Logging out\r\nA0004 OK Logout completed.\r\n")
        .build();

    let client = login(mock, "ada@example.org", "hunter2").await.unwrap();
    let listing = list_inbox(client, 25).await.unwrap();

    assert_eq!(listing.len(), 25);
    assert_eq!(listing[0].uid.get(), 1030);
    assert_eq!(listing[24].uid.get(), 1006);

    let newest = &listing[0].headers;
    assert_eq!(newest.get("subject"), Some("Message number 30"));
    assert_eq!(
        newest.get("from"),
        Some("\"Sender 30\" <sender30@example.org>")
    );
    assert_eq!(newest.get("date"), Some("Mon, 6 Oct 2025 09:30:00 +0000"));
}

#[tokio::test]
async fn empty_mailbox_skips_fetch() {
    let mock = Builder::new()
        .read(GREETING)
        .write(b"A0001 LOGIN ada secret\r\n")
        .read(b"A0001 OK Logged in\r\n")
        .write(b"A0002 EXAMINE INBOX\r\n")
        .read(examine_reply(0).as_bytes())
        .write(b"A0003 LOGOUT\r\n")
        .read(b"A0003 OK bye\r\n")
        .build();

    let client = login(mock, "ada", "secret").await.unwrap();
    let listing = list_inbox(client, 25).await.unwrap();
    assert!(listing.is_empty());
}

#[tokio::test]
async fn small_mailbox_lists_everything() {
    let mock = Builder::new()
        .read(GREETING)
        .write(b"A0001 LOGIN ada secret\r\n")
        .read(b"A0001 OK Logged in\r\n")
        .write(b"A0002 EXAMINE INBOX\r\n")
        .read(examine_reply(3).as_bytes())
        .write(b"A0003 FETCH 1:3 (UID BODY.PEEK[HEADER.FIELDS (FROM TO SUBJECT DATE)])\r\n")
        .read(fetch_reply(1..=3).as_bytes())
        .write(b"A0004 LOGOUT\r\n")
        .read(b"A0004 OK bye\r\n")
        .build();

    let client = login(mock, "ada", "secret").await.unwrap();
    let uids: Vec<u32> = list_inbox(client, 25)
        .await
        .unwrap()
        .iter()
        .map(|entry| entry.uid.get())
        .collect();
    assert_eq!(uids, vec![1003, 1002, 1001]);
}

#[tokio::test]
async fn fetches_raw_message_by_uid() {
    let raw = "Subject: Hi\r\nFrom: a@b.c\r\n\r\nBody line\r\n";
    let fetch = format!(
        "* 2 FETCH (UID 4711 BODY[] {{{}}}\r\n{raw})\r\nA0003 OK Fetch completed.\r\n",
        raw.len()
    );
    let mock = Builder::new()
        .read(GREETING)
        .write(b"A0001 LOGIN ada secret\r\n")
        .read(b"A0001 OK Logged in\r\n")
        .write(b"A0002 EXAMINE INBOX\r\n")
        .read(examine_reply(2).as_bytes())
        .write(b"A0003 UID FETCH 4711 (UID BODY.PEEK[])\r\n")
        .read(fetch.as_bytes())
        .write(b"A0004 LOGOUT\r\n")
        .read(b"A0004 OK bye\r\n")
        .build();

    let client = login(mock, "ada", "secret").await.unwrap();
    let body = fetch_inbox_message(client, Uid::new(4711).unwrap())
        .await
        .unwrap();
    assert_eq!(body, raw.as_bytes());
}

#[tokio::test]
async fn unknown_uid_is_not_found() {
    let mock = Builder::new()
        .read(GREETING)
        .write(b"A0001 LOGIN ada secret\r\n")
        .read(b"A0001 OK Logged in\r\n")
        .write(b"A0002 EXAMINE INBOX\r\n")
        .read(examine_reply(2).as_bytes())
        .write(b"A0003 UID FETCH 77 (UID BODY.PEEK[])\r\n")
        .read(b"A0003 OK Fetch completed.\r\n")
        .write(b"A0004 LOGOUT\r\n")
        .read(b"A0004 OK bye\r\n")
        .build();

    let client = login(mock, "ada", "secret").await.unwrap();
    let err = fetch_inbox_message(client, Uid::new(77).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn missing_mailbox_is_no() {
    let mock = Builder::new()
        .read(GREETING)
        .write(b"A0001 LOGIN ada secret\r\n")
        .read(b"A0001 OK Logged in\r\n")
        .write(b"A0002 EXAMINE INBOX\r\n")
        .read(b"A0002 NO [NONEXISTENT] Mailbox doesn't exist\r\n")
        .write(b"A0003 LOGOUT\r\n")
        .read(b"A0003 OK bye\r\n")
        .build();

    let client = login(mock, "ada", "secret").await.unwrap();
    let err = list_inbox(client, 10).await.unwrap_err();
    assert!(matches!(err, Error::No(text) if text == "Mailbox doesn't exist"));
}
