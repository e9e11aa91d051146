//! SMTP dialogue tests against an in-process fake server.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread;

use casekit_vnv::{MailError, MailMessage, MailSettings, MailTransport, SmtpTransport};

/// Accept one connection, answer each command and return every line received.
fn fake_server(reject_data: bool) -> (u16, thread::JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream.try_clone().expect("clone"));
        let mut writer = stream;
        let mut received = Vec::new();
        writer
            .write_all(b"220-fake.example ESMTP\r\n220 ready\r\n")
            .expect("greeting");
        let mut in_data = false;
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).expect("read") == 0 {
                break;
            }
            let line = line.trim_end_matches("\r\n").to_string();
            received.push(line.clone());
            let reply: &[u8] = if in_data {
                if line != "." {
                    continue;
                }
                in_data = false;
                b"250 queued\r\n"
            } else if line == "DATA" {
                if reject_data {
                    b"554 no thanks\r\n"
                } else {
                    in_data = true;
                    b"354 go ahead\r\n"
                }
            } else if line == "QUIT" {
                writer.write_all(b"221 bye\r\n").expect("reply");
                break;
            } else {
                b"250 ok\r\n"
            };
            writer.write_all(reply).expect("reply");
            if reject_data && line == "DATA" {
                break;
            }
        }
        received
    });
    (port, handle)
}

fn message() -> MailMessage {
    MailMessage {
        from: "autovnv@localhost".to_string(),
        to: vec!["a@example.org".to_string(), "b@example.org".to_string()],
        subject: "Code_Saturne. Auto V&V 2026-10-18".to_string(),
        body: "Summary\n.hidden line\n".to_string(),
        attachments: Vec::new(),
    }
}

#[test]
fn smtp_dialogue_sends_envelope_and_dot_stuffed_data() {
    let (port, server) = fake_server(false);
    let settings = MailSettings {
        server: "127.0.0.1".to_string(),
        port,
        ..MailSettings::default()
    };
    let mut transport = SmtpTransport::new(settings, "node01");

    transport.send(&message()).expect("send");

    let received = server.join().expect("server thread");
    assert_eq!(received[0], "HELO node01");
    assert_eq!(received[1], "MAIL FROM:<autovnv@localhost>");
    assert_eq!(received[2], "RCPT TO:<a@example.org>");
    assert_eq!(received[3], "RCPT TO:<b@example.org>");
    assert_eq!(received[4], "DATA");
    assert!(received.contains(&"Subject: Code_Saturne. Auto V&V 2026-10-18".to_string()));
    assert!(received.contains(&"..hidden line".to_string()));
    assert_eq!(received.last().map(String::as_str), Some("QUIT"));
}

#[test]
fn rejected_command_is_reported() {
    let (port, server) = fake_server(true);
    let settings = MailSettings {
        server: "127.0.0.1".to_string(),
        port,
        ..MailSettings::default()
    };
    let mut transport = SmtpTransport::new(settings, "node01");

    let err = transport.send(&message()).expect_err("data rejected");

    let MailError::Rejected { command, reply } = err else {
        panic!("expected a rejected command, got {err:?}");
    };
    assert_eq!(command, "DATA");
    assert!(reply.starts_with("554"));
    server.join().expect("server thread");
}

#[test]
fn empty_recipient_list_is_refused() {
    let mut transport = SmtpTransport::new(MailSettings::default(), "node01");
    let mut message = message();
    message.to.clear();
    assert!(matches!(transport.send(&message), Err(MailError::NoRecipients)));
}
