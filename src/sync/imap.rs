use chrono::NaiveDateTime;
use futures::TryStreamExt;

use crate::core::email::Email;
use crate::error::FetchError;

type ImapSession = async_imap::Session<async_native_tls::TlsStream<async_std::net::TcpStream>>;

const IMAPS_PORT: u16 = 993;

/// Resolve a folder name case-insensitively against the server's mailbox list.
async fn resolve_folder(session: &mut ImapSession, folder: &str) -> Result<String, FetchError> {
    let folders_stream = session
        .list(Some(""), Some("*"))
        .await
        .map_err(|e| FetchError::Protocol(format!("Failed to list folders: {}", e)))?;
    let folders: Vec<_> = folders_stream
        .try_collect()
        .await
        .map_err(|e| FetchError::Protocol(format!("Failed to collect folders: {}", e)))?;

    folders
        .iter()
        .find(|f| f.name().eq_ignore_ascii_case(folder))
        .map(|f| f.name().to_string())
        .ok_or_else(|| {
            FetchError::Protocol(format!(
                "Folder '{}' not found (available: {})",
                folder,
                folders
                    .iter()
                    .map(|f| f.name().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })
}

/// Connect to IMAP over TLS and return a logged-in session.
async fn connect_and_login(
    host: &str,
    username: &str,
    password: &str,
) -> Result<ImapSession, FetchError> {
    let tls = async_native_tls::TlsConnector::new();
    let tcp = async_std::net::TcpStream::connect((host, IMAPS_PORT))
        .await
        .map_err(|e| FetchError::Connection(format!("TCP connect failed: {}", e)))?;
    let tls_stream = tls
        .connect(host, tcp)
        .await
        .map_err(|e| FetchError::Connection(format!("TLS connect failed: {}", e)))?;

    let client = async_imap::Client::new(tls_stream);
    client
        .login(username, password)
        .await
        .map_err(|e| FetchError::Credentials(format!("IMAP login failed: {}", e.0)))
}

/// Turn one raw RFC 822 message into an email. Messages without a usable
/// date are skipped since the received time is part of their identity.
pub fn parse_message(raw: &[u8]) -> Option<Email> {
    let parsed = mail_parser::MessageParser::default().parse(raw)?;

    let subject = parsed.subject().unwrap_or("(no subject)").to_string();
    let from = parsed
        .from()
        .and_then(|addrs| addrs.first())
        .and_then(|a| a.address().or(a.name()))
        .unwrap_or("unknown")
        .to_string();
    let dt = parsed.date()?;
    let received = NaiveDateTime::parse_from_str(
        &format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            dt.year, dt.month, dt.day, dt.hour, dt.minute, dt.second
        ),
        "%Y-%m-%d %H:%M:%S",
    )
    .ok()?;
    let body = parsed.body_text(0).unwrap_or_default().to_string();

    Some(Email::new(subject, from, received, body))
}

/// Fetch every message in `folder`.
pub async fn fetch_emails(
    host: &str,
    username: &str,
    password: &str,
    folder: &str,
) -> Result<Vec<Email>, FetchError> {
    let mut session = connect_and_login(host, username, password).await?;

    let folder = resolve_folder(&mut session, folder).await?;
    session
        .select(&folder)
        .await
        .map_err(|e| FetchError::Protocol(format!("Failed to select folder '{}': {}", folder, e)))?;

    let messages_stream = session
        .fetch("1:*", "(UID BODY.PEEK[])")
        .await
        .map_err(|e| FetchError::Protocol(format!("IMAP fetch failed: {}", e)))?;
    let messages: Vec<_> = messages_stream
        .try_collect()
        .await
        .map_err(|e| FetchError::Protocol(format!("IMAP stream error: {}", e)))?;

    let emails: Vec<Email> = messages
        .iter()
        .filter_map(|msg| msg.body())
        .filter_map(parse_message)
        .collect();
    log::debug!(
        "parsed {} of {} message(s) from {}",
        emails.len(),
        messages.len(),
        folder
    );

    session.logout().await.ok();
    Ok(emails)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = "From: Alice <alice@example.com>\r\n\
To: bob@example.com\r\n\
Subject: Project update\r\n\
Date: Tue, 1 Jan 2030 09:30:00 +0000\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
The project update is attached.\r\n";

    #[test]
    fn parses_plain_message() {
        let email = parse_message(RAW.as_bytes()).unwrap();
        assert_eq!(email.subject, "Project update");
        assert_eq!(email.from, "alice@example.com");
        assert_eq!(
            email.received,
            chrono::NaiveDate::from_ymd_opt(2030, 1, 1)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap()
        );
        assert!(email.body.contains("project update is attached"));
    }

    #[test]
    fn message_without_date_is_skipped() {
        let raw = "From: a@b.c\r\nSubject: hi\r\n\r\nbody\r\n";
        assert!(parse_message(raw.as_bytes()).is_none());
    }
}
