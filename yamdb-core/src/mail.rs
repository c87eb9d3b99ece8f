//! Outgoing email.
//!
//! The service only ever sends confirmation codes, so the abstraction is a
//! single `send`. Delivery backends are picked from configuration.

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::error::{CoreError, Result};

pub const CONFIRMATION_SUBJECT: &str = "Confirmation code";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

impl OutgoingEmail {
    pub fn confirmation(from: &str, to: &str, code: &str) -> Self {
        Self {
            from: from.to_string(),
            to: vec![to.to_string()],
            subject: CONFIRMATION_SUBJECT.to_string(),
            body: format!("Code: {code}"),
        }
    }

    /// RFC 822 style rendering used by the file backend.
    pub fn render(&self) -> String {
        format!(
            "From: {}\nTo: {}\nSubject: {}\nDate: {}\n\n{}\n",
            self.from,
            self.to.join(", "),
            self.subject,
            Utc::now().to_rfc2822(),
            self.body
        )
    }
}

#[async_trait]
pub trait Mailer: Send + Sync + Debug {
    async fn send(&self, email: &OutgoingEmail) -> Result<()>;
}

/// Writes messages to the log instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleMailer;

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        info!(
            target: "yamdb::mail",
            from = %email.from,
            to = ?email.to,
            subject = %email.subject,
            body = %email.body,
            "outgoing email"
        );
        Ok(())
    }
}

/// Stores every message as its own `.log` file inside a directory.
#[derive(Debug, Clone)]
pub struct FileMailer {
    dir: PathBuf,
}

impl FileMailer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl Mailer for FileMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|err| CoreError::Mail(format!("{}: {err}", self.dir.display())))?;

        let name = format!(
            "{}-{}.log",
            Utc::now().format("%Y%m%d-%H%M%S"),
            Uuid::new_v4().simple()
        );
        let path = self.dir.join(name);
        tokio::fs::write(&path, email.render())
            .await
            .map_err(|err| CoreError::Mail(format!("{}: {err}", path.display())))?;

        info!(target: "yamdb::mail", path = %path.display(), "email written to file");
        Ok(())
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use recording::RecordingMailer;

#[cfg(any(test, feature = "test-utils"))]
mod recording {
    use super::*;
    use tokio::sync::Mutex;

    /// Keeps sent messages in memory so tests can read confirmation codes.
    #[derive(Debug, Default)]
    pub struct RecordingMailer {
        sent: Mutex<Vec<OutgoingEmail>>,
    }

    impl RecordingMailer {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn sent(&self) -> Vec<OutgoingEmail> {
            self.sent.lock().await.clone()
        }

        /// Most recent message addressed to `recipient`.
        pub async fn last_to(&self, recipient: &str) -> Option<OutgoingEmail> {
            self.sent
                .lock()
                .await
                .iter()
                .rev()
                .find(|email| email.to.iter().any(|to| to == recipient))
                .cloned()
        }

        /// Confirmation code from the latest message to `recipient`.
        pub async fn last_code_for(&self, recipient: &str) -> Option<String> {
            let email = self.last_to(recipient).await?;
            email.body.strip_prefix("Code: ").map(str::to_string)
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &OutgoingEmail) -> Result<()> {
            self.sent.lock().await.push(email.clone());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_mailer_writes_one_file_per_message() {
        let dir = tempfile::tempdir().unwrap();
        let mailer = FileMailer::new(dir.path().join("outbox"));
        let email = OutgoingEmail::confirmation("yamdb@example.com", "reader@yamdb.example", "abc-123");

        mailer.send(&email).await.unwrap();
        mailer.send(&email).await.unwrap();

        let mut entries = std::fs::read_dir(mailer.dir()).unwrap();
        let first = entries.next().unwrap().unwrap().path();
        assert_eq!(first.extension().and_then(|ext| ext.to_str()), Some("log"));
        assert!(entries.next().is_some());

        let contents = std::fs::read_to_string(first).unwrap();
        assert!(contents.contains("Subject: Confirmation code"));
        assert!(contents.contains("Code: abc-123"));
    }

    #[tokio::test]
    async fn recording_mailer_extracts_codes() {
        let mailer = RecordingMailer::new();
        mailer
            .send(&OutgoingEmail::confirmation("from@yamdb.example", "a@yamdb.example", "one"))
            .await
            .unwrap();
        mailer
            .send(&OutgoingEmail::confirmation("from@yamdb.example", "a@yamdb.example", "two"))
            .await
            .unwrap();

        assert_eq!(mailer.sent().await.len(), 2);
        assert_eq!(mailer.last_code_for("a@yamdb.example").await.as_deref(), Some("two"));
        assert_eq!(mailer.last_code_for("b@yamdb.example").await, None);
    }

    #[tokio::test]
    async fn console_mailer_never_fails() {
        let email = OutgoingEmail::confirmation("from@yamdb.example", "a@yamdb.example", "x");
        assert!(ConsoleMailer.send(&email).await.is_ok());
    }
}
