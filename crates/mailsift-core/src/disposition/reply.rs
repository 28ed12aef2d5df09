//! Reply drafting and sending.

use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::classifier::{LlmClient, LlmError, reply_prompt};
use crate::config::ReplyConfig;
use crate::reader::Message;

/// Reply failures.
#[derive(Debug, Error)]
pub enum ReplyError {
    /// Drafting through the LLM failed.
    #[error("could not draft reply: {0}")]
    Llm(#[from] LlmError),

    /// Writing the draft or talking to the send command failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Sending needs a configured command.
    #[error("no send command configured")]
    NoSendCommand,

    /// Sending needs a From address.
    #[error("no from address configured")]
    NoFromAddress,

    /// The original sender has no usable address.
    #[error("no reply address in {0:?}")]
    NoRecipient(String),

    /// The send command exited unsuccessfully.
    #[error("send command failed ({status}): {stderr}")]
    SendFailed {
        /// Exit status.
        status: String,
        /// Captured standard error.
        stderr: String,
    },
}

/// Produces reply text and either keeps it as a draft or transmits it.
pub trait ReplyDrafter {
    /// Drafts a reply to `message`.
    fn draft(&self, message: &Message) -> impl Future<Output = Result<String, ReplyError>> + Send;

    /// Persists a draft and returns where it went.
    fn save_draft(
        &self,
        message: &Message,
        reply: &str,
    ) -> impl Future<Output = Result<PathBuf, ReplyError>> + Send;

    /// Transmits a reply to the original sender.
    fn send(&self, message: &Message, reply: &str)
    -> impl Future<Output = Result<(), ReplyError>> + Send;
}

/// [`ReplyDrafter`] that drafts through an LLM, saves drafts as text files
/// and sends through a sendmail-compatible command.
#[derive(Debug, Clone)]
pub struct LlmReplyDrafter<L> {
    llm: L,
    config: ReplyConfig,
}

impl<L> LlmReplyDrafter<L> {
    /// Creates a drafter.
    pub const fn new(llm: L, config: ReplyConfig) -> Self {
        Self { llm, config }
    }

    /// Draft location for a message file.
    #[must_use]
    pub fn draft_path(&self, message: &Message) -> PathBuf {
        self.config.drafts_dir.join(format!("reply_{}.txt", message.file))
    }
}

impl<L: LlmClient + Sync> ReplyDrafter for LlmReplyDrafter<L> {
    async fn draft(&self, message: &Message) -> Result<String, ReplyError> {
        let prompt = reply_prompt(message);
        let reply = self.llm.complete(&prompt).await?;
        debug!(file = %message.file, chars = reply.len(), "reply drafted");
        Ok(reply)
    }

    async fn save_draft(&self, message: &Message, reply: &str) -> Result<PathBuf, ReplyError> {
        tokio::fs::create_dir_all(&self.config.drafts_dir).await?;
        let path = self.draft_path(message);
        let to = reply_address(&message.sender).unwrap_or(&message.sender);
        tokio::fs::write(&path, compose(&self.config.from_address, to, &message.subject, reply))
            .await?;
        info!(file = %message.file, path = %path.display(), "reply draft saved");
        Ok(path)
    }

    async fn send(&self, message: &Message, reply: &str) -> Result<(), ReplyError> {
        let (program, args) = self
            .config
            .send_command
            .split_first()
            .ok_or(ReplyError::NoSendCommand)?;
        if self.config.from_address.trim().is_empty() {
            return Err(ReplyError::NoFromAddress);
        }
        let to = reply_address(&message.sender)
            .ok_or_else(|| ReplyError::NoRecipient(message.sender.clone()))?;
        let composed = compose(&self.config.from_address, to, &message.subject, reply);

        let mut child = tokio::process::Command::new(program)
            .args(args)
            .arg(to)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            let written = async {
                stdin.write_all(composed.as_bytes()).await?;
                stdin.shutdown().await
            };
            // A command that exits early is reported by its status below.
            if let Err(e) = written.await
                && e.kind() != std::io::ErrorKind::BrokenPipe
            {
                return Err(e.into());
            }
        }
        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(ReplyError::SendFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        info!(file = %message.file, to, "reply sent");
        Ok(())
    }
}

/// Bare address from a From header value.
fn reply_address(sender: &str) -> Option<&str> {
    let address = match (sender.rfind('<'), sender.rfind('>')) {
        (Some(start), Some(end)) if start < end => &sender[start + 1..end],
        _ => sender,
    };
    let address = address.trim();
    address.contains('@').then_some(address)
}

fn compose(from: &str, to: &str, subject: &str, body: &str) -> String {
    let subject = if subject.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("re:")) {
        subject.to_string()
    } else {
        format!("Re: {subject}")
    };
    let mut message = String::new();
    if !from.trim().is_empty() {
        message.push_str(&format!("From: {from}\n"));
    }
    message.push_str(&format!("To: {to}\nSubject: {subject}\n\n{body}\n"));
    message
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedLlm, message};

    fn drafter(dir: &std::path::Path, send_command: &[&str]) -> LlmReplyDrafter<ScriptedLlm> {
        LlmReplyDrafter::new(
            ScriptedLlm::new(["Thanks, I'll be there."]),
            ReplyConfig {
                drafts_dir: dir.join("replies"),
                from_address: "me@example.com".to_string(),
                send_command: send_command.iter().map(ToString::to_string).collect(),
            },
        )
    }

    #[test]
    fn test_reply_address() {
        assert_eq!(reply_address("Alice <alice@example.com>"), Some("alice@example.com"));
        assert_eq!(reply_address(" bob@example.com "), Some("bob@example.com"));
        assert_eq!(reply_address("Unknown Sender"), None);
    }

    #[test]
    fn test_compose_does_not_double_prefix() {
        assert_eq!(
            compose("me@x", "you@y", "RE: lunch", "ok"),
            "From: me@x\nTo: you@y\nSubject: RE: lunch\n\nok\n"
        );
        assert_eq!(compose("", "you@y", "lunch", "ok"), "To: you@y\nSubject: Re: lunch\n\nok\n");
    }

    #[tokio::test]
    async fn test_draft_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let drafter = drafter(dir.path(), &["true"]);
        let message = message("1700.M1.host", "Alice <alice@example.com>", "Dinner");

        let reply = drafter.draft(&message).await.unwrap();
        let path = drafter.save_draft(&message, &reply).await.unwrap();

        assert_eq!(path, dir.path().join("replies").join("reply_1700.M1.host.txt"));
        let saved = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(saved.contains("To: alice@example.com\nSubject: Re: Dinner\n\nThanks, I'll be there."));
    }

    #[tokio::test]
    async fn test_send_pipes_message_to_command() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("sent.eml");
        let script = format!("cat > '{}'", out.display());
        let drafter = drafter(dir.path(), &["sh", "-c", &script]);
        let message = message("m", "Alice <alice@example.com>", "Dinner");

        drafter.send(&message, "See you").await.unwrap();

        let sent = tokio::fs::read_to_string(&out).await.unwrap();
        assert_eq!(
            sent,
            "From: me@example.com\nTo: alice@example.com\nSubject: Re: Dinner\n\nSee you\n"
        );
    }

    #[tokio::test]
    async fn test_send_failures() {
        let dir = tempfile::tempdir().unwrap();
        let message = message("m", "alice@example.com", "Dinner");

        let failing = drafter(dir.path(), &["false"]);
        assert!(matches!(
            failing.send(&message, "x").await,
            Err(ReplyError::SendFailed { .. })
        ));

        let unset = drafter(dir.path(), &[]);
        assert!(matches!(unset.send(&message, "x").await, Err(ReplyError::NoSendCommand)));

        let nobody = drafter(dir.path(), &["true"]);
        let anonymous = crate::testing::message("m", "Unknown Sender", "Dinner");
        assert!(matches!(
            nobody.send(&anonymous, "x").await,
            Err(ReplyError::NoRecipient(_))
        ));
    }
}
