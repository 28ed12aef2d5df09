//! Runtime configuration.
//!
//! Loaded from `<config_dir>/mailsift/config.json`. Every section has
//! defaults, so a missing file or a partial file is valid. Secrets can be
//! supplied through the environment instead of the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Environment variable overriding `llm.api_key`.
pub const ENV_LLM_API_KEY: &str = "MAILSIFT_LLM_API_KEY";
/// Environment variable overriding `imap.password`.
pub const ENV_IMAP_PASSWORD: &str = "MAILSIFT_IMAP_PASSWORD";
/// Environment variable overriding `store.root`.
pub const ENV_MAIL_ROOT: &str = "MAILSIFT_MAIL_ROOT";

const APP_DIR: &str = "mailsift";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Mail store layout.
    pub store: StoreConfig,
    /// LLM backend.
    pub llm: LlmConfig,
    /// Remote mailbox used for two-tier deletion. Without it DELETE always fails.
    pub imap: Option<ImapSettings>,
    /// Reply drafting and sending.
    pub reply: ReplyConfig,
    /// Batch sizing and cooldown.
    pub batch: BatchConfig,
    /// Rule database path. Defaults to `<data_dir>/mailsift/rules.db`.
    pub rules_db: Option<PathBuf>,
}

impl Config {
    /// Default location of the configuration file.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.json")
    }

    /// Loads configuration from `path`, falling back to defaults when the
    /// file does not exist, then applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Self> {
        let mut config = if tokio::fs::try_exists(path).await? {
            let contents = tokio::fs::read_to_string(path).await?;
            serde_json::from_str(&contents)
                .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Applies overrides from a key lookup (normally the process environment).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(ENV_LLM_API_KEY) {
            self.llm.api_key = Some(key);
        }
        if let Some(root) = lookup(ENV_MAIL_ROOT) {
            self.store.root = PathBuf::from(root);
        }
        if let (Some(password), Some(imap)) = (lookup(ENV_IMAP_PASSWORD), self.imap.as_mut()) {
            imap.password = Some(password);
        }
    }

    /// Path of the rule database.
    #[must_use]
    pub fn rules_db_path(&self) -> PathBuf {
        self.rules_db
            .clone()
            .unwrap_or_else(|| data_dir().join("rules.db"))
    }
}

/// `<data_dir>/mailsift`.
#[must_use]
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// `<cache_dir>/mailsift`.
#[must_use]
pub fn cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Mail store root and per-folder directory names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory containing every folder.
    pub root: PathBuf,
    /// Inbox directory name.
    pub inbox: String,
    /// Important directory name.
    pub important: String,
    /// Archive directory name.
    pub archive: String,
    /// Follow-up (review) directory name.
    pub follow_up: String,
    /// Trash directory name.
    pub trash: String,
    /// Spam directory name.
    pub spam: String,
    /// Sent directory name.
    pub sent: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".mail"),
            inbox: "Inbox".to_string(),
            important: "Important".to_string(),
            archive: "Archive".to_string(),
            follow_up: "FollowUp".to_string(),
            trash: "Trash".to_string(),
            spam: "Spam".to_string(),
            sent: "Sent".to_string(),
        }
    }
}

/// Shape of the JSON request sent to the LLM endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStyle {
    /// OpenAI-compatible `/v1/chat/completions` (`messages` array).
    #[default]
    Chat,
    /// OpenAI-compatible `/v1/completions` (`prompt` string).
    Completion,
    /// Ollama `/api/generate` (`prompt` string, `stream: false`).
    Generate,
}

/// LLM backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Full endpoint URL.
    pub endpoint: String,
    /// Model name sent with each request.
    pub model: String,
    /// Bearer token, if the endpoint needs one.
    pub api_key: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum cleaned body length passed to the summary prompt.
    pub body_limit: usize,
    /// Request envelope.
    pub style: RequestStyle,
}

impl LlmConfig {
    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434/v1/chat/completions".to_string(),
            model: "llama3.1".to_string(),
            api_key: None,
            timeout_secs: 120,
            body_limit: 1000,
            style: RequestStyle::Chat,
        }
    }
}

/// Transport security for the remote mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Security {
    /// No encryption.
    None,
    /// Implicit TLS.
    #[default]
    Tls,
    /// STARTTLS upgrade after plaintext connect.
    StartTls,
}

impl From<Security> for mailsift_imap::Security {
    fn from(security: Security) -> Self {
        match security {
            Security::None => Self::None,
            Security::Tls => Self::Implicit,
            Security::StartTls => Self::StartTls,
        }
    }
}

/// Remote mailbox settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImapSettings {
    /// Server hostname.
    pub host: String,
    /// Server port; defaults from `security`.
    #[serde(default)]
    pub port: Option<u16>,
    /// Security mode.
    #[serde(default)]
    pub security: Security,
    /// Login name.
    pub username: String,
    /// Password; usually supplied via `MAILSIFT_IMAP_PASSWORD`.
    #[serde(default)]
    pub password: Option<String>,
    /// Mailbox searched for the message.
    #[serde(default = "default_mailbox")]
    pub mailbox: String,
    /// Timeout in seconds for connecting, and again for the session after it.
    #[serde(default = "default_connect_timeout")]
    pub timeout_secs: u64,
}

fn default_mailbox() -> String {
    "INBOX".to_string()
}

const fn default_connect_timeout() -> u64 {
    30
}

impl ImapSettings {
    /// Builds the client connection config.
    #[must_use]
    pub fn connection_config(&self) -> mailsift_imap::Config {
        let config = mailsift_imap::Config::new(&self.host).with_security(self.security.into());
        let config = match self.port {
            Some(port) => config.with_port(port),
            None => config,
        };
        mailsift_imap::Config {
            connect_timeout: self.session_timeout(),
            ..config
        }
    }

    /// Bound on connect and on the login-to-logout exchange.
    #[must_use]
    pub const fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Reply drafting and sending.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplyConfig {
    /// Directory for `reply_<file>.txt` drafts.
    pub drafts_dir: PathBuf,
    /// From address used when sending.
    pub from_address: String,
    /// Sendmail-compatible command; the recipient is appended as the last
    /// argument and the message is written to stdin.
    pub send_command: Vec<String>,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            drafts_dir: data_dir().join("replies"),
            from_address: String::new(),
            send_command: vec!["msmtp".to_string(), "-a".to_string(), "default".to_string()],
        }
    }
}

/// Batching and cooldown.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Messages per batch in silent-batched mode.
    pub size: usize,
    /// Lower bound of the randomized cooldown, in seconds.
    pub cooldown_min_secs: u64,
    /// Upper bound of the randomized cooldown, in seconds.
    pub cooldown_max_secs: u64,
    /// Stop after this many batches.
    pub max_batches: Option<usize>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            size: 5,
            cooldown_min_secs: 20,
            cooldown_max_secs: 40,
            max_batches: None,
        }
    }
}
