//! Command-line definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "mailsift")]
#[command(about = "Triage a maildir-style mail store with an LLM", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file [default: <config dir>/mailsift/config.json]
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Classify messages and apply the decisions.
    Run {
        /// How decisions are confirmed.
        #[arg(long, value_enum, default_value_t = RunMode::Interactive)]
        mode: RunMode,
        /// Folder to triage.
        #[arg(long, default_value = "Inbox")]
        folder: String,
        /// Only look at the first N messages in filename order (oldest first
        /// for maildir names).
        #[arg(long)]
        limit: Option<usize>,
        /// Messages per batch in batched mode [default: from config]
        #[arg(long)]
        batch_size: Option<usize>,
        /// Stop after N batches in batched mode.
        #[arg(long)]
        max_batches: Option<usize>,
        /// Apply every batch without asking; replies are saved as drafts.
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Go through a folder by hand: reply, delete, archive or skip.
    Review {
        /// Folder to review.
        #[arg(long, default_value = "FollowUp")]
        folder: String,
    },

    /// Ask the LLM which messages of the busiest senders can be deleted.
    Cleanup {
        /// Folder to analyze.
        #[arg(long, default_value = "Inbox")]
        folder: String,
        /// Number of senders to look at.
        #[arg(long, default_value_t = mailsift_core::batch::DEFAULT_TOP_SENDERS)]
        top: usize,
        /// Offer the recommended deletes for confirmation afterwards.
        #[arg(long)]
        apply: bool,
    },

    /// Show the message count of every folder.
    Status,

    /// List messages matching the given criteria.
    Search {
        /// Folder to search.
        #[arg(long, default_value = "Inbox")]
        folder: String,
        /// Sender substring.
        #[arg(long)]
        sender: Option<String>,
        /// Subject substring.
        #[arg(long)]
        subject: Option<String>,
        /// Earliest date, YYYY-MM-DD.
        #[arg(long)]
        from: Option<String>,
        /// Latest date, YYYY-MM-DD.
        #[arg(long)]
        to: Option<String>,
    },

    /// Manage stored filter rules.
    Rules {
        #[command(subcommand)]
        action: RulesCommand,
    },
}

#[derive(Subcommand)]
pub enum RulesCommand {
    /// List rules in evaluation order.
    List,
    /// Append a rule.
    Add {
        /// sender, subject, body or full_text.
        field: String,
        /// Regular expression, matched case-insensitively.
        pattern: String,
        /// DELETE, ARCHIVE or REVIEW.
        action: String,
    },
    /// Remove a rule by id.
    Remove {
        /// Rule id as shown by `rules list`.
        id: i64,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    /// Apply each decision right away; confirm replies.
    Interactive,
    /// Classify everything, then confirm once.
    Silent,
    /// Silent, in throttled batches.
    Batched,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_run_defaults_to_asking_on_inbox() {
        let cli = Cli::try_parse_from(["mailsift", "run"]).unwrap();
        let Command::Run { yes, folder, mode, .. } = cli.command else {
            panic!("expected run");
        };
        assert!(!yes);
        assert_eq!(folder, "Inbox");
        assert!(mode == RunMode::Interactive);
    }

    #[test]
    fn test_run_yes_and_folder() {
        let cli = Cli::try_parse_from([
            "mailsift", "run", "--mode", "silent", "--yes", "--folder", "FollowUp",
        ])
        .unwrap();
        let Command::Run { yes, folder, mode, .. } = cli.command else {
            panic!("expected run");
        };
        assert!(yes);
        assert_eq!(folder, "FollowUp");
        assert!(mode == RunMode::Silent);
    }

    #[test]
    fn test_review_and_cleanup_defaults() {
        let cli = Cli::try_parse_from(["mailsift", "review"]).unwrap();
        assert!(matches!(cli.command, Command::Review { folder } if folder == "FollowUp"));

        let cli = Cli::try_parse_from(["mailsift", "cleanup", "--top", "5"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Cleanup { top: 5, apply: false, ref folder } if folder == "Inbox"
        ));
    }
}
