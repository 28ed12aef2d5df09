//! Confirmation prompts on the terminal.

use mailsift_core::{
    ClassificationResult, ConfirmationGate, Message, ReviewChoice, ReviewGate, Selection,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin};
use tokio::sync::Mutex;
use tracing::warn;

/// Reads answers from standard input.
pub struct StdinGate {
    input: Mutex<BufReader<Stdin>>,
}

impl Default for StdinGate {
    fn default() -> Self {
        Self {
            input: Mutex::new(BufReader::new(tokio::io::stdin())),
        }
    }
}

impl StdinGate {
    async fn ask(&self, prompt: &str) -> String {
        let mut stdout = tokio::io::stdout();
        // A failed prompt write still leaves the answer readable.
        let _ = stdout.write_all(prompt.as_bytes()).await;
        let _ = stdout.flush().await;

        let mut line = String::new();
        if let Err(e) = self.input.lock().await.read_line(&mut line).await {
            warn!(error = %e, "could not read answer");
        }
        line
    }
}

impl ConfirmationGate for StdinGate {
    async fn confirm_batch(&self, results: &[ClassificationResult]) -> Selection {
        println!();
        for (i, result) in results.iter().enumerate() {
            let category = result
                .category
                .as_deref()
                .map(|c| format!(" [{c}]"))
                .unwrap_or_default();
            println!(
                "{:>3}. {:<9}{category} {} | {}",
                i + 1,
                result.disposition,
                result.message.sender,
                result.message.subject
            );
            println!("     {}", first_line(&result.summary));
        }

        let answer = self
            .ask("Apply which? [all / none / 1,3,...]: ")
            .await;
        parse_selection(&answer, results.len())
    }

    async fn confirm_reply(&self, message: &Message, draft: &str) -> bool {
        println!("\nReply to {} ({}):\n\n{draft}\n", message.sender, message.subject);
        let answer = self.ask("Send this reply? [y/N]: ").await;
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }
}

impl ReviewGate for StdinGate {
    async fn choose(&self, message: &Message) -> ReviewChoice {
        println!(
            "\nFrom: {}\nSubject: {}\nDate: {}\n\n{}\n",
            message.sender, message.subject, message.date_display, message.body
        );
        let answer = self
            .ask("1) Reply  2) Delete  3) Archive  4) Skip: ")
            .await;
        parse_review_choice(&answer)
    }
}

/// Parses a review answer; anything unrecognised skips the message.
pub fn parse_review_choice(answer: &str) -> ReviewChoice {
    match answer.trim().to_lowercase().as_str() {
        "1" | "r" | "reply" => ReviewChoice::Reply,
        "2" | "d" | "delete" => ReviewChoice::Delete,
        "3" | "a" | "archive" => ReviewChoice::Archive,
        "4" | "s" | "skip" | "" => ReviewChoice::Skip,
        other => {
            warn!(answer = other, "unrecognised choice, skipping");
            ReviewChoice::Skip
        }
    }
}

fn first_line(text: &str) -> &str {
    text.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim()
}

/// Parses `all`, `none` or 1-based comma-separated indices into a
/// selection over `count` results.
pub fn parse_selection(answer: &str, count: usize) -> Selection {
    let answer = answer.trim().to_lowercase();
    match answer.as_str() {
        "all" | "a" => return Selection::All,
        "" | "none" | "n" => return Selection::None,
        _ => {}
    }

    let mut indices = Vec::new();
    for part in answer.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.parse::<usize>() {
            Ok(n) if (1..=count).contains(&n) => {
                if !indices.contains(&(n - 1)) {
                    indices.push(n - 1);
                }
            }
            _ => warn!(entry = part, "ignoring selection entry"),
        }
    }

    if indices.is_empty() {
        Selection::None
    } else {
        Selection::Some(indices)
    }
}
