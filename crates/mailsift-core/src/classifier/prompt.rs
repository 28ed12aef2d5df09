//! Prompt text for the two classifier exchanges and reply drafting.

use crate::reader::Message;

/// Asks for a summary of the message. No decision is requested here.
#[must_use]
pub fn summary_prompt(message: &Message) -> String {
    format!(
        "You are an email assistant. Summarize the email below in at most five sentences.\n\
         Include any requests, deadlines or important context, and highlight any \
         actions, tasks or urgent items it mentions.\n\
         Do not recommend how the email should be handled.\n\n\
         EMAIL DETAILS:\n\
         From: {}\n\
         Subject: {}\n\
         Date: {}\n\n\
         {}",
        message.sender, message.subject, message.date_display, message.body
    )
}

/// Asks for a decision based on a summary.
#[must_use]
pub fn decide_prompt(summary: &str) -> String {
    format!(
        "Read the email summary below and decide how the email should be handled.\n\
         Give a one-sentence justification, then end with exactly one line of the form\n\
         ACTION: <TOKEN>\n\
         where TOKEN is one of:\n\
         DELETE - the email is spam, of little importance, or can be ignored\n\
         REPLY - the email directly requires a response\n\
         REVIEW - the email needs attention but no reply\n\
         ARCHIVE - the email is informational, or you are unsure\n\n\
         Optionally add a line CATEGORY: <one word> naming a folder for the email.\n\
         If you choose DELETE for an obvious bulk sender, you may add a line suggesting \
         a filter rule, for example:\n\
         RULE: If sender contains \"example-spam.com\" or subject contains \"free money\", then flag as spam.\n\n\
         Summary:\n\
         {summary}"
    )
}

/// Asks for a reply draft.
#[must_use]
pub fn reply_prompt(message: &Message) -> String {
    format!(
        "Compose a draft response to the following email:\n\n\
         From: {}\n\
         Subject: {}\n\n\
         {}\n\n\
         Please provide a clear and professional response.",
        message.sender, message.subject, message.body
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Folder;

    fn message() -> Message {
        Message {
            file: "m".to_string(),
            folder: Folder::Inbox,
            sender: "ops@example.com".to_string(),
            subject: "Outage tonight".to_string(),
            body: "Servers go down at 22:00.".to_string(),
            date: None,
            date_display: "2024-03-05 09:15:00".to_string(),
            message_id: None,
        }
    }

    #[test]
    fn test_summary_prompt_embeds_message_but_no_action() {
        let prompt = summary_prompt(&message());
        assert!(prompt.contains("From: ops@example.com\nSubject: Outage tonight\nDate: 2024-03-05 09:15:00"));
        assert!(prompt.ends_with("Servers go down at 22:00."));
        assert!(!prompt.contains("ACTION:"));
    }

    #[test]
    fn test_decide_prompt_embeds_summary() {
        let prompt = decide_prompt("A planned outage.");
        assert!(prompt.contains("ACTION: <TOKEN>"));
        assert!(prompt.ends_with("Summary:\nA planned outage."));
    }

    #[test]
    fn test_reply_prompt() {
        let prompt = reply_prompt(&message());
        assert!(prompt.starts_with("Compose a draft response to the following email:\n\nFrom: ops@example.com"));
    }
}
