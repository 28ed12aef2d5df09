//! In-memory collaborators shared by the unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::batch::{CancelToken, ConfirmationGate, ReviewChoice, ReviewGate, Selection};
use crate::classifier::{ClassificationResult, LlmClient, LlmError};
use crate::disposition::{
    RemoteDeleteError, RemoteDeleteOutcome, RemoteDeleter, ReplyDrafter, ReplyError,
};
use crate::reader::Message;
use crate::store::Folder;

/// Inbox message with a Message-ID derived from the filename.
pub fn message(file: &str, sender: &str, subject: &str) -> Message {
    Message {
        file: file.to_string(),
        folder: Folder::Inbox,
        sender: sender.to_string(),
        subject: subject.to_string(),
        body: String::new(),
        date: None,
        date_display: "Unknown Date".to_string(),
        message_id: Some(format!("<{file}@example.com>")),
    }
}

/// LLM answering from a script; fails once the script runs out.
#[derive(Default)]
pub struct ScriptedLlm {
    script: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
    cancel_on: Option<(usize, CancelToken)>,
}

impl ScriptedLlm {
    pub fn new<const N: usize>(responses: [&'static str; N]) -> Self {
        Self::with_results(responses.map(Ok))
    }

    pub fn with_results(results: impl IntoIterator<Item = Result<&'static str, &'static str>>) -> Self {
        Self {
            script: Mutex::new(
                results
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            prompts: Mutex::default(),
            cancel_on: None,
        }
    }

    /// Cancels `token` while answering the `call`-th prompt, counting from 1.
    pub fn cancel_on_call(mut self, call: usize, token: CancelToken) -> Self {
        self.cancel_on = Some((call, token));
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl LlmClient for ScriptedLlm {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let calls = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            prompts.len()
        };
        if let Some((call, token)) = &self.cancel_on
            && *call == calls
        {
            token.cancel();
        }
        match self.script.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(reason)) => Err(LlmError::Malformed(reason)),
            None => Err(LlmError::Malformed("script exhausted".to_string())),
        }
    }
}

#[derive(Clone, Copy)]
enum RemoteBehaviour {
    Deleting,
    NotFound,
    Failing,
}

/// Remote deleter with a fixed answer that records requested ids.
pub struct MockRemote {
    behaviour: RemoteBehaviour,
    requested: Mutex<Vec<String>>,
}

impl MockRemote {
    fn with(behaviour: RemoteBehaviour) -> Self {
        Self {
            behaviour,
            requested: Mutex::default(),
        }
    }

    pub fn deleting() -> Self {
        Self::with(RemoteBehaviour::Deleting)
    }

    pub fn not_found() -> Self {
        Self::with(RemoteBehaviour::NotFound)
    }

    pub fn failing() -> Self {
        Self::with(RemoteBehaviour::Failing)
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requested.lock().unwrap().len()
    }
}

impl RemoteDeleter for MockRemote {
    async fn delete(&self, message_id: &str) -> Result<RemoteDeleteOutcome, RemoteDeleteError> {
        self.requested.lock().unwrap().push(message_id.to_string());
        match self.behaviour {
            RemoteBehaviour::Deleting => Ok(RemoteDeleteOutcome::Deleted),
            RemoteBehaviour::NotFound => Ok(RemoteDeleteOutcome::NotFound),
            RemoteBehaviour::Failing => Err(RemoteDeleteError::NotConfigured),
        }
    }
}

/// Reply collaborator that counts drafts and sends without side effects.
#[derive(Default)]
pub struct MockReplier {
    drafted: AtomicUsize,
    sent: AtomicUsize,
}

impl MockReplier {
    pub fn drafted(&self) -> usize {
        self.drafted.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }
}

impl ReplyDrafter for MockReplier {
    async fn draft(&self, message: &Message) -> Result<String, ReplyError> {
        self.drafted.fetch_add(1, Ordering::SeqCst);
        Ok(format!("Re: {}", message.subject))
    }

    async fn save_draft(&self, message: &Message, _reply: &str) -> Result<PathBuf, ReplyError> {
        Ok(PathBuf::from(format!("reply_{}.txt", message.file)))
    }

    async fn send(&self, _message: &Message, _reply: &str) -> Result<(), ReplyError> {
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Gate answering batches with a fixed selection and reviews from a script.
/// Once the script runs out every review choice is Skip.
pub struct ScriptedGate {
    selection: Selection,
    choices: Mutex<VecDeque<ReviewChoice>>,
    send_replies: bool,
}

impl ScriptedGate {
    pub fn new(selection: Selection) -> Self {
        Self {
            selection,
            choices: Mutex::default(),
            send_replies: false,
        }
    }

    pub fn with_choices(self, choices: impl IntoIterator<Item = ReviewChoice>) -> Self {
        Self {
            choices: Mutex::new(choices.into_iter().collect()),
            ..self
        }
    }

    pub fn sending_replies(self) -> Self {
        Self {
            send_replies: true,
            ..self
        }
    }
}

impl ConfirmationGate for ScriptedGate {
    async fn confirm_batch(&self, _results: &[ClassificationResult]) -> Selection {
        self.selection.clone()
    }

    async fn confirm_reply(&self, _message: &Message, _draft: &str) -> bool {
        self.send_replies
    }
}

impl ReviewGate for ScriptedGate {
    async fn choose(&self, _message: &Message) -> ReviewChoice {
        self.choices
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ReviewChoice::Skip)
    }
}
