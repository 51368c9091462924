//! Session state for one chat interaction and the transition function that
//! drives it. Every user event and every submission completion goes through
//! [`Session::apply`], which mutates the state in one step and returns the
//! side effect the shell has to run.

use crate::conversation::{ChatMessage, Conversation};
use crate::service::SelectedFile;

pub const MISSING_FILE_WARNING: &str = "Please select a document first.";
pub const UPLOAD_FAILED_NOTICE: &str = "Upload failed. Check the log for details.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Warning,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    fn warning(text: &str) -> Self {
        Notice { level: NoticeLevel::Warning, text: text.to_string() }
    }

    fn failure(text: &str) -> Self {
        Notice { level: NoticeLevel::Failure, text: text.to_string() }
    }
}

/// How the most recent submission ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// No document was selected; nothing was sent.
    Aborted,
    Fulfilled,
    Failed,
    /// A reset happened while the request was in flight.
    Superseded,
}

/// Everything the shell needs to run one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRequest {
    pub generation: u64,
    pub file: SelectedFile,
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// The service answered. `None` when the body carried no answer.
    Answered(Option<String>),
    /// Transport, status or decoding failure. Detail for the log only.
    Failed(String),
    /// The request was cancelled before it resolved.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SetFile(Option<SelectedFile>),
    SetPrompt(String),
    /// The "Send" button or Enter in the prompt field.
    Send,
    /// Upload the document with the current prompt, without logging a user
    /// message.
    Upload,
    Completed {
        generation: u64,
        outcome: SubmissionOutcome,
    },
    Reset,
    DismissNotice,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    Submit(SubmissionRequest),
    /// Cancel the request of the given generation.
    Cancel(u64),
}

#[derive(Debug, Default)]
pub struct Session {
    selected_file: Option<SelectedFile>,
    prompt: String,
    conversation: Conversation,
    busy: bool,
    generation: u64,
    notice: Option<Notice>,
    last_resolution: Option<Resolution>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected_file.as_ref()
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn last_resolution(&self) -> Option<Resolution> {
        self.last_resolution
    }

    pub fn apply(&mut self, action: Action) -> Effect {
        match action {
            Action::SetFile(file) => {
                self.set_file(file);
                Effect::None
            }
            Action::SetPrompt(text) => {
                self.set_prompt(text);
                Effect::None
            }
            Action::Send => self.send(),
            Action::Upload => self.submit(self.selected_file.clone(), self.prompt.clone()),
            Action::Completed { generation, outcome } => {
                self.complete(generation, outcome);
                Effect::None
            }
            Action::Reset => self.reset(),
            Action::DismissNotice => {
                self.notice = None;
                Effect::None
            }
        }
    }

    pub fn set_file(&mut self, file: Option<SelectedFile>) {
        self.selected_file = file;
    }

    pub fn set_prompt(&mut self, text: String) {
        self.prompt = text;
    }

    /// Logs the draft as a user message, clears the draft, then submits with
    /// the cleared prompt. The service therefore never sees the question
    /// typed into the field; callers relying on the prompt should use
    /// [`Action::Upload`].
    fn send(&mut self) -> Effect {
        if self.busy || self.prompt.trim().is_empty() {
            return Effect::None;
        }

        let text = std::mem::take(&mut self.prompt);
        self.conversation.push(ChatMessage::user(text));

        self.submit(self.selected_file.clone(), self.prompt.clone())
    }

    /// Validates and starts a submission using only the values passed in.
    pub fn submit(&mut self, file: Option<SelectedFile>, prompt: String) -> Effect {
        if self.busy {
            tracing::debug!("submission ignored, another one is in flight");
            return Effect::None;
        }

        let Some(file) = file else {
            tracing::warn!("submission aborted: no document selected");
            self.notice = Some(Notice::warning(MISSING_FILE_WARNING));
            self.conversation.clear();
            self.last_resolution = Some(Resolution::Aborted);
            return Effect::None;
        };

        self.busy = true;
        self.notice = None;
        tracing::info!(
            generation = self.generation,
            file = %file.file_name,
            "submitting document"
        );

        Effect::Submit(SubmissionRequest {
            generation: self.generation,
            file,
            prompt,
        })
    }

    fn complete(&mut self, generation: u64, outcome: SubmissionOutcome) {
        if generation != self.generation {
            tracing::debug!(
                generation,
                current = self.generation,
                "discarding result of a superseded submission"
            );
            return;
        }

        match outcome {
            SubmissionOutcome::Answered(text) => {
                if text.is_none() {
                    tracing::warn!("response carried no answer field");
                }
                self.conversation.push(ChatMessage::assistant(text.unwrap_or_default()));
                self.last_resolution = Some(Resolution::Fulfilled);
            }
            SubmissionOutcome::Failed(detail) => {
                tracing::debug!(%detail, "upload failed, showing notice");
                self.notice = Some(Notice::failure(UPLOAD_FAILED_NOTICE));
                self.last_resolution = Some(Resolution::Failed);
            }
            SubmissionOutcome::Cancelled => {
                self.last_resolution = Some(Resolution::Superseded);
            }
        }

        self.busy = false;
    }

    pub fn reset(&mut self) -> Effect {
        let effect = if self.busy {
            self.last_resolution = Some(Resolution::Superseded);
            Effect::Cancel(self.generation)
        } else {
            Effect::None
        };

        self.selected_file = None;
        self.prompt.clear();
        self.conversation.clear();
        self.busy = false;
        self.notice = None;
        self.generation += 1;

        effect
    }
}
