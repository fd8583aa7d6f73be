//! User interaction seams for interactive workflows.
//!
//! # Responsibility
//! - Abstract modal OK/Cancel prompts and user notifications.
//! - Provide scripted/recording implementations for tests and batch runs.

use std::collections::VecDeque;

/// Answer to one OK/Cancel prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptResponse {
    /// OK pressed with the typed text (untrimmed).
    Ok(String),
    /// Cancel pressed or the prompt was dismissed.
    Cancel,
}

impl PromptResponse {
    pub fn ok(text: impl Into<String>) -> Self {
        Self::Ok(text.into())
    }
}

/// Free-text prompt with OK/Cancel buttons.
pub trait Prompter {
    fn prompt(&mut self, title: &str, message: &str) -> PromptResponse;
}

/// Non-blocking notifications shown to the user.
pub trait Notifier {
    /// Modal message requiring acknowledgement.
    fn alert(&mut self, message: &str);
    /// Transient message with a title and display duration.
    fn toast(&mut self, message: &str, title: &str, timeout_secs: u32);
}

/// Prompter answering from a queue; exhausted queues answer `Cancel`.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<PromptResponse>,
    asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I>(answers: I) -> Self
    where
        I: IntoIterator<Item = PromptResponse>,
    {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    /// Convenience constructor where every answer is `Ok`.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(PromptResponse::ok))
    }

    /// Titles of prompts shown so far, in order.
    pub fn asked(&self) -> &[String] {
        &self.asked
    }
}

impl Prompter for ScriptedPrompter {
    fn prompt(&mut self, title: &str, _message: &str) -> PromptResponse {
        self.asked.push(title.to_string());
        self.answers.pop_front().unwrap_or(PromptResponse::Cancel)
    }
}

/// One recorded toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub title: String,
    pub timeout_secs: u32,
}

/// Notifier that keeps every message for later inspection.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub alerts: Vec<String>,
    pub toasts: Vec<Toast>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Notifier for RecordingNotifier {
    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }

    fn toast(&mut self, message: &str, title: &str, timeout_secs: u32) {
        self.toasts.push(Toast {
            message: message.to_string(),
            title: title.to_string(),
            timeout_secs,
        });
    }
}
