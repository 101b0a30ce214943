use crate::action::ConfirmationCallback;
use crate::error::ErrorCallback;

/// Answers every delete prompt the same way and keeps what it was told.
/// Until a prompt is refused the session may continue.
#[derive(Debug, Default, Clone)]
pub struct StaticConfirmation {
    answer: bool,
    refused: bool,
    pre_delete: Vec<String>,
    post_delete: Vec<String>,
}

impl StaticConfirmation {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            ..Self::default()
        }
    }

    pub fn pre_delete_messages(&self) -> &[String] {
        &self.pre_delete
    }

    pub fn post_delete_messages(&self) -> &[String] {
        &self.post_delete
    }
}

impl ConfirmationCallback for StaticConfirmation {
    fn pre_delete(&mut self, msg: &str) {
        self.pre_delete.push(msg.to_string());
        self.refused |= !self.answer;
    }

    fn post_delete(&mut self, msg: &str) {
        self.post_delete.push(msg.to_string());
    }

    fn can_continue(&self) -> bool {
        !self.refused
    }
}

/// Asks a closure about each pending delete. The answer to the latest
/// prompt is what `can_continue` reports.
pub struct FnConfirmation<F> {
    ask: F,
    answer: bool,
}

impl<F> FnConfirmation<F> {
    pub fn new(ask: F) -> Self {
        Self { ask, answer: true }
    }
}

impl<F> ConfirmationCallback for FnConfirmation<F>
where
    F: FnMut(&str) -> bool,
{
    fn pre_delete(&mut self, msg: &str) {
        self.answer = (self.ask)(msg);
    }

    fn post_delete(&mut self, _msg: &str) {}

    fn can_continue(&self) -> bool {
        self.answer
    }
}

pub struct FnErrorCallback<F> {
    sink: F,
}

impl<F> FnErrorCallback<F> {
    pub fn new(sink: F) -> Self {
        Self { sink }
    }
}

impl<F> ErrorCallback for FnErrorCallback<F>
where
    F: FnMut(&str),
{
    fn log_message(&mut self, msg: &str) {
        (self.sink)(msg)
    }
}
