//! Operator input seam
//!
//! The generator never reads a terminal directly. It asks questions through
//! [`InputProvider`], which the binary implements over stdin and tests
//! implement with [`ScriptedInput`].

use crate::error::InputError;
use std::collections::VecDeque;

/// Line-oriented question/answer channel to the operator
pub trait InputProvider {
    /// Ask `question` and return the answer line without its line terminator.
    /// Returns [`InputError::Closed`] when no more input will arrive.
    fn ask(&mut self, question: &str) -> Result<String, InputError>;

    /// Show an informational message (lookup misses, rejected values)
    fn notify(&mut self, message: &str);

    /// Yes/no question; anything but `y`/`yes` counts as no
    fn ask_yes_no(&mut self, question: &str) -> Result<bool, InputError> {
        let answer = self.ask(question)?;
        let answer = answer.trim();
        Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
    }

    /// Free text, trimmed
    fn ask_text(&mut self, question: &str) -> Result<String, InputError> {
        Ok(self.ask(question)?.trim().to_string())
    }

    /// Ask until `parse` accepts the answer
    fn ask_parsed<T, F>(&mut self, question: &str, parse: F) -> Result<T, InputError>
    where
        Self: Sized,
        F: Fn(&str) -> Result<T, String>,
    {
        loop {
            let answer = self.ask(question)?;
            match parse(&answer) {
                Ok(value) => return Ok(value),
                Err(reason) => {
                    tracing::debug!("Rejected answer {:?}: {}", answer, reason);
                    self.notify(&format!("{}. Please try again.", reason));
                }
            }
        }
    }

    /// Numbered menu; returns the chosen option's value
    fn ask_menu<T>(&mut self, title: &str, options: &[(&str, T)]) -> Result<T, InputError>
    where
        Self: Sized,
        T: Clone,
    {
        let mut question = title.to_string();
        for (index, (label, _)) in options.iter().enumerate() {
            question.push_str(&format!("\n[{}] = {}", index + 1, label));
        }
        let count = options.len();
        let index = self.ask_parsed(&question, |answer| {
            let choice: usize = answer
                .trim()
                .parse()
                .map_err(|_| format!("'{}' is not a menu number", answer.trim()))?;
            if choice == 0 || choice > count {
                return Err(format!("Choose a number from 1 to {}", count));
            }
            Ok(choice - 1)
        })?;
        Ok(options[index].1.clone())
    }
}

/// Pre-recorded answers, for tests and non-interactive runs
#[derive(Debug, Default)]
pub struct ScriptedInput {
    answers: VecDeque<String>,
    /// Every question asked, in order
    pub questions: Vec<String>,
    /// Every message shown, in order
    pub notices: Vec<String>,
}

impl ScriptedInput {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            questions: Vec::new(),
            notices: Vec::new(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl InputProvider for ScriptedInput {
    fn ask(&mut self, question: &str) -> Result<String, InputError> {
        self.questions.push(question.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| InputError::Closed(question.lines().next().unwrap_or_default().to_string()))
    }

    fn notify(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}
