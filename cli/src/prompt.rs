//! Terminal implementation of the operator input seam

use sharpseq_sequencer::{InputError, InputProvider};
use std::io::{BufRead, Write};

/// Prints each question on its own line and reads one answer line
pub struct PromptInput<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> PromptInput<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }
}

impl<R: BufRead, W: Write> InputProvider for PromptInput<R, W> {
    fn ask(&mut self, question: &str) -> Result<String, InputError> {
        writeln!(self.writer, "{}", question)
            .and_then(|_| self.writer.flush())
            .map_err(|e| InputError::Io(e.to_string()))?;

        let mut line = String::new();
        let read = self
            .reader
            .read_line(&mut line)
            .map_err(|e| InputError::Io(e.to_string()))?;
        if read == 0 {
            return Err(InputError::Closed(question.lines().next().unwrap_or_default().to_string()));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn notify(&mut self, message: &str) {
        if let Err(e) = writeln!(self.writer, "{}", message) {
            tracing::warn!("Failed to show message: {}", e);
        }
    }
}
