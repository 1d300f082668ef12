//! Confirmation dialog for the tool's yes/no prompt.
//!
//! The answer buttons are shuffled every time the dialog opens so that the
//! confirming button is not always in the same place.

use std::io::{self, Write};

use rand::seq::SliceRandom;
use rand::Rng;

/// Answer written to the driven process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
}

impl Answer {
    /// Literal text the tool expects on its stdin.
    pub fn label(self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
        }
    }
}

/// Button row: the first button is always "no", "yes" lands on one of the
/// remaining three positions.
pub fn dialog_buttons<R: Rng + ?Sized>(rng: &mut R) -> Vec<Answer> {
    let mut buttons = vec![Answer::No, Answer::No, Answer::No, Answer::Yes];
    buttons[1..].shuffle(rng);
    buttons
}

/// Write the chosen answer, newline terminated.
pub fn send_answer<W: Write + ?Sized>(sink: &mut W, answer: Answer) -> io::Result<()> {
    writeln!(sink, "{}", answer.label())?;
    sink.flush()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmDialog {
    prompt: String,
    buttons: Vec<Answer>,
    focused: usize,
}

impl ConfirmDialog {
    pub fn new<R: Rng + ?Sized>(prompt: impl Into<String>, rng: &mut R) -> Self {
        Self {
            prompt: prompt.into(),
            buttons: dialog_buttons(rng),
            focused: 0,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn buttons(&self) -> &[Answer] {
        &self.buttons
    }

    pub fn focused(&self) -> usize {
        self.focused
    }

    /// Focus the next button, wrapping around.
    pub fn next(&mut self) {
        self.focused = (self.focused + 1) % self.buttons.len();
    }

    /// Focus the previous button, wrapping around.
    pub fn previous(&mut self) {
        self.focused = (self.focused + self.buttons.len() - 1) % self.buttons.len();
    }

    pub fn focus_button(&mut self, index: usize) {
        if index < self.buttons.len() {
            self.focused = index;
        }
    }

    pub fn choose(&self) -> Answer {
        self.buttons[self.focused]
    }
}
