//! Interactive session over a parsed plan.
//!
//! One event is handled at a time; the tree is only mutated from here. The
//! session ends when the prompt is answered, when the user quits, or when the
//! event source reports that the driven process went away.

use std::io::{self, Write};

use generational_arena::Index;
use rand::RngCore;
use tracing::{debug, info, instrument, warn};

use crate::application::confirm::{send_answer, Answer, ConfirmDialog};
use crate::application::navigator::{Activation, Navigator};
use crate::application::{ApplicationResult, IoResultExt};
use crate::domain::{BuildOutcome, Label, NodeData, NodeKind, PlanTree};
use crate::infrastructure::traits::{DrivenProcess, EventSource, View};

/// User input, independent of the terminal backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Up,
    Down,
    Left,
    Right,
    Tab,
    BackTab,
    Home,
    End,
    PageUp,
    PageDown,
    Enter,
    Escape,
    Quit,
    /// Mouse click at a screen row.
    Click { row: u16 },
    ScrollUp,
    ScrollDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Input(Input),
    /// Screen size changed; only a redraw is needed.
    Resize,
    /// The driven process is gone; stop without answering.
    Terminate,
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Answered(Answer),
    Quit,
    Terminated,
}

/// Whether an exit of the driven process should end the session.
///
/// A failed process always does; a successful one only while a prompt is
/// pending, since nobody is left to answer it.
pub fn terminates_session(success: bool, prompt_pending: bool) -> bool {
    !success || prompt_pending
}

#[derive(Debug)]
pub enum Mode {
    Browse,
    Confirm(ConfirmDialog),
}

/// Rows of the tree currently on screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    /// Screen row of the first tree line.
    pub top: u16,
    pub height: usize,
    /// Index of the first displayed row within the visible nodes.
    pub offset: usize,
}

impl Viewport {
    pub fn resize(&mut self, top: u16, height: usize) {
        self.top = top;
        self.height = height;
    }

    /// Adjust the offset so that `row` is on screen.
    pub fn scroll_to(&mut self, row: usize) {
        if row < self.offset {
            self.offset = row;
        } else if self.height > 0 && row >= self.offset + self.height {
            self.offset = row + 1 - self.height;
        }
    }

    /// Visible-node row displayed at screen row `y`.
    pub fn row_at(&self, y: u16) -> Option<usize> {
        let rel = usize::from(y.checked_sub(self.top)?);
        (rel < self.height).then_some(self.offset + rel)
    }
}

pub struct Session {
    tree: PlanTree,
    navigator: Navigator,
    prompt: Option<String>,
    mode: Mode,
    viewport: Viewport,
    rng: Box<dyn RngCore>,
}

impl Session {
    /// Start a session on a parsed plan. If the builder stopped at a prompt,
    /// a selectable prompt node is appended to the top level.
    pub fn new(outcome: BuildOutcome, rng: Box<dyn RngCore>) -> Self {
        let BuildOutcome { mut tree, prompt, .. } = outcome;
        let navigator = Navigator::new(&tree);
        if let Some(prompt) = &prompt {
            let root = tree.root();
            tree.append(
                root,
                NodeData {
                    label: Label::plain(prompt.clone()),
                    kind: NodeKind::Prompt,
                },
            );
        }
        Self {
            tree,
            navigator,
            prompt,
            mode: Mode::Browse,
            viewport: Viewport::default(),
            rng,
        }
    }

    pub fn tree(&self) -> &PlanTree {
        &self.tree
    }

    pub fn focus(&self) -> Option<Index> {
        self.navigator.focus()
    }

    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref()
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    /// Position of the focused node among the visible nodes.
    pub fn focus_row(&self) -> Option<usize> {
        let focus = self.navigator.focus()?;
        self.tree.visible().position(|(idx, _)| idx == focus)
    }

    /// Apply one input. Returns how the session ended, if it did.
    pub fn handle(&mut self, input: Input) -> Option<SessionEnd> {
        if matches!(self.mode, Mode::Confirm(_)) {
            return self.handle_dialog(input);
        }
        let page = self.viewport.height.max(1) as isize;
        match input {
            Input::Up | Input::ScrollUp => self.navigator.move_by(&self.tree, -1),
            Input::Down | Input::ScrollDown => self.navigator.move_by(&self.tree, 1),
            Input::PageUp => self.navigator.move_by(&self.tree, -page),
            Input::PageDown => self.navigator.move_by(&self.tree, page),
            Input::Home => self.navigator.move_first(&self.tree),
            Input::End => self.navigator.move_last(&self.tree),
            Input::Right => self.navigator.expand_or_descend(&mut self.tree),
            Input::Left => self.navigator.collapse_or_ascend(&mut self.tree),
            Input::Enter => self.activate(),
            Input::Click { row } => {
                let target = self
                    .viewport
                    .row_at(row)
                    .and_then(|r| self.tree.visible().nth(r).map(|(idx, _)| idx));
                if let Some(idx) = target {
                    if self.navigator.focus_on(&self.tree, idx) {
                        self.activate();
                    }
                }
            }
            Input::Quit => return Some(SessionEnd::Quit),
            Input::Tab | Input::BackTab | Input::Escape => {}
        }
        None
    }

    fn activate(&mut self) {
        if self.navigator.activate(&mut self.tree) == Activation::Prompt {
            if let Some(prompt) = &self.prompt {
                debug!("opening confirmation dialog");
                self.mode = Mode::Confirm(ConfirmDialog::new(prompt.clone(), self.rng.as_mut()));
            }
        }
    }

    fn handle_dialog(&mut self, input: Input) -> Option<SessionEnd> {
        let Mode::Confirm(dialog) = &mut self.mode else {
            return None;
        };
        match input {
            Input::Right | Input::Down | Input::Tab => dialog.next(),
            Input::Left | Input::Up | Input::BackTab => dialog.previous(),
            Input::Enter => return Some(SessionEnd::Answered(dialog.choose())),
            Input::Escape => {
                debug!("confirmation dialog cancelled");
                self.mode = Mode::Browse;
            }
            Input::Quit => return Some(SessionEnd::Quit),
            _ => {}
        }
        None
    }

    /// Drive the session until it ends.
    ///
    /// The chosen answer is written to `answers` exactly once. A process that
    /// already exited (broken pipe) is not an error.
    #[instrument(level = "debug", skip_all)]
    pub fn run<E, V, W>(&mut self, events: &mut E, view: &mut V, answers: &mut W) -> ApplicationResult<SessionEnd>
    where
        E: EventSource + ?Sized,
        V: View + ?Sized,
        W: Write + ?Sized,
    {
        loop {
            view.draw(self).with_context("draw plan tree")?;
            let input = match events.next_event().with_context("read terminal input")? {
                SessionEvent::Input(input) => input,
                SessionEvent::Resize => continue,
                SessionEvent::Terminate => {
                    info!("driven process exited, ending session");
                    return Ok(SessionEnd::Terminated);
                }
            };
            let Some(end) = self.handle(input) else {
                continue;
            };
            if let SessionEnd::Answered(answer) = end {
                deliver(answers, answer)?;
            }
            return Ok(end);
        }
    }
}

/// Interrupt the driven process if the session ended without an answer.
///
/// Skipped when the process is already known to have exited. Returns whether
/// an interrupt was sent; a failed signal is logged, not raised.
pub fn interrupt_unanswered<P: DrivenProcess + ?Sized>(end: SessionEnd, process: &mut P, exited: bool) -> bool {
    if matches!(end, SessionEnd::Answered(_)) || exited {
        return false;
    }
    match process.interrupt() {
        Ok(()) => {
            info!(?end, "interrupted driven process");
            true
        }
        Err(e) => {
            warn!(error = %e, "failed to interrupt driven process");
            false
        }
    }
}

fn deliver<W: Write + ?Sized>(answers: &mut W, answer: Answer) -> ApplicationResult<()> {
    match send_answer(answers, answer) {
        Ok(()) => {
            info!(answer = answer.label(), "answer sent");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            warn!(answer = answer.label(), "process exited before the answer was sent");
            Ok(())
        }
        Err(e) => Err(e).with_context("send answer"),
    }
}
