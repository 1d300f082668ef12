//! Crossterm terminal: screen setup/teardown, event source and key mapping.

use std::io::{self, Write};
use std::time::Duration;

use crossterm::cursor::Show;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{debug, instrument};

use crate::application::{terminates_session, Input, Session, SessionEvent};
use crate::infrastructure::process::ExitWatcher;
use crate::infrastructure::traits::{EventSource, View};
use crate::infrastructure::{ui, InfraError, InfraResult};

const TICK: Duration = Duration::from_millis(100);

type Backend = CrosstermBackend<Box<dyn Write>>;

/// Terminal modes switched on so far, switched off again in reverse order on
/// drop. Each mode is recorded before its escape sequence is sent so that a
/// half-applied switch is still undone.
struct ScreenGuard<W: Write> {
    out: W,
    raw_mode: bool,
    alternate_screen: bool,
    mouse: bool,
}

impl<W: Write> ScreenGuard<W> {
    fn new(out: W) -> Self {
        Self {
            out,
            raw_mode: false,
            alternate_screen: false,
            mouse: false,
        }
    }

    fn enable_raw_mode(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        self.raw_mode = true;
        Ok(())
    }

    fn enter_alternate_screen(&mut self) -> io::Result<()> {
        self.alternate_screen = true;
        execute!(self.out, EnterAlternateScreen)
    }

    fn capture_mouse(&mut self) -> io::Result<()> {
        self.mouse = true;
        execute!(self.out, EnableMouseCapture)
    }

    /// Undo every recorded mode. Idempotent; the first error is returned
    /// after all steps were attempted.
    fn restore(&mut self) -> io::Result<()> {
        let mut result = Ok(());
        if self.mouse {
            self.mouse = false;
            result = result.and(execute!(self.out, DisableMouseCapture));
        }
        if self.alternate_screen {
            self.alternate_screen = false;
            result = result.and(execute!(self.out, Show, LeaveAlternateScreen));
        }
        if self.raw_mode {
            self.raw_mode = false;
            result = result.and(disable_raw_mode());
        }
        result
    }
}

impl<W: Write> Drop for ScreenGuard<W> {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

/// Full-screen terminal UI. Restores the terminal when dropped.
pub struct TerminalUi {
    terminal: Terminal<Backend>,
    guard: ScreenGuard<Box<dyn Write>>,
}

impl TerminalUi {
    /// Switch to raw mode and the alternate screen.
    ///
    /// Drawing goes to the controlling terminal so that stdout keeps carrying
    /// only the tool's own output. A failure part way leaves the terminal as
    /// it was.
    #[instrument(level = "debug")]
    pub fn enter(mouse: bool) -> InfraResult<Self> {
        let mut guard = ScreenGuard::new(open_tty());
        guard
            .enable_raw_mode()
            .map_err(|e| InfraError::terminal("enable raw mode", e))?;
        guard
            .enter_alternate_screen()
            .map_err(|e| InfraError::terminal("enter alternate screen", e))?;
        if mouse {
            guard
                .capture_mouse()
                .map_err(|e| InfraError::terminal("enable mouse capture", e))?;
        }
        let terminal = Terminal::new(CrosstermBackend::new(open_tty()))
            .map_err(|e| InfraError::terminal("create terminal", e))?;
        Ok(Self { terminal, guard })
    }

    /// Leave the alternate screen and raw mode. Idempotent.
    pub fn restore(&mut self) -> io::Result<()> {
        self.guard.restore()?;
        debug!("terminal restored");
        Ok(())
    }
}

impl View for TerminalUi {
    fn draw(&mut self, session: &mut Session) -> io::Result<()> {
        self.terminal.draw(|frame| ui::render(frame, session))?;
        Ok(())
    }
}

#[cfg(unix)]
fn open_tty() -> Box<dyn Write> {
    use std::fs::OpenOptions;

    match OpenOptions::new().write(true).open("/dev/tty") {
        Ok(tty) => Box::new(tty),
        Err(e) => {
            debug!(error = %e, "no controlling terminal, drawing to stdout");
            Box::new(io::stdout())
        }
    }
}

#[cfg(not(unix))]
fn open_tty() -> Box<dyn Write> {
    Box::new(io::stdout())
}

/// Terminal input plus exit notifications from the driven process.
pub struct TerminalEvents<'a> {
    watcher: Option<&'a mut ExitWatcher>,
    prompt_pending: bool,
}

impl<'a> TerminalEvents<'a> {
    pub fn new(watcher: Option<&'a mut ExitWatcher>, prompt_pending: bool) -> Self {
        Self {
            watcher,
            prompt_pending,
        }
    }

    fn process_gone(&mut self) -> bool {
        let prompt_pending = self.prompt_pending;
        self.watcher
            .as_mut()
            .and_then(|watcher| watcher.poll())
            .is_some_and(|exit| terminates_session(exit.success, prompt_pending))
    }
}

impl EventSource for TerminalEvents<'_> {
    fn next_event(&mut self) -> io::Result<SessionEvent> {
        loop {
            if self.process_gone() {
                return Ok(SessionEvent::Terminate);
            }
            if !event::poll(TICK)? {
                continue;
            }
            match event::read()? {
                Event::Key(key) => {
                    if let Some(input) = map_key(key) {
                        return Ok(SessionEvent::Input(input));
                    }
                }
                Event::Mouse(mouse) => {
                    if let Some(input) = map_mouse(mouse) {
                        return Ok(SessionEvent::Input(input));
                    }
                }
                Event::Resize(..) => return Ok(SessionEvent::Resize),
                _ => {}
            }
        }
    }
}

/// Translate a key press. Releases and unbound keys yield `None`.
pub fn map_key(key: KeyEvent) -> Option<Input> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Input::Quit),
            _ => None,
        };
    }
    let input = match key.code {
        KeyCode::Up | KeyCode::Char('k') => Input::Up,
        KeyCode::Down | KeyCode::Char('j') => Input::Down,
        KeyCode::Left | KeyCode::Char('h') => Input::Left,
        KeyCode::Right | KeyCode::Char('l') => Input::Right,
        KeyCode::Tab => Input::Tab,
        KeyCode::BackTab => Input::BackTab,
        KeyCode::Home | KeyCode::Char('g') => Input::Home,
        KeyCode::End | KeyCode::Char('G') => Input::End,
        KeyCode::PageUp => Input::PageUp,
        KeyCode::PageDown => Input::PageDown,
        KeyCode::Enter | KeyCode::Char(' ') => Input::Enter,
        KeyCode::Esc => Input::Escape,
        KeyCode::Char('q') => Input::Quit,
        _ => return None,
    };
    Some(input)
}

pub fn map_mouse(mouse: MouseEvent) -> Option<Input> {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => Some(Input::Click { row: mouse.row }),
        MouseEventKind::ScrollUp => Some(Input::ScrollUp),
        MouseEventKind::ScrollDown => Some(Input::ScrollDown),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;
    use rstest::rstest;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[rstest]
    #[case(KeyCode::Up, Input::Up)]
    #[case(KeyCode::Char('j'), Input::Down)]
    #[case(KeyCode::Left, Input::Left)]
    #[case(KeyCode::Char('l'), Input::Right)]
    #[case(KeyCode::Enter, Input::Enter)]
    #[case(KeyCode::Char(' '), Input::Enter)]
    #[case(KeyCode::Esc, Input::Escape)]
    #[case(KeyCode::Char('q'), Input::Quit)]
    #[case(KeyCode::BackTab, Input::BackTab)]
    #[case(KeyCode::Char('G'), Input::End)]
    fn test_map_key(#[case] code: KeyCode, #[case] expected: Input) {
        assert_eq!(map_key(press(code, KeyModifiers::NONE)), Some(expected));
    }

    #[test]
    fn given_ctrl_c_when_mapping_then_quit() {
        assert_eq!(map_key(press(KeyCode::Char('c'), KeyModifiers::CONTROL)), Some(Input::Quit));
        assert_eq!(map_key(press(KeyCode::Char('x'), KeyModifiers::CONTROL)), None);
    }

    #[test]
    fn given_key_release_when_mapping_then_ignored() {
        let release = KeyEvent {
            code: KeyCode::Enter,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(map_key(release), None);
    }

    /// Terminal whose next `fail_flushes` flushes fail.
    #[derive(Default)]
    struct FlakyTty {
        written: Vec<u8>,
        fail_flushes: usize,
    }

    impl Write for FlakyTty {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            if self.fail_flushes > 0 {
                self.fail_flushes -= 1;
                return Err(io::Error::new(io::ErrorKind::Other, "tty gone"));
            }
            Ok(())
        }
    }

    fn written(tty: &FlakyTty) -> String {
        String::from_utf8_lossy(&tty.written).into_owned()
    }

    #[test]
    fn given_failed_screen_switch_when_guard_dropped_then_screen_is_left() {
        // Arrange
        let mut tty = FlakyTty {
            fail_flushes: 1,
            ..Default::default()
        };

        // Act
        {
            let mut guard = ScreenGuard::new(&mut tty);
            assert!(guard.enter_alternate_screen().is_err());
        }

        // Assert
        let out = written(&tty);
        assert!(out.contains("\u{1b}[?1049h"));
        assert!(out.ends_with("\u{1b}[?1049l"));
    }

    #[test]
    fn given_mouse_capture_when_restored_twice_then_undone_once() {
        // Arrange
        let mut tty = FlakyTty::default();
        let mut guard = ScreenGuard::new(&mut tty);
        guard.enter_alternate_screen().unwrap();
        guard.capture_mouse().unwrap();

        // Act
        guard.restore().unwrap();
        guard.restore().unwrap();
        drop(guard);

        // Assert
        let out = written(&tty);
        assert_eq!(out.matches("\u{1b}[?1000l").count(), 1);
        assert_eq!(out.matches("\u{1b}[?1049l").count(), 1);
    }

    #[test]
    fn given_nothing_enabled_when_dropped_then_writes_nothing() {
        let mut tty = FlakyTty::default();
        drop(ScreenGuard::new(&mut tty));
        assert!(tty.written.is_empty());
    }

    #[test]
    fn given_mouse_events_when_mapping_then_click_and_scroll() {
        let event = |kind| MouseEvent {
            kind,
            column: 4,
            row: 7,
            modifiers: KeyModifiers::NONE,
        };
        assert_eq!(map_mouse(event(MouseEventKind::Down(MouseButton::Left))), Some(Input::Click { row: 7 }));
        assert_eq!(map_mouse(event(MouseEventKind::ScrollDown)), Some(Input::ScrollDown));
        assert_eq!(map_mouse(event(MouseEventKind::Moved)), None);
    }
}
