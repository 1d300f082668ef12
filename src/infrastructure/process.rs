//! Driven subprocess: spawning, answering, interrupting and exit watching.

use std::io::{self, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::infrastructure::traits::DrivenProcess;
use crate::infrastructure::{InfraError, InfraResult};

const REAP_TICK: Duration = Duration::from_millis(20);

/// How the driven process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exit {
    pub success: bool,
    /// Exit code, `None` if killed by a signal or if waiting failed.
    pub code: Option<i32>,
}

impl From<ExitStatus> for Exit {
    fn from(status: ExitStatus) -> Self {
        Self {
            success: status.success(),
            code: status.code(),
        }
    }
}

/// Background waiter on the driven process.
///
/// Its only output is the exit result; it never touches session state.
pub struct ExitWatcher {
    rx: Receiver<Exit>,
    handle: Option<JoinHandle<()>>,
    exit: Option<Exit>,
}

impl ExitWatcher {
    fn spawn(child: Arc<Mutex<Child>>) -> io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("exit-watcher".into())
            .spawn(move || {
                let exit = reap(&child);
                debug!(?exit, "driven process exited");
                // receiver gone means nobody cares anymore
                let _ = tx.send(exit);
            })?;
        Ok(Self {
            rx,
            handle: Some(handle),
            exit: None,
        })
    }

    /// Non-blocking check whether the process has exited.
    pub fn poll(&mut self) -> Option<Exit> {
        if self.exit.is_none() {
            match self.rx.try_recv() {
                Ok(exit) => self.exit = Some(exit),
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    self.exit = Some(Exit {
                        success: false,
                        code: None,
                    })
                }
            }
        }
        self.exit
    }

    /// Block until the process has exited.
    pub fn wait(&mut self) -> Exit {
        if let Some(exit) = self.exit {
            return exit;
        }
        let exit = self.rx.recv().unwrap_or(Exit {
            success: false,
            code: None,
        });
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        self.exit = Some(exit);
        exit
    }
}

/// Poll the child until it has exited. The lock is only held for one
/// `try_wait`, so an interrupt can get in between.
fn reap(child: &Mutex<Child>) -> Exit {
    loop {
        let status = lock(child).try_wait();
        match status {
            Ok(Some(status)) => return Exit::from(status),
            Ok(None) => thread::sleep(REAP_TICK),
            Err(e) => {
                warn!(error = %e, "waiting for driven process failed");
                return Exit {
                    success: false,
                    code: None,
                };
            }
        }
    }
}

fn lock(child: &Mutex<Child>) -> MutexGuard<'_, Child> {
    child.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle on the spawned command: its stdin and the child shared with the
/// exit watcher.
pub struct ChildProcess {
    command: String,
    child: Arc<Mutex<Child>>,
    stdin: Option<ChildStdin>,
    interrupted: bool,
}

/// Everything produced by spawning the driven command.
pub struct Spawned {
    pub process: ChildProcess,
    pub stdout: ChildStdout,
    pub watcher: ExitWatcher,
}

impl ChildProcess {
    /// Start `command` with piped stdin/stdout and inherited stderr.
    #[instrument(level = "debug")]
    pub fn spawn(command: &[String]) -> InfraResult<Spawned> {
        let display = command.join(" ");
        let spawn_err = |source: io::Error| InfraError::Spawn {
            command: display.clone(),
            source,
        };
        let (program, args) = command.split_first().ok_or_else(|| {
            spawn_err(io::Error::new(io::ErrorKind::InvalidInput, "empty command"))
        })?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(spawn_err)?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take().ok_or_else(|| {
            spawn_err(io::Error::new(io::ErrorKind::BrokenPipe, "stdout not captured"))
        })?;
        let command_line = display.as_str();
        debug!(pid = child.id(), command = %command_line, "spawned driven process");

        let child = Arc::new(Mutex::new(child));
        let watcher = ExitWatcher::spawn(Arc::clone(&child))
            .map_err(|e| InfraError::io("start exit watcher", e))?;

        Ok(Spawned {
            process: ChildProcess {
                command: display,
                child,
                stdin,
                interrupted: false,
            },
            stdout,
            watcher,
        })
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    fn stdin(&mut self) -> io::Result<&mut ChildStdin> {
        self.stdin
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "stdin closed"))
    }
}

impl Write for ChildProcess {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stdin()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stdin()?.flush()
    }
}

impl DrivenProcess for ChildProcess {
    fn interrupt(&mut self) -> io::Result<()> {
        if self.interrupted {
            return Ok(());
        }
        self.interrupted = true;
        // while the lock is held the watcher cannot reap, so the pid is still ours
        let mut child = lock(&self.child);
        if let Some(status) = child.try_wait()? {
            debug!(?status, "driven process already exited, not interrupting");
            return Ok(());
        }
        send_interrupt(child.id())
    }
}

#[cfg(unix)]
fn send_interrupt(pid: u32) -> io::Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    kill(Pid::from_raw(pid as i32), Signal::SIGINT).map_err(io::Error::from)
}

#[cfg(not(unix))]
fn send_interrupt(pid: u32) -> io::Result<()> {
    warn!(pid, "interrupting the driven process is not supported on this platform");
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::io::Read;

    fn command(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn given_empty_command_when_spawning_then_errors() {
        assert!(matches!(ChildProcess::spawn(&[]), Err(InfraError::Spawn { .. })));
    }

    #[test]
    fn given_missing_binary_when_spawning_then_spawn_error() {
        let result = ChildProcess::spawn(&command(&["plant-no-such-binary-xyz"]));
        assert!(matches!(result, Err(InfraError::Spawn { .. })));
    }

    #[test]
    fn given_echoing_process_when_answered_then_reads_answer_back() {
        // Arrange
        let Spawned {
            mut process,
            mut stdout,
            mut watcher,
        } = ChildProcess::spawn(&command(&["sh", "-c", "read answer; echo \"got $answer\""])).unwrap();

        // Act
        writeln!(process, "yes").unwrap();
        process.flush().unwrap();
        let mut output = String::new();
        stdout.read_to_string(&mut output).unwrap();
        let exit = watcher.wait();

        // Assert
        assert_eq!(output, "got yes\n");
        assert!(exit.success);
        assert_eq!(watcher.poll(), Some(exit));
    }

    #[test]
    fn given_failing_process_when_waiting_then_reports_exit_code() {
        let Spawned { mut watcher, .. } = ChildProcess::spawn(&command(&["sh", "-c", "exit 3"])).unwrap();
        let exit = watcher.wait();
        assert!(!exit.success);
        assert_eq!(exit.code, Some(3));
    }

    #[test]
    fn given_reaped_process_when_interrupted_then_no_signal_is_sent() {
        // Arrange
        let Spawned {
            mut process,
            mut watcher,
            ..
        } = ChildProcess::spawn(&command(&["sh", "-c", "exit 0"])).unwrap();
        let exit = watcher.wait();

        // Act
        let result = process.interrupt();

        // Assert
        assert!(exit.success);
        assert!(result.is_ok());
    }

    #[test]
    fn given_blocked_process_when_interrupted_then_exits_unsuccessfully() {
        let Spawned {
            mut process,
            mut watcher,
            ..
        } = ChildProcess::spawn(&command(&["sleep", "30"])).unwrap();

        process.interrupt().unwrap();
        process.interrupt().unwrap();
        let exit = watcher.wait();

        assert!(!exit.success);
        assert_eq!(exit.code, None);
    }
}
