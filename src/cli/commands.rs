//! Command dispatch: piped and driven modes.

use std::io::{self, BufRead, BufReader, IsTerminal, Write};

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use tracing::{debug, info, instrument, warn};

use crate::application::{interrupt_unanswered, EchoLines, Session, SessionEnd};
use crate::cli::args::Cli;
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::Settings;
use crate::domain::{BuildOutcome, TreeBuilder};
use crate::exitcode;
use crate::infrastructure::{ChildProcess, InfraError, Spawned, TerminalEvents, TerminalUi};

const PIPED_PROMPT_MESSAGE: &str = "Piping only works with `terraform plan | plant`. \
For apply or destroy run `plant terraform apply` or `plant terraform destroy`.";

/// Run plant according to the parsed arguments; returns the process exit code.
pub fn execute(cli: &Cli, settings: &Settings) -> CliResult<i32> {
    if let Some(shell) = cli.completions {
        print_completions(shell);
        return Ok(exitcode::OK);
    }
    if cli.config_template {
        output::info(&Settings::template());
        return Ok(exitcode::OK);
    }
    if cli.show_config {
        output::info(&settings.to_toml()?);
        return Ok(exitcode::OK);
    }

    let mouse = settings.mouse && !cli.no_mouse;
    let builder = TreeBuilder::new(settings.markers.classifier());
    if cli.is_driven() {
        run_driven(&cli.command, &builder, mouse)
    } else if io::stdin().is_terminal() {
        Err(CliError::InvalidArgs(
            "nothing to read: pipe a plan into plant or pass a command to run".to_string(),
        ))
    } else {
        run_piped(&builder, mouse)
    }
}

fn print_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}

/// `terraform plan | plant`: browse the plan, then pass the rest through.
#[instrument(level = "debug", skip_all)]
fn run_piped(builder: &TreeBuilder, mouse: bool) -> CliResult<i32> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut lines = EchoLines::new(stdin.lock(), stdout.lock());

    let outcome = build_or_reject(builder, &mut lines)?;
    warn_if_empty(&outcome);

    let end = {
        let mut ui = TerminalUi::enter(mouse)?;
        let mut events = TerminalEvents::new(None, false);
        let mut session = Session::new(outcome, Box::new(rand::thread_rng()));
        session.run(&mut events, &mut ui, &mut io::sink())?
    };
    debug!(?end, "session ended");

    lines
        .drain()
        .map_err(|e| InfraError::io("copy remaining input", e))?;
    Ok(exitcode::OK)
}

/// Build the tree from piped input. A prompt cannot be answered here: the
/// rest of the input is passed through before the usage error is returned.
fn build_or_reject<R: BufRead, W: Write>(
    builder: &TreeBuilder,
    lines: &mut EchoLines<R, W>,
) -> CliResult<BuildOutcome> {
    let outcome = builder.build(&mut *lines)?;
    if outcome.prompt.is_some() {
        lines
            .drain()
            .map_err(|e| InfraError::io("copy remaining input", e))?;
        return Err(CliError::Usage(PIPED_PROMPT_MESSAGE.to_string()));
    }
    Ok(outcome)
}

/// `plant terraform apply`: spawn the command and answer its prompt.
#[instrument(level = "debug", skip(builder))]
fn run_driven(command: &[String], builder: &TreeBuilder, mouse: bool) -> CliResult<i32> {
    let Spawned {
        mut process,
        stdout: child_stdout,
        mut watcher,
    } = ChildProcess::spawn(command)?;

    let stdout = io::stdout();
    let mut lines = EchoLines::new(BufReader::new(child_stdout), stdout.lock());

    let outcome = builder.build(&mut lines)?;
    let prompt_pending = outcome.prompt.is_some();
    warn_if_empty(&outcome);

    let end = {
        let mut ui = TerminalUi::enter(mouse)?;
        let mut events = TerminalEvents::new(Some(&mut watcher), prompt_pending);
        let mut session = Session::new(outcome, Box::new(rand::thread_rng()));
        let end = session.run(&mut events, &mut ui, &mut process)?;
        ui.restore()
            .map_err(|e| InfraError::terminal("restore terminal", e))?;
        end
    };
    debug!(?end, "session ended");

    let exited = watcher.poll().is_some();
    if interrupt_unanswered(end, &mut process, exited) {
        info!(command = process.command(), "interrupted unanswered command");
    }

    // the rest of the command's output, e.g. the apply progress
    lines
        .drain()
        .map_err(|e| InfraError::io("copy command output", e))?;

    let exit = watcher.wait();
    debug!(?exit, "command finished");
    Ok(exit_code_of(end, exit.success, exit.code))
}

fn warn_if_empty(outcome: &BuildOutcome) {
    if outcome.tree.is_empty() && outcome.prompt.is_none() {
        warn!("no plan found in input");
        output::warning("no terraform plan found in the input");
    }
}

/// Exit code of plant after driving a command.
fn exit_code_of(end: SessionEnd, success: bool, code: Option<i32>) -> i32 {
    if success {
        return exitcode::OK;
    }
    match (end, code) {
        (_, Some(code)) => code,
        // killed by the interrupt we sent
        (SessionEnd::Quit | SessionEnd::Terminated, None) => exitcode::INTERRUPTED,
        (SessionEnd::Answered(_), None) => exitcode::SOFTWARE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::Answer;
    use crate::util::testing::{APPLY, PLAN};
    use rstest::rstest;
    use std::io::Cursor;

    #[test]
    fn given_piped_prompt_when_building_then_passes_input_through_and_rejects() {
        // Arrange
        let mut lines = EchoLines::new(Cursor::new(APPLY), Vec::new());

        // Act
        let result = build_or_reject(&TreeBuilder::default(), &mut lines);

        // Assert
        let err = result.unwrap_err();
        assert!(matches!(err, CliError::Usage(_)));
        assert_eq!(err.exit_code(), exitcode::USAGE);
        let (_, echo) = lines.into_parts();
        let echo = String::from_utf8(echo).unwrap();
        assert_eq!(echo, APPLY);
        assert!(echo.ends_with("  Enter a value: "));
    }

    #[test]
    fn given_piped_plan_when_building_then_tree_is_returned() {
        let mut lines = EchoLines::new(Cursor::new(PLAN), Vec::new());

        let outcome = build_or_reject(&TreeBuilder::default(), &mut lines).unwrap();

        assert!(outcome.prompt.is_none());
        assert_eq!(outcome.tree.len(), 15);
    }

    #[rstest]
    #[case(SessionEnd::Answered(Answer::Yes), true, Some(0), exitcode::OK)]
    #[case(SessionEnd::Answered(Answer::No), false, Some(1), 1)]
    #[case(SessionEnd::Quit, false, None, exitcode::INTERRUPTED)]
    #[case(SessionEnd::Terminated, false, Some(3), 3)]
    #[case(SessionEnd::Answered(Answer::Yes), false, None, exitcode::SOFTWARE)]
    fn given_command_exit_when_mapping_then_plant_exit_code(
        #[case] end: SessionEnd,
        #[case] success: bool,
        #[case] code: Option<i32>,
        #[case] expected: i32,
    ) {
        assert_eq!(exit_code_of(end, success, code), expected);
    }
}
