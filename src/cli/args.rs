//! CLI argument definitions using clap

use clap::{ArgAction, Parser, ValueHint};
use clap_complete::Shell;

/// Collapsible tree view for terraform plan output.
///
/// Pipe a plan into it (`terraform plan | plant`) or let it drive the
/// command (`plant terraform apply`) and answer the confirmation prompt
/// from a dialog.
#[derive(Parser, Debug)]
#[command(name = "plant")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Debug output, repeat for more (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub debug: u8,

    /// Disable mouse support in the tree view
    #[arg(long)]
    pub no_mouse: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    pub show_config: bool,

    /// Print a commented configuration template and exit
    #[arg(long)]
    pub config_template: bool,

    /// Generate shell completions and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    pub completions: Option<Shell>,

    /// Command to drive, e.g. `terraform apply`; read stdin when omitted
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_hint = ValueHint::CommandWithArguments)]
    pub command: Vec<String>,
}

impl Cli {
    /// Whether plant spawns the command itself instead of reading stdin.
    pub fn is_driven(&self) -> bool {
        !self.command.is_empty()
    }
}
