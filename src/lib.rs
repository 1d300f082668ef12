//! plant: collapsible tree view for terraform plan output.
//!
//! Layers, innermost first:
//! - [`domain`]: line classification, labels and the plan tree
//! - [`application`]: reading, navigation, confirmation and the session loop
//! - [`infrastructure`]: subprocess, terminal and rendering
//! - [`cli`]: argument parsing and command dispatch

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
