//! Domain layer: plan tree model and parser
//!
//! This layer is independent of external concerns (no terminal, no process).

pub mod arena;
pub mod builder;
pub mod classifier;
pub mod entities;
pub mod error;
pub mod label;

pub use arena::{NodeData, NodeKind, PlanTree, TreeNode, ROOT_LABEL};
pub use builder::{BuildOutcome, TreeBuilder};
pub use classifier::Classifier;
pub use entities::{strip_ansi, Line};
pub use error::{DomainError, DomainResult};
pub use label::{collapsed_text, expanded_text, Bracket, Expansion, Label};
