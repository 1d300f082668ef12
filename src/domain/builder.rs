//! Tree builder turning a stream of plan lines into a [`PlanTree`].

use std::io;

use generational_arena::Index;
use tracing::{debug, instrument, trace};

use crate::domain::arena::{NodeData, NodeKind, PlanTree};
use crate::domain::classifier::Classifier;
use crate::domain::entities::Line;
use crate::domain::error::DomainResult;
use crate::domain::label::{Bracket, Label};

/// Result of a single builder pass.
#[derive(Debug)]
pub struct BuildOutcome {
    pub tree: PlanTree,
    /// Confirmation question the tool is blocked on, if the stream stopped there.
    pub prompt: Option<String>,
    /// Blocks still open when the pass ended. Zero for well-nested input.
    pub open_blocks: usize,
}

/// Single-pass, stack-based plan parser.
#[derive(Debug, Clone, Default)]
pub struct TreeBuilder {
    classifier: Classifier,
}

impl TreeBuilder {
    pub fn new(classifier: Classifier) -> Self {
        Self { classifier }
    }

    /// Consume `lines` until end of stream or until a prompt line.
    ///
    /// Lines up to and including the region-start marker are skipped. The
    /// prompt line yields no node; reading stops right after it so the rest
    /// of the stream stays with the caller. Read failures are propagated.
    #[instrument(level = "debug", skip_all)]
    pub fn build<I>(&self, lines: I) -> DomainResult<BuildOutcome>
    where
        I: IntoIterator<Item = io::Result<Line>>,
    {
        let mut tree = PlanTree::new();
        let mut stack: Vec<Index> = vec![tree.root()];
        let mut started = false;

        for line in lines {
            let line = line?;
            if !started {
                if self.classifier.is_region_start(&line.raw) {
                    debug!(marker = %line.raw, "plan region started");
                    started = true;
                }
                continue;
            }

            if self.classifier.is_prompt(&line.raw) {
                debug!(prompt = %line.raw, nodes = tree.len(), "stopped at prompt");
                return Ok(BuildOutcome {
                    tree,
                    prompt: Some(line.raw),
                    open_blocks: stack.len() - 1,
                });
            }

            // stack always holds at least the root
            let parent = stack[stack.len() - 1];
            let opener = self.classifier.is_opener(&line.raw);
            let closer = self.classifier.is_closer(&line.raw);
            trace!(opener, closer, line = %line.raw);

            let data = match Bracket::trailing(&line.raw).filter(|_| opener) {
                Some(bracket) => NodeData {
                    label: Label::block(line.decorated, bracket),
                    kind: NodeKind::Opener,
                },
                None => NodeData {
                    label: Label::plain(line.decorated),
                    kind: NodeKind::Content,
                },
            };
            let node = tree.append(parent, data);

            if opener {
                stack.push(node);
            }
            if closer && stack.len() > 1 {
                stack.pop();
            }
        }

        debug!(nodes = tree.len(), open = stack.len() - 1, "plan stream ended");
        Ok(BuildOutcome {
            tree,
            prompt: None,
            open_blocks: stack.len() - 1,
        })
    }
}
