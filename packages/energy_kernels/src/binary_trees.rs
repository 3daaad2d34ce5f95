#![allow(
    clippy::arithmetic_side_effects,
    reason = "node counts are bounded by the accepted depth range"
)]

use energy_harness::{ExecuteError, Payload, PrepareError};

use crate::{Error, Result};

const MIN_DEPTH: u32 = 4;

/// Deepest tree that is accepted. A tree of this depth has 2^25 - 1 nodes.
const MAX_DEPTH: u32 = 24;

/// A perfect binary tree allocated node by node on the heap.
#[derive(Debug)]
struct Node {
    children: Option<(Box<Node>, Box<Node>)>,
}

impl Node {
    fn build(depth: u32) -> Box<Self> {
        let children = (depth > 0).then(|| (Self::build(depth - 1), Self::build(depth - 1)));

        Box::new(Self { children })
    }

    /// Walks the tree and counts its nodes.
    fn check(&self) -> u64 {
        match &self.children {
            Some((left, right)) => 1 + left.check() + right.check(),
            None => 1,
        }
    }
}

/// Allocates, walks and frees many perfect binary trees.
///
/// One execution builds a stretch tree one level deeper than the maximum, a long-lived tree
/// of maximum depth that survives the whole execution and, for every even depth from 4 up to
/// the maximum, `2^(max - depth + 4)` short-lived trees. The result is the total number of
/// nodes checked.
#[derive(Debug)]
pub struct BinaryTrees {
    max_depth: u32,
}

impl BinaryTrees {
    /// Name of the kernel.
    pub const NAME: &str = "binary-trees";

    /// Default maximum tree depth.
    pub const DEFAULT_MAX_DEPTH: usize = 10;

    /// Creates the kernel for trees up to `max_depth` levels deep.
    ///
    /// Depths below 6 are raised to 6, so that there are always at least two short-lived
    /// tree depths.
    ///
    /// # Errors
    ///
    /// Fails if `max_depth` is above 24.
    pub fn new(max_depth: usize) -> Result<Self> {
        match u32::try_from(max_depth) {
            Ok(depth @ 0..=MAX_DEPTH) => Ok(Self {
                max_depth: depth.max(MIN_DEPTH + 2),
            }),
            _ => Err(Error::invalid_size(
                Self::NAME,
                "max depth",
                format!("must be at most {MAX_DEPTH}, was {max_depth}"),
            )),
        }
    }

    /// The maximum depth after normalization.
    #[must_use]
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }
}

impl Payload for BinaryTrees {
    type State = ();
    type Output = u64;

    fn prepare(&mut self) -> std::result::Result<(), PrepareError> {
        Ok(())
    }

    fn execute(&mut self, _: &mut ()) -> std::result::Result<u64, ExecuteError> {
        let max_depth = self.max_depth;

        let mut checked = Node::build(max_depth + 1).check();

        let long_lived = Node::build(max_depth);

        for depth in (MIN_DEPTH..=max_depth).step_by(2) {
            let iterations = 1_u64 << (max_depth - depth + MIN_DEPTH);

            for _ in 0..iterations {
                checked += Node::build(depth).check();
            }
        }

        checked += long_lived.check();

        Ok(checked)
    }
}
