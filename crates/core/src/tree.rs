//! Strategy tree: handler nodes driven by an explicit routing loop.
//!
//! Each node handles a command against a shared mutable context and says
//! where to go next: [`Route::Next`] names the successor node, and
//! [`Route::Done`] ends the run with a result. The [`StrategyTree`] maps
//! node ids to handlers and keeps calling until a node finishes or fails.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use tracing::trace;

/// Routing decision returned by a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route<N, R> {
    Next(N),
    Done(R),
}

/// A unit of work in a strategy tree.
#[async_trait]
pub trait StrategyHandler<N, C, X, R>: Send + Sync
where
    N: Send + 'static,
    C: Send + Sync + 'static,
    X: Send + 'static,
    R: Send + 'static,
{
    async fn apply(&self, command: &C, context: &mut X) -> Result<Route<N, R>>;
}

/// Node id → handler map plus the root to start from.
pub struct StrategyTree<N, C, X, R> {
    root: N,
    handlers: HashMap<N, Box<dyn StrategyHandler<N, C, X, R>>>,
}

impl<N, C, X, R> StrategyTree<N, C, X, R>
where
    N: Copy + Eq + Hash + Debug + Send + Sync + 'static,
    C: Send + Sync + 'static,
    X: Send + 'static,
    R: Send + 'static,
{
    pub fn new(root: N) -> Self {
        Self {
            root,
            handlers: HashMap::new(),
        }
    }

    /// Attach the handler for `node`, replacing any previous one.
    pub fn with_node(mut self, node: N, handler: impl StrategyHandler<N, C, X, R> + 'static) -> Self {
        self.handlers.insert(node, Box::new(handler));
        self
    }

    pub fn root(&self) -> N {
        self.root
    }

    /// Run the tree from its root.
    pub async fn apply(&self, command: &C, context: &mut X) -> Result<R> {
        self.apply_from(self.root, command, context).await
    }

    /// Run the tree starting at `start` instead of the root.
    pub async fn apply_from(&self, start: N, command: &C, context: &mut X) -> Result<R> {
        let mut current = start;
        loop {
            let handler = self
                .handlers
                .get(&current)
                .ok_or_else(|| Error::Internal(format!("no handler for node {current:?}")))?;
            trace!(node = ?current, "Entering node");
            match handler.apply(command, context).await? {
                Route::Next(next) => current = next,
                Route::Done(result) => return Ok(result),
            }
        }
    }
}
