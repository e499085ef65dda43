//! Errors.

use crate::dom::NodeId;
use crate::key::Key;
use thiserror::Error;

/// Errors that may occur while updating the view tree.
#[derive(Debug, Error)]
pub enum Error {
    /// The rendered markup does not contain a node for a component that needs one.
    ///
    /// The logical tree and the DOM disagree; the update is aborted.
    #[error("can’t find node for ‘{id}’")]
    NodeNotFound { id: String },

    /// A layout referenced a view that was never declared.
    #[error("unknown view ‘{0}’")]
    UnknownView(String),

    /// A model id that was never registered with the cache.
    #[error("unknown model ‘{0}’")]
    UnknownModel(String),

    /// A [`ViewFactory`](crate::ViewFactory) created a view whose key differs from the one it
    /// reported for the same id and parameters.
    #[error("expected a view with key {expected}, got {found}")]
    KeyMismatch { expected: Key, found: Key },

    /// The layout passed to an update does not describe the root box.
    #[error("layout for ‘{found}’ can’t be applied to root box ‘{expected}’")]
    RootMismatch { expected: String, found: String },

    /// An active key without an instance behind it.
    #[error("no instance for active key {0}")]
    MissingInstance(Key),

    #[error(transparent)]
    Dom(#[from] DomError),
}

/// Errors that may occur when running a DOM operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum DomError {
    #[error("no such node {0:?}")]
    NoSuchNode(NodeId),

    /// Inserting the node would make it its own ancestor.
    #[error("node {0:?} can’t be inserted into its own subtree")]
    Cycle(NodeId),

    #[error("node {node:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, node: NodeId },
}

pub type Result<T> = std::result::Result<T, Error>;
