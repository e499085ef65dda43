//! View-tree reconciliation.
//!
//! # Conceptual overview
//! Nest keeps a tree of components in sync with a declarative layout and with the DOM nodes that
//! back them.
//!
//! ## Views and boxes
//! There are two kinds of components: views, which are leaves bound to one piece of data-driven
//! markup, and boxes, which have no markup of their own and instead decide which of their
//! children are live. A box remembers every child it has ever created; a layout only selects
//! which of them are active. Children that drop out of the layout are hidden, never destroyed
//! implicitly, so when a later layout asks for them again they come back with their state and
//! their node.
//!
//! ## Keys
//! Components are identified by keys built from their id and the parameters they declare as
//! key parameters, e.g. `view=photo&id=5`. Two components with equal keys are the same component.
//! Boxes are identified by id alone.
//!
//! ## Updates
//! An update runs in two passes. First the layout is applied top-down: every box resolves its
//! children against its registry, creating what is missing, and replaces its active set. Then the
//! DOM is reconciled: every box finds its node in the rendered markup (failing loudly if there
//! is none), hides inactive children, updates active ones, carries nodes of inactive children over
//! if its own node was re-rendered, puts child nodes in layout order and shows itself.
//!
//! Updates are synchronous and never interleave. Async views take part in keying and layout like
//! any other view; until their content is ready they simply have no node, and they are placed by
//! the first update after they become ready.
//!
//! ## DOM
//! The render target is abstracted by the [`Dom`] trait. [`MemoryDom`] implements it in memory.

mod boxes;
mod config;
mod decl;
pub mod dom;
mod error;
pub mod events;
mod host;
mod key;
mod layout;
pub mod model;
mod params;
mod view;

pub use boxes::BoxView;
pub use config::Config;
pub use decl::{Declarations, DeclarationsBuilder, ViewFactory, ViewInfo};
pub use dom::{Dom, Markup, MemoryDom, NodeId};
pub use error::{DomError, Error, Result};
pub use events::{LifecycleEvent, LifecycleKind};
pub use host::Nest;
pub use key::{Key, KeyParams, Kind};
pub use layout::{Layout, LayoutKind, LayoutNode};
pub use model::{ModelCache, ModelInfo};
pub use params::Params;
pub use view::{Component, Instance, Pass, Status, UpdateOptions, View};
