//! Taxonomy facet tree.
//!
//! Given the active filter paths of a discovery facet and a remote paged
//! taxonomy provider, works out which nodes to fetch and open so every
//! active filter is visible, one fetch at a time and never twice for the
//! same node.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;

pub use application::services::{BootstrapReport, ExpansionEngine, FacetTree, ToggleOutcome};
pub use domain::{derive_prefixes, NodeKey, NodeState, ParentRef, PathPrefixSet, TaxonomyRecord};
