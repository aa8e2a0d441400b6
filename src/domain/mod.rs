//! Domain layer: taxonomy entities, path prefixes and the node arena
//!
//! This layer is independent of external concerns (no I/O, no provider, no config loading).

pub mod arena;
pub mod entities;
pub mod error;
pub mod path;
pub mod queue;
pub mod render;

pub use arena::{NodeKey, TreeArena, TreeNode};
pub use entities::*;
pub use error::DomainError;
pub use path::{derive_prefixes, PathPrefixSet, PrefixMemo, PATH_DELIMITER};
pub use queue::ExpansionQueue;
pub use render::TreeRender;
