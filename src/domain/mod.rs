//! Domain layer: navigation tree, linking and chronology
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod chrono_key;
pub mod entities;
pub mod error;
pub mod filters;
pub mod links;
pub mod timeline;

pub use arena::{NavTree, NodeId, TreeNode};
pub use builder::{build_wiki, TreeBuilder, Wiki};
pub use chrono_key::ChronoKey;
pub use entities::*;
pub use error::{ChronoDecodeError, DomainError, DomainResult};
pub use links::{AutoLinker, LinkEntry, LinkIndex, RelativeLinker, UnresolvedLink};
pub use timeline::{Event, Timeline, TimelineAggregator};
