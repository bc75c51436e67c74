//! lorewiki: turns a library of YAML lore documents into a cross-linked
//! wiki with a navigation tree and a merged timeline.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod tree_traits;
pub mod util;
