//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on the I/O boundary trait (FileSystem) but are
//! themselves concrete structs, not traits.

mod site;

pub use site::{BuildReport, Page, Site, SiteService};
