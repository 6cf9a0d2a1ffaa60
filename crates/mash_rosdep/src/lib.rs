//! rosdep key resolution and rosdistro release information.
//!
//! The rosdep database is loaded once from the configured sources and then
//! answers lookups from memory, see [`RosdepDatabase`].

mod database;
pub mod distribution;
mod error;
mod fetch;
mod sources;

pub use database::RosdepDatabase;
pub use distribution::{DEFAULT_INDEX_URL, Distribution, DistributionIndex, release_packages};
pub use error::RosdepError;
pub use fetch::Location;
pub use sources::{DEFAULT_SOURCES_LIST_DIR, DataSource, load_sources_dir, parse_sources_list};
