//! ghmail - resolve a GitHub username to a display name and commit emails.
//!
//! The core operations are independent and composable:
//!
//! - [`normalize`] turns raw input into a validated [`Handle`].
//! - [`Aggregator::fetch_profile`] and [`Aggregator::fetch_commit_emails`]
//!   talk to the GitHub API behind a [`TtlCache`].
//! - [`synthesize`] merges both into a [`ResultRecord`].
//!
//! [`Resolver`] wires them together for a complete lookup.

pub mod cache;
pub mod cli;
pub mod config;
pub mod errors;
pub mod github;
pub mod lookup;
pub mod models;
pub mod normalizer;
pub mod report;

pub use cache::TtlCache;
pub use errors::{LookupError, ValidationError};
pub use lookup::{synthesize, Aggregator, DiscoveryConfig, Resolver};
pub use models::{CommitEmailSet, Handle, ProfileRecord, Provenance, ResultRecord};
pub use normalizer::normalize;
