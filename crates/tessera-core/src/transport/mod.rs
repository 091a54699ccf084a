//! # Tessera Core Transport
//!
//! Network side of the plugin core. Nothing here mutates the catalog or the
//! module registry; results are handed back to the orchestrator once a job
//! is complete.
//!
//! ## Key Components:
//!
//! - **[`HttpSource`]**: the download seam, implemented by [`HttpClient`]
//!   (`reqwest`, streamed bodies, cancellation between chunks).
//! - **[`PluginListFetcher`]**: downloads plugin site lists, caches them in
//!   the plugin directory and parses them; one failing site never hides the
//!   others.
//! - **[`PluginArtifactFetcher`]**: version-gated artifact downloads into the
//!   `.new` staging area, single or in batches.
//! - **[`BackgroundWorker`]**: runs one long job at a time, each with its own
//!   cancellation token.
//! - **Site helpers** in [`site`]: URL templates and cache file names.
pub mod artifact;
pub mod client;
pub mod error;
pub mod list;
pub mod site;
pub mod worker;

pub use artifact::{ArtifactFetchJob, BatchReport, PluginArtifactFetcher};
pub use client::{HttpClient, HttpSource};
pub use error::TransportError;
pub use list::{CatalogFetch, PluginListFetcher};
pub use worker::{BackgroundWorker, JobHandle};
