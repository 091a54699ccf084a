//! # Tessera Core Kernel
//!
//! The `kernel` module holds what every other subsystem of `tessera-core`
//! depends on: the description of the running host, shared constants and the
//! crate-wide error type.
//!
//! ## Key Components:
//!
//! - **Host Environment**: [`HostEnvironment`](environment::HostEnvironment) bundles the
//!   host application version (which may be unknown for development builds),
//!   the plugin runtime level and the current [`Platform`](environment::Platform).
//! - **Core Constants**: file naming conventions, defaults and environment
//!   variable names via the `constants` submodule.
//! - **Error Handling**: the top-level [`Error`](error::Error) and its `Result`
//!   alias, wrapping the typed errors of each subsystem.
pub mod constants;
pub mod environment;
pub mod error;

pub use environment::{HostEnvironment, HostVersion, Platform};
pub use error::{Error, Result};
