//! Sync tooling for the debugger-frontend package.
//!
//! Checks out the React Native fork of Chrome DevTools frontend, builds it
//! with depot_tools (gclient, gn, autoninja), installs the generated files
//! into the package, records signed provenance in `BUILD_INFO`, and can
//! submit the result for review.
//!
//! - **Process runner** - Every external tool goes through [`process::CommandRunner`]
//! - **Checkout and build** - [`checkout`], [`workspace`], [`build`]
//! - **Package update** - [`artifact`], [`provenance`]
//! - **Review** - [`changelog`], [`diff`]
//!
//! # Architecture
//!
//! ```text
//! debugger-frontend-sync (binary)
//!     │
//!     └── pipeline::SyncPipeline
//!             ├── preflight     host tools
//!             ├── diff          baseline (--create-diff)
//!             ├── checkout      local path or fresh clone
//!             ├── workspace     gclient config + sync
//!             ├── build         gn gen + autoninja
//!             ├── artifact      dist/third-party
//!             ├── provenance    BUILD_INFO
//!             └── diff          commit + draft review (--create-diff)
//! ```

#![forbid(unsafe_code)]

pub mod artifact;
pub mod build;
pub mod changelog;
pub mod checkout;
pub mod config;
pub mod diff;
pub mod error;
pub mod pipeline;
pub mod preflight;
pub mod process;
pub mod provenance;
pub mod term;
pub mod workspace;

pub use config::SyncConfig;
pub use error::{ProcessError, SyncError};
pub use pipeline::{RunOptions, RunSummary, SyncPipeline};
