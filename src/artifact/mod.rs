//! Artifact installation into the debugger-frontend package.
//!
//! - [`manifest`] - The build's list of files meant for packaging
//! - [`install`] - Cleaning the destination and copying manifest files
//! - [`filesystem`] - Removal, copy and listing helpers

pub mod filesystem;
pub mod install;
pub mod manifest;

pub use install::{install_artifacts, InstallReport};
