//! Building the DevTools frontend.
//!
//! - [`release`] - gn configuration and the ninja release build

pub mod release;

pub use release::{perform_release_build, ReleaseBuild, NOT_BUILT};
