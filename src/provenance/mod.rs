//! Build provenance for the debugger-frontend package.
//!
//! - [`build_info`] - Collecting, rendering, writing and reading BUILD_INFO
//! - [`signing`] - Signed-source tokens that make hand edits detectable
//! - [`host`] - Hostname and user of local-checkout syncs

pub mod build_info;
pub mod host;
pub mod signing;

pub use build_info::{
    collect_build_info, read_build_info, write_build_info, BuildInfo, CheckoutOrigin,
    ParsedBuildInfo, RunFacts, BUILD_INFO_FILENAME,
};
pub use signing::SignatureStatus;
