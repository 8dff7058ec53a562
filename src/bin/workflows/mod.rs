mod cli;
mod commands;
mod layout;

pub(crate) use cli::Cli;
pub(crate) use commands::run_sync;
pub(crate) use layout::locate_package_dir;
