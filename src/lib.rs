#![deny(clippy::disallowed_methods)]

pub mod app_home;
pub mod cache;
pub mod cli;
pub mod error;
pub mod fs_port;
pub mod http;
pub mod image_source;
pub mod info_file;
pub mod materialize;
pub mod metadata;
pub mod safe_name;
pub mod settings;
pub mod site_context;
pub mod thumb_info;
pub mod tracing;

use crate::cli::Cli;
use clap::CommandFactory;
use clap::FromArgMatches;
pub use error::Result;
pub use error::ThumbError;

pub fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::command();
    let cli = Cli::from_arg_matches(&cli.get_matches())?;

    crate::tracing::init_tracing(
        cli.global_args.log_level(),
        cli.global_args.json_log_behaviour(),
    )?;

    cli.invoke()?;
    Ok(())
}
