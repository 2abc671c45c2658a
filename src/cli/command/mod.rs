pub mod classify;
pub mod config;
pub mod info;
pub mod safe_name;
pub mod sample_sources;
pub mod site;
pub mod thumbs;

use crate::cli::command::classify::classify_command::ClassifyArgs;
use crate::cli::command::config::ConfigArgs;
use crate::cli::command::info::info_command::InfoArgs;
use crate::cli::command::safe_name::safe_name_command::SafeNameArgs;
use crate::cli::command::site::SiteArgs;
use crate::cli::command::thumbs::thumbs_command::ThumbsArgs;
use crate::cli::to_args::ToArgs;
use arbitrary::Arbitrary;
use clap::Subcommand;
use std::ffi::OsString;

#[derive(Subcommand, Arbitrary, PartialEq, Debug)]
pub enum Command {
    /// Base URL related commands
    Site(SiteArgs),

    /// Cache settings (directories, layout, remote copies)
    Config(ConfigArgs),

    /// Classify an image reference as local or remote
    Classify(ClassifyArgs),

    /// Print image metadata
    Info(InfoArgs),

    /// Print the cache path derived from an image reference
    SafeName(SafeNameArgs),

    /// Print thumbnail names and sizes for an image
    Thumbs(ThumbsArgs),
}

impl Default for Command {
    fn default() -> Self {
        Command::Site(Default::default())
    }
}

impl Command {
    pub fn invoke(self) -> eyre::Result<()> {
        match self {
            Command::Site(args) => args.invoke(),
            Command::Config(args) => args.invoke(),
            Command::Classify(args) => args.invoke(),
            Command::Info(args) => args.invoke(),
            Command::SafeName(args) => args.invoke(),
            Command::Thumbs(args) => args.invoke(),
        }
    }
}

impl ToArgs for Command {
    fn to_args(&self) -> Vec<OsString> {
        let (name, rest) = match self {
            Command::Site(a) => ("site", a.to_args()),
            Command::Config(a) => ("config", a.to_args()),
            Command::Classify(a) => ("classify", a.to_args()),
            Command::Info(a) => ("info", a.to_args()),
            Command::SafeName(a) => ("safe-name", a.to_args()),
            Command::Thumbs(a) => ("thumbs", a.to_args()),
        };
        let mut args = vec![OsString::from(name)];
        args.extend(rest);
        args
    }
}
