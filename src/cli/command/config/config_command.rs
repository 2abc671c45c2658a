use crate::cli::command::config::config_reset_command::ConfigResetArgs;
use crate::cli::command::config::config_set_command::ConfigSetArgs;
use crate::cli::command::config::config_show_command::ConfigShowArgs;
use crate::cli::to_args::ToArgs;
use arbitrary::Arbitrary;
use clap::Subcommand;
use std::ffi::OsString;

#[derive(Subcommand, Clone, Arbitrary, PartialEq, Debug)]
pub enum ConfigCommand {
    /// Show the cache settings
    Show(ConfigShowArgs),

    /// Change individual cache settings
    Set(ConfigSetArgs),

    /// Restore the default cache settings
    Reset(ConfigResetArgs),
}

impl ConfigCommand {
    pub fn invoke(self) -> eyre::Result<()> {
        match self {
            ConfigCommand::Show(args) => args.invoke(),
            ConfigCommand::Set(args) => args.invoke(),
            ConfigCommand::Reset(args) => args.invoke(),
        }
    }
}

impl ToArgs for ConfigCommand {
    fn to_args(&self) -> Vec<OsString> {
        let (name, rest) = match self {
            ConfigCommand::Show(a) => ("show", a.to_args()),
            ConfigCommand::Set(a) => ("set", a.to_args()),
            ConfigCommand::Reset(a) => ("reset", a.to_args()),
        };
        let mut args = vec![OsString::from(name)];
        args.extend(rest);
        args
    }
}
