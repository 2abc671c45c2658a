pub mod config_command;
pub mod config_reset_command;
pub mod config_set_command;
pub mod config_show_command;

use crate::cli::command::config::config_command::ConfigCommand;
use crate::cli::to_args::ToArgs;
use arbitrary::Arbitrary;
use clap::Args;
use std::ffi::OsString;

#[derive(Args, Arbitrary, PartialEq, Debug)]
pub struct ConfigArgs {
    #[clap(subcommand)]
    pub command: ConfigCommand,
}

impl ConfigArgs {
    pub fn invoke(self) -> eyre::Result<()> {
        self.command.invoke()
    }
}

impl ToArgs for ConfigArgs {
    fn to_args(&self) -> Vec<OsString> {
        self.command.to_args()
    }
}
