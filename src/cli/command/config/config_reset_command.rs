use crate::app_home::APP_HOME;
use crate::cli::to_args::ToArgs;
use crate::settings::Settings;
use arbitrary::Arbitrary;
use clap::Args;
use std::ffi::OsString;

#[derive(Args, Arbitrary, Clone, PartialEq, Debug)]
pub struct ConfigResetArgs {}

impl ConfigResetArgs {
    pub fn invoke(self) -> eyre::Result<()> {
        Settings::default().save_to(&APP_HOME)?;
        println!(
            "Reset settings to default: {}",
            Settings::file_path(&APP_HOME).display()
        );
        Ok(())
    }
}

impl ToArgs for ConfigResetArgs {
    fn to_args(&self) -> Vec<OsString> {
        Vec::new()
    }
}
