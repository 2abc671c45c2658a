use crate::app_home::APP_HOME;
use crate::cli::to_args::ToArgs;
use crate::site_context::SiteContext;
use arbitrary::Arbitrary;
use clap::Args;
use std::ffi::OsString;

/// Reset the base URL to the default value and persist it to the config file
#[derive(Args, Arbitrary, Clone, PartialEq, Debug)]
pub struct SiteResetArgs {}

impl SiteResetArgs {
    pub fn invoke(self) -> eyre::Result<()> {
        SiteContext::set_to(&APP_HOME, SiteContext::DEFAULT)?;
        println!("Reset base URL to default: {}", SiteContext::DEFAULT);
        Ok(())
    }
}

impl ToArgs for SiteResetArgs {
    fn to_args(&self) -> Vec<OsString> {
        Vec::new()
    }
}
