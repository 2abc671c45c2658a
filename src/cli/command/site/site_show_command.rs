use crate::cli::to_args::ToArgs;
use crate::site_context::SITE_CONTEXT;
use crate::site_context::SiteContext;
use arbitrary::Arbitrary;
use clap::Args;
use std::ffi::OsString;

#[derive(Args, Arbitrary, Clone, Default, PartialEq, Debug)]
pub struct SiteShowArgs {}

impl SiteShowArgs {
    pub fn invoke(self) -> eyre::Result<()> {
        eprintln!("Config file: {}", SiteContext::config_file_path().display());
        println!("Base URL: {}", SITE_CONTEXT.base_url);
        Ok(())
    }
}

impl ToArgs for SiteShowArgs {
    fn to_args(&self) -> Vec<OsString> {
        Vec::new()
    }
}
