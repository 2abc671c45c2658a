use crate::app_home::APP_HOME;
use crate::cli::to_args::ToArgs;
use crate::site_context::SiteContext;
use arbitrary::Arbitrary;
use clap::Args;
use std::ffi::OsString;

/// Set the base URL local images are served under
#[derive(Args, Arbitrary, Clone, PartialEq, Debug)]
pub struct SiteSetArgs {
    /// Absolute URL, e.g. https://www.example.com/
    #[arbitrary(with = arbitrary_base_url)]
    pub base_url: String,
}

impl SiteSetArgs {
    pub fn invoke(self) -> eyre::Result<()> {
        let site = SiteContext::set_to(&APP_HOME, &self.base_url)?;
        println!("Setting base URL to: {}", site.base_url);
        Ok(())
    }
}

impl ToArgs for SiteSetArgs {
    fn to_args(&self) -> Vec<OsString> {
        vec![self.base_url.clone().into()]
    }
}

fn arbitrary_base_url(u: &mut arbitrary::Unstructured) -> arbitrary::Result<String> {
    let url = u.choose(&[
        "http://localhost/",
        "https://www.example.com/",
        "https://example.org/blog/",
    ])?;
    Ok((*url).to_string())
}
