use crate::app_home::APP_HOME;
use crate::cli::output_format::OutputFormat;
use crate::cli::to_args::ToArgs;
use crate::settings::Settings;
use arbitrary::Arbitrary;
use clap::Args;
use std::ffi::OsString;

#[derive(Args, Arbitrary, Clone, PartialEq, Debug)]
pub struct ConfigShowArgs {
    /// Output mode: auto|json|pretty
    #[clap(long, value_enum, default_value_t = OutputFormat::Auto)]
    pub output: OutputFormat,
}

impl ConfigShowArgs {
    pub fn invoke(self) -> eyre::Result<()> {
        let settings = Settings::load_from(&APP_HOME)?;
        eprintln!("Settings file: {}", Settings::file_path(&APP_HOME).display());
        self.output.print(&settings)
    }
}

impl ToArgs for ConfigShowArgs {
    fn to_args(&self) -> Vec<OsString> {
        if self.output == OutputFormat::Auto {
            return Vec::new();
        }
        vec!["--output".into(), self.output.to_string().into()]
    }
}
