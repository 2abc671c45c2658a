use crate::cli::app_context::AppContext;
use crate::cli::command::sample_sources::arbitrary_source;
use crate::cli::output_format::OutputFormat;
use crate::cli::to_args::ToArgs;
use crate::image_source::SourceClassifier;
use arbitrary::Arbitrary;
use clap::Args;
use std::ffi::OsString;

/// Decide whether an image reference is local or remote
#[derive(Args, Arbitrary, Clone, PartialEq, Debug)]
pub struct ClassifyArgs {
    /// Path or URL of the image
    #[clap(allow_hyphen_values = true)]
    #[arbitrary(with = arbitrary_source)]
    pub src: String,

    /// Output mode: auto|json|pretty
    #[clap(long, value_enum, default_value_t = OutputFormat::Auto)]
    pub output: OutputFormat,
}

impl ClassifyArgs {
    pub fn invoke(self) -> eyre::Result<()> {
        let ctx = AppContext::load()?;
        let source = SourceClassifier::new(ctx.fs.clone(), ctx.site.clone()).classify(&self.src);
        self.output.print(&source)
    }
}

impl ToArgs for ClassifyArgs {
    fn to_args(&self) -> Vec<OsString> {
        let mut args = vec![OsString::from(&self.src)];
        if self.output != OutputFormat::Auto {
            args.push("--output".into());
            args.push(self.output.to_string().into());
        }
        args
    }
}
