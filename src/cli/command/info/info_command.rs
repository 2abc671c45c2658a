use crate::cli::app_context::AppContext;
use crate::cli::command::sample_sources::arbitrary_source;
use crate::cli::command::sample_sources::arbitrary_timeout;
use crate::cli::output_format::OutputFormat;
use crate::cli::to_args::ToArgs;
use crate::image_source::ImageSource;
use crate::info_file::MetadataRecord;
use crate::thumb_info::OriginalImage;
use arbitrary::Arbitrary;
use clap::Args;
use facet::Facet;
use std::ffi::OsString;
use std::time::Duration;
use tracing::info;

/// Printable result of `info`.
#[derive(Clone, Debug, PartialEq, Facet)]
pub struct OriginalReport {
    pub source: ImageSource,
    pub metadata: Option<MetadataRecord>,
}

impl From<&OriginalImage> for OriginalReport {
    fn from(original: &OriginalImage) -> Self {
        Self {
            source: original.source.clone(),
            metadata: original.metadata.as_ref().map(MetadataRecord::from),
        }
    }
}

/// Print the dimensions, format and size of an image
#[derive(Args, Arbitrary, Clone, PartialEq, Debug)]
pub struct InfoArgs {
    /// Path or URL of the image
    #[clap(allow_hyphen_values = true)]
    #[arbitrary(with = arbitrary_source)]
    pub src: String,

    /// Probe again instead of trusting a stored info file
    #[clap(long)]
    pub no_cache: bool,

    /// Give up on network operations after this long, e.g. 10s
    #[clap(long, value_parser = humantime::parse_duration)]
    #[arbitrary(with = arbitrary_timeout)]
    pub timeout: Option<Duration>,

    /// Output mode: auto|json|pretty
    #[clap(long, value_enum, default_value_t = OutputFormat::Auto)]
    pub output: OutputFormat,
}

impl InfoArgs {
    pub fn invoke(self) -> eyre::Result<()> {
        let ctx = AppContext::load()?;
        let builder = ctx.builder(self.timeout);
        let original = tokio::runtime::Runtime::new()?
            .block_on(async { builder.original(&self.src, !self.no_cache).await })?;
        if let Some(metadata) = &original.metadata {
            info!(
                src = %original.source.reference(),
                width = ?metadata.width,
                height = ?metadata.height,
                "Resolved image metadata"
            );
        }
        self.output.print(&OriginalReport::from(&original))
    }
}

impl ToArgs for InfoArgs {
    fn to_args(&self) -> Vec<OsString> {
        let mut args = vec![OsString::from(&self.src)];
        if self.no_cache {
            args.push("--no-cache".into());
        }
        if let Some(timeout) = self.timeout {
            args.push("--timeout".into());
            args.push(humantime::format_duration(timeout).to_string().into());
        }
        if self.output != OutputFormat::Auto {
            args.push("--output".into());
            args.push(self.output.to_string().into());
        }
        args
    }
}
