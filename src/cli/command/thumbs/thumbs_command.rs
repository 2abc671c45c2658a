use crate::cli::app_context::AppContext;
use crate::cli::command::info::info_command::OriginalReport;
use crate::cli::command::sample_sources::arbitrary_source;
use crate::cli::command::sample_sources::arbitrary_timeout;
use crate::cli::output_format::OutputFormat;
use crate::cli::to_args::ToArgs;
use crate::thumb_info::ThumbInfo;
use crate::thumb_info::ThumbVariant;
use arbitrary::Arbitrary;
use clap::Args;
use facet::Facet;
use std::ffi::OsString;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Facet)]
pub struct ThumbVariantReport {
    pub ratio: f64,
    pub width: u32,
    pub height: u32,
    pub path: String,
    pub url: String,
}

/// Printable result of `thumbs`.
#[derive(Clone, Debug, PartialEq, Facet)]
pub struct ThumbInfoReport {
    pub original: OriginalReport,
    pub thumbnails: Vec<ThumbVariantReport>,
}

impl From<&ThumbVariant> for ThumbVariantReport {
    fn from(v: &ThumbVariant) -> Self {
        Self {
            ratio: v.ratio,
            width: v.width,
            height: v.height,
            path: v.path.display().to_string(),
            url: v.url.clone(),
        }
    }
}

impl From<&ThumbInfo> for ThumbInfoReport {
    fn from(info: &ThumbInfo) -> Self {
        Self {
            original: OriginalReport::from(&info.original),
            thumbnails: info.thumbnails.iter().map(ThumbVariantReport::from).collect(),
        }
    }
}

/// Describe an image and where each of its thumbnails belongs
#[derive(Args, Arbitrary, Clone, PartialEq, Debug)]
pub struct ThumbsArgs {
    /// Path or URL of the original image
    #[clap(allow_hyphen_values = true)]
    #[arbitrary(with = arbitrary_source)]
    pub src: String,

    /// Thumbnail width at ratio 1
    #[clap(long)]
    pub width: u32,

    /// Thumbnail height at ratio 1
    #[clap(long)]
    pub height: u32,

    /// Pixel ratio to produce a variant for; repeatable, defaults to 1
    #[clap(long = "ratio")]
    #[arbitrary(with = arbitrary_ratios)]
    pub ratios: Vec<f64>,

    /// Give up on network operations after this long, e.g. 10s
    #[clap(long, value_parser = humantime::parse_duration)]
    #[arbitrary(with = arbitrary_timeout)]
    pub timeout: Option<Duration>,

    /// Output mode: auto|json|pretty
    #[clap(long, value_enum, default_value_t = OutputFormat::Auto)]
    pub output: OutputFormat,
}

impl ThumbsArgs {
    pub fn invoke(self) -> eyre::Result<()> {
        let ctx = AppContext::load()?;
        let builder = ctx.builder(self.timeout);
        let info = tokio::runtime::Runtime::new()?.block_on(async {
            builder
                .make(&self.src, self.width, self.height, &self.ratios)
                .await
        })?;
        self.output.print(&ThumbInfoReport::from(&info))
    }
}

impl ToArgs for ThumbsArgs {
    fn to_args(&self) -> Vec<OsString> {
        let mut args = vec![
            OsString::from(&self.src),
            "--width".into(),
            self.width.to_string().into(),
            "--height".into(),
            self.height.to_string().into(),
        ];
        for ratio in &self.ratios {
            args.push("--ratio".into());
            args.push(ratio.to_string().into());
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

fn arbitrary_ratios(u: &mut arbitrary::Unstructured) -> arbitrary::Result<Vec<f64>> {
    let count = u.int_in_range(0..=3)?;
    (0..count)
        .map(|_| Ok(*u.choose(&[0.5, 1.0, 1.5, 2.0, 3.0])?))
        .collect()
}
