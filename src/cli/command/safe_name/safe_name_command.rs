use crate::cli::app_context::AppContext;
use crate::cli::command::sample_sources::arbitrary_source;
use crate::cli::output_format::OutputFormat;
use crate::cli::to_args::ToArgs;
use crate::safe_name::CachePathReport;
use crate::safe_name::SafeNameRequest;
use arbitrary::Arbitrary;
use clap::Args;
use std::ffi::OsString;
use std::path::PathBuf;

/// Print the cache location derived from an image path or URL, creating its directory
#[derive(Args, Arbitrary, Clone, PartialEq, Debug)]
pub struct SafeNameArgs {
    /// Local path or URL the cache entry derives from
    #[clap(allow_hyphen_values = true)]
    #[arbitrary(with = arbitrary_source)]
    pub src: String,

    /// Cache directory (defaults to the configured thumbs dir)
    #[clap(long)]
    #[arbitrary(with = arbitrary_cache_dir)]
    pub dir: Option<PathBuf>,

    /// Text spliced in before the extension, e.g. -200x150
    #[clap(long, allow_hyphen_values = true, default_value = "")]
    #[arbitrary(with = arbitrary_suffix)]
    pub suffix: String,

    /// Treat the source as a remote URL
    #[clap(long)]
    pub remote: bool,

    /// Extension appended after the original one, e.g. info
    #[clap(long)]
    #[arbitrary(with = arbitrary_extra_ext)]
    pub extra_ext: Option<String>,

    /// Output mode: auto|json|pretty
    #[clap(long, value_enum, default_value_t = OutputFormat::Auto)]
    pub output: OutputFormat,
}

impl SafeNameArgs {
    pub fn invoke(self) -> eyre::Result<()> {
        let ctx = AppContext::load()?;
        let dir = self.dir.clone().unwrap_or_else(|| ctx.config.thumbs_dir.clone());
        let spec = ctx.sanitizer().safe_name(
            &SafeNameRequest::new(&self.src, &dir)
                .suffix(&self.suffix)
                .local(!self.remote)
                .extra_extension(self.extra_ext.as_deref()),
        )?;
        self.output.print(&CachePathReport::from(&spec))
    }
}

impl ToArgs for SafeNameArgs {
    fn to_args(&self) -> Vec<OsString> {
        let mut args = vec![OsString::from(&self.src)];
        if let Some(dir) = &self.dir {
            args.push("--dir".into());
            args.push(dir.clone().into_os_string());
        }
        if !self.suffix.is_empty() {
            args.push(format!("--suffix={}", self.suffix).into());
        }
        if self.remote {
            args.push("--remote".into());
        }
        if let Some(ext) = &self.extra_ext {
            args.push("--extra-ext".into());
            args.push(ext.into());
        }
        if self.output != OutputFormat::Auto {
            args.push("--output".into());
            args.push(self.output.to_string().into());
        }
        args
    }
}

fn arbitrary_cache_dir(u: &mut arbitrary::Unstructured) -> arbitrary::Result<Option<PathBuf>> {
    if u.arbitrary()? {
        Ok(Some(PathBuf::from(*u.choose(&["thumbs", "/tmp/remote"])?)))
    } else {
        Ok(None)
    }
}

fn arbitrary_suffix(u: &mut arbitrary::Unstructured) -> arbitrary::Result<String> {
    Ok((*u.choose(&["", "-200x150", "_small"])?).to_string())
}

fn arbitrary_extra_ext(u: &mut arbitrary::Unstructured) -> arbitrary::Result<Option<String>> {
    if u.arbitrary()? {
        Ok(Some("info".to_string()))
    } else {
        Ok(None)
    }
}
