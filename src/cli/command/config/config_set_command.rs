use crate::app_home::APP_HOME;
use crate::cli::to_args::ToArgs;
use crate::settings::Settings;
use arbitrary::Arbitrary;
use clap::Args;
use std::ffi::OsString;
use tracing::info;

/// Change individual settings; anything not given keeps its current value
#[derive(Args, Arbitrary, Clone, Default, PartialEq, Debug)]
pub struct ConfigSetArgs {
    /// Directory served at the base URL
    #[clap(long)]
    #[arbitrary(with = arbitrary_dir)]
    pub site_root: Option<String>,

    /// Where thumbnails are placed (relative to the site root unless absolute)
    #[clap(long)]
    #[arbitrary(with = arbitrary_dir)]
    pub thumbs_dir: Option<String>,

    /// Where remote copies and info files are placed
    #[clap(long, conflicts_with = "no_remote_dir")]
    #[arbitrary(with = arbitrary_dir)]
    pub remote_dir: Option<String>,

    /// Disable remote copies and info files entirely
    #[clap(long)]
    #[arbitrary(value = false)]
    pub no_remote_dir: bool,

    /// Copy remote originals into the remote dir instead of keeping info files
    #[clap(long)]
    pub copy_remote: Option<bool>,

    /// Mirror source directories inside the cache dirs instead of flattening names
    #[clap(long)]
    pub subdirs: Option<bool>,

    /// Write an index.html placeholder into newly created cache directories
    #[clap(long)]
    pub index_placeholder: Option<bool>,
}

impl ConfigSetArgs {
    /// Fold the requested changes into `settings`.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(root) = &self.site_root {
            settings.site_root = Some(root.clone());
        }
        if let Some(dir) = &self.thumbs_dir {
            settings.thumbs_dir = dir.clone();
        }
        if let Some(dir) = &self.remote_dir {
            settings.remote_dir = Some(dir.clone());
        }
        if self.no_remote_dir {
            settings.remote_dir = None;
        }
        if let Some(v) = self.copy_remote {
            settings.copy_remote = v;
        }
        if let Some(v) = self.subdirs {
            settings.subdirs = v;
        }
        if let Some(v) = self.index_placeholder {
            settings.index_placeholder = v;
        }
    }

    pub fn invoke(self) -> eyre::Result<()> {
        let mut settings = Settings::load_from(&APP_HOME)?;
        self.apply(&mut settings);
        settings.save_to(&APP_HOME)?;
        info!(path = %Settings::file_path(&APP_HOME).display(), "Saved settings");
        println!("Updated settings");
        Ok(())
    }
}

impl ToArgs for ConfigSetArgs {
    fn to_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        let mut push = |flag: &str, value: Option<String>| {
            if let Some(value) = value {
                args.push(flag.into());
                args.push(value.into());
            }
        };
        push("--site-root", self.site_root.clone());
        push("--thumbs-dir", self.thumbs_dir.clone());
        push("--remote-dir", self.remote_dir.clone());
        push("--copy-remote", self.copy_remote.map(|v| v.to_string()));
        push("--subdirs", self.subdirs.map(|v| v.to_string()));
        push(
            "--index-placeholder",
            self.index_placeholder.map(|v| v.to_string()),
        );
        if self.no_remote_dir {
            args.push("--no-remote-dir".into());
        }
        args
    }
}

fn arbitrary_dir(u: &mut arbitrary::Unstructured) -> arbitrary::Result<Option<String>> {
    if u.arbitrary()? {
        let dir = u.choose(&["images/thumbnails", "/srv/www", "cache dir"])?;
        Ok(Some((*dir).to_string()))
    } else {
        Ok(None)
    }
}
