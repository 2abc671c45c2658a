use crate::cli::json_log_behaviour::JsonLogBehaviour;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install the global subscriber. `RUST_LOG` overrides `level`.
pub fn init_tracing(level: Level, json: JsonLogBehaviour) -> eyre::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();
    let registry = tracing_subscriber::registry().with(filter);

    match json {
        JsonLogBehaviour::None => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()?,
        JsonLogBehaviour::Stderr => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?,
        JsonLogBehaviour::File(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            registry
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(fmt::layer().json().with_ansi(false).with_writer(Mutex::new(file)))
                .try_init()?
        }
    }
    Ok(())
}
