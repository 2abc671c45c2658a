use arbitrary::Arbitrary;
use clap::ValueEnum;
use facet::Facet;
use facet_pretty::FacetPretty;

#[derive(ValueEnum, Arbitrary, Clone, Copy, Default, PartialEq, Debug)]
pub enum OutputFormat {
    #[default]
    Auto,
    Json,
    Pretty,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Json => write!(f, "json"),
            Self::Pretty => write!(f, "pretty"),
        }
    }
}

impl OutputFormat {
    /// Pretty on a terminal, JSON when piped.
    #[must_use]
    pub fn resolve(self) -> OutputFormat {
        match self {
            OutputFormat::Auto => {
                if atty::is(atty::Stream::Stdout) {
                    OutputFormat::Pretty
                } else {
                    OutputFormat::Json
                }
            }
            other => other,
        }
    }

    pub fn print<'a, T: Facet<'a>>(self, value: &'a T) -> eyre::Result<()> {
        match self.resolve() {
            OutputFormat::Auto => unreachable!("output was resolved from Auto earlier"),
            OutputFormat::Pretty => println!("{}", value.pretty()),
            OutputFormat::Json => {
                let json = facet_json::to_string(value)
                    .map_err(|e| eyre::eyre!("Failed to serialize result: {}", e))?;
                println!("{}", json);
            }
        }
        Ok(())
    }
}
