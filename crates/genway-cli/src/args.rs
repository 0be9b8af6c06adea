//! CLI argument definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Configuration file looked up in the user config directory when
/// `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "genway.toml";

#[derive(Parser)]
#[command(name = "genway")]
#[command(about = "Genway - rate-limited generation gateway with provider fallback")]
#[command(
    long_about = r#"Genway - rate-limited generation gateway with provider fallback

USAGE:
  genway serve                          # Run the HTTP gateway
  genway generate "prompt" --kind headline
  genway providers                      # Show the provider registry
  genway resolve quality                # Show the candidate order for a tier

Provider credentials are read from the environment variables named in the
configuration (OPENAI_API_KEY, ANTHROPIC_API_KEY, GROQ_API_KEY by default)."#
)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (JSON, TOML or YAML)
    #[arg(long, global = true, env = "GENWAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Explicit `--config`, else `<config dir>/genway/genway.toml`, else
    /// `./genway.toml`. A path that does not exist loads the defaults.
    pub fn config_path(&self) -> PathBuf {
        if let Some(path) = &self.config {
            return path.clone();
        }
        dirs::config_dir()
            .map(|dir| dir.join("genway").join(DEFAULT_CONFIG_FILE))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP gateway
    Serve {
        /// Address to bind, overriding `server.bind`
        #[arg(long)]
        bind: Option<String>,
    },

    /// Generate once and print the result
    Generate(GenerateArgs),

    /// List registered providers and whether their credentials are present
    Providers,

    /// Show the ordered candidate list for a quality tier
    Resolve {
        /// fast, smart or quality
        tier: String,
    },
}

#[derive(clap::Args)]
pub struct GenerateArgs {
    /// Prompt text; may be omitted in refinement mode
    pub prompt: Option<String>,

    /// Content kind: component, headline or narration
    #[arg(long, short)]
    pub kind: String,

    /// Quality tier: fast, smart or quality
    #[arg(long, short, default_value = "smart")]
    pub tier: String,

    /// Print tokens as they arrive
    #[arg(long)]
    pub stream: bool,

    /// File holding a previous output to refine
    #[arg(long, requires = "refine")]
    pub prior_output_file: Option<PathBuf>,

    /// Edit to apply to the prior output
    #[arg(long, requires = "prior_output_file")]
    pub refine: Option<String>,

    /// Account the request is attributed to
    #[arg(long, default_value = "local")]
    pub account: String,

    /// Plan tier to run under
    #[arg(long, default_value = "pro")]
    pub plan: String,
}
