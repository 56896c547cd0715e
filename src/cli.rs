use crate::config::Config;
use crate::error::ScriptError;
use crate::output::{OutputFormat, OutputSettings};
use crate::prompt::GenerationRequest;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliOutputFormat {
    Json,
    Txt,
    Both,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(cli_format: CliOutputFormat) -> Self {
        match cli_format {
            CliOutputFormat::Json => OutputFormat::Json,
            CliOutputFormat::Txt => OutputFormat::Txt,
            CliOutputFormat::Both => OutputFormat::Both,
        }
    }
}

/// Generate YouTube video scripts with an OpenAI chat model
#[derive(Parser, Debug)]
#[command(name = "yt-script-writer", version, about)]
pub struct Args {
    /// The topic for your video
    #[arg(value_name = "TOPIC")]
    pub topic: String,

    /// Expected video length [default: SCRIPT_DEFAULT_LENGTH or "5-10 minutes"]
    #[arg(short, long)]
    pub length: Option<String>,

    /// Video style [default: SCRIPT_DEFAULT_STYLE or "educational"]
    #[arg(short, long)]
    pub style: Option<String>,

    /// Target audience [default: SCRIPT_DEFAULT_AUDIENCE or "general"]
    #[arg(short, long)]
    pub audience: Option<String>,

    /// Additional requirements for the script
    #[arg(short, long)]
    pub requirements: Option<String>,

    /// Number of script variations to generate
    #[arg(short = 'n', long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub variations: u32,

    /// Folder the scripts are written to [default: SCRIPT_OUTPUT_DIR or "scripts"]
    #[arg(short = 'd', long)]
    pub output_dir: Option<PathBuf>,

    /// Which files to write
    #[arg(short, long, value_enum, default_value_t = CliOutputFormat::Both)]
    pub format: CliOutputFormat,

    /// Base file name to use instead of script_<topic>_<timestamp>
    #[arg(short, long)]
    pub output: Option<String>,

    /// Chat model to use [default: OPENAI_MODEL or "gpt-4"]
    #[arg(short, long)]
    pub model: Option<String>,

    /// Read environment variables from this file instead of ./.env
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Do not print the script preview after a single-variation run
    #[arg(long)]
    pub no_preview: bool,

    /// Log request details
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Merges flags over the configured defaults.
    pub fn generation_request(&self, cfg: &Config) -> Result<GenerationRequest, ScriptError> {
        GenerationRequest::new(
            self.topic.as_str(),
            self.length.clone().unwrap_or_else(|| cfg.default_length.clone()),
            self.style.clone().unwrap_or_else(|| cfg.default_style.clone()),
            self.audience.clone().unwrap_or_else(|| cfg.default_audience.clone()),
            self.requirements.clone(),
            self.variations,
        )
    }

    pub fn output_settings(&self, cfg: &Config) -> OutputSettings {
        OutputSettings {
            dir: self.output_dir.clone().unwrap_or_else(|| cfg.output_dir.clone()),
            format: self.format.into(),
            base_name: self.output.clone().filter(|o| !o.trim().is_empty()),
        }
    }

    /// Config with flag overrides applied.
    pub fn apply_overrides(&self, mut cfg: Config) -> Config {
        if let Some(model) = &self.model {
            cfg.model = model.clone();
        }
        cfg
    }
}
