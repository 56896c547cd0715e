use anyhow::{Context, Result};
use clap::Parser;
use tracing::Level;
use yt_script_writer::api::openai::OpenAiClient;
use yt_script_writer::cli::Args;
use yt_script_writer::config::{Config, ENV_API_KEY};
use yt_script_writer::generator::{PREVIEW_CHARS, preview, run_generation};
use yt_script_writer::{ScriptError, logi};

fn print_error(err: &ScriptError, message: &str) {
    eprintln!("error[{}]: {}", err.kind(), message);
    if matches!(err, ScriptError::Configuration(_) | ScriptError::Authentication(_)) {
        eprintln!();
        eprintln!("To fix this:");
        eprintln!("1. Get an OpenAI API key from https://platform.openai.com/api-keys");
        eprintln!("2. Set it as an environment variable:");
        eprintln!("   export {}='your-key-here'", ENV_API_KEY);
        eprintln!("3. Or put {}=your-key-here in a .env file", ENV_API_KEY);
    }
}

async fn run(args: Args) -> Result<i32> {
    let cfg = Config::load(args.env_file.as_deref()).context("loading configuration")?;
    let cfg = args.apply_overrides(cfg);
    let request = args
        .generation_request(&cfg)
        .context("reading generation options")?;
    let output = args.output_settings(&cfg);
    let client = OpenAiClient::new(&cfg).context("building OpenAI client")?;

    logi(format!("Generating script(s) for: {}", request.topic));
    logi(format!("Length: {}", request.length));
    logi(format!("Style: {}", request.style));
    logi(format!("Audience: {}", request.audience));
    logi(format!("Model: {}", client.model()));
    if request.variation_count > 1 {
        logi(format!("Creating {} variations...", request.variation_count));
    }

    let report = run_generation(&client, &request, &output).await;

    if request.variation_count == 1 && !args.no_preview {
        if let Some(script) = report.first_script() {
            let rule = "=".repeat(60);
            println!("{}", rule);
            println!("SCRIPT PREVIEW:");
            println!("{}", rule);
            println!("{}", preview(&script.full_script, PREVIEW_CHARS));
            println!("{}", rule);
        }
    }

    if let Some(err) = report.first_error() {
        print_error(err, &err.to_string());
    }

    Ok(report.exit_code())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let code = match run(args).await {
        Ok(code) => code,
        Err(err) => match err.downcast_ref::<ScriptError>() {
            Some(script_err) => {
                print_error(script_err, &format!("{:#}", err));
                script_err.exit_code()
            }
            None => {
                eprintln!("error: {:#}", err);
                1
            }
        },
    };

    std::process::exit(code);
}
