use crate::api::ScriptProvider;
use crate::error::ScriptError;
use crate::output::{OutputSettings, WrittenScript, write_script};
use crate::prompt::{GenerationRequest, SYSTEM_PROMPT, build_prompt};
use crate::script::Script;
use crate::{logi, logok, logw};
use std::path::PathBuf;
use tracing::debug;

pub const PREVIEW_CHARS: usize = 400;

#[derive(Debug)]
pub struct GeneratedScript {
    pub script: Script,
    pub written: WrittenScript,
}

#[derive(Debug)]
pub struct VariationOutcome {
    pub variation: u32,
    pub result: Result<GeneratedScript, ScriptError>,
}

/// Per-variation results of one invocation, in request order.
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub outcomes: Vec<VariationOutcome>,
}

impl GenerationReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn first_error(&self) -> Option<&ScriptError> {
        self.outcomes.iter().find_map(|o| o.result.as_ref().err())
    }

    pub fn first_script(&self) -> Option<&Script> {
        self.outcomes
            .iter()
            .find_map(|o| o.result.as_ref().ok().map(|g| &g.script))
    }

    pub fn written_paths(&self) -> Vec<&PathBuf> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .flat_map(|g| g.written.paths())
            .collect()
    }

    /// 0 when every requested variation was written.
    pub fn exit_code(&self) -> i32 {
        self.first_error().map(ScriptError::exit_code).unwrap_or(0)
    }
}

/// First `max_chars` characters of the raw script, `...` appended when cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

async fn generate_variation(
    provider: &dyn ScriptProvider,
    request: &GenerationRequest,
    prompt: &str,
    variation: u32,
    output: &OutputSettings,
) -> Result<GeneratedScript, ScriptError> {
    let raw = provider.complete(SYSTEM_PROMPT, prompt).await?;
    debug!("variation {} returned {} bytes", variation, raw.len());

    let script = Script::from_completion(&request.topic, &raw, variation);
    if !script.has_section_text() {
        logw(format!(
            "Variation {}: no section headings recognised; text output keeps the raw script",
            variation
        ));
    }

    let written = write_script(&script, output, request.variation_count).await?;
    Ok(GeneratedScript { script, written })
}

/// Requests and writes every variation, one after another.
///
/// A failed variation does not undo earlier ones. Configuration and
/// authentication failures stop the loop since later requests would fail too.
pub async fn run_generation(
    provider: &dyn ScriptProvider,
    request: &GenerationRequest,
    output: &OutputSettings,
) -> GenerationReport {
    let prompt = build_prompt(request);
    let count = request.variation_count;
    let mut report = GenerationReport::default();

    for variation in 1..=count {
        if count > 1 {
            logi(format!("Requesting variation {}/{}...", variation, count));
        } else {
            logi("Requesting script...");
        }

        let result = generate_variation(provider, request, &prompt, variation, output).await;
        let fatal = match &result {
            Ok(generated) => {
                for path in generated.written.paths() {
                    logok(format!("Variation {} saved to: {}", variation, path.display()));
                }
                false
            }
            Err(err) => {
                logw(format!("Variation {} failed [{}]: {}", variation, err.kind(), err));
                err.is_fatal()
            }
        };

        report.outcomes.push(VariationOutcome { variation, result });

        if fatal && variation < count {
            logw(format!("Skipping remaining {} variation(s)", count - variation));
            break;
        }
    }

    logi(format!("Done. {}/{} variation(s) written.", report.succeeded(), count));
    report
}
