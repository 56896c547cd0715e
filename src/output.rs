use crate::error::ScriptError;
use crate::script::Script;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tokio::fs;

const RULE_WIDTH: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    Json,
    Txt,
    #[default]
    Both,
}

impl OutputFormat {
    pub fn writes_json(self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Both)
    }

    pub fn writes_text(self) -> bool {
        matches!(self, OutputFormat::Txt | OutputFormat::Both)
    }
}

#[derive(Debug, Clone)]
pub struct OutputSettings {
    pub dir: PathBuf,
    pub format: OutputFormat,
    /// Replaces the derived `script_<topic>_<timestamp>` stem.
    pub base_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenScript {
    pub variation: u32,
    pub json_path: Option<PathBuf>,
    pub text_path: Option<PathBuf>,
}

impl WrittenScript {
    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.json_path.iter().chain(self.text_path.iter())
    }
}

/// Keeps alphanumerics, space, `-` and `_`; spaces become underscores.
pub fn safe_topic(topic: &str) -> String {
    let kept: String = topic
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    let trimmed = kept.trim();
    if trimmed.is_empty() {
        return "untitled".to_string();
    }
    trimmed.replace(' ', "_")
}

/// File name stem for one script, without extension or collision suffix.
pub fn file_stem(script: &Script, base_name: Option<&str>, variation_count: u32) -> String {
    let mut stem = match base_name.and_then(|b| Path::new(b).file_stem()) {
        Some(custom) => custom.to_string_lossy().into_owned(),
        None => format!(
            "script_{}_{}",
            safe_topic(&script.topic),
            script.generated_at.format("%Y%m%d_%H%M%S")
        ),
    };
    if variation_count > 1 {
        let _ = write!(stem, "_v{}", script.variation);
    }
    stem
}

pub fn render_text(script: &Script) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "YouTube Video Script: {}", script.topic);
    let _ = writeln!(out, "Generated: {}", script.generated_at.to_rfc3339());
    let _ = writeln!(out, "Variation: {}", script.variation);
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
    out.push('\n');

    if !script.has_section_text() {
        out.push_str(script.full_script.trim());
        out.push('\n');
        return out;
    }

    for section in &script.sections {
        match &section.timing_estimate {
            Some(timing) => {
                let _ = writeln!(out, "{} ({})", section.name.label(), timing);
            }
            None => {
                let _ = writeln!(out, "{}", section.name.label());
            }
        }
        let _ = writeln!(out, "{}", "-".repeat(section.name.label().len()));
        if section.text.is_empty() {
            out.push_str("[section not found in response]\n");
        } else {
            out.push_str(&section.text);
            out.push('\n');
        }
        out.push('\n');
    }

    out
}

async fn file_exists(path: &Path) -> bool {
    fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

/// First of `stem`, `stem_2`, `stem_3`, ... with none of its files present in `dir`.
async fn free_stem(dir: &Path, stem: &str, format: OutputFormat) -> String {
    let mut attempt = 1;
    loop {
        let candidate = if attempt == 1 {
            stem.to_string()
        } else {
            format!("{}_{}", stem, attempt)
        };

        let json_taken =
            format.writes_json() && file_exists(&dir.join(format!("{}.json", candidate))).await;
        let text_taken =
            format.writes_text() && file_exists(&dir.join(format!("{}.txt", candidate))).await;
        if !json_taken && !text_taken {
            return candidate;
        }
        attempt += 1;
    }
}

async fn write_file(path: &Path, contents: &[u8]) -> Result<(), ScriptError> {
    fs::write(path, contents)
        .await
        .map_err(|e| ScriptError::write(path, e))
}

/// Writes one script in the requested format(s) and returns where it went.
pub async fn write_script(
    script: &Script,
    settings: &OutputSettings,
    variation_count: u32,
) -> Result<WrittenScript, ScriptError> {
    let stem = file_stem(script, settings.base_name.as_deref(), variation_count);

    let dir = match settings
        .base_name
        .as_deref()
        .and_then(|b| Path::new(b).parent())
        .filter(|p| !p.as_os_str().is_empty())
    {
        Some(sub) => settings.dir.join(sub),
        None => settings.dir.clone(),
    };

    fs::create_dir_all(&dir)
        .await
        .map_err(|e| ScriptError::write(&dir, e))?;

    let stem = free_stem(&dir, &stem, settings.format).await;
    let mut written = WrittenScript {
        variation: script.variation,
        json_path: None,
        text_path: None,
    };

    if settings.format.writes_json() {
        let path = dir.join(format!("{}.json", stem));
        let json = serde_json::to_string_pretty(script)
            .map_err(|e| ScriptError::write(&path, e.into()))?;
        write_file(&path, json.as_bytes()).await?;
        written.json_path = Some(path);
    }

    if settings.format.writes_text() {
        let path = dir.join(format!("{}.txt", stem));
        if let Err(err) = write_file(&path, render_text(script).as_bytes()).await {
            // No half pairs on disk.
            if let Some(json_path) = written.json_path.take() {
                if let Err(e) = fs::remove_file(&json_path).await {
                    tracing::warn!(path = %json_path.display(), error = %e, "could not remove partial output");
                }
            }
            return Err(err);
        }
        written.text_path = Some(path);
    }

    Ok(written)
}
