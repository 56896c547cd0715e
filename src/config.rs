use crate::error::ScriptError;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_MODEL: &str = "OPENAI_MODEL";
pub const ENV_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_MAX_TOKENS: &str = "OPENAI_MAX_TOKENS";
pub const ENV_TEMPERATURE: &str = "OPENAI_TEMPERATURE";
pub const ENV_TIMEOUT_SECS: &str = "OPENAI_TIMEOUT_SECS";
pub const ENV_DEFAULT_LENGTH: &str = "SCRIPT_DEFAULT_LENGTH";
pub const ENV_DEFAULT_STYLE: &str = "SCRIPT_DEFAULT_STYLE";
pub const ENV_DEFAULT_AUDIENCE: &str = "SCRIPT_DEFAULT_AUDIENCE";
pub const ENV_OUTPUT_DIR: &str = "SCRIPT_OUTPUT_DIR";

#[derive(Debug, Clone)]
pub struct Config {
    pub openai_key: String,
    pub model: String,
    pub api_base: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub default_length: String,
    pub default_style: String,
    pub default_audience: String,
    pub output_dir: PathBuf,
}

fn default_model() -> String {
    "gpt-4".to_string()
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_length() -> String {
    "5-10 minutes".to_string()
}

fn default_style() -> String {
    "educational".to_string()
}

fn default_audience() -> String {
    "general".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("scripts")
}

impl Config {
    /// Reads `env_file` (or `.env` in the working directory when present;
    /// parent directories are not searched),
    /// then builds the config from the process environment.
    ///
    /// Variables already set in the environment are not overridden by the file.
    pub fn load(env_file: Option<&Path>) -> Result<Self, ScriptError> {
        match env_file {
            Some(path) => {
                dotenvy::from_path(path).map_err(|e| {
                    ScriptError::configuration(format!(
                        "failed to read env file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
            }
            None => match dotenvy::from_path(".env") {
                Ok(()) => {}
                Err(e) if e.not_found() => {}
                Err(e) => {
                    return Err(ScriptError::configuration(format!(
                        "failed to read .env: {}",
                        e
                    )));
                }
            },
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ScriptError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let openai_key = get(ENV_API_KEY).ok_or_else(|| {
            ScriptError::configuration(format!(
                "OpenAI API key is required; set {} in the environment or a .env file",
                ENV_API_KEY
            ))
        })?;

        let temperature: f32 = parse_or(get(ENV_TEMPERATURE), ENV_TEMPERATURE, 0.7)?;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ScriptError::configuration(format!(
                "{} must be between 0 and 2, got {}",
                ENV_TEMPERATURE, temperature
            )));
        }

        let max_tokens: u32 = parse_or(get(ENV_MAX_TOKENS), ENV_MAX_TOKENS, 2000)?;
        if max_tokens == 0 {
            return Err(ScriptError::configuration(format!(
                "{} must be positive",
                ENV_MAX_TOKENS
            )));
        }

        Ok(Self {
            openai_key,
            model: get(ENV_MODEL).unwrap_or_else(default_model),
            api_base: get(ENV_BASE_URL)
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or_else(default_api_base),
            max_tokens,
            temperature,
            timeout_secs: parse_or(get(ENV_TIMEOUT_SECS), ENV_TIMEOUT_SECS, 120)?,
            default_length: get(ENV_DEFAULT_LENGTH).unwrap_or_else(default_length),
            default_style: get(ENV_DEFAULT_STYLE).unwrap_or_else(default_style),
            default_audience: get(ENV_DEFAULT_AUDIENCE).unwrap_or_else(default_audience),
            output_dir: get(ENV_OUTPUT_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(default_output_dir),
        })
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, key: &str, fallback: T) -> Result<T, ScriptError> {
    match raw {
        None => Ok(fallback),
        Some(value) => value
            .parse()
            .map_err(|_| ScriptError::configuration(format!("{} has an invalid value: {:?}", key, value))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_api_key_is_a_configuration_error() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert_eq!(err.kind(), "ConfigurationError");
        assert!(err.to_string().contains(ENV_API_KEY));
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let err = Config::from_lookup(lookup_from(&[(ENV_API_KEY, "   ")])).unwrap_err();
        assert_eq!(err.kind(), "ConfigurationError");
    }

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let cfg = Config::from_lookup(lookup_from(&[(ENV_API_KEY, "sk-test")])).unwrap();
        assert_eq!(cfg.openai_key, "sk-test");
        assert_eq!(cfg.model, "gpt-4");
        assert_eq!(cfg.api_base, "https://api.openai.com/v1");
        assert_eq!(cfg.max_tokens, 2000);
        assert!((cfg.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(cfg.timeout_secs, 120);
        assert_eq!(cfg.default_length, "5-10 minutes");
        assert_eq!(cfg.default_style, "educational");
        assert_eq!(cfg.default_audience, "general");
        assert_eq!(cfg.output_dir, PathBuf::from("scripts"));
    }

    #[test]
    fn environment_overrides_defaults() {
        let cfg = Config::from_lookup(lookup_from(&[
            (ENV_API_KEY, "sk-test"),
            (ENV_MODEL, "gpt-4o-mini"),
            (ENV_BASE_URL, "http://localhost:9999/v1/"),
            (ENV_MAX_TOKENS, "512"),
            (ENV_TEMPERATURE, "1.1"),
            (ENV_DEFAULT_STYLE, "entertaining"),
            (ENV_OUTPUT_DIR, "out/scripts"),
        ]))
        .unwrap();

        assert_eq!(cfg.model, "gpt-4o-mini");
        assert_eq!(cfg.api_base, "http://localhost:9999/v1");
        assert_eq!(cfg.max_tokens, 512);
        assert_eq!(cfg.default_style, "entertaining");
        assert_eq!(cfg.output_dir, PathBuf::from("out/scripts"));
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            (ENV_API_KEY, "sk-test"),
            (ENV_MAX_TOKENS, "lots"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains(ENV_MAX_TOKENS));

        let err = Config::from_lookup(lookup_from(&[
            (ENV_API_KEY, "sk-test"),
            (ENV_TEMPERATURE, "3.5"),
        ]))
        .unwrap_err();
        assert_eq!(err.kind(), "ConfigurationError");
    }

    #[test]
    fn missing_env_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.env"))).unwrap_err();
        assert_eq!(err.kind(), "ConfigurationError");
    }
}
