use once_cell::sync::Lazy;
use std::sync::{Arc, Mutex};

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod output;
pub mod prompt;
pub mod script;

pub use error::ScriptError;

pub type LogHook = Arc<Mutex<dyn Fn(&str) + Send + Sync + 'static>>;

static LOG_HOOK: Lazy<Mutex<Option<LogHook>>> = Lazy::new(|| Mutex::new(None));

/// Installs a callback that sees every progress line, or removes it with `None`.
pub fn set_log_hook(hook: Option<LogHook>) {
    if let Ok(mut guard) = LOG_HOOK.lock() {
        *guard = hook;
    }
}

pub(crate) fn logv(tag: &str, message: &str) {
    let line = format!("[{}] {}", tag, message);
    eprintln!("{}", line);

    if let Ok(guard) = LOG_HOOK.lock() {
        if let Some(hook) = guard.as_ref() {
            if let Ok(callback) = hook.lock() {
                callback(&line);
            }
        }
    }
}

pub fn logi(message: impl AsRef<str>) {
    logv("INFO", message.as_ref());
}

pub fn logok(message: impl AsRef<str>) {
    logv("OK", message.as_ref());
}

pub fn logw(message: impl AsRef<str>) {
    logv("WARN", message.as_ref());
}
