use crate::error::ScriptError;
use async_trait::async_trait;

pub mod openai;

/// A text-generation backend that turns a prompt into one raw completion.
#[async_trait]
pub trait ScriptProvider: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, ScriptError>;
}
