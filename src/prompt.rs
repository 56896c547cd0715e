use crate::error::ScriptError;
use std::fmt::Write;

pub const SYSTEM_PROMPT: &str = "You are a professional YouTube script writer who creates engaging, well-structured video scripts.";

/// Parameters for one invocation. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub topic: String,
    pub length: String,
    pub style: String,
    pub audience: String,
    pub extra_requirements: Option<String>,
    pub variation_count: u32,
}

impl GenerationRequest {
    pub fn new(
        topic: impl Into<String>,
        length: impl Into<String>,
        style: impl Into<String>,
        audience: impl Into<String>,
        extra_requirements: Option<String>,
        variation_count: u32,
    ) -> Result<Self, ScriptError> {
        let topic = topic.into().trim().to_string();
        if topic.is_empty() {
            return Err(ScriptError::configuration("topic must not be empty"));
        }
        if variation_count == 0 {
            return Err(ScriptError::configuration(
                "variation count must be at least 1",
            ));
        }

        Ok(Self {
            topic,
            length: length.into(),
            style: style.into(),
            audience: audience.into(),
            extra_requirements: extra_requirements
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty()),
            variation_count,
        })
    }
}

pub fn build_prompt(request: &GenerationRequest) -> String {
    let mut prompt = String::new();
    prompt.push_str("Create a YouTube video script with the following specifications:\n\n");
    let _ = writeln!(prompt, "**Topic**: {}", request.topic);
    let _ = writeln!(prompt, "**Video Length**: {}", request.length);
    let _ = writeln!(prompt, "**Style**: {}", request.style);
    let _ = writeln!(prompt, "**Target Audience**: {}", request.audience);
    if let Some(extra) = &request.extra_requirements {
        let _ = writeln!(prompt, "**Additional Requirements**: {}", extra);
    }

    prompt.push_str(
        "\nPlease structure the script with the following sections, using each section name as a heading:\n\n\
         1. **HOOK** (First 15 seconds - grab attention)\n\
         2. **INTRODUCTION** (Introduce yourself and the topic)\n\
         3. **MAIN CONTENT** (Core content broken into clear sections)\n\
         4. **CALL TO ACTION** (Subscribe, like, comment prompts)\n\
         5. **OUTRO** (Wrap up and next video tease)\n\n\
         For each section, provide:\n\
         - The actual script text\n\
         - [Stage directions/notes in brackets]\n\
         - Estimated timing\n\n\
         Make the script engaging, conversational, and optimized for YouTube retention. \
         Include natural pauses and emphasis points.\n",
    );

    prompt
}
