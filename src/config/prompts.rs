//! Assistant identity, personalities and mode instructions
//!
//! The system instruction sent with every generation is assembled here from
//! the active personality, the study/code mode flags, the deep-search flag and
//! the user's memory context.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tone the assistant adopts for a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Personality {
    #[default]
    Tutor,
    Programmer,
    Thinker,
    Chill,
    Storyteller,
}

impl Personality {
    pub const ALL: [Personality; 5] = [
        Personality::Tutor,
        Personality::Programmer,
        Personality::Thinker,
        Personality::Chill,
        Personality::Storyteller,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Personality::Tutor => "tutor",
            Personality::Programmer => "programmer",
            Personality::Thinker => "thinker",
            Personality::Chill => "chill",
            Personality::Storyteller => "storyteller",
        }
    }

    pub fn instruction(&self) -> &'static str {
        match self {
            Personality::Tutor => builtin::TUTOR,
            Personality::Programmer => builtin::PROGRAMMER,
            Personality::Thinker => builtin::THINKER,
            Personality::Chill => builtin::CHILL,
            Personality::Storyteller => builtin::STORYTELLER,
        }
    }

    pub fn temperature(&self) -> f32 {
        match self {
            Personality::Thinker => 0.8,
            _ => 0.6,
        }
    }
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown personality name
#[derive(Debug, thiserror::Error)]
#[error("Unknown personality: {0}")]
pub struct UnknownPersonality(pub String);

impl FromStr for Personality {
    type Err = UnknownPersonality;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Personality::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownPersonality(s.to_string()))
    }
}

/// Per-send switches that shape the system instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptOptions {
    #[serde(default = "default_deep_search")]
    pub deep_search: bool,
    #[serde(default)]
    pub personality: Personality,
    #[serde(default)]
    pub code_mode: bool,
    #[serde(default)]
    pub study_mode: bool,
}

fn default_deep_search() -> bool {
    true
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            deep_search: default_deep_search(),
            personality: Personality::default(),
            code_mode: false,
            study_mode: false,
        }
    }
}

/// Assemble the system instruction for one generation
pub fn system_instruction(options: &PromptOptions, memory_context: &str) -> String {
    let mut sections = vec![format!(
        "Identity: {}. Creator: {}. Deep Search: {}.",
        builtin::IDENTITY,
        builtin::CREATOR,
        if options.deep_search { "ENABLED" } else { "DISABLED" }
    )];

    if options.study_mode {
        sections.push(builtin::STUDY_MODE.to_string());
    }
    if options.code_mode {
        sections.push(builtin::CODE_MODE.to_string());
    }

    sections.push(format!(
        "Personality: {}. {}",
        options.personality,
        options.personality.instruction()
    ));
    sections.push(builtin::RESEARCH.to_string());

    if !memory_context.trim().is_empty() {
        sections.push(format!(
            "What you remember about this user:\n{}",
            memory_context.trim_end()
        ));
    }

    sections.join("\n\n")
}

/// Built-in prompt text
pub mod builtin {
    pub const IDENTITY: &str = "Helpfulat Assistant";

    pub const CREATOR: &str = "Bodinizo";

    pub const RESEARCH: &str = "When users ask for research or deep information, provide comprehensive, well-researched answers with citations to sources where possible.";

    pub const STUDY_MODE: &str = "You are in STUDY MODE. Guide the student toward the answer instead of giving it immediately. Provide educational content with explanations, examples, and learning resources. Structure responses with clear sections and learning objectives.";

    pub const CODE_MODE: &str = "You are in CODE MODE. Provide well-commented code examples, best practices, and technical explanations. Format code blocks clearly and explain the logic.";

    pub const TUTOR: &str = "Tone: Patient and encouraging. Break ideas into small steps, check understanding, and use simple examples.";

    pub const PROGRAMMER: &str = "Tone: Precise and practical. Prefer working code, name trade-offs, and point out edge cases.";

    pub const THINKER: &str = "Tone: Analytical, detailed, and thoughtful. Provide in-depth analysis, consider multiple perspectives, and explain the reasoning behind your answers.";

    pub const CHILL: &str = "Tone: Casual, friendly, and approachable. Use conversational language and emojis when appropriate. Keep responses concise and easy to understand.";

    pub const STORYTELLER: &str = "Tone: Vivid and imaginative. Explain through stories, analogies, and characters while keeping the facts straight.";
}
