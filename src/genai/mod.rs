// src/genai/mod.rs
// Gemini integration for the Lexi tutor

mod client;
mod conversation;
mod types;

pub use client::{GeminiClient, GenerativeModel};
pub use conversation::{Conversation, tutor_config, tutor_instruction};
pub use types::{
    Candidate, Content, FunctionDeclaration, GenerateContentRequest, GenerateContentResponse,
    Generation, LiveConfig, LiveGenerationConfig, Part, PrebuiltVoiceConfig, ResponseModality,
    SpeechConfig, Tool, UsageMetadata, VoiceConfig, VoiceName,
};

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
