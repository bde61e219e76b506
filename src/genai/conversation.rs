// src/genai/conversation.rs
// Multi-turn tutor conversation over any GenerativeModel

use crate::error::{LexiError, Result};
use crate::genai::client::GenerativeModel;
use crate::genai::types::{
    Content, GenerateContentRequest, Generation, LiveConfig, LiveGenerationConfig, Tool,
};
use crate::user::UserSettings;
use tracing::debug;

/// Conversation history plus the configuration sent with every turn
pub struct Conversation<M: GenerativeModel> {
    model: M,
    system_instruction: Option<Content>,
    generation_config: Option<LiveGenerationConfig>,
    tools: Vec<Tool>,
    history: Vec<Content>,
}

impl<M: GenerativeModel> Conversation<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            system_instruction: None,
            generation_config: None,
            tools: Vec::new(),
            history: Vec::new(),
        }
    }

    /// Take instruction, generation settings and tools from a live config.
    /// The model itself is whatever `model` points at.
    pub fn from_live_config(model: M, config: LiveConfig) -> Self {
        Self {
            model,
            system_instruction: config.system_instruction,
            generation_config: config.generation_config,
            tools: config.tools,
            history: Vec::new(),
        }
    }

    pub fn with_system_instruction(mut self, text: impl Into<String>) -> Self {
        self.system_instruction = Some(Content::system(text));
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn history(&self) -> &[Content] {
        &self.history
    }

    /// Send one user message. History only grows when the model answers.
    pub async fn send(&mut self, text: &str) -> Result<String> {
        Ok(self.send_turn(text).await?.text)
    }

    pub async fn send_turn(&mut self, text: &str) -> Result<Generation> {
        if text.trim().is_empty() {
            return Err(LexiError::invalid_input("message must not be empty"));
        }

        let user_turn = Content::user(text);
        let mut contents = self.history.clone();
        contents.push(user_turn.clone());

        let request = GenerateContentRequest {
            contents,
            system_instruction: self.system_instruction.clone(),
            generation_config: self.generation_config.clone(),
            tools: self.tools.clone(),
        };
        let generation = self.model.generate(&request).await?;

        self.history.push(user_turn);
        self.history.push(Content::model(generation.text.clone()));
        debug!(
            model = self.model.model_name(),
            turns = self.history.len(),
            "Conversation turn recorded"
        );
        Ok(generation)
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}

/// System instruction for the tutor persona, shaped by the user's settings
pub fn tutor_instruction(settings: &UserSettings) -> String {
    let pick = |value: &str, fallback: &str| {
        let value = value.trim();
        if value.is_empty() {
            fallback.to_string()
        } else {
            value.to_string()
        }
    };

    let mut instruction = format!(
        "You are Lexi, a patient language tutor. The learner is practicing {} at {} level.",
        pick(&settings.language_id, "the language they choose"),
        pick(&settings.level, "a beginner"),
    );
    if !settings.topic_id.trim().is_empty() {
        instruction.push_str(&format!(
            " Keep the conversation on the topic of {}.",
            settings.topic_id.trim()
        ));
    }
    if !settings.style_id.trim().is_empty() {
        instruction.push_str(&format!(
            " Speak in a {} style.",
            settings.style_id.trim()
        ));
    }
    instruction.push_str(
        " Reply in the target language, keep answers short, and gently correct mistakes.",
    );
    instruction
}

/// Live config for a tutor session with this user
pub fn tutor_config(settings: &UserSettings, model: &str) -> LiveConfig {
    LiveConfig::new(model).with_system_instruction(tutor_instruction(settings))
}
