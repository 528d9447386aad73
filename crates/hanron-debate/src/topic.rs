use std::path::Path;

use crate::error::{DebateError, Result};
use crate::state::ThreadContext;

pub const TOPIC_PLACEHOLDER: &str = "<topic>";
pub const DEFLECTION_PLACEHOLDER: &str = "<deflection>";

/// Fixed reply the model is told to give for anything off topic.
pub const OFF_TOPIC_DEFLECTION: &str =
    "That is outside the topic of this debate. Please reset the conversation if you want to debate something new.";

pub const DEFAULT_SYSTEM_INSTRUCTION_TEMPLATE: &str = "\
You are a calm and logical debate opponent.
The topic of this debate is: \"<topic>\"
Rebut the user's claims about this topic using facts and evidence, in a few short sentences.
Stay strictly on this topic. If the user asks about anything unrelated to it, do not answer the question; reply only with:
\"<deflection>\"";

/// Topic and instruction produced by [`TopicBinder::bind`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub topic: String,
    pub system_instruction: String,
}

/// Pins a thread's topic to its first user message and renders the system
/// instruction for a topic.
#[derive(Debug, Clone)]
pub struct TopicBinder {
    template: String,
}

impl Default for TopicBinder {
    fn default() -> Self {
        Self {
            template: DEFAULT_SYSTEM_INSTRUCTION_TEMPLATE.to_string(),
        }
    }
}

impl TopicBinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom instruction template; it must contain `<topic>`.
    pub fn with_template(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        if !template.contains(TOPIC_PLACEHOLDER) {
            return Err(DebateError::Config(format!(
                "system instruction template must contain {}",
                TOPIC_PLACEHOLDER
            )));
        }
        Ok(Self { template })
    }

    pub fn from_template_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let template = std::fs::read_to_string(path).map_err(|e| {
            DebateError::Config(format!("failed to read template {}: {}", path.display(), e))
        })?;
        Self::with_template(template)
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Render the system instruction for `topic`
    pub fn system_instruction(&self, topic: &str) -> String {
        self.template
            .replace(TOPIC_PLACEHOLDER, topic)
            .replace(DEFLECTION_PLACEHOLDER, OFF_TOPIC_DEFLECTION)
    }

    /// Bind the thread's topic from its first user message.
    ///
    /// Fails with [`DebateError::AlreadyBound`] if the thread already has a
    /// topic; the existing topic is left untouched.
    pub fn bind(&self, thread: &mut ThreadContext, first_user_message: &str) -> Result<Binding> {
        if let Some(existing) = thread.topic() {
            return Err(DebateError::AlreadyBound(existing.to_string()));
        }

        let topic = first_user_message.trim();
        if topic.is_empty() {
            return Err(DebateError::Validation("topic cannot be empty".to_string()));
        }

        thread.bind_topic(topic);
        tracing::debug!(topic, "topic bound");

        Ok(Binding {
            topic: topic.to_string(),
            system_instruction: self.system_instruction(topic),
        })
    }
}
