use hanron_llm::Message;
use hanron_persist::{Message as StoredMessage, MessageRole};

use crate::error::{DebateError, Result};
use crate::state::ThreadContext;
use crate::topic::TopicBinder;

/// Builds the message list for one completion
///
/// The system message is rendered from the thread's topic on every call and
/// stored system rows are ignored, so a template change reaches old threads
/// and legacy duplicates never reach the model.
#[derive(Debug, Clone, Default)]
pub struct PromptAssembler {
    binder: TopicBinder,
}

impl PromptAssembler {
    pub fn new(binder: TopicBinder) -> Self {
        Self { binder }
    }

    pub fn binder(&self) -> &TopicBinder {
        &self.binder
    }

    /// `[system, history (user/assistant by sequence)..., user(new_user_text)]`
    pub fn build(
        &self,
        thread: &ThreadContext,
        history: &[StoredMessage],
        new_user_text: &str,
    ) -> Result<Vec<Message>> {
        let topic = thread.topic().ok_or(DebateError::TopicMissing)?;

        let mut ordered: Vec<&StoredMessage> = history
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .collect();
        ordered.sort_by_key(|m| m.sequence);

        let mut prompt = Vec::with_capacity(ordered.len() + 2);
        prompt.push(Message::system(self.binder.system_instruction(topic)));
        prompt.extend(ordered.into_iter().map(Message::from));
        prompt.push(Message::human(new_user_text.trim()));

        Ok(prompt)
    }
}
