use hanron_persist::{Message, MessageRole, Thread};

use crate::identity::Identity;

/// Thread id recorded on guest transcript messages.
pub const GUEST_THREAD_ID: &str = "guest";

/// Where the session is in the turn lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No thread selected.
    Idle,
    /// A thread is selected but its topic is not bound yet.
    AwaitingTopic,
    /// The thread's topic is bound; every submission is a regular turn.
    Active,
}

/// The session's view of its active thread
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadContext {
    thread_id: Option<String>,
    title: Option<String>,
    topic: Option<String>,
}

impl ThreadContext {
    /// A thread that exists only in the session so far
    pub fn draft() -> Self {
        Self::default()
    }

    pub fn from_thread(thread: &Thread) -> Self {
        Self {
            thread_id: Some(thread.id.clone()),
            title: Some(thread.title.clone()),
            topic: thread.topic.clone(),
        }
    }

    /// Store id; `None` for guest threads and threads not created yet
    pub fn thread_id(&self) -> Option<&str> {
        self.thread_id.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    pub fn is_bound(&self) -> bool {
        self.topic.is_some()
    }

    pub(crate) fn bind_topic(&mut self, topic: &str) {
        self.topic = Some(topic.to_string());
        if self.title.is_none() {
            self.title = Some(topic.to_string());
        }
    }

    pub(crate) fn set_thread_id(&mut self, thread_id: String) {
        self.thread_id = Some(thread_id);
    }
}

/// Unsaved history of a guest conversation
#[derive(Debug, Clone, Default)]
pub struct GuestTranscript {
    messages: Vec<Message>,
    next_sequence: u64,
}

impl GuestTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return its sequence (starting at 1)
    pub fn push(&mut self, role: MessageRole, content: &str) -> u64 {
        self.next_sequence += 1;
        let sequence = self.next_sequence;
        self.messages
            .push(Message::new(GUEST_THREAD_ID, role, content, sequence));
        sequence
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.next_sequence = 0;
    }
}

/// Per-connection state, owned by the caller and passed to every
/// [`ConversationSession`](crate::ConversationSession) operation.
#[derive(Debug, Default)]
pub struct SessionState {
    pub(crate) user: Option<Identity>,
    pub(crate) active: Option<ThreadContext>,
    pub(crate) guest: GuestTranscript,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(&self) -> Option<&Identity> {
        self.user.as_ref()
    }

    pub fn is_guest(&self) -> bool {
        self.user.is_none()
    }

    pub fn active_thread(&self) -> Option<&ThreadContext> {
        self.active.as_ref()
    }

    pub fn guest_transcript(&self) -> &GuestTranscript {
        &self.guest
    }

    pub fn phase(&self) -> SessionPhase {
        match &self.active {
            None => SessionPhase::Idle,
            Some(thread) if thread.is_bound() => SessionPhase::Active,
            Some(_) => SessionPhase::AwaitingTopic,
        }
    }

    pub(crate) fn owner_id(&self) -> Option<String> {
        self.user.as_ref().map(|u| u.user_id.clone())
    }

    /// Forget everything except the signed-in user
    pub(crate) fn detach(&mut self) {
        self.active = None;
        self.guest.clear();
    }

    pub(crate) fn sign_in(&mut self, identity: Identity) {
        self.detach();
        self.user = Some(identity);
    }

    pub(crate) fn sign_out(&mut self) {
        self.detach();
        self.user = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_follows_active_thread() {
        let mut state = SessionState::new();
        assert_eq!(state.phase(), SessionPhase::Idle);

        state.active = Some(ThreadContext::draft());
        assert_eq!(state.phase(), SessionPhase::AwaitingTopic);

        if let Some(thread) = state.active.as_mut() {
            thread.bind_topic("Cats are better than dogs.");
        }
        assert_eq!(state.phase(), SessionPhase::Active);

        state.detach();
        assert_eq!(state.phase(), SessionPhase::Idle);
    }

    #[test]
    fn test_guest_transcript_sequences() {
        let mut transcript = GuestTranscript::new();
        assert_eq!(transcript.push(MessageRole::User, "claim"), 1);
        assert_eq!(transcript.push(MessageRole::Assistant, "rebuttal"), 2);
        assert_eq!(transcript.messages()[1].thread_id, GUEST_THREAD_ID);

        transcript.clear();
        assert!(transcript.is_empty());
        assert_eq!(transcript.push(MessageRole::User, "again"), 1);
    }

    #[test]
    fn test_sign_in_discards_guest_data() {
        let mut state = SessionState::new();
        state.guest.push(MessageRole::User, "claim");
        state.active = Some(ThreadContext::draft());

        state.sign_in(Identity {
            user_id: "u1".to_string(),
            email: "a@example.com".to_string(),
        });

        assert!(!state.is_guest());
        assert!(state.guest_transcript().is_empty());
        assert_eq!(state.phase(), SessionPhase::Idle);
        assert_eq!(state.owner_id().as_deref(), Some("u1"));
    }
}
