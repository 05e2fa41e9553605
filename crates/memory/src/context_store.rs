//! Per-conversation context store.
//!
//! Holds a capacity-bounded message history (oldest evicted first) and an
//! unbounded scratch map for arbitrary key/value context. Each conversation
//! owns its own store; nothing here is shared or locked.

use askpanda_core::message::{ChatMessage, Message, MessageRecord, Role};
use std::collections::{HashMap, VecDeque};

/// Default number of retained messages.
pub const DEFAULT_MAX_MESSAGES: usize = 100;

/// Default advisory token budget.
pub const DEFAULT_MAX_TOKENS: usize = 4000;

/// Free-form key/value context kept alongside the message history.
///
/// Independent of the message sequence and never evicted.
#[derive(Debug, Clone, Default)]
pub struct Scratch {
    entries: HashMap<String, serde_json::Value>,
}

impl Scratch {
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.entries.get(key)
    }

    /// Insert or replace a value.
    pub fn set(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.entries.insert(key.into(), value);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Bounded conversation history plus scratch context.
#[derive(Debug, Clone)]
pub struct ContextStore {
    messages: VecDeque<Message>,
    max_messages: usize,
    /// Advisory only. Stored and reported, never used to trim history.
    max_tokens: usize,
    scratch: Scratch,
}

impl ContextStore {
    pub fn new(max_messages: usize, max_tokens: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(max_messages.min(DEFAULT_MAX_MESSAGES)),
            max_messages,
            max_tokens,
            scratch: Scratch::default(),
        }
    }

    /// Append a message stamped with the current time.
    ///
    /// At capacity, exactly one oldest message is evicted.
    pub fn add(
        &mut self,
        role: Role,
        content: impl Into<String>,
        metadata: Option<serde_json::Map<String, serde_json::Value>>,
    ) {
        let mut message = Message::new(role, content);
        if let Some(metadata) = metadata {
            message = message.with_metadata(metadata);
        }
        self.push(message);
    }

    pub fn add_user(&mut self, content: impl Into<String>) {
        self.add(Role::User, content, None);
    }

    pub fn add_assistant(&mut self, content: impl Into<String>) {
        self.add(Role::Assistant, content, None);
    }

    pub fn add_system(&mut self, content: impl Into<String>) {
        self.add(Role::System, content, None);
    }

    fn push(&mut self, message: Message) {
        if self.max_messages == 0 {
            return;
        }
        if self.messages.len() == self.max_messages {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
        tracing::trace!(retained = self.messages.len(), "Context message added");
    }

    /// Retained messages oldest-first, or only the most recent `limit`.
    pub fn messages(&self, limit: Option<usize>) -> Vec<MessageRecord> {
        let skip = match limit {
            Some(n) => self.messages.len().saturating_sub(n),
            None => 0,
        };
        self.messages.iter().skip(skip).map(Message::to_record).collect()
    }

    /// The `{role, content}` projection sent to model backends.
    pub fn chat_projection(&self) -> Vec<ChatMessage> {
        self.messages.iter().map(Message::to_chat).collect()
    }

    pub fn scratch(&self) -> &Scratch {
        &self.scratch
    }

    pub fn scratch_mut(&mut self) -> &mut Scratch {
        &mut self.scratch
    }

    /// Empty the message history only.
    pub fn clear_messages(&mut self) {
        self.messages.clear();
    }

    /// Empty both the message history and the scratch map.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.scratch.clear();
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }
}

impl Default for ContextStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGES, DEFAULT_MAX_TOKENS)
    }
}
