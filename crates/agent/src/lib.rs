//! The Ask PanDA agent.
//!
//! Each turn follows a **Route → Ask → Record** cycle:
//!
//! 1. **Record** the user's question in the conversation
//! 2. **Route** it to a domain client (explicit hint or keyword match)
//! 3. **Ask** the model to answer from the client's data
//! 4. **Record** the model's reply
//!
//! Plain chat turns skip the routing step. Conversations live in
//! caller-owned [`askpanda_memory::ContextStore`]s.

pub mod assistant;
pub mod stream_event;

#[cfg(test)]
mod test_helpers;

pub use assistant::{Agent, AgentSettings, QueryOutcome};
pub use stream_event::AgentStreamEvent;
