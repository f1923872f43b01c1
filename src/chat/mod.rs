//! Chat controller
//!
//! [`ChatController`] owns the message log. Each submission goes through
//! three delivery tiers:
//!
//! 1. a streamed reply, written into a placeholder assistant message as
//!    fragments arrive;
//! 2. on any stream failure, the placeholder is removed and a single
//!    non-streaming consult call is made with the same request;
//! 3. if that fails too, a canned reply attributed to the current expert.
//!
//! No backend error escapes [`ChatController::send`]; it only fails for
//! empty input or an overlapping submission. Every change to the log is
//! also published as a [`ChatEvent`] so a front end can render it.

pub mod message;
pub mod prompts;

pub use message::{ChatMessage, ExpertInfo, MessageRole};

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc::UnboundedSender;

use crate::api::types::PersonaInfo;
use crate::api::{ConsultApi, ConsultRequest, HistoryEntry};
use crate::error::{Result, SilError};
use crate::language::Language;
use crate::profile::FiveVectors;

/// Change to the message log or the loading indicator
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// A message was appended to the end of the log
    MessageAppended(ChatMessage),
    /// A message's content was replaced (streaming growth)
    MessageUpdated { id: String, content: String },
    /// A message was removed from the log
    MessageRemoved { id: String },
    /// The "awaiting reply" indicator changed
    Loading(bool),
}

/// Which tier produced the reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Streamed,
    Consulted,
    Demo,
}

#[derive(Debug)]
struct ChatState {
    messages: Vec<ChatMessage>,
    expert: ExpertInfo,
    persona_id: Option<String>,
    language: Language,
    awaiting_reply: bool,
}

/// Drives the message log for one consultation
pub struct ChatController {
    api: Arc<dyn ConsultApi>,
    default_persona_id: String,
    state: Mutex<ChatState>,
    events: Option<UnboundedSender<ChatEvent>>,
}

impl std::fmt::Debug for ChatController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatController")
            .field("default_persona_id", &self.default_persona_id)
            .field("state", &self.state)
            .finish()
    }
}

/// Clears the pending flag however the submission ends
///
/// While `placeholder` is set the stream tier has not settled; dropping the
/// guard then removes the unfinished assistant message.
struct PendingReply<'a> {
    controller: &'a ChatController,
    placeholder: Option<String>,
}

impl Drop for PendingReply<'_> {
    fn drop(&mut self) {
        if let Some(id) = self.placeholder.take() {
            tracing::debug!("Submission dropped mid-stream, removing placeholder");
            self.controller.remove_message(&id);
        }
        self.controller.lock().awaiting_reply = false;
        self.controller.emit(ChatEvent::Loading(false));
    }
}

impl ChatController {
    /// Create a controller with an empty log and the default expert
    ///
    /// # Arguments
    ///
    /// * `api` - Consult backend
    /// * `language` - Reply language
    /// * `default_persona_id` - Persona sent while none has been chosen
    pub fn new(
        api: Arc<dyn ConsultApi>,
        language: Language,
        default_persona_id: impl Into<String>,
    ) -> Self {
        Self {
            api,
            default_persona_id: default_persona_id.into(),
            state: Mutex::new(ChatState {
                messages: Vec::new(),
                expert: ExpertInfo::system_default(),
                persona_id: None,
                language,
                awaiting_reply: false,
            }),
            events: None,
        }
    }

    /// Publish log changes on `events`
    pub fn with_events(mut self, events: UnboundedSender<ChatEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Start with `expert` as the replying identity
    pub fn with_expert(self, expert: ExpertInfo) -> Self {
        self.lock().expert = expert;
        self
    }

    fn lock(&self) -> MutexGuard<'_, ChatState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn emit(&self, event: ChatEvent) {
        if let Some(tx) = &self.events {
            // A closed receiver only means nobody is rendering
            let _ = tx.send(event);
        }
    }

    /// Adopt a persona as the replying expert
    pub fn select_persona(&self, persona: &PersonaInfo) {
        tracing::info!(persona = %persona.id, "Persona selected");
        let mut state = self.lock();
        state.persona_id = Some(persona.id.clone());
        state.expert = persona.to_expert();
    }

    pub fn set_expert(&self, expert: ExpertInfo) {
        self.lock().expert = expert;
    }

    pub fn expert(&self) -> ExpertInfo {
        self.lock().expert.clone()
    }

    pub fn set_language(&self, language: Language) {
        self.lock().language = language;
    }

    pub fn language(&self) -> Language {
        self.lock().language
    }

    /// Snapshot of the log, in display order
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.lock().messages.clone()
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.lock().awaiting_reply
    }

    /// Suggestions to show; empty once the conversation has started
    pub fn quick_prompts(&self, vectors: &FiveVectors) -> Vec<String> {
        let state = self.lock();
        if !state.messages.is_empty() {
            return Vec::new();
        }
        prompts::quick_prompts(vectors.user.as_ref(), state.language)
    }

    /// Submit one user message and deliver a reply
    ///
    /// # Errors
    ///
    /// Returns [`SilError::Validation`] for blank input and
    /// [`SilError::Busy`] while another reply is pending; the log is left
    /// untouched in both cases. Backend failures never surface here.
    pub async fn send(&self, content: &str, vectors: &FiveVectors) -> Result<Delivery> {
        let content = content.trim();
        if content.is_empty() {
            return Err(SilError::Validation("Message cannot be empty".to_string()).into());
        }

        let (request, placeholder_id) = {
            let mut state = self.lock();
            if state.awaiting_reply {
                tracing::debug!("Rejected submission while a reply is pending");
                return Err(SilError::Busy.into());
            }
            state.awaiting_reply = true;

            let history: Vec<HistoryEntry> =
                state.messages.iter().map(HistoryEntry::from).collect();

            let user = ChatMessage::user(content);
            state.messages.push(user.clone());
            self.emit(ChatEvent::MessageAppended(user));
            self.emit(ChatEvent::Loading(true));

            let placeholder = ChatMessage::assistant("", state.expert.clone());
            let placeholder_id = placeholder.id.clone();
            state.messages.push(placeholder.clone());
            self.emit(ChatEvent::MessageAppended(placeholder));

            let request = ConsultRequest {
                message: content.to_string(),
                vectors: vectors.clone(),
                language: state.language,
                history,
                persona_id: Some(
                    state
                        .persona_id
                        .clone()
                        .unwrap_or_else(|| self.default_persona_id.clone()),
                ),
            };
            (request, placeholder_id)
        };
        let mut pending = PendingReply {
            controller: self,
            placeholder: Some(placeholder_id.clone()),
        };

        let streamed = self.stream_into(&placeholder_id, &request).await;
        pending.placeholder = None;
        if let Err(e) = streamed {
            tracing::warn!("Streaming reply failed, falling back to consult: {:#}", e);
            self.remove_message(&placeholder_id);
        } else {
            tracing::debug!("Reply streamed");
            return Ok(Delivery::Streamed);
        }

        match self.api.consult(&request).await {
            Ok(response) => {
                let mut state = self.lock();
                if let Some(expert) = &response.expert {
                    tracing::info!(expert = %expert.name, "Backend assigned expert");
                    state.expert = expert.clone();
                }
                let reply = ChatMessage::assistant(response.reply, state.expert.clone());
                state.messages.push(reply.clone());
                self.emit(ChatEvent::MessageAppended(reply));
                Ok(Delivery::Consulted)
            }
            Err(e) => {
                tracing::warn!("Consult failed, showing demo reply: {:#}", e);
                let mut state = self.lock();
                let text = prompts::demo_response(&state.expert, state.language);
                let reply = ChatMessage::assistant(text, state.expert.clone());
                state.messages.push(reply.clone());
                self.emit(ChatEvent::MessageAppended(reply));
                Ok(Delivery::Demo)
            }
        }
    }

    /// Tier 1: grow the placeholder with each fragment
    async fn stream_into(&self, placeholder_id: &str, request: &ConsultRequest) -> Result<()> {
        let mut stream = self.api.consult_stream(request).await?;
        let mut accumulated = String::new();

        while let Some(fragment) = stream.next_fragment().await {
            accumulated.push_str(&fragment?);
            self.update_message(placeholder_id, &accumulated);
        }
        Ok(())
    }

    fn update_message(&self, id: &str, content: &str) {
        let mut state = self.lock();
        if let Some(message) = state.messages.iter_mut().find(|m| m.id == id) {
            message.content = content.to_string();
            self.emit(ChatEvent::MessageUpdated {
                id: id.to_string(),
                content: content.to_string(),
            });
        }
    }

    fn remove_message(&self, id: &str) {
        let mut state = self.lock();
        let before = state.messages.len();
        state.messages.retain(|m| m.id != id);
        if state.messages.len() != before {
            self.emit(ChatEvent::MessageRemoved { id: id.to_string() });
        }
    }
}
