//! Consultation session state machine
//!
//! The wizard cursor walks a fixed order:
//!
//! ```text
//! welcome -> persona -> skin_scan -> environment -> lifestyle -> tpo -> theme -> chat
//! ```
//!
//! Completing a step writes its output into the profile and advances one
//! step; skipping advances without writing; skip-all jumps to `chat` from
//! anywhere before it. The cursor never moves backward and `chat` accepts
//! no further events.

pub mod steps;

use crate::api::PersonaInfo;
use crate::chat::ExpertInfo;
use crate::error::{Result, SilError};
use crate::language::Language;
use crate::profile::{
    wire_enum, FiveVectors, LifestyleVector, SkinAnalysis, ThemeVector, TpoVector, VectorKey,
    VectorValue, WeatherData,
};

wire_enum! {
    /// Position of the wizard cursor
    SessionStep {
        Welcome => "welcome",
        Persona => "persona",
        SkinScan => "skin_scan",
        Environment => "environment",
        Lifestyle => "lifestyle",
        Tpo => "tpo",
        Theme => "theme",
        Chat => "chat",
    }
}

/// Steps that carry a form, in wizard order
pub const WIZARD_STEPS: [SessionStep; 6] = [
    SessionStep::Persona,
    SessionStep::SkinScan,
    SessionStep::Environment,
    SessionStep::Lifestyle,
    SessionStep::Tpo,
    SessionStep::Theme,
];

impl SessionStep {
    /// Step after this one; `chat` is its own successor
    pub fn next(&self) -> SessionStep {
        let pos = SessionStep::ALL
            .iter()
            .position(|s| s == self)
            .unwrap_or(SessionStep::ALL.len() - 1);
        SessionStep::ALL
            .get(pos + 1)
            .copied()
            .unwrap_or(SessionStep::Chat)
    }

    pub fn is_terminal(&self) -> bool {
        *self == SessionStep::Chat
    }

    /// Profile slot this step writes, if any
    pub fn vector_key(&self) -> Option<VectorKey> {
        match self {
            SessionStep::SkinScan => Some(VectorKey::User),
            SessionStep::Environment => Some(VectorKey::Environment),
            SessionStep::Lifestyle => Some(VectorKey::Lifestyle),
            SessionStep::Tpo => Some(VectorKey::Tpo),
            SessionStep::Theme => Some(VectorKey::Theme),
            _ => None,
        }
    }

    /// Short label for progress displays
    pub fn label(&self, language: Language) -> &'static str {
        match self {
            SessionStep::Welcome => language.t("welcome_title"),
            SessionStep::Persona => language.t("step_persona"),
            SessionStep::SkinScan => language.t("step_skin_scan"),
            SessionStep::Environment => language.t("step_environment"),
            SessionStep::Lifestyle => language.t("step_lifestyle"),
            SessionStep::Tpo => language.t("step_tpo"),
            SessionStep::Theme => language.t("step_theme"),
            SessionStep::Chat => "chat",
        }
    }
}

/// Finished result of one step's form
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutput {
    Persona(PersonaInfo),
    SkinScan(SkinAnalysis),
    Environment(WeatherData),
    Lifestyle(LifestyleVector),
    Tpo(TpoVector),
    Theme(ThemeVector),
}

impl StepOutput {
    /// Step that produces this output
    pub fn step(&self) -> SessionStep {
        match self {
            StepOutput::Persona(_) => SessionStep::Persona,
            StepOutput::SkinScan(_) => SessionStep::SkinScan,
            StepOutput::Environment(_) => SessionStep::Environment,
            StepOutput::Lifestyle(_) => SessionStep::Lifestyle,
            StepOutput::Tpo(_) => SessionStep::Tpo,
            StepOutput::Theme(_) => SessionStep::Theme,
        }
    }
}

/// Input to the machine
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Leave the welcome screen into the wizard
    Start,
    /// The current step's form was submitted
    Complete(StepOutput),
    /// Advance without recording anything
    Skip,
    /// Jump straight to chat
    SkipAll,
}

impl SessionEvent {
    fn name(&self) -> &'static str {
        match self {
            SessionEvent::Start => "start",
            SessionEvent::Complete(_) => "complete",
            SessionEvent::Skip => "skip",
            SessionEvent::SkipAll => "skip_all",
        }
    }
}

/// Result of an accepted event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: SessionStep,
    pub to: SessionStep,
    /// Slot written by this event, if any
    pub written: Option<VectorKey>,
}

/// Everything the chat view starts from
#[derive(Debug, Clone, PartialEq)]
pub struct ChatContext {
    pub vectors: FiveVectors,
    pub expert: ExpertInfo,
    pub persona: Option<PersonaInfo>,
}

/// Wizard cursor plus the profile it accumulates
#[derive(Debug, Clone)]
pub struct SessionMachine {
    step: SessionStep,
    profile: FiveVectors,
    persona: Option<PersonaInfo>,
    expert: ExpertInfo,
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionMachine {
    /// A fresh session on the welcome screen
    pub fn new() -> Self {
        Self {
            step: SessionStep::Welcome,
            profile: FiveVectors::default(),
            persona: None,
            expert: ExpertInfo::system_default(),
        }
    }

    pub fn step(&self) -> SessionStep {
        self.step
    }

    pub fn profile(&self) -> &FiveVectors {
        &self.profile
    }

    pub fn persona(&self) -> Option<&PersonaInfo> {
        self.persona.as_ref()
    }

    pub fn expert(&self) -> &ExpertInfo {
        &self.expert
    }

    pub fn is_chat(&self) -> bool {
        self.step.is_terminal()
    }

    /// Position within [`WIZARD_STEPS`] (1-based), for progress displays
    pub fn wizard_position(&self) -> Option<usize> {
        WIZARD_STEPS.iter().position(|s| *s == self.step).map(|i| i + 1)
    }

    /// Chat starting state, available once the cursor reached `chat`
    pub fn chat_context(&self) -> Option<ChatContext> {
        self.is_chat().then(|| ChatContext {
            vectors: self.profile.clone(),
            expert: self.expert.clone(),
            persona: self.persona.clone(),
        })
    }

    fn reject(&self, event: &SessionEvent) -> anyhow::Error {
        tracing::debug!(step = %self.step, action = event.name(), "Rejected session event");
        SilError::InvalidTransition {
            step: self.step.to_string(),
            action: event.name().to_string(),
        }
        .into()
    }

    /// Apply one event
    ///
    /// # Errors
    ///
    /// Returns [`SilError::InvalidTransition`] for events the current step
    /// does not accept, including any event once in `chat` and a completion
    /// whose output belongs to another step. State is unchanged on error.
    ///
    /// # Examples
    ///
    /// ```
    /// use sil_consult::session::{SessionEvent, SessionMachine, SessionStep};
    ///
    /// let mut session = SessionMachine::new();
    /// session.apply(SessionEvent::Start).unwrap();
    /// assert_eq!(session.step(), SessionStep::Persona);
    /// session.apply(SessionEvent::SkipAll).unwrap();
    /// assert!(session.is_chat());
    /// assert!(session.apply(SessionEvent::Skip).is_err());
    /// ```
    pub fn apply(&mut self, event: SessionEvent) -> Result<Transition> {
        let from = self.step;
        if from.is_terminal() {
            return Err(self.reject(&event));
        }

        let to = match (&event, from) {
            (SessionEvent::SkipAll, _) => SessionStep::Chat,
            (SessionEvent::Start, SessionStep::Welcome) | (SessionEvent::Skip, _) => from.next(),
            (SessionEvent::Complete(output), step) if output.step() == step => from.next(),
            _ => return Err(self.reject(&event)),
        };

        let written = match event {
            SessionEvent::Complete(output) => self.record(output),
            _ => None,
        };

        self.step = to;
        tracing::info!(from = %from, to = %to, written = ?written, "Session advanced");
        Ok(Transition { from, to, written })
    }

    fn record(&mut self, output: StepOutput) -> Option<VectorKey> {
        let value = match output {
            StepOutput::Persona(persona) => {
                self.expert = persona.to_expert();
                self.persona = Some(persona);
                return None;
            }
            StepOutput::SkinScan(v) => VectorValue::User(v),
            StepOutput::Environment(v) => VectorValue::Environment(v),
            StepOutput::Lifestyle(v) => VectorValue::Lifestyle(v),
            StepOutput::Tpo(v) => VectorValue::Tpo(v),
            StepOutput::Theme(v) => VectorValue::Theme(v),
        };
        let key = value.key();
        self.profile.set_vector(value);
        Some(key)
    }
}
