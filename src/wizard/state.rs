//! Wizard state machine: which step a user is on.

use serde::{Deserialize, Serialize};

/// The steps of the estimate wizard.
///
/// Progresses linearly: Start → AwaitingStep1Choice → AwaitingStep2Choice →
/// AwaitingArea → AwaitingStep4Choice → AwaitingContact → Finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Start,
    AwaitingStep1Choice,
    AwaitingStep2Choice,
    AwaitingArea,
    AwaitingStep4Choice,
    AwaitingContact,
    Finalized,
}

impl WizardStep {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: WizardStep) -> bool {
        use WizardStep::*;
        matches!(
            (self, target),
            (Start, AwaitingStep1Choice)
                | (AwaitingStep1Choice, AwaitingStep2Choice)
                | (AwaitingStep2Choice, AwaitingArea)
                | (AwaitingArea, AwaitingStep4Choice)
                | (AwaitingStep4Choice, AwaitingContact)
                | (AwaitingContact, Finalized)
        )
    }

    /// Whether this step is terminal (the run is done).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finalized)
    }

    /// Get the next step in the linear progression, if any.
    pub fn next(&self) -> Option<WizardStep> {
        use WizardStep::*;
        match self {
            Start => Some(AwaitingStep1Choice),
            AwaitingStep1Choice => Some(AwaitingStep2Choice),
            AwaitingStep2Choice => Some(AwaitingArea),
            AwaitingArea => Some(AwaitingStep4Choice),
            AwaitingStep4Choice => Some(AwaitingContact),
            AwaitingContact => Some(Finalized),
            Finalized => None,
        }
    }

    /// The button-driven step expected in this state, if any.
    pub fn expected_choice(&self) -> Option<ChoiceStep> {
        match self {
            Self::AwaitingStep1Choice => Some(ChoiceStep::PropertyType),
            Self::AwaitingStep2Choice => Some(ChoiceStep::Location),
            Self::AwaitingStep4Choice => Some(ChoiceStep::ContactMethod),
            _ => None,
        }
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Start => "start",
            Self::AwaitingStep1Choice => "awaiting_step1_choice",
            Self::AwaitingStep2Choice => "awaiting_step2_choice",
            Self::AwaitingArea => "awaiting_area",
            Self::AwaitingStep4Choice => "awaiting_step4_choice",
            Self::AwaitingContact => "awaiting_contact",
            Self::Finalized => "finalized",
        };
        write!(f, "{s}")
    }
}

/// Which free-text answer, if any, the next text message is for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AwaitingInput {
    /// The user is choosing from buttons.
    #[default]
    NotWaiting,
    AwaitingArea,
    AwaitingContact,
}

/// A button-driven wizard step. Steps 3 and 5 are free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoiceStep {
    /// Step 1.
    PropertyType,
    /// Step 2.
    Location,
    /// Step 4.
    ContactMethod,
}

impl ChoiceStep {
    /// Step number used in `calc_step<N>_<index>` tokens.
    pub fn number(&self) -> u8 {
        match self {
            Self::PropertyType => 1,
            Self::Location => 2,
            Self::ContactMethod => 4,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::PropertyType),
            2 => Some(Self::Location),
            4 => Some(Self::ContactMethod),
            _ => None,
        }
    }
}
