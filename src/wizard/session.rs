//! Per-user wizard session: answers collected so far and the current step.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::{AwaitingInput, ChoiceStep, WizardStep};

/// Stable chat-user identifier correlating independent inbound events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a session refused an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("answer for {attempted} arrived while at {current}")]
    OutOfOrder {
        current: WizardStep,
        attempted: WizardStep,
    },

    #[error("field for {0} is already set")]
    AlreadyAnswered(WizardStep),
}

/// An in-progress wizard run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardSession {
    pub user_id: UserId,
    pub property_type: Option<String>,
    pub location: Option<String>,
    pub area: Option<String>,
    pub contact_method: Option<String>,
    pub contact_info: Option<String>,
    step: WizardStep,
    /// Last time the user touched this run.
    pub touched_at: DateTime<Utc>,
}

impl WizardSession {
    /// A fresh run, waiting for the step-1 choice.
    pub fn start(user_id: UserId) -> Self {
        Self {
            user_id,
            property_type: None,
            location: None,
            area: None,
            contact_method: None,
            contact_info: None,
            step: WizardStep::AwaitingStep1Choice,
            touched_at: Utc::now(),
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    /// How the next free-text message is interpreted.
    pub fn waiting(&self) -> AwaitingInput {
        match self.step {
            WizardStep::AwaitingArea => AwaitingInput::AwaitingArea,
            WizardStep::AwaitingContact => AwaitingInput::AwaitingContact,
            _ => AwaitingInput::NotWaiting,
        }
    }

    /// Store a button selection for `choice` and advance.
    pub fn record_choice(
        &mut self,
        choice: ChoiceStep,
        value: String,
    ) -> Result<WizardStep, TransitionError> {
        let expected = match choice {
            ChoiceStep::PropertyType => WizardStep::AwaitingStep1Choice,
            ChoiceStep::Location => WizardStep::AwaitingStep2Choice,
            ChoiceStep::ContactMethod => WizardStep::AwaitingStep4Choice,
        };
        self.expect(expected)?;
        let slot = match choice {
            ChoiceStep::PropertyType => &mut self.property_type,
            ChoiceStep::Location => &mut self.location,
            ChoiceStep::ContactMethod => &mut self.contact_method,
        };
        write_once(slot, value, expected)?;
        self.advance()
    }

    /// Store the (already validated) area text and advance.
    pub fn record_area(&mut self, raw: String) -> Result<WizardStep, TransitionError> {
        self.expect(WizardStep::AwaitingArea)?;
        write_once(&mut self.area, raw, WizardStep::AwaitingArea)?;
        self.advance()
    }

    /// Store the contact details and advance to `Finalized`.
    pub fn record_contact(&mut self, info: String) -> Result<WizardStep, TransitionError> {
        self.expect(WizardStep::AwaitingContact)?;
        write_once(&mut self.contact_info, info, WizardStep::AwaitingContact)?;
        self.advance()
    }

    /// The full record, if every field is present.
    pub fn complete(&self) -> Option<CompletedApplication> {
        Some(CompletedApplication {
            property_type: self.property_type.clone()?,
            location: self.location.clone()?,
            area: self.area.clone()?,
            contact_method: self.contact_method.clone()?,
            contact_info: self.contact_info.clone()?,
        })
    }

    pub fn touch(&mut self) {
        self.touched_at = Utc::now();
    }

    /// Jump straight to `step` without filling earlier answers.
    #[cfg(test)]
    pub(crate) fn force_step(&mut self, step: WizardStep) {
        self.step = step;
    }

    fn expect(&self, step: WizardStep) -> Result<(), TransitionError> {
        if self.step == step {
            Ok(())
        } else {
            Err(TransitionError::OutOfOrder {
                current: self.step,
                attempted: step,
            })
        }
    }

    fn advance(&mut self) -> Result<WizardStep, TransitionError> {
        let current = self.step;
        let next = current
            .next()
            .filter(|next| current.can_transition_to(*next))
            .ok_or(TransitionError::OutOfOrder {
                current,
                attempted: current,
            })?;
        self.step = next;
        self.touch();
        Ok(next)
    }
}

fn write_once(
    slot: &mut Option<String>,
    value: String,
    step: WizardStep,
) -> Result<(), TransitionError> {
    if slot.is_some() {
        return Err(TransitionError::AlreadyAnswered(step));
    }
    *slot = Some(value);
    Ok(())
}

/// All five answers of a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedApplication {
    pub property_type: String,
    pub location: String,
    pub area: String,
    pub contact_method: String,
    pub contact_info: String,
}
