//! Estimate wizard: five-step guided input collected across independent
//! chat events.
//!
//! Each user has at most one run in the [`SessionStore`]. Button steps
//! (property type, location, contact method) arrive as callback tokens,
//! the area and contact details arrive as free text. The [`WizardEngine`]
//! validates every event against the session's current [`WizardStep`] and
//! answers with [`Reply`](crate::bot::Reply) instructions.

pub mod engine;
pub mod session;
pub mod state;
pub mod store;

pub use engine::{WizardEngine, parse_area};
pub use session::{CompletedApplication, TransitionError, UserId, WizardSession};
pub use state::{AwaitingInput, ChoiceStep, WizardStep};
pub use store::{InMemorySessionStore, SessionStore, spawn_idle_sweeper};
