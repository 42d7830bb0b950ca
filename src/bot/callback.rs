//! Decoding of inline-button callback tokens.
//!
//! Every raw token is decoded once, at the boundary, into [`CallbackData`];
//! handlers only ever match on the enum.

use std::fmt;

use crate::carousel::{CarouselDomain, Direction};
use crate::error::FlowError;
use crate::wizard::ChoiceStep;

/// A decoded callback token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackData {
    /// `comment_next_3`, `portfolio_prev_0`.
    Navigate {
        domain: CarouselDomain,
        direction: Direction,
        index: usize,
    },

    /// `calc_step2_1`.
    WizardChoice { step: ChoiceStep, index: usize },

    /// Start-menu button; anything without a reserved prefix.
    Menu(String),

    /// A reserved prefix with a malformed tail.
    Invalid(InvalidCallback),
}

/// Which family a malformed token claimed to belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidCallback {
    Navigation,
    Wizard,
}

impl InvalidCallback {
    /// Acknowledgment text for the malformed token.
    pub fn error(&self) -> FlowError {
        match self {
            Self::Navigation => FlowError::InvalidNavigation,
            Self::Wizard => FlowError::InvalidSelection,
        }
    }
}

const WIZARD_PREFIX: &str = "calc_";

impl CallbackData {
    pub fn parse(raw: &str) -> Self {
        if let Some(rest) = raw.strip_prefix(WIZARD_PREFIX) {
            return parse_wizard(rest)
                .unwrap_or(Self::Invalid(InvalidCallback::Wizard));
        }

        for domain in [CarouselDomain::Reviews, CarouselDomain::Portfolio] {
            let Some(rest) = raw
                .strip_prefix(domain.token_prefix())
                .and_then(|r| r.strip_prefix('_'))
            else {
                continue;
            };
            return parse_navigation(domain, rest)
                .unwrap_or(Self::Invalid(InvalidCallback::Navigation));
        }

        Self::Menu(raw.to_string())
    }
}

/// `step<N>_<index>`
fn parse_wizard(rest: &str) -> Option<CallbackData> {
    let (step, index) = rest.strip_prefix("step")?.split_once('_')?;
    let step = ChoiceStep::from_number(parse_decimal(step)?)?;
    Some(CallbackData::WizardChoice {
        step,
        index: parse_decimal(index)?,
    })
}

/// `<prev|next>_<index>`
fn parse_navigation(domain: CarouselDomain, rest: &str) -> Option<CallbackData> {
    let (direction, index) = rest.split_once('_')?;
    Some(CallbackData::Navigate {
        domain,
        direction: direction.parse().ok()?,
        index: parse_decimal(index)?,
    })
}

/// Plain ASCII digits only; no sign, no whitespace.
fn parse_decimal<T: std::str::FromStr>(s: &str) -> Option<T> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl fmt::Display for CallbackData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Navigate {
                domain,
                direction,
                index,
            } => f.write_str(&domain.nav_token(*direction, *index)),
            Self::WizardChoice { step, index } => {
                write!(f, "{WIZARD_PREFIX}step{}_{index}", step.number())
            }
            Self::Menu(token) => f.write_str(token),
            Self::Invalid(InvalidCallback::Navigation) => f.write_str("<invalid navigation>"),
            Self::Invalid(InvalidCallback::Wizard) => f.write_str("<invalid wizard choice>"),
        }
    }
}

/// Token for option `index` of a wizard choice step.
pub fn wizard_token(step: ChoiceStep, index: usize) -> String {
    CallbackData::WizardChoice { step, index }.to_string()
}
