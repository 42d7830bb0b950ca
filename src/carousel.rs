//! Previous/next browsing over an ordered collection.
//!
//! Nothing is stored between presses: the current position travels in the
//! button payload and comes back with the next callback.

use std::fmt;
use std::str::FromStr;

/// Which way the user pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Prev,
    Next,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prev => "prev",
            Self::Next => "next",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prev" => Ok(Self::Prev),
            "next" => Ok(Self::Next),
            _ => Err(()),
        }
    }
}

/// Index shown after pressing `direction` on item `current`, wrapping at
/// both ends.
///
/// Returns `None` for an empty collection or a `current` outside
/// `0..len`; callers render those as "nothing to show" and "not found".
pub fn next_index(current: usize, direction: Direction, len: usize) -> Option<usize> {
    if current >= len {
        return None;
    }
    let next = match direction {
        Direction::Next if current == len - 1 => 0,
        Direction::Next => current + 1,
        Direction::Prev if current == 0 => len - 1,
        Direction::Prev => current - 1,
    };
    Some(next)
}

/// A browsable collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CarouselDomain {
    Reviews,
    Portfolio,
}

impl CarouselDomain {
    /// Prefix used in navigation tokens (`comment_next_3`).
    pub fn token_prefix(&self) -> &'static str {
        match self {
            Self::Reviews => "comment",
            Self::Portfolio => "portfolio",
        }
    }

    pub fn from_token_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "comment" => Some(Self::Reviews),
            "portfolio" => Some(Self::Portfolio),
            _ => None,
        }
    }

    /// Reply when the collection is opened but empty.
    pub fn empty_message(&self) -> &'static str {
        match self {
            Self::Reviews => "Пока нет отзывов.",
            Self::Portfolio => "Пока нет портфолио.",
        }
    }

    /// Callback acknowledgment when navigating an empty collection.
    pub fn empty_ack(&self) -> &'static str {
        match self {
            Self::Reviews => "Нет отзывов",
            Self::Portfolio => "Нет портфолио",
        }
    }

    /// Reply when a requested index no longer exists.
    pub fn not_found_message(&self) -> &'static str {
        match self {
            Self::Reviews => "Отзыв не найден.",
            Self::Portfolio => "Портфолио не найдено.",
        }
    }

    /// Navigation token for moving `direction` away from `index`.
    pub fn nav_token(&self, direction: Direction, index: usize) -> String {
        format!("{}_{}_{}", self.token_prefix(), direction, index)
    }
}

impl fmt::Display for CarouselDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reviews => f.write_str("reviews"),
            Self::Portfolio => f.write_str("portfolio"),
        }
    }
}
