//! Content the bot presents: greeting, contacts, wizard text, reviews and
//! portfolio entries.

pub mod model;

pub use model::{
    BotUser, ContactContent, ContactContentUpdate, LinkButton, MenuButton, NewPortfolioEntry,
    NewReview, PortfolioEntry, Review, StartContent, StartContentUpdate, UserPage, UserProfile,
    WizardConfig, WizardConfigPatch,
};
