//! Storage traits: read-only content lookups for the bot, user tracking,
//! and admin writes.
//!
//! Conversation handlers only ever see [`ContentStore`] and [`UserStore`];
//! the admin API works against the full [`Database`].

use async_trait::async_trait;

use crate::content::{
    ContactContent, ContactContentUpdate, NewPortfolioEntry, NewReview, PortfolioEntry, Review,
    StartContent, StartContentUpdate, UserPage, UserProfile, WizardConfig, WizardConfigPatch,
};
use crate::error::DatabaseError;

/// Read-only lookups of the content shown in chat.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Greeting for `/start`, if configured.
    async fn get_start(&self) -> Result<Option<StartContent>, DatabaseError>;

    /// Contact card, if configured.
    async fn get_contact(&self) -> Result<Option<ContactContent>, DatabaseError>;

    /// Wizard question/option text, if configured.
    async fn get_wizard_config(&self) -> Result<Option<WizardConfig>, DatabaseError>;

    /// All reviews, newest first.
    async fn list_reviews(&self) -> Result<Vec<Review>, DatabaseError>;

    /// All portfolio entries in insertion order.
    async fn list_portfolio(&self) -> Result<Vec<PortfolioEntry>, DatabaseError>;
}

/// Chat user bookkeeping.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create the user or refresh the profile fields that are present.
    async fn upsert_user(&self, chat_id: i64, profile: &UserProfile)
    -> Result<(), DatabaseError>;

    /// Record that the user just sent something. Unknown users are ignored.
    async fn touch_user(&self, chat_id: i64) -> Result<(), DatabaseError>;

    /// Users, most recently created first.
    async fn list_users(
        &self,
        skip: Option<u32>,
        take: Option<u32>,
    ) -> Result<UserPage, DatabaseError>;
}

/// Full storage interface used by the admin API.
#[async_trait]
pub trait Database: ContentStore + UserStore {
    /// Run all pending schema migrations.
    async fn init_schema(&self) -> Result<(), DatabaseError>;

    // ── Singletons ──────────────────────────────────────────────────

    /// Replace the greeting text; buttons and title change only when given.
    async fn update_start(
        &self,
        update: StartContentUpdate,
    ) -> Result<StartContent, DatabaseError>;

    /// Replace address and manager text; buttons change only when given.
    async fn update_contact(
        &self,
        update: ContactContentUpdate,
    ) -> Result<ContactContent, DatabaseError>;

    /// Merge `patch` into the stored wizard config, creating it if absent.
    async fn update_wizard_config(
        &self,
        patch: WizardConfigPatch,
    ) -> Result<WizardConfig, DatabaseError>;

    // ── Lists ───────────────────────────────────────────────────────

    async fn create_review(&self, review: &NewReview) -> Result<Review, DatabaseError>;

    /// Returns whether a row was deleted.
    async fn delete_review(&self, id: i64) -> Result<bool, DatabaseError>;

    async fn create_portfolio_entry(
        &self,
        entry: &NewPortfolioEntry,
    ) -> Result<PortfolioEntry, DatabaseError>;

    /// Returns whether a row was deleted.
    async fn delete_portfolio_entry(&self, id: i64) -> Result<bool, DatabaseError>;
}
