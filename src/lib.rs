//! Remont bot, a Telegram front desk for a renovation company: estimate
//! wizard, review and portfolio carousels, contacts, and an admin API for
//! editing the content.

pub mod admin;
pub mod bot;
pub mod carousel;
pub mod config;
pub mod content;
pub mod error;
pub mod render;
pub mod store;
pub mod wizard;

#[cfg(test)]
mod testing;
