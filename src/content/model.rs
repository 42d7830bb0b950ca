//! Content records shown by the bot and edited through the admin API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::wizard::ChoiceStep;

/// A start-menu button; `callback_data` is echoed back when pressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuButton {
    pub text: String,
    pub callback_data: String,
}

/// A contact-card button opening an external link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkButton {
    pub text: String,
    pub url: String,
}

/// Greeting shown on `/start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub content: String,
    #[serde(default)]
    pub buttons: Vec<MenuButton>,
}

/// Contact card shown on `/contacts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactContent {
    pub address: String,
    pub manager_text: String,
    #[serde(default)]
    pub buttons: Vec<LinkButton>,
}

/// Admin edit of [`StartContent`]. Absent `title` and `buttons` keep the
/// stored values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartContentUpdate {
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
    #[serde(default)]
    pub buttons: Option<Vec<MenuButton>>,
}

impl StartContentUpdate {
    pub fn merge_into(self, current: Option<StartContent>) -> StartContent {
        let (title, buttons) = current.map_or((None, Vec::new()), |c| (c.title, c.buttons));
        StartContent {
            title: self.title.or(title),
            content: self.content,
            buttons: self.buttons.unwrap_or(buttons),
        }
    }
}

/// Admin edit of [`ContactContent`]. Absent `buttons` keep the stored list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactContentUpdate {
    pub address: String,
    pub manager_text: String,
    #[serde(default)]
    pub buttons: Option<Vec<LinkButton>>,
}

impl ContactContentUpdate {
    pub fn merge_into(self, current: Option<ContactContent>) -> ContactContent {
        let buttons = current.map(|c| c.buttons).unwrap_or_default();
        ContactContent {
            address: self.address,
            manager_text: self.manager_text,
            buttons: self.buttons.unwrap_or(buttons),
        }
    }
}

/// Question and option text for every wizard step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardConfig {
    pub step1_question: String,
    pub step1_options: Vec<String>,
    pub step2_question: String,
    pub step2_options: Vec<String>,
    pub step3_question: String,
    pub step4_question: String,
    pub step4_options: Vec<String>,
    pub step5_contact_prompt: String,
    pub final_message: String,
}

impl WizardConfig {
    /// Button labels for a choice step.
    pub fn options(&self, step: ChoiceStep) -> &[String] {
        match step {
            ChoiceStep::PropertyType => &self.step1_options,
            ChoiceStep::Location => &self.step2_options,
            ChoiceStep::ContactMethod => &self.step4_options,
        }
    }

    /// Question text shown above a choice step's buttons.
    pub fn question(&self, step: ChoiceStep) -> &str {
        match step {
            ChoiceStep::PropertyType => &self.step1_question,
            ChoiceStep::Location => &self.step2_question,
            ChoiceStep::ContactMethod => &self.step4_question,
        }
    }

    /// Label of option `index`, if within bounds.
    pub fn option(&self, step: ChoiceStep, index: usize) -> Option<&str> {
        self.options(step).get(index).map(String::as_str)
    }

    /// Apply a partial update; `None` fields are left untouched.
    pub fn apply(&mut self, patch: WizardConfigPatch) {
        let WizardConfigPatch {
            step1_question,
            step1_options,
            step2_question,
            step2_options,
            step3_question,
            step4_question,
            step4_options,
            step5_contact_prompt,
            final_message,
        } = patch;
        set_if(&mut self.step1_question, step1_question);
        set_if(&mut self.step1_options, step1_options);
        set_if(&mut self.step2_question, step2_question);
        set_if(&mut self.step2_options, step2_options);
        set_if(&mut self.step3_question, step3_question);
        set_if(&mut self.step4_question, step4_question);
        set_if(&mut self.step4_options, step4_options);
        set_if(&mut self.step5_contact_prompt, step5_contact_prompt);
        set_if(&mut self.final_message, final_message);
    }
}

fn set_if<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

/// Partial update of [`WizardConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardConfigPatch {
    pub step1_question: Option<String>,
    pub step1_options: Option<Vec<String>>,
    pub step2_question: Option<String>,
    pub step2_options: Option<Vec<String>>,
    pub step3_question: Option<String>,
    pub step4_question: Option<String>,
    pub step4_options: Option<Vec<String>>,
    pub step5_contact_prompt: Option<String>,
    pub final_message: Option<String>,
}

/// A client review. `date` is kept as entered by the admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub name: String,
    pub date: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReview {
    pub name: String,
    pub date: String,
    pub text: String,
}

/// A portfolio entry: photo plus caption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioEntry {
    pub id: i64,
    pub image_src: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPortfolioEntry {
    pub image_src: String,
    pub title: String,
    pub description: String,
}

/// Telegram profile fields captured on `/start`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// A chat user who has talked to the bot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotUser {
    pub id: i64,
    pub chat_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_message: Option<DateTime<Utc>>,
}

/// One page of users plus the overall count.
#[derive(Debug, Clone, Serialize)]
pub struct UserPage {
    pub users: Vec<BotUser>,
    pub total: i64,
}
