use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContactMessage {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    pub status: ContactStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    New,
    Read,
    Replied,
    Archived,
}

impl ContactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::New => "new",
            ContactStatus::Read => "read",
            ContactStatus::Replied => "replied",
            ContactStatus::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(ContactStatus::New),
            "read" => Some(ContactStatus::Read),
            "replied" => Some(ContactStatus::Replied),
            "archived" => Some(ContactStatus::Archived),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ContactRequest {
    #[validate(required(message = "name is required"), length(min = 1, message = "name is required"))]
    pub name: Option<String>,
    #[validate(
        required(message = "email is required"),
        email(message = "Please provide a valid email address")
    )]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[validate(
        required(message = "subject is required"),
        length(min = 1, message = "subject is required")
    )]
    pub subject: Option<String>,
    #[validate(
        required(message = "message is required"),
        length(min = 1, message = "message is required")
    )]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ContactPatch {
    pub status: Option<ContactStatus>,
    #[validate(length(min = 1, message = "name cannot be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[validate(length(min = 1, message = "subject cannot be empty"))]
    pub subject: Option<String>,
    #[validate(length(min = 1, message = "message cannot be empty"))]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactFilter {
    pub q: Option<String>,
    pub status: Option<ContactStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}
