//! User model
//!
//! The blog has a single author. The profile fields (`social_links`,
//! `sponsor_links`, `friend_links`) are opaque strings owned by the front-end,
//! typically JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Registered user
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// Password hash (argon2 PHC string)
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub avatar_url: String,
    pub bio: String,
    pub social_links: String,
    pub sponsor_links: String,
    pub friend_links: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a user that has not been stored yet. The id is assigned on insert.
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            username,
            email,
            password_hash,
            avatar_url: String::new(),
            bio: String::new(),
            social_links: String::new(),
            sponsor_links: String::new(),
            friend_links: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Public-facing subset embedded in articles and comments
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }
}

/// Author information embedded in article and comment responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub avatar_url: String,
}

/// Profile update.
///
/// `avatar_url` is only replaced when non-empty; the remaining fields are
/// always overwritten, with a missing value clearing the field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileInput {
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub social_links: Option<String>,
    #[serde(default)]
    pub sponsor_links: Option<String>,
    #[serde(default)]
    pub friend_links: Option<String>,
}

impl UpdateProfileInput {
    /// Apply this update to `user` in place
    pub fn apply_to(self, user: &mut User) {
        if let Some(avatar) = self.avatar_url.filter(|a| !a.trim().is_empty()) {
            user.avatar_url = avatar;
        }
        user.bio = self.bio.unwrap_or_default();
        user.social_links = self.social_links.unwrap_or_default();
        user.sponsor_links = self.sponsor_links.unwrap_or_default();
        user.friend_links = self.friend_links.unwrap_or_default();
        user.updated_at = Utc::now();
    }
}
