//! User model for storage and API.

use serde::{Deserialize, Serialize};

/// User profile stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Strava athlete ID (also used as document ID)
    pub strava_athlete_id: u64,
    /// First name
    pub firstname: String,
    /// Last name
    pub lastname: String,
    /// Profile picture URL
    pub profile_picture: Option<String>,
    /// When user first connected
    pub created_at: String,
    /// Last sign-in timestamp
    pub last_active: String,
}

impl User {
    /// Name shown in the dashboard header.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.firstname.trim(), self.lastname.trim());
        let full = full.trim();
        if full.is_empty() {
            "Athlete".to_string()
        } else {
            full.to_string()
        }
    }
}

/// User's Strava OAuth token pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// When the access token expires (Unix seconds, as Strava reports it)
    pub expires_at: i64,
    /// Granted OAuth scopes
    pub scopes: Vec<String>,
}
