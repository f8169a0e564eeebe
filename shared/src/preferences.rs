use serde::{Deserialize, Serialize};

/// Saved preferences of a signed-in user.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    #[serde(default)]
    pub favorite_rivers: Vec<String>,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub user_email: String,
}

impl UserPreferences {
    pub fn is_favorite(&self, river_id: &str) -> bool {
        self.favorite_rivers.iter().any(|id| id == river_id)
    }
}

/// Body of the favorite add/remove requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRequest {
    pub site_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserNote {
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub site_code: String,
}

impl UserNote {
    /// Trimmed note text, or `None` when blank.
    pub fn text(&self) -> Option<&str> {
        let trimmed = self.note.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteRequest {
    pub note: String,
}
