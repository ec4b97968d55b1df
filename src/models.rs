use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Longest idea text accepted, in characters
pub const MAX_IDEA_CHARS: usize = 280;

// A single posted idea
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Idea {
    pub id: String,
    pub text: String,
    pub votes: u64,
    pub created_at: DateTime<Utc>,
}

// Ordering for the list endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    New,
    Top,
}

impl SortMode {
    // Anything other than "top" lists newest first
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("top") => SortMode::Top,
            _ => SortMode::New,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::New => "new",
            SortMode::Top => "top",
        }
    }
}

// POST /ideas body
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateIdeaRequest {
    pub text: String,
}

// GET /ideas query string, kept as raw strings so bad values fall back to defaults
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub sort: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdeaListResponse {
    pub ideas: Vec<Idea>,
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdeaResponse {
    pub idea: Idea,
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn idea_serializes_with_camel_case_timestamp() {
        let idea = Idea {
            id: "abc".to_string(),
            text: "Hello".to_string(),
            votes: 3,
            created_at: Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap(),
        };

        let json = serde_json::to_value(&idea).unwrap();
        assert_eq!(json["id"], "abc");
        assert_eq!(json["votes"], 3);
        assert_eq!(json["createdAt"], "2025-01-02T03:04:05Z");
        assert!(json.get("created_at").is_none());
    }

    #[test]
    fn sort_mode_falls_back_to_new() {
        assert_eq!(SortMode::parse(Some("top")), SortMode::Top);
        assert_eq!(SortMode::parse(Some("TOP")), SortMode::Top);
        assert_eq!(SortMode::parse(Some("new")), SortMode::New);
        assert_eq!(SortMode::parse(Some("oldest")), SortMode::New);
        assert_eq!(SortMode::parse(None), SortMode::New);
    }
}
