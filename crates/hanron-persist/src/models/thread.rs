use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Listing views cut titles to this many characters.
pub const TITLE_DISPLAY_CHARS: usize = 60;

/// Database-agnostic thread model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    /// Bound from the first user message; never changes afterwards.
    pub topic: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Projection returned by thread listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadSummary {
    pub id: String,
    pub title: String,
    pub topic: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ThreadSummary {
    /// Title cut to [`TITLE_DISPLAY_CHARS`] characters, with an ellipsis when cut.
    pub fn display_title(&self) -> String {
        let mut chars = self.title.chars();
        let head: String = chars.by_ref().take(TITLE_DISPLAY_CHARS).collect();
        if chars.next().is_some() {
            format!("{}…", head)
        } else {
            head
        }
    }
}

impl From<&Thread> for ThreadSummary {
    fn from(thread: &Thread) -> Self {
        Self {
            id: thread.id.clone(),
            title: thread.title.clone(),
            topic: thread.topic.clone(),
            created_at: thread.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(title: &str) -> ThreadSummary {
        ThreadSummary {
            id: "t1".to_string(),
            title: title.to_string(),
            topic: Some(title.to_string()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_short_title_unchanged() {
        assert_eq!(summary("Cats are better than dogs.").display_title(), "Cats are better than dogs.");
    }

    #[test]
    fn test_long_title_truncated_on_char_boundary() {
        let title = "猫".repeat(TITLE_DISPLAY_CHARS + 5);
        let shown = summary(&title).display_title();
        assert_eq!(shown.chars().count(), TITLE_DISPLAY_CHARS + 1);
        assert!(shown.ends_with('…'));
    }
}
