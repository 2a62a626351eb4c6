//! Idea records

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};

/// Category used when the user does not pick one
pub const DEFAULT_CATEGORY: &str = "general";
const MAX_TAGS: usize = 10;
const MAX_NAME_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Idea {
    pub id: i64,
    pub owner: String,
    pub title: String,
    pub content: Option<String>,
    pub category: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub reminder_id: Option<i64>,
    pub archived: bool,
    pub pinned: bool,
    pub source: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewIdea {
    pub owner: String,
    pub title: String,
    pub content: Option<String>,
    pub category: String,
    pub tags: Vec<String>,
    pub source: Option<String>,
}

impl NewIdea {
    pub fn new(owner: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            title: title.into(),
            content: None,
            category: DEFAULT_CATEGORY.to_string(),
            tags: Vec::new(),
            source: None,
        }
    }

    /// Trim fields and normalise category/tag names, rejecting blank titles
    pub fn normalized(mut self) -> Result<Self> {
        self.title = self.title.trim().to_string();
        if self.title.is_empty() {
            return Err(anyhow!("Idea title cannot be empty"));
        }
        self.content = self
            .content
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        self.category = normalize_name(&self.category).unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

        let mut tags = Vec::new();
        for tag in self.tags.iter().filter_map(|t| normalize_name(t)) {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        if tags.len() > MAX_TAGS {
            return Err(anyhow!("An idea can have at most {MAX_TAGS} tags"));
        }
        self.tags = tags;
        Ok(self)
    }
}

/// Lowercase, trimmed, length-capped category or tag name; `None` when blank
pub fn normalize_name(raw: &str) -> Option<String> {
    let name: String = raw.trim().trim_start_matches('#').to_lowercase().chars().take(MAX_NAME_LEN).collect();
    let name = name.trim().to_string();
    (!name.is_empty()).then_some(name)
}

/// Split a comma-separated tag option
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_defaults() {
        let idea = NewIdea::new("U1", "  build a lamp  ").normalized().unwrap();
        assert_eq!(idea.title, "build a lamp");
        assert_eq!(idea.category, DEFAULT_CATEGORY);
        assert!(idea.tags.is_empty());
    }

    #[test]
    fn test_blank_title_rejected() {
        assert!(NewIdea::new("U1", "   ").normalized().is_err());
    }

    #[test]
    fn test_tags_deduplicated_and_lowercased() {
        let mut idea = NewIdea::new("U1", "mesh wifi");
        idea.tags = parse_tags("Network, #network, ,home");
        idea.category = " Tech ".to_string();
        let idea = idea.normalized().unwrap();
        assert_eq!(idea.tags, vec!["network".to_string(), "home".to_string()]);
        assert_eq!(idea.category, "tech");
    }

    #[test]
    fn test_too_many_tags() {
        let mut idea = NewIdea::new("U1", "x");
        idea.tags = (0..11).map(|i| format!("t{i}")).collect();
        assert!(idea.normalized().is_err());
    }

    #[test]
    fn test_empty_content_dropped() {
        let mut idea = NewIdea::new("U1", "x");
        idea.content = Some("  ".to_string());
        assert_eq!(idea.normalized().unwrap().content, None);
    }
}
