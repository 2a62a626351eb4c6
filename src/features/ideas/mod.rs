//! # Ideas Feature
//!
//! Quick capture of ideas with a category and free-form tags.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod model;

use async_trait::async_trait;

pub use model::{normalize_name, parse_tags, Idea, NewIdea, DEFAULT_CATEGORY};

#[async_trait]
pub trait IdeaStore: Send + Sync {
    /// Store an idea, creating its category and tags on first use
    async fn save_idea(&self, idea: NewIdea) -> anyhow::Result<Idea>;

    /// Non-archived ideas for an owner, pinned first then newest first
    async fn list_ideas(&self, owner: &str, limit: usize) -> anyhow::Result<Vec<Idea>>;
}
