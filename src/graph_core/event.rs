//! Interaction event normalization from JSONL / SQLite rows

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;

/// One timestamped interaction: an actor posting, mentioning others, tagging and linking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionEvent {
    /// Unix seconds, UTC
    pub timestamp: i64,
    /// Posting actor. `None` or blank marks a defective record.
    #[serde(default)]
    pub actor_id: Option<String>,
    #[serde(default)]
    pub mentions: BTreeSet<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub links: BTreeSet<String>,
}

impl InteractionEvent {
    /// Create an event for `actor` with no mentions, tags or links
    pub fn new(timestamp: i64, actor: impl Into<String>) -> Self {
        Self {
            timestamp,
            actor_id: Some(actor.into()),
            mentions: BTreeSet::new(),
            tags: BTreeSet::new(),
            links: BTreeSet::new(),
        }
    }

    pub fn with_mention(mut self, actor: impl Into<String>) -> Self {
        self.mentions.insert(actor.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.links.insert(link.into());
        self
    }

    /// Parse an event from a JSONL line
    pub fn from_jsonl(line: &str) -> Result<Self, Box<dyn Error>> {
        let event: InteractionEvent = serde_json::from_str(line)?;
        Ok(event)
    }

    /// The actor id if present and non-blank
    pub fn actor(&self) -> Option<&str> {
        self.actor_id
            .as_deref()
            .map(str::trim)
            .filter(|actor| !actor.is_empty())
    }
}
