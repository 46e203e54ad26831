//! Core memory type definitions.
//!
//! Defines [`Category`] (the six fixed memory layers), [`Memory`] (a full
//! record), [`NewMemory`] (the caller-supplied draft before an identity is
//! assigned), and [`Tags`] (an ordered tag set stored as comma-joined text).

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MemoryError, Result};

/// Identity of a record, unique within its category.
pub type MemoryId = i64;

/// The six memory layers. Declaration order is the canonical layer order used
/// for iteration and for breaking cross-layer ranking ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Experiences, conversations, events. The fallback layer.
    Episodic,
    /// Facts and learned knowledge.
    Semantic,
    /// How to do things: skills, processes, techniques.
    Procedural,
    /// Thoughts about thinking, self-reflection.
    Meta,
    /// Core self, values, who the agent is.
    Identity,
    /// Active context for the current session.
    Working,
}

impl Category {
    /// Every layer, in canonical order.
    pub const ALL: [Category; 6] = [
        Self::Episodic,
        Self::Semantic,
        Self::Procedural,
        Self::Meta,
        Self::Identity,
        Self::Working,
    ];

    /// SQL-compatible string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Episodic => "episodic",
            Self::Semantic => "semantic",
            Self::Procedural => "procedural",
            Self::Meta => "meta",
            Self::Identity => "identity",
            Self::Working => "working",
        }
    }

    /// Position in [`Category::ALL`].
    pub fn ordinal(&self) -> usize {
        *self as usize
    }

    /// Name of the table holding this layer's records.
    pub fn table(&self) -> String {
        format!("{}_memories", self.as_str())
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "episodic" => Ok(Self::Episodic),
            "semantic" => Ok(Self::Semantic),
            "procedural" => Ok(Self::Procedural),
            "meta" => Ok(Self::Meta),
            "identity" => Ok(Self::Identity),
            "working" => Ok(Self::Working),
            _ => Err(MemoryError::UnknownCategory(s.to_string())),
        }
    }
}

/// Ordered, duplicate-free tag list. Persisted as comma-joined text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Tags(Vec<String>);

impl Tags {
    /// Parse comma-separated text. Whitespace is trimmed, empty entries and
    /// repeats are dropped, first-seen order is kept.
    pub fn parse(raw: &str) -> Self {
        let mut tags: Vec<String> = Vec::new();
        for tag in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            if !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_string());
            }
        }
        Self(tags)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Exact, case-insensitive membership.
    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t.eq_ignore_ascii_case(tag.trim()))
    }

    /// Comma-joined form used for storage.
    pub fn joined(&self) -> String {
        self.0.join(",")
    }
}

impl From<String> for Tags {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<&str> for Tags {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<Tags> for String {
    fn from(tags: Tags) -> Self {
        tags.joined()
    }
}

/// A stored memory record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    /// Per-layer identity, assigned in increasing order.
    pub id: MemoryId,
    /// Layer this record belongs to. Never changes after creation.
    #[serde(rename = "layer")]
    pub category: Category,
    /// The text of the memory.
    pub content: String,
    /// Insertion time.
    pub created_at: DateTime<Utc>,
    /// Caller-assigned importance, conventionally in `[0.0, 1.0]`.
    pub importance: f64,
    /// Caller-assigned emotional intensity, conventionally in `[0.0, 1.0]`.
    pub emotional_intensity: f64,
    /// Supplementary free text. Indexed and used for classification.
    pub context: String,
    pub tags: Tags,
    /// Number of recalls that returned this record.
    pub access_count: u64,
    /// Time of the most recent recall, `None` until first recalled.
    pub last_accessed: Option<DateTime<Utc>>,
}

/// A memory as supplied by a caller, before classification and identity
/// assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMemory {
    pub content: String,
    /// Explicit layer. `None` means the classifier decides.
    pub category: Option<Category>,
    pub importance: f64,
    pub emotional_intensity: f64,
    pub context: String,
    pub tags: Tags,
}

impl NewMemory {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            category: None,
            importance: 0.5,
            emotional_intensity: 0.5,
            context: String::new(),
            tags: Tags::default(),
        }
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn importance(mut self, importance: f64) -> Self {
        self.importance = importance;
        self
    }

    pub fn emotional_intensity(mut self, intensity: f64) -> Self {
        self.emotional_intensity = intensity;
        self
    }

    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn tags(mut self, tags: impl Into<Tags>) -> Self {
        self.tags = tags.into();
        self
    }

    /// Reject drafts that cannot be stored. No range is enforced on the
    /// scores, but they must be finite so ordering stays total.
    pub fn validate(&self) -> Result<()> {
        if self.content.trim().is_empty() {
            return Err(MemoryError::invalid("content must not be empty"));
        }
        if !self.importance.is_finite() {
            return Err(MemoryError::invalid("importance must be a finite number"));
        }
        if !self.emotional_intensity.is_finite() {
            return Err(MemoryError::invalid(
                "emotional_intensity must be a finite number",
            ));
        }
        Ok(())
    }

    /// Materialize the draft as a record in `category` with identity `id`.
    pub fn into_memory(self, id: MemoryId, category: Category, created_at: DateTime<Utc>) -> Memory {
        Memory {
            id,
            category,
            content: self.content,
            created_at,
            importance: self.importance,
            emotional_intensity: self.emotional_intensity,
            context: self.context,
            tags: self.tags,
            access_count: 0,
            last_accessed: None,
        }
    }
}

/// Current time at the precision records are persisted with (microseconds),
/// so in-memory and on-disk timestamps compare equal.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Format a timestamp for a TEXT column.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a timestamp written by [`format_timestamp`].
pub fn parse_timestamp(raw: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|ts| ts.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trips_through_str() {
        for category in Category::ALL {
            let parsed: Category = category.as_str().parse().unwrap();
            assert_eq!(parsed, category);
        }
        assert_eq!("  Identity ".parse::<Category>().unwrap(), Category::Identity);
    }

    #[test]
    fn unknown_category_is_a_validation_error() {
        let err = "dreams".parse::<Category>().unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("dreams"));
    }

    #[test]
    fn ordinals_follow_declaration_order() {
        let ordinals: Vec<usize> = Category::ALL.iter().map(Category::ordinal).collect();
        assert_eq!(ordinals, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(Category::Working.table(), "working_memories");
    }

    #[test]
    fn tags_dedupe_and_keep_order() {
        let tags = Tags::parse(" rust, memory ,,rust, sqlite ");
        assert_eq!(tags.as_slice(), &["rust", "memory", "sqlite"]);
        assert_eq!(tags.joined(), "rust,memory,sqlite");
        assert!(tags.contains("MEMORY"));
        assert!(!tags.contains("mem"));
        assert!(Tags::parse("").is_empty());
    }

    #[test]
    fn tags_serialize_as_comma_text() {
        let json = serde_json::to_string(&Tags::parse("a,b")).unwrap();
        assert_eq!(json, "\"a,b\"");
        let back: Tags = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Tags::parse("a,b"));
    }

    #[test]
    fn new_memory_defaults() {
        let draft = NewMemory::new("hello");
        assert_eq!(draft.importance, 0.5);
        assert_eq!(draft.emotional_intensity, 0.5);
        assert!(draft.context.is_empty());
        assert!(draft.tags.is_empty());
        assert!(draft.category.is_none());
    }

    #[test]
    fn validate_rejects_empty_and_non_finite() {
        assert!(NewMemory::new("").validate().unwrap_err().is_validation());
        assert!(NewMemory::new("   ").validate().is_err());
        assert!(NewMemory::new("x").importance(f64::NAN).validate().is_err());
        assert!(NewMemory::new("x")
            .emotional_intensity(f64::INFINITY)
            .validate()
            .is_err());
        // Out-of-convention values are allowed
        assert!(NewMemory::new("x").importance(3.0).validate().is_ok());
    }

    #[test]
    fn timestamps_round_trip_at_microsecond_precision() {
        let ts = now();
        let parsed = parse_timestamp(&format_timestamp(&ts)).unwrap();
        assert_eq!(parsed, ts);
    }
}
