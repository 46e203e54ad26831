//! Structured listing queries.
//!
//! A [`ListQuery`] is a conjunction of [`Filter`]s, one [`Order`], and a
//! limit. Filters are `(field, comparator, value)` triples checked against the
//! field's kind when constructed, so an ill-typed filter never reaches a store.
//! Both filters and orders parse from compact strings such as
//! `"importance >= 0.7"` and `"access_count desc"`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;

use super::types::{parse_timestamp, Memory};
use crate::error::{MemoryError, Result};

/// A filterable record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Importance,
    EmotionalIntensity,
    AccessCount,
    CreatedAt,
    LastAccessed,
    Content,
    Context,
    Tags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Number,
    Timestamp,
    Text,
}

impl Field {
    fn kind(&self) -> FieldKind {
        match self {
            Self::Importance | Self::EmotionalIntensity | Self::AccessCount => FieldKind::Number,
            Self::CreatedAt | Self::LastAccessed => FieldKind::Timestamp,
            Self::Content | Self::Context | Self::Tags => FieldKind::Text,
        }
    }

    fn parse(raw: &str) -> Result<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "importance" => Ok(Self::Importance),
            "emotional_intensity" | "emotion" => Ok(Self::EmotionalIntensity),
            "access_count" => Ok(Self::AccessCount),
            "created_at" | "timestamp" => Ok(Self::CreatedAt),
            "last_accessed" => Ok(Self::LastAccessed),
            "content" => Ok(Self::Content),
            "context" => Ok(Self::Context),
            "tags" => Ok(Self::Tags),
            other => Err(MemoryError::invalid(format!("unknown filter field: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Contains,
}

impl Comparator {
    fn is_ordering(&self) -> bool {
        matches!(self, Self::Lt | Self::Le | Self::Gt | Self::Ge)
    }

    fn accepts(&self, ord: Ordering) -> bool {
        match self {
            Self::Eq => ord == Ordering::Equal,
            Self::Ne => ord != Ordering::Equal,
            Self::Lt => ord == Ordering::Less,
            Self::Le => ord != Ordering::Greater,
            Self::Gt => ord == Ordering::Greater,
            Self::Ge => ord != Ordering::Less,
            Self::Contains => false,
        }
    }
}

/// Right-hand side of a filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Number(f64),
    Timestamp(DateTime<Utc>),
    Text(String),
}

impl FilterValue {
    fn kind(&self) -> FieldKind {
        match self {
            Self::Number(_) => FieldKind::Number,
            Self::Timestamp(_) => FieldKind::Timestamp,
            Self::Text(_) => FieldKind::Text,
        }
    }
}

/// A validated `(field, comparator, value)` predicate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Filter {
    field: Field,
    comparator: Comparator,
    value: FilterValue,
}

impl Filter {
    pub fn new(field: Field, comparator: Comparator, value: FilterValue) -> Result<Self> {
        let kind = field.kind();
        if value.kind() != kind {
            return Err(MemoryError::invalid(format!(
                "value {value:?} does not match the type of field {field:?}"
            )));
        }
        if let FilterValue::Number(n) = &value {
            if !n.is_finite() {
                return Err(MemoryError::invalid("filter value must be a finite number"));
            }
        }
        match (kind, comparator) {
            (FieldKind::Text, c) if c.is_ordering() => Err(MemoryError::invalid(format!(
                "comparator {c:?} is not supported on text field {field:?}"
            ))),
            (FieldKind::Number | FieldKind::Timestamp, Comparator::Contains) => Err(
                MemoryError::invalid(format!("'contains' requires a text field, got {field:?}")),
            ),
            _ => Ok(Self {
                field,
                comparator,
                value,
            }),
        }
    }

    pub fn field(&self) -> Field {
        self.field
    }

    /// Evaluate against a record. A never-accessed record has no
    /// `last_accessed` and fails every comparison on that field.
    pub fn matches(&self, memory: &Memory) -> bool {
        match (&self.value, self.field) {
            (FilterValue::Number(rhs), Field::Importance) => self.compare_f64(memory.importance, *rhs),
            (FilterValue::Number(rhs), Field::EmotionalIntensity) => {
                self.compare_f64(memory.emotional_intensity, *rhs)
            }
            (FilterValue::Number(rhs), Field::AccessCount) => {
                self.compare_f64(memory.access_count as f64, *rhs)
            }
            (FilterValue::Timestamp(rhs), Field::CreatedAt) => {
                self.comparator.accepts(memory.created_at.cmp(rhs))
            }
            (FilterValue::Timestamp(rhs), Field::LastAccessed) => memory
                .last_accessed
                .map(|ts| self.comparator.accepts(ts.cmp(rhs)))
                .unwrap_or(false),
            (FilterValue::Text(rhs), Field::Content) => self.compare_text(&memory.content, rhs),
            (FilterValue::Text(rhs), Field::Context) => self.compare_text(&memory.context, rhs),
            (FilterValue::Text(rhs), Field::Tags) => match self.comparator {
                Comparator::Contains => memory.tags.contains(rhs),
                _ => self.compare_text(&memory.tags.joined(), rhs),
            },
            _ => false,
        }
    }

    fn compare_f64(&self, lhs: f64, rhs: f64) -> bool {
        self.comparator.accepts(lhs.total_cmp(&rhs))
    }

    fn compare_text(&self, lhs: &str, rhs: &str) -> bool {
        match self.comparator {
            Comparator::Contains => lhs.to_lowercase().contains(&rhs.to_lowercase()),
            other => other.accepts(lhs.cmp(rhs)),
        }
    }
}

impl std::str::FromStr for Filter {
    type Err = MemoryError;

    /// Parse `<field> <op> <value>`, e.g. `importance >= 0.7`,
    /// `tags contains rust`, `created_at > 2026-01-01T00:00:00Z`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let field_end = s
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(s.len());
        let field = Field::parse(&s[..field_end])?;
        let rest = s[field_end..].trim_start();

        const OPERATORS: &[(&str, Comparator)] = &[
            (">=", Comparator::Ge),
            ("<=", Comparator::Le),
            ("!=", Comparator::Ne),
            ("==", Comparator::Eq),
            ("=", Comparator::Eq),
            ("<", Comparator::Lt),
            (">", Comparator::Gt),
            ("contains ", Comparator::Contains),
        ];
        let (op, comparator) = OPERATORS
            .iter()
            .find(|(op, _)| rest.to_ascii_lowercase().starts_with(op))
            .ok_or_else(|| MemoryError::invalid(format!("missing comparator in filter: {s}")))?;

        let raw_value = rest[op.len()..].trim().trim_matches(|c| c == '"' || c == '\'');
        if raw_value.is_empty() {
            return Err(MemoryError::invalid(format!("missing value in filter: {s}")));
        }

        let value = match field.kind() {
            FieldKind::Number => FilterValue::Number(raw_value.parse().map_err(|_| {
                MemoryError::invalid(format!("expected a number in filter: {s}"))
            })?),
            FieldKind::Timestamp => FilterValue::Timestamp(parse_timestamp(raw_value).map_err(
                |_| MemoryError::invalid(format!("expected an RFC 3339 timestamp in filter: {s}")),
            )?),
            FieldKind::Text => FilterValue::Text(raw_value.to_string()),
        };

        Filter::new(field, *comparator, value)
    }
}

/// Sort key for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKey {
    #[default]
    CreatedAt,
    Importance,
    EmotionalIntensity,
    AccessCount,
    LastAccessed,
    Id,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Asc,
    #[default]
    Desc,
}

/// Listing order. Defaults to newest first. Ties always fall back to
/// identity, newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Order {
    pub key: OrderKey,
    pub direction: Direction,
}

impl Order {
    pub fn new(key: OrderKey, direction: Direction) -> Self {
        Self { key, direction }
    }

    pub fn compare(&self, a: &Memory, b: &Memory) -> Ordering {
        let primary = match self.key {
            OrderKey::CreatedAt => a.created_at.cmp(&b.created_at),
            OrderKey::Importance => a.importance.total_cmp(&b.importance),
            OrderKey::EmotionalIntensity => a.emotional_intensity.total_cmp(&b.emotional_intensity),
            OrderKey::AccessCount => a.access_count.cmp(&b.access_count),
            OrderKey::LastAccessed => a.last_accessed.cmp(&b.last_accessed),
            OrderKey::Id => a.id.cmp(&b.id),
        };
        let primary = match self.direction {
            Direction::Asc => primary,
            Direction::Desc => primary.reverse(),
        };
        primary.then_with(|| b.id.cmp(&a.id))
    }
}

impl std::str::FromStr for Order {
    type Err = MemoryError;

    /// Parse `<key> [asc|desc]`. A missing direction means descending.
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split_whitespace();
        let key = match parts.next().map(str::to_ascii_lowercase).as_deref() {
            None => return Ok(Self::default()),
            Some("created_at" | "timestamp") => OrderKey::CreatedAt,
            Some("importance") => OrderKey::Importance,
            Some("emotional_intensity" | "emotion") => OrderKey::EmotionalIntensity,
            Some("access_count") => OrderKey::AccessCount,
            Some("last_accessed") => OrderKey::LastAccessed,
            Some("id") => OrderKey::Id,
            Some(other) => return Err(MemoryError::invalid(format!("unknown order key: {other}"))),
        };
        let direction = match parts.next().map(str::to_ascii_lowercase).as_deref() {
            None | Some("desc") => Direction::Desc,
            Some("asc") => Direction::Asc,
            Some(other) => {
                return Err(MemoryError::invalid(format!("unknown order direction: {other}")))
            }
        };
        if parts.next().is_some() {
            return Err(MemoryError::invalid(format!("unexpected trailing input in order: {s}")));
        }
        Ok(Self { key, direction })
    }
}

/// A structural query over one layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListQuery {
    pub filters: Vec<Filter>,
    pub order: Order,
    pub limit: usize,
}

impl ListQuery {
    pub fn new(limit: usize) -> Self {
        Self {
            filters: Vec::new(),
            order: Order::default(),
            limit,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_limit(self.limit)
    }

    pub fn matches(&self, memory: &Memory) -> bool {
        self.filters.iter().all(|f| f.matches(memory))
    }
}

/// Limits must be positive.
pub fn validate_limit(limit: usize) -> Result<()> {
    if limit == 0 {
        return Err(MemoryError::invalid("limit must be greater than zero"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::types::{now, Category, NewMemory};

    fn sample(id: i64, importance: f64, tags: &str) -> Memory {
        NewMemory::new(format!("memory number {id}"))
            .importance(importance)
            .tags(tags)
            .context("Project Atlas")
            .into_memory(id, Category::Semantic, now())
    }

    #[test]
    fn parses_numeric_filter() {
        let filter: Filter = "importance >= 0.7".parse().unwrap();
        assert_eq!(filter.field(), Field::Importance);
        assert!(filter.matches(&sample(1, 0.7, "")));
        assert!(filter.matches(&sample(1, 0.9, "")));
        assert!(!filter.matches(&sample(1, 0.69, "")));

        let compact: Filter = "importance<0.5".parse().unwrap();
        assert!(compact.matches(&sample(1, 0.2, "")));
    }

    #[test]
    fn text_filters() {
        let tagged: Filter = "tags contains rust".parse().unwrap();
        assert!(tagged.matches(&sample(1, 0.5, "go,Rust")));
        assert!(!tagged.matches(&sample(1, 0.5, "rusty")));

        let ctx: Filter = "context contains 'atlas'".parse().unwrap();
        assert!(ctx.matches(&sample(1, 0.5, "")));

        let exact: Filter = "content = \"memory number 3\"".parse().unwrap();
        assert!(exact.matches(&sample(3, 0.5, "")));
        assert!(!exact.matches(&sample(4, 0.5, "")));
    }

    #[test]
    fn timestamp_filters_and_unaccessed_records() {
        let mut m = sample(1, 0.5, "");
        let after: Filter = "created_at > 2000-01-01T00:00:00Z".parse().unwrap();
        assert!(after.matches(&m));

        let accessed: Filter = "last_accessed >= 2000-01-01T00:00:00Z".parse().unwrap();
        assert!(!accessed.matches(&m));
        m.last_accessed = Some(now());
        assert!(accessed.matches(&m));
    }

    #[test]
    fn rejects_ill_typed_filters() {
        for bad in [
            "content > abc",
            "importance contains 1",
            "importance >= high",
            "created_at < yesterday",
            "score > 1",
            "importance",
            "importance >=",
            "importance >= NaN",
        ] {
            let err = bad.parse::<Filter>().unwrap_err();
            assert!(err.is_validation(), "{bad} should be a validation error");
        }
        assert!(Filter::new(
            Field::Importance,
            Comparator::Eq,
            FilterValue::Text("x".into())
        )
        .is_err());
    }

    #[test]
    fn parses_orders() {
        assert_eq!("".parse::<Order>().unwrap(), Order::default());
        assert_eq!(
            "importance asc".parse::<Order>().unwrap(),
            Order::new(OrderKey::Importance, Direction::Asc)
        );
        assert_eq!(
            "timestamp DESC".parse::<Order>().unwrap(),
            Order::new(OrderKey::CreatedAt, Direction::Desc)
        );
        assert!("importance sideways".parse::<Order>().is_err());
        assert!("importance; DROP TABLE x".parse::<Order>().is_err());
    }

    #[test]
    fn order_ties_fall_back_to_newest_id() {
        let a = sample(1, 0.5, "");
        let b = sample(2, 0.5, "");
        let order = Order::new(OrderKey::Importance, Direction::Asc);
        assert_eq!(order.compare(&a, &b), Ordering::Greater);
    }

    #[test]
    fn zero_limit_is_invalid() {
        assert!(ListQuery::new(0).validate().unwrap_err().is_validation());
        assert!(ListQuery::new(1).validate().is_ok());
    }
}
