//! Per-layer record set with an inverted term index.
//!
//! Every record's content, context, and tags are tokenized into lower-cased
//! alphanumeric runs. The index maps each term to the records containing it
//! together with the number of occurrences, which is all the ranking needs:
//!
//! 1. more distinct query terms matched ranks higher,
//! 2. then more total occurrences of query terms,
//! 3. then the more recently created record,
//! 4. then the higher identity.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use super::query::{validate_limit, ListQuery};
use super::stats::LayerStats;
use super::types::{now, Category, Memory, MemoryId, NewMemory};
use crate::error::{MemoryError, Result};

/// Split on non-alphanumeric boundaries and lower-case. No stemming, no
/// stopwords.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Distinct tokens of a query, in first-seen order.
fn query_terms(query: &str) -> Vec<String> {
    let mut terms = tokenize(query);
    let mut seen = std::collections::HashSet::new();
    terms.retain(|t| seen.insert(t.clone()));
    terms
}

/// Term counts over everything indexed for a record.
fn term_counts(memory: &Memory) -> HashMap<String, u32> {
    let mut counts = HashMap::new();
    let tag_text = memory.tags.as_slice().join(" ");
    for text in [memory.content.as_str(), memory.context.as_str(), tag_text.as_str()] {
        for token in tokenize(text) {
            *counts.entry(token).or_insert(0) += 1;
        }
    }
    counts
}

/// How well a record matched a query. Orders by coverage, then frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Relevance {
    /// Distinct query terms present in the record.
    pub matched_terms: u32,
    /// Total occurrences of query terms in the record.
    pub occurrences: u32,
}

impl Relevance {
    /// Single number consistent with the ordering: the integer part is the
    /// coverage, the fractional part grows with frequency.
    pub fn score(&self) -> f64 {
        let occ = self.occurrences as f64;
        self.matched_terms as f64 + occ / (occ + 1.0)
    }
}

/// A ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub memory: Memory,
    pub relevance: Relevance,
    pub score: f64,
}

impl SearchHit {
    pub fn new(memory: Memory, relevance: Relevance) -> Self {
        Self {
            memory,
            score: relevance.score(),
            relevance,
        }
    }
}

/// Best-first ordering for ranked candidates within one layer.
fn rank_order(a: (&Memory, Relevance), b: (&Memory, Relevance)) -> Ordering {
    b.1.cmp(&a.1)
        .then_with(|| b.0.created_at.cmp(&a.0.created_at))
        .then_with(|| b.0.id.cmp(&a.0.id))
}

/// One layer's records and their inverted index.
#[derive(Debug, Clone)]
pub struct CategoryIndex {
    category: Category,
    records: BTreeMap<MemoryId, Memory>,
    postings: HashMap<String, BTreeMap<MemoryId, u32>>,
    next_id: MemoryId,
}

impl CategoryIndex {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            records: BTreeMap::new(),
            postings: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: MemoryId) -> Option<&Memory> {
        self.records.get(&id)
    }

    /// Records in ascending identity order.
    pub fn records(&self) -> impl Iterator<Item = &Memory> {
        self.records.values()
    }

    /// Identity the next inserted record will receive.
    pub fn next_id(&self) -> MemoryId {
        self.next_id
    }

    /// Build the record the next [`insert`](Self::insert) would store,
    /// without changing the index.
    pub fn prepare(&self, draft: NewMemory) -> Result<Memory> {
        draft.validate()?;
        Ok(draft.into_memory(self.next_id, self.category, now()))
    }

    /// Store a new record under the next identity and index it.
    pub fn insert(&mut self, draft: NewMemory) -> Result<MemoryId> {
        let memory = self.prepare(draft)?;
        let id = memory.id;
        self.admit(memory)?;
        Ok(id)
    }

    /// Add a record that already has an identity (loaded from disk, imported,
    /// or built by [`prepare`](Self::prepare)).
    pub fn admit(&mut self, memory: Memory) -> Result<()> {
        if memory.category != self.category {
            return Err(MemoryError::invalid(format!(
                "record {} belongs to layer {}, not {}",
                memory.id, memory.category, self.category
            )));
        }
        if self.records.contains_key(&memory.id) {
            return Err(MemoryError::invalid(format!(
                "duplicate identity {} in layer {}",
                memory.id, self.category
            )));
        }
        if memory.content.trim().is_empty() {
            return Err(MemoryError::invalid("content must not be empty"));
        }

        for (term, count) in term_counts(&memory) {
            self.postings.entry(term).or_default().insert(memory.id, count);
        }
        self.next_id = self.next_id.max(memory.id + 1);
        self.records.insert(memory.id, memory);
        Ok(())
    }

    /// Rank records against `query` without side effects. Returns at most
    /// `limit` entries, best first.
    pub fn rank(&self, query: &str, limit: usize) -> Vec<(MemoryId, Relevance)> {
        let mut scored: HashMap<MemoryId, Relevance> = HashMap::new();
        for term in query_terms(query) {
            let Some(posting) = self.postings.get(&term) else {
                continue;
            };
            for (&id, &count) in posting {
                let entry = scored.entry(id).or_insert(Relevance {
                    matched_terms: 0,
                    occurrences: 0,
                });
                entry.matched_terms += 1;
                entry.occurrences += count;
            }
        }

        let mut ranked: Vec<(&Memory, Relevance)> = scored
            .into_iter()
            .filter_map(|(id, rel)| self.records.get(&id).map(|m| (m, rel)))
            .collect();
        ranked.sort_by(|a, b| rank_order(*a, *b));
        ranked.truncate(limit);
        ranked.into_iter().map(|(m, rel)| (m.id, rel)).collect()
    }

    /// Record a retrieval of `id` at time `at`. Returns the updated record.
    pub fn touch(&mut self, id: MemoryId, at: DateTime<Utc>) -> Option<&Memory> {
        let memory = self.records.get_mut(&id)?;
        memory.access_count += 1;
        memory.last_accessed = Some(accessed_at(memory.last_accessed, at));
        Some(memory)
    }

    /// Ranked search. Every returned record counts as recalled.
    pub fn search(&mut self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        validate_limit(limit)?;
        let ranked = self.rank(query, limit);
        let at = now();
        Ok(ranked
            .into_iter()
            .filter_map(|(id, rel)| self.touch(id, at).map(|m| SearchHit::new(m.clone(), rel)))
            .collect())
    }

    /// Structural listing. Does not count as a recall.
    pub fn list(&self, query: &ListQuery) -> Result<Vec<Memory>> {
        query.validate()?;
        let mut matched: Vec<&Memory> = self.records.values().filter(|m| query.matches(m)).collect();
        matched.sort_by(|a, b| query.order.compare(a, b));
        Ok(matched.into_iter().take(query.limit).cloned().collect())
    }

    pub fn stats(&self) -> LayerStats {
        LayerStats::from_records(self.records.values())
    }
}

/// `last_accessed` never moves backwards, even if the clock does.
pub fn accessed_at(previous: Option<DateTime<Utc>>, at: DateTime<Utc>) -> DateTime<Utc> {
    previous.map_or(at, |prev| prev.max(at))
}
