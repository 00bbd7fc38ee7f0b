use serde::Serialize;

use crate::tool::ToolOutput;

/// How many relevant entries are handed back to the planner
pub const MAX_RELEVANT_ENTRIES: usize = 5;

/// One answered query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryEntry {
    pub query: String,
    pub results: Vec<ToolOutput>,
    pub response: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl MemoryEntry {
    pub fn new<Q: Into<String>, R: Into<String>>(
        query: Q,
        results: Vec<ToolOutput>,
        response: R,
    ) -> Self {
        Self {
            query: query.into(),
            results,
            response: response.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Whether any whitespace-separated term of `query` occurs in this entry's JSON form
    fn is_relevant(&self, terms: &[String]) -> bool {
        let serialized = serde_json::to_string(self)
            .unwrap_or_default()
            .to_lowercase();
        terms.iter().any(|term| serialized.contains(term.as_str()))
    }
}

/// Append-only record of past interactions for the lifetime of the process
#[derive(Debug, Default)]
pub struct MemorySystem {
    entries: Vec<MemoryEntry>,
}

impl MemorySystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entry(&mut self, entry: MemoryEntry) {
        self.entries.push(entry);
    }

    /// The most recent matching entries, oldest first, at most [`MAX_RELEVANT_ENTRIES`]
    pub fn relevant_context(&self, query: &str) -> Vec<MemoryEntry> {
        let terms: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(String::from)
            .collect();

        let matching: Vec<&MemoryEntry> = self
            .entries
            .iter()
            .filter(|entry| entry.is_relevant(&terms))
            .collect();

        let skip = matching.len().saturating_sub(MAX_RELEVANT_ENTRIES);
        matching.into_iter().skip(skip).cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[MemoryEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(query: &str, response: &str) -> MemoryEntry {
        MemoryEntry::new(query, vec![], response)
    }

    #[test]
    fn test_relevant_entry_found() {
        let mut memory = MemorySystem::new();
        memory.add_entry(entry("largest token transfer today", "A 40k STRK transfer."));
        memory.add_entry(entry("block times", "About 30 seconds."));

        let context = memory.relevant_context("transfer");
        assert_eq!(context.len(), 1);
        assert_eq!(context[0].query, "largest token transfer today");
    }

    #[test]
    fn test_empty_memory_returns_nothing() {
        let memory = MemorySystem::new();
        assert!(memory.relevant_context("transfer").is_empty());
    }

    #[test]
    fn test_match_is_case_insensitive_and_any_term() {
        let mut memory = MemorySystem::new();
        memory.add_entry(entry("NFT holders", "Mostly whales."));

        assert_eq!(memory.relevant_context("Whales or dolphins").len(), 1);
        assert!(memory.relevant_context("bridge").is_empty());
    }

    #[test]
    fn test_at_most_five_most_recent_in_order() {
        let mut memory = MemorySystem::new();
        for i in 0..10 {
            memory.add_entry(entry(&format!("transfer #{}", i), "ok"));
        }

        let context = memory.relevant_context("transfer");
        let queries: Vec<&str> = context.iter().map(|e| e.query.as_str()).collect();
        assert_eq!(
            queries,
            vec!["transfer #5", "transfer #6", "transfer #7", "transfer #8", "transfer #9"]
        );
    }

    #[test]
    fn test_non_matching_entries_do_not_count_toward_limit() {
        let mut memory = MemorySystem::new();
        memory.add_entry(entry("bridge volume", "low"));
        for i in 0..6 {
            memory.add_entry(entry(&format!("gas price {}", i), "fine"));
        }

        let context = memory.relevant_context("bridge");
        assert_eq!(context.len(), 1);
        assert_eq!(context[0].query, "bridge volume");
    }

    #[test]
    fn test_blank_query_matches_nothing() {
        let mut memory = MemorySystem::new();
        memory.add_entry(entry("block times", "About 30 seconds."));
        assert!(memory.relevant_context("   ").is_empty());
    }

    #[test]
    fn test_clear() {
        let mut memory = MemorySystem::new();
        memory.add_entry(entry("block times", "About 30 seconds."));
        memory.clear();
        assert!(memory.entries().is_empty());
    }
}
