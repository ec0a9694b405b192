//! Keyword patterns learned from resolution outcomes
//!
//! Every sufficiently long term of a resolved error description becomes a
//! case-insensitive pattern pointing at the team that handled it. Confidence is
//! reinforced by successful outcomes and weakened by failures. When terms
//! overlap across teams the earliest learned pattern wins.

use crate::config::PatternLearningConfig;
use crate::error::RoutingError;
use crate::events::{HistoricalResolution, Timestamp};
use log::{debug, warn};
use regex::Regex;

/// A learned keyword→team association
#[derive(Debug, Clone)]
pub struct PatternEntry {
    /// Table key, `term:<token>`
    pub key: String,
    pub term: String,
    pub regex: Regex,
    pub team_id: String,
    pub confidence: f64,
    /// Number of resolutions that mentioned the term
    pub observations: u32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PatternEntry {
    fn new(term: &str, resolution: &HistoricalResolution, confidence: f64) -> Result<Self, RoutingError> {
        let regex = Regex::new(&format!("(?i){}", regex::escape(term)))?;
        Ok(Self {
            key: format!("term:{}", term),
            term: term.to_string(),
            regex,
            team_id: resolution.team_id.clone(),
            confidence,
            observations: 1,
            created_at: resolution.timestamp,
            updated_at: resolution.timestamp,
        })
    }

    /// Whether the pattern matches the message or the endpoint
    pub fn matches(&self, message: &str, endpoint: Option<&str>) -> bool {
        self.regex.is_match(message) || endpoint.is_some_and(|e| self.regex.is_match(e))
    }
}

/// Insertion-ordered table of learned patterns with a size cap
#[derive(Debug, Clone)]
pub struct PatternTable {
    entries: Vec<PatternEntry>,
    config: PatternLearningConfig,
}

impl Default for PatternTable {
    fn default() -> Self {
        Self::new(PatternLearningConfig::default())
    }
}

impl PatternTable {
    /// Create an empty table holding at most `config.max_patterns` entries (minimum 1)
    pub fn new(mut config: PatternLearningConfig) -> Self {
        config.max_patterns = config.max_patterns.max(1);
        Self {
            entries: Vec::new(),
            config,
        }
    }

    /// Split free text into lowercase ASCII alphanumeric terms longer than the
    /// configured minimum, each term reported once in order of appearance
    ///
    /// Any other character, including non-ASCII letters, separates terms.
    pub fn extract_terms(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let mut terms: Vec<String> = Vec::new();
        for token in lowered.split(|c: char| !c.is_ascii_alphanumeric()) {
            if token.len() > self.config.min_term_length
                && !terms.iter().any(|t| t == token)
            {
                terms.push(token.to_string());
            }
        }
        terms
    }

    /// Update the table from one resolution outcome
    ///
    /// New terms get an initial confidence depending on the outcome; known terms
    /// are nudged up or down within the configured bounds.
    ///
    /// # Returns
    ///
    /// Number of newly created patterns
    ///
    /// # Errors
    ///
    /// Returns `RoutingError::PatternError` if a term cannot be compiled. Terms
    /// processed before the failing one stay applied.
    pub fn learn(&mut self, resolution: &HistoricalResolution) -> Result<usize, RoutingError> {
        let mut created = 0;

        for term in self.extract_terms(&resolution.error_pattern) {
            let key = format!("term:{}", term);
            if let Some(entry) = self.entries.iter_mut().find(|e| e.key == key) {
                let delta = if resolution.success {
                    self.config.step
                } else {
                    -self.config.step
                };
                entry.confidence = (entry.confidence + delta)
                    .clamp(self.config.min_confidence, self.config.max_confidence);
                entry.observations += 1;
                entry.updated_at = resolution.timestamp;
                debug!(
                    "Pattern '{}' confidence now {:.2} ({} observations)",
                    entry.key, entry.confidence, entry.observations
                );
                continue;
            }

            let confidence = if resolution.success {
                self.config.success_confidence
            } else {
                self.config.failure_confidence
            }
            .clamp(self.config.min_confidence, self.config.max_confidence);

            let entry = PatternEntry::new(&term, resolution, confidence)?;
            self.make_room();
            debug!(
                "Learned pattern '{}' for team '{}' at confidence {:.2}",
                entry.key, entry.team_id, entry.confidence
            );
            self.entries.push(entry);
            created += 1;
        }

        Ok(created)
    }

    /// First pattern, in insertion order, that matches and passes `eligible`
    pub fn find_match<F>(&self, message: &str, endpoint: Option<&str>, eligible: F) -> Option<&PatternEntry>
    where
        F: Fn(&PatternEntry) -> bool,
    {
        self.entries
            .iter()
            .find(|entry| entry.matches(message, endpoint) && eligible(entry))
    }

    pub fn get(&self, key: &str) -> Option<&PatternEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PatternEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Evict the weakest pattern if the table is full
    ///
    /// The lowest confidence goes first, the least recently updated on ties.
    fn make_room(&mut self) {
        if self.entries.len() < self.config.max_patterns {
            return;
        }

        let weakest = self
            .entries
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                a.confidence
                    .total_cmp(&b.confidence)
                    .then(a.updated_at.cmp(&b.updated_at))
            })
            .map(|(index, _)| index);

        if let Some(index) = weakest {
            let evicted = self.entries.remove(index);
            warn!(
                "Pattern table full ({} entries), evicted '{}' at confidence {:.2}",
                self.config.max_patterns, evicted.key, evicted.confidence
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn resolution(text: &str, team_id: &str, success: bool, minute: i64) -> HistoricalResolution {
        HistoricalResolution {
            error_pattern: text.to_string(),
            team_id: team_id.to_string(),
            resolution_time: 15.0,
            success,
            timestamp: Utc.with_ymd_and_hms(2026, 5, 4, 10, 0, 0).unwrap()
                + Duration::minutes(minute),
        }
    }

    #[test]
    fn test_extract_terms() {
        let table = PatternTable::default();
        let terms = table.extract_terms("Stripe API timeout: card_declined (HTTP 502) - TIMEOUT again");
        assert_eq!(terms, vec!["stripe", "timeout", "card", "declined", "http", "again"]);
    }

    #[test]
    fn test_extract_terms_skips_short_tokens() {
        let table = PatternTable::default();
        assert!(table.extract_terms("db is up, 500").is_empty());
        assert!(table.extract_terms("").is_empty());
    }

    #[test]
    fn test_learn_creates_patterns_with_outcome_confidence() {
        let mut table = PatternTable::default();
        assert_eq!(table.learn(&resolution("Payment timeout", "payments", true, 0)).unwrap(), 2);
        assert_eq!(table.learn(&resolution("Database deadlock", "dba", false, 1)).unwrap(), 2);

        let timeout = table.get("term:timeout").unwrap();
        assert_eq!(timeout.team_id, "payments");
        assert_eq!(timeout.confidence, 0.8);

        let deadlock = table.get("term:deadlock").unwrap();
        assert_eq!(deadlock.team_id, "dba");
        assert_eq!(deadlock.confidence, 0.3);
    }

    #[test]
    fn test_learn_nudges_existing_within_bounds() {
        let mut table = PatternTable::default();
        for minute in 0..5 {
            table.learn(&resolution("timeout", "payments", true, minute)).unwrap();
        }
        let entry = table.get("term:timeout").unwrap();
        assert_eq!(entry.confidence, 0.95);
        assert_eq!(entry.observations, 5);

        for minute in 5..20 {
            table.learn(&resolution("timeout", "payments", false, minute)).unwrap();
        }
        assert!((table.get("term:timeout").unwrap().confidence - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_existing_pattern_keeps_original_team() {
        let mut table = PatternTable::default();
        table.learn(&resolution("timeout", "payments", true, 0)).unwrap();
        table.learn(&resolution("timeout", "platform", true, 1)).unwrap();
        assert_eq!(table.get("term:timeout").unwrap().team_id, "payments");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_find_match_is_case_insensitive_and_first_wins() {
        let mut table = PatternTable::default();
        table.learn(&resolution("gateway timeout", "payments", true, 0)).unwrap();
        table.learn(&resolution("timeout", "platform", true, 1)).unwrap();

        let hit = table.find_match("Upstream GATEWAY unreachable", None, |_| true).unwrap();
        assert_eq!(hit.key, "term:gateway");

        let hit = table
            .find_match("", Some("/api/checkout/TIMEOUT"), |_| true)
            .unwrap();
        assert_eq!(hit.team_id, "payments");

        assert!(table.find_match("all good", None, |_| true).is_none());
    }

    #[test]
    fn test_find_match_respects_eligibility() {
        let mut table = PatternTable::default();
        table.learn(&resolution("timeout", "payments", true, 0)).unwrap();
        table.learn(&resolution("checkout timeout", "platform", true, 1)).unwrap();

        let hit = table
            .find_match("checkout timeout", None, |e| e.team_id != "payments")
            .unwrap();
        assert_eq!(hit.key, "term:checkout");
    }

    #[test]
    fn test_dotted_text_splits_into_terms() {
        let mut table = PatternTable::default();
        table.learn(&resolution("booking.confirm failed", "booking", true, 0)).unwrap();
        assert!(table.get("term:confirm").is_some());
        assert!(table.find_match("Confirm step", None, |_| true).is_some());
    }

    #[test]
    fn test_table_cap_evicts_weakest() {
        let config = PatternLearningConfig {
            max_patterns: 2,
            ..PatternLearningConfig::default()
        };
        let mut table = PatternTable::new(config);

        table.learn(&resolution("alpha", "a", false, 0)).unwrap();
        table.learn(&resolution("bravo", "b", true, 1)).unwrap();
        table.learn(&resolution("charlie", "c", true, 2)).unwrap();

        assert_eq!(table.len(), 2);
        assert!(table.get("term:alpha").is_none());
        let keys: Vec<&str> = table.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["term:bravo", "term:charlie"]);
    }

    #[test]
    fn test_table_cap_breaks_ties_by_age() {
        let config = PatternLearningConfig {
            max_patterns: 2,
            ..PatternLearningConfig::default()
        };
        let mut table = PatternTable::new(config);

        table.learn(&resolution("alpha", "a", true, 0)).unwrap();
        table.learn(&resolution("bravo", "b", true, 1)).unwrap();
        table.learn(&resolution("charlie", "c", true, 2)).unwrap();

        assert!(table.get("term:alpha").is_none());
        assert!(table.get("term:bravo").is_some());
    }

    #[test]
    fn test_zero_capacity_table_holds_one_pattern() {
        let config = PatternLearningConfig {
            max_patterns: 0,
            ..PatternLearningConfig::default()
        };
        let mut table = PatternTable::new(config);

        table.learn(&resolution("alpha bravo", "a", true, 0)).unwrap();
        table.learn(&resolution("charlie", "c", true, 1)).unwrap();

        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_non_ascii_letters_separate_terms() {
        let table = PatternTable::default();
        assert_eq!(table.extract_terms("naïve café timeout"), vec!["timeout"]);
        assert_eq!(table.extract_terms("Überlast netzwerk"), vec!["berlast", "netzwerk"]);
    }
}
