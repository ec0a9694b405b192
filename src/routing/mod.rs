/// Alert routing, team registry and pattern learning
pub mod history;
pub mod patterns;
pub mod router;
pub mod scoring;

pub use history::ResolutionHistory;
pub use patterns::{PatternEntry, PatternTable};
pub use router::{AlertRouter, RouterStatistics, DEFAULT_TEAM_ID, FALLBACK_REASON, PATTERN_MATCH_REASON};
