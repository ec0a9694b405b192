use crate::config::RouterConfig;
use crate::error::RoutingError;
use crate::events::{AlertContext, AlertRoutingDecision, HistoricalResolution, TeamExpertise};
use crate::routing::history::ResolutionHistory;
use crate::routing::patterns::{PatternEntry, PatternTable};
use crate::routing::scoring::{escalation_level, score_team};
use chrono::{Duration, Utc};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Team id used when no registered team can take an alert
pub const DEFAULT_TEAM_ID: &str = "default";

pub const PATTERN_MATCH_REASON: &str = "Pattern match";
pub const FALLBACK_REASON: &str = "Fallback routing - no optimal team found";

/// Aggregate view of the router's decisions, outcomes and registries
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouterStatistics {
    pub total_decisions: u64,
    pub pattern_decisions: u64,
    pub scored_decisions: u64,
    pub fallback_decisions: u64,
    pub total_resolutions: usize,
    pub successful_resolutions: usize,
    /// Percentage of successful resolutions (0-100)
    pub success_rate: f64,
    /// Mean resolution time in minutes
    pub average_resolution_time: f64,
    pub team_count: usize,
    pub available_teams: usize,
    pub pattern_count: usize,
    pub resolutions_by_team: BTreeMap<String, usize>,
}

/// How the primary team of a decision was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selection {
    Pattern,
    Scored,
}

/// Decides which response team owns each alert
///
/// The AlertRouter holds the team registry, the learned pattern table and a
/// capped history of resolution outcomes. Routing never fails: internal errors
/// are turned into a low-confidence fallback decision and logged.
#[derive(Debug, Clone)]
pub struct AlertRouter {
    /// Registered teams in registration order
    teams: Vec<TeamExpertise>,
    patterns: PatternTable,
    history: ResolutionHistory,
    config: RouterConfig,
    pattern_decisions: u64,
    scored_decisions: u64,
    fallback_decisions: u64,
}

impl Default for AlertRouter {
    fn default() -> Self {
        Self::new(RouterConfig::default())
    }
}

impl AlertRouter {
    pub fn new(config: RouterConfig) -> Self {
        Self {
            teams: Vec::new(),
            patterns: PatternTable::new(config.patterns.clone()),
            history: ResolutionHistory::new(config.max_history),
            config,
            pattern_decisions: 0,
            scored_decisions: 0,
            fallback_decisions: 0,
        }
    }

    /// Route an alert to a primary team
    ///
    /// Learned patterns are tried first, then every team is scored. Internal
    /// failures produce [`AlertRoutingDecision::fallback`] instead of an error.
    pub fn route_alert(&mut self, context: &AlertContext) -> AlertRoutingDecision {
        match self.try_route(context) {
            Ok((decision, selection)) => {
                match selection {
                    Selection::Pattern => self.pattern_decisions += 1,
                    Selection::Scored => self.scored_decisions += 1,
                }
                debug!(
                    "Routed alert {} to '{}' (escalation {}, confidence {:.2}): {}",
                    context.alert_id,
                    decision.primary_team,
                    decision.escalation_level,
                    decision.confidence,
                    decision.routing_reason
                );
                decision
            }
            Err(e) => {
                self.fallback_decisions += 1;
                let decision = AlertRoutingDecision::fallback(context, &self.teams, &self.config);
                error!(
                    "Routing failed for alert {} (error {}, category {:?}): {}; falling back to '{}'",
                    context.alert_id, context.error_id, context.category, e, decision.primary_team
                );
                decision
            }
        }
    }

    /// Run the routing pipeline, surfacing internal failures
    fn try_route(
        &self,
        context: &AlertContext,
    ) -> Result<(AlertRoutingDecision, Selection), RoutingError> {
        let (primary, confidence, reason, selection) = match self.match_pattern(context) {
            Some(pattern) => (
                pattern.team_id.clone(),
                pattern.confidence,
                PATTERN_MATCH_REASON.to_string(),
                Selection::Pattern,
            ),
            None => {
                let (team, score) = self.select_by_score(context)?;
                (
                    team.team_id.clone(),
                    score / 100.0,
                    format!(
                        "Scored selection: {} scored {:.1} for {:?} {:?}",
                        team.team_name, score, context.severity, context.category
                    ),
                    Selection::Scored,
                )
            }
        };

        let recent = self.history.count_within(
            context.timestamp,
            Duration::minutes(self.config.recent_window_minutes),
        );
        let escalation = escalation_level(context.severity, recent, context.timestamp, &self.config);

        let primary_team = self.team(&primary);
        let decision = AlertRoutingDecision {
            alert_id: context.alert_id.clone(),
            error_id: context.error_id.clone(),
            secondary_team: self.secondary_team(&primary).map(|t| t.team_id.clone()),
            escalation_level: escalation,
            estimated_response_time: primary_team
                .map(|t| t.response_time)
                .unwrap_or(self.config.default_response_time),
            confidence: confidence.clamp(0.0, 1.0),
            routing_reason: reason,
            notification_channels: primary_team
                .map(|t| t.notification_channels.clone())
                .filter(|channels| !channels.is_empty())
                .unwrap_or_else(|| self.config.default_channels.clone()),
            primary_team: primary,
            timestamp: Utc::now(),
        };

        Ok((decision, selection))
    }

    /// First learned pattern matching the alert whose team can take it
    ///
    /// Patterns pointing at a registered but unavailable team are skipped.
    fn match_pattern(&self, context: &AlertContext) -> Option<&PatternEntry> {
        self.patterns.find_match(
            &context.message,
            context.endpoint.as_deref(),
            |pattern| self.team(&pattern.team_id).map_or(true, |t| t.available),
        )
    }

    /// Highest-scoring viable team, or the highest-scoring team if none is viable
    fn select_by_score(&self, context: &AlertContext) -> Result<(&TeamExpertise, f64), RoutingError> {
        let mut best: Option<(&TeamExpertise, f64)> = None;
        let mut best_viable: Option<(&TeamExpertise, f64)> = None;

        for team in &self.teams {
            let score = score_team(team, context, &self.config.weights);
            if !score.is_finite() {
                return Err(RoutingError::InvalidScore {
                    team_id: team.team_id.clone(),
                    score,
                });
            }

            if best.map_or(true, |(_, s)| score > s) {
                best = Some((team, score));
            }
            if score > 0.0 && best_viable.map_or(true, |(_, s)| score > s) {
                best_viable = Some((team, score));
            }
        }

        match (best_viable, best) {
            (Some(viable), _) => Ok(viable),
            (None, Some(degraded)) => {
                warn!(
                    "No viable team for alert {}, degrading to '{}'",
                    context.alert_id, degraded.0.team_id
                );
                Ok(degraded)
            }
            (None, None) => Err(RoutingError::NoTeamsRegistered),
        }
    }

    /// Available team with the best resolution rate, other than `primary`
    fn secondary_team(&self, primary: &str) -> Option<&TeamExpertise> {
        self.teams
            .iter()
            .filter(|t| t.available && t.team_id != primary)
            .fold(None, |best: Option<&TeamExpertise>, team| match best {
                Some(b) if b.resolution_rate >= team.resolution_rate => Some(b),
                _ => Some(team),
            })
    }

    /// Register a team, replacing any team with the same id
    ///
    /// Load and resolution rate are clamped to 0-100.
    pub fn add_team(&mut self, mut team: TeamExpertise) {
        team.current_load = team.current_load.clamp(0.0, 100.0);
        team.resolution_rate = team.resolution_rate.clamp(0.0, 100.0);
        if team.response_time <= 0.0 {
            warn!(
                "Team '{}' has non-positive response time {}",
                team.team_id, team.response_time
            );
        }

        match self.teams.iter_mut().find(|t| t.team_id == team.team_id) {
            Some(existing) => {
                warn!("Replacing registered team '{}'", team.team_id);
                *existing = team;
            }
            None => {
                info!("Registered team '{}' ({})", team.team_id, team.team_name);
                self.teams.push(team);
            }
        }
    }

    /// Mark a team available or unavailable
    ///
    /// # Returns
    ///
    /// `false` if the team is not registered
    pub fn update_team_availability(&mut self, team_id: &str, available: bool) -> bool {
        match self.teams.iter_mut().find(|t| t.team_id == team_id) {
            Some(team) => {
                team.available = available;
                info!("Team '{}' availability set to {}", team_id, available);
                true
            }
            None => {
                warn!("Cannot update availability of unknown team '{}'", team_id);
                false
            }
        }
    }

    /// Set a team's current load, clamped to 0-100
    ///
    /// # Returns
    ///
    /// `false` if the team is not registered
    pub fn update_team_load(&mut self, team_id: &str, load: f64) -> bool {
        match self.teams.iter_mut().find(|t| t.team_id == team_id) {
            Some(team) => {
                let clamped = load.clamp(0.0, 100.0);
                if clamped != load {
                    warn!(
                        "Load {} for team '{}' out of range, clamped to {}",
                        load, team_id, clamped
                    );
                }
                team.current_load = clamped;
                true
            }
            None => {
                warn!("Cannot update load of unknown team '{}'", team_id);
                false
            }
        }
    }

    /// Record a resolution outcome and learn keyword patterns from it
    pub fn record_resolution(&mut self, resolution: HistoricalResolution) {
        match self.patterns.learn(&resolution) {
            Ok(created) if created > 0 => debug!(
                "Learned {} new pattern(s) from resolution by '{}'",
                created, resolution.team_id
            ),
            Ok(_) => {}
            Err(e) => warn!(
                "Pattern learning failed for resolution by '{}': {}",
                resolution.team_id, e
            ),
        }

        if let Some(evicted) = self.history.record(resolution) {
            debug!(
                "Resolution history full, evicted entry from {}",
                evicted.timestamp
            );
        }
    }

    pub fn get_statistics(&self) -> RouterStatistics {
        RouterStatistics {
            total_decisions: self.pattern_decisions + self.scored_decisions + self.fallback_decisions,
            pattern_decisions: self.pattern_decisions,
            scored_decisions: self.scored_decisions,
            fallback_decisions: self.fallback_decisions,
            total_resolutions: self.history.len(),
            successful_resolutions: self.history.successes(),
            success_rate: self.history.success_rate(),
            average_resolution_time: self.history.average_resolution_time(),
            team_count: self.teams.len(),
            available_teams: self.teams.iter().filter(|t| t.available).count(),
            pattern_count: self.patterns.len(),
            resolutions_by_team: self.history.counts_by_team(),
        }
    }

    pub fn team(&self, team_id: &str) -> Option<&TeamExpertise> {
        self.teams.iter().find(|t| t.team_id == team_id)
    }

    pub fn teams(&self) -> &[TeamExpertise] {
        &self.teams
    }

    pub fn patterns(&self) -> &PatternTable {
        &self.patterns
    }

    pub fn history(&self) -> &ResolutionHistory {
        &self.history
    }
}

impl AlertRoutingDecision {
    /// Guaranteed decision used when the routing pipeline fails
    ///
    /// Picks the least-loaded available team, or [`DEFAULT_TEAM_ID`] when no team
    /// is available, with a fixed escalation level and confidence.
    pub fn fallback(context: &AlertContext, teams: &[TeamExpertise], config: &RouterConfig) -> Self {
        let team = teams
            .iter()
            .filter(|t| t.available)
            .min_by(|a, b| a.current_load.total_cmp(&b.current_load));

        Self {
            alert_id: context.alert_id.clone(),
            error_id: context.error_id.clone(),
            primary_team: team
                .map(|t| t.team_id.clone())
                .unwrap_or_else(|| DEFAULT_TEAM_ID.to_string()),
            secondary_team: None,
            escalation_level: config.fallback_escalation,
            estimated_response_time: team
                .map(|t| t.response_time)
                .unwrap_or(config.default_response_time),
            confidence: config.fallback_confidence,
            routing_reason: FALLBACK_REASON.to_string(),
            notification_channels: team
                .map(|t| t.notification_channels.clone())
                .filter(|channels| !channels.is_empty())
                .unwrap_or_else(|| config.default_channels.clone()),
            timestamp: Utc::now(),
        }
    }
}


// Property-based tests
#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::events::{AlertSeverity, ErrorCategory};
    use chrono::TimeZone;
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;
    use std::collections::HashSet;

    const CATEGORIES: [ErrorCategory; 10] = [
        ErrorCategory::Network,
        ErrorCategory::Database,
        ErrorCategory::Payment,
        ErrorCategory::Authentication,
        ErrorCategory::Validation,
        ErrorCategory::Performance,
        ErrorCategory::ExternalApi,
        ErrorCategory::Booking,
        ErrorCategory::Ui,
        ErrorCategory::Unknown,
    ];

    const SEVERITIES: [AlertSeverity; 4] = [
        AlertSeverity::Low,
        AlertSeverity::Normal,
        AlertSeverity::High,
        AlertSeverity::Critical,
    ];

    /// Arbitrary alert with a random category, severity, hour and message
    #[derive(Debug, Clone)]
    struct ArbitraryAlert(AlertContext);

    impl Arbitrary for ArbitraryAlert {
        fn arbitrary(g: &mut Gen) -> Self {
            let hour = u32::arbitrary(g) % 24;
            let timestamp = Utc.with_ymd_and_hms(2026, 5, 4, hour, 0, 0).unwrap();
            let category = *g.choose(&CATEGORIES).unwrap();
            let severity = *g.choose(&SEVERITIES).unwrap();
            ArbitraryAlert(AlertContext::new(
                "a",
                "e",
                category,
                severity,
                String::arbitrary(g),
                timestamp,
            ))
        }
    }

    /// Arbitrary team registry (possibly empty, possibly all unavailable)
    #[derive(Debug, Clone)]
    struct ArbitraryTeams(Vec<TeamExpertise>);

    impl Arbitrary for ArbitraryTeams {
        fn arbitrary(g: &mut Gen) -> Self {
            let count = usize::arbitrary(g) % 5;
            let teams = (0..count)
                .map(|i| TeamExpertise {
                    team_id: format!("team-{}", i),
                    team_name: format!("Team {}", i),
                    expertise_areas: HashSet::from([*g.choose(&CATEGORIES).unwrap()]),
                    preferred_severities: HashSet::from([*g.choose(&SEVERITIES).unwrap()]),
                    response_time: (u8::arbitrary(g) % 240) as f64 + 1.0,
                    resolution_rate: (u8::arbitrary(g) % 101) as f64,
                    current_load: (u8::arbitrary(g) % 101) as f64,
                    available: bool::arbitrary(g),
                    notification_channels: vec!["slack".to_string()],
                })
                .collect();
            ArbitraryTeams(teams)
        }
    }

    #[quickcheck]
    fn prop_every_alert_gets_one_primary_and_valid_escalation(
        teams: ArbitraryTeams,
        alert: ArbitraryAlert,
        resolutions: u8,
    ) -> bool {
        let mut router = AlertRouter::new(RouterConfig {
            utc_offset_minutes: Some(0),
            ..RouterConfig::default()
        });
        for team in teams.0.clone() {
            router.add_team(team);
        }
        for i in 0..(resolutions % 12) {
            router.record_resolution(HistoricalResolution {
                error_pattern: alert.0.message.clone(),
                team_id: format!("team-{}", i % 3),
                resolution_time: 10.0,
                success: i % 2 == 0,
                timestamp: alert.0.timestamp,
            });
        }

        let decision = router.route_alert(&alert.0);
        let available: Vec<&str> = teams
            .0
            .iter()
            .filter(|t| t.available)
            .map(|t| t.team_id.as_str())
            .collect();

        let primary_ok = !decision.primary_team.is_empty();
        let escalation_ok = (1..=5).contains(&decision.escalation_level);
        let confidence_ok = (0.0..=1.0).contains(&decision.confidence);
        let secondary_ok = decision
            .secondary_team
            .as_deref()
            .map_or(true, |s| s != decision.primary_team && available.contains(&s));

        primary_ok && escalation_ok && confidence_ok && secondary_ok
    }
}
