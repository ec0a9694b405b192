//! Team scoring and escalation rules

use crate::config::{RouterConfig, ScoringWeights};
use crate::events::{AlertContext, AlertSeverity, TeamExpertise, Timestamp};
use chrono::{Local, Timelike};

/// Score a team for an alert on a 0-100 scale
///
/// The weighted sum of expertise, severity preference, spare capacity and
/// historical resolution rate is scaled by a response-time factor between
/// `response_time_floor` and 1. Unavailable teams always score 0.
pub fn score_team(team: &TeamExpertise, context: &AlertContext, weights: &ScoringWeights) -> f64 {
    if !team.available {
        return 0.0;
    }

    let expertise = if team.expertise_areas.contains(&context.category) {
        1.0
    } else {
        weights.expertise_mismatch
    };
    let severity = if team.preferred_severities.contains(&context.severity) {
        1.0
    } else {
        weights.severity_mismatch
    };
    let load = (100.0 - team.current_load) / 100.0;
    let history = team.resolution_rate / 100.0;

    let base = expertise * weights.expertise
        + severity * weights.severity
        + load * weights.load
        + history * weights.history;

    base * response_time_factor(team.response_time, weights) * 100.0
}

/// Multiplier rewarding fast responders, between `response_time_floor` and 1
pub fn response_time_factor(response_time: f64, weights: &ScoringWeights) -> f64 {
    let speed = (1.0 - response_time / weights.response_time_horizon).max(0.0);
    weights.response_time_floor + (1.0 - weights.response_time_floor) * speed
}

/// Base escalation tier for a severity
pub fn base_escalation(severity: AlertSeverity) -> u8 {
    match severity {
        AlertSeverity::Low => 1,
        AlertSeverity::Normal => 2,
        AlertSeverity::High => 3,
        AlertSeverity::Critical => 4,
    }
}

/// Escalation tier (1-5) for an alert
///
/// A burst of recent resolutions adds one tier; outside business hours the
/// tier is raised to `off_hours_min_escalation`.
pub fn escalation_level(
    severity: AlertSeverity,
    recent_resolutions: usize,
    at: Timestamp,
    config: &RouterConfig,
) -> u8 {
    let mut level = base_escalation(severity);

    if recent_resolutions > config.recent_resolution_threshold {
        level = (level + 1).min(5);
    }
    if !is_business_hours(at, config) {
        level = level.max(config.off_hours_min_escalation);
    }

    level.clamp(1, 5)
}

/// Whether `at` falls in business hours in the router's timezone
pub fn is_business_hours(at: Timestamp, config: &RouterConfig) -> bool {
    let hour = match config.fixed_offset() {
        Some(offset) => at.with_timezone(&offset).hour(),
        None => at.with_timezone(&Local).hour(),
    };
    hour >= config.business_hours_start && hour < config.business_hours_end
}
