//! Unit ranking engine.
//!
//! Scores candidate units against a call location and returns the best few,
//! lower score first. The score starts at great-circle distance in miles and
//! is adjusted by unit state and skill fit, then divided by the call's
//! priority weight. Pure over its inputs; callers load the units and persist
//! nothing here.

use uuid::Uuid;

use crate::config::RankingConfig;
use crate::geo;
use crate::models::{CallPriority, UnitStatus, unit};

/// Incident keywords that call for a specialist skill tag.
const SKILL_TRIGGERS: &[(&str, &str)] = &[
    ("k9", "K9"),
    ("canine", "K9"),
    ("tracking", "K9"),
    ("hostage", "Negotiator"),
    ("negotiat", "Negotiator"),
    ("swat", "SWAT"),
    ("barricad", "SWAT"),
    ("active threat", "SWAT"),
    ("overdose", "EMS"),
    ("medical", "EMS"),
    ("injur", "EMS"),
    ("unconscious", "EMS"),
];

/// One ranked candidate for a call.
#[derive(Debug, Clone, PartialEq, serde::Serialize, utoipa::ToSchema)]
pub struct UnitRecommendation {
    /// Unit identifier
    pub unit_id: Uuid,
    /// Unit call sign
    pub unit_name: String,
    /// Composite score; lower is better
    pub score: f64,
    /// Great-circle distance from the call in statute miles
    pub distance_miles: f64,
    /// Straight-line ETA in whole minutes
    pub eta_minutes: u32,
    /// Specialist skills the unit has that the incident calls for
    pub matched_skills: Vec<String>,
    /// Short human-readable justification
    pub rationale: String,
}

/// Specialist skills the incident text calls for, deduplicated in trigger
/// order.
pub fn required_skills(incident_text: &str) -> Vec<String> {
    let text = incident_text.to_lowercase();
    let mut skills: Vec<String> = Vec::new();
    for (trigger, skill) in SKILL_TRIGGERS {
        if text.contains(trigger) && !skills.iter().any(|s| s == skill) {
            skills.push((*skill).to_string());
        }
    }
    skills
}

/// Rank units for a call at (`target_lat`, `target_lon`).
///
/// Units without a known position are never returned. Eligibility is
/// `Available` by default; with `relaxed_eligibility` set, `Enroute` and
/// `On Patrol` units also compete (en-route units carry an additive miles
/// penalty). Results are sorted ascending by score with the unit id as a
/// deterministic tie-break, capped at `max_results`.
pub fn rank_units(
    target_lat: f64,
    target_lon: f64,
    priority: CallPriority,
    incident_text: &str,
    units: &[unit::Model],
    config: &RankingConfig,
) -> Vec<UnitRecommendation> {
    let needed_skills = required_skills(incident_text);
    let mut ranked: Vec<UnitRecommendation> = Vec::new();

    for unit in units {
        let Some(status) = UnitStatus::parse(&unit.status) else {
            continue;
        };
        if !is_eligible(status, config) {
            continue;
        }
        let (Some(lat), Some(lon)) = (unit.lat, unit.lon) else {
            continue;
        };
        let Ok(distance) = geo::distance_miles(target_lat, target_lon, lat, lon) else {
            continue;
        };

        let mut score = distance;
        if status == UnitStatus::Enroute {
            score += config.enroute_penalty_miles;
        }

        let tags = unit.skill_tags();
        let matched_skills: Vec<String> = needed_skills
            .iter()
            .filter(|needed| tags.iter().any(|tag| tag.eq_ignore_ascii_case(needed)))
            .cloned()
            .collect();
        for _ in &matched_skills {
            score *= config.skill_match_factor;
        }
        if unit.is_supervisor {
            score *= config.supervisor_factor;
        }
        if status == UnitStatus::OnPatrol {
            score *= config.patrol_factor;
        }
        score /= priority.weight();

        let rationale = if status == UnitStatus::Enroute {
            "Already en route nearby".to_string()
        } else if let Some(skill) = matched_skills.first() {
            format!("Closest unit with {skill} capability")
        } else {
            "Closest available unit".to_string()
        };

        ranked.push(UnitRecommendation {
            unit_id: unit.id,
            unit_name: unit.name.clone(),
            score,
            distance_miles: distance,
            eta_minutes: geo::eta_minutes(distance, config.avg_speed_mph),
            matched_skills,
            rationale,
        });
    }

    ranked.sort_by(|a, b| {
        a.score
            .partial_cmp(&b.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.unit_id.cmp(&b.unit_id))
    });
    ranked.truncate(config.max_results);
    ranked
}

fn is_eligible(status: UnitStatus, config: &RankingConfig) -> bool {
    match status {
        UnitStatus::Available => true,
        UnitStatus::Enroute | UnitStatus::OnPatrol => config.relaxed_eligibility,
        _ => false,
    }
}
