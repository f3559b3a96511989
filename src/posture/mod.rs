//! Posture Assessment Module
//!
//! Derives an organization-level security posture from the scored asset
//! collection: a weighted composite score, a maturity level, and a fixed
//! taxonomy of themes and attacker profiles. Fully deterministic; the
//! optional simulation argument only adds a signal, never randomness.

use std::collections::HashMap;

use crate::errors::{PerimeterError, PerimeterResult};
use crate::models::{
    Asset, AttackSimulation, AttackerProfile, MaturityLevel, PostureAssessment, Severity,
};
use crate::scoring::{self, admin_keyword, env_keyword};

// ── Severity weights for the posture penalty ──

pub const WEIGHT_CRITICAL: f64 = 1.0;
pub const WEIGHT_HIGH: f64 = 0.7;
pub const WEIGHT_MEDIUM: f64 = 0.4;
pub const WEIGHT_LOW: f64 = 0.15;
pub const WEIGHT_INFORMATIONAL: f64 = 0.0;

/// Severity distribution scales into a 60-point penalty range
pub const SEVERITY_PENALTY_SCALE: f64 = 60.0;

/// Shared-infrastructure penalty cap
pub const CONCENTRATION_PENALTY_MAX: f64 = 15.0;

/// Service-density penalty cap
pub const DENSITY_PENALTY_MAX: f64 = 10.0;

/// Average open ports per asset below which density is not penalized
pub const DENSITY_FREE_THRESHOLD: f64 = 1.5;

/// Posture score for an empty attack surface: no exposure is a strong
/// posture, but the floor confidence reflects how little was observed.
pub const EMPTY_SURFACE_SCORE: u8 = 85;

/// Hard score ceiling while any Critical asset exists
pub const CRITICAL_SCORE_CEILING: u8 = 45;

// ── Maturity thresholds (partition [0, 100] like the severity table) ──

pub const ADVANCED_MIN: u8 = 75;
pub const INTERMEDIATE_MIN: u8 = 55;
pub const DEVELOPING_MIN: u8 = 30;

// ── Confidence model ──

pub const CONFIDENCE_FLOOR: f64 = 0.30;
pub const CONFIDENCE_PER_SIGNAL: f64 = 0.10;
pub const CONFIDENCE_CAP: f64 = 0.85;

fn severity_weight(severity: Severity) -> f64 {
    match severity {
        Severity::Critical => WEIGHT_CRITICAL,
        Severity::High => WEIGHT_HIGH,
        Severity::Medium => WEIGHT_MEDIUM,
        Severity::Low => WEIGHT_LOW,
        Severity::Informational => WEIGHT_INFORMATIONAL,
    }
}

/// Verify the maturity thresholds partition [0, 100].
/// Companion to [`scoring::verify_threshold_partition`]; both run at
/// engine construction.
pub fn verify_maturity_partition() -> PerimeterResult<()> {
    if !(DEVELOPING_MIN < INTERMEDIATE_MIN && INTERMEDIATE_MIN < ADVANCED_MIN) {
        return Err(PerimeterError::Invariant(
            "maturity thresholds must be strictly increasing".to_string(),
        ));
    }
    Ok(())
}

/// Organizational pattern metrics extracted once per assessment.
struct SurfaceMetrics {
    total: usize,
    critical: usize,
    high: usize,
    shared_ip_count: usize,
    max_assets_per_ip: usize,
    average_ports: f64,
    admin_exposed: usize,
    env_exposed: usize,
    assets_with_ports: usize,
    severity_tiers: usize,
}

fn collect_metrics(assets: &[Asset]) -> SurfaceMetrics {
    let summary = scoring::aggregate(assets);

    let mut ip_freq: HashMap<&str, usize> = HashMap::new();
    for asset in assets {
        if !asset.ip.is_empty() {
            *ip_freq.entry(asset.ip.as_str()).or_insert(0) += 1;
        }
    }
    let shared_ip_count = ip_freq.values().filter(|c| **c > 1).count();
    let max_assets_per_ip = ip_freq.values().copied().max().unwrap_or(0);

    let total_ports: usize = assets.iter().map(|a| a.open_ports.len()).sum();
    let average_ports = if assets.is_empty() {
        0.0
    } else {
        total_ports as f64 / assets.len() as f64
    };

    let tier_counts = [
        summary.critical,
        summary.high,
        summary.medium,
        summary.low,
        summary.informational,
    ];

    SurfaceMetrics {
        total: assets.len(),
        critical: summary.critical,
        high: summary.high,
        shared_ip_count,
        max_assets_per_ip,
        average_ports,
        admin_exposed: assets
            .iter()
            .filter(|a| admin_keyword(&a.subdomain).is_some())
            .count(),
        env_exposed: assets
            .iter()
            .filter(|a| env_keyword(&a.subdomain).is_some())
            .count(),
        assets_with_ports: assets.iter().filter(|a| !a.open_ports.is_empty()).count(),
        severity_tiers: tier_counts.iter().filter(|c| **c > 0).count(),
    }
}

/// Weighted composite: 100 minus severity, concentration and density
/// penalties, clamped to [0, 100], with the Critical-asset ceiling applied.
fn composite_score(assets: &[Asset], metrics: &SurfaceMetrics) -> u8 {
    if metrics.total == 0 {
        return EMPTY_SURFACE_SCORE;
    }

    let weighted_sum: f64 = assets.iter().map(|a| severity_weight(a.severity)).sum();
    let severity_penalty = weighted_sum / metrics.total as f64 * SEVERITY_PENALTY_SCALE;

    let max_per_ip = metrics.max_assets_per_ip.max(1);
    let concentration_penalty = (metrics.shared_ip_count as f64 * 2.0
        + (max_per_ip - 1) as f64 * 1.5)
        .min(CONCENTRATION_PENALTY_MAX);

    let density_penalty = if metrics.average_ports > DENSITY_FREE_THRESHOLD {
        (metrics.average_ports * 1.5).min(DENSITY_PENALTY_MAX)
    } else {
        0.0
    };

    let raw = 100.0 - severity_penalty - concentration_penalty - density_penalty;
    let mut score = raw.round().clamp(0.0, 100.0) as u8;

    if metrics.critical > 0 {
        score = score.min(CRITICAL_SCORE_CEILING);
    }

    score
}

/// Maturity from the posture score, with a ceiling while Critical
/// exposure exists.
fn maturity_for(score: u8, critical_assets: usize) -> MaturityLevel {
    if critical_assets > 0 {
        return if score >= DEVELOPING_MIN {
            MaturityLevel::Developing
        } else {
            MaturityLevel::Basic
        };
    }

    if score >= ADVANCED_MIN {
        MaturityLevel::Advanced
    } else if score >= INTERMEDIATE_MIN {
        MaturityLevel::Intermediate
    } else if score >= DEVELOPING_MIN {
        MaturityLevel::Developing
    } else {
        MaturityLevel::Basic
    }
}

fn attacker_profile(
    metrics: &SurfaceMetrics,
    simulation: Option<&AttackSimulation>,
) -> AttackerProfile {
    let full_chain = simulation
        .map(|s| s.attack_path.len() >= 4)
        .unwrap_or(false);

    if metrics.critical > 0 && full_chain {
        AttackerProfile::AdvancedPersistent
    } else if metrics.critical > 0 {
        AttackerProfile::Targeted
    } else if metrics.high >= 2 {
        AttackerProfile::Opportunistic
    } else {
        AttackerProfile::AutomatedScanners
    }
}

fn dominant_theme(metrics: &SurfaceMetrics) -> String {
    let elevated = metrics.high + metrics.critical;
    if metrics.admin_exposed > 0 && elevated > 0 {
        "Administrative surface compounded by exposed services".to_string()
    } else if metrics.admin_exposed > 0 {
        "Administrative interface exposure".to_string()
    } else if metrics.env_exposed > 0 {
        "Non-production environment exposure".to_string()
    } else if elevated > 0 {
        "Elevated service exposure".to_string()
    } else {
        "Standard web service footprint".to_string()
    }
}

fn priority_improvements(metrics: &SurfaceMetrics) -> Vec<String> {
    let mut improvements = Vec::new();
    if metrics.admin_exposed > 0 {
        improvements.push("Restrict administrative interfaces from public access".to_string());
    }
    if metrics.env_exposed > 0 {
        improvements
            .push("Isolate non-production environments behind VPN or allowlists".to_string());
    }
    if metrics.high + metrics.critical > 0 {
        improvements.push(
            "Remediate high-severity assets through port restriction and access controls"
                .to_string(),
        );
    }
    if improvements.is_empty() {
        improvements.push("Maintain current posture with periodic reassessment".to_string());
    }
    improvements.truncate(3);
    improvements
}

/// Assess organizational posture from scored assets and, optionally, a
/// completed attack simulation. Empty input yields the strong-posture
/// baseline at floor confidence, never a failure.
pub fn assess(
    domain: &str,
    assets: &[Asset],
    simulation: Option<&AttackSimulation>,
) -> PostureAssessment {
    let metrics = collect_metrics(assets);
    let summary = scoring::aggregate(assets);
    let posture_score = composite_score(assets, &metrics);
    let maturity_level = maturity_for(posture_score, metrics.critical);

    // Each basis entry is one independent signal; confidence grows with
    // the count and with nothing else.
    let mut assessment_basis: Vec<String> = Vec::new();
    if metrics.total == 0 {
        assessment_basis.push("No externally discoverable assets were identified".to_string());
    } else {
        assessment_basis.push(format!(
            "{} assets analyzed, average risk {:.1}",
            metrics.total, summary.average_risk
        ));
        if metrics.assets_with_ports * 2 > metrics.total {
            assessment_basis.push(format!(
                "Port exposure data available for {} of {} assets",
                metrics.assets_with_ports, metrics.total
            ));
        }
        if metrics.severity_tiers >= 2 {
            assessment_basis.push(format!(
                "Severity distribution spans {} tiers",
                metrics.severity_tiers
            ));
        }
        if metrics.shared_ip_count > 0 {
            assessment_basis.push(format!(
                "{} IP(s) host multiple subdomains",
                metrics.shared_ip_count
            ));
        }
        if let Some(sim) = simulation {
            assessment_basis.push(format!(
                "Attack simulation with {} step(s) considered",
                sim.attack_path.len()
            ));
        }
    }

    let confidence_score = ((CONFIDENCE_FLOOR
        + CONFIDENCE_PER_SIGNAL * (assessment_basis.len() - 1) as f64)
        .min(CONFIDENCE_CAP)
        * 100.0)
        .round()
        / 100.0;

    let risk_adjective = if posture_score < 50 {
        "elevated"
    } else if posture_score < ADVANCED_MIN {
        "moderate"
    } else {
        "low"
    };

    log::info!(
        "Posture for {}: score={}, maturity={}, {} basis signal(s)",
        domain,
        posture_score,
        maturity_level,
        assessment_basis.len()
    );

    PostureAssessment {
        posture_score,
        maturity_level,
        likely_attacker_profile: attacker_profile(&metrics, simulation),
        dominant_risk_theme: dominant_theme(&metrics),
        strategic_risk_outlook: format!(
            "{} presents {} organizational risk across {} discovered assets.",
            domain, risk_adjective, metrics.total
        ),
        priority_improvements: priority_improvements(&metrics),
        assessment_basis,
        confidence_score,
    }
}
