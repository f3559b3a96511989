//! Risk Scoring Module
//!
//! Deterministic per-asset risk scoring and severity aggregation.
//! All tables live here as named constants so the simulator and the
//! posture assessor share one view of what "risky" means.

use crate::errors::{PerimeterError, PerimeterResult};
use crate::models::{Asset, RawAsset, Severity, SeveritySummary};

// ── Severity thresholds ──
//
// The four lower bounds partition [0, 100] without gaps or overlaps:
//   Informational [0, 10) · Low [10, 35) · Medium [35, 65)
//   High [65, 85) · Critical [85, 100]

pub const CRITICAL_MIN: u8 = 85;
pub const HIGH_MIN: u8 = 65;
pub const MEDIUM_MIN: u8 = 35;
pub const LOW_MIN: u8 = 10;

/// Port risk-weight table: (port, weight, service label).
/// Remote-administration and database services weigh substantially more
/// than the standard web ports.
pub const PORT_WEIGHTS: &[(u16, u16, &str)] = &[
    (21, 20, "FTP"),
    (22, 30, "SSH"),
    (23, 35, "Telnet"),
    (80, 5, "HTTP"),
    (443, 5, "HTTPS"),
    (1433, 30, "MSSQL"),
    (3306, 30, "MySQL"),
    (3389, 30, "RDP"),
    (5432, 30, "PostgreSQL"),
    (6379, 25, "Redis"),
    (27017, 30, "MongoDB"),
];

/// Weight assigned to ports not present in [`PORT_WEIGHTS`]
pub const DEFAULT_PORT_WEIGHT: u16 = 8;

/// Ports at or above this weight count toward the compound-risk bonus
pub const HIGH_WEIGHT_MIN: u16 = 20;

/// Public web ports — baseline exposure, not an intrusion vector on their own
pub const WEB_PORTS: [u16; 2] = [80, 443];

/// Database service ports
pub const DATABASE_PORTS: [u16; 5] = [1433, 3306, 5432, 6379, 27017];

/// Subdomain keywords indicating an administrative surface
pub const ADMIN_KEYWORDS: &[&str] = &["admin", "portal", "dashboard", "manage", "panel", "console"];

/// Subdomain keywords indicating a non-production or access-gateway surface
pub const ENV_KEYWORDS: &[&str] = &[
    "dev", "staging", "test", "old", "beta", "internal", "backup", "uat", "demo", "vpn",
];

/// Additive bonus when the subdomain matches a sensitive keyword (applied once)
pub const KEYWORD_BONUS: u16 = 15;

/// Per-pair unit of the compound-risk bonus
pub const COMPOUND_BONUS_UNIT: u16 = 10;

/// Look up the risk weight of a single port
pub fn port_weight(port: u16) -> u16 {
    PORT_WEIGHTS
        .iter()
        .find(|(p, _, _)| *p == port)
        .map(|(_, w, _)| *w)
        .unwrap_or(DEFAULT_PORT_WEIGHT)
}

/// Service label for a known port
pub fn service_label(port: u16) -> Option<&'static str> {
    PORT_WEIGHTS
        .iter()
        .find(|(p, _, _)| *p == port)
        .map(|(_, _, label)| *label)
}

/// Whether a port counts toward the compound-risk bonus
pub fn is_high_weight(port: u16) -> bool {
    port_weight(port) >= HIGH_WEIGHT_MIN
}

/// First admin keyword contained in the subdomain, if any
pub fn admin_keyword(subdomain: &str) -> Option<&'static str> {
    let lower = subdomain.to_lowercase();
    ADMIN_KEYWORDS.iter().copied().find(|kw| lower.contains(kw))
}

/// First environment keyword contained in the subdomain, if any
pub fn env_keyword(subdomain: &str) -> Option<&'static str> {
    let lower = subdomain.to_lowercase();
    ENV_KEYWORDS.iter().copied().find(|kw| lower.contains(kw))
}

/// Compound bonus for `n` co-occurring high-weight ports.
/// Zero below two ports, then grows superlinearly: 10, 30, 60, ...
pub fn compound_bonus(high_weight_count: usize) -> u16 {
    if high_weight_count < 2 {
        return 0;
    }
    let n = high_weight_count as u16;
    COMPOUND_BONUS_UNIT * n * (n - 1) / 2
}

/// Map a risk score to its severity tier.
pub fn severity_for(score: u8) -> Severity {
    if score >= CRITICAL_MIN {
        Severity::Critical
    } else if score >= HIGH_MIN {
        Severity::High
    } else if score >= MEDIUM_MIN {
        Severity::Medium
    } else if score >= LOW_MIN {
        Severity::Low
    } else {
        Severity::Informational
    }
}

/// Verify that the threshold constants form a strict partition of [0, 100].
/// Called once at engine construction; a violation is a fatal
/// configuration error, never a request-time failure.
pub fn verify_threshold_partition() -> PerimeterResult<()> {
    let bounds = [LOW_MIN, MEDIUM_MIN, HIGH_MIN, CRITICAL_MIN];
    if bounds.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(PerimeterError::Invariant(
            "severity thresholds must be strictly increasing".to_string(),
        ));
    }
    if LOW_MIN == 0 {
        return Err(PerimeterError::Invariant(
            "Informational tier must cover at least score 0".to_string(),
        ));
    }
    Ok(())
}

/// Score a raw asset: port weights, sensitive-name bonus, compound-risk
/// bonus, clamp to [0, 100], then map to a severity tier.
///
/// Never fails: a malformed record (empty subdomain or ip) degrades to
/// score 0 / Informational instead of erroring.
pub fn score_asset(raw: &RawAsset) -> Asset {
    if raw.subdomain.trim().is_empty() || raw.ip.trim().is_empty() {
        log::warn!("Malformed asset record (missing subdomain or ip) — scoring as Informational");
        return Asset {
            subdomain: raw.subdomain.clone(),
            ip: raw.ip.clone(),
            open_ports: raw.open_ports.clone(),
            risk_score: 0,
            severity: Severity::Informational,
            risk_factors: vec!["Malformed asset record — scored at zero".to_string()],
        };
    }

    // u32 accumulator: a port-dense asset (full port scan) sums past u16
    let mut score: u32 = 0;
    let mut factors: Vec<String> = Vec::new();

    // Layer 1: per-port weights
    for &port in &raw.open_ports {
        score += u32::from(port_weight(port));
        match service_label(port) {
            Some(label) if DATABASE_PORTS.contains(&port) => {
                factors.push(format!("Database port {} ({}) exposed", port, label));
            }
            Some(label) if WEB_PORTS.contains(&port) => {
                factors.push(format!("Standard web port {} ({}) exposed", port, label));
            }
            Some(label) => {
                factors.push(format!("Remote administration port {} ({}) exposed", port, label));
            }
            None => {
                factors.push(format!("Uncommon port {} exposed", port));
            }
        }
    }

    // Layer 2: sensitive-name context, counted once
    if let Some(keyword) = admin_keyword(&raw.subdomain).or_else(|| env_keyword(&raw.subdomain)) {
        score += u32::from(KEYWORD_BONUS);
        factors.push(format!(
            "Subdomain name matches sensitive keyword '{}'",
            keyword
        ));
    }

    // Layer 3: compound risk when high-weight services co-occur
    let high_weight_count = raw.open_ports.iter().filter(|p| is_high_weight(**p)).count();
    let bonus = compound_bonus(high_weight_count);
    if bonus > 0 {
        score += u32::from(bonus);
        factors.push(format!(
            "{} high-risk services co-exposed on one host — compounding risk",
            high_weight_count
        ));
    }

    if factors.is_empty() {
        factors.push("No notable risk factors identified".to_string());
    }

    let risk_score = score.min(100) as u8;

    Asset {
        subdomain: raw.subdomain.clone(),
        ip: raw.ip.clone(),
        open_ports: raw.open_ports.clone(),
        risk_score,
        severity: severity_for(risk_score),
        risk_factors: factors,
    }
}

/// Pure, order-independent reduction of scored assets into per-tier counts
/// plus the average risk score. The average is 0.0 for an empty slice.
pub fn aggregate(assets: &[Asset]) -> SeveritySummary {
    let mut summary = SeveritySummary::default();

    for asset in assets {
        match asset.severity {
            Severity::Critical => summary.critical += 1,
            Severity::High => summary.high += 1,
            Severity::Medium => summary.medium += 1,
            Severity::Low => summary.low += 1,
            Severity::Informational => summary.informational += 1,
        }
    }

    if !assets.is_empty() {
        let total: u32 = assets.iter().map(|a| a.risk_score as u32).sum();
        summary.average_risk = total as f64 / assets.len() as f64;
    }

    summary
}
