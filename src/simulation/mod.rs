//! Attack Path Simulation Module
//!
//! Builds a deterministic, evidence-based intrusion chain from scored
//! assets. Four ordered stages; at most one best-fitting step per stage; a
//! stage is skipped when no asset matches its signature. "Simulation" means
//! synthetic chain construction from static rules — nothing is probed.

pub mod techniques;

use std::collections::HashMap;

use crate::models::{Asset, AttackSimulation, AttackStage, AttackStep, OverallRisk};
use crate::scoring::{self, DATABASE_PORTS, MEDIUM_MIN, WEB_PORTS};
use techniques::TechniqueKey;

/// Minimum risk score for an asset to qualify as chain material.
/// Aligned with the Medium severity floor: anything below it is
/// background exposure, not a viable entry.
pub const VIABLE_ENTRY_MIN: u8 = MEDIUM_MIN;

/// Per-step confidence never reaches certainty
const CONFIDENCE_CAP: f64 = 0.95;

/// Confidence bonus for an exact signature match over a generic fallback
const EXACT_MATCH_BONUS: f64 = 0.10;

/// A stage selection before step numbering: technique, asset, whether the
/// signature matched exactly, and stage-specific extra evidence.
struct StagePick<'a> {
    stage: AttackStage,
    key: TechniqueKey,
    asset: &'a Asset,
    exact: bool,
    extra_evidence: Vec<String>,
}

/// Build a deterministic attack simulation for the given scored assets.
///
/// Identical input always yields byte-identical output; narrative
/// enrichment, when requested, happens outside this function and never
/// alters the structured fields produced here.
pub fn simulate(domain: &str, assets: &[Asset]) -> AttackSimulation {
    let mut candidates: Vec<&Asset> = assets
        .iter()
        .filter(|a| a.risk_score >= VIABLE_ENTRY_MIN)
        .collect();
    // Total order: risk descending, then lexicographic subdomain
    candidates.sort_by(|a, b| {
        b.risk_score
            .cmp(&a.risk_score)
            .then_with(|| a.subdomain.cmp(&b.subdomain))
    });

    if candidates.is_empty() {
        log::info!("No viable-entry assets for {} — returning empty chain", domain);
        return AttackSimulation {
            entry_point: None,
            attack_path: Vec::new(),
            impact_summary: "No viable attack path identified based on current exposure."
                .to_string(),
            overall_risk: OverallRisk::Low,
            mitigation_notes: Vec::new(),
        };
    }

    // IP frequency over ALL assets, not just candidates: low-risk
    // neighbors still widen the blast radius of a shared host.
    let mut ip_freq: HashMap<&str, usize> = HashMap::new();
    for asset in assets {
        if !asset.ip.is_empty() {
            *ip_freq.entry(asset.ip.as_str()).or_insert(0) += 1;
        }
    }

    let mut picks: Vec<StagePick> = Vec::new();
    let mut used: Vec<&str> = Vec::new();

    let entry = candidates[0];
    picks.push(pick_initial_access(entry));
    used.push(entry.subdomain.as_str());

    if let Some(pick) = pick_privilege_escalation(&candidates) {
        used.push(pick.asset.subdomain.as_str());
        picks.push(pick);
    }

    if let Some(pick) = pick_lateral_movement(&candidates, &ip_freq, &used) {
        used.push(pick.asset.subdomain.as_str());
        picks.push(pick);
    }

    if let Some(pick) = pick_data_exfiltration(&candidates) {
        picks.push(pick);
    }

    let attack_path: Vec<AttackStep> = picks
        .iter()
        .enumerate()
        .map(|(i, pick)| build_step(i as u32 + 1, pick))
        .collect();

    let peak_risk = picks.iter().map(|p| p.asset.risk_score).max().unwrap_or(0);
    let overall_risk = OverallRisk::from(scoring::severity_for(peak_risk));

    let mut mitigation_notes: Vec<String> = Vec::new();
    for pick in &picks {
        let mitigation = pick.key.technique().mitigation;
        if !mitigation_notes.iter().any(|m| m == mitigation) {
            mitigation_notes.push(mitigation.to_string());
        }
    }

    let stages: Vec<String> = picks.iter().map(|p| p.stage.to_string()).collect();
    let impact_summary = format!(
        "Analysis of {} identified {} asset(s) with elevated risk (score >= {}). \
         Peak risk score: {}. A {}-step attack chain spanning {} was constructed.",
        domain,
        candidates.len(),
        VIABLE_ENTRY_MIN,
        candidates[0].risk_score,
        attack_path.len(),
        stages.join(", "),
    );

    log::info!(
        "Deterministic attack chain for {}: {} steps, overall risk {}",
        domain,
        attack_path.len(),
        overall_risk
    );

    AttackSimulation {
        entry_point: Some(entry.subdomain.clone()),
        attack_path,
        impact_summary,
        overall_risk,
        mitigation_notes,
    }
}

fn has_web_port(asset: &Asset) -> bool {
    asset.open_ports.iter().any(|p| WEB_PORTS.contains(p))
}

fn has_sensitive_port(asset: &Asset) -> bool {
    asset
        .open_ports
        .iter()
        .any(|p| scoring::is_high_weight(*p) && !WEB_PORTS.contains(p))
}

fn database_ports(asset: &Asset) -> Vec<u16> {
    asset
        .open_ports
        .iter()
        .copied()
        .filter(|p| DATABASE_PORTS.contains(p))
        .collect()
}

/// Stage 1 always anchors on the entry point — the highest-risk asset.
/// Technique priority: admin panel with sensitive services > bare remote
/// services > public web application (generic fallback).
fn pick_initial_access(entry: &Asset) -> StagePick<'_> {
    let is_admin = scoring::admin_keyword(&entry.subdomain).is_some();
    let sensitive = has_sensitive_port(entry);
    let web = has_web_port(entry);

    let (key, exact) = if is_admin && sensitive {
        (TechniqueKey::AdminPanel, true)
    } else if sensitive && !web {
        (TechniqueKey::RemoteServices, true)
    } else {
        (TechniqueKey::WebExploit, false)
    };

    let mut extra_evidence = Vec::new();
    if entry.open_ports.len() >= 4 {
        extra_evidence.push(format!(
            "High service density ({} ports exposed)",
            entry.open_ports.len()
        ));
    }

    StagePick {
        stage: AttackStage::InitialAccess,
        key,
        asset: entry,
        exact,
        extra_evidence,
    }
}

/// Stage 2: the best candidate exposing a privesc-mapped port. The
/// technique is keyed by the heaviest such port; ties break toward the
/// lower port number for determinism.
fn pick_privilege_escalation<'a>(candidates: &[&'a Asset]) -> Option<StagePick<'a>> {
    for asset in candidates {
        let mut mapped: Vec<u16> = asset
            .open_ports
            .iter()
            .copied()
            .filter(|p| TechniqueKey::for_privesc_port(*p).is_some())
            .collect();
        if mapped.is_empty() {
            continue;
        }
        mapped.sort_by(|a, b| {
            scoring::port_weight(*b)
                .cmp(&scoring::port_weight(*a))
                .then_with(|| a.cmp(b))
        });
        let port = mapped[0];
        let key = TechniqueKey::for_privesc_port(port)?;

        return Some(StagePick {
            stage: AttackStage::PrivilegeEscalation,
            key,
            asset,
            exact: true,
            extra_evidence: vec![format!(
                "Port {} directly accessible from the external network",
                port
            )],
        });
    }
    None
}

/// Stage 3 signature priority: shared infrastructure, then an unused
/// administrative surface, then an unused non-production surface.
fn pick_lateral_movement<'a>(
    candidates: &[&'a Asset],
    ip_freq: &HashMap<&str, usize>,
    used: &[&str],
) -> Option<StagePick<'a>> {
    for asset in candidates {
        let freq = ip_freq.get(asset.ip.as_str()).copied().unwrap_or(0);
        if freq >= 2 {
            return Some(StagePick {
                stage: AttackStage::LateralMovement,
                key: TechniqueKey::SharedInfraPivot,
                asset,
                exact: true,
                extra_evidence: vec![format!(
                    "{} subdomains share IP {} — blast radius amplified",
                    freq, asset.ip
                )],
            });
        }
    }

    for asset in candidates {
        if used.contains(&asset.subdomain.as_str()) {
            continue;
        }
        if scoring::admin_keyword(&asset.subdomain).is_some() {
            return Some(StagePick {
                stage: AttackStage::LateralMovement,
                key: TechniqueKey::AdminInterfacePivot,
                asset,
                exact: true,
                extra_evidence: Vec::new(),
            });
        }
    }

    for asset in candidates {
        if used.contains(&asset.subdomain.as_str()) {
            continue;
        }
        if scoring::env_keyword(&asset.subdomain).is_some()
            && scoring::admin_keyword(&asset.subdomain).is_none()
        {
            return Some(StagePick {
                stage: AttackStage::LateralMovement,
                key: TechniqueKey::EnvironmentPivot,
                asset,
                exact: false,
                extra_evidence: Vec::new(),
            });
        }
    }

    None
}

/// Stage 4: the best candidate exposing a database port. An administrative
/// surface combined with non-web exposure upgrades to the admin-channel
/// exfiltration technique.
fn pick_data_exfiltration<'a>(candidates: &[&'a Asset]) -> Option<StagePick<'a>> {
    for asset in candidates {
        let db_ports = database_ports(asset);
        if db_ports.is_empty() {
            continue;
        }

        let ports_list = db_ports
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", ");

        let is_admin = scoring::admin_keyword(&asset.subdomain).is_some();
        let has_non_web = asset.open_ports.iter().any(|p| !WEB_PORTS.contains(p));

        let (key, extra) = if is_admin && has_non_web {
            (
                TechniqueKey::AdminDbExfiltration,
                vec![
                    format!("Database port(s) {} exposed alongside an administrative interface", ports_list),
                    "Admin and database combination enables direct data exfiltration".to_string(),
                ],
            )
        } else {
            (
                TechniqueKey::DbExfiltration,
                vec![format!("Database port(s) {} externally accessible", ports_list)],
            )
        };

        return Some(StagePick {
            stage: AttackStage::DataExfiltration,
            key,
            asset,
            exact: true,
            extra_evidence: extra,
        });
    }
    None
}

/// Per-step confidence: the asset's normalized risk score plus an
/// exact-signature bonus, capped and rounded to two decimals.
fn confidence(asset: &Asset, exact: bool) -> f64 {
    let base = asset.risk_score as f64 / 100.0;
    let specificity = if exact { EXACT_MATCH_BONUS } else { 0.0 };
    ((base + specificity).min(CONFIDENCE_CAP) * 100.0).round() / 100.0
}

fn build_step(step: u32, pick: &StagePick) -> AttackStep {
    let tech = pick.key.technique();
    let mut evidence = pick.asset.risk_factors.clone();
    evidence.extend(pick.extra_evidence.iter().cloned());

    AttackStep {
        step,
        stage: pick.stage,
        technique: tech.name.to_string(),
        mitre_id: tech.mitre_id.to_string(),
        subdomain: pick.asset.subdomain.clone(),
        ip: pick.asset.ip.clone(),
        confidence_score: confidence(pick.asset, pick.exact),
        evidence,
        impact_detail: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawAsset;
    use crate::scoring::score_asset;

    fn scored(sub: &str, ip: &str, ports: &[u16]) -> Asset {
        score_asset(&RawAsset::new(sub, ip, ports))
    }

    #[test]
    fn test_empty_assets_yield_empty_chain() {
        let sim = simulate("example.com", &[]);
        assert!(sim.attack_path.is_empty());
        assert!(sim.entry_point.is_none());
        assert_eq!(sim.overall_risk, OverallRisk::Low);
        assert!(sim.mitigation_notes.is_empty());
        assert!(!sim.impact_summary.is_empty());
    }

    #[test]
    fn test_web_only_asset_yields_empty_chain() {
        let assets = vec![scored("www.example.com", "5.6.7.8", &[80, 443])];
        let sim = simulate("example.com", &assets);
        assert!(sim.attack_path.is_empty());
        assert_eq!(sim.overall_risk, OverallRisk::Low);
    }

    #[test]
    fn test_vpn_host_chain_starts_with_remote_service_access() {
        let assets = vec![scored("vpn.example.com", "1.2.3.4", &[22, 3389])];
        let sim = simulate("example.com", &assets);

        assert_eq!(sim.entry_point.as_deref(), Some("vpn.example.com"));
        let first = &sim.attack_path[0];
        assert_eq!(first.step, 1);
        assert_eq!(first.stage, AttackStage::InitialAccess);
        assert_eq!(first.mitre_id, "T1133");
        assert_eq!(first.subdomain, "vpn.example.com");
        // Critical-band asset drives a Critical overall risk
        assert_eq!(sim.overall_risk, OverallRisk::Critical);
    }

    #[test]
    fn test_entry_point_is_max_risk_with_lexical_tiebreak() {
        // Identical signatures, identical scores — the lexicographically
        // smaller subdomain must win
        let assets = vec![
            scored("zeta-dev.example.com", "1.1.1.1", &[22]),
            scored("alpha-dev.example.com", "1.1.1.2", &[22]),
        ];
        assert_eq!(assets[0].risk_score, assets[1].risk_score);

        let sim = simulate("example.com", &assets);
        assert_eq!(sim.entry_point.as_deref(), Some("alpha-dev.example.com"));
    }

    #[test]
    fn test_deterministic_output_is_byte_identical() {
        let assets = vec![
            scored("admin.example.com", "1.1.1.1", &[22, 443, 3306]),
            scored("staging.example.com", "1.1.1.1", &[80, 443]),
            scored("www.example.com", "1.1.1.2", &[80, 443]),
        ];
        let a = serde_json::to_string(&simulate("example.com", &assets)).unwrap();
        let b = serde_json::to_string(&simulate("example.com", &assets)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_full_four_stage_chain() {
        let assets = vec![
            scored("admin.example.com", "1.1.1.1", &[22, 80, 443, 3306]),
            scored("staging.example.com", "1.1.1.1", &[22, 80]),
            scored("www.example.com", "1.1.1.1", &[80, 443]),
        ];
        let sim = simulate("example.com", &assets);

        let stages: Vec<AttackStage> = sim.attack_path.iter().map(|s| s.stage).collect();
        assert_eq!(
            stages,
            vec![
                AttackStage::InitialAccess,
                AttackStage::PrivilegeEscalation,
                AttackStage::LateralMovement,
                AttackStage::DataExfiltration,
            ]
        );
        let steps: Vec<u32> = sim.attack_path.iter().map(|s| s.step).collect();
        assert_eq!(steps, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_stages_remain_ordered_when_middle_stage_skipped() {
        // Admin surface dense enough to qualify but with no privesc or
        // database ports; a second candidate shares the IP
        let assets = vec![
            scored("portal.example.com", "2.2.2.2", &[80, 443, 8080, 8081]),
            scored("manage.example.com", "2.2.2.2", &[80, 443, 8080, 8082]),
        ];
        let sim = simulate("example.com", &assets);

        let stages: Vec<AttackStage> = sim.attack_path.iter().map(|s| s.stage).collect();
        assert_eq!(
            stages,
            vec![AttackStage::InitialAccess, AttackStage::LateralMovement]
        );
        let steps: Vec<u32> = sim.attack_path.iter().map(|s| s.step).collect();
        assert_eq!(steps, vec![1, 2]);
        // No privesc signature anywhere — stage stays skipped
        assert!(stages.iter().all(|s| *s != AttackStage::PrivilegeEscalation));
    }

    #[test]
    fn test_overall_risk_dominates_every_step_severity() {
        let assets = vec![
            scored("admin.example.com", "1.1.1.1", &[22, 443, 3306]),
            scored("dev.example.com", "1.1.1.2", &[22, 80]),
        ];
        let sim = simulate("example.com", &assets);

        for step in &sim.attack_path {
            let asset = assets.iter().find(|a| a.subdomain == step.subdomain).unwrap();
            let step_risk = OverallRisk::from(asset.severity);
            assert!(
                sim.overall_risk >= step_risk,
                "overall {} must not be below step tier {}",
                sim.overall_risk,
                step_risk
            );
        }
    }

    #[test]
    fn test_confidence_in_range_and_reflects_specificity() {
        let assets = vec![scored("vpn.example.com", "1.2.3.4", &[22, 3389])];
        let sim = simulate("example.com", &assets);

        for step in &sim.attack_path {
            assert!(step.confidence_score >= 0.0 && step.confidence_score <= 1.0);
        }
        // risk 85 → 0.85 base + 0.10 exact-match bonus, capped at 0.95
        assert_eq!(sim.attack_path[0].confidence_score, 0.95);
    }

    #[test]
    fn test_mitigation_notes_unique_and_nonempty() {
        let assets = vec![
            scored("admin.example.com", "1.1.1.1", &[22, 80, 443, 3306]),
            scored("staging.example.com", "1.1.1.1", &[22, 80]),
        ];
        let sim = simulate("example.com", &assets);

        assert!(!sim.mitigation_notes.is_empty());
        let mut deduped = sim.mitigation_notes.clone();
        deduped.dedup();
        assert_eq!(deduped.len(), sim.mitigation_notes.len());
    }

    #[test]
    fn test_impact_detail_absent_in_deterministic_output() {
        let assets = vec![scored("vpn.example.com", "1.2.3.4", &[22, 3389])];
        let sim = simulate("example.com", &assets);
        assert!(sim.attack_path.iter().all(|s| s.impact_detail.is_none()));
    }
}
