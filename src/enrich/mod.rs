//! Narrative Enrichment Seam
//!
//! The scoring, simulation and posture pipelines are fully deterministic. A
//! [`NarrativeEnricher`] implementation can layer prose on top — an executive
//! summary of a scan, or per-step narrative for a simulation — but it is only
//! ever allowed to decorate. [`apply_narrative`] enforces that: the structure,
//! techniques, confidences and overall risk of a simulation survive any
//! enrichment untouched.

use serde::{Deserialize, Serialize};

use crate::errors::{PerimeterError, PerimeterResult};
use crate::models::{AttackSimulation, ScanRecord};
use crate::simulation::VIABLE_ENTRY_MIN;

/// Top assets carried in a digest
const DIGEST_TOP_ASSETS: usize = 3;

/// One high-interest asset inside a [`ScanDigest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigestAsset {
    pub subdomain: String,
    pub risk_score: u8,
    pub severity: String,
    pub open_ports: Vec<u16>,
}

/// Preprocessed scan aggregates handed to an enricher. Enrichers never see
/// raw scan records; the digest keeps the payload small and stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanDigest {
    pub domain: String,
    pub total_assets: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    /// Assets at or above the viable-entry threshold
    pub significant_risk_count: usize,
    pub average_risk: f64,
    /// Up to three assets, highest risk first
    pub top_assets: Vec<DigestAsset>,
}

/// Executive prose summary of one scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub summary: String,
    pub top_risks: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Narrative detail for one existing attack step, addressed by step number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDetail {
    pub step: u32,
    pub impact_detail: String,
}

/// Narrative layer over a deterministic simulation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationNarrative {
    /// Replaces the template impact summary when non-empty
    pub impact_summary: Option<String>,
    /// Appended after the deterministic notes; duplicates are dropped
    pub mitigation_notes: Vec<String>,
    pub step_details: Vec<StepDetail>,
}

/// External narrative generator. Implementations typically call a language
/// model; failures are surfaced as [`PerimeterError::Upstream`] so the engine
/// can degrade to deterministic output.
pub trait NarrativeEnricher {
    /// Human-readable name, used in upstream error context and logs
    fn name(&self) -> &str;

    /// Produce an executive summary from preprocessed scan aggregates
    fn summarize(&self, digest: &ScanDigest) -> PerimeterResult<ExecutiveSummary>;

    /// Produce narrative detail for a completed simulation
    fn narrate(&self, simulation: &AttackSimulation) -> PerimeterResult<SimulationNarrative>;
}

/// Build the digest an enricher receives for a scan.
pub fn build_digest(record: &ScanRecord) -> ScanDigest {
    let mut ranked: Vec<&crate::models::Asset> = record.assets.iter().collect();
    ranked.sort_by(|a, b| {
        b.risk_score
            .cmp(&a.risk_score)
            .then_with(|| a.subdomain.cmp(&b.subdomain))
    });

    let top_assets = ranked
        .iter()
        .take(DIGEST_TOP_ASSETS)
        .map(|a| DigestAsset {
            subdomain: a.subdomain.clone(),
            risk_score: a.risk_score,
            severity: a.severity.to_string(),
            open_ports: a.open_ports.iter().copied().collect(),
        })
        .collect();

    ScanDigest {
        domain: record.domain.clone(),
        total_assets: record.total_assets,
        critical: record.risk_summary.critical,
        high: record.risk_summary.high,
        medium: record.risk_summary.medium,
        low: record.risk_summary.low,
        significant_risk_count: record
            .assets
            .iter()
            .filter(|a| a.risk_score >= VIABLE_ENTRY_MIN)
            .count(),
        average_risk: record.risk_summary.average_risk,
        top_assets,
    }
}

/// Reject structurally useless summaries before they reach a caller.
pub fn validate_summary(summary: &ExecutiveSummary) -> PerimeterResult<()> {
    if summary.summary.trim().is_empty() {
        return Err(PerimeterError::upstream(
            "enrichment",
            "summary response missing narrative text",
            true,
        ));
    }
    Ok(())
}

/// Merge a narrative into a deterministic simulation, decorate-only.
///
/// The narrative may set `impact_detail` on steps it addresses, replace the
/// template `impact_summary`, and append mitigation notes not already
/// present. Step count, order, stages, techniques, assets, confidences and
/// `overall_risk` are never touched; step details referencing unknown step
/// numbers are dropped.
pub fn apply_narrative(
    mut base: AttackSimulation,
    narrative: SimulationNarrative,
) -> AttackSimulation {
    for detail in narrative.step_details {
        match base.attack_path.iter_mut().find(|s| s.step == detail.step) {
            Some(step) => step.impact_detail = Some(detail.impact_detail),
            None => log::warn!(
                "Narrative addressed unknown step {}; detail dropped",
                detail.step
            ),
        }
    }

    if let Some(summary) = narrative.impact_summary {
        if !summary.trim().is_empty() {
            base.impact_summary = summary;
        }
    }

    for note in narrative.mitigation_notes {
        if !note.trim().is_empty() && !base.mitigation_notes.contains(&note) {
            base.mitigation_notes.push(note);
        }
    }

    base
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RawAsset, SeveritySummary};
    use crate::scoring::{aggregate, score_asset};
    use crate::simulation::simulate;

    struct CannedEnricher;

    impl NarrativeEnricher for CannedEnricher {
        fn name(&self) -> &str {
            "canned"
        }

        fn summarize(&self, digest: &ScanDigest) -> PerimeterResult<ExecutiveSummary> {
            Ok(ExecutiveSummary {
                summary: format!("{} assets reviewed.", digest.total_assets),
                top_risks: vec!["Exposed remote access".to_string()],
                recommendations: vec!["Close port 22".to_string()],
            })
        }

        fn narrate(&self, simulation: &AttackSimulation) -> PerimeterResult<SimulationNarrative> {
            Ok(SimulationNarrative {
                impact_summary: Some("An attacker gains a foothold.".to_string()),
                mitigation_notes: vec!["Adopt zero-trust network access".to_string()],
                step_details: simulation
                    .attack_path
                    .iter()
                    .map(|s| StepDetail {
                        step: s.step,
                        impact_detail: format!("Step {} compromises {}", s.step, s.subdomain),
                    })
                    .collect(),
            })
        }
    }

    fn record() -> ScanRecord {
        let assets = vec![
            score_asset(&RawAsset::new("vpn.example.com", "1.2.3.4", &[22, 3389])),
            score_asset(&RawAsset::new("www.example.com", "5.6.7.8", &[80, 443])),
            score_asset(&RawAsset::new("dev.example.com", "5.6.7.9", &[22, 80])),
            score_asset(&RawAsset::new("cdn.example.com", "5.6.7.10", &[443])),
        ];
        let risk_summary = aggregate(&assets);
        ScanRecord {
            scan_id: "scan_test".to_string(),
            domain: "example.com".to_string(),
            timestamp: "2026-01-01T00:00:00Z".to_string(),
            total_assets: assets.len(),
            assets,
            risk_summary,
        }
    }

    #[test]
    fn test_digest_keeps_top_three_by_risk() {
        let digest = build_digest(&record());
        assert_eq!(digest.top_assets.len(), 3);
        assert_eq!(digest.top_assets[0].subdomain, "vpn.example.com");
        assert!(digest.top_assets[0].risk_score >= digest.top_assets[1].risk_score);
        assert!(digest.top_assets[1].risk_score >= digest.top_assets[2].risk_score);
    }

    #[test]
    fn test_digest_counts_significant_assets() {
        let digest = build_digest(&record());
        // vpn (85) and dev (50) clear the viable-entry threshold
        assert_eq!(digest.significant_risk_count, 2);
        assert_eq!(digest.total_assets, 4);
        assert_eq!(digest.critical, 1);
    }

    #[test]
    fn test_digest_of_empty_scan() {
        let empty = ScanRecord {
            scan_id: "scan_empty".to_string(),
            domain: "example.com".to_string(),
            timestamp: "2026-01-01T00:00:00Z".to_string(),
            total_assets: 0,
            assets: vec![],
            risk_summary: SeveritySummary::default(),
        };
        let digest = build_digest(&empty);
        assert!(digest.top_assets.is_empty());
        assert_eq!(digest.significant_risk_count, 0);
    }

    #[test]
    fn test_validate_summary_rejects_blank_narrative() {
        let blank = ExecutiveSummary {
            summary: "   ".to_string(),
            top_risks: vec![],
            recommendations: vec![],
        };
        let err = validate_summary(&blank).unwrap_err();
        assert!(err.is_retryable());

        let ok = CannedEnricher.summarize(&build_digest(&record())).unwrap();
        assert!(validate_summary(&ok).is_ok());
    }

    #[test]
    fn test_apply_narrative_preserves_deterministic_fields() {
        let rec = record();
        let base = simulate(&rec.domain, &rec.assets);
        assert!(!base.attack_path.is_empty());

        let narrative = CannedEnricher.narrate(&base).unwrap();
        let enriched = apply_narrative(base.clone(), narrative);

        assert_eq!(enriched.attack_path.len(), base.attack_path.len());
        assert_eq!(enriched.overall_risk, base.overall_risk);
        assert_eq!(enriched.entry_point, base.entry_point);
        for (before, after) in base.attack_path.iter().zip(enriched.attack_path.iter()) {
            assert_eq!(after.step, before.step);
            assert_eq!(after.stage, before.stage);
            assert_eq!(after.technique, before.technique);
            assert_eq!(after.mitre_id, before.mitre_id);
            assert_eq!(after.subdomain, before.subdomain);
            assert_eq!(after.confidence_score, before.confidence_score);
            assert_eq!(after.evidence, before.evidence);
            assert!(after.impact_detail.is_some());
        }
        // Deterministic notes survive in place; the novel note is appended
        assert_eq!(
            &enriched.mitigation_notes[..base.mitigation_notes.len()],
            &base.mitigation_notes[..]
        );
        assert_eq!(
            enriched.mitigation_notes.last().map(String::as_str),
            Some("Adopt zero-trust network access")
        );
    }

    #[test]
    fn test_apply_narrative_drops_unknown_steps_and_duplicates() {
        let rec = record();
        let base = simulate(&rec.domain, &rec.assets);
        let existing_note = base.mitigation_notes[0].clone();

        let narrative = SimulationNarrative {
            impact_summary: Some("".to_string()),
            mitigation_notes: vec![existing_note, "  ".to_string()],
            step_details: vec![StepDetail {
                step: 99,
                impact_detail: "phantom".to_string(),
            }],
        };
        let enriched = apply_narrative(base.clone(), narrative);

        assert_eq!(enriched.impact_summary, base.impact_summary);
        assert_eq!(enriched.mitigation_notes, base.mitigation_notes);
        assert!(enriched.attack_path.iter().all(|s| s.impact_detail.is_none()));
    }
}
