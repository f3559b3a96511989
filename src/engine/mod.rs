//! Attack Surface Engine
//!
//! Transport-free facade tying discovery, scoring, simulation, posture and
//! enrichment together. Callers bring an [`AssetCollector`] for discovery and
//! a [`ScanStore`] for persistence; the engine owns validation, the
//! deterministic pipelines and the optional narrative pass.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use regex::Regex;

use crate::enrich::{self, ExecutiveSummary, NarrativeEnricher};
use crate::errors::{PerimeterError, PerimeterResult};
use crate::models::{AttackSimulation, PostureAssessment, RawAsset, ScanRecord};
use crate::posture;
use crate::scoring;
use crate::simulation;

/// RFC 1035-shaped domain with at least one label and an alphabetic TLD
const DOMAIN_PATTERN: &str = r"^(?:[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z]{2,}$";

/// Source of raw assets for a domain. Implementations may wrap passive DNS,
/// certificate transparency, or a pre-collected inventory file.
pub trait AssetCollector {
    /// Collector name, used in upstream error context
    fn name(&self) -> &str;

    fn discover(&self, domain: &str) -> PerimeterResult<Vec<RawAsset>>;
}

/// Persistence seam for completed scans.
pub trait ScanStore {
    fn put(&mut self, record: ScanRecord) -> PerimeterResult<()>;
    fn get(&self, scan_id: &str) -> Option<ScanRecord>;
}

/// In-memory scan store; the default for CLI runs.
#[derive(Debug, Default)]
pub struct MemoryScanStore {
    scans: HashMap<String, ScanRecord>,
}

impl MemoryScanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.scans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scans.is_empty()
    }
}

impl ScanStore for MemoryScanStore {
    fn put(&mut self, record: ScanRecord) -> PerimeterResult<()> {
        self.scans.insert(record.scan_id.clone(), record);
        Ok(())
    }

    fn get(&self, scan_id: &str) -> Option<ScanRecord> {
        self.scans.get(scan_id).cloned()
    }
}

/// Collector over a fixed, pre-collected asset inventory.
#[derive(Debug, Clone, Default)]
pub struct StaticCollector {
    assets: Vec<RawAsset>,
}

impl StaticCollector {
    pub fn new(assets: Vec<RawAsset>) -> Self {
        Self { assets }
    }

    /// Load an inventory from a JSON file holding an array of raw assets.
    pub fn from_json_file(path: &Path) -> PerimeterResult<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| PerimeterError::io(e, Some(path.to_path_buf())))?;
        let assets: Vec<RawAsset> = serde_json::from_str(&raw)?;
        log::debug!("Loaded {} assets from {}", assets.len(), path.display());
        Ok(Self::new(assets))
    }
}

impl AssetCollector for StaticCollector {
    fn name(&self) -> &str {
        "static-inventory"
    }

    fn discover(&self, _domain: &str) -> PerimeterResult<Vec<RawAsset>> {
        Ok(self.assets.clone())
    }
}

/// The engine facade. Generic over its collector and store so tests can
/// substitute failing or canned implementations.
pub struct AttackSurfaceEngine<C: AssetCollector, S: ScanStore> {
    collector: C,
    store: S,
    enricher: Option<Box<dyn NarrativeEnricher>>,
    domain_pattern: Regex,
    /// Monotonic suffix keeping scan ids unique within one engine, even
    /// when two scans land in the same timestamp millisecond
    scan_seq: u64,
}

impl<C: AssetCollector, S: ScanStore> AttackSurfaceEngine<C, S> {
    /// Construct the engine. Verifies the fixed scoring and maturity tables
    /// up front so a broken build fails at startup rather than per request.
    pub fn new(collector: C, store: S) -> PerimeterResult<Self> {
        scoring::verify_threshold_partition()?;
        posture::verify_maturity_partition()?;
        let domain_pattern = Regex::new(DOMAIN_PATTERN)
            .map_err(|e| PerimeterError::Invariant(format!("domain pattern failed to compile: {e}")))?;
        Ok(Self {
            collector,
            store,
            enricher: None,
            domain_pattern,
            scan_seq: 0,
        })
    }

    /// Attach a narrative enricher. Without one, `summary` is unavailable
    /// and `simulate`/`posture` stay purely deterministic.
    pub fn with_enricher(mut self, enricher: Box<dyn NarrativeEnricher>) -> Self {
        self.enricher = Some(enricher);
        self
    }

    /// Discover, score and store one scan of `domain`.
    pub fn scan(&mut self, domain: &str) -> PerimeterResult<ScanRecord> {
        let domain = domain.trim().to_ascii_lowercase();
        if !self.domain_pattern.is_match(&domain) {
            return Err(PerimeterError::InvalidDomain(domain));
        }

        let raw = self.collector.discover(&domain).map_err(|e| match e {
            upstream @ PerimeterError::Upstream { .. } => upstream,
            other => PerimeterError::upstream(self.collector.name(), other.to_string(), true),
        })?;

        let assets: Vec<_> = raw.iter().map(scoring::score_asset).collect();
        let risk_summary = scoring::aggregate(&assets);

        self.scan_seq += 1;
        let now = Utc::now();
        let record = ScanRecord {
            scan_id: format!("scan_{}_{:04}", now.format("%Y%m%d_%H%M%S"), self.scan_seq),
            domain: domain.clone(),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Secs, true),
            total_assets: assets.len(),
            assets,
            risk_summary,
        };

        log::info!(
            "Scan {} of {}: {} assets, {} critical, {} high",
            record.scan_id,
            domain,
            record.total_assets,
            record.risk_summary.critical,
            record.risk_summary.high
        );

        self.store.put(record.clone())?;
        Ok(record)
    }

    pub fn get_scan(&self, scan_id: &str) -> PerimeterResult<ScanRecord> {
        self.store
            .get(scan_id)
            .ok_or_else(|| PerimeterError::ScanNotFound(scan_id.to_string()))
    }

    /// Executive summary of a stored scan. Requires an enricher; there is no
    /// deterministic fallback for prose.
    pub fn summary(&self, scan_id: &str) -> PerimeterResult<ExecutiveSummary> {
        let record = self.get_scan(scan_id)?;
        let enricher = self.enricher.as_ref().ok_or_else(|| {
            PerimeterError::upstream("enrichment", "no narrative enricher configured", false)
        })?;

        let digest = enrich::build_digest(&record);
        let summary = enricher.summarize(&digest)?;
        enrich::validate_summary(&summary)?;
        Ok(summary)
    }

    /// Simulate an intrusion chain over a stored scan. With
    /// `deterministic_only` the narrative pass is skipped even when an
    /// enricher is configured; otherwise an enricher failure degrades to the
    /// deterministic chain with a warning.
    pub fn simulate(
        &self,
        scan_id: &str,
        deterministic_only: bool,
    ) -> PerimeterResult<AttackSimulation> {
        let record = self.get_scan(scan_id)?;
        let base = simulation::simulate(&record.domain, &record.assets);

        if deterministic_only || base.attack_path.is_empty() {
            return Ok(base);
        }

        match &self.enricher {
            Some(enricher) => match enricher.narrate(&base) {
                Ok(narrative) => Ok(enrich::apply_narrative(base, narrative)),
                Err(e) => {
                    log::warn!(
                        "Enricher '{}' failed, returning deterministic chain: {}",
                        enricher.name(),
                        e
                    );
                    Ok(base)
                }
            },
            None => Ok(base),
        }
    }

    /// Posture assessment of a stored scan, optionally informed by a fresh
    /// deterministic simulation.
    pub fn posture(
        &self,
        scan_id: &str,
        include_simulation: bool,
    ) -> PerimeterResult<PostureAssessment> {
        let record = self.get_scan(scan_id)?;
        let sim = if include_simulation {
            Some(simulation::simulate(&record.domain, &record.assets))
        } else {
            None
        };
        Ok(posture::assess(&record.domain, &record.assets, sim.as_ref()))
    }

    /// Posture assessment reusing a simulation the caller already holds,
    /// instead of recomputing one.
    pub fn posture_with(
        &self,
        scan_id: &str,
        simulation: Option<&AttackSimulation>,
    ) -> PerimeterResult<PostureAssessment> {
        let record = self.get_scan(scan_id)?;
        Ok(posture::assess(&record.domain, &record.assets, simulation))
    }
}
