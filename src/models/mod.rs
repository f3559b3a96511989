use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A discovered network asset before risk scoring.
///
/// Produced by the (external) collection layer: a subdomain, the IP it
/// resolves to, and the open ports observed on that IP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAsset {
    pub subdomain: String,
    pub ip: String,
    /// Ordered set — keeps scoring and serialization deterministic
    pub open_ports: BTreeSet<u16>,
}

/// A scored asset. Created exactly once by the risk scorer; immutable after.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub subdomain: String,
    pub ip: String,
    pub open_ports: BTreeSet<u16>,
    /// Risk score in [0, 100]
    pub risk_score: u8,
    /// Severity tier — a pure function of `risk_score`
    pub severity: Severity,
    /// Human-readable contributing rules, in evaluation order
    pub risk_factors: Vec<String>,
}

/// Severity tier derived from a risk score via fixed thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Informational,
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Informational => write!(f, "Informational"),
            Severity::Low => write!(f, "Low"),
            Severity::Medium => write!(f, "Medium"),
            Severity::High => write!(f, "High"),
            Severity::Critical => write!(f, "Critical"),
        }
    }
}

/// Per-tier asset counts plus the average risk score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeveritySummary {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub informational: usize,
    /// 0.0 for an empty asset list, never NaN
    pub average_risk: f64,
}

impl SeveritySummary {
    /// Total number of assets counted across all tiers
    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low + self.informational
    }
}

/// Intrusion-chain stages, in fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AttackStage {
    #[serde(rename = "Initial Access")]
    InitialAccess,
    #[serde(rename = "Privilege Escalation")]
    PrivilegeEscalation,
    #[serde(rename = "Lateral Movement")]
    LateralMovement,
    #[serde(rename = "Data Exfiltration")]
    DataExfiltration,
}

impl AttackStage {
    /// All stages in chain order
    pub const ORDERED: [AttackStage; 4] = [
        AttackStage::InitialAccess,
        AttackStage::PrivilegeEscalation,
        AttackStage::LateralMovement,
        AttackStage::DataExfiltration,
    ];
}

impl fmt::Display for AttackStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttackStage::InitialAccess => write!(f, "Initial Access"),
            AttackStage::PrivilegeEscalation => write!(f, "Privilege Escalation"),
            AttackStage::LateralMovement => write!(f, "Lateral Movement"),
            AttackStage::DataExfiltration => write!(f, "Data Exfiltration"),
        }
    }
}

/// One step of a simulated intrusion chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackStep {
    /// 1-based, unique, strictly increasing along the chain
    pub step: u32,
    pub stage: AttackStage,
    /// Technique name (MITRE ATT&CK style)
    pub technique: String,
    /// Technique id, e.g. "T1133"
    pub mitre_id: String,
    pub subdomain: String,
    pub ip: String,
    /// Confidence in [0, 1]
    pub confidence_score: f64,
    /// Ordered evidence chain supporting this step
    pub evidence: Vec<String>,
    /// Narrative detail — only ever set by the enrichment layer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact_detail: Option<String>,
}

/// Overall risk of a simulated chain. Unlike [`Severity`] this has no
/// Informational tier; a chain either exists or the risk is `Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OverallRisk {
    Low,
    Medium,
    High,
    Critical,
}

impl From<Severity> for OverallRisk {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Critical => OverallRisk::Critical,
            Severity::High => OverallRisk::High,
            Severity::Medium => OverallRisk::Medium,
            Severity::Low | Severity::Informational => OverallRisk::Low,
        }
    }
}

impl fmt::Display for OverallRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverallRisk::Low => write!(f, "Low"),
            OverallRisk::Medium => write!(f, "Medium"),
            OverallRisk::High => write!(f, "High"),
            OverallRisk::Critical => write!(f, "Critical"),
        }
    }
}

/// A complete simulated intrusion chain.
///
/// Invariant: when `attack_path` is empty, `entry_point` is `None` and
/// `overall_risk` is `Low`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackSimulation {
    pub entry_point: Option<String>,
    pub attack_path: Vec<AttackStep>,
    pub impact_summary: String,
    pub overall_risk: OverallRisk,
    pub mitigation_notes: Vec<String>,
}

/// Organizational security maturity derived from the posture score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MaturityLevel {
    Basic,
    Developing,
    Intermediate,
    Advanced,
}

impl fmt::Display for MaturityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaturityLevel::Basic => write!(f, "Basic"),
            MaturityLevel::Developing => write!(f, "Developing"),
            MaturityLevel::Intermediate => write!(f, "Intermediate"),
            MaturityLevel::Advanced => write!(f, "Advanced"),
        }
    }
}

/// Closed taxonomy of likely attacker profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackerProfile {
    #[serde(rename = "Automated Scanners")]
    AutomatedScanners,
    Opportunistic,
    Targeted,
    #[serde(rename = "Advanced Persistent")]
    AdvancedPersistent,
}

impl fmt::Display for AttackerProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttackerProfile::AutomatedScanners => write!(f, "Automated Scanners"),
            AttackerProfile::Opportunistic => write!(f, "Opportunistic"),
            AttackerProfile::Targeted => write!(f, "Targeted"),
            AttackerProfile::AdvancedPersistent => write!(f, "Advanced Persistent"),
        }
    }
}

/// Organization-level posture assessment. Owned by the caller for the
/// lifetime of one scan; never persisted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostureAssessment {
    /// Composite posture score in [0, 100]; higher is stronger
    pub posture_score: u8,
    pub maturity_level: MaturityLevel,
    pub likely_attacker_profile: AttackerProfile,
    pub dominant_risk_theme: String,
    pub strategic_risk_outlook: String,
    pub priority_improvements: Vec<String>,
    /// Independent signals the assessment rests on
    pub assessment_basis: Vec<String>,
    /// Monotonic in the number of assessment-basis signals, in [0, 1]
    pub confidence_score: f64,
}

/// One completed scan: scored assets plus their severity summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRecord {
    pub scan_id: String,
    pub domain: String,
    /// RFC 3339 UTC timestamp
    pub timestamp: String,
    pub total_assets: usize,
    pub assets: Vec<Asset>,
    pub risk_summary: SeveritySummary,
}

/// Combined output envelope written by the exporter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentReport {
    pub scan: ScanRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulation: Option<AttackSimulation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posture: Option<PostureAssessment>,
}

impl RawAsset {
    pub fn new(subdomain: impl Into<String>, ip: impl Into<String>, ports: &[u16]) -> Self {
        Self {
            subdomain: subdomain.into(),
            ip: ip.into(),
            open_ports: ports.iter().copied().collect(),
        }
    }
}
