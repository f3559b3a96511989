//! Perimeter Attack Surface Engine
//!
//! Deterministic risk scoring, attack-path simulation and posture
//! aggregation over discovered network assets, with an optional
//! narrative enrichment seam.

pub mod cli;
pub mod engine;
pub mod enrich;
pub mod errors;
pub mod exporter;
pub mod models;
pub mod posture;
pub mod scoring;
pub mod simulation;

pub use errors::{PerimeterError, PerimeterResult};
pub use engine::AttackSurfaceEngine;
