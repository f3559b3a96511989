use std::fs;
use std::path::Path;

use crate::errors::{PerimeterError, PerimeterResult};
use crate::models::AssessmentReport;

/// Writes assessment reports as pretty-printed JSON.
pub struct JsonExporter;

impl JsonExporter {
    pub fn export(report: &AssessmentReport, path: &Path) -> PerimeterResult<()> {
        let json = serde_json::to_string_pretty(report)?;
        fs::write(path, json).map_err(|e| PerimeterError::io(e, Some(path.to_path_buf())))?;
        log::info!("Assessment report written to {}", path.display());
        Ok(())
    }
}
