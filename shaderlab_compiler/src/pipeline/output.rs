use crate::diagnostics::SourceMap;
use crate::grammar::ShaderSource;
use crate::log_success;
use crate::logging::codes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Result of a successful compile
#[derive(Debug, Clone)]
pub struct CompileOutput {
    pub shader: ShaderSource,
    /// Preprocessed text the IR was parsed from
    pub expanded: String,
    /// Maps offsets in `expanded` back to the contributing files
    pub source_map: SourceMap,
    pub warnings: usize,
    pub duration: Duration,
}

impl CompileOutput {
    pub fn log_success(&self, file: &str) {
        log_success!(codes::success::PIPELINE_COMPLETE, "Shader compilation complete",
            "file" => file,
            "shader" => self.shader.name.as_str(),
            "sub_shaders" => self.shader.sub_shaders.len(),
            "passes" => self.shader.passes().count(),
            "expanded_bytes" => self.expanded.len(),
            "warnings" => self.warnings,
            "duration_ms" => format!("{:.2}", self.duration.as_secs_f64() * 1000.0)
        );
    }
}

/// JSON export shape
#[derive(Debug, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub source_file: String,
    pub compiler_version: String,
    pub generated_at: DateTime<Utc>,
    pub warnings: usize,
    pub shader: ShaderSource,
    pub source_map: SourceMap,
}

impl PipelineOutput {
    pub fn new(source_file: &str, output: &CompileOutput) -> Self {
        Self {
            source_file: source_file.to_string(),
            compiler_version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: Utc::now(),
            warnings: output.warnings,
            shader: output.shader.clone(),
            source_map: output.source_map.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
