use crate::config::runtime::DiagnosticPreferences;
use crate::diagnostics::CompileError;
use crate::file_processor::FileProcessorError;

/// Pipeline processing errors
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("File processing failed: {0}")]
    FileProcessing(#[from] FileProcessorError),

    #[error("{0}")]
    Compile(#[from] CompileError),

    /// Recoverable errors gathered during content parsing, in source order
    #[error("Compilation failed with {} error(s)", .0.len())]
    Collected(Vec<CompileError>),

    #[error("Pipeline error: {message}")]
    Pipeline { message: String },
}

impl PipelineError {
    pub fn pipeline_error(message: &str) -> Self {
        Self::Pipeline {
            message: message.to_string(),
        }
    }

    /// Located errors carried by this failure
    pub fn compile_errors(&self) -> &[CompileError] {
        match self {
            Self::Compile(err) => std::slice::from_ref(err),
            Self::Collected(errors) => errors,
            Self::FileProcessing(_) | Self::Pipeline { .. } => &[],
        }
    }

    /// Every diagnostic rendered for a terminal, blank line separated
    pub fn render(&self, preferences: &DiagnosticPreferences) -> String {
        let errors = self.compile_errors();
        if errors.is_empty() {
            return format!("error: {}", self);
        }
        errors
            .iter()
            .map(|err| err.render_with(preferences))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
