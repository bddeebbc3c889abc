// Internal modules
#[macro_use]
pub mod logging;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod file_processor;
pub mod grammar;
pub mod lexical;
pub mod pipeline;
pub mod preprocessor;
pub mod symbols;
pub mod syntax;
pub mod tokens;
pub mod utils;

// Re-export key types for library consumers
pub use context::CompilerContext;
pub use diagnostics::{CompileError, CompileResult, SourceMap};
pub use grammar::ShaderSource;
pub use pipeline::{compile, compile_file, compile_with_context, CompileOptions, CompileOutput, PipelineError};

// Re-export pipeline output for JSON consumers
pub use pipeline::output::PipelineOutput;
