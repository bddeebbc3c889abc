//! Source text to shader IR: preprocess, parse, locate errors

mod error;
pub mod output;

pub use error::PipelineError;
pub use output::{CompileOutput, PipelineOutput};

use crate::config::runtime::RuntimeConfig;
use crate::context::CompilerContext;
use crate::diagnostics::{CompileError, SourceMap};
use crate::file_processor::{load_include_dirs, FileProcessor};
use crate::logging;
use crate::preprocessor::{preprocess, IncludeMap};
use crate::{log_debug, log_error, log_info};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// File name content-parser errors carry before they are remapped
pub const EXPANDED_FILE: &str = "<expanded>";

#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    pub includes: IncludeMap,
    /// Seeded after `GL_ES`, in order; `None` defines an empty macro
    pub predefined: Vec<(String, Option<String>)>,
    pub config: RuntimeConfig,
}

/// Compile `source`, named `file` in diagnostics, with a fresh context
pub fn compile(source: &str, file: &str, options: &CompileOptions) -> Result<CompileOutput, PipelineError> {
    let mut ctx = CompilerContext::new();
    compile_with_context(&mut ctx, source, file, options)
}

/// Compile reusing `ctx`. The context is reset first, so nothing from a
/// previous compile is visible.
pub fn compile_with_context(
    ctx: &mut CompilerContext,
    source: &str,
    file: &str,
    options: &CompileOptions,
) -> Result<CompileOutput, PipelineError> {
    let start_time = Instant::now();

    logging::with_file_context(file, || {
        log_info!("Starting shader compilation",
            "file" => file,
            "includes" => options.includes.len(),
            "predefined" => options.predefined.len()
        );

        let config = &options.config;
        ctx.reset(&options.predefined, &config.preprocessor);

        // Preprocessor errors already point into the file they came from
        let expanded = preprocess(ctx, file, source, &options.includes, &config.preprocessor)?;
        log_debug!("Expanded text ready", "bytes" => expanded.text.len());

        let parsed = crate::syntax::parse_shader(ctx, EXPANDED_FILE, &expanded.text, &config.content);
        let remap = config.diagnostics.remap_to_origin;
        let locate = |err: CompileError, sources: &HashMap<String, Arc<str>>| {
            locate_error(err, &expanded.source_map, sources, remap)
        };

        let shader = match parsed {
            Ok(shader) if !ctx.has_errors() => shader,
            result => {
                let mut errors = ctx.take_diagnostics();
                if let Err(fatal) = result {
                    errors.push(fatal);
                }
                let mut errors: Vec<CompileError> =
                    errors.into_iter().map(|e| locate(e, &ctx.sources)).collect();

                log_error!(errors[0].error_code(), "Shader compilation failed",
                    "file" => file,
                    "errors" => errors.len()
                );
                return Err(match errors.len() {
                    1 => PipelineError::Compile(errors.remove(0)),
                    _ => PipelineError::Collected(errors),
                });
            }
        };

        let output = CompileOutput {
            shader,
            expanded: expanded.text,
            source_map: expanded.source_map,
            warnings: ctx.warning_count(),
            duration: start_time.elapsed(),
        };
        output.log_success(file);
        Ok(output)
    })
}

/// Load `path` and every include directory, then compile. Chunks already
/// in `options.includes` take precedence over ones found on disk.
pub fn compile_file<P: AsRef<Path>>(
    path: &Path,
    include_dirs: &[P],
    options: &CompileOptions,
) -> Result<CompileOutput, PipelineError> {
    let prefs = &options.config.file_processor;
    let loaded = FileProcessor::from_preferences(prefs).load_source(path)?;

    let mut options = options.clone();
    for (name, text) in load_include_dirs(include_dirs, prefs)? {
        options.includes.entry(name).or_insert(text);
    }

    compile(&loaded.source, &loaded.display_name(), &options)
}

fn locate_error(
    err: CompileError,
    map: &SourceMap,
    sources: &HashMap<String, Arc<str>>,
    remap: bool,
) -> CompileError {
    if remap && err.file == EXPANDED_FILE {
        err.remap(map, sources)
    } else {
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::ErrorReason;
    use crate::grammar::{RenderStateElementKey, RenderStateValue, StateProperty};
    use crate::preprocessor::PreprocessorError;
    use crate::syntax::CompilationError;
    use assert_matches::assert_matches;
    use std::fs;
    use tempfile::tempdir;

    fn options() -> CompileOptions {
        CompileOptions::default()
    }

    fn with_include(name: &str, text: &str) -> CompileOptions {
        let mut options = options();
        options.includes.insert(name.to_string(), text.to_string());
        options
    }

    #[test]
    fn test_compile_minimal_shader() {
        let source = "Shader \"S\" { SubShader \"A\" { Pass \"P\" { VertexShader = main; FragmentShader = main; } } }";
        let output = compile(source, "s.shader", &options()).unwrap();
        let pass = &output.shader.sub_shaders[0].passes[0];
        assert_eq!(output.shader.name, "S");
        assert_eq!(pass.vertex_entry.as_deref(), Some("main"));
        assert_eq!(pass.fragment_entry.as_deref(), Some("main"));
        assert_eq!(output.warnings, 0);
    }

    #[test]
    fn test_macros_reach_render_states() {
        let source = "#define WRITE false\nShader \"S\" {\n#ifdef GL_ES\nprecision mediump float;\n#endif\nSubShader \"A\" { Pass \"P\" { DepthState { WriteEnabled = WRITE; } } } }";
        let output = compile(source, "s.shader", &options()).unwrap();
        let pass = &output.shader.sub_shaders[0].passes[0];
        assert_eq!(pass.contents.as_deref(), Some("precision mediump float;"));
        assert_eq!(
            pass.render_states.constant_map[&RenderStateElementKey::new(StateProperty::DepthWriteEnabled)],
            RenderStateValue::Boolean(false)
        );
    }

    #[test]
    fn test_include_source_map_round_trip() {
        let options = with_include("common", "uniform float u_time;\n");
        let source = "Shader \"S\" {\n#include \"common\"\nSubShader \"A\" { Pass \"P\" { } } }";
        let output = compile(source, "s.shader", &options).unwrap();

        let offset = output.expanded.find("u_time").unwrap();
        let position = output.source_map.map(offset);
        assert_eq!(position.source_file, "common");
        assert_eq!(position.index, "uniform float ".len());

        let pass = &output.shader.sub_shaders[0].passes[0];
        assert_eq!(pass.contents.as_deref(), Some("uniform float u_time;"));
    }

    #[test]
    fn test_collected_errors_are_remapped_to_the_include() {
        let options = with_include("states", "\nRasterState { Bogus = 1; }\n");
        let source = "Shader \"S\" {\n#include \"states\"\nSubShader \"A\" { Pass \"P\" { RenderQueueType = q; } } }";
        let err = compile(source, "s.shader", &options).unwrap_err();

        let errors = err.compile_errors();
        assert_eq!(errors.len(), 2);
        assert_matches!(&errors[0].reason, ErrorReason::Compilation(CompilationError::UnknownProperty { .. }));
        assert_eq!(errors[0].file, "states");
        assert_eq!(errors[0].span.start.line, 2);
        assert_eq!(errors[0].origin.as_ref().map(|o| o.source_file.as_str()), Some("states"));

        assert_matches!(&errors[1].reason, ErrorReason::Compilation(CompilationError::UndeclaredVariable { name }) if name == "q");
        assert_eq!(errors[1].file, "s.shader");
        assert_eq!(errors[1].span.start.line, 3);
    }

    #[test]
    fn test_remapping_can_be_disabled() {
        let mut options = options();
        options.config.diagnostics.remap_to_origin = false;
        let err = compile("Shader \"S\" { RenderQueueType = q; }", "s.shader", &options).unwrap_err();
        assert_matches!(&err, PipelineError::Compile(e) if e.file == EXPANDED_FILE && e.origin.is_none());
    }

    #[test]
    fn test_preprocessor_errors_are_fatal_and_located() {
        let err = compile("Shader \"S\" {\n#include \"missing\"\n}", "s.shader", &options()).unwrap_err();
        let located = &err.compile_errors()[0];
        assert_matches!(&located.reason, ErrorReason::Preprocessor(PreprocessorError::MissingInclude { .. }));
        assert_eq!(located.file, "s.shader");
        assert_eq!(located.span.start.line, 2);
    }

    #[test]
    fn test_context_reuse_does_not_leak_macros() {
        let source = "Shader \"S\" {\n#ifdef FOO\nfloat foo;\n#endif\nSubShader \"A\" { Pass \"P\" { } } }";
        let mut ctx = CompilerContext::new();

        let mut defined = options();
        defined.predefined.push(("FOO".to_string(), None));
        let first = compile_with_context(&mut ctx, source, "s.shader", &defined).unwrap();
        assert_eq!(first.shader.sub_shaders[0].passes[0].contents.as_deref(), Some("float foo;"));

        let second = compile_with_context(&mut ctx, source, "s.shader", &options()).unwrap();
        assert_eq!(second.shader.sub_shaders[0].passes[0].contents.as_deref(), Some(""));
    }

    #[test]
    fn test_warnings_are_counted() {
        let options = with_include("c", "float c;\n");
        let source = "Shader \"S\" {\n#include \"c\"\n#include \"c\"\nSubShader \"A\" { Tags { a = 1, a = 2 } } }";
        let output = compile(source, "s.shader", &options).unwrap();
        assert_eq!(output.warnings, 2);

        let json = PipelineOutput::new("s.shader", &output).to_json().unwrap();
        assert!(json.contains("\"generated_at\""));
        assert!(json.contains("\"warnings\": 2"));
    }

    #[test]
    fn test_compile_file_with_include_dir() {
        let dir = tempdir().unwrap();
        let chunks = dir.path().join("chunks");
        fs::create_dir(&chunks).unwrap();
        fs::write(chunks.join("common.glsl"), "uniform vec4 u_color;\n").unwrap();
        let path = dir.path().join("lit.shader");
        fs::write(&path, "Shader \"Lit\" {\n#include \"common.glsl\"\nSubShader \"A\" { Pass \"P\" { } } }").unwrap();

        let output = compile_file(&path, &[&chunks], &options()).unwrap();
        assert_eq!(output.shader.name, "Lit");
        assert_eq!(
            output.shader.sub_shaders[0].passes[0].contents.as_deref(),
            Some("uniform vec4 u_color;")
        );

        let missing = compile_file(&dir.path().join("none.shader"), &[&chunks], &options());
        assert_matches!(missing, Err(PipelineError::FileProcessing(_)));
    }
}
