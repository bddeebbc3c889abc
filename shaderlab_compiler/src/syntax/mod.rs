//! Structural content parsing - expanded text to shader IR
//!
//! Walks the preprocessor output with the content lexer, builds the
//! `Shader`/`SubShader`/`Pass` tree, resolves render-state constants and
//! registers declarations in the context's symbol scopes. Recoverable
//! errors end up in the context's diagnostics; callers must check
//! `CompilerContext::has_errors` before trusting the IR.

pub mod error;
mod parser;
mod render_state;

pub use error::CompilationError;
pub use parser::ContentParser;

use crate::config::runtime::ContentPreferences;
use crate::context::CompilerContext;
use crate::diagnostics::CompileResult;
use crate::grammar::{RenderStates, ShaderSource};
use crate::lexical::{check_source_size, ShaderLexer};
use crate::logging::codes;
use crate::{log_debug, log_success};
use std::sync::Arc;

/// Parse expanded shader text named `file` and merge the result
pub fn parse_shader(
    ctx: &mut CompilerContext,
    file: &str,
    text: &str,
    prefs: &ContentPreferences,
) -> CompileResult<ShaderSource> {
    let text: Arc<str> = Arc::from(text);
    check_source_size(file, &text)?;
    log_debug!("Starting content parsing", "file" => file, "bytes" => text.len());

    ctx.set_collect_errors(prefs.collect_recoverable_errors);
    let lexer = ShaderLexer::new(file, text);
    let mut shader = ContentParser::new(&mut *ctx, prefs, lexer).parse_shader()?;
    merge_shader(&mut shader);

    log_success!(codes::success::CONTENT_PARSING_COMPLETE, "Content parsing complete",
        "shader" => shader.name.as_str(),
        "sub_shaders" => shader.sub_shaders.len(),
        "passes" => shader.passes().count(),
        "errors" => ctx.diagnostics().len()
    );
    Ok(shader)
}

/// Push shader-level contents and states down into sub-shaders, and
/// sub-shader ones into their passes. Children win on key collisions.
/// `UsePass` stubs are left for the caller to resolve.
pub fn merge_shader(shader: &mut ShaderSource) {
    for sub_shader in &mut shader.sub_shaders {
        let mut pending = shader.pending_contents.clone();
        pending.append(&mut sub_shader.pending_contents);
        sub_shader.pending_contents = pending;
        sub_shader.render_states =
            RenderStates::overlaid(&shader.render_states, &sub_shader.render_states);

        for pass in sub_shader.passes.iter_mut().filter(|p| !p.is_use_pass) {
            let contents: Vec<&str> = sub_shader
                .pending_contents
                .iter()
                .chain(pass.pending_contents.iter())
                .map(String::as_str)
                .collect();
            pass.contents = Some(contents.join("\n"));
            pass.render_states = RenderStates::overlaid(&sub_shader.render_states, &pass.render_states);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{CompileError, ErrorReason};
    use crate::grammar::{RenderStateElementKey, RenderStateValue, StateProperty, TagValue};
    use assert_matches::assert_matches;

    fn prefs() -> ContentPreferences {
        ContentPreferences {
            collect_recoverable_errors: true,
            log_symbol_events: false,
        }
    }

    fn parse(text: &str) -> ShaderSource {
        let mut ctx = CompilerContext::new();
        let shader = parse_shader(&mut ctx, "t.shader", text, &prefs()).unwrap();
        assert!(!ctx.has_errors(), "{:?}", ctx.diagnostics());
        shader
    }

    fn parse_err(text: &str) -> (CompilationError, CompileError) {
        let mut ctx = CompilerContext::new();
        let err = parse_shader(&mut ctx, "t.shader", text, &prefs()).unwrap_err();
        assert_eq!(ctx.symbols.depth(), 0);
        let reason = match &err.reason {
            ErrorReason::Compilation(e) => e.clone(),
            other => panic!("expected a compilation error, got {:?}", other),
        };
        (reason, err)
    }

    #[test]
    fn test_minimal_shader_structure() {
        let shader = parse(
            "Shader \"S\" { SubShader \"A\" { Pass \"P\" { VertexShader = main; FragmentShader = main; } } }",
        );
        assert_eq!(shader.name, "S");
        assert_eq!(shader.sub_shaders.len(), 1);
        assert_eq!(shader.sub_shaders[0].name, "A");
        let pass = &shader.sub_shaders[0].passes[0];
        assert_eq!(pass.name, "P");
        assert_eq!(pass.vertex_entry.as_deref(), Some("main"));
        assert_eq!(pass.fragment_entry.as_deref(), Some("main"));
        assert_eq!(pass.contents.as_deref(), Some(""));
    }

    #[test]
    fn test_anonymous_pass_state_is_not_overridden() {
        let shader = parse(
            "Shader \"S\" {
                DepthState { WriteEnabled = false; }
                SubShader \"A\" {
                    BlendState { Enabled = false; AlphaToCoverage = true; }
                    Pass \"P\" { BlendState { Enabled = true; } }
                    Pass \"Q\" { }
                }
            }",
        );
        let enabled = RenderStateElementKey::indexed(StateProperty::BlendEnabled, 0);
        let write = RenderStateElementKey::new(StateProperty::DepthWriteEnabled);
        let coverage = RenderStateElementKey::new(StateProperty::BlendAlphaToCoverage);

        let p = &shader.sub_shaders[0].passes[0].render_states;
        assert_eq!(p.constant_map[&enabled], RenderStateValue::Boolean(true));
        assert_eq!(p.constant_map[&write], RenderStateValue::Boolean(false));
        assert_eq!(p.constant_map[&coverage], RenderStateValue::Boolean(true));

        let q = &shader.sub_shaders[0].passes[1].render_states;
        assert_eq!(q.constant_map[&enabled], RenderStateValue::Boolean(false));
    }

    #[test]
    fn test_opaque_contents_flatten_into_pass_body() {
        let shader = parse(
            "Shader \"S\" {
                #version 300 es
                uniform float u_time;
                SubShader \"A\" {
                    struct Light { vec3 dir; };
                    Pass \"P\" {
                        VertexShader = vert;
                        void vert() { gl_Position = vec4(u_time); }
                    }
                }
            }",
        );
        let pass = &shader.sub_shaders[0].passes[0];
        assert_eq!(
            pass.contents.as_deref(),
            Some(
                "#version 300 es\nuniform float u_time;\nstruct Light { vec3 dir; };\nvoid vert() { gl_Position = vec4(u_time); }"
            )
        );
        assert_eq!(pass.pending_contents.len(), 1);
        assert_eq!(shader.pending_contents.len(), 2);
    }

    #[test]
    fn test_tags_use_pass_and_editor_blocks() {
        let shader = parse(
            "Shader \"S\" {
                EditorProperties { u_color(\"Color\", Color) = (1, 1, 1, 1); }
                SubShader \"A\" {
                    Tags { pipelineStage = \"Forward\", priority = 2, shadow = true }
                    UsePass \"Other/Default/Shadow\";
                    Pass \"P\" { Tags { lightMode = \"Base\" } }
                }
            }",
        );
        let sub = &shader.sub_shaders[0];
        assert_eq!(sub.tags["pipelineStage"], TagValue::String("Forward".to_string()));
        assert_eq!(sub.tags["priority"], TagValue::Number(2.0));
        assert_eq!(sub.tags["shadow"], TagValue::Boolean(true));

        assert!(sub.passes[0].is_use_pass);
        assert_eq!(sub.passes[0].name, "Other/Default/Shadow");
        assert!(sub.passes[0].contents.is_none());
        assert_eq!(sub.passes[1].tags["lightMode"], TagValue::String("Base".to_string()));
        assert!(shader.pending_contents.is_empty());
    }

    #[test]
    fn test_enum_variable_declarations_leave_the_body() {
        let shader = parse(
            "Shader \"S\" { SubShader \"A\" { Pass \"P\" { CullMode cull; RasterState { CullMode = cull; } } } }",
        );
        let pass = &shader.sub_shaders[0].passes[0];
        assert!(pass.pending_contents.is_empty());
        assert_eq!(
            pass.render_states.variable_map[&RenderStateElementKey::new(StateProperty::RasterCullMode)],
            "cull"
        );
    }

    #[test]
    fn test_symbols_do_not_leak_between_passes() {
        let mut ctx = CompilerContext::new();
        let text = "Shader \"S\" { SubShader \"A\" {
            Pass \"P\" { RenderQueueType q; }
            Pass \"Q\" { RenderQueueType = q; }
        } }";
        parse_shader(&mut ctx, "t.shader", text, &prefs()).unwrap();
        let errors = ctx.take_diagnostics();
        assert_eq!(errors.len(), 1);
        assert_matches!(
            &errors[0].reason,
            ErrorReason::Compilation(CompilationError::UndeclaredVariable { name }) if name == "q"
        );
        assert_eq!(ctx.symbols.depth(), 0);
    }

    #[test]
    fn test_duplicate_entry_point_is_fatal() {
        let (err, located) = parse_err(
            "Shader \"S\" { SubShader \"A\" { Pass \"P\" {\n  VertexShader = a;\n  VertexShader = b;\n} } }",
        );
        assert_matches!(err, CompilationError::DuplicateEntryPoint { entry } if entry == "VertexShader");
        assert_eq!(located.span.start.line, 3);
    }

    #[test]
    fn test_misplaced_statements_are_fatal() {
        for text in [
            "Shader \"S\" { Pass \"P\" { } }",
            "Shader \"S\" { Tags { a = \"b\" } }",
            "Shader \"S\" { SubShader \"A\" { VertexShader = main; } }",
            "Shader \"S\" { SubShader \"A\" { SubShader \"B\" { } } }",
        ] {
            let (err, _) = parse_err(text);
            assert_matches!(err, CompilationError::UnexpectedToken { .. }, "{}", text);
        }
    }

    #[test]
    fn test_unterminated_and_trailing_input() {
        let mut ctx = CompilerContext::new();
        assert!(parse_shader(&mut ctx, "t", "Shader \"S\" { SubShader \"A\" {", &prefs()).is_err());
        assert_eq!(ctx.symbols.depth(), 0);
        assert!(parse_shader(&mut ctx, "t", "Shader \"S\" { } extra", &prefs()).is_err());
        assert!(parse_shader(&mut ctx, "t", "Pass \"P\" { }", &prefs()).is_err());
    }
}
