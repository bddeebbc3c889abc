//! Macro preprocessor
//!
//! Resolves `#define`/`#undef`, conditional blocks and `#include` against a
//! caller-supplied chunk map, expands macros, strips comments, and returns
//! one flat text with a [`SourceMap`] back to every file that contributed.
//! Unknown directives (`#version`, `#extension`, `#pragma`) are left in the
//! output for the GLSL compiler.

pub mod engine;
pub mod error;
pub mod expander;
pub mod expression;
pub mod macros;
pub mod segments;

pub use error::PreprocessorError;
pub use expander::Expander;
pub use expression::ExpressionEvaluator;
pub use macros::{is_reserved, MacroDefine, MacroTable, RESERVED_PREFIX};
pub use segments::{ExpandSegment, SegmentStack};

use crate::config::runtime::PreprocessorPreferences;
use crate::context::CompilerContext;
use crate::diagnostics::{CompileResult, SourceMap};
use crate::lexical::check_source_size;
use crate::log_success;
use crate::logging::codes;
use engine::Engine;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Include name → chunk text, owned by the caller
pub type IncludeMap = HashMap<String, String>;

#[derive(Debug, Clone, Serialize)]
pub struct PreprocessOutput {
    pub text: String,
    pub source_map: SourceMap,
}

/// Preprocess `source` as file `file`. The context's macro table is used
/// as is; call `CompilerContext::reset` first for an independent compile.
pub fn preprocess(
    ctx: &mut CompilerContext,
    file: &str,
    source: &str,
    includes: &IncludeMap,
    prefs: &PreprocessorPreferences,
) -> CompileResult<PreprocessOutput> {
    let text: Arc<str> = Arc::from(source);
    check_source_size(file, &text)?;
    ctx.sources.insert(file.to_string(), text.clone());

    ctx.include_stack.push(file.to_string());
    let result = Engine::new(&mut *ctx, includes, prefs, file, text).run();
    ctx.include_stack.pop();
    let (text, source_map) = result?;

    log_success!(codes::success::PREPROCESSING_COMPLETE, "Preprocessing complete",
        "file" => file,
        "bytes" => text.len(),
        "macros" => ctx.macros.len()
    );

    Ok(PreprocessOutput { text, source_map })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::compile_time::preprocessor::{
        MAX_CONDITIONAL_DEPTH, MAX_EXPANSION_DEPTH, MAX_INCLUDE_DEPTH, MAX_MACRO_COUNT,
    };
    use crate::diagnostics::{CompileError, ErrorReason};
    use assert_matches::assert_matches;

    fn prefs() -> PreprocessorPreferences {
        PreprocessorPreferences {
            warn_on_repeated_include: true,
            log_macro_redefinitions: false,
            predefine_gl_es: true,
        }
    }

    fn run_with(source: &str, includes: &IncludeMap) -> CompileResult<PreprocessOutput> {
        let mut ctx = CompilerContext::new();
        ctx.reset(&[], &prefs());
        preprocess(&mut ctx, "main.shader", source, includes, &prefs())
    }

    fn run(source: &str) -> String {
        run_with(source, &IncludeMap::new()).unwrap().text
    }

    fn preprocessor_error(result: CompileResult<PreprocessOutput>) -> (PreprocessorError, CompileError) {
        let err = result.unwrap_err();
        let reason = match &err.reason {
            ErrorReason::Preprocessor(e) => e.clone(),
            other => panic!("expected a preprocessor error, got {:?}", other),
        };
        (reason, err)
    }

    #[test]
    fn test_macro_free_input_only_loses_comments() {
        let source = "Shader \"S\" {\n  // note\n  float x = 1.0; /* c */\n}\n";
        assert_eq!(run(source), "Shader \"S\" {\n  \n  float x = 1.0;  \n}\n");
    }

    #[test]
    fn test_if_branch_selection() {
        let body = "#if FOO\nfirst\n#else\nsecond\n#endif\n";
        assert_eq!(run(&format!("#define FOO 1\n{}", body)), "\nfirst\n\n");
        assert_eq!(run(&format!("#define FOO 0\n{}", body)), "\nsecond\n\n");
        assert_eq!(run(body), "second\n\n");
    }

    #[test]
    fn test_elif_chain_and_nesting() {
        let source = "#define LEVEL 2\n#if LEVEL == 1\none\n#elif LEVEL == 2\n#ifdef GL_ES\ntwo_es\n#else\ntwo\n#endif\n#else\nother\n#endif\n";
        assert_eq!(run(source), "\ntwo_es\n\n\n");
    }

    #[test]
    fn test_ifndef_and_undef() {
        assert_eq!(run("#ifndef MISSING\nyes\n#endif"), "yes\n");
        assert_eq!(run("#define X 5\n#undef X\nX"), "\n\nX");
        assert_eq!(run("#undef NEVER_DEFINED\nok"), "\nok");
    }

    #[test]
    fn test_function_macros() {
        assert_eq!(run("#define ADD(a,b) (a+b)\nADD(1,2)"), "\n(1+2)");
        assert_eq!(run("#define ADD(a,b) (a+b)\nADD(ADD(1,2),3)"), "\n((1+2)+3)");
        // A space before '(' makes an object macro
        assert_eq!(run("#define F (x)\nF"), "\n(x)");
    }

    #[test]
    fn test_object_macro_naming_function_macro_takes_following_arguments() {
        assert_eq!(run("#define F G\n#define G(x) (x*2)\nF(3)"), "\n\n(3*2)");
        assert_eq!(run("#define F G\n#define G(x) (x*2)\nF (1 + 2)"), "\n\n(1 + 2*2)");
        assert_eq!(run("#define F G\n#define G(x) (x*2)\nF;"), "\n\nG;");
        // The call's result may itself end in a function-like name
        let source = "#define A B\n#define B(x) x C\n#define C(y) [y]\nA(1)(2)";
        assert_eq!(run(source), "\n\n\n1 [2]");
    }

    #[test]
    fn test_chained_function_macro_source_map() {
        let source = "#define F G\n#define G(x) (x*2)\nF(3) end";
        let out = run_with(source, &IncludeMap::new()).unwrap();
        assert_eq!(out.text, "\n\n(3*2) end");
        // The whole call, arguments included, resolves to the invocation
        let invocation = source.find("F(3)").unwrap();
        assert_eq!(out.source_map.map(2).index, invocation);
        assert_eq!(out.source_map.map(out.text.len() - 1).index, source.len() - 1);
    }

    #[test]
    fn test_self_referential_macro() {
        assert_eq!(run("#define X X\nX"), "\nX");
    }

    #[test]
    fn test_define_body_comments_and_continuation() {
        assert_eq!(run("#define A 1 /* one */ + 2 // two\nA"), "\n1   + 2");
        assert_eq!(run("#define B 1 + \\\n  2\nB"), "\n1 +    2");
    }

    #[test]
    fn test_strings_and_unknown_directives_pass_through() {
        assert_eq!(run("#define N 1\n\"N\" N"), "\n\"N\" 1");
        assert_eq!(run("#version 300 es\n#pragma once"), "#version 300 es\n#pragma once");
    }

    #[test]
    fn test_reserved_prefix() {
        let (err, _) = preprocessor_error(run_with("#define GL_FOO 1", &IncludeMap::new()));
        assert_matches!(err, PreprocessorError::ReservedMacroRedefinition { name } if name == "GL_FOO");

        // Undefined driver extensions are left for the GLSL compiler
        let source = "#ifdef GL_OES_standard_derivatives\n#define D 1\n#endif\nD";
        assert_eq!(run(source), "#ifdef GL_OES_standard_derivatives\n\n#endif\n1");
    }

    #[test]
    fn test_include_resolution_and_source_map() {
        let mut includes = IncludeMap::new();
        includes.insert("common".to_string(), "float x;\n".to_string());
        let out = run_with("A\n#include \"common\"\nB", &includes).unwrap();
        assert_eq!(out.text, "A\nfloat x;\n\nB");

        let inside = out.source_map.map(8);
        assert_eq!(inside.source_file, "common");
        assert_eq!(inside.index, 6);

        let after = out.source_map.map(out.text.len() - 1);
        assert_eq!(after.source_file, "main.shader");
        assert_eq!(after.index, 20);
    }

    #[test]
    fn test_include_shares_macros_and_is_cached() {
        let mut includes = IncludeMap::new();
        includes.insert("defs".to_string(), "#define SIZE 4\nint n;".to_string());
        let source = "#include <defs>\n#include \"defs\"\nSIZE";
        assert_eq!(run_with(source, &includes).unwrap().text, "\nint n;\n\nint n;\n4");
    }

    #[test]
    fn test_include_errors() {
        let (err, located) = preprocessor_error(run_with("#include \"nope\"", &IncludeMap::new()));
        assert_matches!(err, PreprocessorError::MissingInclude { name } if name == "nope");
        assert_eq!(located.span.start.column, 10);

        let mut includes = IncludeMap::new();
        includes.insert("a".to_string(), "#include \"b\"".to_string());
        includes.insert("b".to_string(), "#include \"a\"".to_string());
        let (err, located) = preprocessor_error(run_with("#include \"a\"", &includes));
        assert_matches!(err, PreprocessorError::RecursiveInclude { chain, .. } if chain == "main.shader -> a -> b -> a");
        assert_eq!(located.file, "b");
    }

    #[test]
    fn test_conditional_structure_errors() {
        let cases = [
            "#if 1\nx\n",
            "#else\n",
            "#endif\n",
            "#if 1\n#else\n#else\n#endif\n",
            "#if 1\n#else\n#elif 1\n#endif\n",
        ];
        for source in cases {
            let result = run_with(source, &IncludeMap::new());
            assert!(result.is_err(), "{:?} should fail", source);
        }
        let (err, _) = preprocessor_error(run_with("#ifdef\n#endif", &IncludeMap::new()));
        assert_matches!(err, PreprocessorError::InvalidMacroName { .. });
    }

    #[test]
    fn test_unterminated_passthrough_reports_its_directive() {
        let (err, located) = preprocessor_error(run_with("#ifndef GL_X\nA\n", &IncludeMap::new()));
        assert_matches!(err, PreprocessorError::UnterminatedConditional { directive } if directive == "#ifndef");
        assert_eq!(located.span.start.line, 1);

        let (err, _) = preprocessor_error(run_with("#ifdef GL_X\nA\n", &IncludeMap::new()));
        assert_matches!(err, PreprocessorError::UnterminatedConditional { directive } if directive == "#ifdef");
    }

    #[test]
    fn test_too_many_macros() {
        let source: String = (0..=MAX_MACRO_COUNT)
            .map(|i| format!("#define M{} {}\n", i, i))
            .collect();
        let (err, located) = preprocessor_error(run_with(&source, &IncludeMap::new()));
        assert_matches!(err, PreprocessorError::TooManyMacros);
        assert!(located.span.start.line as usize <= MAX_MACRO_COUNT + 1);

        // Redefining an existing name does not count against the limit
        let source = "#define M 1\n".repeat(MAX_MACRO_COUNT + 1);
        assert!(run_with(&source, &IncludeMap::new()).is_ok());
    }

    #[test]
    fn test_include_depth_exceeded() {
        let chain = MAX_INCLUDE_DEPTH + 8;
        let mut includes = IncludeMap::new();
        for i in 0..chain {
            includes.insert(format!("c{}", i), format!("#include \"c{}\"\n", i + 1));
        }
        includes.insert(format!("c{}", chain), "leaf".to_string());

        let (err, located) = preprocessor_error(run_with("#include \"c0\"", &includes));
        let expected = format!("c{}", MAX_INCLUDE_DEPTH);
        assert_matches!(err, PreprocessorError::IncludeDepthExceeded { name } if name == expected);
        assert_eq!(located.file, format!("c{}", MAX_INCLUDE_DEPTH - 1));
    }

    #[test]
    fn test_expansion_depth_exceeded() {
        let chain = MAX_EXPANSION_DEPTH + 16;
        let mut source: String = (0..chain)
            .map(|i| format!("#define M{} M{}\n", i, i + 1))
            .collect();
        source.push_str("M0");

        let (err, located) = preprocessor_error(run_with(&source, &IncludeMap::new()));
        let expected = format!("M{}", MAX_EXPANSION_DEPTH);
        assert_matches!(err, PreprocessorError::ExpansionDepthExceeded { name } if name == expected);
        assert_eq!(located.span.start.line as usize, chain + 1);

        // A chain under the limit resolves to its last name
        let short: String = (0..8).map(|i| format!("#define N{} N{}\n", i, i + 1)).collect();
        assert!(run(&format!("{}N0", short)).ends_with("N8"));
    }

    #[test]
    fn test_conditional_depth_exceeded() {
        let levels = MAX_CONDITIONAL_DEPTH + 1;
        let source = format!("{}x\n{}", "#if 1\n".repeat(levels), "#endif\n".repeat(levels));
        let (err, located) = preprocessor_error(run_with(&source, &IncludeMap::new()));
        assert_matches!(err, PreprocessorError::ConditionalDepthExceeded);
        assert_eq!(located.span.start.line as usize, levels);

        let source = format!("{}x\n{}", "#if 1\n".repeat(levels - 1), "#endif\n".repeat(levels - 1));
        assert!(run(&source).contains('x'));
    }

    #[test]
    fn test_expression_errors_are_located_on_the_condition() {
        let (err, located) = preprocessor_error(run_with("\n#if 1 / 0\n#endif", &IncludeMap::new()));
        assert_eq!(err, PreprocessorError::DivisionByZero);
        assert_eq!((located.span.start.line, located.span.start.column), (2, 5));
    }

    #[test]
    fn test_source_map_through_macro_and_branch() {
        let source = "#define ONE 1\n#if ONE\nx = ONE;\n#endif\ny";
        let out = run_with(source, &IncludeMap::new()).unwrap();
        assert_eq!(out.text, "\nx = 1;\n\ny");
        // 'x' sits at offset 22 of the source
        assert_eq!(out.source_map.map(1).index, 22);
        // The expanded '1' resolves to the invocation
        assert_eq!(out.source_map.map(5).index, 26);
        // 'y' after the block
        assert_eq!(out.source_map.map(out.text.len() - 1).index, source.len() - 1);
    }
}
