// build.rs - TOML-driven compile-time limit generation
use std::env;
use std::fs;
use std::path::Path;

#[derive(serde::Deserialize)]
struct CompileTimeConfig {
    file_processing: FileProcessingLimits,
    scanner: ScannerLimits,
    preprocessor: PreprocessorLimits,
    content: ContentLimits,
    diagnostics: DiagnosticLimits,
    logging: LoggingLimits,
}

#[derive(serde::Deserialize)]
struct FileProcessingLimits {
    max_file_size: u64,
    max_include_files: usize,
    max_include_dir_depth: usize,
}

#[derive(serde::Deserialize)]
struct ScannerLimits {
    max_source_size: usize,
    max_token_length: usize,
}

#[derive(serde::Deserialize)]
struct PreprocessorLimits {
    max_include_depth: usize,
    max_expansion_depth: usize,
    max_macro_count: usize,
    max_conditional_depth: usize,
    max_expression_depth: usize,
}

#[derive(serde::Deserialize)]
struct ContentLimits {
    max_collected_errors: usize,
    max_blend_targets: u8,
}

#[derive(serde::Deserialize)]
struct DiagnosticLimits {
    wrapping_line_count: usize,
    max_source_map_depth: usize,
}

#[derive(serde::Deserialize)]
struct LoggingLimits {
    log_buffer_size: usize,
    max_log_message_length: usize,
    min_log_level_floor: u8,
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=SHADERLAB_BUILD_PROFILE");
    println!("cargo:rerun-if-env-changed=SHADERLAB_CONFIG_DIR");

    let profile =
        env::var("SHADERLAB_BUILD_PROFILE").unwrap_or_else(|_| "development".to_string());
    let config_dir = env::var("SHADERLAB_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

    // Workspace root is the parent of the crate directory
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let workspace_root = Path::new(&manifest_dir)
        .parent()
        .expect("Could not find workspace root (parent directory)");

    let config_path = workspace_root
        .join(&config_dir)
        .join(format!("{}.toml", profile));

    println!("cargo:rerun-if-changed={}", config_path.display());

    if !config_path.exists() {
        panic!(
            "Configuration file not found: {}\nLooking for: {}/{}/{}.toml",
            config_path.display(),
            workspace_root.display(),
            config_dir,
            profile
        );
    }

    let config_content = fs::read_to_string(&config_path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", config_path.display(), e));

    let config: CompileTimeConfig = toml::from_str(&config_content)
        .unwrap_or_else(|e| panic!("Invalid TOML in {}: {}", config_path.display(), e));

    validate_limits(&config, &profile);
    generate_constants(&config, &profile);
}

fn validate_limits(config: &CompileTimeConfig, profile: &str) {
    const ABSOLUTE_MAX_FILE_SIZE: u64 = 256 * 1024 * 1024;
    const ABSOLUTE_MAX_RECURSION: usize = 512;

    if config.file_processing.max_file_size > ABSOLUTE_MAX_FILE_SIZE {
        panic!("LIMITS: max_file_size exceeds absolute maximum");
    }

    if config.scanner.max_source_size as u64 > config.file_processing.max_file_size {
        panic!("LIMITS: max_source_size must not exceed max_file_size");
    }

    for (name, value) in [
        ("max_include_depth", config.preprocessor.max_include_depth),
        ("max_expansion_depth", config.preprocessor.max_expansion_depth),
        ("max_conditional_depth", config.preprocessor.max_conditional_depth),
        ("max_expression_depth", config.preprocessor.max_expression_depth),
        ("max_source_map_depth", config.diagnostics.max_source_map_depth),
    ] {
        if value == 0 || value > ABSOLUTE_MAX_RECURSION {
            panic!("LIMITS: {} must be within 1..={}", name, ABSOLUTE_MAX_RECURSION);
        }
    }

    // Blend state targets are addressed as Prop[0]..Prop[7]
    if config.content.max_blend_targets == 0 || config.content.max_blend_targets > 8 {
        panic!("LIMITS: max_blend_targets must be within 1..=8");
    }

    if config.logging.min_log_level_floor > 3 {
        panic!("LIMITS: min_log_level_floor too high (max: 3)");
    }

    if profile == "production" && config.content.max_collected_errors > 1000 {
        panic!("PRODUCTION: max_collected_errors too high for production");
    }
}

fn generate_constants(config: &CompileTimeConfig, profile: &str) {
    let out_dir = env::var("OUT_DIR").unwrap();
    let output_path = Path::new(&out_dir).join("constants.rs");

    let constants_code = format!(
        r#"
// Generated compile-time constants from TOML configuration
// Profile: {}
// DO NOT EDIT - Generated by build.rs

pub mod compile_time {{
    pub mod file_processing {{
        pub const MAX_FILE_SIZE: u64 = {};
        pub const MAX_INCLUDE_FILES: usize = {};
        pub const MAX_INCLUDE_DIR_DEPTH: usize = {};
    }}

    pub mod scanner {{
        pub const MAX_SOURCE_SIZE: usize = {};
        pub const MAX_TOKEN_LENGTH: usize = {};
    }}

    pub mod preprocessor {{
        pub const MAX_INCLUDE_DEPTH: usize = {};
        pub const MAX_EXPANSION_DEPTH: usize = {};
        pub const MAX_MACRO_COUNT: usize = {};
        pub const MAX_CONDITIONAL_DEPTH: usize = {};
        pub const MAX_EXPRESSION_DEPTH: usize = {};
    }}

    pub mod content {{
        pub const MAX_COLLECTED_ERRORS: usize = {};
        pub const MAX_BLEND_TARGETS: u8 = {};
    }}

    pub mod diagnostics {{
        pub const WRAPPING_LINE_COUNT: usize = {};
        pub const MAX_SOURCE_MAP_DEPTH: usize = {};
    }}

    pub mod logging {{
        pub const LOG_BUFFER_SIZE: usize = {};
        pub const MAX_LOG_MESSAGE_LENGTH: usize = {};
        pub const MIN_LOG_LEVEL_FLOOR: u8 = {};
    }}
}}
"#,
        profile,
        config.file_processing.max_file_size,
        config.file_processing.max_include_files,
        config.file_processing.max_include_dir_depth,
        config.scanner.max_source_size,
        config.scanner.max_token_length,
        config.preprocessor.max_include_depth,
        config.preprocessor.max_expansion_depth,
        config.preprocessor.max_macro_count,
        config.preprocessor.max_conditional_depth,
        config.preprocessor.max_expression_depth,
        config.content.max_collected_errors,
        config.content.max_blend_targets,
        config.diagnostics.wrapping_line_count,
        config.diagnostics.max_source_map_depth,
        config.logging.log_buffer_size,
        config.logging.max_log_message_length,
        config.logging.min_log_level_floor,
    );

    fs::write(output_path, constants_code).unwrap();
}
