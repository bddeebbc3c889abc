//! # ShaderLab compiler CLI
//!

mod log_bridge;

use clap::{Parser, ValueEnum};
use shaderlab_compiler::config::runtime::{LogLevel, RuntimeConfig};
use shaderlab_compiler::logging::{self, LoggingService};
use shaderlab_compiler::pipeline::{self, CompileOptions, CompileOutput, PipelineOutput};
use shaderlab_compiler::log_info;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
    /// Debug dump of the shader IR
    Ir,
    /// Preprocessed text
    Expanded,
    /// IR and source map as JSON
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "shaderlab", version, about = "ShaderLab front-end compiler")]
struct Cli {
    /// Shader file to compile
    input: PathBuf,

    /// Directory of include chunks, keyed by relative path (repeatable)
    #[arg(short = 'I', long = "include-dir", value_name = "DIR")]
    include_dirs: Vec<PathBuf>,

    /// Predefine a macro (repeatable)
    #[arg(short = 'D', long = "define", value_name = "NAME[=VALUE]", value_parser = parse_define)]
    defines: Vec<(String, Option<String>)>,

    #[arg(long, value_enum, default_value_t = Emit::Ir)]
    emit: Emit,

    /// Runtime configuration file (TOML)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log pipeline events down to debug level
    #[arg(short, long)]
    verbose: bool,
}

fn parse_define(arg: &str) -> Result<(String, Option<String>), String> {
    let (name, value) = match arg.split_once('=') {
        Some((name, value)) => (name, Some(value.to_string())),
        None => (arg, None),
    };
    let valid = name
        .chars()
        .next()
        .map_or(false, |c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(format!("'{}' is not a valid macro name", name));
    }
    Ok((name.to_string(), value))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match RuntimeConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("error: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => RuntimeConfig::default(),
    };
    if cli.verbose {
        config.logging.min_log_level = LogLevel::Debug;
    }

    if let Err(e) = init_logging(&config, cli.verbose) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    let options = CompileOptions {
        includes: Default::default(),
        predefined: cli.defines.clone(),
        config,
    };
    log_info!("shaderlab starting",
        "input" => cli.input.display(),
        "include_dirs" => cli.include_dirs.len()
    );

    match pipeline::compile_file(&cli.input, &cli.include_dirs, &options) {
        Ok(output) => match emit(&cli, &output) {
            Ok(()) => {
                if output.warnings > 0 {
                    eprintln!("warning: {} warning(s) emitted", output.warnings);
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {}", e);
                ExitCode::FAILURE
            }
        },
        Err(err) => {
            eprintln!("{}", err.render(&options.config.diagnostics));
            ExitCode::FAILURE
        }
    }
}

fn init_logging(config: &RuntimeConfig, verbose: bool) -> Result<(), String> {
    logging::config::init_runtime_preferences(config.logging.clone())?;

    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    let service = LoggingService::new(
        Arc::new(log_bridge::LogBridge),
        logging::config::get_min_log_level(),
    );
    logging::init_global_logging_with_service(Arc::new(service))
}

fn emit(cli: &Cli, output: &CompileOutput) -> Result<(), serde_json::Error> {
    match cli.emit {
        Emit::Ir => println!("{:#?}", output.shader),
        Emit::Expanded => print!("{}", output.expanded),
        Emit::Json => {
            let source_file = cli.input.display().to_string();
            println!("{}", PipelineOutput::new(&source_file, output).to_json()?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_define() {
        assert_eq!(parse_define("FOO"), Ok(("FOO".to_string(), None)));
        assert_eq!(parse_define("LEVEL=2"), Ok(("LEVEL".to_string(), Some("2".to_string()))));
        assert_eq!(parse_define("EMPTY="), Ok(("EMPTY".to_string(), Some(String::new()))));
        assert!(parse_define("1BAD").is_err());
        assert!(parse_define("=1").is_err());
    }

    #[test]
    fn test_cli_arguments() {
        let cli = Cli::try_parse_from([
            "shaderlab", "lit.shader", "-I", "chunks", "--include-dir", "lib",
            "-D", "GL_ES_SHADOWS=1", "--emit", "json", "-v",
        ])
        .unwrap();
        assert_eq!(cli.input, PathBuf::from("lit.shader"));
        assert_eq!(cli.include_dirs, vec![PathBuf::from("chunks"), PathBuf::from("lib")]);
        assert_eq!(cli.defines, vec![("GL_ES_SHADOWS".to_string(), Some("1".to_string()))]);
        assert_eq!(cli.emit, Emit::Json);
        assert!(cli.verbose);

        assert!(Cli::try_parse_from(["shaderlab"]).is_err());
        assert!(Cli::try_parse_from(["shaderlab", "a.shader", "--emit", "ast"]).is_err());
    }
}
