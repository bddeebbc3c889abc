//! File loading for the outer surface
//!
//! The compiler core works on in-memory text and an include map. This
//! module builds both from disk for the CLI; nothing in the core calls it.

mod processor;

use crate::config::runtime::FileProcessorPreferences;
use crate::preprocessor::IncludeMap;
use std::path::Path;

pub use processor::{FileMetadata, FileProcessor, FileProcessorError, LoadedSource};

/// Load one shader file with default preferences
pub fn load_source(path: &Path) -> Result<LoadedSource, FileProcessorError> {
    FileProcessor::new().load_source(path)
}

/// Merge the chunks of several include directories. A chunk name found in
/// more than one directory resolves to the first directory's file.
pub fn load_include_dirs<P: AsRef<Path>>(
    dirs: &[P],
    prefs: &FileProcessorPreferences,
) -> Result<IncludeMap, FileProcessorError> {
    let processor = FileProcessor::from_preferences(prefs);
    let mut includes = IncludeMap::new();
    for dir in dirs {
        for (name, text) in processor.load_include_dir(dir.as_ref())? {
            includes.entry(name).or_insert(text);
        }
    }
    Ok(includes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_first_directory_wins() {
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        fs::write(first.path().join("common.glsl"), "first").unwrap();
        fs::write(second.path().join("common.glsl"), "second").unwrap();
        fs::write(second.path().join("extra.glsl"), "extra").unwrap();

        let prefs = FileProcessorPreferences {
            include_extensions: vec!["glsl".to_string()],
            recurse_include_dirs: true,
            enable_performance_logging: false,
        };
        let includes = load_include_dirs(&[first.path(), second.path()], &prefs).unwrap();
        assert_eq!(includes["common.glsl"], "first");
        assert_eq!(includes["extra.glsl"], "extra");
    }

    #[test]
    fn test_load_source_default_processor() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("s.shader");
        fs::write(&path, "Shader \"S\" { }").unwrap();
        assert_eq!(load_source(&path).unwrap().source, "Shader \"S\" { }");
        assert_eq!(FileProcessor::max_file_size(), crate::config::compile_time::file_processing::MAX_FILE_SIZE);
    }
}
