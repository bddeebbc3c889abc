//! Shader source and include-chunk loading with compile-time size limits

use crate::config::compile_time::file_processing::{
    MAX_FILE_SIZE, MAX_INCLUDE_DIR_DEPTH, MAX_INCLUDE_FILES,
};
use crate::config::runtime::FileProcessorPreferences;
use crate::logging::codes;
use crate::preprocessor::IncludeMap;
use crate::{log_debug, log_error, log_file_metrics, log_success};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

/// File processor specific errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum FileProcessorError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("File too large: {size} bytes (max: {max_size})")]
    FileTooLarge { size: u64, max_size: u64 },

    #[error("Permission denied: {path}")]
    PermissionDenied { path: String },

    #[error("Invalid UTF-8 encoding in file: {path}")]
    InvalidEncoding { path: String },

    #[error("I/O error reading file: {message}")]
    IoError { message: String },

    #[error("Invalid path: {path}")]
    InvalidPath { path: String },

    #[error("Include directory holds too many chunks: {count} (max: {max})")]
    TooManyIncludeFiles { count: usize, max: usize },
}

impl FileProcessorError {
    pub fn error_code(&self) -> crate::logging::Code {
        use codes::file_processing::*;
        match self {
            Self::FileNotFound { .. } => FILE_NOT_FOUND,
            Self::FileTooLarge { .. } => FILE_TOO_LARGE,
            Self::PermissionDenied { .. } => PERMISSION_DENIED,
            Self::InvalidEncoding { .. } => INVALID_ENCODING,
            Self::IoError { .. } => IO_ERROR,
            Self::InvalidPath { .. } => INVALID_PATH,
            Self::TooManyIncludeFiles { .. } => TOO_MANY_INCLUDE_FILES,
        }
    }

    pub fn requires_halt(&self) -> bool {
        codes::requires_halt(self.error_code().as_str())
    }

    fn from_io(error: std::io::Error, path: &Path) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::FileNotFound {
                path: path.display().to_string(),
            },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                path: path.display().to_string(),
            },
            std::io::ErrorKind::InvalidData => Self::InvalidEncoding {
                path: path.display().to_string(),
            },
            _ => Self::IoError {
                message: format!("'{}': {}", path.display(), error),
            },
        }
    }
}

/// File metadata collected while loading
#[derive(Debug, Clone)]
pub struct FileMetadata {
    pub path: PathBuf,
    pub size: u64,
    pub extension: Option<String>,
    pub line_count: usize,
    pub modified: Option<SystemTime>,
}

impl FileMetadata {
    pub fn human_readable_size(&self) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
        let mut size = self.size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", self.size, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }
}

/// A loaded shader file
#[derive(Debug, Clone)]
pub struct LoadedSource {
    pub source: String,
    pub metadata: FileMetadata,
    pub processing_duration: Duration,
}

impl LoadedSource {
    /// Name the preprocessor and diagnostics know the file by
    pub fn display_name(&self) -> String {
        self.metadata.path.display().to_string()
    }
}

/// Loads root shader files and include directories for the preprocessor
#[derive(Debug, Clone)]
pub struct FileProcessor {
    pub include_extensions: Vec<String>,
    pub recurse_include_dirs: bool,
    pub enable_performance_logging: bool,
}

impl FileProcessor {
    pub fn new() -> Self {
        Self::from_preferences(&FileProcessorPreferences::default())
    }

    pub fn from_preferences(prefs: &FileProcessorPreferences) -> Self {
        Self {
            include_extensions: prefs
                .include_extensions
                .iter()
                .map(|ext| ext.to_lowercase())
                .collect(),
            recurse_include_dirs: prefs.recurse_include_dirs,
            enable_performance_logging: prefs.enable_performance_logging,
        }
    }

    pub fn max_file_size() -> u64 {
        MAX_FILE_SIZE
    }

    /// Read one file, enforcing the size limit and UTF-8
    pub fn load_source(&self, file_path: &Path) -> Result<LoadedSource, FileProcessorError> {
        let start_time = Instant::now();
        let display = file_path.display().to_string();
        log_debug!("Loading shader source", "file" => display.as_str());

        let mut metadata = self.get_metadata(file_path)?;
        if metadata.size > MAX_FILE_SIZE {
            let error = FileProcessorError::FileTooLarge {
                size: metadata.size,
                max_size: MAX_FILE_SIZE,
            };
            log_error!(error.error_code(), "File exceeds compile-time maximum size limit",
                "file" => display.as_str(),
                "size_human" => metadata.human_readable_size(),
                "limit_bytes" => MAX_FILE_SIZE);
            return Err(error);
        }

        let source = fs::read_to_string(file_path).map_err(|e| {
            let error = FileProcessorError::from_io(e, file_path);
            log_error!(error.error_code(), "Failed to read file",
                "file" => display.as_str(),
                "error" => error.to_string());
            error
        })?;
        metadata.line_count = source.lines().count();

        let result = LoadedSource {
            source,
            metadata,
            processing_duration: start_time.elapsed(),
        };
        if self.enable_performance_logging {
            log_file_metrics!(codes::success::FILE_PROCESSING_SUCCESS, "Shader source loaded",
                file = display.as_str(),
                size = result.metadata.human_readable_size(),
                lines = result.metadata.line_count);
        }
        Ok(result)
    }

    /// Every file under `dir` with an include extension, keyed by its path
    /// relative to `dir` with `/` separators
    pub fn load_include_dir(&self, dir: &Path) -> Result<IncludeMap, FileProcessorError> {
        let start_time = Instant::now();
        if !dir.is_dir() {
            let error = FileProcessorError::InvalidPath {
                path: dir.display().to_string(),
            };
            log_error!(error.error_code(), "Include path is not a directory",
                "path" => dir.display());
            return Err(error);
        }

        let mut files = Vec::new();
        self.collect_files(dir, 0, &mut files)?;
        if files.len() > MAX_INCLUDE_FILES {
            let error = FileProcessorError::TooManyIncludeFiles {
                count: files.len(),
                max: MAX_INCLUDE_FILES,
            };
            log_error!(error.error_code(), "Include directory exceeds chunk limit",
                "path" => dir.display(),
                "count" => files.len());
            return Err(error);
        }

        let mut includes = IncludeMap::new();
        for path in files {
            let loaded = self.load_source(&path)?;
            includes.insert(include_key(dir, &path), loaded.source);
        }

        log_success!(codes::success::INCLUDE_DIRECTORY_LOADED, "Include directory loaded",
            "path" => dir.display(),
            "chunks" => includes.len(),
            "duration_ms" => format!("{:.2}", start_time.elapsed().as_secs_f64() * 1000.0));
        Ok(includes)
    }

    fn collect_files(
        &self,
        dir: &Path,
        depth: usize,
        files: &mut Vec<PathBuf>,
    ) -> Result<(), FileProcessorError> {
        if depth > MAX_INCLUDE_DIR_DEPTH {
            log_debug!("Include directory nesting limit reached, skipping",
                "path" => dir.display(),
                "depth" => depth);
            return Ok(());
        }

        let entries = fs::read_dir(dir).map_err(|e| FileProcessorError::from_io(e, dir))?;
        let mut paths = entries
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| FileProcessorError::from_io(e, dir))?;
        paths.sort();

        for path in paths {
            if path.is_dir() {
                if self.recurse_include_dirs {
                    self.collect_files(&path, depth + 1, files)?;
                }
            } else if self.is_include_file(&path) {
                files.push(path);
            }
        }
        Ok(())
    }

    fn is_include_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.include_extensions.iter().any(|e| *e == ext.to_lowercase()))
            .unwrap_or(false)
    }

    fn get_metadata(&self, path: &Path) -> Result<FileMetadata, FileProcessorError> {
        if path.as_os_str().is_empty() {
            return Err(FileProcessorError::InvalidPath {
                path: String::new(),
            });
        }
        let metadata = fs::metadata(path).map_err(|e| {
            let error = FileProcessorError::from_io(e, path);
            log_error!(error.error_code(), "Failed to read file metadata",
                "path" => path.display());
            error
        })?;
        if !metadata.is_file() {
            let error = FileProcessorError::InvalidPath {
                path: path.display().to_string(),
            };
            log_error!(error.error_code(), "Path is not a file", "path" => path.display());
            return Err(error);
        }

        Ok(FileMetadata {
            path: path.to_path_buf(),
            size: metadata.len(),
            extension: path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|s| s.to_lowercase()),
            line_count: 0,
            modified: metadata.modified().ok(),
        })
    }
}

impl Default for FileProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// `dir/lib/common.glsl` → `lib/common.glsl`
fn include_key(dir: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(dir).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    fn processor(recurse: bool) -> FileProcessor {
        FileProcessor {
            include_extensions: vec!["glsl".to_string(), "shader".to_string()],
            recurse_include_dirs: recurse,
            enable_performance_logging: true,
        }
    }

    #[test]
    fn test_load_source() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("unlit.shader");
        fs::write(&path, "Shader \"Unlit\" {\n}\n").unwrap();

        let loaded = processor(true).load_source(&path).unwrap();
        assert_eq!(loaded.metadata.line_count, 2);
        assert_eq!(loaded.metadata.extension.as_deref(), Some("shader"));
        assert!(loaded.display_name().ends_with("unlit.shader"));
    }

    #[test]
    fn test_load_errors() {
        let dir = tempdir().unwrap();
        assert_matches!(
            processor(true).load_source(&dir.path().join("missing.shader")),
            Err(FileProcessorError::FileNotFound { .. })
        );
        assert_matches!(
            processor(true).load_source(dir.path()),
            Err(FileProcessorError::InvalidPath { .. })
        );

        let binary = dir.path().join("bad.glsl");
        fs::write(&binary, [0xff, 0xfe, 0x00]).unwrap();
        assert_matches!(
            processor(true).load_source(&binary),
            Err(FileProcessorError::InvalidEncoding { .. })
        );
    }

    #[test]
    fn test_include_dir_keys_and_filters() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("lib")).unwrap();
        fs::write(dir.path().join("common.glsl"), "float a;").unwrap();
        fs::write(dir.path().join("lib").join("light.glsl"), "float b;").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let includes = processor(true).load_include_dir(dir.path()).unwrap();
        assert_eq!(includes.len(), 2);
        assert_eq!(includes["common.glsl"], "float a;");
        assert_eq!(includes["lib/light.glsl"], "float b;");

        let flat = processor(false).load_include_dir(dir.path()).unwrap();
        assert_eq!(flat.len(), 1);
    }

    #[test]
    fn test_include_dir_must_be_a_directory() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.glsl");
        fs::write(&file, "").unwrap();
        let err = processor(true).load_include_dir(&file).unwrap_err();
        assert_eq!(err.error_code(), codes::file_processing::INVALID_PATH);
        assert!(err.requires_halt());
    }
}
