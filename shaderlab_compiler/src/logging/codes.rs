//! Error codes and classification
//!
//! Single source of truth for every code the compiler emits and the
//! behavioral metadata attached to it.

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// CODE WRAPPER TYPE
// ============================================================================

/// Universal code wrapper for error, warning and success codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ERROR CLASSIFICATION TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// Complete metadata for a code
#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub recoverable: bool,
    pub requires_halt: bool,
    pub description: &'static str,
    pub recommended_action: &'static str,
}

impl ErrorMetadata {
    pub fn new(
        code: Code,
        category: &'static str,
        severity: Severity,
        recoverable: bool,
        requires_halt: bool,
        description: &'static str,
        recommended_action: &'static str,
    ) -> Self {
        Self {
            code: code.as_str(),
            category,
            severity,
            recoverable,
            requires_halt,
            description,
            recommended_action,
        }
    }
}

// ============================================================================
// CODE CONSTANTS
// ============================================================================

pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("ERR001");
    pub const INITIALIZATION_FAILURE: Code = Code::new("ERR002");
}

/// Character-level scanner errors
pub mod scanner {
    use super::Code;

    pub const UNEXPECTED_CHARACTER: Code = Code::new("E020");
    pub const EXPECTED_LEXEME: Code = Code::new("E021");
    pub const UNTERMINATED_STRING: Code = Code::new("E022");
    pub const UNTERMINATED_PAIR: Code = Code::new("E023");
    pub const UNTERMINATED_COMMENT: Code = Code::new("E024");
    pub const UNEXPECTED_END: Code = Code::new("E025");
    pub const INVALID_NUMBER: Code = Code::new("E026");
    pub const TOKEN_TOO_LONG: Code = Code::new("E027");
    pub const SOURCE_TOO_LARGE: Code = Code::new("E028");
}

/// Macro preprocessor errors and warnings
pub mod preprocessor {
    use super::Code;

    pub const RESERVED_MACRO_REDEFINITION: Code = Code::new("E100");
    pub const MISSING_INCLUDE: Code = Code::new("E101");
    pub const RECURSIVE_INCLUDE: Code = Code::new("E102");
    pub const INCLUDE_DEPTH_EXCEEDED: Code = Code::new("E103");
    pub const MALFORMED_EXPRESSION: Code = Code::new("E104");
    pub const DIVISION_BY_ZERO: Code = Code::new("E105");
    pub const FUNCTION_MACRO_IN_CONDITION: Code = Code::new("E106");
    pub const ARITY_MISMATCH: Code = Code::new("E107");
    pub const UNTERMINATED_CONDITIONAL: Code = Code::new("E108");
    pub const UNEXPECTED_DIRECTIVE: Code = Code::new("E109");
    pub const INVALID_MACRO_NAME: Code = Code::new("E110");
    pub const EXPANSION_DEPTH_EXCEEDED: Code = Code::new("E111");
    pub const TOO_MANY_MACROS: Code = Code::new("E112");
    pub const CONDITIONAL_DEPTH_EXCEEDED: Code = Code::new("E113");

    pub const REPEATED_INCLUDE: Code = Code::new("W101");
    pub const MACRO_REDEFINED: Code = Code::new("W102");
}

/// Structural content parser errors
pub mod compilation {
    use super::Code;

    pub const UNKNOWN_PROPERTY: Code = Code::new("E200");
    pub const UNKNOWN_ENUM_MEMBER: Code = Code::new("E201");
    pub const UNKNOWN_ENUM_TYPE: Code = Code::new("E202");
    pub const DUPLICATE_ENTRY_POINT: Code = Code::new("E203");
    pub const UNDECLARED_VARIABLE: Code = Code::new("E204");
    pub const INVALID_VARIABLE_TYPE: Code = Code::new("E205");
    pub const VALUE_TYPE_MISMATCH: Code = Code::new("E206");
    pub const INVALID_PROPERTY_INDEX: Code = Code::new("E207");
    pub const UNEXPECTED_TOKEN: Code = Code::new("E208");
    pub const TOO_MANY_ERRORS: Code = Code::new("E209");
}

/// File loading errors (outer surface only)
pub mod file_processing {
    use super::Code;

    pub const FILE_NOT_FOUND: Code = Code::new("E300");
    pub const FILE_TOO_LARGE: Code = Code::new("E301");
    pub const PERMISSION_DENIED: Code = Code::new("E302");
    pub const INVALID_ENCODING: Code = Code::new("E303");
    pub const IO_ERROR: Code = Code::new("E304");
    pub const INVALID_PATH: Code = Code::new("E305");
    pub const TOO_MANY_INCLUDE_FILES: Code = Code::new("E306");
}

pub mod success {
    use super::Code;

    pub const SYSTEM_INITIALIZATION_COMPLETED: Code = Code::new("I001");
    pub const FILE_PROCESSING_SUCCESS: Code = Code::new("I002");
    pub const INCLUDE_DIRECTORY_LOADED: Code = Code::new("I003");
    pub const PREPROCESSING_COMPLETE: Code = Code::new("I010");
    pub const INCLUDE_RESOLVED: Code = Code::new("I011");
    pub const CONTENT_PARSING_COMPLETE: Code = Code::new("I020");
    pub const PIPELINE_COMPLETE: Code = Code::new("I030");
}

// ============================================================================
// METADATA REGISTRY
// ============================================================================

static ERROR_REGISTRY: OnceLock<HashMap<&'static str, ErrorMetadata>> = OnceLock::new();

fn get_error_registry() -> &'static HashMap<&'static str, ErrorMetadata> {
    ERROR_REGISTRY.get_or_init(|| {
        use Severity::*;

        let entries = [
            // System
            ErrorMetadata::new(
                system::INTERNAL_ERROR,
                "System",
                Critical,
                false,
                true,
                "Critical internal compiler error",
                "File a bug report with the shader that triggered it",
            ),
            ErrorMetadata::new(
                system::INITIALIZATION_FAILURE,
                "System",
                Critical,
                false,
                true,
                "Compiler initialization failure",
                "Check configuration files and environment variables",
            ),
            // Scanner
            ErrorMetadata::new(
                scanner::UNEXPECTED_CHARACTER,
                "Scanner",
                High,
                false,
                true,
                "Character not valid at this point",
                "Remove or escape the character",
            ),
            ErrorMetadata::new(
                scanner::EXPECTED_LEXEME,
                "Scanner",
                High,
                false,
                true,
                "Expected lexeme not found",
                "Insert the expected text",
            ),
            ErrorMetadata::new(
                scanner::UNTERMINATED_STRING,
                "Scanner",
                High,
                false,
                true,
                "String literal is not closed",
                "Add the closing quote",
            ),
            ErrorMetadata::new(
                scanner::UNTERMINATED_PAIR,
                "Scanner",
                High,
                false,
                true,
                "Paired delimiter is not closed",
                "Balance the opening and closing delimiters",
            ),
            ErrorMetadata::new(
                scanner::UNTERMINATED_COMMENT,
                "Scanner",
                High,
                false,
                true,
                "Block comment is not closed",
                "Add the closing */",
            ),
            ErrorMetadata::new(
                scanner::UNEXPECTED_END,
                "Scanner",
                High,
                false,
                true,
                "Input ended unexpectedly",
                "Complete the unfinished construct",
            ),
            ErrorMetadata::new(
                scanner::INVALID_NUMBER,
                "Scanner",
                Medium,
                false,
                true,
                "Malformed numeric literal",
                "Fix the number format",
            ),
            ErrorMetadata::new(
                scanner::TOKEN_TOO_LONG,
                "Scanner",
                Medium,
                false,
                true,
                "Token exceeds the maximum length",
                "Shorten the identifier or literal",
            ),
            ErrorMetadata::new(
                scanner::SOURCE_TOO_LARGE,
                "Scanner",
                High,
                false,
                true,
                "Source text exceeds the maximum size",
                "Split the shader into include chunks",
            ),
            // Preprocessor
            ErrorMetadata::new(
                preprocessor::RESERVED_MACRO_REDEFINITION,
                "Preprocessor",
                High,
                false,
                true,
                "Macro with a reserved prefix redefined",
                "Rename the macro; GL_ names belong to the driver",
            ),
            ErrorMetadata::new(
                preprocessor::MISSING_INCLUDE,
                "Preprocessor",
                High,
                false,
                true,
                "Included chunk is not registered",
                "Register the chunk in the include map or fix its name",
            ),
            ErrorMetadata::new(
                preprocessor::RECURSIVE_INCLUDE,
                "Preprocessor",
                High,
                false,
                true,
                "Chunk includes itself directly or indirectly",
                "Break the include cycle",
            ),
            ErrorMetadata::new(
                preprocessor::INCLUDE_DEPTH_EXCEEDED,
                "Preprocessor",
                High,
                false,
                true,
                "Include nesting is too deep",
                "Flatten the include hierarchy",
            ),
            ErrorMetadata::new(
                preprocessor::MALFORMED_EXPRESSION,
                "Preprocessor",
                High,
                false,
                true,
                "Conditional expression cannot be parsed",
                "Fix the #if/#elif expression",
            ),
            ErrorMetadata::new(
                preprocessor::DIVISION_BY_ZERO,
                "Preprocessor",
                High,
                false,
                true,
                "Division by zero in conditional expression",
                "Guard the divisor",
            ),
            ErrorMetadata::new(
                preprocessor::FUNCTION_MACRO_IN_CONDITION,
                "Preprocessor",
                High,
                false,
                true,
                "Function-like macro used as a value in a condition",
                "Use an object macro or defined(NAME)",
            ),
            ErrorMetadata::new(
                preprocessor::ARITY_MISMATCH,
                "Preprocessor",
                High,
                false,
                true,
                "Macro invoked with the wrong number of arguments",
                "Match the macro's parameter list",
            ),
            ErrorMetadata::new(
                preprocessor::UNTERMINATED_CONDITIONAL,
                "Preprocessor",
                High,
                false,
                true,
                "Conditional block has no matching #endif",
                "Add the missing #endif",
            ),
            ErrorMetadata::new(
                preprocessor::UNEXPECTED_DIRECTIVE,
                "Preprocessor",
                High,
                false,
                true,
                "Directive is not valid at this point",
                "Remove the stray #else/#elif/#endif",
            ),
            ErrorMetadata::new(
                preprocessor::INVALID_MACRO_NAME,
                "Preprocessor",
                High,
                false,
                true,
                "Directive requires a macro name",
                "Provide a valid identifier",
            ),
            ErrorMetadata::new(
                preprocessor::EXPANSION_DEPTH_EXCEEDED,
                "Preprocessor",
                High,
                false,
                true,
                "Macro expansion nests too deeply",
                "Simplify the macro chain",
            ),
            ErrorMetadata::new(
                preprocessor::TOO_MANY_MACROS,
                "Preprocessor",
                High,
                false,
                true,
                "Macro table is full",
                "Reduce the number of defined macros",
            ),
            ErrorMetadata::new(
                preprocessor::CONDITIONAL_DEPTH_EXCEEDED,
                "Preprocessor",
                High,
                false,
                true,
                "Conditional blocks nest too deeply",
                "Flatten the #if hierarchy",
            ),
            ErrorMetadata::new(
                preprocessor::REPEATED_INCLUDE,
                "Preprocessor",
                Low,
                true,
                false,
                "Chunk included more than once",
                "Remove the duplicate #include",
            ),
            ErrorMetadata::new(
                preprocessor::MACRO_REDEFINED,
                "Preprocessor",
                Low,
                true,
                false,
                "Macro redefined with a new body",
                "#undef the macro before redefining it",
            ),
            // Compilation
            ErrorMetadata::new(
                compilation::UNKNOWN_PROPERTY,
                "Compilation",
                Medium,
                true,
                false,
                "Unknown render state property",
                "Check the property name against the render state type",
            ),
            ErrorMetadata::new(
                compilation::UNKNOWN_ENUM_MEMBER,
                "Compilation",
                Medium,
                true,
                false,
                "Unknown engine enum member",
                "Check the member name",
            ),
            ErrorMetadata::new(
                compilation::UNKNOWN_ENUM_TYPE,
                "Compilation",
                Medium,
                true,
                false,
                "Unknown engine enum type",
                "Use one of the engine enum namespaces",
            ),
            ErrorMetadata::new(
                compilation::DUPLICATE_ENTRY_POINT,
                "Compilation",
                High,
                false,
                true,
                "Pass entry point assigned twice",
                "Keep a single VertexShader/FragmentShader assignment",
            ),
            ErrorMetadata::new(
                compilation::UNDECLARED_VARIABLE,
                "Compilation",
                Medium,
                true,
                false,
                "Reference to an undeclared variable",
                "Declare the variable before using it",
            ),
            ErrorMetadata::new(
                compilation::INVALID_VARIABLE_TYPE,
                "Compilation",
                Medium,
                true,
                false,
                "Variable has the wrong type for this use",
                "Reference a variable of the expected type",
            ),
            ErrorMetadata::new(
                compilation::VALUE_TYPE_MISMATCH,
                "Compilation",
                Medium,
                true,
                false,
                "Value kind does not match the property",
                "Use a value of the property's kind",
            ),
            ErrorMetadata::new(
                compilation::INVALID_PROPERTY_INDEX,
                "Compilation",
                Medium,
                true,
                false,
                "Property index is not allowed or out of range",
                "Only BlendState target properties take [0..7]",
            ),
            ErrorMetadata::new(
                compilation::UNEXPECTED_TOKEN,
                "Compilation",
                High,
                false,
                true,
                "Unexpected token in shader structure",
                "Fix the Shader/SubShader/Pass structure",
            ),
            ErrorMetadata::new(
                compilation::TOO_MANY_ERRORS,
                "Compilation",
                High,
                false,
                true,
                "Too many errors collected",
                "Fix the reported errors and recompile",
            ),
            // File processing
            ErrorMetadata::new(
                file_processing::FILE_NOT_FOUND,
                "FileProcessing",
                Medium,
                false,
                true,
                "File not found at specified path",
                "Check file path and ensure file exists",
            ),
            ErrorMetadata::new(
                file_processing::FILE_TOO_LARGE,
                "FileProcessing",
                Medium,
                false,
                true,
                "File exceeds maximum size limit",
                "Reduce file size or rebuild with a larger limit",
            ),
            ErrorMetadata::new(
                file_processing::PERMISSION_DENIED,
                "FileProcessing",
                Medium,
                false,
                true,
                "Permission denied accessing file",
                "Check file permissions",
            ),
            ErrorMetadata::new(
                file_processing::INVALID_ENCODING,
                "FileProcessing",
                Medium,
                false,
                true,
                "File is not valid UTF-8",
                "Re-save the file as UTF-8",
            ),
            ErrorMetadata::new(
                file_processing::IO_ERROR,
                "FileProcessing",
                Medium,
                false,
                true,
                "I/O error while reading",
                "Check the file system",
            ),
            ErrorMetadata::new(
                file_processing::INVALID_PATH,
                "FileProcessing",
                Medium,
                false,
                true,
                "Path is not a regular file or directory",
                "Point at a shader file or include directory",
            ),
            ErrorMetadata::new(
                file_processing::TOO_MANY_INCLUDE_FILES,
                "FileProcessing",
                Medium,
                false,
                true,
                "Include directory holds too many chunks",
                "Narrow the include directory",
            ),
            // Success
            ErrorMetadata::new(
                success::SYSTEM_INITIALIZATION_COMPLETED,
                "System",
                Low,
                true,
                false,
                "Logging system initialized",
                "None",
            ),
            ErrorMetadata::new(
                success::FILE_PROCESSING_SUCCESS,
                "FileProcessing",
                Low,
                true,
                false,
                "Source file loaded",
                "Continue to preprocessing",
            ),
            ErrorMetadata::new(
                success::INCLUDE_DIRECTORY_LOADED,
                "FileProcessing",
                Low,
                true,
                false,
                "Include directory loaded",
                "Continue to preprocessing",
            ),
            ErrorMetadata::new(
                success::PREPROCESSING_COMPLETE,
                "Preprocessor",
                Low,
                true,
                false,
                "Preprocessing completed",
                "Continue to content parsing",
            ),
            ErrorMetadata::new(
                success::INCLUDE_RESOLVED,
                "Preprocessor",
                Low,
                true,
                false,
                "Include chunk expanded",
                "None",
            ),
            ErrorMetadata::new(
                success::CONTENT_PARSING_COMPLETE,
                "Compilation",
                Low,
                true,
                false,
                "Shader structure parsed",
                "Hand passes to code generation",
            ),
            ErrorMetadata::new(
                success::PIPELINE_COMPLETE,
                "Pipeline",
                Low,
                true,
                false,
                "Front-end pipeline completed",
                "None",
            ),
        ];

        entries
            .into_iter()
            .map(|metadata| (metadata.code, metadata))
            .collect()
    })
}

// ============================================================================
// CLASSIFICATION FUNCTIONS
// ============================================================================

pub fn get_error_metadata(code: &str) -> Option<&'static ErrorMetadata> {
    get_error_registry().get(code)
}

pub fn get_severity(code: &str) -> Severity {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.severity)
        .unwrap_or(Severity::Medium)
}

pub fn is_recoverable(code: &str) -> bool {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.recoverable)
        .unwrap_or(true)
}

pub fn requires_halt(code: &str) -> bool {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.requires_halt)
        .unwrap_or(false)
}

pub fn get_description(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.description)
        .unwrap_or("Unknown error")
}

pub fn get_action(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.recommended_action)
        .unwrap_or("No specific action available")
}

pub fn get_category(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.category)
        .unwrap_or("Unknown")
}
