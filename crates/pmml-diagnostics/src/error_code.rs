//! PMML error codes following a structured numbering system
//!
//! Error code ranges:
//! - PMML0001-PMML0099: Type errors (parsing, casting, type unification)
//! - PMML0100-PMML0199: Model errors (malformed metadata, invalid declarations)
//! - PMML0200-PMML0299: Evaluation errors (runtime)
//! - PMML0300-PMML0399: Data quality (missing/invalid/outlier treatment)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Error code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    /// Create a new error code
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Get the numeric code
    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Get error information for this code
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_INFO.get(&self.0).unwrap_or(&UNKNOWN_ERROR)
    }

    /// Check if this is a type error (0001-0099)
    pub const fn is_type_error(&self) -> bool {
        self.0 >= 1 && self.0 < 100
    }

    /// Check if this is a model error (0100-0199)
    pub const fn is_model_error(&self) -> bool {
        self.0 >= 100 && self.0 < 200
    }

    /// Check if this is an evaluation error (0200-0299)
    pub const fn is_evaluation_error(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Check if this is a data quality code (0300-0399)
    pub const fn is_data_quality(&self) -> bool {
        self.0 >= 300 && self.0 < 400
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PMML{:04}", self.0)
    }
}

/// Information about an error code
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Short description of the error
    pub description: &'static str,
    /// Detailed help text
    pub help: Option<&'static str>,
}

impl ErrorInfo {
    const fn new(description: &'static str) -> Self {
        Self {
            description,
            help: None,
        }
    }

    const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

static UNKNOWN_ERROR: ErrorInfo = ErrorInfo::new("Unknown error");

static ERROR_INFO: LazyLock<HashMap<u16, ErrorInfo>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Type errors (0001-0099)
    map.insert(1, ErrorInfo::new("Malformed value text"));
    map.insert(2, ErrorInfo::new("Type mismatch"));
    map.insert(3, ErrorInfo::new("Incompatible data types"));
    map.insert(4, ErrorInfo::new("Invalid operational type"));
    map.insert(5, ErrorInfo::new("Numeric domain error"));

    // Model errors (0100-0199)
    map.insert(100, ErrorInfo::new("Invalid model element"));
    map.insert(101, ErrorInfo::new("Unsupported function"));
    map.insert(102, ErrorInfo::new("Unsupported operator"));
    map.insert(103, ErrorInfo::new("Invalid field specification")
        .with_help("Check replacement values, outlier bounds and treatment policies"));
    map.insert(104, ErrorInfo::new("Invalid evaluation configuration"));

    // Evaluation errors (0200-0299)
    map.insert(200, ErrorInfo::new("Missing field")
        .with_help("The field is neither supplied, derived nor declared in this scope"));
    map.insert(201, ErrorInfo::new("Duplicate declaration"));
    map.insert(202, ErrorInfo::new("Cyclic field reference"));
    map.insert(203, ErrorInfo::new("Recursion limit exceeded"));
    map.insert(204, ErrorInfo::new("Invalid function result"));
    map.insert(205, ErrorInfo::new("Context is no longer usable"));

    // Data quality (0300-0399)
    map.insert(300, ErrorInfo::new("Invalid input value"));
    map.insert(301, ErrorInfo::new("Missing input value"));
    map.insert(302, ErrorInfo::new("Lenient comparison fallback"));
    map.insert(303, ErrorInfo::new("Default value substituted"));

    map
});

// Type errors
pub const PMML0001: ErrorCode = ErrorCode::new(1);
pub const PMML0002: ErrorCode = ErrorCode::new(2);
pub const PMML0003: ErrorCode = ErrorCode::new(3);
pub const PMML0004: ErrorCode = ErrorCode::new(4);
pub const PMML0005: ErrorCode = ErrorCode::new(5);

// Model errors
pub const PMML0100: ErrorCode = ErrorCode::new(100);
pub const PMML0101: ErrorCode = ErrorCode::new(101);
pub const PMML0102: ErrorCode = ErrorCode::new(102);
pub const PMML0103: ErrorCode = ErrorCode::new(103);
pub const PMML0104: ErrorCode = ErrorCode::new(104);

// Evaluation errors
pub const PMML0200: ErrorCode = ErrorCode::new(200);
pub const PMML0201: ErrorCode = ErrorCode::new(201);
pub const PMML0202: ErrorCode = ErrorCode::new(202);
pub const PMML0203: ErrorCode = ErrorCode::new(203);
pub const PMML0204: ErrorCode = ErrorCode::new(204);
pub const PMML0205: ErrorCode = ErrorCode::new(205);

// Data quality
pub const PMML0300: ErrorCode = ErrorCode::new(300);
pub const PMML0301: ErrorCode = ErrorCode::new(301);
pub const PMML0302: ErrorCode = ErrorCode::new(302);
pub const PMML0303: ErrorCode = ErrorCode::new(303);
