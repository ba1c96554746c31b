//! Evaluation settings

use crate::error::{EvalError, EvalResult};
use serde::{Deserialize, Serialize};

/// Settings shared by every context built for a model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Maximum nesting of derived field resolutions
    pub max_derived_field_depth: usize,
    /// Maximum nesting of user-defined function calls
    pub max_function_depth: usize,
    /// Compare a categorical or ordinal value as a plain string when a
    /// predicate literal does not parse as the value's data type
    pub lenient_categorical_comparison: bool,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            max_derived_field_depth: 64,
            max_function_depth: 64,
            lenient_categorical_comparison: true,
        }
    }
}

impl EvaluationConfig {
    /// Read settings from JSON; absent keys take their default
    pub fn from_json(text: &str) -> EvalResult<Self> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| EvalError::configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject budgets that would make every nested evaluation fail
    pub fn validate(&self) -> EvalResult<()> {
        if self.max_derived_field_depth == 0 {
            return Err(EvalError::configuration(
                "max_derived_field_depth must be at least 1",
            ));
        }
        if self.max_function_depth == 0 {
            return Err(EvalError::configuration("max_function_depth must be at least 1"));
        }
        Ok(())
    }
}
