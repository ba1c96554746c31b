//! Field declarations of a model

use crate::{Expression, FieldSpec};
use pmml_types::{DataType, OpType};
use serde::{Deserialize, Serialize};

/// Field computed from an expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedField {
    pub name: String,
    pub data_type: DataType,
    pub op_type: Option<OpType>,
    pub expression: Expression,
}

impl DerivedField {
    pub fn new(name: impl Into<String>, data_type: DataType, expression: Expression) -> Self {
        Self {
            name: name.into(),
            data_type,
            op_type: None,
            expression,
        }
    }

    pub fn with_op_type(mut self, op_type: OpType) -> Self {
        self.op_type = Some(op_type);
        self
    }

    pub fn op_type(&self) -> OpType {
        self.op_type
            .unwrap_or_else(|| self.data_type.default_op_type())
    }
}

/// Formal parameter of a user-defined function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterField {
    pub name: String,
    /// Arguments are converted to this type when present
    pub data_type: Option<DataType>,
    pub op_type: Option<OpType>,
}

impl ParameterField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: None,
            op_type: None,
        }
    }

    pub fn typed(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type: Some(data_type),
            op_type: None,
        }
    }
}

/// User-defined function callable from `Apply`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefineFunction {
    pub name: String,
    pub parameters: Vec<ParameterField>,
    pub data_type: DataType,
    pub op_type: Option<OpType>,
    pub expression: Expression,
}

impl DefineFunction {
    pub fn new(
        name: impl Into<String>,
        parameters: Vec<ParameterField>,
        data_type: DataType,
        expression: Expression,
    ) -> Self {
        Self {
            name: name.into(),
            parameters,
            data_type,
            op_type: None,
            expression,
        }
    }

    pub fn op_type(&self) -> OpType {
        self.op_type
            .unwrap_or_else(|| self.data_type.default_op_type())
    }
}

/// All field and function declarations of a model
///
/// Declarations are kept in document order; the evaluator's model index
/// rejects duplicate names when it compiles a dictionary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dictionary {
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    #[serde(default)]
    pub derived_fields: Vec<DerivedField>,
    #[serde(default)]
    pub functions: Vec<DefineFunction>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_derived_field(mut self, field: DerivedField) -> Self {
        self.derived_fields.push(field);
        self
    }

    pub fn with_function(mut self, function: DefineFunction) -> Self {
        self.functions.push(function);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn derived_field(&self, name: &str) -> Option<&DerivedField> {
        self.derived_fields.iter().find(|field| field.name == name)
    }

    pub fn function(&self, name: &str) -> Option<&DefineFunction> {
        self.functions.iter().find(|function| function.name == name)
    }
}
