//! Predicate evaluation
//!
//! Predicates evaluate to true, false or unknown (`None`). Unknown comes from
//! missing field values and propagates through compound predicates:
//!
//! | A       | B       | and     | or      | xor     |
//! |---------|---------|---------|---------|---------|
//! | true    | true    | true    | true    | false   |
//! | true    | false   | false   | true    | true    |
//! | true    | unknown | unknown | true    | unknown |
//! | false   | false   | false   | false   | false   |
//! | false   | unknown | false   | unknown | unknown |
//! | unknown | unknown | unknown | unknown | unknown |
//!
//! `and` and `or` stop at the first operand that decides the result, so later
//! operands are never evaluated (and never fail). A `surrogate` predicate
//! returns the first operand that is not unknown.

use crate::context::EvaluationContext;
use crate::engine::{matches_literal, PmmlEngine};
use crate::error::{EvalError, EvalResult};
use pmml_ast::{
    BooleanOperator, CompoundPredicate, Predicate, SetOperator, SimpleOperator, SimplePredicate,
    SimpleSetPredicate,
};
use pmml_diagnostics::PMML0302;
use pmml_types::{Data, OpType, TypeError, Value};

/// Outcome of a predicate together with the way it was reached
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompoundPredicateResult {
    /// True, false or unknown
    pub value: Option<bool>,
    /// Set when a non-first operand of a surrogate predicate decided the value
    pub alternative: bool,
}

impl CompoundPredicateResult {
    pub fn new(value: Option<bool>) -> Self {
        Self {
            value,
            alternative: false,
        }
    }

    pub fn is_true(&self) -> bool {
        self.value == Some(true)
    }

    pub fn is_unknown(&self) -> bool {
        self.value.is_none()
    }
}

impl From<Option<bool>> for CompoundPredicateResult {
    fn from(value: Option<bool>) -> Self {
        Self::new(value)
    }
}

impl PmmlEngine {
    pub(crate) fn eval_predicate(
        &self,
        predicate: &Predicate,
        ctx: &mut EvaluationContext<'_>,
    ) -> EvalResult<CompoundPredicateResult> {
        let result = match predicate {
            Predicate::Simple(simple) => self.eval_simple_predicate(simple, ctx)?.into(),
            Predicate::SimpleSet(set) => self.eval_set_predicate(set, ctx)?.into(),
            Predicate::Compound(compound) => self.eval_compound_predicate(compound, ctx)?,
            Predicate::True => Some(true).into(),
            Predicate::False => Some(false).into(),
        };
        log::trace!("predicate result: {:?}", result);
        Ok(result)
    }

    // =========================================================================
    // Simple Predicates
    // =========================================================================

    fn eval_simple_predicate(
        &self,
        predicate: &SimplePredicate,
        ctx: &mut EvaluationContext<'_>,
    ) -> EvalResult<Option<bool>> {
        let value = self.resolve_field(&predicate.field, ctx)?;

        match predicate.operator {
            SimpleOperator::IsMissing => return Ok(Some(value.is_none())),
            SimpleOperator::IsNotMissing => return Ok(Some(value.is_some())),
            _ => {}
        }

        let Some(text) = predicate.value.as_deref() else {
            return Err(EvalError::invalid_model(format!(
                "{} predicate on '{}' has no value",
                predicate.operator, predicate.field
            )));
        };
        let Some(value) = value else {
            return Ok(None);
        };

        let literal = match value.parse_literal(text) {
            Ok(literal) => literal,
            Err(TypeError::Parse { .. })
                if value.op_type() != OpType::Continuous
                    && ctx.config().lenient_categorical_comparison =>
            {
                ctx.warn(
                    PMML0302,
                    Some(predicate.field.as_str()),
                    format!(
                        "'{}' is not a {} literal, comparing as text",
                        text,
                        value.data_type()
                    ),
                );
                let as_text = |text: String| Value::new(Data::String(text), value.op_type());
                let left = as_text(value.scalar()?.to_string())?;
                let right = as_text(text.to_string())?;
                return compare(predicate.operator, &left, &right).map(Some);
            }
            Err(error) => return Err(error.into()),
        };

        compare(predicate.operator, &value, &literal).map(Some)
    }

    fn eval_set_predicate(
        &self,
        predicate: &SimpleSetPredicate,
        ctx: &mut EvaluationContext<'_>,
    ) -> EvalResult<Option<bool>> {
        let Some(value) = self.resolve_field(&predicate.field, ctx)? else {
            return Ok(None);
        };

        let mut found = false;
        for text in &predicate.values {
            if matches_literal(&value, text)? {
                found = true;
                break;
            }
        }

        Ok(Some(match predicate.operator {
            SetOperator::IsIn => found,
            SetOperator::IsNotIn => !found,
        }))
    }

    // =========================================================================
    // Compound Predicates
    // =========================================================================

    fn eval_compound_predicate(
        &self,
        predicate: &CompoundPredicate,
        ctx: &mut EvaluationContext<'_>,
    ) -> EvalResult<CompoundPredicateResult> {
        if predicate.predicates.len() < 2 {
            return Err(EvalError::invalid_model(format!(
                "{} predicate needs at least 2 operands, got {}",
                predicate.operator,
                predicate.predicates.len()
            )));
        }

        match predicate.operator {
            BooleanOperator::And => self.eval_kleene(&predicate.predicates, false, ctx),
            BooleanOperator::Or => self.eval_kleene(&predicate.predicates, true, ctx),
            BooleanOperator::Xor => {
                let mut parity = false;
                for child in &predicate.predicates {
                    match self.eval_predicate(child, ctx)?.value {
                        Some(b) => parity ^= b,
                        None => return Ok(CompoundPredicateResult::new(None)),
                    }
                }
                Ok(CompoundPredicateResult::new(Some(parity)))
            }
            BooleanOperator::Surrogate => {
                for (position, child) in predicate.predicates.iter().enumerate() {
                    let result = self.eval_predicate(child, ctx)?;
                    if result.value.is_some() {
                        return Ok(CompoundPredicateResult {
                            value: result.value,
                            alternative: position > 0 || result.alternative,
                        });
                    }
                }
                Ok(CompoundPredicateResult::new(None))
            }
        }
    }

    /// Short-circuit `and` (`dominant = false`) or `or` (`dominant = true`)
    fn eval_kleene(
        &self,
        operands: &[Predicate],
        dominant: bool,
        ctx: &mut EvaluationContext<'_>,
    ) -> EvalResult<CompoundPredicateResult> {
        let mut unknown = false;
        for operand in operands {
            match self.eval_predicate(operand, ctx)?.value {
                Some(b) if b == dominant => return Ok(Some(dominant).into()),
                Some(_) => {}
                None => unknown = true,
            }
        }
        Ok(if unknown { None } else { Some(!dominant) }.into())
    }
}

fn compare(operator: SimpleOperator, left: &Value, right: &Value) -> EvalResult<bool> {
    Ok(match operator {
        SimpleOperator::Equal => left.equals_value(right)?,
        SimpleOperator::NotEqual => !left.equals_value(right)?,
        SimpleOperator::LessThan => left.compare_value(right)?.is_lt(),
        SimpleOperator::LessOrEqual => left.compare_value(right)?.is_le(),
        SimpleOperator::GreaterOrEqual => left.compare_value(right)?.is_ge(),
        SimpleOperator::GreaterThan => left.compare_value(right)?.is_gt(),
        SimpleOperator::IsMissing | SimpleOperator::IsNotMissing => {
            return Err(EvalError::unsupported_operator(
                operator.to_string(),
                "not a comparison",
            ));
        }
    })
}
