//! Conditional override evaluation seam.

use std::error::Error as StdError;

/// Request data a condition expression is evaluated against.
pub type EvalContext = serde_json::Map<String, serde_json::Value>;

/// Error type evaluators may return. The engine treats any error as
/// "condition not met".
pub type EvalError = Box<dyn StdError + Send + Sync>;

/// Decides whether a condition expression holds for a request.
pub trait ConditionEvaluator: Send + Sync {
    fn evaluate(&self, expression: &str, context: &EvalContext) -> Result<bool, EvalError>;
}

impl<F> ConditionEvaluator for F
where
    F: Fn(&str, &EvalContext) -> Result<bool, EvalError> + Send + Sync,
{
    fn evaluate(&self, expression: &str, context: &EvalContext) -> Result<bool, EvalError> {
        self(expression, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn closures_are_evaluators() {
        let evaluator = |expression: &str, context: &EvalContext| -> Result<bool, EvalError> {
            match expression.split_once("==") {
                Some((key, value)) => Ok(context.get(key.trim()).and_then(|v| v.as_str()) == Some(value.trim())),
                None => Err(format!("unsupported expression '{expression}'").into()),
            }
        };

        let mut context = EvalContext::new();
        context.insert("season".into(), json!("winter"));

        assert!(evaluator.evaluate("season == winter", &context).unwrap());
        assert!(!evaluator.evaluate("season == summer", &context).unwrap());
        assert!(evaluator.evaluate("garbage", &context).is_err());
    }
}
