//! Assertion expressions
//!
//! Grammar: `$<variable> <op> <literal>` with `op` one of
//! `==, !=, <, >, <=, >=` and `literal` a number, `true` or `false`.
//! Evaluation never panics or raises: every problem becomes a failed
//! result with an explanatory note.

use std::collections::BTreeMap;

use bitcode::{Decode, Encode};

use crate::debug::DebugValue;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum CompareOp {
    /// ==
    Eq,
    /// !=
    Ne,
    /// <
    Lt,
    /// >
    Gt,
    /// <=
    Le,
    /// >=
    Ge,
}

impl CompareOp {
    /// Whether this operator needs an ordering, not just equality
    pub fn is_ordering(&self) -> bool {
        !matches!(self, CompareOp::Eq | CompareOp::Ne)
    }
}

impl std::fmt::Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "=="),
            CompareOp::Ne => write!(f, "!="),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Le => write!(f, "<="),
            CompareOp::Ge => write!(f, ">="),
        }
    }
}

/// Right-hand side of an assertion
#[derive(Debug, Clone, Copy, PartialEq, Encode, Decode)]
pub enum AssertLiteral {
    Number(f64),
    Bool(bool),
}

impl std::fmt::Display for AssertLiteral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssertLiteral::Number(n) => write!(f, "{}", n),
            AssertLiteral::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Parsed assertion condition
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct AssertCondition {
    /// Condition text as written in the script
    pub condition: String,
    /// Variable name without the `$` sigil
    pub variable: String,
    /// Comparison operator
    pub operator: CompareOp,
    /// Value to compare against
    pub literal: AssertLiteral,
}

/// Outcome of evaluating one condition
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub passed: bool,
    /// Observed value, `None` when the variable was not captured
    pub actual: Option<DebugValue>,
    /// Why the assertion could not be evaluated normally
    pub note: Option<String>,
}

impl Evaluation {
    fn failed_with(actual: Option<DebugValue>, note: String) -> Self {
        Self {
            passed: false,
            actual,
            note: Some(note),
        }
    }
}

impl AssertCondition {
    /// Parse an assertion string like "$velocity_y < 0"
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();

        // Check longer operators first
        let (lhs, operator, rhs) = if let Some(pos) = s.find("==") {
            (&s[..pos], CompareOp::Eq, &s[pos + 2..])
        } else if let Some(pos) = s.find("!=") {
            (&s[..pos], CompareOp::Ne, &s[pos + 2..])
        } else if let Some(pos) = s.find("<=") {
            (&s[..pos], CompareOp::Le, &s[pos + 2..])
        } else if let Some(pos) = s.find(">=") {
            (&s[..pos], CompareOp::Ge, &s[pos + 2..])
        } else if let Some(pos) = s.find('<') {
            (&s[..pos], CompareOp::Lt, &s[pos + 1..])
        } else if let Some(pos) = s.find('>') {
            (&s[..pos], CompareOp::Gt, &s[pos + 1..])
        } else {
            return Err(format!("no comparison operator in '{}'", s));
        };

        let lhs = lhs.trim();
        let variable = lhs
            .strip_prefix('$')
            .ok_or_else(|| format!("left side must be a $variable, got '{}'", lhs))?;
        if variable.is_empty()
            || !variable
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(format!("invalid variable name '{}'", lhs));
        }

        let rhs = rhs.trim();
        let literal = match rhs {
            "true" => AssertLiteral::Bool(true),
            "false" => AssertLiteral::Bool(false),
            _ => {
                let n: f64 = rhs
                    .parse()
                    .map_err(|_| format!("invalid literal '{}'", rhs))?;
                if !n.is_finite() {
                    return Err(format!("literal must be finite, got '{}'", rhs));
                }
                AssertLiteral::Number(n)
            }
        };

        Ok(Self {
            condition: s.to_string(),
            variable: variable.to_string(),
            operator,
            literal,
        })
    }

    /// Evaluate against captured post-tick values
    pub fn evaluate(&self, values: &BTreeMap<String, DebugValue>) -> Evaluation {
        let Some(actual) = values.get(&self.variable).copied() else {
            return Evaluation::failed_with(None, format!("unknown variable: ${}", self.variable));
        };

        let passed = match (actual, self.literal) {
            (DebugValue::Bool(a), AssertLiteral::Bool(e)) => {
                if self.operator.is_ordering() {
                    return Evaluation::failed_with(
                        Some(actual),
                        format!("operator {} is not defined for bool", self.operator),
                    );
                }
                match self.operator {
                    CompareOp::Eq => a == e,
                    _ => a != e,
                }
            }
            (DebugValue::Bool(_), AssertLiteral::Number(_)) => {
                return Evaluation::failed_with(
                    Some(actual),
                    "type mismatch: bool variable compared with a number".to_string(),
                );
            }
            (_, AssertLiteral::Bool(_)) => {
                return Evaluation::failed_with(
                    Some(actual),
                    "type mismatch: numeric variable compared with a bool".to_string(),
                );
            }
            (numeric, AssertLiteral::Number(e)) => {
                let Some(a) = numeric.as_f64() else {
                    return Evaluation::failed_with(
                        Some(actual),
                        "value is not numeric".to_string(),
                    );
                };
                compare_f64(a, self.operator, e)
            }
        };

        Evaluation {
            passed,
            actual: Some(actual),
            note: None,
        }
    }

    /// Expected side, for failure messages: "< 0"
    pub fn expected(&self) -> String {
        format!("{} {}", self.operator, self.literal)
    }
}

fn compare_f64(a: f64, op: CompareOp, e: f64) -> bool {
    match op {
        CompareOp::Eq => (a - e).abs() < f64::EPSILON,
        CompareOp::Ne => !compare_f64(a, CompareOp::Eq, e),
        CompareOp::Lt => a < e,
        CompareOp::Gt => a > e,
        CompareOp::Le => a <= e,
        CompareOp::Ge => a >= e,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(entries: &[(&str, DebugValue)]) -> BTreeMap<String, DebugValue> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect()
    }

    #[test]
    fn test_parse_assertion_all_operators() {
        let cond = AssertCondition::parse("$x == 100").unwrap();
        assert_eq!(cond.variable, "x");
        assert_eq!(cond.operator, CompareOp::Eq);
        assert_eq!(cond.literal, AssertLiteral::Number(100.0));

        assert_eq!(AssertCondition::parse("$x != 0").unwrap().operator, CompareOp::Ne);
        assert_eq!(
            AssertCondition::parse("$velocity_y < 0").unwrap().operator,
            CompareOp::Lt
        );
        assert_eq!(
            AssertCondition::parse("$player_x > 50").unwrap().operator,
            CompareOp::Gt
        );
        assert_eq!(
            AssertCondition::parse("$health <= 100").unwrap().operator,
            CompareOp::Le
        );
        assert_eq!(
            AssertCondition::parse("$score >= 1000").unwrap().operator,
            CompareOp::Ge
        );
    }

    #[test]
    fn test_parse_literals() {
        let cond = AssertCondition::parse("$on_ground == true").unwrap();
        assert_eq!(cond.literal, AssertLiteral::Bool(true));

        let cond = AssertCondition::parse("$velocity_y < -10").unwrap();
        assert_eq!(cond.literal, AssertLiteral::Number(-10.0));

        let cond = AssertCondition::parse("  $position_x == 123.5  ").unwrap();
        assert_eq!(cond.literal, AssertLiteral::Number(123.5));
        assert_eq!(cond.condition, "$position_x == 123.5");
    }

    #[test]
    fn test_parse_assertion_errors() {
        assert!(AssertCondition::parse("$x 100").is_err());
        assert!(AssertCondition::parse("$x == abc").is_err());
        assert!(AssertCondition::parse("x == 1").is_err());
        assert!(AssertCondition::parse("$ == 1").is_err());
        assert!(AssertCondition::parse("$x == inf").is_err());
        assert!(AssertCondition::parse("").is_err());
    }

    #[test]
    fn test_numeric_evaluation_coerces_ints() {
        let cond = AssertCondition::parse("$level == 3").unwrap();
        let result = cond.evaluate(&values(&[("level", DebugValue::Int(3))]));
        assert!(result.passed);
        assert_eq!(result.actual, Some(DebugValue::Int(3)));

        let cond = AssertCondition::parse("$velocity_y < 0").unwrap();
        let result = cond.evaluate(&values(&[("velocity_y", DebugValue::Float(-8.0))]));
        assert!(result.passed);
        assert!(result.note.is_none());
    }

    #[test]
    fn test_nan_is_never_equal() {
        let vals = values(&[("x", DebugValue::Float(f64::NAN))]);
        assert!(AssertCondition::parse("$x != 5").unwrap().evaluate(&vals).passed);
        assert!(!AssertCondition::parse("$x == 5").unwrap().evaluate(&vals).passed);
        assert!(!AssertCondition::parse("$x < 5").unwrap().evaluate(&vals).passed);
    }

    #[test]
    fn test_unknown_variable_fails_with_note() {
        let cond = AssertCondition::parse("$nonexistent > 0").unwrap();
        let result = cond.evaluate(&values(&[("x", DebugValue::Int(1))]));
        assert!(!result.passed);
        assert!(result.actual.is_none());
        assert!(result.note.unwrap().contains("unknown variable"));
    }

    #[test]
    fn test_bool_equality() {
        let vals = values(&[("on_ground", DebugValue::Bool(false))]);
        assert!(AssertCondition::parse("$on_ground == false").unwrap().evaluate(&vals).passed);
        assert!(AssertCondition::parse("$on_ground != true").unwrap().evaluate(&vals).passed);
        assert!(!AssertCondition::parse("$on_ground == true").unwrap().evaluate(&vals).passed);
    }

    #[test]
    fn test_bool_ordering_is_reported() {
        let vals = values(&[("on_ground", DebugValue::Bool(true))]);
        let result = AssertCondition::parse("$on_ground > false")
            .unwrap()
            .evaluate(&vals);
        assert!(!result.passed);
        assert_eq!(result.actual, Some(DebugValue::Bool(true)));
        assert!(result.note.unwrap().contains("not defined for bool"));
    }

    #[test]
    fn test_type_mismatch_is_reported() {
        let vals = values(&[
            ("on_ground", DebugValue::Bool(true)),
            ("level", DebugValue::Int(1)),
        ]);
        let result = AssertCondition::parse("$on_ground == 1").unwrap().evaluate(&vals);
        assert!(!result.passed);
        assert!(result.note.unwrap().contains("type mismatch"));

        let result = AssertCondition::parse("$level == true").unwrap().evaluate(&vals);
        assert!(!result.passed);
        assert!(result.note.unwrap().contains("type mismatch"));
    }
}
