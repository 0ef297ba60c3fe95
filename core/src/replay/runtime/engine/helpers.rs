//! Helper functions for the engine

use std::collections::BTreeMap;

use crate::debug::{DebugValue, RuntimeError};
use crate::replay::assertion::AssertCondition;
use crate::replay::types::AssertionResult;
use crate::simulation::SimulationError;

/// Evaluate a scheduled assertion and shape it for the report
pub(super) fn assertion_result(
    frame: u64,
    condition: &AssertCondition,
    values: &BTreeMap<String, DebugValue>,
) -> AssertionResult {
    let evaluation = condition.evaluate(values);
    AssertionResult {
        frame,
        condition: condition.condition.clone(),
        comparator: condition.operator.to_string(),
        passed: evaluation.passed,
        actual: evaluation.actual,
        expected: (!evaluation.passed).then(|| condition.expected()),
        note: evaluation.note,
    }
}

/// Report kind and message for a simulation hook failure
pub(super) fn simulation_error_entry(tick: u64, error: &SimulationError) -> (&'static str, String) {
    match error {
        SimulationError::Desync { tick, detail } => {
            let error = RuntimeError::Desync {
                tick: *tick,
                detail: detail.clone(),
            };
            (error.kind(), error.to_string())
        }
        SimulationError::Fault(reason) => ("simulation_fault", format!("tick {}: {}", tick, reason)),
        SimulationError::Registration(e) => ("registration", e.to_string()),
    }
}
