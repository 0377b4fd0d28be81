//! Condition evaluation for the automation path.
//!
//! Pure functions over a condition list and a column-value map. An empty
//! list is vacuously true; non-empty lists are ANDed.

use crate::domain::{Condition, ConditionOperator};

pub fn evaluate_conditions(conditions: &[Condition], column_values: &serde_json::Value) -> bool {
    conditions
        .iter()
        .all(|condition| evaluate_condition(condition, column_values))
}

fn evaluate_condition(condition: &Condition, column_values: &serde_json::Value) -> bool {
    let actual = column_values
        .get(&condition.column_id)
        .cloned()
        .unwrap_or(serde_json::Value::Null);

    match condition.operator {
        ConditionOperator::Equals => actual == condition.value,
        ConditionOperator::NotEquals => actual != condition.value,
        ConditionOperator::Contains => stringify(&actual).contains(&stringify(&condition.value)),
        ConditionOperator::GreaterThan => match (to_number(&actual), to_number(&condition.value)) {
            (Some(a), Some(b)) => a > b,
            _ => false,
        },
        ConditionOperator::LessThan => match (to_number(&actual), to_number(&condition.value)) {
            (Some(a), Some(b)) => a < b,
            _ => false,
        },
        ConditionOperator::IsEmpty => is_empty(&actual),
        ConditionOperator::IsNotEmpty => !is_empty(&actual),
        ConditionOperator::Unknown => {
            // Lenient by inherited behavior: unrecognized operators pass.
            tracing::warn!(
                column_id = condition.column_id.as_str(),
                "unknown condition operator treated as pass"
            );
            true
        }
    }
}

fn stringify(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn to_number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn is_empty(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn condition(column_id: &str, operator: ConditionOperator, value: serde_json::Value) -> Condition {
        Condition {
            column_id: column_id.to_string(),
            operator,
            value,
        }
    }

    #[test]
    fn empty_condition_list_is_vacuously_true() {
        assert!(evaluate_conditions(&[], &json!({})));
        assert!(evaluate_conditions(&[], &json!({"anything": 1})));
    }

    #[test]
    fn equals_matches_and_mismatches() {
        let conditions = vec![condition("c", ConditionOperator::Equals, json!("v"))];
        assert!(evaluate_conditions(&conditions, &json!({"c": "v"})));
        assert!(!evaluate_conditions(&conditions, &json!({"c": "other"})));
        assert!(!evaluate_conditions(&conditions, &json!({})));
    }

    #[test]
    fn conditions_are_anded() {
        let conditions = vec![
            condition("a", ConditionOperator::Equals, json!(1)),
            condition("b", ConditionOperator::Equals, json!(2)),
        ];
        assert!(evaluate_conditions(&conditions, &json!({"a": 1, "b": 2})));
        assert!(!evaluate_conditions(&conditions, &json!({"a": 1, "b": 3})));
    }

    #[test]
    fn contains_stringifies_both_sides() {
        let conditions = vec![condition("c", ConditionOperator::Contains, json!("urgent"))];
        assert!(evaluate_conditions(
            &conditions,
            &json!({"c": "this is urgent!"})
        ));
        let numeric = vec![condition("c", ConditionOperator::Contains, json!(42))];
        assert!(evaluate_conditions(&numeric, &json!({"c": "id-4242"})));
    }

    #[test]
    fn numeric_comparisons_coerce_strings() {
        let gt = vec![condition("c", ConditionOperator::GreaterThan, json!(5))];
        assert!(evaluate_conditions(&gt, &json!({"c": "7"})));
        assert!(!evaluate_conditions(&gt, &json!({"c": 3})));
        // Non-numeric operands never compare true.
        assert!(!evaluate_conditions(&gt, &json!({"c": "soon"})));

        let lt = vec![condition("c", ConditionOperator::LessThan, json!("10"))];
        assert!(evaluate_conditions(&lt, &json!({"c": 9.5})));
    }

    #[test]
    fn emptiness_is_null_or_empty_string() {
        let empty = vec![condition("c", ConditionOperator::IsEmpty, json!(null))];
        assert!(evaluate_conditions(&empty, &json!({})));
        assert!(evaluate_conditions(&empty, &json!({"c": null})));
        assert!(evaluate_conditions(&empty, &json!({"c": ""})));
        assert!(!evaluate_conditions(&empty, &json!({"c": "x"})));
        assert!(!evaluate_conditions(&empty, &json!({"c": 0})));

        let not_empty = vec![condition("c", ConditionOperator::IsNotEmpty, json!(null))];
        assert!(evaluate_conditions(&not_empty, &json!({"c": "x"})));
        assert!(!evaluate_conditions(&not_empty, &json!({"c": ""})));
    }

    #[test]
    fn unknown_operator_passes() {
        let conditions = vec![condition("c", ConditionOperator::Unknown, json!("whatever"))];
        assert!(evaluate_conditions(&conditions, &json!({"c": "anything"})));
    }
}
