//! Disjunctive-normal-form stand conditions and their float encoding.
//!
//! A condition is an OR of groups, each group an AND of constraints. The
//! float form lists every constraint as `[n, var, terms...]`, where `n`
//! counts the var id and the terms, and separates groups with a single `0`.
//! The empty condition is `[0]`.
//!
//! A range term `(low, high)` is written as `low, -high`. Decoding tells
//! ranges from literals by the sign of the second value, so a literal
//! followed by a negative value reads back as a range. See
//! [`Constraint::is_ambiguous`].

use serde::de::Error as _;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as Json;
use tracing::warn;

use crate::error::ParError;
use crate::record::float_to_int;
use crate::var::Var;

/// One accepted value or closed range of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstraintValue {
    Literal(f64),
    Range(f64, f64),
}

/// A variable restricted to a set of values (OR'd together).
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub var: Var,
    pub values: Vec<ConstraintValue>,
}

impl Constraint {
    pub fn new(var: Var, values: Vec<ConstraintValue>) -> Self {
        Self { var, values }
    }

    fn terms(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.values.len() * 2);
        for v in &self.values {
            match *v {
                ConstraintValue::Literal(x) => out.push(x),
                ConstraintValue::Range(low, high) => {
                    out.push(low);
                    out.push(-high);
                }
            }
        }
        out
    }

    /// Whether the float form decodes to different values.
    pub fn is_ambiguous(&self) -> bool {
        split_terms(&self.terms()) != self.values
    }

    /// Float form `[n, var, terms...]`.
    pub fn to_floats(&self) -> Vec<f64> {
        if self.is_ambiguous() {
            warn!(
                var = %self.var,
                "constraint values do not survive the sign-based range encoding"
            );
        }
        let terms = self.terms();
        let mut out = Vec::with_capacity(terms.len() + 2);
        out.push((terms.len() + 1) as f64);
        out.push(self.var.id as f64);
        out.extend(terms);
        out
    }
}

fn split_terms(mut terms: &[f64]) -> Vec<ConstraintValue> {
    let mut values = Vec::new();
    loop {
        match terms {
            [low, high, rest @ ..] if *high < 0.0 => {
                values.push(ConstraintValue::Range(*low, -*high));
                terms = rest;
            }
            [x, rest @ ..] => {
                values.push(ConstraintValue::Literal(*x));
                terms = rest;
            }
            [] => return values,
        }
    }
}

impl Serialize for Constraint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.values.len() + 1))?;
        seq.serialize_element(&self.var.name)?;
        for v in &self.values {
            seq.serialize_element(v)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Constraint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<Json>::deserialize(deserializer)?;
        let (head, rest) = items
            .split_first()
            .ok_or_else(|| D::Error::custom("constraint needs a variable"))?;

        let var = match head {
            Json::String(name) => Var::by_name(name).map_err(D::Error::custom)?,
            Json::Number(n) => n
                .as_f64()
                .and_then(float_to_int)
                .map(Var::by_id)
                .ok_or_else(|| D::Error::custom(format!("bad variable id {n}")))?,
            other => return Err(D::Error::custom(format!("bad variable {other}"))),
        };

        let values = rest
            .iter()
            .map(|v| ConstraintValue::deserialize(v).map_err(D::Error::custom))
            .collect::<Result<_, _>>()?;
        Ok(Self { var, values })
    }
}

/// OR of AND-groups of constraints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DnfCondition {
    pub groups: Vec<Vec<Constraint>>,
}

impl DnfCondition {
    pub fn new(groups: Vec<Vec<Constraint>>) -> Self {
        Self { groups }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn to_floats(&self) -> Vec<f64> {
        if self.groups.is_empty() {
            return vec![0.0];
        }
        let mut out = Vec::new();
        for (i, group) in self.groups.iter().enumerate() {
            if i > 0 {
                out.push(0.0);
            }
            for c in group {
                out.extend(c.to_floats());
            }
        }
        out
    }

    /// Decode the float form. Empty groups are dropped.
    pub fn from_floats(values: &[f64]) -> Result<Self, ParError> {
        let int = |f: f64, what: &str| {
            float_to_int(f)
                .ok_or_else(|| ParError::Condition(format!("non-integer {what}: {f}")))
        };

        let mut groups = Vec::new();
        let mut group = Vec::new();
        let mut pos = 0;

        while pos < values.len() {
            let n = int(values[pos], "value count")?;
            pos += 1;

            if n == 0 {
                if !group.is_empty() {
                    groups.push(std::mem::take(&mut group));
                }
                continue;
            }

            let end = usize::try_from(n)
                .ok()
                .and_then(|n| pos.checked_add(n))
                .filter(|&end| end <= values.len())
                .ok_or_else(|| {
                    ParError::Condition(format!(
                        "constraint of {n} values overruns the {} available",
                        values.len() - pos
                    ))
                })?;

            let var = Var::by_id(int(values[pos], "variable id")?);
            let terms = &values[pos + 1..end];
            group.push(Constraint::new(var, split_terms(terms)));
            pos = end;
        }

        if !group.is_empty() {
            groups.push(group);
        }
        Ok(Self { groups })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    use super::ConstraintValue::{Literal, Range};

    fn constraint(id: i64, values: Vec<ConstraintValue>) -> Constraint {
        Constraint::new(Var::by_id(id), values)
    }

    #[test]
    fn test_literal_and_range() {
        let c = constraint(42, vec![Literal(3.0), Range(5.0, 10.0)]);
        assert_eq!(c.to_floats(), vec![4.0, 42.0, 3.0, 5.0, -10.0]);

        let cond = DnfCondition::from_floats(&[4.0, 42.0, 3.0, 5.0, -10.0]).unwrap();
        assert_eq!(cond, DnfCondition::new(vec![vec![c]]));
    }

    #[test]
    fn test_two_groups() {
        let cond = DnfCondition::new(vec![
            vec![constraint(1, vec![Literal(7.0)])],
            vec![constraint(2, vec![Literal(8.0)])],
        ]);
        let floats = cond.to_floats();
        assert_eq!(floats, vec![2.0, 1.0, 7.0, 0.0, 2.0, 2.0, 8.0]);
        assert_eq!(DnfCondition::from_floats(&floats).unwrap(), cond);
    }

    #[test]
    fn test_conjunction_within_group() {
        let cond = DnfCondition::new(vec![vec![
            constraint(1, vec![Literal(7.0)]),
            constraint(3, vec![Range(0.0, 2.5)]),
        ]]);
        let floats = cond.to_floats();
        assert_eq!(floats, vec![2.0, 1.0, 7.0, 3.0, 3.0, 0.0, -2.5]);
        assert_eq!(DnfCondition::from_floats(&floats).unwrap(), cond);
    }

    #[test]
    fn test_empty_condition() {
        let empty = DnfCondition::default();
        assert_eq!(empty.to_floats(), vec![0.0]);
        assert_eq!(DnfCondition::from_floats(&[0.0]).unwrap(), empty);
        assert_eq!(DnfCondition::from_floats(&[]).unwrap(), empty);
    }

    #[test]
    fn test_negative_literal_reads_back_as_range() {
        // the encoding cannot tell a literal followed by a negative literal
        // from a range
        let c = constraint(9, vec![Literal(3.0), Literal(-5.0)]);
        assert!(c.is_ambiguous());
        let cond = DnfCondition::new(vec![vec![c]]);
        let decoded = DnfCondition::from_floats(&cond.to_floats()).unwrap();
        assert_eq!(decoded.groups[0][0].values, vec![Range(3.0, 5.0)]);

        // a literal is only misread when a negative value follows it
        assert!(constraint(9, vec![Literal(3.0), Range(-1.0, 4.0)]).is_ambiguous());
        assert!(!constraint(9, vec![Range(-1.0, 4.0), Literal(3.0)]).is_ambiguous());
        assert!(!constraint(9, vec![Literal(-3.0)]).is_ambiguous());
        // a negative high bound loses its range marker
        assert!(constraint(9, vec![Range(1.0, -2.0)]).is_ambiguous());
    }

    #[test]
    fn test_malformed_floats() {
        assert!(DnfCondition::from_floats(&[3.0, 1.0]).is_err());
        assert!(DnfCondition::from_floats(&[2.5, 1.0, 1.0]).is_err());
        assert!(DnfCondition::from_floats(&[2.0, 1.5, 1.0]).is_err());
        assert!(DnfCondition::from_floats(&[-2.0, 1.0, 1.0]).is_err());
    }

    #[test]
    fn test_json_shape() {
        let cond = DnfCondition::new(vec![vec![constraint(
            42,
            vec![Literal(3.0), Range(5.0, 10.0)],
        )]]);
        let value = serde_json::to_value(&cond).unwrap();
        assert_eq!(value, json!([[["var42", 3.0, [5.0, 10.0]]]]));
        assert_eq!(serde_json::from_value::<DnfCondition>(value).unwrap(), cond);

        let by_id: DnfCondition = serde_json::from_value(json!([[[42, 1]]])).unwrap();
        assert_eq!(by_id.groups[0][0].var, Var::by_id(42));
        assert!(serde_json::from_value::<DnfCondition>(json!([[["height", 1]]])).is_err());
    }

    fn value_strategy() -> impl Strategy<Value = ConstraintValue> {
        prop_oneof![
            (0i32..1000).prop_map(|x| Literal(f64::from(x) / 4.0)),
            (0i32..1000, 1i32..1000)
                .prop_map(|(lo, hi)| Range(f64::from(lo) / 4.0, f64::from(hi) / 4.0)),
        ]
    }

    fn condition_strategy() -> impl Strategy<Value = DnfCondition> {
        let constraint = (1i64..500, prop::collection::vec(value_strategy(), 0..5))
            .prop_map(|(id, values)| constraint(id, values));
        prop::collection::vec(prop::collection::vec(constraint, 1..4), 0..4)
            .prop_map(DnfCondition::new)
    }

    proptest! {
        #[test]
        fn prop_roundtrip(cond in condition_strategy()) {
            let floats = cond.to_floats();
            prop_assert_eq!(DnfCondition::from_floats(&floats).unwrap(), cond);
        }
    }
}
