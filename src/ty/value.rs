use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A fully evaluated structural type.
///
/// Unlike [`super::TypeExpr`] this form contains no input references and no
/// `never`: the empty type is represented by the *absence* of a `Ty`
/// (`Option<Ty>` in the set operations, `TypeError::Contradiction` at the
/// evaluator surface). Unions are kept flat and literal sets sorted, so two
/// equal types compare equal structurally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Ty {
    Any,
    Number,
    Interval { min: f64, max: f64 },
    NumberSet(Vec<f64>),
    Text,
    TextSet(BTreeSet<String>),
    Struct(StructTy),
    Union(Vec<Ty>),
}

/// A labeled struct type with ordered fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructTy {
    pub name: String,
    pub fields: Vec<(String, Ty)>,
}

impl Ty {
    /// The singleton type of one numeric literal.
    pub fn number_literal(value: f64) -> Ty {
        Ty::NumberSet(vec![value])
    }

    /// The singleton type of one string literal.
    pub fn text_literal(value: impl Into<String>) -> Ty {
        Ty::TextSet(BTreeSet::from([value.into()]))
    }

    /// Builds a sorted, deduplicated literal set. Returns `None` for an
    /// empty input, which denotes the empty type.
    pub fn number_set(values: impl IntoIterator<Item = f64>) -> Option<Ty> {
        let values: Vec<f64> = values
            .into_iter()
            .sorted_by(f64::total_cmp)
            .dedup_by(|a, b| a == b)
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(Ty::NumberSet(values))
        }
    }

    /// The union of an arbitrary number of members. `None` when every
    /// member is absent (the empty type is the identity of union).
    pub fn union_of(members: impl IntoIterator<Item = Ty>) -> Option<Ty> {
        let mut flat: Vec<Ty> = Vec::new();
        for member in members {
            match member {
                Ty::Union(items) => flat.extend(items),
                other => flat.push(other),
            }
        }
        if flat.iter().any(|m| matches!(m, Ty::Any)) {
            return Some(Ty::Any);
        }

        // Merge literal sets of the same domain into a single member. A
        // singleton interval is the same type as a one-element literal set,
        // so it is canonicalized here rather than kept alongside one.
        let mut numbers: Vec<f64> = Vec::new();
        let mut texts: BTreeSet<String> = BTreeSet::new();
        let mut rest: Vec<Ty> = Vec::new();
        for member in flat {
            match member {
                Ty::NumberSet(vs) => numbers.extend(vs),
                Ty::Interval { min, max } if min == max => numbers.push(min),
                Ty::TextSet(vs) => texts.extend(vs),
                other => rest.push(other),
            }
        }
        if let Some(set) = Ty::number_set(numbers) {
            rest.push(set);
        }
        if !texts.is_empty() {
            rest.push(Ty::TextSet(texts));
        }

        // Drop exact repeats and members subsumed by another member.
        let mut kept: Vec<Ty> = rest
            .iter()
            .enumerate()
            .filter(|(i, m)| {
                !rest.iter().enumerate().any(|(j, n)| {
                    (j < *i && *m == n)
                        || (*i != j && m.is_assignable_to(n) && !n.is_assignable_to(m))
                })
            })
            .map(|(_, m)| m.clone())
            .collect();

        match kept.len() {
            0 | 1 => kept.pop(),
            _ => Some(Ty::Union(kept)),
        }
    }

    /// Exact intersection. `None` means the result is the empty type.
    pub fn intersect(&self, other: &Ty) -> Option<Ty> {
        use Ty::*;
        match (self, other) {
            (Any, x) | (x, Any) => Some(x.clone()),
            (Union(items), x) | (x, Union(items)) => {
                Ty::union_of(items.iter().filter_map(|m| m.intersect(x)))
            }

            (Number, Number) => Some(Number),
            (Number, Interval { min, max }) | (Interval { min, max }, Number) => {
                Some(Interval { min: *min, max: *max })
            }
            (Number, NumberSet(vs)) | (NumberSet(vs), Number) => Some(NumberSet(vs.clone())),
            (Interval { min: a0, max: a1 }, Interval { min: b0, max: b1 }) => {
                let min = a0.max(*b0);
                let max = a1.min(*b1);
                if min <= max { Some(Interval { min, max }) } else { None }
            }
            (Interval { min, max }, NumberSet(vs)) | (NumberSet(vs), Interval { min, max }) => {
                Ty::number_set(vs.iter().copied().filter(|v| *min <= *v && *v <= *max))
            }
            (NumberSet(a), NumberSet(b)) => {
                Ty::number_set(a.iter().copied().filter(|v| b.contains(v)))
            }

            (Text, Text) => Some(Text),
            (Text, TextSet(vs)) | (TextSet(vs), Text) => Some(TextSet(vs.clone())),
            (TextSet(a), TextSet(b)) => {
                let out: BTreeSet<String> = a.intersection(b).cloned().collect();
                if out.is_empty() { None } else { Some(TextSet(out)) }
            }

            (Struct(a), Struct(b)) => {
                if a.name != b.name {
                    return None;
                }
                let mut fields: Vec<(String, Ty)> = Vec::new();
                for (name, a_ty) in &a.fields {
                    match b.fields.iter().find(|(n, _)| n == name) {
                        Some((_, b_ty)) => fields.push((name.clone(), a_ty.intersect(b_ty)?)),
                        None => fields.push((name.clone(), a_ty.clone())),
                    }
                }
                for (name, b_ty) in &b.fields {
                    if !a.fields.iter().any(|(n, _)| n == name) {
                        fields.push((name.clone(), b_ty.clone()));
                    }
                }
                Some(Struct(StructTy { name: a.name.clone(), fields }))
            }

            _ => None,
        }
    }

    /// Structural subtyping: is every value of `self` also a value of
    /// `target`? Struct fields are checked by name, recursively; the source
    /// may carry extra fields the target does not mention.
    pub fn is_assignable_to(&self, target: &Ty) -> bool {
        use Ty::*;
        match (self, target) {
            (_, Any) => true,
            (Union(items), t) => items.iter().all(|m| m.is_assignable_to(t)),
            (s, Union(items)) => items.iter().any(|m| s.is_assignable_to(m)),

            (Number, Number) => true,
            (Number, Interval { min, max }) => {
                *min == f64::NEG_INFINITY && *max == f64::INFINITY
            }
            (Interval { .. }, Number) => true,
            (Interval { min: a0, max: a1 }, Interval { min: b0, max: b1 }) => {
                b0 <= a0 && a1 <= b1
            }
            (Interval { min, max }, NumberSet(vs)) => min == max && vs.contains(min),
            (NumberSet(_), Number) => true,
            (NumberSet(vs), Interval { min, max }) => {
                vs.iter().all(|v| *min <= *v && *v <= *max)
            }
            (NumberSet(a), NumberSet(b)) => a.iter().all(|v| b.contains(v)),

            (Text, Text) => true,
            (TextSet(_), Text) => true,
            (TextSet(a), TextSet(b)) => a.is_subset(b),

            (Struct(a), Struct(b)) => {
                a.name == b.name
                    && b.fields.iter().all(|(name, b_ty)| {
                        a.fields
                            .iter()
                            .find(|(n, _)| n == name)
                            .is_some_and(|(_, a_ty)| a_ty.is_assignable_to(b_ty))
                    })
            }

            _ => false,
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Any => write!(f, "any"),
            Ty::Number => write!(f, "number"),
            Ty::Interval { min, max } => write!(f, "{}..{}", min, max),
            Ty::NumberSet(vs) => write!(f, "{{{}}}", vs.iter().join(", ")),
            Ty::Text => write!(f, "text"),
            Ty::TextSet(vs) => {
                write!(f, "{{{}}}", vs.iter().map(|v| format!("{:?}", v)).join(", "))
            }
            Ty::Struct(s) => {
                write!(f, "{}", s.name)?;
                if !s.fields.is_empty() {
                    write!(
                        f,
                        " {{ {} }}",
                        s.fields.iter().map(|(n, t)| format!("{}: {}", n, t)).join(", ")
                    )?;
                }
                Ok(())
            }
            Ty::Union(items) => write!(f, "{}", items.iter().join(" | ")),
        }
    }
}
