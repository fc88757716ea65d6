use super::{InputId, Ty, TypeExpr};
use crate::error::TypeError;
use ahash::AHashMap;

/// The values a type expression may reference, keyed by input id.
///
/// Bindings are passed explicitly; the evaluator has no ambient state and no
/// knowledge of the graph. Literal input values enter as singleton types,
/// handle-fed inputs as the resolved type of the upstream output.
pub type Binding = AHashMap<InputId, Ty>;

/// Reduces a type expression to a canonical [`Ty`] under `binding`.
///
/// Deterministic and referentially transparent: the same expression and
/// binding always produce the same result. Fails with
/// [`TypeError::Unresolvable`] when the expression references an input the
/// binding does not cover, and with [`TypeError::Contradiction`] when the
/// expression reduces to the empty type.
pub fn evaluate(expr: &TypeExpr, binding: &Binding) -> Result<Ty, TypeError> {
    reduce(expr, binding)?.ok_or(TypeError::Contradiction)
}

/// `Ok(None)` encodes the empty type so that unions can absorb it.
fn reduce(expr: &TypeExpr, binding: &Binding) -> Result<Option<Ty>, TypeError> {
    match expr {
        TypeExpr::Any => Ok(Some(Ty::Any)),
        TypeExpr::Never => Ok(None),
        TypeExpr::Number => Ok(Some(Ty::Number)),
        TypeExpr::Text => Ok(Some(Ty::Text)),
        TypeExpr::Interval { min, max } => {
            if min <= max {
                Ok(Some(Ty::Interval { min: *min, max: *max }))
            } else {
                Ok(None)
            }
        }
        TypeExpr::NumberLiterals { values } => Ok(Ty::number_set(values.iter().copied())),
        TypeExpr::TextLiterals { values } => {
            if values.is_empty() {
                Ok(None)
            } else {
                Ok(Some(Ty::TextSet(values.iter().cloned().collect())))
            }
        }
        TypeExpr::Struct { name, fields } => {
            let mut out = Vec::with_capacity(fields.len());
            for field in fields {
                // A struct with an empty field has no inhabitants.
                match reduce(&field.ty, binding)? {
                    Some(ty) => out.push((field.name.clone(), ty)),
                    None => return Ok(None),
                }
            }
            Ok(Some(Ty::Struct(crate::ty::StructTy {
                name: name.clone(),
                fields: out,
            })))
        }
        TypeExpr::Union { items } => {
            let mut members = Vec::with_capacity(items.len());
            for item in items {
                if let Some(ty) = reduce(item, binding)? {
                    members.push(ty);
                }
            }
            Ok(Ty::union_of(members))
        }
        TypeExpr::Intersection { items } => {
            let mut acc = Some(Ty::Any);
            for item in items {
                let Some(ty) = reduce(item, binding)? else {
                    return Ok(None);
                };
                acc = match acc {
                    Some(current) => current.intersect(&ty),
                    None => None,
                };
                if acc.is_none() {
                    return Ok(None);
                }
            }
            Ok(acc)
        }
        TypeExpr::InputRef { input } => binding
            .get(input)
            .cloned()
            .map(Some)
            .ok_or(TypeError::Unresolvable(*input)),
    }
}
