//! Unification over the substitution store.
//!
//! `unify` resolves both sides, makes them equal by extending the store,
//! and returns both sides rebuilt against the extended store. Callers use
//! the returned types when they need the unified shape (e.g. a call reads
//! its result slot out of the unified candidate).

use log::trace;

use js_ty::{FunctionTy, Ty};

use crate::storage::TypeVariables;
use crate::TypeError;

pub fn unify(
    t1: &Ty,
    t2: &Ty,
    vars: TypeVariables,
) -> Result<(Ty, Ty, TypeVariables), TypeError> {
    let t1 = vars.prune(t1);
    let t2 = vars.prune(t2);
    trace!("unify {t1} ~ {t2}");

    // Indeterminate carries no information and imposes no constraint,
    // not even on variables.
    if matches!(t1, Ty::Indeterminate) || matches!(t2, Ty::Indeterminate) {
        return Ok((t1, t2, vars));
    }

    match (&t1, &t2) {
        (Ty::Var(v1), _) if !v1.bound => {
            if let Ty::Var(v2) = &t2 {
                if !v2.bound && v2.id == v1.id {
                    return Ok((t1.clone(), t2.clone(), vars));
                }
            }
            if vars.occurs_in_type(*v1, &t2) {
                return Err(TypeError::InfiniteType {
                    var: Box::new(t1.clone()),
                    ty: Box::new(t2.clone()),
                });
            }
            // Two variables collapse onto the lower-numbered one; anything
            // else wins over a variable.
            let unified = match &t2 {
                Ty::Var(v2) if !v2.bound && v2.id >= v1.id => t1.clone(),
                _ => t2.clone(),
            };
            let mut vars = vars.bind(v1.id, unified.clone());
            if let Ty::Var(v2) = &t2 {
                if !v2.bound {
                    vars = vars.bind(v2.id, unified.clone());
                }
            }
            Ok((unified.clone(), unified, vars))
        }
        (_, Ty::Var(v2)) if !v2.bound => {
            if vars.occurs_in_type(*v2, &t1) {
                return Err(TypeError::InfiniteType {
                    var: Box::new(t2.clone()),
                    ty: Box::new(t1.clone()),
                });
            }
            let vars = vars.bind(v2.id, t1.clone());
            Ok((t1.clone(), t1.clone(), vars))
        }
        // Bound variables are opaque: equal only to themselves.
        (Ty::Var(v1), Ty::Var(v2)) if v1.bound && v2.bound && v1.id == v2.id => {
            Ok((t1.clone(), t2.clone(), vars))
        }
        (Ty::Function(f1), Ty::Function(f2)) => {
            if f1.types.len() != f2.types.len() {
                return Err(mismatch(&t1, &t2));
            }
            let mut vars = vars;
            let mut left = Vec::with_capacity(f1.types.len());
            let mut right = Vec::with_capacity(f2.types.len());
            for (a, b) in f1.types.iter().zip(&f2.types) {
                let (ua, ub, next) = unify(&a.0, &b.0, vars)?;
                vars = next;
                left.push(ua.into());
                right.push(ub.into());
            }
            Ok((
                Ty::Function(FunctionTy {
                    types: left,
                    bound_vars: f1.bound_vars.clone(),
                }),
                Ty::Function(FunctionTy {
                    types: right,
                    bound_vars: f2.bound_vars.clone(),
                }),
                vars,
            ))
        }
        (Ty::Primitive(p1), Ty::Primitive(p2)) if p1 == p2 => Ok((t1.clone(), t2.clone(), vars)),
        (Ty::Nullable(a), Ty::Nullable(b)) => {
            let (ua, ub, vars) = unify(&a.0, &b.0, vars)?;
            Ok((Ty::Nullable(ua.into()), Ty::Nullable(ub.into()), vars))
        }
        (Ty::Record(r1), Ty::Record(r2)) => {
            // Width subtyping, one direction: the left side must carry at
            // least the fields the right side demands.
            let missing: Vec<_> = r2
                .fields
                .iter()
                .filter(|(key, _)| !r1.fields.contains_key(*key))
                .collect();
            if !missing.is_empty() {
                return Err(TypeError::MissingProperties {
                    fields: missing
                        .into_iter()
                        .map(|(key, expected)| (key.clone(), vars.prune(&expected.0)))
                        .collect(),
                });
            }
            let mut vars = vars;
            for (key, expected) in &r2.fields {
                let actual = &r1.fields[key];
                let (_, _, next) = unify(&actual.0, &expected.0, vars)?;
                vars = next;
            }
            Ok((t1.clone(), t2.clone(), vars))
        }
        _ => Err(mismatch(&t1, &t2)),
    }
}

fn mismatch(t1: &Ty, t2: &Ty) -> TypeError {
    TypeError::TypeMismatch {
        left: Box::new(t1.clone()),
        right: Box::new(t2.clone()),
    }
}
