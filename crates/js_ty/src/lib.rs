//! The type algebra for the inference engine: type terms, variable naming,
//! and the pure traversals (substitution, variable collection) that
//! generalization and instantiation are built on.
//!
//! Types are immutable; anything that "changes" a type builds a new one.
//! Sharing goes through [`TyRef`] (an `Arc`), so snapshots are cheap.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use derive_more::Debug;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

mod primitive;
mod record;
mod var;

pub use primitive::PrimitiveTy;
pub use record::{array_type, dict_type, RecordTy, LOOKUP_OPERATOR};
pub use var::{var_id_from_name, var_name, TyVar};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ty {
    #[debug("Var({_0:?})")]
    Var(TyVar),

    #[debug("{_0:?}")]
    Primitive(PrimitiveTy),

    #[debug("Function({_0:?})")]
    Function(FunctionTy),

    #[debug("{_0:?}")]
    Record(RecordTy),

    #[debug("Nullable({_0:?})")]
    Nullable(TyRef),

    /// The type of values nothing further is known about, e.g. the element
    /// type of a heterogeneous array. Unifies with anything without
    /// constraining it.
    Indeterminate,
}

/// Arc-wrapped [`Ty`] for recursive type structures.
#[derive(Debug, Clone, PartialEq, Eq)]
#[debug("{_0:?}")]
pub struct TyRef(pub Arc<Ty>);

impl From<Ty> for TyRef {
    fn from(value: Ty) -> Self {
        TyRef(Arc::new(value))
    }
}

/// A function type. `types` holds the parameter types followed by the return
/// type, so it always has at least two entries (zero-parameter functions take
/// a single `Unit` parameter). `bound_vars` lists the variables universally
/// quantified at this function, replaced with fresh store variables on
/// instantiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionTy {
    pub types: Vec<TyRef>,
    pub bound_vars: Vec<TyVar>,
}

impl FunctionTy {
    pub fn new(types: Vec<Ty>, bound_vars: Vec<TyVar>) -> Self {
        FunctionTy {
            types: types.into_iter().map(Into::into).collect(),
            bound_vars,
        }
    }

    pub fn params(&self) -> &[TyRef] {
        &self.types[..self.types.len() - 1]
    }

    pub fn ret(&self) -> &TyRef {
        self.types.last().expect("function type with no return slot")
    }
}

impl Ty {
    pub fn function(types: Vec<Ty>) -> Ty {
        Ty::Function(FunctionTy::new(types, Vec::new()))
    }

    pub fn number() -> Ty {
        Ty::Primitive(PrimitiveTy::Number)
    }

    pub fn string() -> Ty {
        Ty::Primitive(PrimitiveTy::String)
    }

    pub fn boolean() -> Ty {
        Ty::Primitive(PrimitiveTy::Boolean)
    }

    pub fn unit() -> Ty {
        Ty::Primitive(PrimitiveTy::Unit)
    }

    /// Collect unbound variables in order of first appearance, deduplicated.
    pub fn unbound_vars(&self) -> Vec<TyVar> {
        let mut result = Vec::new();
        let mut seen = HashSet::new();
        self.collect_unbound_vars(&mut result, &mut seen);
        result
    }

    fn collect_unbound_vars(&self, result: &mut Vec<TyVar>, seen: &mut HashSet<u32>) {
        match self {
            Ty::Var(v) => {
                if !v.bound && seen.insert(v.id) {
                    result.push(*v);
                }
            }
            Ty::Function(f) => {
                for t in &f.types {
                    t.0.collect_unbound_vars(result, seen);
                }
            }
            Ty::Record(r) => {
                for v in r.fields.values() {
                    v.0.collect_unbound_vars(result, seen);
                }
            }
            Ty::Nullable(inner) => inner.0.collect_unbound_vars(result, seen),
            Ty::Primitive(_) | Ty::Indeterminate => {}
        }
    }

    /// Substitute variables throughout, respecting quantifier scope: a nested
    /// function shadows any replacement keyed by a bound variable it
    /// quantifies itself.
    pub fn replace_vars(&self, map: &FxHashMap<TyVar, Ty>) -> Ty {
        if map.is_empty() {
            return self.clone();
        }
        match self {
            Ty::Var(v) => map.get(v).cloned().unwrap_or_else(|| self.clone()),
            Ty::Function(f) => {
                let shadowed;
                let map = if f.bound_vars.iter().any(|b| map.contains_key(b)) {
                    shadowed = map
                        .iter()
                        .filter(|(k, _)| !f.bound_vars.contains(k))
                        .map(|(k, v)| (*k, v.clone()))
                        .collect::<FxHashMap<_, _>>();
                    &shadowed
                } else {
                    map
                };
                Ty::Function(FunctionTy {
                    types: f
                        .types
                        .iter()
                        .map(|t| t.0.replace_vars(map).into())
                        .collect(),
                    bound_vars: f.bound_vars.clone(),
                })
            }
            Ty::Record(r) => Ty::Record(RecordTy {
                fields: r
                    .fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.0.replace_vars(map).into()))
                    .collect(),
            }),
            Ty::Nullable(inner) => Ty::Nullable(inner.0.replace_vars(map).into()),
            Ty::Primitive(_) | Ty::Indeterminate => self.clone(),
        }
    }
}

// ==============================================================================
// Display — human-readable type printing
// ==============================================================================
//
// Variables render as `#a`, `#b`, ... in id order. A single function
// parameter is printed bare unless it is itself an arrow; parameter lists
// are otherwise parenthesized and comma-joined.

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Var(v) => write!(f, "{v}"),
            Ty::Primitive(p) => write!(f, "{p}"),
            Ty::Function(func) => write!(f, "{func}"),
            Ty::Record(r) => write!(f, "{r}"),
            Ty::Nullable(inner) => write!(f, "{inner}?"),
            Ty::Indeterminate => write!(f, "?"),
        }
    }
}

impl fmt::Display for FunctionTy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self.params();
        let ret = self.ret();
        if let [param] = params {
            if !matches!(&*param.0, Ty::Function(_)) {
                return write!(f, "{param} -> {ret}");
            }
        }
        write!(f, "(")?;
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{param}")?;
        }
        write!(f, ") -> {ret}")
    }
}

impl fmt::Display for RecordTy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}: {v}")?;
        }
        write!(f, "}}")
    }
}

impl fmt::Display for TyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

/// Record keys are [`SmolStr`]; re-exported so downstream crates name one
/// string type.
pub type FieldName = SmolStr;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_param_functions_render_bare() {
        let id = Ty::function(vec![Ty::Var(TyVar::bound(0)), Ty::Var(TyVar::bound(0))]);
        assert_eq!(id.to_string(), "#a -> #a");
    }

    #[test]
    fn multi_param_functions_render_parenthesized() {
        let add = Ty::function(vec![Ty::number(), Ty::number(), Ty::number()]);
        assert_eq!(add.to_string(), "(Number, Number) -> Number");
    }

    #[test]
    fn arrow_params_get_parens() {
        let inner = Ty::function(vec![Ty::number(), Ty::boolean()]);
        let outer = Ty::function(vec![inner, Ty::boolean()]);
        assert_eq!(outer.to_string(), "(Number -> Boolean) -> Boolean");
    }

    #[test]
    fn record_params_render_bare() {
        let rec = Ty::Record(RecordTy::single("x".into(), Ty::number()));
        let f = Ty::function(vec![rec, Ty::number()]);
        assert_eq!(f.to_string(), "{x: Number} -> Number");
    }

    #[test]
    fn nullable_and_indeterminate_render() {
        assert_eq!(Ty::Nullable(Ty::string().into()).to_string(), "String?");
        assert_eq!(Ty::Indeterminate.to_string(), "?");
    }

    #[test]
    fn unbound_vars_in_first_appearance_order() {
        let a = TyVar::unbound(7);
        let b = TyVar::unbound(3);
        let f = Ty::function(vec![Ty::Var(a), Ty::Var(b), Ty::Var(a)]);
        assert_eq!(f.unbound_vars(), vec![a, b]);
    }

    #[test]
    fn replace_vars_respects_nested_quantifiers() {
        let a = TyVar::bound(0);
        let b = TyVar::bound(1);
        // a -> (forall a b. a -> b), with `a` free at the top: instantiation
        // substitutes into slots like this after stripping the quantifier.
        let inner = Ty::Function(FunctionTy::new(
            vec![Ty::Var(a), Ty::Var(b)],
            vec![a, b],
        ));
        let outer = Ty::Function(FunctionTy::new(
            vec![Ty::Var(a), inner.clone()],
            vec![],
        ));

        let mut map = FxHashMap::default();
        map.insert(a, Ty::Var(TyVar::unbound(9)));
        let replaced = outer.replace_vars(&map);

        let Ty::Function(f) = replaced else { panic!() };
        assert_eq!(*f.types[0].0, Ty::Var(TyVar::unbound(9)));
        // The inner function re-quantifies `a`, so its occurrences stay put.
        assert_eq!(*f.types[1].0, inner);
    }

    #[test]
    fn replace_vars_shadowed_by_the_functions_own_quantifier() {
        let a = TyVar::bound(0);
        let poly = Ty::Function(FunctionTy::new(vec![Ty::Var(a), Ty::Var(a)], vec![a]));

        let mut map = FxHashMap::default();
        map.insert(a, Ty::number());
        // `poly` quantifies `a` itself, so the replacement never applies.
        assert_eq!(poly.replace_vars(&map), poly);
    }
}
