//! Instantiation of quantified types at their use sites.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use js_ty::{FunctionTy, RecordTy, Ty, TyVar};

use crate::storage::TypeVariables;

/// Make a one-use copy of a (possibly polymorphic) type: every variable a
/// function quantifies is replaced by a fresh store variable throughout the
/// signature. Parameter slots are instantiated recursively so nested
/// polymorphic functions passed as values get their own variables too; the
/// return slot is substituted but stays quantified, and is instantiated at
/// its own eventual call site.
pub fn fresh(ty: &Ty, vars: TypeVariables) -> (Ty, TypeVariables) {
    let ty = vars.prune(ty);
    match ty {
        Ty::Function(f) => {
            let mut vars = vars;
            let mut replacements: FxHashMap<TyVar, Ty> = FxHashMap::default();
            for bound in &f.bound_vars {
                let (var, next) = vars.alloc();
                vars = next;
                replacements.insert(*bound, Ty::Var(var));
            }
            let last = f.types.len() - 1;
            let mut types = Vec::with_capacity(f.types.len());
            for (i, slot) in f.types.iter().enumerate() {
                let substituted = slot.0.replace_vars(&replacements);
                if i < last {
                    let (instantiated, next) = fresh(&substituted, vars);
                    vars = next;
                    types.push(instantiated.into());
                } else {
                    types.push(substituted.into());
                }
            }
            (
                Ty::Function(FunctionTy {
                    types,
                    bound_vars: Vec::new(),
                }),
                vars,
            )
        }
        Ty::Record(r) => {
            let mut vars = vars;
            let mut fields = BTreeMap::new();
            for (key, value) in &r.fields {
                let (instantiated, next) = fresh(&value.0, vars);
                vars = next;
                fields.insert(key.clone(), instantiated.into());
            }
            (Ty::Record(RecordTy { fields }), vars)
        }
        Ty::Nullable(inner) => {
            let (instantiated, vars) = fresh(&inner.0, vars);
            (Ty::Nullable(instantiated.into()), vars)
        }
        other => (other, vars),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_quantified_vars_with_fresh_ones() {
        // One variable already allocated, so the instance gets #b.
        let (_, vars) = TypeVariables::new().alloc();
        let a = TyVar::bound(0);
        let poly = Ty::Function(FunctionTy::new(vec![Ty::number(), Ty::Var(a)], vec![a]));

        let (instance, _) = fresh(&poly, vars);
        assert_eq!(instance.to_string(), "Number -> #b");
    }

    #[test]
    fn leaves_requantified_vars_in_the_return_slot() {
        let (_, vars) = TypeVariables::new().alloc();
        let a = TyVar::bound(0);
        let b = TyVar::bound(1);
        // forall a. a -> (forall a b. a -> b)
        let ret = Ty::Function(FunctionTy::new(vec![Ty::Var(a), Ty::Var(b)], vec![a, b]));
        let poly = Ty::Function(FunctionTy::new(vec![Ty::Var(a), ret.clone()], vec![a]));

        let (instance, _) = fresh(&poly, vars);
        let Ty::Function(f) = instance else { panic!() };
        // The parameter was instantiated, the inner function's own
        // quantifiers shadow the replacement.
        assert_eq!(*f.params()[0].0, Ty::Var(TyVar::unbound(1)));
        assert_eq!(*f.ret().0, ret);
        assert!(f.bound_vars.is_empty());
    }

    #[test]
    fn instantiates_inside_records_and_nullables() {
        let (_, vars) = TypeVariables::new().alloc();
        let lookup = js_ty::array_type(None);
        let (instance, _) = fresh(&Ty::Record(lookup), vars);

        let Ty::Record(rec) = instance else { panic!() };
        let Ty::Function(lookup_fn) = &*rec.fields[js_ty::LOOKUP_OPERATOR].0 else {
            panic!()
        };
        // `Number -> elem?` got its element variable from the store.
        assert!(lookup_fn.bound_vars.is_empty());
        assert!(matches!(
            &*lookup_fn.ret().0,
            Ty::Nullable(inner) if matches!(&*inner.0, Ty::Var(v) if !v.bound)
        ));
    }

    #[test]
    fn concrete_types_pass_through() {
        let vars = TypeVariables::new();
        let (out, vars) = fresh(&Ty::number(), vars);
        assert_eq!(out, Ty::number());
        assert!(vars.is_empty());
    }
}
