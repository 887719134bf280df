//! The substitution store: every unbound type variable has an entry here,
//! either pointing at itself (unconstrained) or at the type it has been
//! unified with, possibly another variable.
//!
//! Mutating operations take the store by value and hand back the updated
//! one; inference threads it through every rule. A `clone` is therefore a
//! snapshot, which is how speculative unification backtracks.

use js_ty::{var_id_from_name, FunctionTy, RecordTy, Ty, TyRef, TyVar};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeVariables {
    next_id: u32,
    variables: FxHashMap<u32, Ty>,
}

impl TypeVariables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh unbound variable, initially bound to itself.
    pub fn alloc(mut self) -> (TyVar, Self) {
        let var = TyVar::unbound(self.next_id);
        self.variables.insert(var.id, Ty::Var(var));
        self.next_id += 1;
        (var, self)
    }

    /// Allocate a variable with an id derived from its rendered name
    /// (`"a"` is 0, `"b"` is 1, ...). Does not advance the id counter;
    /// useful for deterministic fixtures.
    pub fn alloc_named(mut self, name: &str) -> (TyVar, Self) {
        let var = TyVar::unbound(var_id_from_name(name));
        self.variables.insert(var.id, Ty::Var(var));
        (var, self)
    }

    pub fn bind(mut self, id: u32, ty: Ty) -> Self {
        self.variables.insert(id, ty);
        self
    }

    pub fn lookup(&self, id: u32) -> Option<&Ty> {
        self.variables.get(&id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.variables.contains_key(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.variables.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Resolve a type as far as the store knows it, without touching the
    /// store itself. Variables are chased to their terminal binding and
    /// composite types are rebuilt from pruned components.
    pub fn prune(&self, ty: &Ty) -> Ty {
        match ty {
            Ty::Var(v) if !v.bound => match self.variables.get(&v.id) {
                Some(Ty::Var(next)) if next.id == v.id => Ty::Var(*next),
                Some(binding) => self.prune(binding),
                None => ty.clone(),
            },
            Ty::Var(_) | Ty::Primitive(_) | Ty::Indeterminate => ty.clone(),
            Ty::Function(f) => Ty::Function(FunctionTy {
                types: f.types.iter().map(|t| self.prune_ref(t)).collect(),
                bound_vars: f.bound_vars.clone(),
            }),
            Ty::Record(r) => Ty::Record(RecordTy {
                fields: r
                    .fields
                    .iter()
                    .map(|(k, v)| (k.clone(), self.prune_ref(v)))
                    .collect(),
            }),
            Ty::Nullable(inner) => Ty::Nullable(self.prune_ref(inner)),
        }
    }

    fn prune_ref(&self, ty: &TyRef) -> TyRef {
        match &*ty.0 {
            // Leaves that prune to themselves keep their allocation.
            Ty::Primitive(_) | Ty::Indeterminate => ty.clone(),
            Ty::Var(v) if v.bound => ty.clone(),
            other => self.prune(other).into(),
        }
    }

    /// Follow a variable chain to its last variable, the one whose store
    /// entry holds the actual binding.
    pub fn canonical_var(&self, var: TyVar) -> TyVar {
        if var.bound {
            return var;
        }
        match self.variables.get(&var.id) {
            Some(Ty::Var(next)) if !next.bound && next.id != var.id => self.canonical_var(*next),
            _ => var,
        }
    }

    /// The occurs check: does `var` appear anywhere inside `ty` once both
    /// are resolved against this store?
    pub fn occurs_in_type(&self, var: TyVar, ty: &Ty) -> bool {
        let pruned = self.prune(ty);
        if let Ty::Var(other) = &pruned {
            if *other == var {
                return true;
            }
        }
        match &pruned {
            Ty::Function(f) => f.types.iter().any(|t| self.occurs_in_type(var, &t.0)),
            Ty::Record(r) => r.fields.values().any(|v| self.occurs_in_type(var, &v.0)),
            Ty::Nullable(inner) => self.occurs_in_type(var, &inner.0),
            Ty::Var(_) | Ty::Primitive(_) | Ty::Indeterminate => false,
        }
    }

    /// Does `var` occur inside the current binding of any variable that
    /// already existed in `outer`? Used by generalization: such a variable
    /// is still visible to the enclosing scope and must stay monomorphic.
    pub fn occurs_in_outer(&self, var: TyVar, outer: &TypeVariables) -> bool {
        outer.ids().any(|id| {
            self.lookup(id)
                .is_some_and(|binding| self.occurs_in_type(var, binding))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use js_ty::PrimitiveTy;

    #[test]
    fn alloc_hands_out_sequential_ids() {
        let vars = TypeVariables::new();
        let (a, vars) = vars.alloc();
        let (b, vars) = vars.alloc();
        assert_eq!(a, TyVar::unbound(0));
        assert_eq!(b, TyVar::unbound(1));
        assert_eq!(vars.len(), 2);
    }

    #[test]
    fn alloc_named_is_deterministic() {
        let (c, vars) = TypeVariables::new().alloc_named("c");
        assert_eq!(c, TyVar::unbound(2));
        // The id counter did not move.
        let (next, _) = vars.alloc();
        assert_eq!(next, TyVar::unbound(0));
    }

    #[test]
    fn prune_follows_variable_chains() {
        let (a, vars) = TypeVariables::new().alloc();
        let (b, vars) = vars.alloc();
        let vars = vars.bind(a.id, Ty::Var(b));
        let vars = vars.bind(b.id, Ty::number());
        assert_eq!(vars.prune(&Ty::Var(a)), Ty::number());
    }

    #[test]
    fn prune_leaves_unconstrained_vars_alone() {
        let (a, vars) = TypeVariables::new().alloc();
        assert_eq!(vars.prune(&Ty::Var(a)), Ty::Var(a));
    }

    #[test]
    fn prune_resolves_inside_composites() {
        let (a, vars) = TypeVariables::new().alloc();
        let vars = vars.bind(a.id, Ty::string());
        let f = Ty::function(vec![Ty::Var(a), Ty::Nullable(Ty::Var(a).into())]);
        assert_eq!(
            vars.prune(&f),
            Ty::function(vec![Ty::string(), Ty::Nullable(Ty::string().into())])
        );
    }

    #[test]
    fn prune_does_not_touch_bound_vars() {
        let vars = TypeVariables::new();
        let bound = Ty::Var(TyVar::bound(0));
        assert_eq!(vars.prune(&bound), bound);
    }

    #[test]
    fn canonical_var_stops_at_the_binding_holder() {
        let (a, vars) = TypeVariables::new().alloc();
        let (b, vars) = vars.alloc();
        let vars = vars.bind(a.id, Ty::Var(b));
        let vars = vars.bind(
            b.id,
            Ty::Record(js_ty::RecordTy::single("x".into(), Ty::number())),
        );
        assert_eq!(vars.canonical_var(a), b);
    }

    #[test]
    fn occurs_check_sees_through_the_store() {
        let (a, vars) = TypeVariables::new().alloc();
        let (b, vars) = vars.alloc();
        let vars = vars.bind(b.id, Ty::function(vec![Ty::Var(a), Ty::unit()]));
        assert!(vars.occurs_in_type(a, &Ty::Var(b)));
        assert!(!vars.occurs_in_type(b, &Ty::Primitive(PrimitiveTy::Number)));
    }
}
