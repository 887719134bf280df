//! Identifier environments.

use js_ty::Ty;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

/// Maps names in scope to their types. Binding is copy-on-write, so sibling
/// scopes never see each other's names even though the substitution store
/// keeps threading forward.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Env {
    bindings: FxHashMap<SmolStr, Ty>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&self, name: SmolStr, ty: Ty) -> Env {
        let mut bindings = self.bindings.clone();
        bindings.insert(name, ty);
        Env { bindings }
    }

    pub fn lookup(&self, name: &str) -> Option<&Ty> {
        self.bindings.get(name)
    }
}

impl FromIterator<(SmolStr, Ty)> for Env {
    fn from_iter<T: IntoIterator<Item = (SmolStr, Ty)>>(iter: T) -> Self {
        Env {
            bindings: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_does_not_alias() {
        let base = Env::new().bind("x".into(), Ty::number());
        let child = base.bind("x".into(), Ty::string());
        assert_eq!(base.lookup("x"), Some(&Ty::number()));
        assert_eq!(child.lookup("x"), Some(&Ty::string()));
    }
}
