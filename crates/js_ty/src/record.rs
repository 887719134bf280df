use std::collections::BTreeMap;

use smol_str::SmolStr;

use crate::{FunctionTy, PrimitiveTy, Ty, TyRef, TyVar};

/// Reserved field name holding the indexed-lookup function of arrays and
/// dicts. `[` is not a legal identifier character, so user code can never
/// collide with it.
pub const LOOKUP_OPERATOR: &str = "[]";

/// A row of named fields. Unification treats records with width subtyping:
/// the left side may carry more fields than the right side demands.
///
/// Fields are kept sorted so that rendering and iteration are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordTy {
    pub fields: BTreeMap<SmolStr, TyRef>,
}

impl RecordTy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(key: SmolStr, ty: Ty) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(key, ty.into());
        RecordTy { fields }
    }

    pub fn get(&self, key: &str) -> Option<&TyRef> {
        self.fields.get(key)
    }

    pub fn lookup_fn(&self) -> Option<&TyRef> {
        self.fields.get(LOOKUP_OPERATOR)
    }

    /// Copy-on-write extension with one more field.
    pub fn insert(&self, key: SmolStr, ty: Ty) -> Self {
        let mut fields = self.fields.clone();
        fields.insert(key, ty.into());
        RecordTy { fields }
    }
}

impl FromIterator<(SmolStr, Ty)> for RecordTy {
    fn from_iter<T: IntoIterator<Item = (SmolStr, Ty)>>(iter: T) -> Self {
        RecordTy {
            fields: iter.into_iter().map(|(k, v)| (k, v.into())).collect(),
        }
    }
}

/// The record shape shared by all array values. `elem` is the common element
/// type when one is known; an empty array quantifies the element instead, so
/// every use site gets its own instance.
///
/// Fields: `length`, the `"[]"` lookup (`Number -> elem?`) and `reduce`
/// (`((acc, elem, Number) -> acc, acc) -> acc`).
pub fn array_type(elem: Option<Ty>) -> RecordTy {
    let number = Ty::Primitive(PrimitiveTy::Number);
    match elem {
        Some(elem) => {
            let acc = Ty::Var(TyVar::bound(0));
            let lookup = Ty::Function(FunctionTy::new(
                vec![number.clone(), Ty::Nullable(elem.clone().into())],
                vec![],
            ));
            let reducer = Ty::Function(FunctionTy::new(
                vec![acc.clone(), elem, number.clone(), acc.clone()],
                vec![],
            ));
            let reduce = Ty::Function(FunctionTy::new(
                vec![reducer, acc.clone(), acc],
                vec![TyVar::bound(0)],
            ));
            [
                (SmolStr::new_static("length"), number),
                (SmolStr::new_static(LOOKUP_OPERATOR), lookup),
                (SmolStr::new_static("reduce"), reduce),
            ]
            .into_iter()
            .collect()
        }
        None => {
            let elem = Ty::Var(TyVar::bound(0));
            let acc = Ty::Var(TyVar::bound(1));
            let lookup = Ty::Function(FunctionTy::new(
                vec![number.clone(), Ty::Nullable(elem.clone().into())],
                vec![TyVar::bound(0)],
            ));
            let reducer = Ty::Function(FunctionTy::new(
                vec![acc.clone(), elem, number.clone(), acc.clone()],
                vec![],
            ));
            let reduce = Ty::Function(FunctionTy::new(
                vec![reducer, acc.clone(), acc],
                vec![TyVar::bound(0), TyVar::bound(1)],
            ));
            [
                (SmolStr::new_static("length"), number),
                (SmolStr::new_static(LOOKUP_OPERATOR), lookup),
                (SmolStr::new_static("reduce"), reduce),
            ]
            .into_iter()
            .collect()
        }
    }
}

/// A record whose only known structure is a `key -> value` lookup.
pub fn dict_type(key: Ty, value: Ty) -> RecordTy {
    let lookup = Ty::Function(FunctionTy::new(vec![key, value], vec![]));
    RecordTy::single(SmolStr::new_static(LOOKUP_OPERATOR), lookup)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_of_strings_lookup_is_nullable() {
        let arr = array_type(Some(Ty::Primitive(PrimitiveTy::String)));
        let lookup = arr.lookup_fn().unwrap();
        assert_eq!(lookup.to_string(), "Number -> String?");
    }

    #[test]
    fn empty_array_lookup_quantifies_element() {
        let arr = array_type(None);
        let lookup = arr.lookup_fn().unwrap();
        assert_eq!(lookup.to_string(), "Number -> #a?");
        match &*lookup.0 {
            Ty::Function(f) => assert_eq!(f.bound_vars, vec![TyVar::bound(0)]),
            other => panic!("expected function, got {other:?}"),
        }
    }

    #[test]
    fn dict_is_just_a_lookup_field() {
        let dict = dict_type(
            Ty::Primitive(PrimitiveTy::String),
            Ty::Primitive(PrimitiveTy::Number),
        );
        assert_eq!(dict.fields.len(), 1);
        assert_eq!(dict.to_string(), "{[]: String -> Number}");
    }
}
