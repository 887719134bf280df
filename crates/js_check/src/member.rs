//! Member access and record/array literals.
//!
//! Literal keys (identifiers, string and number literals, computed or not)
//! are static field accesses. A numeric key falls back to the record's
//! `"[]"` lookup function when no exact field exists, which is how array
//! indexing yields nullable elements. Non-literal computed keys go through
//! the lookup function unconditionally, creating a dict shape on demand.

use js_ast::{number_key, Expr, ExprId, MemberKey, ObjectProperty};
use js_ty::{array_type, dict_type, RecordTy, Ty};
use smol_str::SmolStr;

use crate::infer::{Infer, InferResult, InferState};
use crate::unify::unify;
use crate::{LocatedError, TypeError};

/// Literal shape while an object literal accumulates: a fixed row of known
/// fields, until a computed key degrades it to a dict.
enum Shape {
    Fixed(RecordTy),
    Dict { key: Ty, value: Ty },
}

impl Infer<'_> {
    pub(crate) fn analyse_member(
        &self,
        at: ExprId,
        object: ExprId,
        property: &MemberKey,
        state: InferState,
    ) -> InferResult {
        let (obj_ty, state) = self.analyse_expr(object, state)?;
        match property {
            MemberKey::Static(name) => self.member_field(at, &obj_ty, name.clone(), None, state),
            MemberKey::Computed(key) => match &self.module[*key] {
                Expr::Str(s) => self.member_field(at, &obj_ty, s.clone(), None, state),
                Expr::Number(n) => {
                    self.member_field(at, &obj_ty, number_key(*n), Some(*key), state)
                }
                _ => self.member_dynamic(at, &obj_ty, *key, state),
            },
        }
    }

    fn member_field(
        &self,
        at: ExprId,
        obj_ty: &Ty,
        key: SmolStr,
        numeric_key: Option<ExprId>,
        state: InferState,
    ) -> InferResult {
        let span = self.module.expr_span(at);
        let pruned = state.vars.prune(obj_ty);

        if let Ty::Record(record) = &pruned {
            if let Some(field) = record.get(&key) {
                let field = field.clone();
                let (member_var, vars) = state.vars.alloc();
                let member = Ty::Var(member_var);
                let (_, _, vars) =
                    unify(&member, &field.0, vars).map_err(|error| LocatedError { error, span })?;
                return Ok((
                    member,
                    InferState {
                        env: state.env,
                        vars,
                    },
                ));
            }
            // Indexed access: `xs[5]` on an array-shaped record without an
            // exact `5` field goes through the lookup function.
            if let (Some(key_expr), Some(lookup)) = (numeric_key, record.lookup_fn()) {
                let lookup = (*lookup.0).clone();
                return self.analyse_call(&lookup, span, &[key_expr], state);
            }
            // A variable whose record lacks the field grows its row.
            if let Ty::Var(obj_var) = obj_ty {
                let canonical = state.vars.canonical_var(*obj_var);
                let (member_var, vars) = state.vars.alloc();
                let member = Ty::Var(member_var);
                let vars = vars.bind(canonical.id, Ty::Record(record.insert(key, member.clone())));
                return Ok((
                    member,
                    InferState {
                        env: state.env,
                        vars,
                    },
                ));
            }
        }

        // Not (yet) a record: require one carrying just this field. For an
        // unconstrained variable this binds the row; for anything else it
        // reports the mismatch or missing property.
        let (member_var, vars) = state.vars.alloc();
        let member = Ty::Var(member_var);
        let wanted = Ty::Record(RecordTy::single(key, member.clone()));
        let (_, _, vars) =
            unify(obj_ty, &wanted, vars).map_err(|error| LocatedError { error, span })?;
        Ok((
            member,
            InferState {
                env: state.env,
                vars,
            },
        ))
    }

    fn member_dynamic(
        &self,
        at: ExprId,
        obj_ty: &Ty,
        key: ExprId,
        state: InferState,
    ) -> InferResult {
        let span = self.module.expr_span(at);
        let pruned = state.vars.prune(obj_ty);

        if let Ty::Record(record) = &pruned {
            return match record.lookup_fn() {
                Some(lookup) => {
                    let lookup = (*lookup.0).clone();
                    self.analyse_call(&lookup, span, &[key], state)
                }
                None => Err(LocatedError {
                    error: TypeError::UnsupportedDynamicAccess,
                    span,
                }),
            };
        }

        // Nothing known about the object yet: constrain it to a dict and
        // look the key up in it.
        let (key_var, vars) = state.vars.alloc();
        let (value_var, vars) = vars.alloc();
        let dict = Ty::Record(dict_type(Ty::Var(key_var), Ty::Var(value_var)));
        let (_, _, vars) =
            unify(obj_ty, &dict, vars).map_err(|error| LocatedError { error, span })?;
        let lookup = Ty::function(vec![Ty::Var(key_var), Ty::Var(value_var)]);
        self.analyse_call(
            &lookup,
            span,
            &[key],
            InferState {
                env: state.env,
                vars,
            },
        )
    }

    pub(crate) fn analyse_object(
        &self,
        at: ExprId,
        properties: &[ObjectProperty],
        state: InferState,
    ) -> InferResult {
        let span = self.module.expr_span(at);
        let locate = |error| LocatedError { error, span };

        let mut state = state;
        let mut shape = Shape::Fixed(RecordTy::new());
        // All opaque spreads share one key and one value variable.
        let mut rest_slots: Option<(Ty, Ty)> = None;

        for property in properties {
            shape = match property {
                ObjectProperty::Static { key, value } => {
                    let (value_ty, next) = self.analyse_expr(*value, state)?;
                    state = next;
                    match shape {
                        Shape::Fixed(fields) => Shape::Fixed(fields.insert(key.clone(), value_ty)),
                        Shape::Dict { key: key_slot, value: value_slot } => {
                            let (_, _, vars) =
                                unify(&key_slot, &Ty::string(), state.vars).map_err(locate)?;
                            let (_, _, vars) =
                                unify(&value_slot, &value_ty, vars).map_err(locate)?;
                            state.vars = vars;
                            Shape::Dict {
                                key: key_slot,
                                value: value_slot,
                            }
                        }
                    }
                }
                ObjectProperty::Computed { key, value } => {
                    let (key_ty, next) = self.analyse_expr(*key, state)?;
                    let (value_ty, next) = self.analyse_expr(*value, next)?;
                    state = next;

                    let (key_slot, value_slot) = match shape {
                        Shape::Fixed(fields) => {
                            // The literal degrades to a dict; every field
                            // collected so far folds into the shared slots.
                            let (key_var, vars) = state.vars.alloc();
                            let (value_var, vars) = vars.alloc();
                            state.vars = vars;
                            let key_slot = Ty::Var(key_var);
                            let value_slot = Ty::Var(value_var);
                            if !fields.fields.is_empty() {
                                let (_, _, vars) = unify(&key_slot, &Ty::string(), state.vars)
                                    .map_err(locate)?;
                                state.vars = vars;
                            }
                            for field in fields.fields.values() {
                                let (_, _, vars) = unify(&value_slot, &field.0, state.vars)
                                    .map_err(locate)?;
                                state.vars = vars;
                            }
                            (key_slot, value_slot)
                        }
                        Shape::Dict { key, value } => (key, value),
                    };

                    let (_, _, vars) = unify(&key_slot, &key_ty, state.vars).map_err(locate)?;
                    let (_, _, vars) = unify(&value_slot, &value_ty, vars).map_err(locate)?;
                    state.vars = vars;
                    Shape::Dict {
                        key: key_slot,
                        value: value_slot,
                    }
                }
                ObjectProperty::Spread(source) => {
                    let (spread_ty, next) = self.analyse_expr(*source, state)?;
                    state = next;
                    let pruned = state.vars.prune(&spread_ty);

                    match (shape, &pruned) {
                        // A known plain record spreads its fields in.
                        (Shape::Fixed(fields), Ty::Record(record))
                            if record.lookup_fn().is_none() =>
                        {
                            let mut fields = fields;
                            for (key, value) in &record.fields {
                                fields = fields.insert(key.clone(), (*value.0).clone());
                            }
                            Shape::Fixed(fields)
                        }
                        (Shape::Fixed(fields), _) => {
                            // Opaque spread: the source must at least be a
                            // dict; its keys and values stay unknown.
                            let (key_slot, value_slot) = match &rest_slots {
                                Some(slots) => slots.clone(),
                                None => {
                                    let (key_var, vars) = state.vars.alloc();
                                    let (value_var, vars) = vars.alloc();
                                    state.vars = vars;
                                    let slots = (Ty::Var(key_var), Ty::Var(value_var));
                                    rest_slots = Some(slots.clone());
                                    slots
                                }
                            };
                            let dict = Ty::Record(dict_type(key_slot, value_slot));
                            let (_, _, vars) =
                                unify(&spread_ty, &dict, state.vars).map_err(locate)?;
                            state.vars = vars;
                            Shape::Fixed(fields)
                        }
                        (Shape::Dict { key, value }, Ty::Record(record))
                            if record.lookup_fn().is_none() =>
                        {
                            if !record.fields.is_empty() {
                                let (_, _, vars) =
                                    unify(&key, &Ty::string(), state.vars).map_err(locate)?;
                                state.vars = vars;
                            }
                            for field in record.fields.values() {
                                let (_, _, vars) =
                                    unify(&value, &field.0, state.vars).map_err(locate)?;
                                state.vars = vars;
                            }
                            Shape::Dict { key, value }
                        }
                        (Shape::Dict { key, value }, _) => {
                            let dict = Ty::Record(dict_type(key.clone(), value.clone()));
                            let (_, _, vars) =
                                unify(&spread_ty, &dict, state.vars).map_err(locate)?;
                            state.vars = vars;
                            Shape::Dict { key, value }
                        }
                    }
                }
            };
        }

        let ty = match shape {
            Shape::Fixed(fields) => Ty::Record(fields),
            Shape::Dict { key, value } => Ty::Record(dict_type(key, value)),
        };
        Ok((ty, state))
    }

    pub(crate) fn analyse_array(&self, elements: &[ExprId], state: InferState) -> InferResult {
        let mut state = state;
        let mut types = Vec::with_capacity(elements.len());
        for element in elements {
            let (ty, next) = self.analyse_expr(*element, state)?;
            types.push(ty);
            state = next;
        }
        let pruned: Vec<Ty> = types.iter().map(|ty| state.vars.prune(ty)).collect();

        let mut record = array_type(common_element(&pruned));
        for (index, ty) in pruned.into_iter().enumerate() {
            record = record.insert(number_key(index as f64), ty);
        }
        Ok((Ty::Record(record), state))
    }
}

/// The element type all entries agree on: a shared primitive, or
/// `Indeterminate` for anything mixed or structural. `None` for an empty
/// array, whose element stays quantified.
fn common_element(types: &[Ty]) -> Option<Ty> {
    let (first, rest) = types.split_first()?;
    if !matches!(first, Ty::Primitive(_)) {
        return Some(Ty::Indeterminate);
    }
    for ty in rest {
        if ty != first {
            return Some(Ty::Indeterminate);
        }
    }
    Some(first.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_element_of_matching_primitives() {
        let types = vec![Ty::number(), Ty::number()];
        assert_eq!(common_element(&types), Some(Ty::number()));
    }

    #[test]
    fn common_element_of_mixed_types_is_indeterminate() {
        let types = vec![Ty::number(), Ty::string()];
        assert_eq!(common_element(&types), Some(Ty::Indeterminate));
        let records = vec![
            Ty::Record(RecordTy::new()),
            Ty::Record(RecordTy::new()),
        ];
        assert_eq!(common_element(&records), Some(Ty::Indeterminate));
    }

    #[test]
    fn common_element_of_empty_array_is_open() {
        assert_eq!(common_element(&[]), None);
    }
}
