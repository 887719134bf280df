//! End-to-end inference tests: source text in, rendered type (or error
//! kind) out.

use indoc::indoc;
use proptest::prelude::*;

use crate::{analyse_source, AnalyseError, Ty, TypeError};

#[track_caller]
fn infer(source: &str) -> Ty {
    match analyse_source(source) {
        Ok(ty) => ty,
        Err(err) => panic!("analysis of {source:?} failed: {err}"),
    }
}

#[track_caller]
fn expect_ty(source: &str, expected: &str) {
    assert_eq!(infer(source).to_string(), expected, "for {source:?}");
}

#[track_caller]
fn expect_expr_ty(expr: &str, expected: &str) {
    expect_ty(&format!("return {expr};"), expected);
}

#[track_caller]
fn expect_type_error(source: &str) -> TypeError {
    match analyse_source(source) {
        Err(AnalyseError::Type(located)) => located.error,
        Err(AnalyseError::Parse(err)) => {
            panic!("expected a type error for {source:?}, got parse error: {err}")
        }
        Ok(ty) => panic!("expected a type error for {source:?}, inferred {ty}"),
    }
}

#[test]
fn literals() {
    expect_expr_ty("1", "Number");
    expect_expr_ty("'a'", "String");
    expect_expr_ty("true", "Boolean");
}

#[test]
fn arithmetic() {
    expect_expr_ty("1 + 1", "Number");
    expect_expr_ty("2 * 3 - 4 / 5", "Number");
    expect_expr_ty("1 < 2", "Boolean");
}

#[test]
fn program_without_a_return_is_unit() {
    expect_ty("const x = 1;", "()");
    expect_ty("return;", "()");
}

#[test]
fn identity_function() {
    expect_expr_ty("x => x", "#a -> #a");
}

#[test]
fn parameters_constrained_by_operators() {
    expect_expr_ty("(x, y) => x + y", "(Number, Number) -> Number");
    expect_expr_ty("x => x < 10", "Number -> Boolean");
    expect_expr_ty("x => !x", "#a -> Boolean");
    expect_expr_ty("x => x ? 1 : 2", "Boolean -> Number");
}

#[test]
fn equality_relates_both_sides() {
    expect_expr_ty("(a, b) => a === b", "(#a, #a) -> Boolean");
}

#[test]
fn named_function_expression() {
    expect_expr_ty(
        "function f(x, y) { return x + y; }",
        "(Number, Number) -> Number",
    );
}

#[test]
fn recursive_function() {
    expect_expr_ty(
        "function fib(n) { return n < 1 ? 1 : fib(n - 2) + fib(n - 1); }",
        "Number -> Number",
    );
}

#[test]
fn function_declarations_bind_their_name() {
    expect_ty(
        indoc! {"
            function double(n) { return n + n; }
            return double(21);
        "},
        "Number",
    );
}

#[test]
fn composition_stays_polymorphic() {
    expect_ty(
        indoc! {"
            const compose = (f, g) => x => g(f(x));
            return compose;
        "},
        "(#a -> #b, #b -> #c) -> #a -> #c",
    );
}

#[test]
fn const_bound_functions_generalize() {
    // `id` is used at two different types in the same scope.
    expect_ty(
        indoc! {"
            const id = x => x;
            const n = id(1);
            return id('a');
        "},
        "String",
    );
}

#[test]
fn parameters_stay_monomorphic() {
    let err = expect_type_error(indoc! {"
        return f => {
            f(1);
            return f('a');
        };
    "});
    assert!(matches!(err, TypeError::BadCall { .. }), "got {err}");
}

#[test]
fn property_types_inferred_from_use() {
    expect_expr_ty("a => a.x + a.y", "{x: Number, y: Number} -> Number");
    expect_expr_ty("a => a.x.y.z[0]", "{x: {y: {z: {0: #a}}}} -> #a");
}

#[test]
fn destructured_parameters() {
    expect_expr_ty("({x}) => x + 1", "{x: Number} -> Number");
}

#[test]
fn object_literals() {
    expect_expr_ty("{a: 1, b: true}", "{a: Number, b: Boolean}");
    expect_expr_ty("{4: {'1': 1}}", "{4: {1: Number}}");
}

#[test]
fn spreading_a_known_record_copies_its_fields() {
    expect_expr_ty("{...{a: 1}, b: 'x'}", "{a: Number, b: String}");
}

#[test]
fn spreading_an_opaque_value_constrains_it_to_a_dict() {
    expect_expr_ty("x => ({ ...x, a: 1 })", "{[]: #a -> #b} -> {a: Number}");
    // Every opaque spread in one literal shares the same key/value slots.
    expect_expr_ty(
        "(x, y) => ({ ...x, ...y })",
        "({[]: #a -> #b}, {[]: #a -> #b}) -> {}",
    );
}

#[test]
fn computed_keys_degrade_to_a_dict() {
    expect_expr_ty("k => ({ [k]: 1 })", "#a -> {[]: #a -> Number}");
}

#[test]
fn dynamic_member_access_constrains_to_a_dict() {
    expect_expr_ty("(obj, key) => obj[key]", "({[]: #a -> #b}, #a) -> #b");
}

#[test]
fn dynamic_access_on_a_static_record_fails() {
    let err = expect_type_error(indoc! {"
        const o = {a: 1};
        return k => o[k];
    "});
    assert!(
        matches!(err, TypeError::UnsupportedDynamicAccess),
        "got {err}"
    );
}

#[test]
fn array_indexing() {
    // A literal index hits the tuple-style field, exact type, no nullable.
    expect_expr_ty("['a', 'b'][0]", "String");
    expect_expr_ty("[1, 'a'][1]", "String");
    // Out of the literal range the lookup function answers.
    expect_expr_ty("['a'][3]", "String?");
}

#[test]
fn array_record_shape() {
    expect_expr_ty(
        "['']",
        "{0: String, []: Number -> String?, length: Number, \
         reduce: ((#a, String, Number) -> #a, #a) -> #a}",
    );
    // An empty array keeps its element quantified.
    expect_expr_ty(
        "[]",
        "{[]: Number -> #a?, length: Number, \
         reduce: ((#b, #a, Number) -> #b, #b) -> #b}",
    );
}

#[test]
fn reduce_over_an_array() {
    expect_ty(
        indoc! {"
            const xs = [1, 2, 3];
            return xs.reduce((acc, v, i) => acc + v + i, 0);
        "},
        "Number",
    );
}

#[test]
fn reduce_callback_arity_is_checked() {
    let err = expect_type_error("return [1, 2].reduce((acc, v) => acc + v, 0);");
    assert!(matches!(err, TypeError::BadCall { .. }), "got {err}");
}

#[test]
fn unknown_identifier() {
    let err = expect_type_error("return missing;");
    assert!(
        matches!(err, TypeError::UnknownIdentifier(name) if name == "missing"),
        "wrong error"
    );
}

#[test]
fn adding_non_numbers_fails() {
    for source in ["return 1 + 'a';", "return 1 + [];", "return 1 + {};"] {
        let err = expect_type_error(source);
        assert!(matches!(err, TypeError::BadCall { .. }), "for {source:?}");
    }
}

#[test]
fn calling_with_the_wrong_property_type_fails() {
    let err = expect_type_error(indoc! {"
        const f = a => a.x + a.y;
        return f({ x: 1, y: 'a' });
    "});
    let TypeError::BadCall { cause, .. } = err else {
        panic!("expected a call error, got {err}");
    };
    assert!(matches!(*cause, TypeError::TypeMismatch { .. }), "got {cause}");
}

#[test]
fn missing_properties_are_named() {
    let err = expect_type_error("return (obj => obj.x)({ y: 1 });");
    let TypeError::BadCall { cause, .. } = err else {
        panic!("expected a call error, got {err}");
    };
    match *cause {
        TypeError::MissingProperties { fields } => {
            assert_eq!(fields.len(), 1);
            assert_eq!(fields[0].0, "x");
        }
        other => panic!("expected missing properties, got {other}"),
    }
}

#[test]
fn self_application_is_an_infinite_type() {
    let err = expect_type_error("return f => f(f);");
    let TypeError::BadCall { cause, .. } = err else {
        panic!("expected a call error, got {err}");
    };
    assert!(matches!(*cause, TypeError::InfiniteType { .. }), "got {cause}");
}

#[test]
fn conditional_branches_must_agree() {
    let err = expect_type_error("return true ? 1 : 'one';");
    assert!(matches!(err, TypeError::TypeMismatch { .. }), "got {err}");
}

#[test]
fn conditional_test_must_be_boolean() {
    let err = expect_type_error("return 1 ? 'a' : 'b';");
    assert!(matches!(err, TypeError::TypeMismatch { .. }), "got {err}");
}

mod store_properties {
    use super::*;
    use crate::{unify, TypeVariables};

    /// Grow a store the only ways inference does: allocations and
    /// unifications, keeping the previous store when a unification fails.
    fn store_from_ops(ops: &[(u8, usize, usize)]) -> (Vec<crate::TyVar>, TypeVariables) {
        let mut vars = TypeVariables::new();
        let mut allocated = Vec::new();
        for &(op, i, j) in ops {
            match op % 4 {
                0 => {
                    let (var, next) = vars.alloc();
                    allocated.push(var);
                    vars = next;
                }
                1 if !allocated.is_empty() => {
                    let a = allocated[i % allocated.len()];
                    let b = allocated[j % allocated.len()];
                    if let Ok((_, _, next)) = unify(&Ty::Var(a), &Ty::Var(b), vars.clone()) {
                        vars = next;
                    }
                }
                2 if !allocated.is_empty() => {
                    let a = allocated[i % allocated.len()];
                    if let Ok((_, _, next)) = unify(&Ty::Var(a), &Ty::number(), vars.clone()) {
                        vars = next;
                    }
                }
                3 if allocated.len() >= 2 => {
                    let a = allocated[i % allocated.len()];
                    let b = allocated[j % allocated.len()];
                    let f = Ty::function(vec![Ty::Var(b), Ty::unit()]);
                    // The occurs check may refuse this; keep the old store.
                    if let Ok((_, _, next)) = unify(&Ty::Var(a), &f, vars.clone()) {
                        vars = next;
                    }
                }
                _ => {}
            }
        }
        (allocated, vars)
    }

    proptest! {
        #[test]
        fn prune_is_idempotent(ops in proptest::collection::vec(any::<(u8, usize, usize)>(), 1..48)) {
            let (allocated, vars) = store_from_ops(&ops);
            for var in allocated {
                let once = vars.prune(&Ty::Var(var));
                prop_assert_eq!(vars.prune(&once), once);
            }
        }

        #[test]
        fn unified_variables_share_a_representative(ops in proptest::collection::vec(any::<(u8, usize, usize)>(), 1..48)) {
            let (allocated, vars) = store_from_ops(&ops);
            for &var in &allocated {
                for &other in &allocated {
                    let (lhs, rhs) = (Ty::Var(var), Ty::Var(other));
                    if let Ok((_, _, after)) = unify(&lhs, &rhs, vars.clone()) {
                        prop_assert_eq!(after.prune(&lhs), after.prune(&rhs));
                    }
                }
            }
        }
    }
}
