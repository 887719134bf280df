//! The global environment: operator signatures.
//!
//! Binary operators live under parenthesized keys (`"(+)"`) and unary
//! operators under their bare symbol, so `-` can be both without clashing.

use js_ast::BinaryOp;
use js_ty::{FunctionTy, Ty, TyVar};
use smol_str::SmolStr;

use crate::env::Env;

pub(crate) fn binary_key(op: BinaryOp) -> SmolStr {
    SmolStr::from(format!("({})", op.symbol()))
}

pub(crate) fn global_env() -> Env {
    let arith = || Ty::function(vec![Ty::number(), Ty::number(), Ty::number()]);
    let compare = || Ty::function(vec![Ty::number(), Ty::number(), Ty::boolean()]);
    let logical = || Ty::function(vec![Ty::boolean(), Ty::boolean(), Ty::boolean()]);
    // Equality is polymorphic but requires both sides to agree.
    let equality = || {
        let a = TyVar::bound(0);
        Ty::Function(FunctionTy::new(
            vec![Ty::Var(a), Ty::Var(a), Ty::boolean()],
            vec![a],
        ))
    };
    let not = {
        let a = TyVar::bound(0);
        Ty::Function(FunctionTy::new(vec![Ty::Var(a), Ty::boolean()], vec![a]))
    };

    [
        ("(+)", arith()),
        ("(-)", arith()),
        ("(*)", arith()),
        ("(/)", arith()),
        ("(%)", arith()),
        ("(<)", compare()),
        ("(>)", compare()),
        ("(<=)", compare()),
        ("(>=)", compare()),
        ("(==)", equality()),
        ("(!=)", equality()),
        ("(===)", equality()),
        ("(!==)", equality()),
        ("(&&)", logical()),
        ("(||)", logical()),
        ("!", not),
        ("-", Ty::function(vec![Ty::number(), Ty::number()])),
    ]
    .into_iter()
    .map(|(name, ty)| (SmolStr::new_static(name), ty))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_keys_are_parenthesized() {
        assert_eq!(binary_key(BinaryOp::Add), "(+)");
        assert_eq!(binary_key(BinaryOp::StrictEq), "(===)");
    }

    #[test]
    fn both_minus_operators_coexist() {
        let env = global_env();
        assert_eq!(
            env.lookup("(-)").map(Ty::to_string),
            Some("(Number, Number) -> Number".to_string())
        );
        assert_eq!(
            env.lookup("-").map(Ty::to_string),
            Some("Number -> Number".to_string())
        );
    }
}
