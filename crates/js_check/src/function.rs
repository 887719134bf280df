//! Function analysis: parameter binding, recursion through a provisional
//! signature, and generalization at the function boundary (this is the only
//! place polymorphism is introduced).

use log::debug;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use js_ast::{ExprId, FnBody, Param, Span, StmtId};
use js_ty::{FunctionTy, RecordTy, Ty, TyVar};

use crate::infer::{Infer, InferResult, InferState};
use crate::storage::TypeVariables;
use crate::unify::unify;
use crate::LocatedError;

/// A function body by reference; the top-level program is analysed as a
/// block body without being an `Expr` node.
pub(crate) enum FunctionBody<'a> {
    Expr(ExprId),
    Block(&'a [StmtId]),
}

impl<'a> From<&'a FnBody> for FunctionBody<'a> {
    fn from(body: &'a FnBody) -> Self {
        match body {
            FnBody::Expr(expr) => FunctionBody::Expr(*expr),
            FnBody::Block(stmts) => FunctionBody::Block(stmts),
        }
    }
}

impl Infer<'_> {
    pub(crate) fn analyse_function_like(
        &self,
        at: Span,
        name: Option<&SmolStr>,
        params: &[Param],
        body: FunctionBody<'_>,
        state: InferState,
    ) -> InferResult {
        let outer_env = state.env.clone();
        let outer_vars = state.vars.clone();

        let mut env = state.env;
        let mut vars = state.vars;

        let mut arg_types = Vec::with_capacity(params.len().max(1) + 1);
        for param in params {
            match param {
                Param::Ident(param_name) => {
                    let (var, next) = vars.alloc();
                    vars = next;
                    env = env.bind(param_name.clone(), Ty::Var(var));
                    arg_types.push(Ty::Var(var));
                }
                Param::Object(props) => {
                    // Each destructured key gets its own variable; the
                    // parameter itself is the record of those keys.
                    let mut fields = RecordTy::new();
                    for prop in props {
                        let (var, next) = vars.alloc();
                        vars = next;
                        fields = fields.insert(prop.key.clone(), Ty::Var(var));
                        env = env.bind(prop.binding.clone(), Ty::Var(var));
                    }
                    arg_types.push(Ty::Record(fields));
                }
            }
        }
        if arg_types.is_empty() {
            arg_types.push(Ty::unit());
        }

        // A named function sees a provisional signature of itself so
        // recursive calls constrain the result variable.
        let result_var = match name {
            Some(fn_name) => {
                let (var, next) = vars.alloc();
                vars = next;
                let mut types = arg_types.clone();
                types.push(Ty::Var(var));
                env = env.bind(fn_name.clone(), Ty::function(types));
                Some(var)
            }
            None => None,
        };

        let (body_ty, body_state) = match body {
            FunctionBody::Expr(expr) => self.analyse_expr(expr, InferState { env, vars })?,
            FunctionBody::Block(stmts) => self.analyse_block(stmts, InferState { env, vars })?,
        };
        let mut vars = body_state.vars;

        let result_ty = match result_var {
            Some(var) => {
                let (unified, _, next) = unify(&Ty::Var(var), &body_ty, vars)
                    .map_err(|error| LocatedError { error, span: at })?;
                vars = next;
                unified
            }
            None => body_ty,
        };

        let mut types = arg_types;
        types.push(result_ty);
        let fn_ty = generalize(Ty::function(types), &outer_vars, &vars);

        // Bindings made while analysing the body go out of scope, the store
        // does not.
        Ok((
            fn_ty,
            InferState {
                env: outer_env,
                vars,
            },
        ))
    }
}

/// Quantify the variables this function owns: those that prune to an
/// unbound variable, did not exist in the enclosing scope's store, and have
/// not leaked into a binding the enclosing scope can still see.
fn generalize(fn_ty: Ty, outer: &TypeVariables, vars: &TypeVariables) -> Ty {
    let pruned = vars.prune(&fn_ty);

    let mut replacements = FxHashMap::default();
    let mut bound_vars = Vec::new();
    for var in pruned.unbound_vars() {
        if outer.contains(var.id) {
            continue;
        }
        if vars.occurs_in_outer(var, outer) {
            continue;
        }
        let placeholder = TyVar::bound(bound_vars.len() as u32);
        replacements.insert(var, Ty::Var(placeholder));
        bound_vars.push(placeholder);
    }
    if replacements.is_empty() {
        return pruned;
    }
    debug!("generalizing {} variable(s) of {pruned}", bound_vars.len());

    match pruned.replace_vars(&replacements) {
        Ty::Function(f) => Ty::Function(FunctionTy {
            types: f.types,
            bound_vars,
        }),
        other => other,
    }
}
