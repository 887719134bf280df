//! Expression and statement inference: the dispatch over AST node kinds,
//! calls, operators and conditionals. Function analysis lives in
//! `function.rs`; member access and literal records/arrays in `member.rs`.

use js_ast::{Expr, ExprId, Module, Span, Stmt, StmtId};
use js_ty::Ty;
use smol_str::SmolStr;

use crate::builtins::binary_key;
use crate::env::Env;
use crate::fresh::fresh;
use crate::storage::TypeVariables;
use crate::unify::unify;
use crate::{LocatedError, TypeError};

pub(crate) struct Infer<'a> {
    pub(crate) module: &'a Module,
}

/// Everything a rule threads through: the scope's names and the shared
/// substitution store. The environment forks at scope boundaries, the store
/// only ever moves forward.
pub(crate) struct InferState {
    pub env: Env,
    pub vars: TypeVariables,
}

pub(crate) type InferResult = Result<(Ty, InferState), LocatedError>;

impl<'a> Infer<'a> {
    pub(crate) fn new(module: &'a Module) -> Self {
        Infer { module }
    }

    pub(crate) fn locate(&self, error: TypeError, at: ExprId) -> LocatedError {
        LocatedError {
            error,
            span: self.module.expr_span(at),
        }
    }

    pub(crate) fn analyse_expr(&self, id: ExprId, state: InferState) -> InferResult {
        match &self.module[id] {
            Expr::Number(_) => Ok((Ty::number(), state)),
            Expr::Str(_) => Ok((Ty::string(), state)),
            Expr::Bool(_) => Ok((Ty::boolean(), state)),
            Expr::Ident(name) => match state.env.lookup(name).cloned() {
                Some(ty) => Ok((ty, state)),
                None => Err(self.locate(TypeError::UnknownIdentifier(name.clone()), id)),
            },
            Expr::Function { name, params, body } => self.analyse_function_like(
                self.module.expr_span(id),
                name.as_ref(),
                params,
                body.into(),
                state,
            ),
            Expr::Call { callee, args } => {
                let (callee_ty, state) = self.analyse_expr(*callee, state)?;
                self.analyse_call(&callee_ty, self.module.expr_span(id), args, state)
            }
            Expr::Binary { op, lhs, rhs } => {
                let key = binary_key(*op);
                let Some(op_ty) = state.env.lookup(&key).cloned() else {
                    return Err(self.locate(
                        TypeError::UnsupportedOperator(SmolStr::from(op.symbol())),
                        id,
                    ));
                };
                self.analyse_call(&op_ty, self.module.expr_span(id), &[*lhs, *rhs], state)
            }
            Expr::Unary { op, operand } => {
                let Some(op_ty) = state.env.lookup(op.symbol()).cloned() else {
                    return Err(self.locate(
                        TypeError::UnsupportedOperator(SmolStr::from(op.symbol())),
                        id,
                    ));
                };
                self.analyse_call(&op_ty, self.module.expr_span(id), &[*operand], state)
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => self.analyse_conditional(id, *test, *consequent, *alternate, state),
            Expr::Object { properties } => self.analyse_object(id, properties, state),
            Expr::Array { elements } => self.analyse_array(elements, state),
            Expr::Member { object, property } => {
                self.analyse_member(id, *object, property, state)
            }
        }
    }

    /// Instantiate the callee, infer the arguments, and unify a candidate
    /// `(args...) -> result` signature against it. The call's type is the
    /// result slot of the unified candidate.
    pub(crate) fn analyse_call(
        &self,
        callee_ty: &Ty,
        at: Span,
        args: &[ExprId],
        state: InferState,
    ) -> InferResult {
        let (instantiated, vars) = fresh(callee_ty, state.vars);
        let mut state = InferState {
            env: state.env,
            vars,
        };

        let mut types = Vec::with_capacity(args.len() + 1);
        for arg in args {
            let (ty, next) = self.analyse_expr(*arg, state)?;
            types.push(ty);
            state = next;
        }
        if types.is_empty() {
            types.push(Ty::unit());
        }
        let (result_var, vars) = state.vars.alloc();
        types.push(Ty::Var(result_var));
        let candidate = Ty::function(types);

        match unify(&candidate, &instantiated, vars.clone()) {
            Ok((unified, _, vars)) => {
                let result = match &unified {
                    Ty::Function(f) => (*f.ret().0).clone(),
                    _ => Ty::Var(result_var),
                };
                Ok((
                    result,
                    InferState {
                        env: state.env,
                        vars,
                    },
                ))
            }
            Err(cause) => Err(LocatedError {
                error: TypeError::BadCall {
                    callee: Box::new(vars.prune(callee_ty)),
                    call: Box::new(vars.prune(&candidate)),
                    cause: Box::new(cause),
                },
                span: at,
            }),
        }
    }

    fn analyse_conditional(
        &self,
        id: ExprId,
        test: ExprId,
        consequent: ExprId,
        alternate: ExprId,
        state: InferState,
    ) -> InferResult {
        let (test_ty, state) = self.analyse_expr(test, state)?;
        let (_, _, vars) =
            unify(&test_ty, &Ty::boolean(), state.vars).map_err(|e| self.locate(e, test))?;

        // Both branches start from the same environment; the store keeps
        // threading so unifications in one branch stay visible.
        let branch_env = state.env;
        let (cons_ty, cons_state) = self.analyse_expr(
            consequent,
            InferState {
                env: branch_env.clone(),
                vars,
            },
        )?;
        let (alt_ty, alt_state) = self.analyse_expr(
            alternate,
            InferState {
                env: branch_env.clone(),
                vars: cons_state.vars,
            },
        )?;

        let (ty, _, vars) =
            unify(&cons_ty, &alt_ty, alt_state.vars).map_err(|e| self.locate(e, id))?;
        Ok((
            ty,
            InferState {
                env: branch_env,
                vars,
            },
        ))
    }

    pub(crate) fn analyse_stmt(&self, id: StmtId, state: InferState) -> InferResult {
        match &self.module[id] {
            Stmt::Expr(expr) => self.analyse_expr(*expr, state),
            Stmt::Return(Some(expr)) => self.analyse_expr(*expr, state),
            Stmt::Return(None) => Ok((Ty::unit(), state)),
            Stmt::Declaration(declarators) => {
                let mut state = state;
                for declarator in declarators {
                    let (ty, next) = self.analyse_expr(declarator.init, state)?;
                    state = InferState {
                        env: next.env.bind(declarator.name.clone(), ty),
                        vars: next.vars,
                    };
                }
                Ok((Ty::unit(), state))
            }
            Stmt::FunctionDecl { name, function } => {
                let (ty, state) = self.analyse_expr(*function, state)?;
                let env = state.env.bind(name.clone(), ty.clone());
                Ok((
                    ty,
                    InferState {
                        env,
                        vars: state.vars,
                    },
                ))
            }
        }
    }

    /// A block's type is the type of its first `return`; statements after it
    /// are still checked.
    pub(crate) fn analyse_block(&self, stmts: &[StmtId], state: InferState) -> InferResult {
        let mut state = state;
        let mut result = None;
        for stmt in stmts {
            let (ty, next) = self.analyse_stmt(*stmt, state)?;
            state = next;
            if result.is_none() && matches!(&self.module[*stmt], Stmt::Return(_)) {
                result = Some(ty);
            }
        }
        Ok((result.unwrap_or_else(Ty::unit), state))
    }
}
