//! Hindley-Milner type inference for a JavaScript subset.
//!
//! The engine infers principal types without annotations: let-polymorphism
//! at function boundaries, row-grown record types for object use, and a
//! value-threaded substitution store ([`TypeVariables`]) instead of mutable
//! unification cells. The public entry point is [`analyse_source`].

use smol_str::SmolStr;
use thiserror::Error;

use js_ast::{Module, Span};

mod builtins;
mod diagnostic;
mod env;
mod fresh;
mod function;
mod infer;
mod member;
mod storage;
mod unify;

#[cfg(test)]
mod tests;

pub use diagnostic::Report;
pub use env::Env;
pub use fresh::fresh;
pub use js_ast::{parse, ParseError};
pub use js_ty::{FunctionTy, PrimitiveTy, RecordTy, Ty, TyVar};
pub use storage::TypeVariables;
pub use unify::unify;

use crate::builtins::global_env;
use crate::function::FunctionBody;
use crate::infer::{Infer, InferState};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TypeError {
    #[error("unknown identifier `{0}`")]
    UnknownIdentifier(SmolStr),

    #[error("unsupported operator `{0}`")]
    UnsupportedOperator(SmolStr),

    #[error("cannot construct the infinite type `{var}` ~ `{ty}`")]
    InfiniteType { var: Box<Ty>, ty: Box<Ty> },

    #[error("type mismatch: `{left}` is not `{right}`")]
    TypeMismatch { left: Box<Ty>, right: Box<Ty> },

    #[error("record is missing {}", format_missing(.fields))]
    MissingProperties { fields: Vec<(SmolStr, Ty)> },

    #[error("`{callee}` cannot be called as `{call}`: {cause}")]
    BadCall {
        callee: Box<Ty>,
        call: Box<Ty>,
        cause: Box<TypeError>,
    },

    #[error("dynamic property access on a record with only static fields")]
    UnsupportedDynamicAccess,
}

fn format_missing(fields: &[(SmolStr, Ty)]) -> String {
    let mut out = String::new();
    if fields.len() == 1 {
        out.push_str("property ");
    } else {
        out.push_str("properties ");
    }
    for (i, (name, ty)) in fields.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&format!("`{name}: {ty}`"));
    }
    out
}

/// A type error paired with the source span it was detected at. The span is
/// attached at the point of detection and travels unchanged to the
/// diagnostic boundary.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{error}")]
pub struct LocatedError {
    pub error: TypeError,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalyseError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Type(#[from] LocatedError),
}

impl AnalyseError {
    pub fn span(&self) -> Span {
        match self {
            AnalyseError::Parse(e) => e.span(),
            AnalyseError::Type(e) => e.span,
        }
    }
}

/// Infer the principal type of a source program.
///
/// The statement list is treated as the body of an immediately invoked
/// zero-parameter function, so a top-level `return` decides the program's
/// type and the result is fully generalized before being instantiated once.
pub fn analyse_source(source: &str) -> Result<Ty, AnalyseError> {
    let module = js_ast::parse(source)?;
    Ok(analyse_module(&module)?)
}

/// Same as [`analyse_source`], starting from an already parsed module.
pub fn analyse_module(module: &Module) -> Result<Ty, LocatedError> {
    let infer = Infer::new(module);
    let state = InferState {
        env: global_env(),
        vars: TypeVariables::new(),
    };

    let (main_ty, state) =
        infer.analyse_function_like(module.span, None, &[], FunctionBody::Block(&module.body), state)?;
    let (result_ty, state) = infer.analyse_call(&main_ty, module.span, &[], state)?;

    Ok(state.vars.prune(&result_ty))
}
