use std::fmt;

/// Atomic types. `Unit` stands in for the parameter/argument slot of
/// zero-arity functions and calls so that arities always line up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveTy {
    Unit,
    Number,
    String,
    Boolean,
}

impl fmt::Display for PrimitiveTy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveTy::Unit => write!(f, "()"),
            PrimitiveTy::Number => write!(f, "Number"),
            PrimitiveTy::String => write!(f, "String"),
            PrimitiveTy::Boolean => write!(f, "Boolean"),
        }
    }
}
