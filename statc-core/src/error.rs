//! Compiler errors as values.
//!
//! Every pass reports failures through [`CompilerError`]; nothing in the
//! core writes to standard I/O. Semantic errors carry a structured kind and
//! the span of the offending node; `Fatal` marks invariant violations that
//! indicate a compiler bug rather than a user mistake.

use crate::ir::Operator;
use crate::types::{ReturnType, UnsizedType};
use crate::Span;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CompilerError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompilerError {
    #[error("Semantic error at {span}:\n{kind}")]
    Semantic { span: Span, kind: SemanticError },

    #[error("Internal compiler error: {0}. This is a bug in the compiler, please report it.")]
    Fatal(String),
}

impl CompilerError {
    pub fn semantic(span: Span, kind: SemanticError) -> Self {
        CompilerError::Semantic { span, kind }
    }

    /// The structured kind, when this is a semantic error.
    pub fn semantic_kind(&self) -> Option<&SemanticError> {
        match self {
            CompilerError::Semantic { kind, .. } => Some(kind),
            CompilerError::Fatal(_) => None,
        }
    }
}

/// The kinds of user-facing semantic diagnostics.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SemanticError {
    #[error("Identifier '{0}' is a reserved word and cannot be used")]
    IdentifierIsKeyword(String),

    #[error("Identifier '{0}' clashes with the model name")]
    IdentifierIsModelName(String),

    #[error("Identifier '{0}' clashes with a math library function name")]
    IdentifierIsMathLibName(String),

    #[error("Identifier '{0}' is already in use")]
    IdentifierInUse(String),

    #[error("Identifier '{0}' not in scope")]
    IdentifierNotInScope(String),

    #[error("Only vectors, row vectors, matrices and arrays may be indexed; found type {0}")]
    InvalidIndex(UnsizedType),

    #[error("Paths through this statement return incompatible types: {0} and {1}")]
    IllTypedIfReturnTypes(ReturnType, ReturnType),

    #[error("The branches of a ternary expression must have compatible types; condition has type {0}, branches have types {1} and {2}")]
    IllTypedTernaryIf(UnsizedType, UnsizedType, UnsizedType),

    #[error("Ill-typed arguments supplied to function '{name}'. Supplied types: ({supplied}).\nAvailable signatures:\n{available}")]
    IllTypedFunctionApp {
        name: String,
        supplied: String,
        available: String,
    },

    #[error("A returning function '{0}' was used where a non-returning statement call was expected")]
    IllTypedNRFunction(String),

    #[error("'{0}' cannot be used as a returning function here: it is not a function, or it returns void")]
    IllTypedNotAFunction(String),

    #[error("A returning function was expected but an undeclared identifier '{0}' was supplied")]
    IllTypedNoSuchFunction(String),

    #[error("Ill-typed arguments supplied to infix operator {0}: {1} and {2}")]
    IllTypedBinOp(Operator, UnsizedType, UnsizedType),

    #[error("Ill-typed argument supplied to prefix operator {0}: {1}")]
    IllTypedPrefixOp(Operator, UnsizedType),

    #[error("Ill-typed argument supplied to postfix operator {0}: {1}")]
    IllTypedPostfixOp(Operator, UnsizedType),

    #[error("The function '{0}' passed to map_rect may not carry a _lp, _rng or _lpdf family suffix")]
    FnMapRect(String),

    #[error("Conditional-distribution application is only allowed in the model block or in functions with the _lp suffix")]
    FnConditioning,

    #[error("Target can only be accessed in the model block or in definitions of functions with the _lp suffix")]
    FnTargetPlusEquals,

    #[error("Random number generators are only allowed in transformed data, generated quantities, or functions with the _rng suffix")]
    FnRng,

    // The kinds below complete the diagnostic set for rules the structured
    // list above cannot express.
    #[error("Break statements may only be used inside loops")]
    BreakOutsideLoop,

    #[error("Continue statements may only be used inside loops")]
    ContinueOutsideLoop,

    #[error("A function declared to return {1} cannot return {0}")]
    InvalidReturnType(ReturnType, ReturnType),

    #[error("Return statements may only be used inside function definitions")]
    ReturnOutsideFunction,

    #[error("Some paths through this function body do not end in a return statement")]
    IncompleteReturn,

    #[error("Bounds of an integer variable must be of type int; found type {0}")]
    NonIntegerDeclBounds(UnsizedType),

    #[error("(Transformed) parameters cannot contain integers; found type {0}")]
    IntParameterNotAllowed(UnsizedType),

    #[error("Cannot assign to '{0}': function arguments and loop variables are read only")]
    CannotAssignReadOnly(String),

    #[error("Cannot assign to '{0}': it was declared in a previous block")]
    CannotAssignCrossBlock(String),

    #[error("Variable sizes must be expressible in the data or transformed data block")]
    NonDataSize,

    #[error("Function '{0}' has already been defined, or its definition does not match its declaration")]
    FunDefMismatch(String),

    #[error("Sampling notation is not allowed for cumulative distribution functions; use '{0}' as an ordinary call instead")]
    CdfSampling(String),

    #[error("Ill-typed assignment: cannot assign a value of type {1} to a target of type {0}")]
    IllTypedAssignment(UnsizedType, UnsizedType),

    #[error("Indexes must be of type int or int[]; found type {0}")]
    NonIntIndex(UnsizedType),

    #[error("Conditions must be of type int or real; found type {0}")]
    IllTypedCondition(UnsizedType),

    #[error("Loop bounds must be of type int; found type {0}")]
    NonIntLoopBound(UnsizedType),

    #[error("Variable sizes must be of type int; found type {0}")]
    NonIntSize(UnsizedType),

    #[error("Expressions of type {0} cannot be added to the target; expected a scalar or container of reals")]
    IllTypedTargetPlusEq(UnsizedType),
}

/// Construct a semantic [`CompilerError`] at a span.
#[macro_export]
macro_rules! err_sem {
    ($span:expr, $kind:expr) => {
        $crate::error::CompilerError::semantic($span.clone(), $kind)
    };
}

/// Return early with a semantic error at a span.
#[macro_export]
macro_rules! bail_sem {
    ($span:expr, $kind:expr) => {
        return Err($crate::err_sem!($span, $kind))
    };
}

/// Construct a fatal internal error from a format string.
#[macro_export]
macro_rules! err_fatal {
    ($($arg:tt)*) => {
        $crate::error::CompilerError::Fatal(format!($($arg)*))
    };
}

/// Return early with a fatal internal error.
#[macro_export]
macro_rules! bail_fatal {
    ($($arg:tt)*) => {
        return Err($crate::err_fatal!($($arg)*))
    };
}
