//! Error types for the typing core.

use thiserror::Error;

/// Failures surfaced by the typing core.
///
/// Each kind is distinct and inspectable so that callers can react
/// per-kind: overload resolution catches `CoercionFailure` and
/// `ConstructorMismatch` to try the next candidate, while every other
/// kind propagates as a hard failure of the enclosing compilation.
/// Type operands are carried pre-rendered (`Array[Int32, Dim]` style)
/// because a `TypeId` is meaningless without its store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// A bare type name resolved neither in scope nor in the builtin table.
    #[error("type constructor `{0}` is not in the current scope")]
    UnknownTypeName(String),

    /// A method signature's result type references a type variable not
    /// bound by the type parameters or the argument types.
    #[error("type variable `{var}` is not bound by the type or argument types")]
    UnboundTypeVariable { var: String },

    /// Unification would bind a variable to an expression containing itself.
    #[error("occurs check failed: `{var}` occurs in `{ty}`")]
    OccursCheck { var: String, ty: String },

    /// Two constructor applications carry differing argument counts.
    #[error("arity mismatch: `{left}` has {left_arity} argument(s), `{right}` has {right_arity}")]
    ArityMismatch {
        left: String,
        right: String,
        left_arity: usize,
        right_arity: usize,
    },

    /// Two constructor applications are unrelated and non-coercible.
    #[error("cannot unify `{left}` with `{right}`")]
    ConstructorMismatch { left: String, right: String },

    /// A concrete-mode unification result still contains free variables.
    #[error("result type still has free variables: `{ty}`")]
    UnresolvedFreeVariables { ty: String },

    /// No promotion path exists between two concrete types.
    #[error("cannot coerce `{src}` to `{dst}`")]
    CoercionFailure { src: String, dst: String },

    /// A host callable was registered in the overlay registry twice.
    #[error("overlay already registered for callable {0}")]
    DuplicateOverlayRegistration(String),

    /// A foreign type descriptor has no mapping into the core vocabulary.
    #[error("unsupported foreign type: {0}")]
    UnsupportedForeignType(String),

    /// A constructor name was registered (or decorated) twice.
    #[error("type constructor `{0}` is already registered")]
    DuplicateConstructor(String),
}
