// Prevent accidental debug output in library code; failures flow through
// `TypeError` values.
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]

//! Type unification and subtyping core for the FlowJIT compiler
//! front-end.
//!
//! FlowJIT compiles a statically-typed numeric language; this crate is
//! the part every other front-end component leans on: it decides whether
//! two type expressions can be reconciled into a single consistent type,
//! tracks type-variable bindings, and answers subtype and coercion
//! queries over the nominal constructor lattice. Overload resolution,
//! array broadcasting and exception dispatch are all clients of these
//! answers.
//!
//! # Module Organization
//!
//! - `types`: interned type expressions, substitutions, error taxonomy
//! - `lattice`: the nominal constructor tree, subtyping, join, decoration
//! - `unify`: structural unification with occurs check
//! - `promotion`: numeric coercion lattice and overload-ranking costs
//! - `scope`: scoped resolution of pre-parsed type names
//! - `registry`: process-scoped lattice and overlay registries
//! - `foreign`: mapping of C-level type descriptors into the core
//!
//! Unification and join never mutate their inputs; the only shared
//! mutable state is the pair of append-only registries in `registry`.

pub mod foreign;
pub mod lattice;
pub mod promotion;
pub mod registry;
pub mod scope;
pub mod types;
pub mod unify;

pub use lattice::{ConstructorId, Decoration, Lattice, LayoutEntry, MethodSig, TypeConstructor};
pub use registry::{CallableKey, Overlay, OverlayRegistry};
pub use scope::{resolve_raw, RawTypeExpr, Scope};
pub use types::{DisplayType, Substitution, TypeError, TypeId, TypeNode, TypeStore};
pub use unify::{unify, UnifyResult};
