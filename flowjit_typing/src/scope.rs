//! Scoped type-name resolution.
//!
//! A parsed signature or layout entry refers to types by bare name
//! (`"Foo"`, `"Buffer[dtype]"`). Resolution maps those names against the
//! lexical scope the declaration appeared in, falling back to a small
//! fixed builtin table. Scope wins over the builtin table, so a module
//! may shadow a builtin constructor with its own definition.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::lattice::{ConstructorId, Lattice};
use crate::types::{Substitution, TypeError, TypeId, TypeStore};

/// Builtin constructor names resolvable without any scope entry.
pub const BUILTIN_TYPE_NAMES: [&str; 6] = ["Function", "Pointer", "Bool", "Int", "Float", "Void"];

/// A lexical environment snapshot: name → defining constructor.
///
/// `resolve` returns `None` for absent names and never fails.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scope {
    bindings: HashMap<String, ConstructorId>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// A scope pre-binding every constructor currently in the lattice,
    /// the shape of a module that imports the whole type prelude.
    pub fn prelude(lattice: &Lattice) -> Self {
        let mut scope = Scope::new();
        for (id, ctor) in lattice.constructors() {
            scope.define(&ctor.name, id);
        }
        scope
    }

    pub fn define(&mut self, name: &str, ctor: ConstructorId) {
        self.bindings.insert(name.to_string(), ctor);
    }

    pub fn resolve(&self, name: &str) -> Option<ConstructorId> {
        self.bindings.get(name).copied()
    }
}

/// A pre-parsed textual type expression, not yet resolved to constructors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawTypeExpr {
    /// Bare constructor name: `"Int32"`, `"Foo"`.
    Name(String),
    /// Type variable: `"a"`, `"dtype"`.
    Var(String),
    /// Application: `"Buffer[dtype]"`, `"Array[Int32, n]"`.
    Apply(String, Vec<RawTypeExpr>),
}

fn lookup_builtin_type(lattice: &Lattice, name: &str) -> Option<ConstructorId> {
    if BUILTIN_TYPE_NAMES.contains(&name) {
        lattice.lookup(name)
    } else {
        None
    }
}

fn resolve_name(
    lattice: &Lattice,
    scope: &Scope,
    name: &str,
) -> Result<ConstructorId, TypeError> {
    scope
        .resolve(name)
        .or_else(|| lookup_builtin_type(lattice, name))
        .ok_or_else(|| TypeError::UnknownTypeName(name.to_string()))
}

/// Resolve a pre-parsed type in `scope`, substituting enclosing
/// type-parameter bindings from `bound`.
///
/// Names resolve in the scope first and in the builtin table second; an
/// unresolved name is a hard error. Variables not present in `bound` stay
/// free. An application's argument count must match the constructor's
/// formal parameters (bare nominal uses are always allowed).
pub fn resolve_raw(
    store: &mut TypeStore,
    lattice: &Lattice,
    scope: &Scope,
    bound: &Substitution,
    raw: &RawTypeExpr,
) -> Result<TypeId, TypeError> {
    match raw {
        RawTypeExpr::Name(name) => {
            let ctor = resolve_name(lattice, scope, name)?;
            Ok(store.apply(ctor, Vec::new()))
        }
        RawTypeExpr::Var(symbol) => match bound.get(symbol) {
            Some(ty) => Ok(ty),
            None => Ok(store.var(symbol.clone())),
        },
        RawTypeExpr::Apply(name, raw_args) => {
            let ctor = resolve_name(lattice, scope, name)?;
            let args = raw_args
                .iter()
                .map(|raw_arg| resolve_raw(store, lattice, scope, bound, raw_arg))
                .collect::<Result<Vec<_>, _>>()?;
            let tc = lattice.get(ctor);
            if !tc.variadic && !args.is_empty() && args.len() != tc.params.len() {
                return Err(TypeError::ArityMismatch {
                    left: tc.name.clone(),
                    right: format!("{}[..]", tc.name),
                    left_arity: tc.params.len(),
                    right_arity: args.len(),
                });
            }
            Ok(store.apply(ctor, args))
        }
    }
}
