//! Phase-two constructor decoration: layout and method tables.
//!
//! Type definition happens in two explicit phases so that nothing depends
//! on declaration order:
//!
//! 1. `Lattice::register` places the bare constructor and its parent edge
//!    into the lattice.
//! 2. `Lattice::decorate` (run once the full declaring scope is available)
//!    attaches the field layout, the method table and the captured scope.
//!
//! Layout entries may arrive pre-parsed but unresolved (`Foo[a]` referring
//! to a class in the declaring module); they are resolved lazily on first
//! access and the result is memoized in the store.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::scope::{resolve_raw, RawTypeExpr, Scope};
use crate::types::{Substitution, TypeError, TypeId, TypeStore};

use super::{ConstructorId, Lattice};

/// A layout field's type: resolved on first access and cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LayoutEntry {
    /// Pre-parsed but not yet resolved against the declaring scope.
    Unresolved(RawTypeExpr),
    /// Already an interned type expression.
    Resolved(TypeId),
}

/// A method's callable type signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSig {
    pub arg_types: Vec<TypeId>,
    pub result: TypeId,
}

/// Phase-two decoration of a type constructor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Decoration {
    /// Field name → field type.
    pub layout: BTreeMap<String, LayoutEntry>,
    /// Method name → callable signature.
    pub fields: BTreeMap<String, MethodSig>,
    /// Scope snapshot of the declaring module, captured at decoration
    /// time; unresolved layout entries resolve against it.
    pub scope: Scope,
}

impl Lattice {
    /// Attach layout, methods and the declaring scope to a constructor.
    ///
    /// Every method signature is verified: a result type may only
    /// reference type variables bound by the constructor's parameters or
    /// by the argument types. Decorating the same constructor twice is an
    /// error (decoration, like registration, is append-only).
    pub fn decorate(
        &mut self,
        store: &TypeStore,
        ctor: ConstructorId,
        decoration: Decoration,
    ) -> Result<(), TypeError> {
        if self.get(ctor).decoration.is_some() {
            return Err(TypeError::DuplicateConstructor(self.get(ctor).name.clone()));
        }
        for sig in decoration.fields.values() {
            self.verify_method_signature(store, ctor, sig)?;
        }
        self.ctors[ctor.index() as usize].decoration = Some(decoration);
        Ok(())
    }

    /// The decoration of a constructor, if phase two has run.
    pub fn decoration(&self, ctor: ConstructorId) -> Option<&Decoration> {
        self.get(ctor).decoration.as_ref()
    }

    /// The layout of `ctor` with every entry resolved to an interned type.
    ///
    /// Unresolved entries are resolved against the scope captured at
    /// decoration time; the result is memoized in the store (resolution
    /// is idempotent and pure given the scope snapshot). An undecorated
    /// constructor has an empty layout.
    pub fn resolved_layout(
        &self,
        store: &mut TypeStore,
        ctor: ConstructorId,
    ) -> Result<BTreeMap<String, TypeId>, TypeError> {
        if let Some(cached) = store.cached_layout(ctor) {
            return Ok(cached.clone());
        }
        let decoration = match self.get(ctor).decoration.as_ref() {
            Some(decoration) => decoration,
            None => return Ok(BTreeMap::new()),
        };
        let mut resolved = BTreeMap::new();
        for (field, entry) in &decoration.layout {
            let ty = match entry {
                LayoutEntry::Resolved(ty) => *ty,
                LayoutEntry::Unresolved(raw) => resolve_raw(
                    store,
                    self,
                    &decoration.scope,
                    &Substitution::new(),
                    raw,
                )?,
            };
            resolved.insert(field.clone(), ty);
        }
        store.cache_layout(ctor, resolved.clone());
        Ok(resolved)
    }

    /// Verify a method signature in the context of its defining type:
    /// every free variable of the result type must be bound by the type's
    /// parameters or occur in the argument types.
    pub fn verify_method_signature(
        &self,
        store: &TypeStore,
        ctor: ConstructorId,
        sig: &MethodSig,
    ) -> Result<(), TypeError> {
        let mut bound: BTreeSet<String> = self.get(ctor).params.iter().cloned().collect();
        for &arg in &sig.arg_types {
            bound.extend(store.free_vars(arg));
        }
        for var in store.free_vars(sig.result) {
            if !bound.contains(&var) {
                return Err(TypeError::UnboundTypeVariable { var });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn array_lattice() -> (Lattice, ConstructorId) {
        let mut lattice = Lattice::new();
        let root = lattice.root();
        let array = lattice.register("Array", &["dtype", "dims"], root).unwrap();
        (lattice, array)
    }

    #[test]
    fn test_resolved_layout_resolves_against_captured_scope() {
        let (mut lattice, array) = array_lattice();
        let root = lattice.root();
        let buffer = lattice.register("Buffer", &["dtype"], root).unwrap();
        let mut store = TypeStore::new();

        let mut scope = Scope::new();
        scope.define("Buffer", buffer);

        let mut layout = BTreeMap::new();
        layout.insert(
            "data".to_string(),
            LayoutEntry::Unresolved(RawTypeExpr::Apply(
                "Buffer".to_string(),
                vec![RawTypeExpr::Var("dtype".to_string())],
            )),
        );
        lattice
            .decorate(
                &store,
                array,
                Decoration {
                    layout,
                    fields: BTreeMap::new(),
                    scope,
                },
            )
            .unwrap();

        let resolved = lattice.resolved_layout(&mut store, array).unwrap();
        let dtype = store.var("dtype");
        let expected = store.apply(buffer, vec![dtype]);
        assert_eq!(resolved.get("data"), Some(&expected));

        // Second access hits the memo and yields the same mapping.
        let again = lattice.resolved_layout(&mut store, array).unwrap();
        assert_eq!(resolved, again);
    }

    #[test]
    fn test_decorate_twice_is_an_error() {
        let (mut lattice, array) = array_lattice();
        let store = TypeStore::new();
        lattice
            .decorate(&store, array, Decoration::default())
            .unwrap();
        let err = lattice
            .decorate(&store, array, Decoration::default())
            .unwrap_err();
        assert_eq!(err, TypeError::DuplicateConstructor("Array".to_string()));
    }

    #[test]
    fn test_method_result_must_be_bound() {
        let (mut lattice, array) = array_lattice();
        let mut store = TypeStore::new();

        let dtype = store.var("dtype");
        let stray = store.var("q");
        let ok = MethodSig {
            arg_types: vec![dtype],
            result: dtype,
        };
        let bad = MethodSig {
            arg_types: vec![dtype],
            result: stray,
        };

        assert!(lattice.verify_method_signature(&store, array, &ok).is_ok());
        assert_eq!(
            lattice.verify_method_signature(&store, array, &bad),
            Err(TypeError::UnboundTypeVariable {
                var: "q".to_string()
            })
        );
    }

    #[test]
    fn test_binding_for_zips_params_with_args() {
        let (lattice, array) = array_lattice();
        let mut store = TypeStore::new();
        let int32 = store.apply(lattice.lookup("Int32").unwrap(), Vec::new());
        let dim = store.var("n");

        let bound = lattice.binding_for(array, &[int32, dim]).unwrap();
        assert_eq!(bound.get("dtype"), Some(int32));
        assert_eq!(bound.get("dims"), Some(dim));

        let err = lattice.binding_for(array, &[int32]).unwrap_err();
        assert!(matches!(err, TypeError::ArityMismatch { .. }));
    }
}
