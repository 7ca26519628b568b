//! Nominal type-constructor lattice.
//!
//! Type constructors are named nominal type formers arranged in a
//! single-rooted tree via a `parent` edge. The tree defines the subtyping
//! partial order used by method dispatch, exception matching, and the
//! unification engine.
//!
//! The builtin bootstrap mirrors the numeric tower of the language:
//! ```text
//! Object
//!  ├── Number
//!  │    ├── Int
//!  │    │    ├── Int8, Int16, Int32, Int64 (concrete)
//!  │    │    └── UInt8, UInt16, UInt32, UInt64 (concrete)
//!  │    ├── Float
//!  │    │    └── Float32, Float64 (concrete)
//!  │    └── Complex
//!  │         └── Complex64, Complex128 (concrete)
//!  ├── Bool, Char, Void, String
//!  ├── Pointer[base]
//!  ├── Function, ForeignFunction (variadic argument lists)
//!  ├── Type[instance]
//!  └── Exception
//! ```
//!
//! Constructors are registered once, at type-definition time, and are
//! immutable afterwards apart from the explicit two-phase decoration step
//! (see `decorate`). The table is append-only: no deletion, no re-parenting.
//!
//! # Sub-modules
//!
//! - `ops`: subtype checking and nearest-common-ancestor join
//! - `decorate`: phase-two layout/method decoration and lazy resolution

mod decorate;
mod ops;

pub use decorate::{Decoration, LayoutEntry, MethodSig};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{Substitution, TypeError, TypeId};

/// Handle to a registered type constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstructorId(u32);

impl ConstructorId {
    /// Raw table index, for debugging and cache serialization.
    pub fn index(self) -> u32 {
        self.0
    }
}

/// A named nominal type former with a fixed place in the subtype tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeConstructor {
    pub name: String,
    /// Ordered formal type-parameter symbols, e.g. `["dtype", "dims"]`.
    pub params: Vec<String>,
    /// True for constructors applied to argument lists of any length
    /// (function types carry their full argument list positionally).
    pub variadic: bool,
    /// Immediate supertype; `None` only for the root `Object`.
    pub parent: Option<ConstructorId>,
    /// Phase-two decoration (layout, methods, declaring scope).
    #[serde(default)]
    pub(crate) decoration: Option<Decoration>,
}

/// Append-only table of type constructors forming the subtype tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lattice {
    ctors: Vec<TypeConstructor>,
    by_name: HashMap<String, ConstructorId>,
}

impl Lattice {
    /// A fresh lattice with the builtin constructors pre-registered.
    pub fn new() -> Self {
        let mut lattice = Lattice {
            ctors: Vec::new(),
            by_name: HashMap::new(),
        };
        let object = lattice.insert("Object", &[], false, None);

        let number = lattice.insert("Number", &[], false, Some(object));
        let int = lattice.insert("Int", &[], false, Some(number));
        for name in ["Int8", "Int16", "Int32", "Int64"] {
            lattice.insert(name, &[], false, Some(int));
        }
        for name in ["UInt8", "UInt16", "UInt32", "UInt64"] {
            lattice.insert(name, &[], false, Some(int));
        }
        let float = lattice.insert("Float", &[], false, Some(number));
        lattice.insert("Float32", &[], false, Some(float));
        lattice.insert("Float64", &[], false, Some(float));
        let complex = lattice.insert("Complex", &[], false, Some(number));
        lattice.insert("Complex64", &[], false, Some(complex));
        lattice.insert("Complex128", &[], false, Some(complex));

        lattice.insert("Bool", &[], false, Some(object));
        lattice.insert("Char", &[], false, Some(object));
        lattice.insert("Void", &[], false, Some(object));
        lattice.insert("String", &[], false, Some(object));
        lattice.insert("Pointer", &["base"], false, Some(object));
        lattice.insert("Function", &[], true, Some(object));
        lattice.insert("ForeignFunction", &[], true, Some(object));
        lattice.insert("Type", &["instance"], false, Some(object));
        lattice.insert("Exception", &[], false, Some(object));

        lattice
    }

    /// The universal root constructor (`Object`).
    pub fn root(&self) -> ConstructorId {
        ConstructorId(0)
    }

    /// Register a user-defined constructor under `parent`.
    ///
    /// Registration is append-only; a second registration of the same name
    /// is an error, never a silent replacement.
    pub fn register(
        &mut self,
        name: &str,
        params: &[&str],
        parent: ConstructorId,
    ) -> Result<ConstructorId, TypeError> {
        if self.by_name.contains_key(name) {
            return Err(TypeError::DuplicateConstructor(name.to_string()));
        }
        Ok(self.insert(name, params, false, Some(parent)))
    }

    fn insert(
        &mut self,
        name: &str,
        params: &[&str],
        variadic: bool,
        parent: Option<ConstructorId>,
    ) -> ConstructorId {
        let id = ConstructorId(self.ctors.len() as u32);
        self.ctors.push(TypeConstructor {
            name: name.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
            variadic,
            parent,
            decoration: None,
        });
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Look a constructor up by name.
    pub fn lookup(&self, name: &str) -> Option<ConstructorId> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, id: ConstructorId) -> &TypeConstructor {
        &self.ctors[id.0 as usize]
    }

    pub fn constructor_count(&self) -> usize {
        self.ctors.len()
    }

    /// Iterate over all registered constructors.
    pub fn constructors(&self) -> impl Iterator<Item = (ConstructorId, &TypeConstructor)> {
        self.ctors
            .iter()
            .enumerate()
            .map(|(i, ctor)| (ConstructorId(i as u32), ctor))
    }

    /// The substitution binding a constructor's formal parameters to the
    /// argument types of a concrete application.
    ///
    /// E.g. for `Array` with params `["dtype", "dims"]` applied to
    /// `[Int32, Dim]`, this yields `{dtype: Int32, dims: Dim}`.
    pub fn binding_for(
        &self,
        ctor: ConstructorId,
        args: &[TypeId],
    ) -> Result<Substitution, TypeError> {
        let tc = self.get(ctor);
        if !tc.variadic && args.len() != tc.params.len() {
            return Err(TypeError::ArityMismatch {
                left: tc.name.clone(),
                right: format!("{} argument list", tc.name),
                left_arity: tc.params.len(),
                right_arity: args.len(),
            });
        }
        let mut bound = Substitution::new();
        for (param, &arg) in tc.params.iter().zip(args.iter()) {
            bound.bind(param.clone(), arg);
        }
        Ok(bound)
    }
}

impl Default for Lattice {
    fn default() -> Self {
        Self::new()
    }
}
