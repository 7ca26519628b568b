//! Interned type expressions.
//!
//! `TypeStore` is the node arena for type expressions: every expression is
//! a `TypeNode` interned behind a `TypeId` handle. Interning deduplicates
//! structurally equal nodes, so structural equality of expressions
//! coincides with `TypeId` equality. The arena is append-only and a node's
//! argument handles always precede the node itself, which keeps the handle
//! graph acyclic; the occurs check and the free-variable walk rely on
//! this.
//!
//! A `TypeStore` is the working state of one compilation request.
//! Expressions are immutable once interned; substitution produces new
//! expressions and never mutates existing ones.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::lattice::ConstructorId;

/// Handle to an interned type expression within one `TypeStore`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeId(u32);

impl TypeId {
    /// Raw arena index, for debugging and cache serialization.
    pub fn index(self) -> u32 {
        self.0
    }
}

/// A type expression node.
///
/// Either a constructor application (possibly with an empty argument
/// list, e.g. a bare nominal type) or a free type variable. Two variable
/// nodes with the same symbol denote the same variable within one store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeNode {
    /// Constructor application: `Array[Int32, Dim]`, or bare `Int32`.
    Apply {
        ctor: ConstructorId,
        args: Vec<TypeId>,
    },
    /// Free type variable: `a`, `dtype`, ...
    Var(String),
}

/// A solved mapping from type-variable symbol to type expression.
///
/// Produced by unification. The unifier keeps every binding fully
/// resolved against the others, so a single substitution pass is a fixed
/// point: applying the substitution twice yields the same expression as
/// applying it once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    bindings: BTreeMap<String, TypeId>,
}

impl Substitution {
    pub fn new() -> Self {
        Self::default()
    }

    /// The binding for `symbol`, if any.
    pub fn get(&self, symbol: &str) -> Option<TypeId> {
        self.bindings.get(symbol).copied()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.bindings.contains_key(symbol)
    }

    /// Record a binding, replacing any previous binding for `symbol`.
    pub fn bind(&mut self, symbol: String, ty: TypeId) {
        self.bindings.insert(symbol, ty);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, TypeId)> {
        self.bindings.iter().map(|(symbol, &ty)| (symbol, ty))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Append-only arena of interned type expressions.
#[derive(Debug, Default)]
pub struct TypeStore {
    nodes: Vec<TypeNode>,
    interned: HashMap<TypeNode, TypeId>,
    /// Memoized lazy layout resolution, keyed by decorated constructor.
    /// Resolution is idempotent and pure given a fixed scope snapshot, so
    /// caching the first result is sound.
    layout_cache: HashMap<ConstructorId, BTreeMap<String, TypeId>>,
}

impl TypeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a node, returning the existing handle for a structurally
    /// equal node if one was interned before.
    pub fn intern(&mut self, node: TypeNode) -> TypeId {
        if let Some(&id) = self.interned.get(&node) {
            return id;
        }
        if let TypeNode::Apply { args, .. } = &node {
            // Arguments must already live in this arena; this is what
            // keeps the handle graph acyclic.
            debug_assert!(args.iter().all(|a| (a.0 as usize) < self.nodes.len()));
        }
        let id = TypeId(self.nodes.len() as u32);
        self.nodes.push(node.clone());
        self.interned.insert(node, id);
        id
    }

    /// Intern a constructor application.
    pub fn apply(&mut self, ctor: ConstructorId, args: Vec<TypeId>) -> TypeId {
        self.intern(TypeNode::Apply { ctor, args })
    }

    /// Intern a type variable.
    pub fn var(&mut self, symbol: impl Into<String>) -> TypeId {
        self.intern(TypeNode::Var(symbol.into()))
    }

    /// The node behind a handle.
    pub fn node(&self, id: TypeId) -> &TypeNode {
        &self.nodes[id.0 as usize]
    }

    /// Collect the free type-variable symbols of an expression.
    pub fn free_vars(&self, id: TypeId) -> BTreeSet<String> {
        let mut vars = BTreeSet::new();
        self.collect_free_vars(id, &mut vars);
        vars
    }

    fn collect_free_vars(&self, id: TypeId, vars: &mut BTreeSet<String>) {
        match self.node(id) {
            TypeNode::Var(symbol) => {
                vars.insert(symbol.clone());
            }
            TypeNode::Apply { args, .. } => {
                for &arg in args {
                    self.collect_free_vars(arg, vars);
                }
            }
        }
    }

    /// True if the expression contains no free type variables.
    pub fn is_concrete(&self, id: TypeId) -> bool {
        match self.node(id) {
            TypeNode::Var(_) => false,
            TypeNode::Apply { args, .. } => args.iter().all(|&arg| self.is_concrete(arg)),
        }
    }

    /// True if `symbol` occurs free in the expression.
    pub fn occurs(&self, symbol: &str, id: TypeId) -> bool {
        match self.node(id) {
            TypeNode::Var(s) => s == symbol,
            TypeNode::Apply { args, .. } => args.iter().any(|&arg| self.occurs(symbol, arg)),
        }
    }

    /// Apply a substitution to an expression, returning a new expression.
    ///
    /// Single structural pass: a bound variable is replaced by its binding
    /// as-is, without re-substituting into the binding. Callers that need
    /// a fully-resolved fixed point rely on the substitution's bindings
    /// being fully resolved at construction time (the unifier maintains
    /// this), or iterate on the output.
    pub fn substitute(&mut self, subst: &Substitution, id: TypeId) -> TypeId {
        match self.node(id).clone() {
            TypeNode::Var(symbol) => subst.get(&symbol).unwrap_or(id),
            TypeNode::Apply { ctor, args } => {
                if args.is_empty() {
                    return id;
                }
                let new_args: Vec<TypeId> = args
                    .iter()
                    .map(|&arg| self.substitute(subst, arg))
                    .collect();
                if new_args == args {
                    id
                } else {
                    self.apply(ctor, new_args)
                }
            }
        }
    }

    pub(crate) fn cached_layout(&self, ctor: ConstructorId) -> Option<&BTreeMap<String, TypeId>> {
        self.layout_cache.get(&ctor)
    }

    pub(crate) fn cache_layout(&mut self, ctor: ConstructorId, layout: BTreeMap<String, TypeId>) {
        self.layout_cache.insert(ctor, layout);
    }
}
