//! Structural unification over type expressions.
//!
//! `unify` solves an ordered sequence of equality constraints between
//! type expressions, producing one resolved expression per constraint and
//! the accumulated substitution. Constraints are processed left to right;
//! order may affect which error is reported first, but not the solution
//! of a consistent constraint set.
//!
//! The engine is the classic unification-with-occurs-check: the
//! constraint language includes recursive structural types (generic
//! containers parameterized by element type), and without the occurs
//! check the engine could silently construct or loop on an infinite
//! type. Every new binding is folded into the existing bindings, so the
//! substitution's bindings are always fully resolved and a single
//! substitution pass is a fixed point.

use crate::lattice::{ConstructorId, Lattice};
use crate::types::{Substitution, TypeError, TypeId, TypeNode, TypeStore};

/// Outcome of a successful unification.
#[derive(Debug, Clone)]
pub struct UnifyResult {
    /// One resolved expression per input constraint.
    pub resolved: Vec<TypeId>,
    /// The solved variable bindings (fully resolved, idempotent).
    pub substitution: Substitution,
}

/// Unify an ordered sequence of `(left, right)` equality constraints.
///
/// With `require_concrete`, a result expression that still contains free
/// variables after solving is an error; callers that support polymorphic
/// results pass `false`.
///
/// # Examples
/// ```
/// use flowjit_typing::{unify, Lattice, TypeStore};
///
/// let lattice = Lattice::new();
/// let mut store = TypeStore::new();
/// let a = store.var("a");
/// let int32 = store.apply(lattice.lookup("Int32").unwrap(), Vec::new());
///
/// let result = unify(&mut store, &lattice, &[(a, int32)], true).unwrap();
/// assert_eq!(result.resolved, vec![int32]);
/// assert_eq!(result.substitution.get("a"), Some(int32));
/// ```
pub fn unify(
    store: &mut TypeStore,
    lattice: &Lattice,
    constraints: &[(TypeId, TypeId)],
    require_concrete: bool,
) -> Result<UnifyResult, TypeError> {
    let mut unifier = Unifier {
        store,
        lattice,
        subst: Substitution::new(),
    };
    let mut resolved = Vec::with_capacity(constraints.len());
    for &(left, right) in constraints {
        resolved.push(unifier.unify_pair(left, right)?);
    }
    // Later constraints may have bound variables appearing in earlier
    // results; resolve everything through the final substitution.
    let mut fully_resolved = Vec::with_capacity(resolved.len());
    for ty in resolved {
        fully_resolved.push(unifier.store.substitute(&unifier.subst, ty));
    }
    let resolved = fully_resolved;

    if require_concrete {
        for &ty in &resolved {
            if !unifier.store.is_concrete(ty) {
                return Err(TypeError::UnresolvedFreeVariables {
                    ty: unifier.render(ty),
                });
            }
        }
    }

    Ok(UnifyResult {
        resolved,
        substitution: unifier.subst,
    })
}

struct Unifier<'a> {
    store: &'a mut TypeStore,
    lattice: &'a Lattice,
    subst: Substitution,
}

impl Unifier<'_> {
    fn unify_pair(&mut self, left: TypeId, right: TypeId) -> Result<TypeId, TypeError> {
        // Resolve both sides through the current substitution first, so a
        // bound variable is handled as its binding.
        let left = self.store.substitute(&self.subst, left);
        let right = self.store.substitute(&self.subst, right);
        if left == right {
            return Ok(left);
        }
        let left_node = self.store.node(left).clone();
        let right_node = self.store.node(right).clone();
        match (left_node, right_node) {
            // Two distinct variables: bind the later-seen to the
            // earlier-seen, a consistent choice that avoids binding
            // cycles.
            (TypeNode::Var(_), TypeNode::Var(right_sym)) => {
                self.bind(right_sym, left)?;
                Ok(left)
            }
            (TypeNode::Var(left_sym), _) => {
                self.bind(left_sym, right)?;
                Ok(right)
            }
            (_, TypeNode::Var(right_sym)) => {
                self.bind(right_sym, left)?;
                Ok(left)
            }
            (
                TypeNode::Apply {
                    ctor: left_ctor,
                    args: left_args,
                },
                TypeNode::Apply {
                    ctor: right_ctor,
                    args: right_args,
                },
            ) => self.unify_apply(left, right, left_ctor, left_args, right_ctor, right_args),
        }
    }

    fn unify_apply(
        &mut self,
        left: TypeId,
        right: TypeId,
        left_ctor: ConstructorId,
        left_args: Vec<TypeId>,
        right_ctor: ConstructorId,
        right_args: Vec<TypeId>,
    ) -> Result<TypeId, TypeError> {
        // Unrelated constructors cannot be reconciled; related ones unify
        // toward the supertype (the coercion-compatible direction).
        let result_ctor = if left_ctor == right_ctor {
            left_ctor
        } else if self.lattice.is_subtype(left_ctor, right_ctor) {
            right_ctor
        } else if self.lattice.is_subtype(right_ctor, left_ctor) {
            left_ctor
        } else {
            return Err(TypeError::ConstructorMismatch {
                left: self.render(left),
                right: self.render(right),
            });
        };

        if left_args.len() != right_args.len() {
            // A bare nominal side carries no parameterization to
            // reconcile; it absorbs into the supertype.
            if left_ctor != right_ctor && (left_args.is_empty() || right_args.is_empty()) {
                return Ok(self.store.apply(result_ctor, Vec::new()));
            }
            return Err(TypeError::ArityMismatch {
                left: self.render(left),
                right: self.render(right),
                left_arity: left_args.len(),
                right_arity: right_args.len(),
            });
        }

        let mut args = Vec::with_capacity(left_args.len());
        for (&l, &r) in left_args.iter().zip(right_args.iter()) {
            args.push(self.unify_pair(l, r)?);
        }
        // A binding made while unifying a later argument may refine an
        // earlier one.
        let mut resolved_args = Vec::with_capacity(args.len());
        for arg in args {
            resolved_args.push(self.store.substitute(&self.subst, arg));
        }
        Ok(self.store.apply(result_ctor, resolved_args))
    }

    /// Bind `symbol` to `ty`, keeping every binding fully resolved.
    ///
    /// `ty` has already been resolved through the current substitution by
    /// the caller.
    fn bind(&mut self, symbol: String, ty: TypeId) -> Result<(), TypeError> {
        if let TypeNode::Var(s) = self.store.node(ty) {
            if *s == symbol {
                return Ok(());
            }
        }
        if self.store.occurs(&symbol, ty) {
            return Err(TypeError::OccursCheck {
                var: symbol,
                ty: self.render(ty),
            });
        }
        // Fold the new binding into the existing ones so no binding ever
        // mentions a bound variable.
        let mut single = Substitution::new();
        single.bind(symbol.clone(), ty);
        let pairs: Vec<(String, TypeId)> = self
            .subst
            .iter()
            .map(|(sym, bound)| (sym.clone(), bound))
            .collect();
        for (sym, bound) in pairs {
            let rebound = self.store.substitute(&single, bound);
            self.subst.bind(sym, rebound);
        }
        self.subst.bind(symbol, ty);
        Ok(())
    }

    fn render(&self, ty: TypeId) -> String {
        self.store.display(self.lattice, ty).to_string()
    }
}
