//! Lattice operations: subtype checking and join.
//!
//! - `is_subtype` (⊑): reachability along `parent` edges
//! - `join` (⊔): nearest common ancestor of two constructors
//! - `join_exprs`: join lifted to type expressions
//!
//! Single inheritance guarantees the lattice is a tree, so the nearest
//! common ancestor falls out of a plain ancestor-path intersection; no
//! general graph-reachability machinery is needed.

use std::collections::HashSet;

use crate::types::{TypeId, TypeNode, TypeStore};

use super::{ConstructorId, Lattice};

impl Lattice {
    /// Check if `a` is a subtype of `b` (`a` ⊑ `b`): `b` is reachable
    /// from `a` by following zero or more `parent` edges.
    ///
    /// # Examples
    /// ```
    /// use flowjit_typing::lattice::Lattice;
    ///
    /// let lattice = Lattice::new();
    /// let int32 = lattice.lookup("Int32").unwrap();
    /// let number = lattice.lookup("Number").unwrap();
    /// assert!(lattice.is_subtype(int32, number));
    /// assert!(!lattice.is_subtype(number, int32));
    /// ```
    pub fn is_subtype(&self, a: ConstructorId, b: ConstructorId) -> bool {
        let mut cur = a;
        loop {
            if cur == b {
                return true;
            }
            match self.get(cur).parent {
                Some(parent) => cur = parent,
                None => return false,
            }
        }
    }

    /// The nearest common ancestor of `a` and `b`.
    ///
    /// Walks up from `a` collecting its ancestor path, then walks up from
    /// `b` one step at a time; the first constructor on `a`'s path is the
    /// join. Because every chain ends at the shared root, both argument
    /// orders walk to the same answer.
    pub fn join(&self, a: ConstructorId, b: ConstructorId) -> ConstructorId {
        let mut ancestors = HashSet::new();
        let mut cur = a;
        loop {
            ancestors.insert(cur);
            match self.get(cur).parent {
                Some(parent) => cur = parent,
                None => break,
            }
        }
        let mut cur = b;
        loop {
            if ancestors.contains(&cur) {
                return cur;
            }
            match self.get(cur).parent {
                // The chain from `b` always ends at the root, which is on
                // `a`'s path; this arm cannot miss.
                Some(parent) => cur = parent,
                None => return self.root(),
            }
        }
    }

    /// The greatest lower bound of `a` and `b`, if one exists.
    ///
    /// In a single-inheritance tree two constructors only have a meet
    /// when they are comparable: the meet is the lower of the two.
    pub fn meet(&self, a: ConstructorId, b: ConstructorId) -> Option<ConstructorId> {
        if self.is_subtype(a, b) {
            Some(a)
        } else if self.is_subtype(b, a) {
            Some(b)
        } else {
            None
        }
    }

    /// Join lifted to type expressions.
    ///
    /// Equal expressions join to themselves. Two constructor applications
    /// otherwise join to the bare nearest-common-ancestor application,
    /// discarding parameterization; argument-position reconciliation is
    /// the unification engine's job. A type variable on either side has
    /// no join.
    pub fn join_exprs(&self, store: &mut TypeStore, a: TypeId, b: TypeId) -> Option<TypeId> {
        if a == b {
            return Some(a);
        }
        let (ca, cb) = match (store.node(a), store.node(b)) {
            (TypeNode::Apply { ctor: ca, .. }, TypeNode::Apply { ctor: cb, .. }) => (*ca, *cb),
            _ => return None,
        };
        let joined = self.join(ca, cb);
        Some(store.apply(joined, Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use crate::types::TypeStore;
    use crate::Lattice;

    /// Lattice from the numeric tower plus `Object ← A ← B ← {C, D}`.
    fn lattice_with_chain() -> Lattice {
        let mut lattice = Lattice::new();
        let root = lattice.root();
        let a = lattice.register("A", &[], root).unwrap();
        let b = lattice.register("B", &[], a).unwrap();
        lattice.register("C", &[], b).unwrap();
        lattice.register("D", &[], b).unwrap();
        lattice
    }

    #[test]
    fn test_join_with_self_is_identity() {
        let lattice = lattice_with_chain();
        for (id, _) in lattice.constructors() {
            assert_eq!(lattice.join(id, id), id);
        }
    }

    #[test]
    fn test_join_commutative_both_orders() {
        let lattice = lattice_with_chain();
        let ids: Vec<_> = lattice.constructors().map(|(id, _)| id).collect();
        for &x in &ids {
            for &y in &ids {
                assert_eq!(
                    lattice.join(x, y),
                    lattice.join(y, x),
                    "join({}, {}) must be commutative",
                    lattice.get(x).name,
                    lattice.get(y).name
                );
            }
        }
    }

    #[test]
    fn test_join_nearest_ancestor() {
        let lattice = lattice_with_chain();
        let a = lattice.lookup("A").unwrap();
        let b = lattice.lookup("B").unwrap();
        let c = lattice.lookup("C").unwrap();
        let d = lattice.lookup("D").unwrap();

        assert_eq!(lattice.join(a, a), a);
        assert_eq!(lattice.join(a, b), a);
        assert_eq!(lattice.join(c, a), a);
        assert_eq!(lattice.join(b, c), b);
        // Siblings join at their shared parent, not some higher ancestor.
        assert_eq!(lattice.join(c, d), b);
    }

    #[test]
    fn test_join_with_root() {
        let lattice = lattice_with_chain();
        let root = lattice.root();
        let c = lattice.lookup("C").unwrap();
        assert_eq!(lattice.join(root, c), root);
        assert_eq!(lattice.join(c, root), root);
    }

    #[test]
    fn test_join_across_numeric_tower() {
        let lattice = Lattice::new();
        let int32 = lattice.lookup("Int32").unwrap();
        let int64 = lattice.lookup("Int64").unwrap();
        let float64 = lattice.lookup("Float64").unwrap();
        let int = lattice.lookup("Int").unwrap();
        let number = lattice.lookup("Number").unwrap();

        assert_eq!(lattice.join(int32, int64), int);
        assert_eq!(lattice.join(int32, float64), number);
    }

    #[test]
    fn test_meet_of_comparable_is_the_lower() {
        let lattice = lattice_with_chain();
        let a = lattice.lookup("A").unwrap();
        let b = lattice.lookup("B").unwrap();
        let c = lattice.lookup("C").unwrap();
        let d = lattice.lookup("D").unwrap();

        assert_eq!(lattice.meet(a, c), Some(c));
        assert_eq!(lattice.meet(c, a), Some(c));
        assert_eq!(lattice.meet(b, b), Some(b));
        // Siblings share no values: no meet.
        assert_eq!(lattice.meet(c, d), None);
    }

    #[test]
    fn test_subtype_reflexive_and_asymmetric() {
        let lattice = lattice_with_chain();
        let ids: Vec<_> = lattice.constructors().map(|(id, _)| id).collect();
        for &x in &ids {
            assert!(lattice.is_subtype(x, x));
            for &y in &ids {
                if x != y && lattice.is_subtype(x, y) {
                    assert!(
                        !lattice.is_subtype(y, x),
                        "subtyping must be asymmetric for {} and {}",
                        lattice.get(x).name,
                        lattice.get(y).name
                    );
                }
            }
        }
    }

    #[test]
    fn test_join_exprs_same_expression() {
        let lattice = Lattice::new();
        let mut store = TypeStore::new();
        let int32 = lattice.lookup("Int32").unwrap();
        let ty = store.apply(int32, Vec::new());
        assert_eq!(lattice.join_exprs(&mut store, ty, ty), Some(ty));
    }

    #[test]
    fn test_join_exprs_discards_parameterization() {
        let mut lattice = Lattice::new();
        let root = lattice.root();
        let array = lattice.register("Array", &["dtype"], root).unwrap();
        let mut store = TypeStore::new();

        let int32 = store.apply(lattice.lookup("Int32").unwrap(), Vec::new());
        let float64 = store.apply(lattice.lookup("Float64").unwrap(), Vec::new());
        let arr_int = store.apply(array, vec![int32]);
        let arr_float = store.apply(array, vec![float64]);

        let joined = lattice.join_exprs(&mut store, arr_int, arr_float).unwrap();
        let bare_array = store.apply(array, Vec::new());
        assert_eq!(joined, bare_array);
    }

    #[test]
    fn test_join_exprs_undefined_for_variables() {
        let lattice = Lattice::new();
        let mut store = TypeStore::new();
        let var = store.var("a");
        let int32 = store.apply(lattice.lookup("Int32").unwrap(), Vec::new());
        assert_eq!(lattice.join_exprs(&mut store, var, int32), None);
    }
}
