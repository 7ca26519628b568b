//! Display rendering for interned type expressions.

use std::fmt;

use crate::lattice::Lattice;

use super::store::{TypeId, TypeNode, TypeStore};

/// Borrowed display adapter: rendering a `TypeId` needs both its store
/// (for the node graph) and the lattice (for constructor names).
#[derive(Debug)]
pub struct DisplayType<'a> {
    store: &'a TypeStore,
    lattice: &'a Lattice,
    id: TypeId,
}

impl fmt::Display for DisplayType<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_type(f, self.store, self.lattice, self.id)
    }
}

fn write_type(
    f: &mut fmt::Formatter<'_>,
    store: &TypeStore,
    lattice: &Lattice,
    id: TypeId,
) -> fmt::Result {
    match store.node(id) {
        TypeNode::Var(symbol) => write!(f, "{}", symbol),
        TypeNode::Apply { ctor, args } => {
            write!(f, "{}", lattice.get(*ctor).name)?;
            if args.is_empty() {
                return Ok(());
            }
            write!(f, "[")?;
            for (i, &arg) in args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write_type(f, store, lattice, arg)?;
            }
            write!(f, "]")
        }
    }
}

impl TypeStore {
    /// Render an expression as `Array[Int32, Dim]`-style text.
    pub fn display<'a>(&'a self, lattice: &'a Lattice, id: TypeId) -> DisplayType<'a> {
        DisplayType {
            store: self,
            lattice,
            id,
        }
    }
}
