//! Mapping of foreign (C-level) type descriptors into the core type
//! vocabulary.
//!
//! Foreign-function collaborators hand the core a `ForeignType`
//! descriptor; the mapping produces ordinary interned type expressions.
//! Primitive descriptors go through a fixed table, pointers map
//! recursively (`char*` maps to `String`), function descriptors map to a
//! `ForeignFunction[args..., result]` application with the variadic flag
//! carried alongside, and struct descriptors register a structural
//! constructor with a resolved field layout. Union descriptors have no
//! mapping and are reported, not crashed on.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::lattice::{Decoration, Lattice, LayoutEntry};
use crate::scope::Scope;
use crate::types::{TypeError, TypeId, TypeStore};

/// A foreign type descriptor, as produced by a C-header reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForeignType {
    Void,
    Bool,
    Char,
    /// Fixed-width integer; `signed` distinguishes `int32_t`/`uint32_t`.
    Int { bits: u8, signed: bool },
    /// Binary float (`float` = 32, `double` = 64).
    Float { bits: u8 },
    Pointer(Box<ForeignType>),
    Function {
        args: Vec<ForeignType>,
        result: Box<ForeignType>,
        variadic: bool,
    },
    Struct {
        name: String,
        fields: Vec<(String, ForeignType)>,
    },
    Union { name: String },
}

/// A mapped foreign function: its type expression plus variadic-ness,
/// which the type algebra does not encode positionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignSignature {
    pub ty: TypeId,
    pub variadic: bool,
}

fn bare(store: &mut TypeStore, lattice: &Lattice, name: &str) -> Result<TypeId, TypeError> {
    let ctor = lattice
        .lookup(name)
        .ok_or_else(|| TypeError::UnknownTypeName(name.to_string()))?;
    Ok(store.apply(ctor, Vec::new()))
}

/// Map a foreign descriptor to an interned type expression.
///
/// Struct descriptors register their constructor into `lattice` on first
/// sight; a repeated descriptor with the same name reuses the existing
/// constructor.
pub fn map_foreign_type(
    store: &mut TypeStore,
    lattice: &mut Lattice,
    foreign: &ForeignType,
) -> Result<TypeId, TypeError> {
    match foreign {
        ForeignType::Void => bare(store, lattice, "Void"),
        ForeignType::Bool => bare(store, lattice, "Bool"),
        ForeignType::Char => bare(store, lattice, "Char"),
        ForeignType::Int { bits, signed } => {
            let name = match (bits, signed) {
                (8, true) => "Int8",
                (16, true) => "Int16",
                (32, true) => "Int32",
                (64, true) => "Int64",
                (8, false) => "UInt8",
                (16, false) => "UInt16",
                (32, false) => "UInt32",
                (64, false) => "UInt64",
                _ => {
                    return Err(TypeError::UnsupportedForeignType(format!(
                        "{}-bit integer",
                        bits
                    )))
                }
            };
            bare(store, lattice, name)
        }
        ForeignType::Float { bits } => {
            let name = match bits {
                32 => "Float32",
                64 => "Float64",
                _ => {
                    return Err(TypeError::UnsupportedForeignType(format!(
                        "{}-bit float",
                        bits
                    )))
                }
            };
            bare(store, lattice, name)
        }
        ForeignType::Pointer(base) => {
            // `char*` is string data, not a character pointer.
            if **base == ForeignType::Char {
                return bare(store, lattice, "String");
            }
            let base = map_foreign_type(store, lattice, base)?;
            let pointer = lattice
                .lookup("Pointer")
                .ok_or_else(|| TypeError::UnknownTypeName("Pointer".to_string()))?;
            Ok(store.apply(pointer, vec![base]))
        }
        ForeignType::Function { args, result, .. } => {
            let mut mapped = Vec::with_capacity(args.len() + 1);
            for arg in args {
                mapped.push(map_foreign_type(store, lattice, arg)?);
            }
            mapped.push(map_foreign_type(store, lattice, result)?);
            let function = lattice
                .lookup("ForeignFunction")
                .ok_or_else(|| TypeError::UnknownTypeName("ForeignFunction".to_string()))?;
            Ok(store.apply(function, mapped))
        }
        ForeignType::Struct { name, fields } => {
            let ctor = match lattice.lookup(name) {
                Some(existing) => existing,
                None => {
                    let root = lattice.root();
                    let ctor = lattice.register(name, &[], root)?;
                    let mut layout = BTreeMap::new();
                    for (field, field_ty) in fields {
                        let mapped = map_foreign_type(store, lattice, field_ty)?;
                        layout.insert(field.clone(), LayoutEntry::Resolved(mapped));
                    }
                    lattice.decorate(
                        store,
                        ctor,
                        Decoration {
                            layout,
                            fields: BTreeMap::new(),
                            scope: Scope::new(),
                        },
                    )?;
                    ctor
                }
            };
            Ok(store.apply(ctor, Vec::new()))
        }
        ForeignType::Union { name } => {
            Err(TypeError::UnsupportedForeignType(format!("union {}", name)))
        }
    }
}

/// Map a foreign *function* descriptor, keeping its variadic flag.
pub fn foreign_signature(
    store: &mut TypeStore,
    lattice: &mut Lattice,
    foreign: &ForeignType,
) -> Result<ForeignSignature, TypeError> {
    match foreign {
        ForeignType::Function { variadic, .. } => Ok(ForeignSignature {
            ty: map_foreign_type(store, lattice, foreign)?,
            variadic: *variadic,
        }),
        _ => Err(TypeError::UnsupportedForeignType(
            "not a function descriptor".to_string(),
        )),
    }
}
