//! Numeric promotion and coercion costs.
//!
//! Coercion between concrete types runs over a numeric promotion lattice
//! that is independent of the nominal subtype tree: integer widening,
//! unsigned-to-wider-signed conversion, integer-to-float promotion and
//! float-to-complex promotion, each with a path cost. Overload resolution
//! ranks candidates by summed cost (lower wins); the absence of a path is
//! a reported `CoercionFailure`, never an infinite cost that silently
//! succeeds.

use serde::{Deserialize, Serialize};

use crate::lattice::Lattice;
use crate::types::{TypeError, TypeId, TypeNode, TypeStore};

/// Position of a concrete constructor in the numeric promotion lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumericKind {
    Bool,
    /// Signed integer of the given bit width.
    Signed(u8),
    /// Unsigned integer of the given bit width.
    Unsigned(u8),
    /// Binary float of the given bit width.
    Float(u8),
    /// Complex number of the given total bit width.
    Complex(u8),
}

const SIGNED_WIDTHS: [u8; 4] = [8, 16, 32, 64];
const UNSIGNED_WIDTHS: [u8; 4] = [8, 16, 32, 64];
const FLOAT_WIDTHS: [u8; 2] = [32, 64];
const COMPLEX_WIDTHS: [u8; 2] = [64, 128];

// Per-step costs of the promotion lattice. Within a class every widening
// step costs 1; crossing a class boundary costs more than any single
// widening step, so `Int32 -> Int64` always ranks before `Int32 -> Float64`.
const BOOL_TO_INT_COST: u32 = 1;
const SIGN_CHANGE_COST: u32 = 1;
const INT_TO_FLOAT_COST: u32 = 2;
const FLOAT_TO_COMPLEX_COST: u32 = 2;
/// Surcharge when the target float cannot represent every source value
/// exactly (`Int64 -> Float64`).
const PRECISION_LOSS_COST: u32 = 1;

/// Classify a constructor name into the promotion lattice.
///
/// Returns `None` for non-numeric constructors; coercion is not defined
/// for them.
pub fn numeric_kind(name: &str) -> Option<NumericKind> {
    let kind = match name {
        "Bool" => NumericKind::Bool,
        "Int8" => NumericKind::Signed(8),
        "Int16" => NumericKind::Signed(16),
        "Int32" => NumericKind::Signed(32),
        "Int64" => NumericKind::Signed(64),
        "UInt8" => NumericKind::Unsigned(8),
        "UInt16" => NumericKind::Unsigned(16),
        "UInt32" => NumericKind::Unsigned(32),
        "UInt64" => NumericKind::Unsigned(64),
        "Float32" => NumericKind::Float(32),
        "Float64" => NumericKind::Float(64),
        "Complex64" => NumericKind::Complex(64),
        "Complex128" => NumericKind::Complex(128),
        _ => return None,
    };
    Some(kind)
}

fn widen_steps(chain: &[u8], from: u8, to: u8) -> Option<u32> {
    let from_idx = chain.iter().position(|&w| w == from)?;
    let to_idx = chain.iter().position(|&w| w == to)?;
    if to_idx >= from_idx {
        Some((to_idx - from_idx) as u32)
    } else {
        None
    }
}

/// Narrowest float that holds every value of an integer of `int_width`
/// bits, plus the surcharge when no float does so exactly.
fn preferred_float(int_width: u8) -> (u8, u32) {
    match int_width {
        0..=16 => (32, 0),
        32 => (64, 0),
        _ => (64, PRECISION_LOSS_COST),
    }
}

/// Promotion path cost between two lattice positions, `None` if no path
/// exists (narrowing, float-to-int, anything-to-bool, ...).
fn promote_steps(src: NumericKind, dst: NumericKind) -> Option<u32> {
    use NumericKind::*;

    if src == dst {
        return Some(0);
    }
    match (src, dst) {
        (Bool, Signed(w)) => Some(BOOL_TO_INT_COST + widen_steps(&SIGNED_WIDTHS, 8, w)?),
        (Bool, Unsigned(w)) => Some(BOOL_TO_INT_COST + widen_steps(&UNSIGNED_WIDTHS, 8, w)?),
        (Bool, Float(w)) => {
            Some(BOOL_TO_INT_COST + INT_TO_FLOAT_COST + widen_steps(&FLOAT_WIDTHS, 32, w)?)
        }
        (Bool, Complex(w)) => Some(
            BOOL_TO_INT_COST
                + INT_TO_FLOAT_COST
                + FLOAT_TO_COMPLEX_COST
                + widen_steps(&COMPLEX_WIDTHS, 64, w)?,
        ),
        (Signed(a), Signed(b)) => widen_steps(&SIGNED_WIDTHS, a, b),
        (Unsigned(a), Unsigned(b)) => widen_steps(&UNSIGNED_WIDTHS, a, b),
        // An unsigned value fits in a signed integer of twice the width.
        (Unsigned(a), Signed(b)) => {
            let holds = a.checked_mul(2)?;
            Some(SIGN_CHANGE_COST + widen_steps(&SIGNED_WIDTHS, holds, b)?)
        }
        (Signed(a), Float(b)) | (Unsigned(a), Float(b)) => {
            let (float, extra) = preferred_float(a);
            Some(INT_TO_FLOAT_COST + extra + widen_steps(&FLOAT_WIDTHS, float, b)?)
        }
        (Signed(a), Complex(b)) | (Unsigned(a), Complex(b)) => {
            let (float, extra) = preferred_float(a);
            Some(
                INT_TO_FLOAT_COST
                    + extra
                    + FLOAT_TO_COMPLEX_COST
                    + widen_steps(&COMPLEX_WIDTHS, float.checked_mul(2)?, b)?,
            )
        }
        (Float(a), Float(b)) => widen_steps(&FLOAT_WIDTHS, a, b),
        (Float(a), Complex(b)) => Some(
            FLOAT_TO_COMPLEX_COST + widen_steps(&COMPLEX_WIDTHS, a.checked_mul(2)?, b)?,
        ),
        (Complex(a), Complex(b)) => widen_steps(&COMPLEX_WIDTHS, a, b),
        _ => None,
    }
}

fn kind_of(store: &TypeStore, lattice: &Lattice, ty: TypeId) -> Option<NumericKind> {
    match store.node(ty) {
        TypeNode::Apply { ctor, args } if args.is_empty() => {
            numeric_kind(&lattice.get(*ctor).name)
        }
        _ => None,
    }
}

/// Promotion path cost from `src` to `dst` (0 for identical types).
///
/// Lower cost ranks an overload candidate higher. No path is a
/// `CoercionFailure`.
pub fn coercion_cost(
    store: &TypeStore,
    lattice: &Lattice,
    src: TypeId,
    dst: TypeId,
) -> Result<u32, TypeError> {
    if src == dst {
        return Ok(0);
    }
    let failure = || TypeError::CoercionFailure {
        src: store.display(lattice, src).to_string(),
        dst: store.display(lattice, dst).to_string(),
    };
    let src_kind = kind_of(store, lattice, src).ok_or_else(failure)?;
    let dst_kind = kind_of(store, lattice, dst).ok_or_else(failure)?;
    promote_steps(src_kind, dst_kind).ok_or_else(failure)
}

/// Check whether a value of type `src` can be implicitly converted to a
/// value of type `dst`.
pub fn can_coerce(store: &TypeStore, lattice: &Lattice, src: TypeId, dst: TypeId) -> bool {
    coercion_cost(store, lattice, src, dst).is_ok()
}

/// Summed per-position coercion cost of an argument list against a
/// candidate's parameter list; used to rank overload candidates.
pub fn signature_cost(
    store: &TypeStore,
    lattice: &Lattice,
    args: &[TypeId],
    params: &[TypeId],
) -> Result<u32, TypeError> {
    if args.len() != params.len() {
        let render = |tys: &[TypeId]| {
            let parts: Vec<String> = tys
                .iter()
                .map(|&ty| store.display(lattice, ty).to_string())
                .collect();
            format!("({})", parts.join(", "))
        };
        return Err(TypeError::ArityMismatch {
            left: render(args),
            right: render(params),
            left_arity: args.len(),
            right_arity: params.len(),
        });
    }
    let mut total = 0;
    for (&arg, &param) in args.iter().zip(params.iter()) {
        total += coercion_cost(store, lattice, arg, param)?;
    }
    Ok(total)
}
