//! End-to-end tests for unification, scoped resolution and coercion.

use flowjit_typing::promotion::{can_coerce, coercion_cost, signature_cost};
use flowjit_typing::{
    resolve_raw, unify, Lattice, RawTypeExpr, Scope, Substitution, TypeError, TypeId, TypeStore,
};

/// Numeric tower plus `Array[dtype, dims]` and the dimension tags the
/// broadcasting client uses.
fn array_lattice() -> Lattice {
    let mut lattice = Lattice::new();
    let root = lattice.root();
    lattice.register("Array", &["dtype", "dims"], root).unwrap();
    lattice.register("Dim1", &[], root).unwrap();
    lattice.register("Dim2", &[], root).unwrap();
    lattice.register("Pair", &["first", "second"], root).unwrap();
    lattice
}

fn bare(store: &mut TypeStore, lattice: &Lattice, name: &str) -> TypeId {
    let ctor = lattice.lookup(name).unwrap();
    store.apply(ctor, Vec::new())
}

// ==================== Unification Scenarios ====================

#[test]
fn test_concrete_requirement_success_and_failure() {
    let lattice = array_lattice();
    let mut store = TypeStore::new();
    let a = store.var("a");
    let int32 = bare(&mut store, &lattice, "Int32");

    // (a, Int32) pins the variable; the result is concrete.
    let result = unify(&mut store, &lattice, &[(a, int32)], true).unwrap();
    assert_eq!(result.resolved, vec![int32]);

    // (a, b) pins nothing; a concrete result is required but impossible.
    let mut store = TypeStore::new();
    let a = store.var("a");
    let b = store.var("b");
    let err = unify(&mut store, &lattice, &[(a, b)], true).unwrap_err();
    assert!(matches!(err, TypeError::UnresolvedFreeVariables { .. }));
}

#[test]
fn test_array_broadcast_unification() {
    let lattice = array_lattice();
    let mut store = TypeStore::new();
    let array = lattice.lookup("Array").unwrap();
    let a = store.var("a");
    let b = store.var("b");
    let int32 = bare(&mut store, &lattice, "Int32");
    let dim1 = bare(&mut store, &lattice, "Dim1");

    // Array[a, Dim1] ~ Array[Int32, b]
    let left = store.apply(array, vec![a, dim1]);
    let right = store.apply(array, vec![int32, b]);
    let result = unify(&mut store, &lattice, &[(left, right)], false).unwrap();

    assert_eq!(result.substitution.get("a"), Some(int32));
    assert_eq!(result.substitution.get("b"), Some(dim1));
    assert_eq!(result.substitution.len(), 2);

    let resolved = result.resolved[0];
    assert_eq!(
        store.display(&lattice, resolved).to_string(),
        "Array[Int32, Dim1]"
    );
}

#[test]
fn test_occurs_check_failure_is_reported() {
    let lattice = array_lattice();
    let mut store = TypeStore::new();
    let array = lattice.lookup("Array").unwrap();
    let v = store.var("v");
    let dim1 = bare(&mut store, &lattice, "Dim1");
    let array_v = store.apply(array, vec![v, dim1]);

    let err = unify(&mut store, &lattice, &[(v, array_v)], false).unwrap_err();
    assert!(matches!(err, TypeError::OccursCheck { .. }));
}

#[test]
fn test_pair_arity_mismatch() {
    let lattice = array_lattice();
    let mut store = TypeStore::new();
    let pair = lattice.lookup("Pair").unwrap();
    let int32 = bare(&mut store, &lattice, "Int32");
    let pair2 = store.apply(pair, vec![int32, int32]);
    let pair1 = store.apply(pair, vec![int32]);

    let err = unify(&mut store, &lattice, &[(pair2, pair1)], false).unwrap_err();
    assert!(matches!(
        err,
        TypeError::ArityMismatch {
            left_arity: 2,
            right_arity: 1,
            ..
        }
    ));
}

#[test]
fn test_unrelated_constructors_do_not_unify() {
    let lattice = array_lattice();
    let mut store = TypeStore::new();
    let dim1 = bare(&mut store, &lattice, "Dim1");
    let int32 = bare(&mut store, &lattice, "Int32");

    let err = unify(&mut store, &lattice, &[(dim1, int32)], false).unwrap_err();
    assert!(matches!(err, TypeError::ConstructorMismatch { .. }));
}

// ==================== Signature Resolution Pipeline ====================

#[test]
fn test_resolve_then_unify_a_method_signature() {
    // The overload-resolution flow: resolve a pre-parsed signature in its
    // declaring scope, then unify against the call-site argument types.
    let lattice = array_lattice();
    let mut store = TypeStore::new();
    let scope = Scope::prelude(&lattice);

    // Declared parameter: Array[dtype, dims]
    let declared = resolve_raw(
        &mut store,
        &lattice,
        &scope,
        &Substitution::new(),
        &RawTypeExpr::Apply(
            "Array".to_string(),
            vec![
                RawTypeExpr::Var("dtype".to_string()),
                RawTypeExpr::Var("dims".to_string()),
            ],
        ),
    )
    .unwrap();

    // Call-site argument: Array[Float64, Dim2]
    let array = lattice.lookup("Array").unwrap();
    let float64 = bare(&mut store, &lattice, "Float64");
    let dim2 = bare(&mut store, &lattice, "Dim2");
    let argument = store.apply(array, vec![float64, dim2]);

    let result = unify(&mut store, &lattice, &[(declared, argument)], true).unwrap();
    assert_eq!(result.substitution.get("dtype"), Some(float64));
    assert_eq!(result.substitution.get("dims"), Some(dim2));
    assert_eq!(result.resolved, vec![argument]);
}

// ==================== Coercion Ranking ====================

#[test]
fn test_overload_ranking_prefers_cheaper_coercion() {
    let lattice = array_lattice();
    let mut store = TypeStore::new();
    let int32 = bare(&mut store, &lattice, "Int32");
    let int64 = bare(&mut store, &lattice, "Int64");
    let float64 = bare(&mut store, &lattice, "Float64");

    // Candidates for a call with (Int32, Int32): exact beats widening
    // beats promotion to float.
    let args = [int32, int32];
    let exact = signature_cost(&store, &lattice, &args, &[int32, int32]).unwrap();
    let widening = signature_cost(&store, &lattice, &args, &[int64, int64]).unwrap();
    let promoting = signature_cost(&store, &lattice, &args, &[float64, float64]).unwrap();
    assert!(exact < widening);
    assert!(widening < promoting);
}

#[test]
fn test_coercion_failure_lets_callers_try_the_next_candidate() {
    let lattice = array_lattice();
    let mut store = TypeStore::new();
    let float64 = bare(&mut store, &lattice, "Float64");
    let int32 = bare(&mut store, &lattice, "Int32");

    assert!(!can_coerce(&store, &lattice, float64, int32));
    let err = coercion_cost(&store, &lattice, float64, int32).unwrap_err();
    assert!(matches!(err, TypeError::CoercionFailure { .. }));
}
