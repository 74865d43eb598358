//! The type lattice: unsized types, autodiff levels, return types, and the
//! block-origin order.
//!
//! Sized types (which carry size expressions) live in `ir` next to the
//! expression trees they contain; everything here is expression-free and
//! cheaply comparable.

use serde::{Deserialize, Serialize};

/// A type with array/vector/matrix structure but no sizes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnsizedType {
    Int,
    Real,
    Vector,
    RowVector,
    Matrix,
    Array(Box<UnsizedType>),
    /// A function value: parameter ad-levels and types, and a return type.
    Fun(Vec<(AdLevel, UnsizedType)>, Box<ReturnType>),
    /// The type of a bare reference to an overloaded math-library name.
    MathLibFn,
}

impl UnsizedType {
    pub fn array_of(elem: UnsizedType) -> Self {
        UnsizedType::Array(Box::new(elem))
    }

    /// Strip array layers, returning the element type and the depth removed.
    pub fn unwind_array(&self) -> (&UnsizedType, usize) {
        let mut t = self;
        let mut depth = 0;
        while let UnsizedType::Array(inner) = t {
            t = inner;
            depth += 1;
        }
        (t, depth)
    }

    /// Re-wrap a type in `depth` array layers.
    pub fn wind_array(elem: UnsizedType, depth: usize) -> UnsizedType {
        let mut t = elem;
        for _ in 0..depth {
            t = UnsizedType::array_of(t);
        }
        t
    }

    /// True for `Int` and for arrays whose element chain bottoms out at `Int`.
    pub fn contains_int(&self) -> bool {
        match self {
            UnsizedType::Int => true,
            UnsizedType::Array(inner) => inner.contains_int(),
            _ => false,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, UnsizedType::Int | UnsizedType::Real)
    }

    pub fn is_int_or_real(&self) -> bool {
        self.is_scalar()
    }
}

/// Whether a value participates in reverse-mode automatic differentiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdLevel {
    DataOnly,
    AutoDiffable,
}

impl AdLevel {
    /// Least upper bound: autodiff is contagious.
    pub fn lub(self, other: AdLevel) -> AdLevel {
        if self == AdLevel::AutoDiffable || other == AdLevel::AutoDiffable {
            AdLevel::AutoDiffable
        } else {
            AdLevel::DataOnly
        }
    }
}

/// `Void` for non-returning functions, otherwise a wrapped unsized type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReturnType {
    Void,
    NonVoid(UnsizedType),
}

/// The program section a name was introduced in. The declaration order below
/// is the lattice order; `lub` of operand origins decides which section's
/// rules govern a compound expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BlockOrigin {
    Functions,
    MathLibrary,
    Data,
    TData,
    Param,
    TParam,
    Model,
    GQuant,
}

impl BlockOrigin {
    pub fn lub(self, other: BlockOrigin) -> BlockOrigin {
        self.max(other)
    }
}

/// Ad-level conversion, `from` the value and `to` the requirement: a
/// `DataOnly` value may not flow into an `AutoDiffable` requirement, but
/// the reverse narrowing is always permitted.
pub fn can_convert_ad(from: AdLevel, to: AdLevel) -> bool {
    !(from == AdLevel::DataOnly && to == AdLevel::AutoDiffable)
}

/// Type compatibility modulo int-to-real promotion. `expected` is the
/// declared type, `actual` what the caller supplied. Names beginning with
/// `assign_` (compound-assignment operators) demand exact equality.
pub fn same_type_mod_conv(name: &str, expected: &UnsizedType, actual: &UnsizedType) -> bool {
    if name.starts_with("assign_") {
        return expected == actual;
    }
    match (expected, actual) {
        (UnsizedType::Real, UnsizedType::Int) => true,
        (UnsizedType::Fun(params1, rt1), UnsizedType::Fun(params2, rt2)) => {
            rt1 == rt2
                && params1.len() == params2.len()
                && params1.iter().zip(params2.iter()).all(|((ad1, t1), (ad2, t2))| {
                    // Function arguments are contravariant: the expected
                    // shape's parameter is the value that will flow into the
                    // actual function's parameter requirement.
                    t1 == t2 && can_convert_ad(*ad1, *ad2)
                })
        }
        _ => expected == actual,
    }
}

/// As `same_type_mod_conv`, but promotion is also allowed elementwise
/// through matching array nesting.
pub fn same_type_mod_array_conv(name: &str, expected: &UnsizedType, actual: &UnsizedType) -> bool {
    match (expected, actual) {
        (UnsizedType::Array(e), UnsizedType::Array(a)) => same_type_mod_array_conv(name, e, a),
        _ => same_type_mod_conv(name, expected, actual),
    }
}

/// Does a supplied argument tuple satisfy one declared signature? The
/// ad-level check flows the actual value into the signature's requirement.
pub fn compatible_arguments_mod_conv(
    name: &str,
    signature: &[(AdLevel, UnsizedType)],
    actuals: &[(AdLevel, UnsizedType)],
) -> bool {
    signature.len() == actuals.len()
        && signature
            .iter()
            .zip(actuals.iter())
            .all(|((sig_ad, sig_ty), (act_ad, act_ty))| {
                same_type_mod_conv(name, sig_ty, act_ty) && can_convert_ad(*act_ad, *sig_ad)
            })
}

/// Join two types for branch unification: equal types join to themselves,
/// int and real join to real (at any matching array depth).
pub fn join_types(t1: &UnsizedType, t2: &UnsizedType) -> Option<UnsizedType> {
    use UnsizedType::*;
    match (t1, t2) {
        _ if t1 == t2 => Some(t1.clone()),
        (Int, Real) | (Real, Int) => Some(Real),
        (Array(a), Array(b)) => Some(UnsizedType::array_of(join_types(a, b)?)),
        _ => None,
    }
}

/// Join two return types; `Void` only joins with itself.
pub fn join_return_types(rt1: &ReturnType, rt2: &ReturnType) -> Option<ReturnType> {
    match (rt1, rt2) {
        (ReturnType::Void, ReturnType::Void) => Some(ReturnType::Void),
        (ReturnType::NonVoid(t1), ReturnType::NonVoid(t2)) => {
            Some(ReturnType::NonVoid(join_types(t1, t2)?))
        }
        _ => None,
    }
}
