//! The built-in signature catalog.
//!
//! A read-only table from function name to the overloads the target math
//! library accepts, consulted by the semantic analyzer for call typing and
//! by the partial evaluator to guard specialized rewrites. Operators are
//! registered under their catalog names (`Plus__`, `Transpose__`, ...), so
//! one resolution path serves calls and operator applications alike.
//!
//! The table is immutable after construction; [`StdLib::instance`] builds it
//! once per process.

use indexmap::IndexMap;
use std::sync::OnceLock;

use crate::types::{
    can_convert_ad, compatible_arguments_mod_conv, AdLevel, ReturnType, UnsizedType,
};

/// One accepted argument tuple with its return type.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub args: Vec<(AdLevel, UnsizedType)>,
    pub rtype: ReturnType,
}

/// The catalog. Overloads of a name keep their declaration order; the order
/// is the documented tie-breaker of overload resolution.
#[derive(Debug)]
pub struct StdLib {
    table: IndexMap<String, Vec<Signature>>,
}

static INSTANCE: OnceLock<StdLib> = OnceLock::new();

impl StdLib {
    /// The process-wide catalog, built on first use.
    pub fn instance() -> &'static StdLib {
        INSTANCE.get_or_init(StdLib::new)
    }

    pub fn is_math_lib_fn(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    /// Does `name` have a zero-argument overload?
    pub fn has_nullary(&self, name: &str) -> bool {
        self.table
            .get(name)
            .map(|sigs| sigs.iter().any(|s| s.args.is_empty()))
            .unwrap_or(false)
    }

    pub fn signatures(&self, name: &str) -> &[Signature] {
        self.table.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Resolve a call. Returns the return type of the winning overload:
    /// an exact match first; otherwise the compatible overload with the
    /// fewest int-to-real promotions, ties broken by declaration order.
    pub fn return_type(
        &self,
        name: &str,
        actuals: &[(AdLevel, UnsizedType)],
    ) -> Option<ReturnType> {
        let sigs = self.table.get(name)?;
        // Exact pass: argument types equal, actual ad-levels convertible
        // into the declared requirements.
        for sig in sigs {
            if sig.args.len() == actuals.len()
                && sig
                    .args
                    .iter()
                    .zip(actuals.iter())
                    .all(|((sad, sty), (aad, aty))| sty == aty && can_convert_ad(*aad, *sad))
            {
                return Some(sig.rtype.clone());
            }
        }
        // Widening pass: fewest promotions wins, first declared on ties.
        let mut best: Option<(usize, &Signature)> = None;
        for sig in sigs {
            if compatible_arguments_mod_conv(name, &sig.args, actuals) {
                let promotions = sig
                    .args
                    .iter()
                    .zip(actuals.iter())
                    .filter(|((_, sty), (_, aty))| sty != aty)
                    .count();
                match best {
                    Some((b, _)) if b <= promotions => {}
                    _ => best = Some((promotions, sig)),
                }
            }
        }
        best.map(|(_, sig)| sig.rtype.clone())
    }

    /// Names of every registered function, declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }
}

// =============================================================================
// Distribution-name suffixes
// =============================================================================

/// The distribution suffixes that trigger name-variant freshness checking
/// and placement rules.
pub const DIST_SUFFIXES: [&str; 7] = [
    "_cdf_log", "_ccdf_log", "_lpmf", "_lpdf", "_lcdf", "_lccdf", "_log",
];

/// Names ending in `_log` that are ordinary functions, not distributions.
const LOG_SUFFIX_EXEMPT: [&str; 2] = ["multiply_log", "binomial_coefficient_log"];

/// Split `foo_lpdf` into `("foo", "_lpdf")`. Longest suffix wins, so
/// `_cdf_log` is recognized before `_log`. Exempt names return `None`.
pub fn split_distribution_suffix(name: &str) -> Option<(&str, &str)> {
    if LOG_SUFFIX_EXEMPT.contains(&name) {
        return None;
    }
    DIST_SUFFIXES
        .iter()
        .find(|suffix| name.ends_with(*suffix) && name.len() > suffix.len())
        .map(|suffix| (&name[..name.len() - suffix.len()], *suffix))
}

/// The sibling suffixes a freshness check on one suffix also covers.
pub fn suffix_variants(suffix: &str) -> &'static [&'static str] {
    match suffix {
        "_lpmf" => &["_lpdf", "_log"],
        "_lpdf" => &["_lpmf", "_log"],
        "_lcdf" => &["_cdf_log"],
        "_lccdf" => &["_ccdf_log"],
        "_cdf_log" => &["_lcdf"],
        "_ccdf_log" => &["_lccdf"],
        "_log" => &["_lpmf", "_lpdf"],
        _ => &[],
    }
}

// =============================================================================
// Catalog construction
// =============================================================================

use UnsizedType::{Int, Matrix, Real, RowVector, Vector};

fn arr(t: UnsizedType) -> UnsizedType {
    UnsizedType::array_of(t)
}

impl Default for StdLib {
    fn default() -> Self {
        Self::new()
    }
}

impl StdLib {
    fn add_sig(&mut self, name: &str, args: Vec<(AdLevel, UnsizedType)>, rtype: ReturnType) {
        self.table
            .entry(name.to_string())
            .or_default()
            .push(Signature { args, rtype });
    }

    /// A returning overload. Arguments carry no autodiff requirement, so
    /// data and autodiffable values both flow in.
    fn add(&mut self, name: &str, rt: UnsizedType, args: &[UnsizedType]) {
        let args = args.iter().map(|t| (AdLevel::DataOnly, t.clone())).collect();
        self.add_sig(name, args, ReturnType::NonVoid(rt));
    }

    /// The standard vectorized expansion of a scalar function: scalars
    /// (ints promoting to real) plus elementwise container instances.
    fn add_unary_vectorized(&mut self, name: &str) {
        self.add(name, Real, &[Real]);
        self.add(name, Real, &[Int]);
        self.add(name, Vector, &[Vector]);
        self.add(name, RowVector, &[RowVector]);
        self.add(name, Matrix, &[Matrix]);
        self.add(name, arr(Real), &[arr(Real)]);
        self.add(name, arr(Real), &[arr(Int)]);
    }

    /// Scalar binary function on reals, ints promoting.
    fn add_binary(&mut self, name: &str) {
        self.add(name, Real, &[Real, Real]);
    }

    fn add_operators(&mut self) {
        // Arithmetic: scalar instances first so exact int matches win.
        for op in ["Plus__", "Minus__"] {
            self.add(op, Int, &[Int, Int]);
            self.add(op, Real, &[Real, Real]);
            for t in [Vector, RowVector, Matrix] {
                self.add(op, t.clone(), &[t.clone(), t.clone()]);
                self.add(op, t.clone(), &[t.clone(), Real]);
                self.add(op, t.clone(), &[Real, t.clone()]);
            }
        }

        self.add("Times__", Int, &[Int, Int]);
        self.add("Times__", Real, &[Real, Real]);
        for t in [Vector, RowVector, Matrix] {
            self.add("Times__", t.clone(), &[t.clone(), Real]);
            self.add("Times__", t.clone(), &[Real, t.clone()]);
        }
        self.add("Times__", Real, &[RowVector, Vector]);
        self.add("Times__", Matrix, &[Vector, RowVector]);
        self.add("Times__", Vector, &[Matrix, Vector]);
        self.add("Times__", RowVector, &[RowVector, Matrix]);
        self.add("Times__", Matrix, &[Matrix, Matrix]);

        self.add("Divide__", Int, &[Int, Int]);
        self.add("Divide__", Real, &[Real, Real]);
        for t in [Vector, RowVector, Matrix] {
            self.add("Divide__", t.clone(), &[t.clone(), Real]);
        }
        self.add("Divide__", RowVector, &[RowVector, Matrix]);

        self.add("Modulo__", Int, &[Int, Int]);
        self.add("Pow__", Real, &[Real, Real]);

        for op in ["EltTimes__", "EltDivide__"] {
            self.add(op, Int, &[Int, Int]);
            self.add(op, Real, &[Real, Real]);
            for t in [Vector, RowVector, Matrix] {
                self.add(op, t.clone(), &[t.clone(), t.clone()]);
                self.add(op, t.clone(), &[t.clone(), Real]);
                self.add(op, t.clone(), &[Real, t.clone()]);
            }
        }

        for op in ["Equals__", "NEquals__", "Less__", "Leq__", "Greater__", "Geq__", "And__", "Or__"] {
            self.add(op, Int, &[Int, Int]);
            self.add(op, Int, &[Real, Real]);
        }

        self.add("PNot__", Int, &[Int]);
        self.add("PNot__", Int, &[Real]);
        for op in ["PPlus__", "PMinus__"] {
            self.add(op, Int, &[Int]);
            self.add(op, Real, &[Real]);
            for t in [Vector, RowVector, Matrix] {
                self.add(op, t.clone(), &[t.clone()]);
            }
        }

        self.add("Transpose__", RowVector, &[Vector]);
        self.add("Transpose__", Vector, &[RowVector]);
        self.add("Transpose__", Matrix, &[Matrix]);

        for t in [Int, Real, Vector, RowVector, Matrix] {
            self.add("TernaryIf__", t.clone(), &[Int, t.clone(), t.clone()]);
        }
    }

    fn add_math_functions(&mut self) {
        for name in [
            "log", "exp", "sqrt", "square", "inv", "inv_logit", "inv_sqrt", "inv_square",
            "logit", "erf", "erfc", "exp2", "expm1", "fabs", "log1m", "log1p", "log1m_exp",
            "log1p_exp", "log1m_inv_logit", "log_inv_logit",
        ] {
            self.add_unary_vectorized(name);
        }

        for name in ["gamma_p", "gamma_q", "multiply_log", "log_diff_exp", "binomial_coefficient_log"] {
            self.add_binary(name);
        }

        self.add("fma", Real, &[Real, Real, Real]);

        self.add("log_sum_exp", Real, &[Real, Real]);
        for t in [Vector, RowVector, Matrix, arr(Real)] {
            self.add("log_sum_exp", Real, &[t]);
        }

        self.add("falling_factorial", Real, &[Real, Int]);
        self.add("falling_factorial", Int, &[Int, Int]);
        self.add("log_falling_factorial", Real, &[Real, Int]);
        self.add("rising_factorial", Real, &[Real, Int]);
        self.add("rising_factorial", Int, &[Int, Int]);
        self.add("log_rising_factorial", Real, &[Real, Int]);

        for name in ["sd", "variance", "sum"] {
            for t in [Vector, RowVector, Matrix, arr(Real)] {
                self.add(name, Real, &[t]);
            }
        }
        self.add("sum", Int, &[arr(Int)]);

        self.add("softmax", Vector, &[Vector]);
        self.add("log_softmax", Vector, &[Vector]);

        self.add("determinant", Real, &[Matrix]);
        self.add("log_determinant", Real, &[Matrix]);
        self.add("diagonal", Vector, &[Matrix]);
        self.add("trace", Real, &[Matrix]);
        self.add("diag_matrix", Matrix, &[Vector]);
        self.add("rows", Int, &[Matrix]);
        self.add("cols", Int, &[Matrix]);

        self.add("quad_form", Matrix, &[Matrix, Matrix]);
        self.add("quad_form", Real, &[Matrix, Vector]);
        self.add("quad_form_diag", Matrix, &[Matrix, Vector]);
        self.add("quad_form_diag", Matrix, &[Matrix, RowVector]);
        self.add("trace_quad_form", Real, &[Matrix, Matrix]);
        self.add("trace_gen_quad_form", Real, &[Matrix, Matrix, Matrix]);
        self.add("diag_post_multiply", Matrix, &[Matrix, Vector]);
        self.add("diag_post_multiply", Matrix, &[Matrix, RowVector]);
        self.add("diag_pre_multiply", Matrix, &[Vector, Matrix]);
        self.add("diag_pre_multiply", Matrix, &[RowVector, Matrix]);
        self.add("matrix_exp", Matrix, &[Matrix]);
        self.add("matrix_exp_multiply", Matrix, &[Matrix, Matrix]);
        self.add("scale_matrix_exp_multiply", Matrix, &[Real, Matrix, Matrix]);

        self.add("columns_dot_product", RowVector, &[Matrix, Matrix]);
        self.add("columns_dot_self", RowVector, &[Matrix]);
        self.add("rows_dot_product", Vector, &[Matrix, Matrix]);
        self.add("rows_dot_self", Vector, &[Matrix]);
        for (a, b) in [
            (Vector, Vector),
            (Vector, RowVector),
            (RowVector, Vector),
            (RowVector, RowVector),
        ] {
            self.add("dot_product", Real, &[a, b]);
        }
        self.add("dot_self", Real, &[Vector]);
        self.add("dot_self", Real, &[RowVector]);
        self.add("squared_distance", Real, &[Vector, Vector]);
        self.add("squared_distance", Real, &[RowVector, RowVector]);

        // Nullary constants.
        self.add("sqrt2", Real, &[]);
        self.add("pi", Real, &[]);
        self.add("e", Real, &[]);

        // map_rect's first argument is a function value; its signature is
        // the conventional shard-function shape.
        let shard_fn = UnsizedType::Fun(
            vec![
                (AdLevel::AutoDiffable, Vector),
                (AdLevel::AutoDiffable, Vector),
                (AdLevel::DataOnly, arr(Real)),
                (AdLevel::DataOnly, arr(Int)),
            ],
            Box::new(ReturnType::NonVoid(Vector)),
        );
        self.add(
            "map_rect",
            Vector,
            &[shard_fn, Vector, arr(Vector), arr(arr(Real)), arr(arr(Int))],
        );
    }

    fn add_distributions(&mut self) {
        // Continuous densities, with the usual vectorized instances.
        for name in ["normal_lpdf", "normal_log"] {
            self.add(name, Real, &[Real, Real, Real]);
            self.add(name, Real, &[Vector, Real, Real]);
            self.add(name, Real, &[Vector, Vector, Real]);
            self.add(name, Real, &[Vector, Real, Vector]);
            self.add(name, Real, &[Vector, Vector, Vector]);
            self.add(name, Real, &[arr(Real), Real, Real]);
        }
        for name in ["normal_lcdf", "normal_lccdf", "normal_cdf", "normal_ccdf"] {
            self.add(name, Real, &[Real, Real, Real]);
            self.add(name, Real, &[Vector, Real, Real]);
        }
        self.add("normal_rng", Real, &[Real, Real]);
        self.add(
            "normal_id_glm_lpdf",
            Real,
            &[Vector, Matrix, Real, Vector, Real],
        );
        self.add(
            "normal_id_glm_lpdf",
            Real,
            &[Vector, Matrix, Vector, Vector, Real],
        );

        self.add("uniform_lpdf", Real, &[Real, Real, Real]);
        self.add("uniform_rng", Real, &[Real, Real]);

        for name in ["bernoulli_lpmf", "bernoulli_log", "bernoulli_logit_lpmf", "bernoulli_logit_log"] {
            self.add(name, Real, &[Int, Real]);
            self.add(name, Real, &[arr(Int), Real]);
            self.add(name, Real, &[arr(Int), Vector]);
        }
        self.add("bernoulli_logit_glm_lpmf", Real, &[arr(Int), Matrix, Real, Vector]);
        self.add("bernoulli_logit_glm_lpmf", Real, &[arr(Int), Matrix, Vector, Vector]);
        self.add("bernoulli_rng", Int, &[Real]);
        self.add("bernoulli_rng", arr(Int), &[Vector]);
        self.add("bernoulli_logit_rng", Int, &[Real]);
        self.add("bernoulli_logit_rng", arr(Int), &[Vector]);

        for name in ["poisson_lpmf", "poisson_log", "poisson_log_lpmf"] {
            self.add(name, Real, &[Int, Real]);
            self.add(name, Real, &[arr(Int), Real]);
            self.add(name, Real, &[arr(Int), Vector]);
        }
        self.add("poisson_log_glm_lpmf", Real, &[arr(Int), Matrix, Real, Vector]);
        self.add("poisson_log_glm_lpmf", Real, &[arr(Int), Matrix, Vector, Vector]);
        self.add("poisson_rng", Int, &[Real]);
        self.add("poisson_rng", arr(Int), &[Vector]);
        self.add("poisson_log_rng", Int, &[Real]);
        self.add("poisson_log_rng", arr(Int), &[Vector]);

        for name in ["neg_binomial_2_lpmf", "neg_binomial_2_log_lpmf"] {
            self.add(name, Real, &[Int, Real, Real]);
            self.add(name, Real, &[arr(Int), Real, Real]);
            self.add(name, Real, &[arr(Int), Vector, Real]);
        }
        self.add(
            "neg_binomial_2_log_glm_lpmf",
            Real,
            &[arr(Int), Matrix, Real, Vector, Real],
        );
        self.add(
            "neg_binomial_2_log_glm_lpmf",
            Real,
            &[arr(Int), Matrix, Vector, Vector, Real],
        );
        self.add("neg_binomial_2_rng", Int, &[Real, Real]);
        self.add("neg_binomial_2_log_rng", Int, &[Real, Real]);

        for name in ["categorical_lpmf", "categorical_logit_lpmf"] {
            self.add(name, Real, &[Int, Vector]);
            self.add(name, Real, &[arr(Int), Vector]);
        }
        self.add("categorical_rng", Int, &[Vector]);
        self.add("categorical_logit_rng", Int, &[Vector]);

        for name in ["binomial_lpmf", "binomial_logit_lpmf"] {
            self.add(name, Real, &[Int, Int, Real]);
            self.add(name, Real, &[arr(Int), arr(Int), Real]);
        }
        self.add("binomial_rng", Int, &[Int, Real]);
    }

    /// Build the full catalog.
    pub fn new() -> Self {
        let mut lib = StdLib {
            table: IndexMap::new(),
        };
        lib.add_operators();
        lib.add_math_functions();
        lib.add_distributions();
        lib
    }
}
