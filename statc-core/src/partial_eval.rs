//! The partial evaluator: a bottom-up rewriter over canonical MIR.
//!
//! Children are evaluated first, then the node itself is considered for
//! rewriting: literal constant folding, dead-branch elimination, and the
//! specialized-function table that replaces generic call trees by dedicated
//! math-library functions with better numerical behavior.
//!
//! Rewrites never raise. Every specialized candidate is passed back through
//! the signature catalog, and a candidate the library does not support at
//! the inferred argument types is silently reverted. Each applied rewrite
//! strictly shrinks the tree or moves to a more specialized call, so the
//! single bottom-up pass is idempotent: evaluating twice gives the same
//! program.

use log::debug;

use crate::ir::traverse::expr_structural_eq;
use crate::ir::*;
use crate::stdlib::StdLib;
use crate::types::{ReturnType, UnsizedType};

/// Partially evaluate a program.
pub fn eval_program(program: MirProgram, stdlib: &StdLib) -> MirProgram {
    let pe = PartialEvaluator { stdlib };
    program.map_stmts(|s| pe.eval_stmt(s))
}

struct PartialEvaluator<'a> {
    stdlib: &'a StdLib,
}

impl<'a> PartialEvaluator<'a> {
    fn eval_stmt(&self, s: TypedStmt) -> TypedStmt {
        let Stmt { pattern, meta } = s;
        let pattern = pattern.map(
            &mut |e: TypedExpr| self.eval_expr(e),
            &mut |child: Box<TypedStmt>| Box::new(self.eval_stmt(*child)),
        );
        match pattern {
            // Dead-branch elimination on statically known conditions.
            StmtPattern::IfElse(cond, then_s, else_s) => match lit_int(&cond) {
                Some(0) => match else_s {
                    Some(else_s) => *else_s,
                    None => Stmt::new(StmtPattern::Skip, meta),
                },
                Some(_) => *then_s,
                None => Stmt::new(StmtPattern::IfElse(cond, then_s, else_s), meta),
            },
            StmtPattern::While(cond, body) => match lit_int(&cond) {
                Some(0) => Stmt::new(StmtPattern::Skip, meta),
                _ => Stmt::new(StmtPattern::While(cond, body), meta),
            },
            other => Stmt::new(other, meta),
        }
    }

    fn eval_expr(&self, e: TypedExpr) -> TypedExpr {
        let Expr { pattern, meta } = e;
        let pattern = pattern.map(&mut |child: Box<TypedExpr>| Box::new(self.eval_expr(*child)));
        self.simplify(Expr { pattern, meta })
    }

    /// One rewriting step at an already-evaluated node.
    fn simplify(&self, e: TypedExpr) -> TypedExpr {
        let Expr { pattern, meta } = e;
        match pattern {
            ExprPattern::TernaryIf(cond, t, f) => match lit_int(&cond) {
                Some(k) => coerce_to(if k != 0 { *t } else { *f }, &meta),
                None => Expr::new(ExprPattern::TernaryIf(cond, t, f), meta),
            },
            ExprPattern::EAnd(a, b) => match (lit_truth(&a), lit_truth(&b)) {
                (Some(x), Some(y)) => int_lit_expr((x && y) as i64, meta),
                _ => Expr::new(ExprPattern::EAnd(a, b), meta),
            },
            ExprPattern::EOr(a, b) => match (lit_truth(&a), lit_truth(&b)) {
                (Some(x), Some(y)) => int_lit_expr((x || y) as i64, meta),
                _ => Expr::new(ExprPattern::EOr(a, b), meta),
            },
            pattern @ ExprPattern::Indexed(_, _) => self.fold_indexed(Expr { pattern, meta }),
            ExprPattern::FunApp(kind, name, args) => {
                if let Some(lit) = fold_constants(&name, &args) {
                    return Expr::new(lit, meta);
                }
                let candidate = self.specialize(&name, &args);
                let e = Expr::new(ExprPattern::FunApp(kind, name, args), meta);
                match candidate {
                    Some((name, new_args)) => self.guarded_rewrite(e, name, new_args),
                    None => e,
                }
            }
            other => Expr::new(other, meta),
        }
    }

    /// The applicability guard: the specialized function must accept the
    /// argument types and return exactly the original type, otherwise the
    /// rewrite is dropped.
    fn guarded_rewrite(&self, original: TypedExpr, name: &'static str, args: Vec<TypedExpr>) -> TypedExpr {
        let sigs: Vec<_> = args.iter().map(|a| (a.ad(), a.ty().clone())).collect();
        match self.stdlib.return_type(name, &sigs) {
            Some(ReturnType::NonVoid(ty)) if ty == original.meta.ty => {
                debug!("specialized rewrite: {} -> {}", original, name);
                Expr::new(
                    ExprPattern::FunApp(
                        FnKind::MathLib,
                        name.to_string(),
                        args.into_iter().map(Box::new).collect(),
                    ),
                    original.meta,
                )
            }
            _ => original,
        }
    }

    /// Fold indexing into array literals built by `make_array`.
    fn fold_indexed(&self, e: TypedExpr) -> TypedExpr {
        match self.try_fold_indexed(&e) {
            Some(folded) => folded,
            None => e,
        }
    }

    fn try_fold_indexed(&self, e: &TypedExpr) -> Option<TypedExpr> {
        let ExprPattern::Indexed(base, indices) = &e.pattern else {
            return None;
        };
        let elements = call_args(base, "make_array")?;
        match indices.as_slice() {
            // A positive in-range literal picks one element.
            [Index::Single(i)] => {
                let i = lit_int(i)?;
                if i >= 1 && (i as usize) <= elements.len() {
                    let picked = (*elements[i as usize - 1]).clone();
                    if picked.ty() == &e.meta.ty {
                        return Some(picked);
                    }
                }
                None
            }
            // A literal multi-index selects a sub-literal.
            [Index::Multi(m)] => {
                let picks = call_args(m, "make_array")?;
                let mut selected = Vec::with_capacity(picks.len());
                for pick in picks {
                    let i = lit_int(pick)?;
                    if i >= 1 && (i as usize) <= elements.len() {
                        selected.push(elements[i as usize - 1].clone());
                    } else {
                        return None;
                    }
                }
                Some(Expr::new(
                    ExprPattern::FunApp(
                        FnKind::CompilerInternal,
                        "make_array".to_string(),
                        selected,
                    ),
                    e.meta.clone(),
                ))
            }
            _ => None,
        }
    }

    /// The specialized-rewrite table. Alternatives are tried in order and
    /// the first match wins; the caller guards the result against the
    /// catalog before committing.
    fn specialize(
        &self,
        name: &str,
        args: &[Box<TypedExpr>],
    ) -> Option<(&'static str, Vec<TypedExpr>)> {
        match (name, args) {
            ("log", [a]) => self.specialize_log(a),
            ("Minus__", [a, b]) => {
                if let (Some(x), true) = (unary_arg(a, "exp"), is_lit(b, 1.0)) {
                    return Some(("expm1", vec![x.clone()]));
                }
                if is_lit(a, 1.0) {
                    if let Some(x) = unary_arg(b, "erf") {
                        return Some(("erfc", vec![x.clone()]));
                    }
                    if let Some(x) = unary_arg(b, "erfc") {
                        return Some(("erf", vec![x.clone()]));
                    }
                    if let Some((x, y)) = binary_args(b, "gamma_p") {
                        return Some(("gamma_q", vec![x.clone(), y.clone()]));
                    }
                    if let Some((x, y)) = binary_args(b, "gamma_q") {
                        return Some(("gamma_p", vec![x.clone(), y.clone()]));
                    }
                }
                None
            }
            ("Plus__", [a, b]) => {
                if let Some((x, y)) = binary_args(a, "Times__") {
                    return Some(("fma", vec![x.clone(), y.clone(), (**b).clone()]));
                }
                if let Some((x, y)) = binary_args(b, "Times__") {
                    return Some(("fma", vec![x.clone(), y.clone(), (**a).clone()]));
                }
                None
            }
            ("Pow__", [a, b]) => {
                if is_lit(a, 2.0) {
                    return Some(("exp2", vec![(**b).clone()]));
                }
                if is_lit(b, 2.0) {
                    return Some(("square", vec![(**a).clone()]));
                }
                if is_lit(b, 0.5) {
                    return Some(("sqrt", vec![(**a).clone()]));
                }
                if let Some((one, two)) = binary_args(b, "Divide__") {
                    if is_lit(one, 1.0) && is_lit(two, 2.0) {
                        return Some(("sqrt", vec![(**a).clone()]));
                    }
                }
                None
            }
            ("square", [a]) => {
                let x = unary_arg(a, "sd")?;
                Some(("variance", vec![x.clone()]))
            }
            ("sqrt", [a]) if is_lit(a, 2.0) => Some(("sqrt2", vec![])),
            ("sum", [a]) => {
                if let Some(sq) = unary_arg(a, "square") {
                    if let Some((x, y)) = binary_args(sq, "Minus__") {
                        return Some(("squared_distance", vec![x.clone(), y.clone()]));
                    }
                }
                if let Some(m) = unary_arg(a, "diagonal") {
                    return Some(("trace", vec![m.clone()]));
                }
                None
            }
            ("trace", [a]) => {
                if let Some((qa, qb)) = binary_args(a, "quad_form") {
                    return Some(("trace_quad_form", vec![qa.clone(), qb.clone()]));
                }
                // trace(d * b' * a * c) with b == c, left-nested products.
                if let Some((dbta, c)) = binary_args(a, "Times__") {
                    if let Some((dbt, a2)) = binary_args(dbta, "Times__") {
                        if let Some((d, bt)) = binary_args(dbt, "Times__") {
                            if let Some(b) = unary_arg(bt, "Transpose__") {
                                if expr_structural_eq(b, c) {
                                    return Some((
                                        "trace_gen_quad_form",
                                        vec![d.clone(), a2.clone(), b.clone()],
                                    ));
                                }
                            }
                        }
                    }
                }
                None
            }
            ("Times__", [a, b]) => self.specialize_times(a, b),
            ("inv", [a]) => {
                if let Some(x) = unary_arg(a, "sqrt") {
                    return Some(("inv_sqrt", vec![x.clone()]));
                }
                if let Some(x) = unary_arg(a, "square") {
                    return Some(("inv_square", vec![x.clone()]));
                }
                None
            }
            ("columns_dot_product", [x, y]) if expr_structural_eq(x, y) => {
                Some(("columns_dot_self", vec![(**x).clone()]))
            }
            ("rows_dot_product", [x, y]) if expr_structural_eq(x, y) => {
                Some(("rows_dot_self", vec![(**x).clone()]))
            }
            ("dot_product", [x, y]) if expr_structural_eq(x, y) => {
                Some(("dot_self", vec![(**x).clone()]))
            }

            // Link-function fusions for the discrete families, generalized
            // linear forms first so the most specialized call wins.
            ("bernoulli_lpmf" | "bernoulli_log", [y, theta]) => {
                let eta = unary_arg(theta, "inv_logit")?;
                if let Some((x, alpha, beta)) = glm_parts(eta) {
                    return Some(("bernoulli_logit_glm_lpmf", vec![(**y).clone(), x, alpha, beta]));
                }
                Some(("bernoulli_logit_lpmf", vec![(**y).clone(), eta.clone()]))
            }
            ("bernoulli_logit_lpmf" | "bernoulli_logit_log", [y, eta]) => {
                let (x, alpha, beta) = glm_parts(eta)?;
                Some(("bernoulli_logit_glm_lpmf", vec![(**y).clone(), x, alpha, beta]))
            }
            ("bernoulli_rng", [theta]) => {
                let eta = unary_arg(theta, "inv_logit")?;
                Some(("bernoulli_logit_rng", vec![eta.clone()]))
            }
            ("poisson_lpmf" | "poisson_log", [y, lambda]) => {
                let eta = unary_arg(lambda, "exp")?;
                if let Some((x, alpha, beta)) = glm_parts(eta) {
                    return Some(("poisson_log_glm_lpmf", vec![(**y).clone(), x, alpha, beta]));
                }
                Some(("poisson_log_lpmf", vec![(**y).clone(), eta.clone()]))
            }
            ("poisson_log_lpmf", [y, eta]) => {
                let (x, alpha, beta) = glm_parts(eta)?;
                Some(("poisson_log_glm_lpmf", vec![(**y).clone(), x, alpha, beta]))
            }
            ("poisson_rng", [lambda]) => {
                let eta = unary_arg(lambda, "exp")?;
                Some(("poisson_log_rng", vec![eta.clone()]))
            }
            ("neg_binomial_2_lpmf", [y, mu, phi]) => {
                let eta = unary_arg(mu, "exp")?;
                if let Some((x, alpha, beta)) = glm_parts(eta) {
                    return Some((
                        "neg_binomial_2_log_glm_lpmf",
                        vec![(**y).clone(), x, alpha, beta, (**phi).clone()],
                    ));
                }
                Some((
                    "neg_binomial_2_log_lpmf",
                    vec![(**y).clone(), eta.clone(), (**phi).clone()],
                ))
            }
            ("neg_binomial_2_log_lpmf", [y, eta, phi]) => {
                let (x, alpha, beta) = glm_parts(eta)?;
                Some((
                    "neg_binomial_2_log_glm_lpmf",
                    vec![(**y).clone(), x, alpha, beta, (**phi).clone()],
                ))
            }
            ("neg_binomial_2_rng", [mu, phi]) => {
                let eta = unary_arg(mu, "exp")?;
                Some(("neg_binomial_2_log_rng", vec![eta.clone(), (**phi).clone()]))
            }
            ("normal_lpdf" | "normal_log", [y, mu, sigma]) => {
                let (x, alpha, beta) = glm_parts(mu)?;
                Some((
                    "normal_id_glm_lpdf",
                    vec![(**y).clone(), x, alpha, beta, (**sigma).clone()],
                ))
            }
            ("categorical_lpmf" | "categorical_log", [y, theta]) => {
                let eta = unary_arg(theta, "softmax")?;
                Some(("categorical_logit_lpmf", vec![(**y).clone(), eta.clone()]))
            }
            ("categorical_rng", [theta]) => {
                let eta = unary_arg(theta, "softmax")?;
                Some(("categorical_logit_rng", vec![eta.clone()]))
            }
            ("binomial_lpmf" | "binomial_log", [y, n, theta]) => {
                let eta = unary_arg(theta, "inv_logit")?;
                Some((
                    "binomial_logit_lpmf",
                    vec![(**y).clone(), (**n).clone(), eta.clone()],
                ))
            }
            _ => None,
        }
    }

    fn specialize_log(&self, a: &TypedExpr) -> Option<(&'static str, Vec<TypedExpr>)> {
        if let Some((one, rest)) = binary_args(a, "Minus__") {
            if is_lit(one, 1.0) {
                if let Some(x) = unary_arg(rest, "exp") {
                    return Some(("log1m_exp", vec![x.clone()]));
                }
                if let Some(x) = unary_arg(rest, "inv_logit") {
                    return Some(("log1m_inv_logit", vec![x.clone()]));
                }
                return Some(("log1m", vec![rest.clone()]));
            }
            if let (Some(x), Some(y)) = (unary_arg(one, "exp"), unary_arg(rest, "exp")) {
                return Some(("log_diff_exp", vec![x.clone(), y.clone()]));
            }
        }
        if let Some((lhs, rhs)) = binary_args(a, "Plus__") {
            for (one, rest) in [(lhs, rhs), (rhs, lhs)] {
                if is_lit(one, 1.0) {
                    if let Some(x) = unary_arg(rest, "exp") {
                        return Some(("log1p_exp", vec![x.clone()]));
                    }
                    return Some(("log1p", vec![rest.clone()]));
                }
            }
            if let (Some(x), Some(y)) = (unary_arg(lhs, "exp"), unary_arg(rhs, "exp")) {
                return Some(("log_sum_exp", vec![x.clone(), y.clone()]));
            }
        }
        if let Some(inner) = unary_arg(a, "fabs") {
            if let Some(m) = unary_arg(inner, "determinant") {
                return Some(("log_determinant", vec![m.clone()]));
            }
        }
        if let Some((x, n)) = binary_args(a, "falling_factorial") {
            return Some(("log_falling_factorial", vec![x.clone(), n.clone()]));
        }
        if let Some((x, n)) = binary_args(a, "rising_factorial") {
            return Some(("log_rising_factorial", vec![x.clone(), n.clone()]));
        }
        if let Some(x) = unary_arg(a, "inv_logit") {
            return Some(("log_inv_logit", vec![x.clone()]));
        }
        if let Some(x) = unary_arg(a, "softmax") {
            return Some(("log_softmax", vec![x.clone()]));
        }
        if let Some(s) = unary_arg(a, "sum") {
            if let Some(x) = unary_arg(s, "exp") {
                return Some(("log_sum_exp", vec![x.clone()]));
            }
        }
        None
    }

    fn specialize_times(&self, a: &TypedExpr, b: &TypedExpr) -> Option<(&'static str, Vec<TypedExpr>)> {
        // (diag_matrix(v))' * m * diag_matrix(v)  ->  quad_form_diag(m, v)
        if let Some((ta, mid)) = binary_args(a, "Times__") {
            if let Some(t) = unary_arg(ta, "Transpose__") {
                if let Some(v) = unary_arg(t, "diag_matrix") {
                    if let Some(w) = unary_arg(b, "diag_matrix") {
                        if expr_structural_eq(v, w) {
                            return Some(("quad_form_diag", vec![mid.clone(), v.clone()]));
                        }
                    }
                }
                // b' * a * b  ->  quad_form(a, b)
                if expr_structural_eq(t, b) {
                    return Some(("quad_form", vec![mid.clone(), t.clone()]));
                }
            }
        }
        if let Some(v) = unary_arg(b, "diag_matrix") {
            return Some(("diag_post_multiply", vec![a.clone(), v.clone()]));
        }
        if let Some(v) = unary_arg(a, "diag_matrix") {
            return Some(("diag_pre_multiply", vec![v.clone(), b.clone()]));
        }
        if let Some(inner) = unary_arg(a, "matrix_exp") {
            if let Some((t, m)) = binary_args(inner, "Times__") {
                if t.ty().is_scalar() {
                    return Some((
                        "scale_matrix_exp_multiply",
                        vec![t.clone(), m.clone(), b.clone()],
                    ));
                }
                if m.ty().is_scalar() {
                    return Some((
                        "scale_matrix_exp_multiply",
                        vec![m.clone(), t.clone(), b.clone()],
                    ));
                }
            }
            return Some(("matrix_exp_multiply", vec![inner.clone(), b.clone()]));
        }
        if let Some(y) = unary_arg(b, "log") {
            return Some(("multiply_log", vec![a.clone(), y.clone()]));
        }
        None
    }
}

// =============================================================================
// Literal helpers
// =============================================================================

fn lit_int(e: &TypedExpr) -> Option<i64> {
    match &e.pattern {
        ExprPattern::Lit(LitKind::Int, text) => text.parse().ok(),
        _ => None,
    }
}

fn lit_real(e: &TypedExpr) -> Option<f64> {
    match &e.pattern {
        ExprPattern::Lit(LitKind::Real, text) => text.parse().ok(),
        _ => None,
    }
}

fn lit_num(e: &TypedExpr) -> Option<f64> {
    lit_int(e).map(|v| v as f64).or_else(|| lit_real(e))
}

fn lit_truth(e: &TypedExpr) -> Option<bool> {
    lit_num(e).map(|v| v != 0.0)
}

fn is_lit(e: &TypedExpr, value: f64) -> bool {
    lit_num(e) == Some(value)
}

fn int_lit_expr(v: i64, meta: TypedMeta) -> TypedExpr {
    Expr::new(ExprPattern::Lit(LitKind::Int, v.to_string()), meta)
}

/// Replace a node while keeping the outer type: an int literal standing in
/// for a real-typed position is re-kinded instead of reverted.
fn coerce_to(e: TypedExpr, meta: &TypedMeta) -> TypedExpr {
    if e.ty() == &meta.ty {
        return e;
    }
    if meta.ty == UnsizedType::Real {
        if let Some(v) = lit_int(&e) {
            return Expr::new(
                ExprPattern::Lit(LitKind::Real, v.to_string()),
                TypedMeta {
                    ty: UnsizedType::Real,
                    ad: e.meta.ad,
                    span: e.meta.span,
                },
            );
        }
    }
    e
}

// =============================================================================
// Shape helpers
// =============================================================================

fn call_args<'e>(e: &'e TypedExpr, name: &str) -> Option<&'e [Box<TypedExpr>]> {
    match &e.pattern {
        ExprPattern::FunApp(_, n, args) if n == name => Some(args),
        _ => None,
    }
}

fn unary_arg<'e>(e: &'e TypedExpr, name: &str) -> Option<&'e TypedExpr> {
    match call_args(e, name) {
        Some([a]) => Some(a),
        _ => None,
    }
}

fn binary_args<'e>(e: &'e TypedExpr, name: &str) -> Option<(&'e TypedExpr, &'e TypedExpr)> {
    match call_args(e, name) {
        Some([a, b]) => Some((a, b)),
        _ => None,
    }
}

/// Decompose a linear predictor `alpha + x * beta`, `x * beta + alpha`, or
/// `x * beta` (zero intercept) with a matrix of covariates.
fn glm_parts(eta: &TypedExpr) -> Option<(TypedExpr, TypedExpr, TypedExpr)> {
    fn design_product(e: &TypedExpr) -> Option<(TypedExpr, TypedExpr)> {
        let (x, beta) = binary_args(e, "Times__")?;
        if *x.ty() == UnsizedType::Matrix {
            Some((x.clone(), beta.clone()))
        } else {
            None
        }
    }

    if let Some((lhs, rhs)) = binary_args(eta, "Plus__") {
        if let Some((x, beta)) = design_product(rhs) {
            return Some((x, lhs.clone(), beta));
        }
        if let Some((x, beta)) = design_product(lhs) {
            return Some((x, rhs.clone(), beta));
        }
        return None;
    }
    if let Some((x, beta)) = design_product(eta) {
        let zero = Expr::new(
            ExprPattern::Lit(LitKind::Int, "0".to_string()),
            TypedMeta {
                ty: UnsizedType::Int,
                ad: crate::types::AdLevel::DataOnly,
                span: eta.meta.span.clone(),
            },
        );
        return Some((x, zero, beta));
    }
    None
}

// =============================================================================
// Constant folding
// =============================================================================

/// Evaluate an operator call on literal operands. Division or modulo by a
/// zero literal is left in place for the runtime to report.
fn fold_constants(
    name: &str,
    args: &[Box<TypedExpr>],
) -> Option<ExprPattern<Box<TypedExpr>>> {
    match args {
        [a] => {
            if let Some(v) = lit_int(a) {
                let folded = match name {
                    "PPlus__" => v,
                    "PMinus__" => v.checked_neg()?,
                    "PNot__" => (v == 0) as i64,
                    _ => return None,
                };
                return Some(ExprPattern::Lit(LitKind::Int, folded.to_string()));
            }
            if let Some(v) = lit_real(a) {
                let folded = match name {
                    "PPlus__" => v,
                    "PMinus__" => -v,
                    _ => return None,
                };
                return Some(ExprPattern::Lit(LitKind::Real, folded.to_string()));
            }
            None
        }
        [a, b] => {
            if let (Some(l), Some(r)) = (lit_int(a), lit_int(b)) {
                return fold_int_binop(name, l, r);
            }
            if let (Some(l), Some(r)) = (lit_num(a), lit_num(b)) {
                return fold_real_binop(name, l, r);
            }
            None
        }
        _ => None,
    }
}

fn fold_int_binop(name: &str, l: i64, r: i64) -> Option<ExprPattern<Box<TypedExpr>>> {
    let arith = match name {
        "Plus__" => l.checked_add(r),
        "Minus__" => l.checked_sub(r),
        "Times__" => l.checked_mul(r),
        "Divide__" if r != 0 => l.checked_div(r),
        "Modulo__" if r != 0 => l.checked_rem(r),
        _ => None,
    };
    if let Some(v) = arith {
        return Some(ExprPattern::Lit(LitKind::Int, v.to_string()));
    }
    let logical = match name {
        "Equals__" => Some(l == r),
        "NEquals__" => Some(l != r),
        "Less__" => Some(l < r),
        "Leq__" => Some(l <= r),
        "Greater__" => Some(l > r),
        "Geq__" => Some(l >= r),
        "And__" => Some(l != 0 && r != 0),
        "Or__" => Some(l != 0 || r != 0),
        _ => None,
    }?;
    Some(ExprPattern::Lit(LitKind::Int, (logical as i64).to_string()))
}

fn fold_real_binop(name: &str, l: f64, r: f64) -> Option<ExprPattern<Box<TypedExpr>>> {
    let arith = match name {
        "Plus__" => Some(l + r),
        "Minus__" => Some(l - r),
        "Times__" => Some(l * r),
        "Divide__" if r != 0.0 => Some(l / r),
        _ => None,
    };
    if let Some(v) = arith {
        return Some(ExprPattern::Lit(LitKind::Real, v.to_string()));
    }
    let logical = match name {
        "Equals__" => Some(l == r),
        "NEquals__" => Some(l != r),
        "Less__" => Some(l < r),
        "Leq__" => Some(l <= r),
        "Greater__" => Some(l > r),
        "Geq__" => Some(l >= r),
        "And__" => Some(l != 0.0 && r != 0.0),
        "Or__" => Some(l != 0.0 || r != 0.0),
        _ => None,
    }?;
    Some(ExprPattern::Lit(LitKind::Int, (logical as i64).to_string()))
}
