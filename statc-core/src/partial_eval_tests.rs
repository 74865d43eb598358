//! Tests for the partial evaluator.

use crate::ir::*;
use crate::partial_eval::eval_program;
use crate::stdlib::StdLib;
use crate::types::{AdLevel, UnsizedType};
use crate::Span;

// =============================================================================
// Test helpers - typed MIR construction
// =============================================================================

fn tmeta(ty: UnsizedType) -> TypedMeta {
    TypedMeta {
        ty,
        ad: AdLevel::AutoDiffable,
        span: Span::dummy(),
    }
}

fn dmeta(ty: UnsizedType) -> TypedMeta {
    TypedMeta {
        ty,
        ad: AdLevel::DataOnly,
        span: Span::dummy(),
    }
}

fn var(name: &str, ty: UnsizedType) -> TypedExpr {
    Expr::new(ExprPattern::Var(name.to_string()), tmeta(ty))
}

fn data_var(name: &str, ty: UnsizedType) -> TypedExpr {
    Expr::new(ExprPattern::Var(name.to_string()), dmeta(ty))
}

fn int(n: i64) -> TypedExpr {
    Expr::new(
        ExprPattern::Lit(LitKind::Int, n.to_string()),
        dmeta(UnsizedType::Int),
    )
}

fn real(text: &str) -> TypedExpr {
    Expr::new(
        ExprPattern::Lit(LitKind::Real, text.to_string()),
        dmeta(UnsizedType::Real),
    )
}

fn call(name: &str, args: Vec<TypedExpr>, ty: UnsizedType) -> TypedExpr {
    Expr::new(
        ExprPattern::FunApp(
            FnKind::MathLib,
            name.to_string(),
            args.into_iter().map(Box::new).collect(),
        ),
        tmeta(ty),
    )
}

fn internal(name: &str, args: Vec<TypedExpr>, ty: UnsizedType) -> TypedExpr {
    Expr::new(
        ExprPattern::FunApp(
            FnKind::CompilerInternal,
            name.to_string(),
            args.into_iter().map(Box::new).collect(),
        ),
        tmeta(ty),
    )
}

fn stmt(pattern: StmtPattern<TypedExpr, Box<TypedStmt>>) -> TypedStmt {
    Stmt::new(pattern, SpanMeta::default())
}

fn model_with(e: TypedExpr) -> MirProgram {
    Program {
        name: "m".to_string(),
        model: Some(vec![stmt(StmtPattern::TargetPlusEq(e))]),
        ..Program::default()
    }
}

fn eval(program: MirProgram) -> MirProgram {
    eval_program(program, StdLib::instance())
}

/// Evaluate a single expression through a one-statement model.
fn eval_expr(e: TypedExpr) -> TypedExpr {
    let out = eval(model_with(e));
    let model = out.model.unwrap();
    match model.into_iter().next().unwrap().pattern {
        StmtPattern::TargetPlusEq(e) => e,
        other => panic!("unexpected pattern {:?}", other),
    }
}

fn assert_call(e: &TypedExpr, name: &str, arity: usize) {
    match &e.pattern {
        ExprPattern::FunApp(_, n, args) => {
            assert_eq!(n, name);
            assert_eq!(args.len(), arity);
        }
        other => panic!("expected a call to {}, got {:?}", name, other),
    }
}

fn assert_lit(e: &TypedExpr, kind: LitKind, text: &str) {
    match &e.pattern {
        ExprPattern::Lit(k, t) => {
            assert_eq!(*k, kind);
            assert_eq!(t, text);
        }
        other => panic!("expected literal {}, got {:?}", text, other),
    }
}

// =============================================================================
// Constant folding
// =============================================================================

#[test]
fn integer_arithmetic_folds() {
    let e = eval_expr(call(
        "Plus__",
        vec![int(1), int(2)],
        UnsizedType::Int,
    ));
    assert_lit(&e, LitKind::Int, "3");

    // Integer division truncates.
    let e = eval_expr(call("Divide__", vec![int(7), int(2)], UnsizedType::Int));
    assert_lit(&e, LitKind::Int, "3");
}

#[test]
fn division_by_zero_is_left_for_the_runtime() {
    let e = eval_expr(call("Divide__", vec![int(1), int(0)], UnsizedType::Int));
    assert_call(&e, "Divide__", 2);
}

#[test]
fn mixed_arithmetic_folds_to_real() {
    let e = eval_expr(call(
        "Plus__",
        vec![int(1), real("2.5")],
        UnsizedType::Real,
    ));
    assert_lit(&e, LitKind::Real, "3.5");
}

#[test]
fn comparisons_fold_to_int() {
    let e = eval_expr(call(
        "Less__",
        vec![real("1.5"), real("2.5")],
        UnsizedType::Int,
    ));
    assert_lit(&e, LitKind::Int, "1");
}

#[test]
fn prefix_operators_fold() {
    let e = eval_expr(call("PMinus__", vec![int(3)], UnsizedType::Int));
    assert_lit(&e, LitKind::Int, "-3");

    let e = eval_expr(call("PNot__", vec![int(0)], UnsizedType::Int));
    assert_lit(&e, LitKind::Int, "1");
}

#[test]
fn logical_short_circuit_on_literals() {
    let e = eval_expr(Expr::new(
        ExprPattern::EAnd(Box::new(int(1)), Box::new(int(0))),
        dmeta(UnsizedType::Int),
    ));
    assert_lit(&e, LitKind::Int, "0");

    let e = eval_expr(Expr::new(
        ExprPattern::EOr(Box::new(int(0)), Box::new(real("2.5"))),
        dmeta(UnsizedType::Int),
    ));
    assert_lit(&e, LitKind::Int, "1");
}

#[test]
fn ternary_folds_on_literal_condition() {
    let e = eval_expr(Expr::new(
        ExprPattern::TernaryIf(
            Box::new(int(0)),
            Box::new(var("a", UnsizedType::Real)),
            Box::new(var("b", UnsizedType::Real)),
        ),
        tmeta(UnsizedType::Real),
    ));
    match &e.pattern {
        ExprPattern::Var(name) => assert_eq!(name, "b"),
        other => panic!("expected the else branch, got {:?}", other),
    }
}

#[test]
fn ternary_fold_rekinds_int_literals_in_real_position() {
    let e = eval_expr(Expr::new(
        ExprPattern::TernaryIf(Box::new(int(1)), Box::new(int(2)), Box::new(real("3.5"))),
        tmeta(UnsizedType::Real),
    ));
    assert_lit(&e, LitKind::Real, "2");
    assert_eq!(e.ty(), &UnsizedType::Real);
}

#[test]
fn dead_if_branches_are_eliminated() {
    let program = Program {
        name: "m".to_string(),
        model: Some(vec![stmt(StmtPattern::IfElse(
            int(0),
            Box::new(stmt(StmtPattern::Break)),
            Some(Box::new(stmt(StmtPattern::Skip))),
        ))]),
        ..Program::default()
    };
    let out = eval(program);
    let model = out.model.unwrap();
    assert!(matches!(model[0].pattern, StmtPattern::Skip));
}

// =============================================================================
// Specialized rewrites
// =============================================================================

#[test]
fn log_one_minus_exp_specializes() {
    let x = var("x", UnsizedType::Real);
    let inner = call(
        "Minus__",
        vec![int(1), call("exp", vec![x], UnsizedType::Real)],
        UnsizedType::Real,
    );
    let e = eval_expr(call("log", vec![inner], UnsizedType::Real));
    assert_call(&e, "log1m_exp", 1);
}

#[test]
fn log_one_minus_specializes_by_shape() {
    let x = var("x", UnsizedType::Real);
    let inner = call("Minus__", vec![int(1), x], UnsizedType::Real);
    let e = eval_expr(call("log", vec![inner], UnsizedType::Real));
    assert_call(&e, "log1m", 1);

    let x = var("x", UnsizedType::Real);
    let il = call("inv_logit", vec![x], UnsizedType::Real);
    let inner = call("Minus__", vec![int(1), il], UnsizedType::Real);
    let e = eval_expr(call("log", vec![inner], UnsizedType::Real));
    assert_call(&e, "log1m_inv_logit", 1);
}

#[test]
fn log_one_plus_accepts_both_operand_orders() {
    let x = var("x", UnsizedType::Real);
    let inner = call("Plus__", vec![x, int(1)], UnsizedType::Real);
    let e = eval_expr(call("log", vec![inner], UnsizedType::Real));
    assert_call(&e, "log1p", 1);

    let x = var("x", UnsizedType::Real);
    let inner = call(
        "Plus__",
        vec![int(1), call("exp", vec![x], UnsizedType::Real)],
        UnsizedType::Real,
    );
    let e = eval_expr(call("log", vec![inner], UnsizedType::Real));
    assert_call(&e, "log1p_exp", 1);
}

#[test]
fn log_determinant_specializes() {
    let m = var("m", UnsizedType::Matrix);
    let det = call("determinant", vec![m], UnsizedType::Real);
    let inner = call("fabs", vec![det], UnsizedType::Real);
    let e = eval_expr(call("log", vec![inner], UnsizedType::Real));
    assert_call(&e, "log_determinant", 1);
}

#[test]
fn log_sum_exp_family() {
    let x = var("x", UnsizedType::Real);
    let y = var("y", UnsizedType::Real);
    let sum = call(
        "Plus__",
        vec![
            call("exp", vec![x], UnsizedType::Real),
            call("exp", vec![y], UnsizedType::Real),
        ],
        UnsizedType::Real,
    );
    let e = eval_expr(call("log", vec![sum], UnsizedType::Real));
    assert_call(&e, "log_sum_exp", 2);

    let v = var("v", UnsizedType::Vector);
    let inner = call(
        "sum",
        vec![call("exp", vec![v], UnsizedType::Vector)],
        UnsizedType::Real,
    );
    let e = eval_expr(call("log", vec![inner], UnsizedType::Real));
    assert_call(&e, "log_sum_exp", 1);

    let x = var("x", UnsizedType::Real);
    let y = var("y", UnsizedType::Real);
    let diff = call(
        "Minus__",
        vec![
            call("exp", vec![x], UnsizedType::Real),
            call("exp", vec![y], UnsizedType::Real),
        ],
        UnsizedType::Real,
    );
    let e = eval_expr(call("log", vec![diff], UnsizedType::Real));
    assert_call(&e, "log_diff_exp", 2);
}

#[test]
fn expm1_and_complementary_functions() {
    let x = var("x", UnsizedType::Real);
    let e = eval_expr(call(
        "Minus__",
        vec![call("exp", vec![x], UnsizedType::Real), int(1)],
        UnsizedType::Real,
    ));
    assert_call(&e, "expm1", 1);

    let x = var("x", UnsizedType::Real);
    let e = eval_expr(call(
        "Minus__",
        vec![int(1), call("erf", vec![x], UnsizedType::Real)],
        UnsizedType::Real,
    ));
    assert_call(&e, "erfc", 1);

    let x = var("x", UnsizedType::Real);
    let y = var("y", UnsizedType::Real);
    let e = eval_expr(call(
        "Minus__",
        vec![int(1), call("gamma_p", vec![x, y], UnsizedType::Real)],
        UnsizedType::Real,
    ));
    assert_call(&e, "gamma_q", 2);
}

#[test]
fn fma_accepts_both_operand_orders() {
    let product = || {
        call(
            "Times__",
            vec![var("x", UnsizedType::Real), var("y", UnsizedType::Real)],
            UnsizedType::Real,
        )
    };
    let e = eval_expr(call(
        "Plus__",
        vec![product(), var("z", UnsizedType::Real)],
        UnsizedType::Real,
    ));
    assert_call(&e, "fma", 3);

    let e = eval_expr(call(
        "Plus__",
        vec![var("z", UnsizedType::Real), product()],
        UnsizedType::Real,
    ));
    assert_call(&e, "fma", 3);
}

#[test]
fn pow_specializations() {
    let x = var("x", UnsizedType::Int);
    let e = eval_expr(call("Pow__", vec![int(2), x], UnsizedType::Real));
    assert_call(&e, "exp2", 1);

    let x = var("x", UnsizedType::Real);
    let e = eval_expr(call("Pow__", vec![x, int(2)], UnsizedType::Real));
    assert_call(&e, "square", 1);

    let x = var("x", UnsizedType::Real);
    let e = eval_expr(call("Pow__", vec![x, real("0.5")], UnsizedType::Real));
    assert_call(&e, "sqrt", 1);
}

#[test]
fn sqrt_two_becomes_a_constant_call() {
    let e = eval_expr(call("sqrt", vec![int(2)], UnsizedType::Real));
    assert_call(&e, "sqrt2", 0);
}

#[test]
fn variance_and_distance_idioms() {
    let v = var("v", UnsizedType::Vector);
    let e = eval_expr(call(
        "square",
        vec![call("sd", vec![v], UnsizedType::Real)],
        UnsizedType::Real,
    ));
    assert_call(&e, "variance", 1);

    let x = var("x", UnsizedType::Vector);
    let y = var("y", UnsizedType::Vector);
    let diff = call("Minus__", vec![x, y], UnsizedType::Vector);
    let sq = call("square", vec![diff], UnsizedType::Vector);
    let e = eval_expr(call("sum", vec![sq], UnsizedType::Real));
    assert_call(&e, "squared_distance", 2);
}

#[test]
fn trace_idioms() {
    let m = var("m", UnsizedType::Matrix);
    let diag = call("diagonal", vec![m], UnsizedType::Vector);
    let e = eval_expr(call("sum", vec![diag], UnsizedType::Real));
    assert_call(&e, "trace", 1);

    let a = var("a", UnsizedType::Matrix);
    let b = var("b", UnsizedType::Matrix);
    let qf = call("quad_form", vec![a, b], UnsizedType::Matrix);
    let e = eval_expr(call("trace", vec![qf], UnsizedType::Real));
    assert_call(&e, "trace_quad_form", 2);
}

#[test]
fn quad_form_idiom() {
    let a = var("a", UnsizedType::Matrix);
    let b = || var("b", UnsizedType::Matrix);
    let bt = call("Transpose__", vec![b()], UnsizedType::Matrix);
    let bta = call("Times__", vec![bt, a], UnsizedType::Matrix);
    let e = eval_expr(call("Times__", vec![bta, b()], UnsizedType::Matrix));
    assert_call(&e, "quad_form", 2);
}

#[test]
fn diag_multiply_idioms() {
    let m = var("m", UnsizedType::Matrix);
    let v = var("v", UnsizedType::Vector);
    let dm = call("diag_matrix", vec![v], UnsizedType::Matrix);
    let e = eval_expr(call("Times__", vec![m, dm], UnsizedType::Matrix));
    assert_call(&e, "diag_post_multiply", 2);

    let m = var("m", UnsizedType::Matrix);
    let v = var("v", UnsizedType::Vector);
    let dm = call("diag_matrix", vec![v], UnsizedType::Matrix);
    let e = eval_expr(call("Times__", vec![dm, m], UnsizedType::Matrix));
    assert_call(&e, "diag_pre_multiply", 2);
}

#[test]
fn matrix_exp_products() {
    let a = var("a", UnsizedType::Matrix);
    let b = var("b", UnsizedType::Matrix);
    let me = call("matrix_exp", vec![a], UnsizedType::Matrix);
    let e = eval_expr(call("Times__", vec![me, b], UnsizedType::Matrix));
    assert_call(&e, "matrix_exp_multiply", 2);

    let t = var("t", UnsizedType::Real);
    let a = var("a", UnsizedType::Matrix);
    let b = var("b", UnsizedType::Matrix);
    let ta = call("Times__", vec![t, a], UnsizedType::Matrix);
    let me = call("matrix_exp", vec![ta], UnsizedType::Matrix);
    let e = eval_expr(call("Times__", vec![me, b], UnsizedType::Matrix));
    assert_call(&e, "scale_matrix_exp_multiply", 3);
}

#[test]
fn multiply_log_only_for_scalars() {
    let x = var("x", UnsizedType::Real);
    let y = var("y", UnsizedType::Real);
    let e = eval_expr(call(
        "Times__",
        vec![x, call("log", vec![y], UnsizedType::Real)],
        UnsizedType::Real,
    ));
    assert_call(&e, "multiply_log", 2);

    // On matrices the candidate has no signature and must be reverted.
    let m = var("m", UnsizedType::Matrix);
    let n = var("n", UnsizedType::Matrix);
    let e = eval_expr(call(
        "Times__",
        vec![m, call("log", vec![n], UnsizedType::Matrix)],
        UnsizedType::Matrix,
    ));
    assert_call(&e, "Times__", 2);
}

#[test]
fn self_product_rewrites_need_structural_equality() {
    let v = || var("v", UnsizedType::Vector);
    let e = eval_expr(call("dot_product", vec![v(), v()], UnsizedType::Real));
    assert_call(&e, "dot_self", 1);

    let w = var("w", UnsizedType::Vector);
    let e = eval_expr(call("dot_product", vec![v(), w], UnsizedType::Real));
    assert_call(&e, "dot_product", 2);
}

#[test]
fn inv_compositions() {
    let x = var("x", UnsizedType::Real);
    let e = eval_expr(call(
        "inv",
        vec![call("sqrt", vec![x], UnsizedType::Real)],
        UnsizedType::Real,
    ));
    assert_call(&e, "inv_sqrt", 1);

    let x = var("x", UnsizedType::Real);
    let e = eval_expr(call(
        "inv",
        vec![call("square", vec![x], UnsizedType::Real)],
        UnsizedType::Real,
    ));
    assert_call(&e, "inv_square", 1);
}

// =============================================================================
// GLM fusions
// =============================================================================

fn int_array() -> UnsizedType {
    UnsizedType::array_of(UnsizedType::Int)
}

fn linear_predictor(alpha_first: bool) -> TypedExpr {
    let x = data_var("x", UnsizedType::Matrix);
    let beta = var("beta", UnsizedType::Vector);
    let alpha = var("alpha", UnsizedType::Vector);
    let xb = call("Times__", vec![x, beta], UnsizedType::Vector);
    let args = if alpha_first { vec![alpha, xb] } else { vec![xb, alpha] };
    call("Plus__", args, UnsizedType::Vector)
}

#[test]
fn bernoulli_glm_fusion_accepts_both_operand_orders() {
    for alpha_first in [true, false] {
        let theta = call("inv_logit", vec![linear_predictor(alpha_first)], UnsizedType::Vector);
        let e = eval_expr(call(
            "bernoulli_lpmf",
            vec![data_var("y", int_array()), theta],
            UnsizedType::Real,
        ));
        assert_call(&e, "bernoulli_logit_glm_lpmf", 4);
    }
}

#[test]
fn bernoulli_glm_fusion_zero_intercept() {
    let x = data_var("x", UnsizedType::Matrix);
    let beta = var("beta", UnsizedType::Vector);
    let xb = call("Times__", vec![x, beta], UnsizedType::Vector);
    let theta = call("inv_logit", vec![xb], UnsizedType::Vector);
    let e = eval_expr(call(
        "bernoulli_lpmf",
        vec![data_var("y", int_array()), theta],
        UnsizedType::Real,
    ));
    assert_call(&e, "bernoulli_logit_glm_lpmf", 4);
    match &e.pattern {
        ExprPattern::FunApp(_, _, args) => {
            // The intercept is a synthesized zero.
            assert!(matches!(
                &args[2].pattern,
                ExprPattern::Lit(LitKind::Int, z) if z == "0"
            ));
        }
        other => panic!("unexpected pattern {:?}", other),
    }
}

#[test]
fn bernoulli_logit_link_equivalence() {
    let alpha = var("alpha", UnsizedType::Vector);
    let theta = call("inv_logit", vec![alpha], UnsizedType::Vector);
    let e = eval_expr(call(
        "bernoulli_lpmf",
        vec![data_var("y", int_array()), theta],
        UnsizedType::Real,
    ));
    assert_call(&e, "bernoulli_logit_lpmf", 2);
}

#[test]
fn poisson_glm_fusion() {
    let lambda = call("exp", vec![linear_predictor(true)], UnsizedType::Vector);
    let e = eval_expr(call(
        "poisson_lpmf",
        vec![data_var("y", int_array()), lambda],
        UnsizedType::Real,
    ));
    assert_call(&e, "poisson_log_glm_lpmf", 4);
}

#[test]
fn neg_binomial_glm_fusion() {
    let mu = call("exp", vec![linear_predictor(true)], UnsizedType::Vector);
    let e = eval_expr(call(
        "neg_binomial_2_lpmf",
        vec![data_var("y", int_array()), mu, var("phi", UnsizedType::Real)],
        UnsizedType::Real,
    ));
    assert_call(&e, "neg_binomial_2_log_glm_lpmf", 5);
}

#[test]
fn normal_identity_glm_fusion() {
    let e = eval_expr(call(
        "normal_lpdf",
        vec![
            data_var("y", UnsizedType::Vector),
            linear_predictor(true),
            var("sigma", UnsizedType::Real),
        ],
        UnsizedType::Real,
    ));
    assert_call(&e, "normal_id_glm_lpdf", 5);
}

#[test]
fn glm_fusion_requires_a_matrix_of_covariates() {
    // With a scalar design "matrix" nothing should fuse; the predictor is
    // folded to fma instead, which is still a valid scalar call.
    let x = var("x", UnsizedType::Real);
    let beta = var("beta", UnsizedType::Real);
    let alpha = var("alpha", UnsizedType::Real);
    let xb = call("Times__", vec![x, beta], UnsizedType::Real);
    let eta = call("Plus__", vec![alpha, xb], UnsizedType::Real);
    let theta = call("inv_logit", vec![eta], UnsizedType::Real);
    let e = eval_expr(call(
        "bernoulli_lpmf",
        vec![data_var("y", UnsizedType::Int), theta],
        UnsizedType::Real,
    ));
    assert_call(&e, "bernoulli_logit_lpmf", 2);
}

#[test]
fn rng_equivalences() {
    let alpha = data_var("alpha", UnsizedType::Real);
    let theta = call("inv_logit", vec![alpha], UnsizedType::Real);
    let e = eval_expr(call("bernoulli_rng", vec![theta], UnsizedType::Int));
    assert_call(&e, "bernoulli_logit_rng", 1);

    let alpha = data_var("alpha", UnsizedType::Real);
    let lambda = call("exp", vec![alpha], UnsizedType::Real);
    let e = eval_expr(call("poisson_rng", vec![lambda], UnsizedType::Int));
    assert_call(&e, "poisson_log_rng", 1);
}

#[test]
fn categorical_and_binomial_equivalences() {
    let alpha = var("alpha", UnsizedType::Vector);
    let theta = call("softmax", vec![alpha], UnsizedType::Vector);
    let e = eval_expr(call(
        "categorical_lpmf",
        vec![data_var("y", UnsizedType::Int), theta],
        UnsizedType::Real,
    ));
    assert_call(&e, "categorical_logit_lpmf", 2);

    let alpha = var("alpha", UnsizedType::Real);
    let theta = call("inv_logit", vec![alpha], UnsizedType::Real);
    let e = eval_expr(call(
        "binomial_lpmf",
        vec![data_var("y", UnsizedType::Int), data_var("n", UnsizedType::Int), theta],
        UnsizedType::Real,
    ));
    assert_call(&e, "binomial_logit_lpmf", 3);
}

// =============================================================================
// Index folding
// =============================================================================

#[test]
fn literal_index_into_array_literal_folds() {
    let arr = internal(
        "make_array",
        vec![int(10), int(20), int(30)],
        int_array(),
    );
    let e = eval_expr(Expr::new(
        ExprPattern::Indexed(Box::new(arr), vec![Index::Single(Box::new(int(2)))]),
        dmeta(UnsizedType::Int),
    ));
    assert_lit(&e, LitKind::Int, "20");
}

#[test]
fn out_of_range_literal_index_is_left_alone() {
    let arr = internal("make_array", vec![int(10), int(20)], int_array());
    let e = eval_expr(Expr::new(
        ExprPattern::Indexed(Box::new(arr), vec![Index::Single(Box::new(int(3)))]),
        dmeta(UnsizedType::Int),
    ));
    assert!(matches!(e.pattern, ExprPattern::Indexed(_, _)));
}

#[test]
fn literal_multi_index_selects_a_sub_literal() {
    let arr = internal(
        "make_array",
        vec![int(10), int(20), int(30)],
        int_array(),
    );
    let picks = internal("make_array", vec![int(3), int(1)], int_array());
    let e = eval_expr(Expr::new(
        ExprPattern::Indexed(Box::new(arr), vec![Index::Multi(Box::new(picks))]),
        dmeta(int_array()),
    ));
    match &e.pattern {
        ExprPattern::FunApp(_, name, args) => {
            assert_eq!(name, "make_array");
            assert_eq!(args.len(), 2);
            assert_lit(&args[0], LitKind::Int, "30");
            assert_lit(&args[1], LitKind::Int, "10");
        }
        other => panic!("unexpected pattern {:?}", other),
    }
}

// =============================================================================
// Global properties
// =============================================================================

#[test]
fn evaluation_is_idempotent() {
    let x = var("x", UnsizedType::Real);
    let log1m = call(
        "log",
        vec![call(
            "Minus__",
            vec![int(1), call("exp", vec![x], UnsizedType::Real)],
            UnsizedType::Real,
        )],
        UnsizedType::Real,
    );
    let sum = call("Plus__", vec![log1m, call(
        "Times__",
        vec![var("y", UnsizedType::Real), var("z", UnsizedType::Real)],
        UnsizedType::Real,
    )], UnsizedType::Real);
    let program = model_with(sum);

    let once = eval(program);
    let twice = eval(once.clone());
    assert_eq!(once, twice);
}

#[test]
fn evaluation_preserves_types() {
    let x = var("x", UnsizedType::Real);
    let e = eval_expr(call(
        "Pow__",
        vec![x, int(2)],
        UnsizedType::Real,
    ));
    assert_eq!(e.ty(), &UnsizedType::Real);

    let e = eval_expr(call("Plus__", vec![int(2), int(3)], UnsizedType::Int));
    assert_eq!(e.ty(), &UnsizedType::Int);
}
