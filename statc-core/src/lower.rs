//! Lowering from the typed AST to canonical MIR.
//!
//! The translation is mechanical and total: variable identities, source
//! spans, and function kinds are preserved. What changes is sugar:
//!
//! - operator applications become math-library calls under their catalog
//!   names (`Plus__`, `Transpose__`, ...),
//! - conditional-distribution applications become ordinary suffixed calls,
//! - `~` statements become `target +=` increments, with truncation bounds
//!   folded in through the cumulative distribution functions,
//! - foreach loops become counted loops over an internal `length` call,
//!   with compiler-generated names carrying the reserved `__` suffix.

use std::cell::Cell;

use crate::ir::*;
use crate::stdlib::StdLib;
use crate::types::{AdLevel, ReturnType, UnsizedType};
use crate::Span;

/// Lower a typed program to canonical MIR.
pub fn to_mir(program: TypedProgram, stdlib: &StdLib) -> MirProgram {
    let lowerer = Lowerer {
        stdlib,
        next_sym: Cell::new(0),
    };
    program.map_stmts(|s| lowerer.lower_stmt(s))
}

struct Lowerer<'a> {
    stdlib: &'a StdLib,
    next_sym: Cell<u32>,
}

impl<'a> Lowerer<'a> {
    fn gensym(&self) -> String {
        let id = self.next_sym.get();
        self.next_sym.set(id + 1);
        format!("sym{}__", id)
    }

    fn fn_kind(&self, name: &str) -> FnKind {
        if self.stdlib.is_math_lib_fn(name) {
            FnKind::MathLib
        } else {
            FnKind::UserDefined
        }
    }

    fn lower_expr(&self, e: TypedExpr) -> TypedExpr {
        let Expr { pattern, meta } = e;
        let pattern = pattern.map(&mut |child: Box<TypedExpr>| Box::new(self.lower_expr(*child)));
        let pattern = match pattern {
            ExprPattern::BinOp(op, lhs, rhs) => {
                ExprPattern::FunApp(FnKind::MathLib, op.fn_name().to_string(), vec![lhs, rhs])
            }
            ExprPattern::PrefixOp(op, operand) => {
                ExprPattern::FunApp(FnKind::MathLib, op.fn_name().to_string(), vec![operand])
            }
            ExprPattern::PostfixOp(operand, op) => {
                ExprPattern::FunApp(FnKind::MathLib, op.fn_name().to_string(), vec![operand])
            }
            ExprPattern::CondDistApp(name, args) => {
                let kind = self.fn_kind(&name);
                ExprPattern::FunApp(kind, name, args)
            }
            other => other,
        };
        Expr { pattern, meta }
    }

    fn lower_stmt(&self, s: TypedStmt) -> TypedStmt {
        let Stmt { pattern, meta } = s;
        let pattern = pattern.map(
            &mut |e: TypedExpr| self.lower_expr(e),
            &mut |child: Box<TypedStmt>| Box::new(self.lower_stmt(*child)),
        );
        let span = meta.span.clone();
        let pattern = match pattern {
            StmtPattern::Tilde {
                arg,
                distribution,
                args,
                truncation,
            } => self.lower_tilde(arg, distribution, args, truncation, &span),
            StmtPattern::ForEach(loopvar, container, body) => {
                self.lower_foreach(loopvar, container, *body, &span)
            }
            other => other,
        };
        Stmt { pattern, meta }
    }

    /// `arg ~ dist(args) T[..]` becomes a target increment of the resolved
    /// density call, minus the truncation's cumulative terms.
    fn lower_tilde(
        &self,
        arg: TypedExpr,
        distribution: String,
        args: Vec<TypedExpr>,
        truncation: Truncation<TypedExpr>,
        span: &Span,
    ) -> StmtPattern<TypedExpr, Box<TypedStmt>> {
        let ad = args.iter().fold(arg.ad(), |acc, a| acc.lub(a.ad()));
        let suffix = self.resolve_density_suffix(&distribution, &arg, &args);
        let density_name = format!("{}{}", distribution, suffix);
        let kind = self.fn_kind(&density_name);

        let mut density_args = Vec::with_capacity(args.len() + 1);
        density_args.push(Box::new(arg));
        density_args.extend(args.iter().cloned().map(Box::new));
        let density = real_call(kind, density_name, density_args, ad, span);

        let adjusted = match truncation {
            Truncation::NoTruncate => density,
            Truncation::TruncateUpFrom(lb) => {
                let ccdf = self.cdf_call(&distribution, "_lccdf", lb, &args, ad, span);
                minus(density, ccdf, ad, span)
            }
            Truncation::TruncateDownFrom(ub) => {
                let cdf = self.cdf_call(&distribution, "_lcdf", ub, &args, ad, span);
                minus(density, cdf, ad, span)
            }
            Truncation::TruncateBetween(lb, ub) => {
                let cdf_ub = self.cdf_call(&distribution, "_lcdf", ub, &args, ad, span);
                let cdf_lb = self.cdf_call(&distribution, "_lcdf", lb, &args, ad, span);
                let window = real_call(
                    FnKind::MathLib,
                    "log_diff_exp".to_string(),
                    vec![Box::new(cdf_ub), Box::new(cdf_lb)],
                    ad,
                    span,
                );
                minus(density, window, ad, span)
            }
        };
        StmtPattern::TargetPlusEq(adjusted)
    }

    /// Pick the density/mass suffix the analyzer resolved the sampling
    /// statement under. User-defined distributions default to `_lpdf`.
    fn resolve_density_suffix(
        &self,
        distribution: &str,
        arg: &TypedExpr,
        args: &[TypedExpr],
    ) -> &'static str {
        let mut sigs = Vec::with_capacity(args.len() + 1);
        sigs.push((arg.ad(), arg.ty().clone()));
        sigs.extend(args.iter().map(|a| (a.ad(), a.ty().clone())));
        for suffix in ["_lpdf", "_lpmf", "_log"] {
            let full = format!("{}{}", distribution, suffix);
            if matches!(
                self.stdlib.return_type(&full, &sigs),
                Some(ReturnType::NonVoid(_))
            ) {
                return suffix;
            }
        }
        "_lpdf"
    }

    fn cdf_call(
        &self,
        distribution: &str,
        suffix: &str,
        bound: TypedExpr,
        args: &[TypedExpr],
        ad: AdLevel,
        span: &Span,
    ) -> TypedExpr {
        let name = format!("{}{}", distribution, suffix);
        let kind = self.fn_kind(&name);
        let mut call_args = Vec::with_capacity(args.len() + 1);
        call_args.push(Box::new(bound));
        call_args.extend(args.iter().cloned().map(Box::new));
        real_call(kind, name, call_args, ad, span)
    }

    /// `for (v in c) body` becomes a counted loop over the container's
    /// length, binding `v` by indexing at the loop counter.
    fn lower_foreach(
        &self,
        loopvar: String,
        container: TypedExpr,
        body: TypedStmt,
        span: &Span,
    ) -> StmtPattern<TypedExpr, Box<TypedStmt>> {
        let counter = self.gensym();
        let elem_ty = match container.ty() {
            UnsizedType::Array(elem) => (**elem).clone(),
            _ => UnsizedType::Real,
        };
        let elem_ad = container.ad();

        let int_meta = |span: &Span| TypedMeta {
            ty: UnsizedType::Int,
            ad: AdLevel::DataOnly,
            span: span.clone(),
        };
        let one = Expr::new(
            ExprPattern::Lit(LitKind::Int, "1".to_string()),
            int_meta(span),
        );
        let length = Expr::new(
            ExprPattern::FunApp(
                FnKind::CompilerInternal,
                "length".to_string(),
                vec![Box::new(container.clone())],
            ),
            int_meta(span),
        );
        let counter_var = Expr::new(ExprPattern::Var(counter.clone()), int_meta(span));
        let element = Expr::new(
            ExprPattern::Indexed(
                Box::new(container),
                vec![Index::Single(Box::new(counter_var))],
            ),
            TypedMeta {
                ty: elem_ty.clone(),
                ad: elem_ad,
                span: span.clone(),
            },
        );

        let smeta = || SpanMeta::new(span.clone());
        let decl = Stmt::new(
            StmtPattern::Decl {
                ad_level: elem_ad,
                name: loopvar.clone(),
                ty: DeclType::Unsized(elem_ty),
                transformation: Transformation::Identity,
            },
            smeta(),
        );
        let bind = Stmt::new(
            StmtPattern::Assign(
                LValue {
                    name: loopvar,
                    indices: vec![],
                },
                None,
                element,
            ),
            smeta(),
        );
        let loop_body = Stmt::new(
            StmtPattern::Block(vec![Box::new(decl), Box::new(bind), Box::new(body)]),
            smeta(),
        );
        StmtPattern::For {
            loopvar: counter,
            lower: one,
            upper: length,
            body: Box::new(loop_body),
        }
    }
}

fn real_call(
    kind: FnKind,
    name: String,
    args: Vec<Box<TypedExpr>>,
    ad: AdLevel,
    span: &Span,
) -> TypedExpr {
    Expr::new(
        ExprPattern::FunApp(kind, name, args),
        TypedMeta {
            ty: UnsizedType::Real,
            ad,
            span: span.clone(),
        },
    )
}

fn minus(lhs: TypedExpr, rhs: TypedExpr, ad: AdLevel, span: &Span) -> TypedExpr {
    real_call(
        FnKind::MathLib,
        Operator::Minus.fn_name().to_string(),
        vec![Box::new(lhs), Box::new(rhs)],
        ad,
        span,
    )
}
