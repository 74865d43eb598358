//! Semantic analysis: one pass over the untyped AST producing a typed AST.
//!
//! The pass resolves identifiers through the symbol table, types every
//! expression against the signature catalog (with int-to-real promotion),
//! enforces the block-structure rules of the language (what may appear
//! where, suffix-governed call placement), and checks that every path
//! through a returning function body ends in a return.
//!
//! Scoping and context flags follow a strict stack discipline: scopes and
//! flag changes are installed through closure helpers so that every entry is
//! paired with its exit on all control paths, including early error returns.

use log::debug;

use crate::diags::{format_arg_types, format_signatures};
use crate::error::{Result, SemanticError};
use crate::ir::*;
use crate::stdlib::{split_distribution_suffix, suffix_variants, StdLib};
use crate::symbol_table::{SymbolTable, VarInfo};
use crate::types::*;
use crate::{bail_sem, err_sem};

/// Reserved words: language keywords plus the keywords of the C++ target,
/// which generated code must never collide with.
const RESERVED: &[&str] = &[
    // Language keywords.
    "break", "continue", "data", "else", "for", "functions", "generated", "if", "in", "int",
    "matrix", "model", "parameters", "print", "quantities", "real", "reject", "return",
    "row_vector", "target", "transformed", "vector", "void", "while", "lower", "upper",
    "repeat", "until", "then", "true", "false", "var", "fvar", "STAN_MAJOR", "STAN_MINOR",
    "STAN_PATCH", "STAN_MATH_MAJOR", "STAN_MATH_MINOR", "STAN_MATH_PATCH",
    // C++ keywords.
    "alignas", "alignof", "and", "and_eq", "asm", "auto", "bitand", "bitor", "bool", "case",
    "catch", "char", "char16_t", "char32_t", "class", "compl", "const", "constexpr",
    "const_cast", "decltype", "default", "delete", "do", "double", "dynamic_cast", "enum",
    "explicit", "export", "extern", "float", "friend", "goto", "inline", "long", "mutable",
    "namespace", "new", "noexcept", "not", "not_eq", "nullptr", "operator", "or", "or_eq",
    "private", "protected", "public", "register", "reinterpret_cast", "short", "signed",
    "sizeof", "static", "static_assert", "static_cast", "struct", "switch", "template",
    "this", "thread_local", "throw", "try", "typedef", "typeid", "typename", "union",
    "unsigned", "using", "virtual", "volatile", "wchar_t", "xor", "xor_eq",
];

/// The contextual flags of the analysis, saved and restored around each
/// syntactic region.
#[derive(Debug, Clone, Copy)]
struct ContextFlags {
    current_block: BlockOrigin,
    in_fun_def: bool,
    in_returning_fun_def: bool,
    in_rng_fun_def: bool,
    in_lp_fun_def: bool,
    in_loop: bool,
}

impl ContextFlags {
    fn new() -> Self {
        ContextFlags {
            current_block: BlockOrigin::Functions,
            in_fun_def: false,
            in_returning_fun_def: false,
            in_rng_fun_def: false,
            in_lp_fun_def: false,
            in_loop: false,
        }
    }
}

/// How a statement can terminate, for return-path analysis.
#[derive(Debug, Clone, PartialEq)]
enum ReturnStatus {
    /// Falls through without returning.
    NoReturn,
    /// Exits in a way compatible with any return type (`reject`).
    AnyReturn,
    /// Returns on some paths, with this type.
    Incomplete(ReturnType),
    /// Returns on every path, with this type.
    Complete(ReturnType),
}

fn join_rt(a: &ReturnType, b: &ReturnType, span: &crate::Span) -> Result<ReturnType> {
    join_return_types(a, b)
        .ok_or_else(|| err_sem!(span, SemanticError::IllTypedIfReturnTypes(a.clone(), b.clone())))
}

/// Join the statuses of two alternative branches.
fn branch_join(a: ReturnStatus, b: ReturnStatus, span: &crate::Span) -> Result<ReturnStatus> {
    use ReturnStatus::*;
    Ok(match (a, b) {
        (Complete(x), Complete(y)) => Complete(join_rt(&x, &y, span)?),
        (Complete(x), Incomplete(y)) | (Incomplete(x), Complete(y)) | (Incomplete(x), Incomplete(y)) => {
            Incomplete(join_rt(&x, &y, span)?)
        }
        (NoReturn, NoReturn) => NoReturn,
        (NoReturn, Complete(r)) | (Complete(r), NoReturn) => Incomplete(r),
        (NoReturn, Incomplete(r)) | (Incomplete(r), NoReturn) => Incomplete(r),
        (AnyReturn, AnyReturn) => AnyReturn,
        (AnyReturn, Complete(r)) | (Complete(r), AnyReturn) => Complete(r),
        (AnyReturn, Incomplete(r)) | (Incomplete(r), AnyReturn) => Incomplete(r),
        // A rejecting branch beside a falling-through branch does not make
        // the conditional returning.
        (AnyReturn, NoReturn) | (NoReturn, AnyReturn) => NoReturn,
    })
}

/// Fold the status of a statement sequence: once a prefix is complete,
/// later statements cannot weaken it.
fn seq_join(acc: ReturnStatus, next: ReturnStatus, span: &crate::Span) -> Result<ReturnStatus> {
    use ReturnStatus::*;
    Ok(match (acc, next) {
        (acc @ (Complete(_) | AnyReturn), _) => acc,
        (NoReturn, next) => next,
        (Incomplete(a), NoReturn) => Incomplete(a),
        (Incomplete(a), Incomplete(b)) => Incomplete(join_rt(&a, &b, span)?),
        (Incomplete(a), Complete(b)) => Complete(join_rt(&a, &b, span)?),
        (Incomplete(a), AnyReturn) => Complete(a),
    })
}

/// A loop body's status weakens to incomplete: the body may never run.
fn loop_status(body: ReturnStatus) -> ReturnStatus {
    use ReturnStatus::*;
    match body {
        Complete(r) | Incomplete(r) => Incomplete(r),
        NoReturn | AnyReturn => NoReturn,
    }
}

/// Type-check an untyped program against the catalog, producing a typed AST.
/// The program's `name` is the configured model name, which no identifier
/// may collide with.
pub fn analyze(program: UntypedProgram, stdlib: &StdLib) -> Result<TypedProgram> {
    Analyzer::new(stdlib, program.name.clone()).check_program(program)
}

struct Analyzer<'a> {
    stdlib: &'a StdLib,
    symbols: SymbolTable,
    cf: ContextFlags,
    model_name: String,
    /// True while checking a statement that sits directly in a program
    /// block; controls the data-only rule for declaration sizes.
    at_top_level: bool,
}

impl<'a> Analyzer<'a> {
    fn new(stdlib: &'a StdLib, model_name: String) -> Self {
        Analyzer {
            stdlib,
            symbols: SymbolTable::new(),
            cf: ContextFlags::new(),
            model_name,
            at_top_level: true,
        }
    }

    // -------------------------------------------------------------------------
    // Scoping helpers
    // -------------------------------------------------------------------------

    /// Run `f` inside a fresh symbol scope; the scope is popped on every
    /// exit path.
    fn with_scope<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.symbols.begin_scope();
        let result = f(self);
        self.symbols.end_scope();
        result
    }

    /// Run `f` with replaced context flags, restoring them afterwards.
    fn with_flags<T>(&mut self, cf: ContextFlags, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let saved = self.cf;
        self.cf = cf;
        let result = f(self);
        self.cf = saved;
        result
    }

    /// Check a child statement of a compound statement (never top level).
    fn check_nested_stmt(&mut self, stmt: UntypedStmt) -> Result<(TypedStmt, ReturnStatus)> {
        let saved = self.at_top_level;
        self.at_top_level = false;
        let result = self.check_stmt(stmt);
        self.at_top_level = saved;
        result
    }

    fn calculate_ad(&self, origin: BlockOrigin, ty: &UnsizedType) -> AdLevel {
        use BlockOrigin::*;
        if matches!(origin, Param | TParam | Model) && !ty.contains_int() {
            AdLevel::AutoDiffable
        } else {
            AdLevel::DataOnly
        }
    }

    // -------------------------------------------------------------------------
    // Program and blocks
    // -------------------------------------------------------------------------

    fn check_program(mut self, program: UntypedProgram) -> Result<TypedProgram> {
        let UntypedProgram {
            name,
            functions,
            data,
            transformed_data,
            parameters,
            transformed_parameters,
            model,
            generated_quantities,
        } = program;

        let functions = self.check_block(BlockOrigin::Functions, functions)?;
        let data = self.check_block(BlockOrigin::Data, data)?;
        let transformed_data = self.check_block(BlockOrigin::TData, transformed_data)?;
        let parameters = self.check_block(BlockOrigin::Param, parameters)?;
        let transformed_parameters = self.check_block(BlockOrigin::TParam, transformed_parameters)?;
        // The model block gets its own scope: its locals are invisible to
        // generated quantities.
        let model = match model {
            Some(stmts) => {
                Some(self.with_scope(|a| a.check_block_stmts(BlockOrigin::Model, stmts))?)
            }
            None => None,
        };
        let generated_quantities = self.check_block(BlockOrigin::GQuant, generated_quantities)?;

        Ok(Program {
            name,
            functions,
            data,
            transformed_data,
            parameters,
            transformed_parameters,
            model,
            generated_quantities,
        })
    }

    fn check_block(
        &mut self,
        origin: BlockOrigin,
        stmts: Option<Vec<UntypedStmt>>,
    ) -> Result<Option<Vec<TypedStmt>>> {
        match stmts {
            Some(stmts) => Ok(Some(self.check_block_stmts(origin, stmts)?)),
            None => Ok(None),
        }
    }

    fn check_block_stmts(
        &mut self,
        origin: BlockOrigin,
        stmts: Vec<UntypedStmt>,
    ) -> Result<Vec<TypedStmt>> {
        debug!("checking {:?} block ({} statements)", origin, stmts.len());
        let mut cf = self.cf;
        cf.current_block = origin;
        self.with_flags(cf, |a| {
            stmts
                .into_iter()
                .map(|s| {
                    a.at_top_level = true;
                    let (s, _) = a.check_stmt(s)?;
                    Ok(s)
                })
                .collect()
        })
    }

    // -------------------------------------------------------------------------
    // Identifier rules
    // -------------------------------------------------------------------------

    fn check_identifier(&self, name: &str, span: &crate::Span) -> Result<()> {
        if name == self.model_name {
            bail_sem!(span, SemanticError::IdentifierIsModelName(name.to_string()));
        }
        if name.ends_with("__") || RESERVED.contains(&name) {
            bail_sem!(span, SemanticError::IdentifierIsKeyword(name.to_string()));
        }
        Ok(())
    }

    /// The freshness rule: a name may not be rebound in its own scope, and
    /// may not shadow a math library name when the new entity is itself
    /// nullary-invocable or the library name has a zero-arity overload.
    fn check_fresh(&self, name: &str, is_nullary: bool, span: &crate::Span) -> Result<()> {
        if self.symbols.is_defined_in_current_scope(name) {
            bail_sem!(span, SemanticError::IdentifierInUse(name.to_string()));
        }
        if self.stdlib.is_math_lib_fn(name) && (is_nullary || self.stdlib.has_nullary(name)) {
            bail_sem!(span, SemanticError::IdentifierIsMathLibName(name.to_string()));
        }
        Ok(())
    }

    /// Freshness for distribution-suffixed names covers the sibling suffix
    /// variants too: a fresh `foo_lpmf` also rejects an existing `foo_lpdf`
    /// or `foo_log`.
    fn check_fresh_distribution(&self, name: &str, is_nullary: bool, span: &crate::Span) -> Result<()> {
        self.check_fresh(name, is_nullary, span)?;
        if let Some((base, suffix)) = split_distribution_suffix(name) {
            for variant in suffix_variants(suffix) {
                let sibling = format!("{}{}", base, variant);
                if self.symbols.is_defined_in_current_scope(&sibling)
                    || (self.stdlib.is_math_lib_fn(&sibling)
                        && (is_nullary || self.stdlib.has_nullary(&sibling)))
                {
                    bail_sem!(span, SemanticError::IdentifierInUse(name.to_string()));
                }
            }
        }
        Ok(())
    }

    /// Placement rules for suffix-governed calls.
    fn check_suffix_context(&self, name: &str, span: &crate::Span) -> Result<()> {
        if name.ends_with("_lp") && !(self.cf.current_block == BlockOrigin::Model || self.cf.in_lp_fun_def)
        {
            bail_sem!(span, SemanticError::FnTargetPlusEquals);
        }
        if name.ends_with("_rng") {
            let allowed = self.cf.in_rng_fun_def
                || (!self.cf.in_fun_def
                    && matches!(self.cf.current_block, BlockOrigin::TData | BlockOrigin::GQuant));
            if !allowed {
                bail_sem!(span, SemanticError::FnRng);
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Expressions
    // -------------------------------------------------------------------------

    /// Type an expression; returns the typed tree and the block origin
    /// governing it (the LUB of the origins of its parts).
    fn check_expr(&mut self, e: UntypedExpr) -> Result<(TypedExpr, BlockOrigin)> {
        let span = e.meta.span;
        match e.pattern {
            ExprPattern::Var(name) => self.check_var(name, span),
            ExprPattern::Lit(kind, text) => {
                let ty = match kind {
                    LitKind::Int => UnsizedType::Int,
                    LitKind::Real | LitKind::Str => UnsizedType::Real,
                };
                let origin = BlockOrigin::Data;
                let meta = TypedMeta {
                    ad: self.calculate_ad(origin, &ty),
                    ty,
                    span,
                };
                Ok((Expr::new(ExprPattern::Lit(kind, text), meta), origin))
            }
            ExprPattern::FunApp(_, name, args) => {
                self.check_fun_app(name, args.into_iter().map(|a| *a).collect(), span)
            }
            ExprPattern::CondDistApp(name, args) => {
                self.check_cond_dist_app(name, args.into_iter().map(|a| *a).collect(), span)
            }
            ExprPattern::BinOp(op, lhs, rhs) => {
                let (lhs, lorigin) = self.check_expr(*lhs)?;
                let (rhs, rorigin) = self.check_expr(*rhs)?;
                let rt = self.stdlib.return_type(
                    op.fn_name(),
                    &[(lhs.ad(), lhs.ty().clone()), (rhs.ad(), rhs.ty().clone())],
                );
                let ty = match rt {
                    Some(ReturnType::NonVoid(ty)) => ty,
                    _ => bail_sem!(
                        span,
                        SemanticError::IllTypedBinOp(op, lhs.ty().clone(), rhs.ty().clone())
                    ),
                };
                let origin = lorigin.lub(rorigin).lub(BlockOrigin::MathLibrary);
                let meta = TypedMeta {
                    ad: self.calculate_ad(origin, &ty),
                    ty,
                    span,
                };
                Ok((
                    Expr::new(ExprPattern::BinOp(op, Box::new(lhs), Box::new(rhs)), meta),
                    origin,
                ))
            }
            ExprPattern::PrefixOp(op, inner) => {
                let (inner, origin) = self.check_expr(*inner)?;
                let rt = self
                    .stdlib
                    .return_type(op.fn_name(), &[(inner.ad(), inner.ty().clone())]);
                let ty = match rt {
                    Some(ReturnType::NonVoid(ty)) => ty,
                    _ => bail_sem!(span, SemanticError::IllTypedPrefixOp(op, inner.ty().clone())),
                };
                let origin = origin.lub(BlockOrigin::MathLibrary);
                let meta = TypedMeta {
                    ad: self.calculate_ad(origin, &ty),
                    ty,
                    span,
                };
                Ok((Expr::new(ExprPattern::PrefixOp(op, Box::new(inner)), meta), origin))
            }
            ExprPattern::PostfixOp(inner, op) => {
                let (inner, origin) = self.check_expr(*inner)?;
                let rt = self
                    .stdlib
                    .return_type(op.fn_name(), &[(inner.ad(), inner.ty().clone())]);
                let ty = match rt {
                    Some(ReturnType::NonVoid(ty)) => ty,
                    _ => bail_sem!(span, SemanticError::IllTypedPostfixOp(op, inner.ty().clone())),
                };
                let origin = origin.lub(BlockOrigin::MathLibrary);
                let meta = TypedMeta {
                    ad: self.calculate_ad(origin, &ty),
                    ty,
                    span,
                };
                Ok((Expr::new(ExprPattern::PostfixOp(Box::new(inner), op), meta), origin))
            }
            ExprPattern::TernaryIf(cond, then_e, else_e) => {
                let (cond, corigin) = self.check_expr(*cond)?;
                let (then_e, torigin) = self.check_expr(*then_e)?;
                let (else_e, eorigin) = self.check_expr(*else_e)?;
                let joined = join_types(then_e.ty(), else_e.ty());
                let ty = match (cond.ty().is_int_or_real(), joined) {
                    (true, Some(ty)) => ty,
                    _ => bail_sem!(
                        span,
                        SemanticError::IllTypedTernaryIf(
                            cond.ty().clone(),
                            then_e.ty().clone(),
                            else_e.ty().clone()
                        )
                    ),
                };
                let origin = corigin.lub(torigin).lub(eorigin);
                let meta = TypedMeta {
                    ad: self.calculate_ad(origin, &ty),
                    ty,
                    span,
                };
                Ok((
                    Expr::new(
                        ExprPattern::TernaryIf(Box::new(cond), Box::new(then_e), Box::new(else_e)),
                        meta,
                    ),
                    origin,
                ))
            }
            ExprPattern::EAnd(a, b) => self.check_logical(*a, *b, Operator::And, span),
            ExprPattern::EOr(a, b) => self.check_logical(*a, *b, Operator::Or, span),
            ExprPattern::Indexed(inner, indices) => {
                let (inner, mut origin) = self.check_expr(*inner)?;
                let mut typed_indices = Vec::with_capacity(indices.len());
                for ix in indices {
                    let (ix, ix_origin) = self.check_index(ix)?;
                    origin = origin.lub(ix_origin);
                    typed_indices.push(ix);
                }
                let ty = self.indexed_type(inner.ty(), &typed_indices, &span)?;
                let meta = TypedMeta {
                    ad: self.calculate_ad(origin, &ty),
                    ty,
                    span,
                };
                Ok((
                    Expr::new(ExprPattern::Indexed(Box::new(inner), typed_indices), meta),
                    origin,
                ))
            }
        }
    }

    fn check_var(&mut self, name: String, span: crate::Span) -> Result<(TypedExpr, BlockOrigin)> {
        if let Some(info) = self.symbols.look(&name) {
            let ty = info.ty.clone();
            let origin = info.origin;
            let meta = TypedMeta {
                ad: self.calculate_ad(origin, &ty),
                ty,
                span,
            };
            return Ok((Expr::new(ExprPattern::Var(name), meta), origin));
        }
        if self.stdlib.is_math_lib_fn(&name) {
            // A bare reference to an overloaded math library name.
            let origin = BlockOrigin::MathLibrary;
            let meta = TypedMeta {
                ty: UnsizedType::MathLibFn,
                ad: AdLevel::DataOnly,
                span,
            };
            return Ok((Expr::new(ExprPattern::Var(name), meta), origin));
        }
        Err(err_sem!(span, SemanticError::IdentifierNotInScope(name)))
    }

    fn check_logical(
        &mut self,
        a: UntypedExpr,
        b: UntypedExpr,
        op: Operator,
        span: crate::Span,
    ) -> Result<(TypedExpr, BlockOrigin)> {
        let (a, aorigin) = self.check_expr(a)?;
        let (b, borigin) = self.check_expr(b)?;
        if !(a.ty().is_int_or_real() && b.ty().is_int_or_real()) {
            bail_sem!(
                span,
                SemanticError::IllTypedBinOp(op, a.ty().clone(), b.ty().clone())
            );
        }
        let origin = aorigin.lub(borigin);
        let meta = TypedMeta {
            ty: UnsizedType::Int,
            ad: self.calculate_ad(origin, &UnsizedType::Int),
            span,
        };
        let pattern = match op {
            Operator::And => ExprPattern::EAnd(Box::new(a), Box::new(b)),
            _ => ExprPattern::EOr(Box::new(a), Box::new(b)),
        };
        Ok((Expr::new(pattern, meta), origin))
    }

    fn check_args(
        &mut self,
        args: Vec<UntypedExpr>,
    ) -> Result<(Vec<TypedExpr>, Vec<(AdLevel, UnsizedType)>, BlockOrigin)> {
        let mut typed = Vec::with_capacity(args.len());
        let mut sigs = Vec::with_capacity(args.len());
        let mut origin = BlockOrigin::Functions;
        for arg in args {
            let (arg, arg_origin) = self.check_expr(arg)?;
            origin = origin.lub(arg_origin);
            sigs.push((arg.ad(), arg.ty().clone()));
            typed.push(arg);
        }
        Ok((typed, sigs, origin))
    }

    /// Restrictions on `map_rect`: the mapped function may not carry a
    /// suffix that triggers placement rules.
    fn check_map_rect(&self, name: &str, args: &[UntypedExpr], span: &crate::Span) -> Result<()> {
        if name != "map_rect" {
            return Ok(());
        }
        if let Some(Expr {
            pattern: ExprPattern::Var(fname),
            ..
        }) = args.first()
        {
            if fname.ends_with("_lp")
                || fname.ends_with("_rng")
                || split_distribution_suffix(fname).is_some()
            {
                bail_sem!(span, SemanticError::FnMapRect(fname.clone()));
            }
        }
        Ok(())
    }

    fn check_fun_app(
        &mut self,
        name: String,
        args: Vec<UntypedExpr>,
        span: crate::Span,
    ) -> Result<(TypedExpr, BlockOrigin)> {
        self.check_suffix_context(&name, &span)?;
        self.check_map_rect(&name, &args, &span)?;
        let (typed_args, arg_sigs, args_origin) = self.check_args(args)?;

        // The catalog is consulted before user definitions.
        if let Some(rt) = self.stdlib.return_type(&name, &arg_sigs) {
            let ty = match rt {
                ReturnType::Void => {
                    bail_sem!(span, SemanticError::IllTypedNotAFunction(name))
                }
                ReturnType::NonVoid(ty) => ty,
            };
            let origin = args_origin.lub(BlockOrigin::MathLibrary);
            let meta = TypedMeta {
                ad: self.calculate_ad(origin, &ty),
                ty,
                span,
            };
            let args = typed_args.into_iter().map(Box::new).collect();
            return Ok((
                Expr::new(ExprPattern::FunApp(FnKind::MathLib, name, args), meta),
                origin,
            ));
        }
        if self.stdlib.is_math_lib_fn(&name) {
            bail_sem!(
                span,
                SemanticError::IllTypedFunctionApp {
                    supplied: format_arg_types(
                        &arg_sigs.iter().map(|(_, t)| t.clone()).collect::<Vec<_>>()
                    ),
                    available: format_signatures(self.stdlib, &name),
                    name,
                }
            );
        }

        match self.symbols.look(&name).cloned() {
            Some(VarInfo {
                ty: UnsizedType::Fun(params, rt),
                origin: fn_origin,
            }) => {
                if !compatible_arguments_mod_conv(&name, &params, &arg_sigs) {
                    bail_sem!(
                        span,
                        SemanticError::IllTypedFunctionApp {
                            supplied: format_arg_types(
                                &arg_sigs.iter().map(|(_, t)| t.clone()).collect::<Vec<_>>()
                            ),
                            available: {
                                let sig = crate::stdlib::Signature {
                                    args: params.clone(),
                                    rtype: (*rt).clone(),
                                };
                                format!("  {}", sig)
                            },
                            name,
                        }
                    );
                }
                let ty = match *rt {
                    ReturnType::Void => {
                        bail_sem!(span, SemanticError::IllTypedNotAFunction(name))
                    }
                    ReturnType::NonVoid(ty) => ty,
                };
                let origin = args_origin.lub(fn_origin);
                let meta = TypedMeta {
                    ad: self.calculate_ad(origin, &ty),
                    ty,
                    span,
                };
                let args = typed_args.into_iter().map(Box::new).collect();
                Ok((
                    Expr::new(ExprPattern::FunApp(FnKind::UserDefined, name, args), meta),
                    origin,
                ))
            }
            Some(_) => Err(err_sem!(span, SemanticError::IllTypedNotAFunction(name))),
            None => Err(err_sem!(span, SemanticError::IllTypedNoSuchFunction(name))),
        }
    }

    fn check_cond_dist_app(
        &mut self,
        name: String,
        args: Vec<UntypedExpr>,
        span: crate::Span,
    ) -> Result<(TypedExpr, BlockOrigin)> {
        if split_distribution_suffix(&name).is_none() {
            bail_sem!(span, SemanticError::FnConditioning);
        }
        let (typed, origin) = self.check_fun_app(name, args, span)?;
        // Re-tag the node as conditional application; lowering flattens it.
        let Expr { pattern, meta } = typed;
        let pattern = match pattern {
            ExprPattern::FunApp(_, name, args) => ExprPattern::CondDistApp(name, args),
            other => other,
        };
        Ok((Expr { pattern, meta }, origin))
    }

    fn check_index(&mut self, ix: Index<Box<UntypedExpr>>) -> Result<(Index<Box<TypedExpr>>, BlockOrigin)> {
        let int_arr = UnsizedType::array_of(UnsizedType::Int);
        match ix {
            Index::All => Ok((Index::All, BlockOrigin::Functions)),
            Index::Single(e) => {
                let (e, origin) = self.check_expr(*e)?;
                match e.ty() {
                    UnsizedType::Int => Ok((Index::Single(Box::new(e)), origin)),
                    // An int-array in single position is multiple indexing.
                    t if *t == int_arr => Ok((Index::Multi(Box::new(e)), origin)),
                    t => Err(err_sem!(e.meta.span, SemanticError::NonIntIndex(t.clone()))),
                }
            }
            Index::Multi(e) => {
                let (e, origin) = self.check_expr(*e)?;
                if *e.ty() != int_arr {
                    bail_sem!(e.meta.span, SemanticError::NonIntIndex(e.ty().clone()));
                }
                Ok((Index::Multi(Box::new(e)), origin))
            }
            Index::Upfrom(e) => {
                let (e, origin) = self.check_int_index(*e)?;
                Ok((Index::Upfrom(Box::new(e)), origin))
            }
            Index::Downfrom(e) => {
                let (e, origin) = self.check_int_index(*e)?;
                Ok((Index::Downfrom(Box::new(e)), origin))
            }
            Index::Between(a, b) => {
                let (a, ao) = self.check_int_index(*a)?;
                let (b, bo) = self.check_int_index(*b)?;
                Ok((Index::Between(Box::new(a), Box::new(b)), ao.lub(bo)))
            }
        }
    }

    fn check_int_index(&mut self, e: UntypedExpr) -> Result<(TypedExpr, BlockOrigin)> {
        let (e, origin) = self.check_expr(e)?;
        if *e.ty() != UnsizedType::Int {
            bail_sem!(e.meta.span, SemanticError::NonIntIndex(e.ty().clone()));
        }
        Ok((e, origin))
    }

    /// The rank-reduction rules for indexing.
    fn indexed_type(
        &self,
        base: &UnsizedType,
        indices: &[Index<Box<TypedExpr>>],
        span: &crate::Span,
    ) -> Result<UnsizedType> {
        let singles: Vec<bool> = indices.iter().map(|ix| matches!(ix, Index::Single(_))).collect();
        reduce_indexed(base, &singles)
            .ok_or_else(|| err_sem!(span, SemanticError::InvalidIndex(base.clone())))
    }

    // -------------------------------------------------------------------------
    // Statements
    // -------------------------------------------------------------------------

    fn check_stmt(&mut self, s: UntypedStmt) -> Result<(TypedStmt, ReturnStatus)> {
        let span = s.meta.span.clone();
        let meta = SpanMeta::new(span.clone());
        match s.pattern {
            StmtPattern::Assign(lhs, op, rhs) => {
                let stmt = self.check_assign(lhs, op, rhs, span)?;
                Ok((Stmt::new(stmt, meta), ReturnStatus::NoReturn))
            }
            StmtPattern::TargetPlusEq(e) => {
                if !(self.cf.current_block == BlockOrigin::Model || self.cf.in_lp_fun_def) {
                    bail_sem!(span, SemanticError::FnTargetPlusEquals);
                }
                let (e, _) = self.check_expr(e)?;
                if !target_compatible(e.ty()) {
                    bail_sem!(span, SemanticError::IllTypedTargetPlusEq(e.ty().clone()));
                }
                Ok((
                    Stmt::new(StmtPattern::TargetPlusEq(e), meta),
                    ReturnStatus::NoReturn,
                ))
            }
            StmtPattern::Tilde {
                arg,
                distribution,
                args,
                truncation,
            } => {
                let stmt = self.check_tilde(arg, distribution, args, truncation, span)?;
                Ok((Stmt::new(stmt, meta), ReturnStatus::NoReturn))
            }
            StmtPattern::NRFunApp(_, name, args) => self.check_nr_fun_app(name, args, span, meta),
            StmtPattern::Break => {
                if !self.cf.in_loop {
                    bail_sem!(span, SemanticError::BreakOutsideLoop);
                }
                Ok((Stmt::new(StmtPattern::Break, meta), ReturnStatus::NoReturn))
            }
            StmtPattern::Continue => {
                if !self.cf.in_loop {
                    bail_sem!(span, SemanticError::ContinueOutsideLoop);
                }
                Ok((Stmt::new(StmtPattern::Continue, meta), ReturnStatus::NoReturn))
            }
            StmtPattern::Return(e) => {
                if !self.cf.in_fun_def {
                    bail_sem!(span, SemanticError::ReturnOutsideFunction);
                }
                match e {
                    Some(e) => {
                        let (e, _) = self.check_expr(e)?;
                        let status =
                            ReturnStatus::Complete(ReturnType::NonVoid(e.ty().clone()));
                        Ok((Stmt::new(StmtPattern::Return(Some(e)), meta), status))
                    }
                    None => Ok((
                        Stmt::new(StmtPattern::Return(None), meta),
                        ReturnStatus::Complete(ReturnType::Void),
                    )),
                }
            }
            StmtPattern::Skip => Ok((Stmt::new(StmtPattern::Skip, meta), ReturnStatus::NoReturn)),
            StmtPattern::IfElse(cond, then_s, else_s) => {
                let (cond, _) = self.check_expr(cond)?;
                if !cond.ty().is_int_or_real() {
                    bail_sem!(span, SemanticError::IllTypedCondition(cond.ty().clone()));
                }
                let (then_s, then_status) = self.check_nested_stmt(*then_s)?;
                let (else_s, else_status) = match else_s {
                    Some(s) => {
                        let (s, status) = self.check_nested_stmt(*s)?;
                        (Some(Box::new(s)), status)
                    }
                    None => (None, ReturnStatus::NoReturn),
                };
                let status = branch_join(then_status, else_status, &span)?;
                Ok((
                    Stmt::new(StmtPattern::IfElse(cond, Box::new(then_s), else_s), meta),
                    status,
                ))
            }
            StmtPattern::While(cond, body) => {
                let (cond, _) = self.check_expr(cond)?;
                if !cond.ty().is_int_or_real() {
                    bail_sem!(span, SemanticError::IllTypedCondition(cond.ty().clone()));
                }
                let (body, body_status) = self.check_loop_body(*body)?;
                Ok((
                    Stmt::new(StmtPattern::While(cond, Box::new(body)), meta),
                    loop_status(body_status),
                ))
            }
            StmtPattern::For {
                loopvar,
                lower,
                upper,
                body,
            } => {
                let (lower, _) = self.check_expr(lower)?;
                let (upper, _) = self.check_expr(upper)?;
                for bound in [&lower, &upper] {
                    if *bound.ty() != UnsizedType::Int {
                        bail_sem!(bound.meta.span, SemanticError::NonIntLoopBound(bound.ty().clone()));
                    }
                }
                self.check_identifier(&loopvar, &span)?;
                let (body, body_status) = self.with_scope(|a| {
                    a.enter_loop_var(&loopvar, UnsizedType::Int, &span)?;
                    a.check_loop_body(*body)
                })?;
                Ok((
                    Stmt::new(
                        StmtPattern::For {
                            loopvar,
                            lower,
                            upper,
                            body: Box::new(body),
                        },
                        meta,
                    ),
                    loop_status(body_status),
                ))
            }
            StmtPattern::ForEach(loopvar, container, body) => {
                let (container, _) = self.check_expr(container)?;
                let elem_ty = match container.ty() {
                    UnsizedType::Array(elem) => (**elem).clone(),
                    UnsizedType::Vector | UnsizedType::RowVector | UnsizedType::Matrix => {
                        UnsizedType::Real
                    }
                    other => bail_sem!(span, SemanticError::InvalidIndex(other.clone())),
                };
                self.check_identifier(&loopvar, &span)?;
                let (body, body_status) = self.with_scope(|a| {
                    a.enter_loop_var(&loopvar, elem_ty, &span)?;
                    a.check_loop_body(*body)
                })?;
                Ok((
                    Stmt::new(StmtPattern::ForEach(loopvar, container, Box::new(body)), meta),
                    loop_status(body_status),
                ))
            }
            StmtPattern::Block(stmts) => {
                let (stmts, status) = self.with_scope(|a| a.check_stmt_sequence(stmts, &span))?;
                Ok((Stmt::new(StmtPattern::Block(stmts), meta), status))
            }
            StmtPattern::SList(stmts) => {
                let (stmts, status) = self.check_stmt_sequence(stmts, &span)?;
                Ok((Stmt::new(StmtPattern::SList(stmts), meta), status))
            }
            StmtPattern::Decl {
                name,
                ty,
                transformation,
                ..
            } => {
                let stmt = self.check_decl(name, ty, transformation, span)?;
                Ok((Stmt::new(stmt, meta), ReturnStatus::NoReturn))
            }
            StmtPattern::FunDef {
                returntype,
                name,
                params,
                body,
            } => {
                let stmt = self.check_fun_def(returntype, name, params, *body, span)?;
                Ok((Stmt::new(stmt, meta), ReturnStatus::NoReturn))
            }
        }
    }

    fn enter_loop_var(&mut self, name: &str, ty: UnsizedType, span: &crate::Span) -> Result<()> {
        self.check_fresh(name, false, span)?;
        let info = VarInfo {
            origin: self.cf.current_block,
            ty,
        };
        if !self.symbols.enter(name, info) {
            bail_sem!(span, SemanticError::IdentifierInUse(name.to_string()));
        }
        self.symbols.set_read_only(name);
        Ok(())
    }

    fn check_loop_body(&mut self, body: UntypedStmt) -> Result<(TypedStmt, ReturnStatus)> {
        let mut cf = self.cf;
        cf.in_loop = true;
        self.with_flags(cf, |a| a.check_nested_stmt(body))
    }

    /// Check a statement sequence, folding return statuses. Statements after
    /// a jump are still checked but no longer contribute to the status.
    fn check_stmt_sequence(
        &mut self,
        stmts: Vec<Box<UntypedStmt>>,
        span: &crate::Span,
    ) -> Result<(Vec<Box<TypedStmt>>, ReturnStatus)> {
        let mut out = Vec::with_capacity(stmts.len());
        let mut status = ReturnStatus::NoReturn;
        let mut stopped = false;
        for stmt in stmts {
            let (stmt, stmt_status) = self.check_nested_stmt(*stmt)?;
            if !stopped {
                status = seq_join(status, stmt_status, span)?;
            }
            if is_jump(&stmt) {
                stopped = true;
            }
            out.push(Box::new(stmt));
        }
        Ok((out, status))
    }

    fn check_assign(
        &mut self,
        lhs: LValue<UntypedExpr>,
        op: Option<Operator>,
        rhs: UntypedExpr,
        span: crate::Span,
    ) -> Result<StmtPattern<TypedExpr, Box<TypedStmt>>> {
        let info = match self.symbols.look(&lhs.name) {
            Some(info) => info.clone(),
            None => bail_sem!(span, SemanticError::IdentifierNotInScope(lhs.name)),
        };
        if self.symbols.is_read_only(&lhs.name) {
            bail_sem!(span, SemanticError::CannotAssignReadOnly(lhs.name));
        }
        let is_global = self.symbols.is_global(&lhs.name);
        if is_global && info.origin != self.cf.current_block {
            bail_sem!(span, SemanticError::CannotAssignCrossBlock(lhs.name));
        }

        let mut typed_indices = Vec::with_capacity(lhs.indices.len());
        for ix in lhs.indices {
            let (ix, _) = self.check_index(ix.map(&mut Box::new))?;
            typed_indices.push(ix);
        }
        let lhs_ty = self.indexed_type(&info.ty, &typed_indices, &span)?;
        let (rhs, rhs_origin) = self.check_expr(rhs)?;

        let rhs = match op {
            None => {
                if !same_type_mod_array_conv("", &lhs_ty, rhs.ty()) {
                    bail_sem!(
                        span,
                        SemanticError::IllTypedAssignment(lhs_ty, rhs.ty().clone())
                    );
                }
                rhs
            }
            // A compound assignment is checked through the catalog and
            // desugared in place: `x op= e` carries `x op e` as its value.
            Some(op) => {
                let lhs_ad = self.calculate_ad(info.origin, &lhs_ty);
                let rt = self.stdlib.return_type(
                    op.fn_name(),
                    &[(lhs_ad, lhs_ty.clone()), (rhs.ad(), rhs.ty().clone())],
                );
                let result_ty = match rt {
                    Some(ReturnType::NonVoid(ty)) => ty,
                    _ => bail_sem!(
                        span,
                        SemanticError::IllTypedBinOp(op, lhs_ty, rhs.ty().clone())
                    ),
                };
                let check_name = op.assign_name().unwrap_or("assign_");
                if !same_type_mod_array_conv(check_name, &lhs_ty, &result_ty) {
                    bail_sem!(span, SemanticError::IllTypedAssignment(lhs_ty, result_ty));
                }

                let base = Expr::new(
                    ExprPattern::Var(lhs.name.clone()),
                    TypedMeta {
                        ad: self.calculate_ad(info.origin, &info.ty),
                        ty: info.ty.clone(),
                        span: span.clone(),
                    },
                );
                let lhs_expr = if typed_indices.is_empty() {
                    base
                } else {
                    Expr::new(
                        ExprPattern::Indexed(Box::new(base), typed_indices.clone()),
                        TypedMeta {
                            ad: lhs_ad,
                            ty: lhs_ty.clone(),
                            span: span.clone(),
                        },
                    )
                };
                let ad = lhs_ad.lub(rhs.ad());
                Expr::new(
                    ExprPattern::BinOp(op, Box::new(lhs_expr), Box::new(rhs)),
                    TypedMeta {
                        ty: result_ty,
                        ad,
                        span: span.clone(),
                    },
                )
            }
        };

        // A higher-origin right-hand side elevates a local's origin.
        if !is_global && rhs_origin > info.origin {
            self.symbols.unsafe_replace(
                &lhs.name,
                VarInfo {
                    origin: info.origin.lub(rhs_origin),
                    ty: info.ty,
                },
            );
        }
        self.symbols.set_is_assigned(&lhs.name);

        Ok(StmtPattern::Assign(
            LValue {
                name: lhs.name,
                indices: typed_indices.into_iter().map(|ix| ix.map(&mut |e| *e)).collect(),
            },
            None,
            rhs,
        ))
    }

    fn check_tilde(
        &mut self,
        arg: UntypedExpr,
        distribution: String,
        args: Vec<UntypedExpr>,
        truncation: Truncation<UntypedExpr>,
        span: crate::Span,
    ) -> Result<StmtPattern<TypedExpr, Box<TypedStmt>>> {
        if !(self.cf.current_block == BlockOrigin::Model || self.cf.in_lp_fun_def) {
            bail_sem!(span, SemanticError::FnTargetPlusEquals);
        }
        for cdf_suffix in ["_cdf", "_ccdf", "_lcdf", "_lccdf", "_cdf_log", "_ccdf_log"] {
            if distribution.ends_with(cdf_suffix) {
                bail_sem!(span, SemanticError::CdfSampling(distribution));
            }
        }

        let (arg, _) = self.check_expr(arg)?;
        let (args, mut arg_sigs, _) = self.check_args(args)?;
        arg_sigs.insert(0, (arg.ad(), arg.ty().clone()));

        if self.resolve_distribution(&distribution, &arg_sigs).is_none() {
            let names = ["_lpdf", "_lpmf", "_log"]
                .iter()
                .map(|s| format_signatures(self.stdlib, &format!("{}{}", distribution, s)))
                .collect::<Vec<_>>()
                .join("\n");
            bail_sem!(
                span,
                SemanticError::IllTypedFunctionApp {
                    name: distribution,
                    supplied: format_arg_types(
                        &arg_sigs.iter().map(|(_, t)| t.clone()).collect::<Vec<_>>()
                    ),
                    available: names,
                }
            );
        }

        // Truncation bounds need the matching cumulative overloads.
        let truncation = self.check_truncation(truncation, &distribution, &arg_sigs, &span)?;

        Ok(StmtPattern::Tilde {
            arg,
            distribution,
            args,
            truncation,
        })
    }

    /// Find the density/mass suffix under which a distribution name resolves
    /// for the given argument types.
    fn resolve_distribution(
        &self,
        distribution: &str,
        arg_sigs: &[(AdLevel, UnsizedType)],
    ) -> Option<&'static str> {
        for suffix in ["_lpdf", "_lpmf", "_log"] {
            let full = format!("{}{}", distribution, suffix);
            if let Some(ReturnType::NonVoid(_)) = self.stdlib.return_type(&full, arg_sigs) {
                return Some(suffix);
            }
            if let Some(VarInfo {
                ty: UnsizedType::Fun(params, rt),
                ..
            }) = self.symbols.look(&full)
            {
                if matches!(**rt, ReturnType::NonVoid(_))
                    && compatible_arguments_mod_conv(&full, params, arg_sigs)
                {
                    return Some(suffix);
                }
            }
        }
        None
    }

    /// `T[lb, ]` subtracts a complementary cdf, `T[, ub]` a cdf, and
    /// `T[lb, ub]` the log-difference of two cdf values; the matching
    /// cumulative overloads must exist.
    fn check_truncation(
        &mut self,
        truncation: Truncation<UntypedExpr>,
        distribution: &str,
        arg_sigs: &[(AdLevel, UnsizedType)],
        span: &crate::Span,
    ) -> Result<Truncation<TypedExpr>> {
        match truncation {
            Truncation::NoTruncate => Ok(Truncation::NoTruncate),
            Truncation::TruncateUpFrom(lb) => {
                let lb = self.check_truncation_bound(lb)?;
                self.require_cdf_overload(distribution, "_lccdf", &lb, arg_sigs, span)?;
                Ok(Truncation::TruncateUpFrom(lb))
            }
            Truncation::TruncateDownFrom(ub) => {
                let ub = self.check_truncation_bound(ub)?;
                self.require_cdf_overload(distribution, "_lcdf", &ub, arg_sigs, span)?;
                Ok(Truncation::TruncateDownFrom(ub))
            }
            Truncation::TruncateBetween(lb, ub) => {
                let lb = self.check_truncation_bound(lb)?;
                let ub = self.check_truncation_bound(ub)?;
                self.require_cdf_overload(distribution, "_lcdf", &lb, arg_sigs, span)?;
                self.require_cdf_overload(distribution, "_lcdf", &ub, arg_sigs, span)?;
                Ok(Truncation::TruncateBetween(lb, ub))
            }
        }
    }

    fn check_truncation_bound(&mut self, e: UntypedExpr) -> Result<TypedExpr> {
        let (e, _) = self.check_expr(e)?;
        if !e.ty().is_int_or_real() {
            bail_sem!(e.meta.span, SemanticError::IllTypedCondition(e.ty().clone()));
        }
        Ok(e)
    }

    /// The cumulative overload for a truncation bound: the bound replaces
    /// the sampled value in the argument tuple.
    fn require_cdf_overload(
        &self,
        distribution: &str,
        suffix: &str,
        bound: &TypedExpr,
        arg_sigs: &[(AdLevel, UnsizedType)],
        span: &crate::Span,
    ) -> Result<()> {
        let full = format!("{}{}", distribution, suffix);
        let mut sigs = arg_sigs.to_vec();
        sigs[0] = (bound.ad(), bound.ty().clone());
        if matches!(
            self.stdlib.return_type(&full, &sigs),
            Some(ReturnType::NonVoid(_))
        ) {
            return Ok(());
        }
        if let Some(VarInfo {
            ty: UnsizedType::Fun(params, rt),
            ..
        }) = self.symbols.look(&full)
        {
            if matches!(**rt, ReturnType::NonVoid(_))
                && compatible_arguments_mod_conv(&full, params, &sigs)
            {
                return Ok(());
            }
        }
        Err(err_sem!(
            span,
            SemanticError::IllTypedFunctionApp {
                supplied: format_arg_types(&sigs.iter().map(|(_, t)| t.clone()).collect::<Vec<_>>()),
                available: format_signatures(self.stdlib, &full),
                name: full,
            }
        ))
    }

    fn check_nr_fun_app(
        &mut self,
        name: String,
        args: Vec<UntypedExpr>,
        span: crate::Span,
        meta: SpanMeta,
    ) -> Result<(TypedStmt, ReturnStatus)> {
        // print and reject accept any argument types, including strings.
        if name == "print" || name == "reject" {
            let (typed_args, _, _) = self.check_args(args)?;
            let status = if name == "reject" {
                ReturnStatus::AnyReturn
            } else {
                ReturnStatus::NoReturn
            };
            return Ok((
                Stmt::new(
                    StmtPattern::NRFunApp(FnKind::CompilerInternal, name, typed_args),
                    meta,
                ),
                status,
            ));
        }

        self.check_suffix_context(&name, &span)?;
        let (typed_args, arg_sigs, _) = self.check_args(args)?;

        match self.stdlib.return_type(&name, &arg_sigs) {
            Some(ReturnType::Void) => {
                return Ok((
                    Stmt::new(StmtPattern::NRFunApp(FnKind::MathLib, name, typed_args), meta),
                    ReturnStatus::NoReturn,
                ));
            }
            Some(ReturnType::NonVoid(_)) => {
                bail_sem!(span, SemanticError::IllTypedNRFunction(name))
            }
            None if self.stdlib.is_math_lib_fn(&name) => {
                bail_sem!(
                    span,
                    SemanticError::IllTypedFunctionApp {
                        supplied: format_arg_types(
                            &arg_sigs.iter().map(|(_, t)| t.clone()).collect::<Vec<_>>()
                        ),
                        available: format_signatures(self.stdlib, &name),
                        name,
                    }
                )
            }
            None => {}
        }

        match self.symbols.look(&name).cloned() {
            Some(VarInfo {
                ty: UnsizedType::Fun(params, rt),
                ..
            }) => {
                if !compatible_arguments_mod_conv(&name, &params, &arg_sigs) {
                    bail_sem!(
                        span,
                        SemanticError::IllTypedFunctionApp {
                            supplied: format_arg_types(
                                &arg_sigs.iter().map(|(_, t)| t.clone()).collect::<Vec<_>>()
                            ),
                            available: {
                                let sig = crate::stdlib::Signature {
                                    args: params.clone(),
                                    rtype: (*rt).clone(),
                                };
                                format!("  {}", sig)
                            },
                            name,
                        }
                    );
                }
                if !matches!(*rt, ReturnType::Void) {
                    bail_sem!(span, SemanticError::IllTypedNRFunction(name));
                }
                Ok((
                    Stmt::new(
                        StmtPattern::NRFunApp(FnKind::UserDefined, name, typed_args),
                        meta,
                    ),
                    ReturnStatus::NoReturn,
                ))
            }
            Some(_) => Err(err_sem!(span, SemanticError::IllTypedNRFunction(name))),
            None => Err(err_sem!(span, SemanticError::IllTypedNoSuchFunction(name))),
        }
    }

    fn check_decl(
        &mut self,
        name: String,
        ty: DeclType<UntypedExpr>,
        transformation: Transformation<UntypedExpr>,
        span: crate::Span,
    ) -> Result<StmtPattern<TypedExpr, Box<TypedStmt>>> {
        self.check_identifier(&name, &span)?;
        self.check_fresh_distribution(&name, false, &span)?;

        let unsized_ty = ty.to_unsized();

        // Integer-containing types cannot be parameters.
        if !self.cf.in_fun_def
            && matches!(self.cf.current_block, BlockOrigin::Param | BlockOrigin::TParam)
            && unsized_ty.contains_int()
        {
            bail_sem!(span, SemanticError::IntParameterNotAllowed(unsized_ty));
        }

        // Sizes must be integers, computable from data at the top level.
        let at_top_level = self.at_top_level;
        let mut check_size = |a: &mut Self, e: UntypedExpr| -> Result<TypedExpr> {
            let (e, origin) = a.check_expr(e)?;
            if *e.ty() != UnsizedType::Int {
                bail_sem!(e.meta.span, SemanticError::NonIntSize(e.ty().clone()));
            }
            if at_top_level && origin > BlockOrigin::TData {
                bail_sem!(e.meta.span, SemanticError::NonDataSize);
            }
            Ok(e)
        };

        let ty = match ty {
            DeclType::Unsized(ut) => DeclType::Unsized(ut),
            DeclType::Sized(st) => DeclType::Sized(check_sized_type(self, st, &mut check_size)?),
        };

        // Bounds of integer declarations must be integers themselves.
        let is_int_decl = unsized_ty == UnsizedType::Int;
        let check_bound = |a: &mut Self, e: UntypedExpr| -> Result<TypedExpr> {
            let (e, _) = a.check_expr(e)?;
            if !e.ty().is_int_or_real() {
                bail_sem!(e.meta.span, SemanticError::NonIntegerDeclBounds(e.ty().clone()));
            }
            if is_int_decl && *e.ty() != UnsizedType::Int {
                bail_sem!(e.meta.span, SemanticError::NonIntegerDeclBounds(e.ty().clone()));
            }
            Ok(e)
        };
        let transformation = match transformation {
            Transformation::Identity => Transformation::Identity,
            Transformation::Lower(e) => Transformation::Lower(check_bound(self, e)?),
            Transformation::Upper(e) => Transformation::Upper(check_bound(self, e)?),
            Transformation::LowerUpper(lb, ub) => {
                let lb = check_bound(self, lb)?;
                let ub = check_bound(self, ub)?;
                Transformation::LowerUpper(lb, ub)
            }
        };

        let origin = if self.cf.in_fun_def {
            BlockOrigin::Functions
        } else {
            self.cf.current_block
        };
        let ad_level = self.calculate_ad(origin, &unsized_ty);
        if !self.symbols.enter(
            &name,
            VarInfo {
                origin,
                ty: unsized_ty,
            },
        ) {
            bail_sem!(span, SemanticError::IdentifierInUse(name));
        }

        Ok(StmtPattern::Decl {
            ad_level,
            name,
            ty,
            transformation,
        })
    }

    fn check_fun_def(
        &mut self,
        returntype: ReturnType,
        name: String,
        params: Vec<FunParam>,
        body: UntypedStmt,
        span: crate::Span,
    ) -> Result<StmtPattern<TypedExpr, Box<TypedStmt>>> {
        debug!("checking function definition '{}'", name);
        self.check_identifier(&name, &span)?;
        let fn_ty = UnsizedType::Fun(
            params.iter().map(|p| (p.ad_level, p.ty.clone())).collect(),
            Box::new(returntype.clone()),
        );
        let is_forward_decl = matches!(body.pattern, StmtPattern::Skip);

        match self.symbols.look(&name) {
            None => {
                self.check_fresh_distribution(&name, params.is_empty(), &span)?;
                self.symbols.enter(
                    &name,
                    VarInfo {
                        origin: BlockOrigin::Functions,
                        ty: fn_ty,
                    },
                );
                if is_forward_decl {
                    self.symbols.set_is_unassigned(&name);
                }
            }
            Some(info) => {
                // A definition may follow a declaration, but only with the
                // identical signature, and only once.
                let matches_decl = info.ty == fn_ty;
                let was_declared_only = !self.symbols.is_assigned(&name);
                if !(matches_decl && was_declared_only && !is_forward_decl) {
                    bail_sem!(span, SemanticError::FunDefMismatch(name));
                }
                self.symbols.set_is_assigned(&name);
            }
        }

        if is_forward_decl {
            return Ok(StmtPattern::FunDef {
                returntype,
                name,
                params,
                body: Box::new(Stmt::new(StmtPattern::Skip, SpanMeta::new(span))),
            });
        }

        let mut cf = self.cf;
        cf.in_fun_def = true;
        cf.in_returning_fun_def = !matches!(returntype, ReturnType::Void);
        cf.in_rng_fun_def = name.ends_with("_rng");
        cf.in_lp_fun_def = name.ends_with("_lp");
        cf.in_loop = false;

        let (body, status) = self.with_flags(cf, |a| {
            a.with_scope(|a| {
                for p in &params {
                    a.check_identifier(&p.name, &span)?;
                    if !a.symbols.enter(
                        &p.name,
                        VarInfo {
                            origin: BlockOrigin::Functions,
                            ty: p.ty.clone(),
                        },
                    ) {
                        bail_sem!(span, SemanticError::IdentifierInUse(p.name.clone()));
                    }
                    a.symbols.set_read_only(&p.name);
                }
                a.check_nested_stmt(body)
            })
        })?;

        self.check_body_status(status, &returntype, &span)?;

        Ok(StmtPattern::FunDef {
            returntype,
            name,
            params,
            body: Box::new(body),
        })
    }

    /// Every control path through a returning function must end in a return
    /// of a compatible type.
    fn check_body_status(
        &self,
        status: ReturnStatus,
        declared: &ReturnType,
        span: &crate::Span,
    ) -> Result<()> {
        let returning = !matches!(declared, ReturnType::Void);
        match status {
            ReturnStatus::AnyReturn => Ok(()),
            ReturnStatus::Complete(rt) => {
                if join_return_types(&rt, declared).is_none() {
                    bail_sem!(span, SemanticError::InvalidReturnType(rt, declared.clone()));
                }
                Ok(())
            }
            ReturnStatus::Incomplete(rt) => {
                if join_return_types(&rt, declared).is_none() {
                    bail_sem!(span, SemanticError::InvalidReturnType(rt, declared.clone()));
                }
                if returning {
                    bail_sem!(span, SemanticError::IncompleteReturn);
                }
                Ok(())
            }
            ReturnStatus::NoReturn => {
                if returning {
                    bail_sem!(span, SemanticError::IncompleteReturn);
                }
                Ok(())
            }
        }
    }
}

/// Types acceptable on the right of `target +=`: scalars and containers of
/// reals (possibly nested in arrays).
fn target_compatible(ty: &UnsizedType) -> bool {
    match ty {
        UnsizedType::Int
        | UnsizedType::Real
        | UnsizedType::Vector
        | UnsizedType::RowVector
        | UnsizedType::Matrix => true,
        UnsizedType::Array(inner) => target_compatible(inner),
        _ => false,
    }
}

/// Does this statement unconditionally transfer control?
fn is_jump(stmt: &TypedStmt) -> bool {
    match &stmt.pattern {
        StmtPattern::Break | StmtPattern::Continue | StmtPattern::Return(_) => true,
        StmtPattern::NRFunApp(_, name, _) => name == "reject",
        _ => false,
    }
}

/// Apply the rank-reduction rules; `singles[i]` says whether index `i` is a
/// single (rank-reducing) index. `None` means the base cannot take that many
/// indices.
fn reduce_indexed(ty: &UnsizedType, singles: &[bool]) -> Option<UnsizedType> {
    use UnsizedType::*;
    let Some((&first, rest)) = singles.split_first() else {
        return Some(ty.clone());
    };
    match ty {
        Array(elem) => {
            if first {
                reduce_indexed(elem, rest)
            } else {
                Some(UnsizedType::array_of(reduce_indexed(elem, rest)?))
            }
        }
        Vector | RowVector => {
            let reduced = if first { Real } else { ty.clone() };
            reduce_indexed(&reduced, rest)
        }
        Matrix => {
            // A sliced row set with a single column pick is a column vector.
            if singles.len() == 2 && !singles[0] && singles[1] {
                return Some(Vector);
            }
            if first {
                reduce_indexed(&RowVector, rest)
            } else if rest.is_empty() {
                Some(Matrix)
            } else {
                // The second index consumes the column dimension.
                let (&second, rest2) = rest.split_first().unwrap();
                let reduced = if second { Vector } else { Matrix };
                reduce_indexed(&reduced, rest2)
            }
        }
        _ => None,
    }
}

fn check_sized_type<'a>(
    a: &mut Analyzer<'a>,
    st: SizedType<UntypedExpr>,
    check_size: &mut impl FnMut(&mut Analyzer<'a>, UntypedExpr) -> Result<TypedExpr>,
) -> Result<SizedType<TypedExpr>> {
    Ok(match st {
        SizedType::SInt => SizedType::SInt,
        SizedType::SReal => SizedType::SReal,
        SizedType::SVector(n) => SizedType::SVector(check_size(a, n)?),
        SizedType::SRowVector(n) => SizedType::SRowVector(check_size(a, n)?),
        SizedType::SMatrix(r, c) => {
            let r = check_size(a, r)?;
            let c = check_size(a, c)?;
            SizedType::SMatrix(r, c)
        }
        SizedType::SArray(elem, n) => {
            let elem = Box::new(check_sized_type(a, *elem, check_size)?);
            let n = check_size(a, n)?;
            SizedType::SArray(elem, n)
        }
    })
}
