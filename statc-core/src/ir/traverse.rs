//! Generic traversals over the pattern functors.
//!
//! Everything here is written once against [`ExprPattern`] / [`StmtPattern`]
//! and works for every metadata specialization. Traversal order is strict
//! pre-order, left to right: a node before its children, expression children
//! before statement children (which holds the natural reading order for
//! every variant: condition before branches, lower bound before upper).

use super::*;

// =============================================================================
// Pattern-level maps
// =============================================================================

impl<E> Index<E> {
    pub fn map<E2>(self, f: &mut impl FnMut(E) -> E2) -> Index<E2> {
        match self {
            Index::All => Index::All,
            Index::Single(e) => Index::Single(f(e)),
            Index::Multi(e) => Index::Multi(f(e)),
            Index::Upfrom(e) => Index::Upfrom(f(e)),
            Index::Downfrom(e) => Index::Downfrom(f(e)),
            Index::Between(a, b) => {
                let a = f(a);
                let b = f(b);
                Index::Between(a, b)
            }
        }
    }

    pub fn map_ref<E2>(&self, f: &mut impl FnMut(&E) -> E2) -> Index<E2> {
        match self {
            Index::All => Index::All,
            Index::Single(e) => Index::Single(f(e)),
            Index::Multi(e) => Index::Multi(f(e)),
            Index::Upfrom(e) => Index::Upfrom(f(e)),
            Index::Downfrom(e) => Index::Downfrom(f(e)),
            Index::Between(a, b) => {
                let a = f(a);
                let b = f(b);
                Index::Between(a, b)
            }
        }
    }

    pub fn children(&self) -> Vec<&E> {
        match self {
            Index::All => vec![],
            Index::Single(e) | Index::Multi(e) | Index::Upfrom(e) | Index::Downfrom(e) => vec![e],
            Index::Between(a, b) => vec![a, b],
        }
    }
}

impl<E> SizedType<E> {
    pub fn map<E2>(self, f: &mut impl FnMut(E) -> E2) -> SizedType<E2> {
        match self {
            SizedType::SInt => SizedType::SInt,
            SizedType::SReal => SizedType::SReal,
            SizedType::SVector(e) => SizedType::SVector(f(e)),
            SizedType::SRowVector(e) => SizedType::SRowVector(f(e)),
            SizedType::SMatrix(r, c) => {
                let r = f(r);
                let c = f(c);
                SizedType::SMatrix(r, c)
            }
            SizedType::SArray(elem, len) => {
                let elem = Box::new(elem.map(f));
                let len = f(len);
                SizedType::SArray(elem, len)
            }
        }
    }

    pub fn map_ref<E2>(&self, f: &mut impl FnMut(&E) -> E2) -> SizedType<E2> {
        match self {
            SizedType::SInt => SizedType::SInt,
            SizedType::SReal => SizedType::SReal,
            SizedType::SVector(e) => SizedType::SVector(f(e)),
            SizedType::SRowVector(e) => SizedType::SRowVector(f(e)),
            SizedType::SMatrix(r, c) => {
                let r = f(r);
                let c = f(c);
                SizedType::SMatrix(r, c)
            }
            SizedType::SArray(elem, len) => {
                let elem = Box::new(elem.map_ref(f));
                let len = f(len);
                SizedType::SArray(elem, len)
            }
        }
    }

    /// Size expressions in reading order (array element sizes before the
    /// array length).
    pub fn sizes(&self) -> Vec<&E> {
        match self {
            SizedType::SInt | SizedType::SReal => vec![],
            SizedType::SVector(e) | SizedType::SRowVector(e) => vec![e],
            SizedType::SMatrix(r, c) => vec![r, c],
            SizedType::SArray(elem, len) => {
                let mut out = elem.sizes();
                out.push(len);
                out
            }
        }
    }
}

impl<E> Transformation<E> {
    pub fn map<E2>(self, f: &mut impl FnMut(E) -> E2) -> Transformation<E2> {
        match self {
            Transformation::Identity => Transformation::Identity,
            Transformation::Lower(e) => Transformation::Lower(f(e)),
            Transformation::Upper(e) => Transformation::Upper(f(e)),
            Transformation::LowerUpper(a, b) => {
                let a = f(a);
                let b = f(b);
                Transformation::LowerUpper(a, b)
            }
        }
    }

    pub fn bounds(&self) -> Vec<&E> {
        match self {
            Transformation::Identity => vec![],
            Transformation::Lower(e) | Transformation::Upper(e) => vec![e],
            Transformation::LowerUpper(a, b) => vec![a, b],
        }
    }
}

impl<E> DeclType<E> {
    pub fn map<E2>(self, f: &mut impl FnMut(E) -> E2) -> DeclType<E2> {
        match self {
            DeclType::Sized(st) => DeclType::Sized(st.map(f)),
            DeclType::Unsized(ut) => DeclType::Unsized(ut),
        }
    }
}

impl<E> ExprPattern<E> {
    /// Rebuild the pattern, applying `f` to every child position in order.
    pub fn map<E2>(self, f: &mut impl FnMut(E) -> E2) -> ExprPattern<E2> {
        match self {
            ExprPattern::Var(name) => ExprPattern::Var(name),
            ExprPattern::Lit(kind, text) => ExprPattern::Lit(kind, text),
            ExprPattern::FunApp(kind, name, args) => {
                ExprPattern::FunApp(kind, name, args.into_iter().map(&mut *f).collect())
            }
            ExprPattern::CondDistApp(name, args) => {
                ExprPattern::CondDistApp(name, args.into_iter().map(&mut *f).collect())
            }
            ExprPattern::BinOp(op, lhs, rhs) => {
                let lhs = f(lhs);
                let rhs = f(rhs);
                ExprPattern::BinOp(op, lhs, rhs)
            }
            ExprPattern::PrefixOp(op, e) => ExprPattern::PrefixOp(op, f(e)),
            ExprPattern::PostfixOp(e, op) => ExprPattern::PostfixOp(f(e), op),
            ExprPattern::TernaryIf(c, t, e) => {
                let c = f(c);
                let t = f(t);
                let e = f(e);
                ExprPattern::TernaryIf(c, t, e)
            }
            ExprPattern::EAnd(a, b) => {
                let a = f(a);
                let b = f(b);
                ExprPattern::EAnd(a, b)
            }
            ExprPattern::EOr(a, b) => {
                let a = f(a);
                let b = f(b);
                ExprPattern::EOr(a, b)
            }
            ExprPattern::Indexed(e, indices) => {
                let e = f(e);
                let indices = indices.into_iter().map(|ix| ix.map(f)).collect();
                ExprPattern::Indexed(e, indices)
            }
        }
    }

    pub fn map_ref<E2>(&self, f: &mut impl FnMut(&E) -> E2) -> ExprPattern<E2> {
        match self {
            ExprPattern::Var(name) => ExprPattern::Var(name.clone()),
            ExprPattern::Lit(kind, text) => ExprPattern::Lit(*kind, text.clone()),
            ExprPattern::FunApp(kind, name, args) => {
                ExprPattern::FunApp(*kind, name.clone(), args.iter().map(&mut *f).collect())
            }
            ExprPattern::CondDistApp(name, args) => {
                ExprPattern::CondDistApp(name.clone(), args.iter().map(&mut *f).collect())
            }
            ExprPattern::BinOp(op, lhs, rhs) => {
                let lhs = f(lhs);
                let rhs = f(rhs);
                ExprPattern::BinOp(*op, lhs, rhs)
            }
            ExprPattern::PrefixOp(op, e) => ExprPattern::PrefixOp(*op, f(e)),
            ExprPattern::PostfixOp(e, op) => ExprPattern::PostfixOp(f(e), *op),
            ExprPattern::TernaryIf(c, t, e) => {
                let c = f(c);
                let t = f(t);
                let e = f(e);
                ExprPattern::TernaryIf(c, t, e)
            }
            ExprPattern::EAnd(a, b) => {
                let a = f(a);
                let b = f(b);
                ExprPattern::EAnd(a, b)
            }
            ExprPattern::EOr(a, b) => {
                let a = f(a);
                let b = f(b);
                ExprPattern::EOr(a, b)
            }
            ExprPattern::Indexed(e, indices) => {
                let e = f(e);
                let indices = indices.iter().map(|ix| ix.map_ref(f)).collect();
                ExprPattern::Indexed(e, indices)
            }
        }
    }

    /// Child positions in traversal order.
    pub fn children(&self) -> Vec<&E> {
        match self {
            ExprPattern::Var(_) | ExprPattern::Lit(_, _) => vec![],
            ExprPattern::FunApp(_, _, args) | ExprPattern::CondDistApp(_, args) => {
                args.iter().collect()
            }
            ExprPattern::BinOp(_, lhs, rhs) => vec![lhs, rhs],
            ExprPattern::PrefixOp(_, e) => vec![e],
            ExprPattern::PostfixOp(e, _) => vec![e],
            ExprPattern::TernaryIf(c, t, e) => vec![c, t, e],
            ExprPattern::EAnd(a, b) | ExprPattern::EOr(a, b) => vec![a, b],
            ExprPattern::Indexed(e, indices) => {
                let mut out = vec![e];
                for ix in indices {
                    out.extend(ix.children());
                }
                out
            }
        }
    }
}

impl<E, S> StmtPattern<E, S> {
    /// Rebuild the pattern, applying `fe` to expression children and `fs` to
    /// statement children, in order.
    pub fn map<E2, S2>(
        self,
        fe: &mut impl FnMut(E) -> E2,
        fs: &mut impl FnMut(S) -> S2,
    ) -> StmtPattern<E2, S2> {
        let mut fns = (fe, fs);
        self.map_with(&mut fns, &mut |fns, e| (fns.0)(e), &mut |fns, s| (fns.1)(s))
    }

    /// As [`StmtPattern::map`], but threading a mutable context through both
    /// callbacks. This is the shape stateful traversals need: the callbacks
    /// stay capture-free, so one piece of state can serve expression and
    /// statement positions alike.
    pub fn map_with<C, E2, S2>(
        self,
        ctx: &mut C,
        fe: &mut impl FnMut(&mut C, E) -> E2,
        fs: &mut impl FnMut(&mut C, S) -> S2,
    ) -> StmtPattern<E2, S2> {
        match self {
            StmtPattern::Assign(lhs, op, rhs) => {
                let lhs = LValue {
                    name: lhs.name,
                    indices: lhs
                        .indices
                        .into_iter()
                        .map(|ix| ix.map(&mut |e| fe(ctx, e)))
                        .collect(),
                };
                let rhs = fe(ctx, rhs);
                StmtPattern::Assign(lhs, op, rhs)
            }
            StmtPattern::TargetPlusEq(e) => StmtPattern::TargetPlusEq(fe(ctx, e)),
            StmtPattern::Tilde {
                arg,
                distribution,
                args,
                truncation,
            } => {
                let arg = fe(ctx, arg);
                let args = args.into_iter().map(|e| fe(ctx, e)).collect();
                let truncation = match truncation {
                    Truncation::NoTruncate => Truncation::NoTruncate,
                    Truncation::TruncateUpFrom(e) => Truncation::TruncateUpFrom(fe(ctx, e)),
                    Truncation::TruncateDownFrom(e) => Truncation::TruncateDownFrom(fe(ctx, e)),
                    Truncation::TruncateBetween(a, b) => {
                        let a = fe(ctx, a);
                        let b = fe(ctx, b);
                        Truncation::TruncateBetween(a, b)
                    }
                };
                StmtPattern::Tilde {
                    arg,
                    distribution,
                    args,
                    truncation,
                }
            }
            StmtPattern::NRFunApp(kind, name, args) => {
                StmtPattern::NRFunApp(kind, name, args.into_iter().map(|e| fe(ctx, e)).collect())
            }
            StmtPattern::Break => StmtPattern::Break,
            StmtPattern::Continue => StmtPattern::Continue,
            StmtPattern::Return(e) => StmtPattern::Return(e.map(|e| fe(ctx, e))),
            StmtPattern::Skip => StmtPattern::Skip,
            StmtPattern::IfElse(cond, then_s, else_s) => {
                let cond = fe(ctx, cond);
                let then_s = fs(ctx, then_s);
                let else_s = else_s.map(|s| fs(ctx, s));
                StmtPattern::IfElse(cond, then_s, else_s)
            }
            StmtPattern::While(cond, body) => {
                let cond = fe(ctx, cond);
                let body = fs(ctx, body);
                StmtPattern::While(cond, body)
            }
            StmtPattern::For {
                loopvar,
                lower,
                upper,
                body,
            } => {
                let lower = fe(ctx, lower);
                let upper = fe(ctx, upper);
                let body = fs(ctx, body);
                StmtPattern::For {
                    loopvar,
                    lower,
                    upper,
                    body,
                }
            }
            StmtPattern::ForEach(loopvar, container, body) => {
                let container = fe(ctx, container);
                let body = fs(ctx, body);
                StmtPattern::ForEach(loopvar, container, body)
            }
            StmtPattern::Block(stmts) => {
                StmtPattern::Block(stmts.into_iter().map(|s| fs(ctx, s)).collect())
            }
            StmtPattern::SList(stmts) => {
                StmtPattern::SList(stmts.into_iter().map(|s| fs(ctx, s)).collect())
            }
            StmtPattern::Decl {
                ad_level,
                name,
                ty,
                transformation,
            } => {
                let ty = ty.map(&mut |e| fe(ctx, e));
                let transformation = transformation.map(&mut |e| fe(ctx, e));
                StmtPattern::Decl {
                    ad_level,
                    name,
                    ty,
                    transformation,
                }
            }
            StmtPattern::FunDef {
                returntype,
                name,
                params,
                body,
            } => StmtPattern::FunDef {
                returntype,
                name,
                params,
                body: fs(ctx, body),
            },
        }
    }

    /// As [`StmtPattern::map`], but by reference.
    pub fn map_ref<E2, S2>(
        &self,
        fe: &mut impl FnMut(&E) -> E2,
        fs: &mut impl FnMut(&S) -> S2,
    ) -> StmtPattern<E2, S2> {
        match self {
            StmtPattern::Assign(lhs, op, rhs) => {
                let lhs = LValue {
                    name: lhs.name.clone(),
                    indices: lhs.indices.iter().map(|ix| ix.map_ref(fe)).collect(),
                };
                let rhs = fe(rhs);
                StmtPattern::Assign(lhs, *op, rhs)
            }
            StmtPattern::TargetPlusEq(e) => StmtPattern::TargetPlusEq(fe(e)),
            StmtPattern::Tilde {
                arg,
                distribution,
                args,
                truncation,
            } => {
                let arg = fe(arg);
                let args = args.iter().map(&mut *fe).collect();
                let truncation = match truncation {
                    Truncation::NoTruncate => Truncation::NoTruncate,
                    Truncation::TruncateUpFrom(e) => Truncation::TruncateUpFrom(fe(e)),
                    Truncation::TruncateDownFrom(e) => Truncation::TruncateDownFrom(fe(e)),
                    Truncation::TruncateBetween(a, b) => {
                        let a = fe(a);
                        let b = fe(b);
                        Truncation::TruncateBetween(a, b)
                    }
                };
                StmtPattern::Tilde {
                    arg,
                    distribution: distribution.clone(),
                    args,
                    truncation,
                }
            }
            StmtPattern::NRFunApp(kind, name, args) => {
                StmtPattern::NRFunApp(*kind, name.clone(), args.iter().map(&mut *fe).collect())
            }
            StmtPattern::Break => StmtPattern::Break,
            StmtPattern::Continue => StmtPattern::Continue,
            StmtPattern::Return(e) => StmtPattern::Return(e.as_ref().map(|e| fe(e))),
            StmtPattern::Skip => StmtPattern::Skip,
            StmtPattern::IfElse(cond, then_s, else_s) => {
                let cond = fe(cond);
                let then_s = fs(then_s);
                let else_s = else_s.as_ref().map(|s| fs(s));
                StmtPattern::IfElse(cond, then_s, else_s)
            }
            StmtPattern::While(cond, body) => {
                let cond = fe(cond);
                let body = fs(body);
                StmtPattern::While(cond, body)
            }
            StmtPattern::For {
                loopvar,
                lower,
                upper,
                body,
            } => {
                let lower = fe(lower);
                let upper = fe(upper);
                let body = fs(body);
                StmtPattern::For {
                    loopvar: loopvar.clone(),
                    lower,
                    upper,
                    body,
                }
            }
            StmtPattern::ForEach(loopvar, container, body) => {
                let container = fe(container);
                let body = fs(body);
                StmtPattern::ForEach(loopvar.clone(), container, body)
            }
            StmtPattern::Block(stmts) => StmtPattern::Block(stmts.iter().map(&mut *fs).collect()),
            StmtPattern::SList(stmts) => StmtPattern::SList(stmts.iter().map(&mut *fs).collect()),
            StmtPattern::Decl {
                ad_level,
                name,
                ty,
                transformation,
            } => StmtPattern::Decl {
                ad_level: *ad_level,
                name: name.clone(),
                ty: match ty {
                    DeclType::Sized(st) => DeclType::Sized(st.map_ref(fe)),
                    DeclType::Unsized(ut) => DeclType::Unsized(ut.clone()),
                },
                transformation: match transformation {
                    Transformation::Identity => Transformation::Identity,
                    Transformation::Lower(e) => Transformation::Lower(fe(e)),
                    Transformation::Upper(e) => Transformation::Upper(fe(e)),
                    Transformation::LowerUpper(a, b) => {
                        let a = fe(a);
                        let b = fe(b);
                        Transformation::LowerUpper(a, b)
                    }
                },
            },
            StmtPattern::FunDef {
                returntype,
                name,
                params,
                body,
            } => StmtPattern::FunDef {
                returntype: returntype.clone(),
                name: name.clone(),
                params: params.clone(),
                body: fs(body),
            },
        }
    }

    /// Expression children in traversal order. Every variant's expression
    /// children precede its statement children.
    pub fn expr_children(&self) -> Vec<&E> {
        match self {
            StmtPattern::Assign(lhs, _, rhs) => {
                let mut out: Vec<&E> = vec![];
                for ix in &lhs.indices {
                    out.extend(ix.children());
                }
                out.push(rhs);
                out
            }
            StmtPattern::TargetPlusEq(e) => vec![e],
            StmtPattern::Tilde {
                arg, args, truncation, ..
            } => {
                let mut out = vec![arg];
                out.extend(args.iter());
                match truncation {
                    Truncation::NoTruncate => {}
                    Truncation::TruncateUpFrom(e) | Truncation::TruncateDownFrom(e) => out.push(e),
                    Truncation::TruncateBetween(a, b) => {
                        out.push(a);
                        out.push(b);
                    }
                }
                out
            }
            StmtPattern::NRFunApp(_, _, args) => args.iter().collect(),
            StmtPattern::Break | StmtPattern::Continue | StmtPattern::Skip => vec![],
            StmtPattern::Return(e) => e.iter().collect(),
            StmtPattern::IfElse(cond, _, _) => vec![cond],
            StmtPattern::While(cond, _) => vec![cond],
            StmtPattern::For { lower, upper, .. } => vec![lower, upper],
            StmtPattern::ForEach(_, container, _) => vec![container],
            StmtPattern::Block(_) | StmtPattern::SList(_) => vec![],
            StmtPattern::Decl {
                ty, transformation, ..
            } => {
                let mut out = match ty {
                    DeclType::Sized(st) => st.sizes(),
                    DeclType::Unsized(_) => vec![],
                };
                out.extend(transformation.bounds());
                out
            }
            StmtPattern::FunDef { .. } => vec![],
        }
    }

    /// Statement children in traversal order.
    pub fn stmt_children(&self) -> Vec<&S> {
        match self {
            StmtPattern::IfElse(_, then_s, else_s) => {
                let mut out = vec![then_s];
                out.extend(else_s.iter());
                out
            }
            StmtPattern::While(_, body)
            | StmtPattern::For { body, .. }
            | StmtPattern::ForEach(_, _, body)
            | StmtPattern::FunDef { body, .. } => vec![body],
            StmtPattern::Block(stmts) | StmtPattern::SList(stmts) => stmts.iter().collect(),
            _ => vec![],
        }
    }
}

// =============================================================================
// Tree-level operations
// =============================================================================

impl<M> Expr<M> {
    /// Left fold over this node and every subexpression, pre-order. The
    /// accumulator may retain references into the tree.
    pub fn fold<'t, A>(&'t self, init: A, f: &mut impl FnMut(A, &'t Expr<M>) -> A) -> A {
        let acc = f(init, self);
        self.pattern
            .children()
            .into_iter()
            .fold(acc, |acc, child| child.fold(acc, f))
    }

    /// Rebuild the tree with a new metadata type; `f` sees nodes in
    /// pre-order, which makes it the backbone of the labeling pass.
    pub fn map_meta_with_state<N, St>(
        self,
        state: &mut St,
        f: &mut impl FnMut(M, &mut St) -> N,
    ) -> Expr<N> {
        let Expr { pattern, meta } = self;
        let meta = f(meta, state);
        let pattern = pattern.map(&mut |child: Box<Expr<M>>| {
            Box::new(child.map_meta_with_state(state, f))
        });
        Expr { pattern, meta }
    }

    /// Forget the metadata, keeping only the shape.
    pub fn erase(&self) -> Expr<NoMeta> {
        Expr {
            pattern: self.pattern.map_ref(&mut |child| Box::new(child.erase())),
            meta: NoMeta,
        }
    }
}

impl<EM, SM> Stmt<EM, SM> {
    /// Left fold over this statement tree, pre-order; `fs` is applied to
    /// each statement, `fe` to each expression (via [`Expr::fold`]).
    pub fn fold<'t, A>(
        &'t self,
        init: A,
        fe: &mut impl FnMut(A, &'t Expr<EM>) -> A,
        fs: &mut impl FnMut(A, &'t Stmt<EM, SM>) -> A,
    ) -> A {
        let mut acc = fs(init, self);
        for e in self.pattern.expr_children() {
            acc = e.fold(acc, fe);
        }
        for s in self.pattern.stmt_children() {
            acc = s.fold(acc, fe, fs);
        }
        acc
    }

    /// Rebuild the tree with new metadata types, pre-order.
    pub fn map_meta_with_state<EN, SN, St, FE, FS>(
        self,
        state: &mut St,
        fe: &mut FE,
        fs: &mut FS,
    ) -> Stmt<EN, SN>
    where
        FE: FnMut(EM, &mut St) -> EN,
        FS: FnMut(SM, &mut St) -> SN,
    {
        let Stmt { pattern, meta } = self;
        let meta = fs(meta, state);
        let mut ctx = (state, fe, fs);
        let pattern = pattern.map_with(
            &mut ctx,
            &mut |ctx, e: Expr<EM>| e.map_meta_with_state(ctx.0, ctx.1),
            &mut |ctx, s: Box<Stmt<EM, SM>>| Box::new(s.map_meta_with_state(ctx.0, ctx.1, ctx.2)),
        );
        Stmt { pattern, meta }
    }

    /// Forget the metadata, keeping only the shape.
    pub fn erase(&self) -> Stmt<NoMeta, NoMeta> {
        let pattern = self.pattern.map_ref(
            &mut |e: &Expr<EM>| e.erase(),
            &mut |s: &Box<Stmt<EM, SM>>| Box::new(s.erase()),
        );
        Stmt {
            pattern,
            meta: NoMeta,
        }
    }
}

/// Structural equality of expressions, metadata ignored.
pub fn expr_structural_eq<M, N>(a: &Expr<M>, b: &Expr<N>) -> bool {
    a.erase() == b.erase()
}

/// Structural equality of statements, metadata ignored.
pub fn stmt_structural_eq<EM, SM, EN, SN>(a: &Stmt<EM, SM>, b: &Stmt<EN, SN>) -> bool {
    a.erase() == b.erase()
}
