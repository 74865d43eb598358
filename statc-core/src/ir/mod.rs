//! The compiler's tree representation, shared by the AST and the MIR.
//!
//! Expressions and statements are fixed points of two pattern functors,
//! [`ExprPattern`] and [`StmtPattern`], whose child positions are generic.
//! A node pairs a pattern with a metadata slot, and the same shape is reused
//! at every stage by swapping the metadata type:
//!
//! - [`SpanMeta`]: the parser's output (untyped, located),
//! - [`TypedMeta`]: after semantic analysis and in the MIR,
//! - [`LabeledMeta`]: after label assignment, for dataflow analyses,
//! - [`NoMeta`]: erased trees, used for structural comparison.
//!
//! Traversals are written once against the pattern shape (see
//! [`traverse`](crate::ir::traverse)) and reused across all metadata
//! specializations. Child order is part of the interface: traversal is
//! strict left to right in natural reading order (condition before branches,
//! lower bound before upper, head before tail), and the labeling pass
//! depends on it.

use serde::{Deserialize, Serialize};

use crate::types::{AdLevel, ReturnType, UnsizedType};
use crate::Span;

pub mod label;
pub mod traverse;

/// What kind of literal a [`ExprPattern::Lit`] holds. The text is kept
/// verbatim so folding controls formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LitKind {
    Int,
    Real,
    Str,
}

/// Where a called function comes from. Canonical MIR tags every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FnKind {
    /// A function of the target math library (including operators).
    MathLib,
    /// A function synthesized by the compiler (e.g. `make_array`, `length`).
    CompilerInternal,
    /// A function defined in the program's `functions` block.
    UserDefined,
}

/// Operators of the surface language. In canonical MIR these appear as
/// [`FnKind::MathLib`] calls under their catalog names (`Plus__` etc.).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Plus,
    Minus,
    Times,
    Divide,
    Modulo,
    Pow,
    EltTimes,
    EltDivide,
    Equals,
    NEquals,
    Less,
    Leq,
    Greater,
    Geq,
    And,
    Or,
    PNot,
    PPlus,
    PMinus,
    Transpose,
}

impl Operator {
    /// The name this operator is registered under in the signature catalog.
    pub fn fn_name(self) -> &'static str {
        use Operator::*;
        match self {
            Plus => "Plus__",
            Minus => "Minus__",
            Times => "Times__",
            Divide => "Divide__",
            Modulo => "Modulo__",
            Pow => "Pow__",
            EltTimes => "EltTimes__",
            EltDivide => "EltDivide__",
            Equals => "Equals__",
            NEquals => "NEquals__",
            Less => "Less__",
            Leq => "Leq__",
            Greater => "Greater__",
            Geq => "Geq__",
            And => "And__",
            Or => "Or__",
            PNot => "PNot__",
            PPlus => "PPlus__",
            PMinus => "PMinus__",
            Transpose => "Transpose__",
        }
    }

    /// The catalog name used to check a compound assignment (`lhs op= rhs`).
    /// These names trigger the exact-equality rule of the type lattice.
    pub fn assign_name(self) -> Option<&'static str> {
        use Operator::*;
        match self {
            Plus => Some("assign_add"),
            Minus => Some("assign_subtract"),
            Times => Some("assign_multiply"),
            Divide => Some("assign_divide"),
            EltTimes => Some("assign_elt_times"),
            EltDivide => Some("assign_elt_divide"),
            _ => None,
        }
    }

    pub fn is_prefix(self) -> bool {
        matches!(self, Operator::PNot | Operator::PPlus | Operator::PMinus)
    }

    pub fn is_postfix(self) -> bool {
        matches!(self, Operator::Transpose)
    }
}

/// One position of an index list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Index<E> {
    All,
    Single(E),
    Multi(E),
    Upfrom(E),
    Downfrom(E),
    Between(E, E),
}

/// An assignment target: a name with an optional index path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LValue<E> {
    pub name: String,
    pub indices: Vec<Index<E>>,
}

/// Truncation bounds on a sampling statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Truncation<E> {
    NoTruncate,
    /// `T[lb, ]`
    TruncateUpFrom(E),
    /// `T[, ub]`
    TruncateDownFrom(E),
    /// `T[lb, ub]`
    TruncateBetween(E, E),
}

/// A type as written in a declaration, sizes included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SizedType<E> {
    SInt,
    SReal,
    SVector(E),
    SRowVector(E),
    SMatrix(E, E),
    SArray(Box<SizedType<E>>, E),
}

impl<E> SizedType<E> {
    /// Forget the sizes.
    pub fn to_unsized(&self) -> UnsizedType {
        match self {
            SizedType::SInt => UnsizedType::Int,
            SizedType::SReal => UnsizedType::Real,
            SizedType::SVector(_) => UnsizedType::Vector,
            SizedType::SRowVector(_) => UnsizedType::RowVector,
            SizedType::SMatrix(_, _) => UnsizedType::Matrix,
            SizedType::SArray(elem, _) => UnsizedType::array_of(elem.to_unsized()),
        }
    }
}

/// Constraint transformation on a declaration; only the bound forms are
/// semantically checked by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Transformation<E> {
    Identity,
    Lower(E),
    Upper(E),
    LowerUpper(E, E),
}

/// The declared type of a variable: sized at the top level of blocks,
/// unsized for function arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeclType<E> {
    Sized(SizedType<E>),
    Unsized(UnsizedType),
}

impl<E> DeclType<E> {
    pub fn to_unsized(&self) -> UnsizedType {
        match self {
            DeclType::Sized(st) => st.to_unsized(),
            DeclType::Unsized(ut) => ut.clone(),
        }
    }
}

/// One parameter of a user-defined function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunParam {
    pub ad_level: AdLevel,
    pub ty: UnsizedType,
    pub name: String,
}

/// The expression pattern functor. `E` is the child position; the fixed
/// point is [`Expr`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprPattern<E> {
    Var(String),
    Lit(LitKind, String),
    FunApp(FnKind, String, Vec<E>),
    /// `dist(arg | args...)`: conditional-distribution application syntax.
    /// Desugared to a suffixed [`ExprPattern::FunApp`] by lowering.
    CondDistApp(String, Vec<E>),
    /// Infix operator application; desugared to a catalog call by lowering.
    BinOp(Operator, E, E),
    PrefixOp(Operator, E),
    PostfixOp(E, Operator),
    TernaryIf(E, E, E),
    EAnd(E, E),
    EOr(E, E),
    Indexed(E, Vec<Index<E>>),
}

/// The statement pattern functor. `E` is the expression child position, `S`
/// the statement child position; the fixed point is [`Stmt`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StmtPattern<E, S> {
    /// `lhs = rhs`, or `lhs op= rhs` when an operator is present.
    Assign(LValue<E>, Option<Operator>, E),
    TargetPlusEq(E),
    /// `arg ~ distribution(args) [T[..]]`; desugared to
    /// [`StmtPattern::TargetPlusEq`] by lowering.
    Tilde {
        arg: E,
        distribution: String,
        args: Vec<E>,
        truncation: Truncation<E>,
    },
    NRFunApp(FnKind, String, Vec<E>),
    Break,
    Continue,
    Return(Option<E>),
    Skip,
    IfElse(E, S, Option<S>),
    While(E, S),
    For {
        loopvar: String,
        lower: E,
        upper: E,
        body: S,
    },
    /// `for (v in container)`; desugared to a counted `For` by lowering.
    ForEach(String, E, S),
    /// A braced, scoped sequence.
    Block(Vec<S>),
    /// A flat sequence with no scope of its own (used by desugarings).
    SList(Vec<S>),
    Decl {
        ad_level: AdLevel,
        name: String,
        ty: DeclType<E>,
        transformation: Transformation<E>,
    },
    FunDef {
        returntype: ReturnType,
        name: String,
        params: Vec<FunParam>,
        body: S,
    },
}

// =============================================================================
// Fixed points and metadata decorations
// =============================================================================

/// An expression tree with per-node metadata of type `M`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr<M> {
    pub pattern: ExprPattern<Box<Expr<M>>>,
    pub meta: M,
}

impl<M> Expr<M> {
    pub fn new(pattern: ExprPattern<Box<Expr<M>>>, meta: M) -> Self {
        Expr { pattern, meta }
    }
}

/// A statement tree; `EM` decorates contained expressions, `SM` the
/// statements themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt<EM, SM> {
    pub pattern: StmtPattern<Expr<EM>, Box<Stmt<EM, SM>>>,
    pub meta: SM,
}

impl<EM, SM> Stmt<EM, SM> {
    pub fn new(pattern: StmtPattern<Expr<EM>, Box<Stmt<EM, SM>>>, meta: SM) -> Self {
        Stmt { pattern, meta }
    }
}

/// The empty decoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NoMeta;

/// Location only: the parser's decoration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SpanMeta {
    pub span: Span,
}

impl SpanMeta {
    pub fn new(span: Span) -> Self {
        SpanMeta { span }
    }
}

/// The analyzer's decoration: a consistent (type, ad-level, span) triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedMeta {
    pub ty: UnsizedType,
    pub ad: AdLevel,
    pub span: Span,
}

/// A unique integer assigned to each node by the labeling pass.
pub type Label = u32;

/// Typed metadata plus a unique label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledMeta {
    pub ty: UnsizedType,
    pub ad: AdLevel,
    pub span: Span,
    pub label: Label,
}

/// Statement decoration after labeling (statements carry no type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledStmtMeta {
    pub span: Span,
    pub label: Label,
}

pub type UntypedExpr = Expr<SpanMeta>;
pub type UntypedStmt = Stmt<SpanMeta, SpanMeta>;
pub type TypedExpr = Expr<TypedMeta>;
pub type TypedStmt = Stmt<TypedMeta, SpanMeta>;
pub type LabeledExpr = Expr<LabeledMeta>;
pub type LabeledStmt = Stmt<LabeledMeta, LabeledStmtMeta>;

impl TypedExpr {
    pub fn ty(&self) -> &UnsizedType {
        &self.meta.ty
    }

    pub fn ad(&self) -> AdLevel {
        self.meta.ad
    }

    pub fn span(&self) -> &Span {
        &self.meta.span
    }
}

// =============================================================================
// Programs
// =============================================================================

/// A whole program: the named blocks in source order. Absent blocks were not
/// written; an empty block was written but is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program<S> {
    pub name: String,
    #[serde(default = "Option::default")]
    pub functions: Option<Vec<S>>,
    #[serde(default = "Option::default")]
    pub data: Option<Vec<S>>,
    #[serde(default = "Option::default")]
    pub transformed_data: Option<Vec<S>>,
    #[serde(default = "Option::default")]
    pub parameters: Option<Vec<S>>,
    #[serde(default = "Option::default")]
    pub transformed_parameters: Option<Vec<S>>,
    #[serde(default = "Option::default")]
    pub model: Option<Vec<S>>,
    #[serde(default = "Option::default")]
    pub generated_quantities: Option<Vec<S>>,
}

impl<S> Default for Program<S> {
    fn default() -> Self {
        Program {
            name: String::new(),
            functions: None,
            data: None,
            transformed_data: None,
            parameters: None,
            transformed_parameters: None,
            model: None,
            generated_quantities: None,
        }
    }
}

impl<S> Program<S> {
    /// Rebuild the program by mapping every statement, preserving block
    /// structure and order.
    pub fn map_stmts<T>(self, mut f: impl FnMut(S) -> T) -> Program<T> {
        Program {
            name: self.name,
            functions: self.functions.map(|b| b.into_iter().map(&mut f).collect()),
            data: self.data.map(|b| b.into_iter().map(&mut f).collect()),
            transformed_data: self.transformed_data.map(|b| b.into_iter().map(&mut f).collect()),
            parameters: self.parameters.map(|b| b.into_iter().map(&mut f).collect()),
            transformed_parameters: self
                .transformed_parameters
                .map(|b| b.into_iter().map(&mut f).collect()),
            model: self.model.map(|b| b.into_iter().map(&mut f).collect()),
            generated_quantities: self
                .generated_quantities
                .map(|b| b.into_iter().map(&mut f).collect()),
        }
    }

    /// The blocks in pipeline order, with their statements.
    pub fn blocks(&self) -> impl Iterator<Item = (&'static str, &[S])> {
        [
            ("functions", &self.functions),
            ("data", &self.data),
            ("transformed data", &self.transformed_data),
            ("parameters", &self.parameters),
            ("transformed parameters", &self.transformed_parameters),
            ("model", &self.model),
            ("generated quantities", &self.generated_quantities),
        ]
        .into_iter()
        .filter_map(|(name, block)| block.as_ref().map(|b| (name, b.as_slice())))
    }
}

pub type UntypedProgram = Program<UntypedStmt>;
pub type TypedProgram = Program<TypedStmt>;
/// Canonical MIR: the typed tree after lowering, with all surface sugar
/// (operators, `~`, conditional-distribution and foreach forms) desugared
/// to kind-tagged calls.
pub type MirProgram = Program<TypedStmt>;
pub type LabeledProgram = Program<LabeledStmt>;
