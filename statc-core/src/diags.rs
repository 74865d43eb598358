//! Compact formatters for types, signatures, and IR trees.
//!
//! Output is close to surface syntax: good enough for error messages, MIR
//! dumps, and tests, without claiming to be a pretty-printer.

use itertools::Itertools;
use std::fmt::{self, Display, Formatter};

use crate::ir::*;
use crate::stdlib::{Signature, StdLib};
use crate::types::{AdLevel, ReturnType, UnsizedType};

impl Display for UnsizedType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            UnsizedType::Int => write!(f, "int"),
            UnsizedType::Real => write!(f, "real"),
            UnsizedType::Vector => write!(f, "vector"),
            UnsizedType::RowVector => write!(f, "row_vector"),
            UnsizedType::Matrix => write!(f, "matrix"),
            UnsizedType::Array(elem) => write!(f, "{}[]", elem),
            UnsizedType::Fun(params, rt) => {
                let params = params
                    .iter()
                    .map(|(ad, ty)| match ad {
                        AdLevel::DataOnly => format!("data {}", ty),
                        AdLevel::AutoDiffable => ty.to_string(),
                    })
                    .join(", ");
                write!(f, "({}) => {}", params, rt)
            }
            UnsizedType::MathLibFn => write!(f, "<math library function>"),
        }
    }
}

impl Display for ReturnType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ReturnType::Void => write!(f, "void"),
            ReturnType::NonVoid(ty) => write!(f, "{}", ty),
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        use Operator::*;
        let symbol = match self {
            Plus | PPlus => "+",
            Minus | PMinus => "-",
            Times => "*",
            Divide => "/",
            Modulo => "%",
            Pow => "^",
            EltTimes => ".*",
            EltDivide => "./",
            Equals => "==",
            NEquals => "!=",
            Less => "<",
            Leq => "<=",
            Greater => ">",
            Geq => ">=",
            And => "&&",
            Or => "||",
            PNot => "!",
            Transpose => "'",
        };
        write!(f, "{}", symbol)
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let args = self.args.iter().map(|(_, ty)| ty.to_string()).join(", ");
        write!(f, "({}) => {}", args, self.rtype)
    }
}

/// All signatures of a catalog name, one per line, for error messages.
pub fn format_signatures(lib: &StdLib, name: &str) -> String {
    let sigs = lib.signatures(name);
    if sigs.is_empty() {
        format!("  (no such function '{}')", name)
    } else {
        sigs.iter().map(|sig| format!("  {}", sig)).join("\n")
    }
}

/// A comma-separated argument type list, for error messages.
pub fn format_arg_types(types: &[UnsizedType]) -> String {
    types.iter().map(UnsizedType::to_string).join(", ")
}

impl<E: Display> Display for Index<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Index::All => write!(f, ":"),
            Index::Single(e) => write!(f, "{}", e),
            Index::Multi(e) => write!(f, "{}", e),
            Index::Upfrom(e) => write!(f, "{}:", e),
            Index::Downfrom(e) => write!(f, ":{}", e),
            Index::Between(a, b) => write!(f, "{}:{}", a, b),
        }
    }
}

impl<M> Display for Expr<M> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.pattern {
            ExprPattern::Var(name) => write!(f, "{}", name),
            ExprPattern::Lit(LitKind::Str, text) => write!(f, "\"{}\"", text),
            ExprPattern::Lit(_, text) => write!(f, "{}", text),
            ExprPattern::FunApp(_, name, args) => {
                write!(f, "{}({})", name, args.iter().map(|a| a.to_string()).join(", "))
            }
            ExprPattern::CondDistApp(name, args) => {
                let mut parts = args.iter().map(|a| a.to_string());
                let first = parts.next().unwrap_or_default();
                write!(f, "{}({} | {})", name, first, parts.join(", "))
            }
            ExprPattern::BinOp(op, lhs, rhs) => write!(f, "({} {} {})", lhs, op, rhs),
            ExprPattern::PrefixOp(op, e) => write!(f, "{}{}", op, e),
            ExprPattern::PostfixOp(e, op) => write!(f, "{}{}", e, op),
            ExprPattern::TernaryIf(c, t, e) => write!(f, "({} ? {} : {})", c, t, e),
            ExprPattern::EAnd(a, b) => write!(f, "({} && {})", a, b),
            ExprPattern::EOr(a, b) => write!(f, "({} || {})", a, b),
            ExprPattern::Indexed(e, indices) => {
                write!(f, "{}[{}]", e, indices.iter().map(|ix| ix.to_string()).join(", "))
            }
        }
    }
}

/// Statement formatter with indentation, in the style of the AST formatter.
pub struct StmtFormatter {
    output: String,
    indent: usize,
}

impl StmtFormatter {
    pub fn new() -> Self {
        StmtFormatter {
            output: String::new(),
            indent: 0,
        }
    }

    pub fn format_stmt<EM, SM>(stmt: &Stmt<EM, SM>) -> String {
        let mut fmt = StmtFormatter::new();
        fmt.write_stmt(stmt);
        fmt.output
    }

    pub fn format_program<EM, SM>(program: &Program<Stmt<EM, SM>>) -> String {
        let mut fmt = StmtFormatter::new();
        for (block_name, stmts) in program.blocks() {
            fmt.write_line(&format!("{} {{", block_name));
            fmt.indent += 1;
            for stmt in stmts {
                fmt.write_stmt(stmt);
            }
            fmt.indent -= 1;
            fmt.write_line("}");
        }
        fmt.output
    }

    fn write_line(&mut self, content: &str) {
        let indent = "  ".repeat(self.indent);
        self.output.push_str(&indent);
        self.output.push_str(content);
        self.output.push('\n');
    }

    fn write_stmt<EM, SM>(&mut self, stmt: &Stmt<EM, SM>) {
        match &stmt.pattern {
            StmtPattern::Assign(lhs, op, rhs) => {
                let indices = if lhs.indices.is_empty() {
                    String::new()
                } else {
                    format!("[{}]", lhs.indices.iter().map(|ix| ix.to_string()).join(", "))
                };
                let op = op.map(|o| o.to_string()).unwrap_or_default();
                self.write_line(&format!("{}{} {}= {};", lhs.name, indices, op, rhs));
            }
            StmtPattern::TargetPlusEq(e) => self.write_line(&format!("target += {};", e)),
            StmtPattern::Tilde {
                arg,
                distribution,
                args,
                truncation,
            } => {
                let args = args.iter().map(|a| a.to_string()).join(", ");
                let trunc = match truncation {
                    Truncation::NoTruncate => String::new(),
                    Truncation::TruncateUpFrom(lb) => format!(" T[{},]", lb),
                    Truncation::TruncateDownFrom(ub) => format!(" T[,{}]", ub),
                    Truncation::TruncateBetween(lb, ub) => format!(" T[{},{}]", lb, ub),
                };
                self.write_line(&format!("{} ~ {}({}){};", arg, distribution, args, trunc));
            }
            StmtPattern::NRFunApp(_, name, args) => {
                self.write_line(&format!(
                    "{}({});",
                    name,
                    args.iter().map(|a| a.to_string()).join(", ")
                ));
            }
            StmtPattern::Break => self.write_line("break;"),
            StmtPattern::Continue => self.write_line("continue;"),
            StmtPattern::Return(Some(e)) => self.write_line(&format!("return {};", e)),
            StmtPattern::Return(None) => self.write_line("return;"),
            StmtPattern::Skip => self.write_line(";"),
            StmtPattern::IfElse(cond, then_s, else_s) => {
                self.write_line(&format!("if ({})", cond));
                self.indent += 1;
                self.write_stmt(then_s);
                self.indent -= 1;
                if let Some(else_s) = else_s {
                    self.write_line("else");
                    self.indent += 1;
                    self.write_stmt(else_s);
                    self.indent -= 1;
                }
            }
            StmtPattern::While(cond, body) => {
                self.write_line(&format!("while ({})", cond));
                self.indent += 1;
                self.write_stmt(body);
                self.indent -= 1;
            }
            StmtPattern::For {
                loopvar,
                lower,
                upper,
                body,
            } => {
                self.write_line(&format!("for ({} in {}:{})", loopvar, lower, upper));
                self.indent += 1;
                self.write_stmt(body);
                self.indent -= 1;
            }
            StmtPattern::ForEach(loopvar, container, body) => {
                self.write_line(&format!("for ({} in {})", loopvar, container));
                self.indent += 1;
                self.write_stmt(body);
                self.indent -= 1;
            }
            StmtPattern::Block(stmts) => {
                self.write_line("{");
                self.indent += 1;
                for s in stmts {
                    self.write_stmt(s);
                }
                self.indent -= 1;
                self.write_line("}");
            }
            StmtPattern::SList(stmts) => {
                for s in stmts {
                    self.write_stmt(s);
                }
            }
            StmtPattern::Decl {
                name,
                ty,
                transformation,
                ..
            } => {
                let bounds = match transformation {
                    Transformation::Identity => String::new(),
                    Transformation::Lower(lb) => format!("<lower={}>", lb),
                    Transformation::Upper(ub) => format!("<upper={}>", ub),
                    Transformation::LowerUpper(lb, ub) => format!("<lower={}, upper={}>", lb, ub),
                };
                self.write_line(&format!("{}{} {};", format_decl_type(ty), bounds, name));
            }
            StmtPattern::FunDef {
                returntype,
                name,
                params,
                body,
            } => {
                let params = params
                    .iter()
                    .map(|p| match p.ad_level {
                        AdLevel::DataOnly => format!("data {} {}", p.ty, p.name),
                        AdLevel::AutoDiffable => format!("{} {}", p.ty, p.name),
                    })
                    .join(", ");
                self.write_line(&format!("{} {}({})", returntype, name, params));
                self.indent += 1;
                self.write_stmt(body);
                self.indent -= 1;
            }
        }
    }
}

impl Default for StmtFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn format_decl_type<E: Display>(ty: &DeclType<E>) -> String {
    match ty {
        DeclType::Unsized(ut) => ut.to_string(),
        DeclType::Sized(st) => format_sized_type(st),
    }
}

fn format_sized_type<E: Display>(st: &SizedType<E>) -> String {
    match st {
        SizedType::SInt => "int".to_string(),
        SizedType::SReal => "real".to_string(),
        SizedType::SVector(n) => format!("vector[{}]", n),
        SizedType::SRowVector(n) => format!("row_vector[{}]", n),
        SizedType::SMatrix(r, c) => format!("matrix[{}, {}]", r, c),
        SizedType::SArray(elem, n) => format!("{}[{}]", format_sized_type(elem), n),
    }
}

impl<EM, SM> Display for Stmt<EM, SM> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", StmtFormatter::format_stmt(self))
    }
}

impl<EM, SM> Display for Program<Stmt<EM, SM>> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", StmtFormatter::format_program(self))
    }
}
