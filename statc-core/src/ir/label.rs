//! Label assignment and lookup.
//!
//! The labeling pass decorates every expression and statement with a unique
//! integer from a single monotonic counter, in strict pre-order. Downstream
//! dataflow analyses key their facts by these labels; [`associate`] builds
//! the label → node maps they start from.

use std::collections::HashMap;

use super::*;
use crate::IdSource;

/// Assign labels `0..N-1` to every node of the program, pre-order, in block
/// order. Two structurally equal programs receive identical labels.
pub fn label_program(program: MirProgram) -> LabeledProgram {
    let mut source: IdSource<Label> = IdSource::new();
    program.map_stmts(|s| label_stmt(s, &mut source))
}

fn label_stmt(stmt: TypedStmt, source: &mut IdSource<Label>) -> LabeledStmt {
    stmt.map_meta_with_state(
        source,
        &mut |m: TypedMeta, source| LabeledMeta {
            ty: m.ty,
            ad: m.ad,
            span: m.span,
            label: source.next_id(),
        },
        &mut |m: SpanMeta, source| LabeledStmtMeta {
            span: m.span,
            label: source.next_id(),
        },
    )
}

/// Label → node maps over a labeled program.
#[derive(Debug, Default)]
pub struct LabelMaps<'a> {
    pub exprs: HashMap<Label, &'a LabeledExpr>,
    pub stmts: HashMap<Label, &'a LabeledStmt>,
}

/// Index every labeled subtree by its label.
pub fn associate(program: &LabeledProgram) -> LabelMaps<'_> {
    let mut maps = LabelMaps::default();
    for (_, block) in program.blocks() {
        for stmt in block {
            maps = stmt.fold(
                maps,
                &mut |mut maps, e| {
                    maps.exprs.insert(e.meta.label, e);
                    maps
                },
                &mut |mut maps, s| {
                    maps.stmts.insert(s.meta.label, s);
                    maps
                },
            );
        }
    }
    maps
}
