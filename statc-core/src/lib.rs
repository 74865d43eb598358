//! Compiler core for a block-structured statistical modeling language.
//!
//! The pipeline runs untyped AST -> typed AST -> canonical MIR -> optimized
//! MIR -> labeled MIR. The parser producing the untyped AST and the C++
//! emitter consuming the final MIR are external collaborators; everything in
//! between lives here.

pub mod analyzer;
pub mod diags;
pub mod error;
pub mod ir;
pub mod lower;
pub mod partial_eval;
pub mod span;
pub mod stdlib;
pub mod symbol_table;
pub mod types;

#[cfg(test)]
mod analyzer_tests;
#[cfg(test)]
mod partial_eval_tests;

use std::marker::PhantomData;

pub use error::{CompilerError, Result};
pub use span::{Location, Span};

use ir::{LabeledProgram, MirProgram, TypedProgram, UntypedProgram};
use stdlib::StdLib;

// =============================================================================
// Generic ID allocation
// =============================================================================

/// Monotonic counter for generating unique IDs.
///
/// The ID type must implement `From<u32>` to convert the raw counter value.
#[derive(Debug, Clone)]
pub struct IdSource<Id> {
    next_id: u32,
    _phantom: PhantomData<Id>,
}

impl<Id: From<u32>> IdSource<Id> {
    pub fn new() -> Self {
        IdSource {
            next_id: 0,
            _phantom: PhantomData,
        }
    }

    pub fn next_id(&mut self) -> Id {
        let id = Id::from(self.next_id);
        self.next_id += 1;
        id
    }
}

impl<Id: From<u32>> Default for IdSource<Id> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Typestate compiler pipeline
// =============================================================================
//
// Each struct represents a pipeline stage; methods consume `self` and return
// the next stage, enforcing valid pass ordering:
//
//   let analyzed = Compiler::analyze(ast)?;       -> Analyzed
//     -> analyzed.lower()                         -> Lowered
//       -> .optimize()                            -> Optimized
//         -> .label()                             -> Labeled

/// Entry point for the compiler core. The signature catalog is built once
/// per process and shared by all compilations.
pub struct Compiler;

impl Compiler {
    /// Run semantic analysis on a parsed program.
    pub fn analyze(ast: UntypedProgram) -> Result<Analyzed> {
        let stdlib = StdLib::instance();
        let program = analyzer::analyze(ast, stdlib)?;
        Ok(Analyzed { program })
    }
}

/// The program has been semantically checked; every expression carries its
/// type, ad-level, and span.
pub struct Analyzed {
    pub program: TypedProgram,
}

impl Analyzed {
    /// Lower to canonical MIR: operators and distribution syntax become
    /// kind-tagged catalog calls, `~` becomes `target +=`.
    pub fn lower(self) -> Lowered {
        let mir = lower::to_mir(self.program, StdLib::instance());
        Lowered { mir }
    }
}

/// The program is in canonical MIR form.
pub struct Lowered {
    pub mir: MirProgram,
}

impl Lowered {
    /// Run the partial evaluator: constant folding, dead branches, and
    /// specialized math-library rewrites.
    pub fn optimize(self) -> Optimized {
        let mir = partial_eval::eval_program(self.mir, StdLib::instance());
        Optimized { mir }
    }
}

/// The MIR has been partially evaluated.
pub struct Optimized {
    pub mir: MirProgram,
}

impl Optimized {
    /// Assign unique pre-order labels to every node, for the dataflow
    /// analyses of later backend stages.
    pub fn label(self) -> Labeled {
        let program = ir::label::label_program(self.mir);
        Labeled { program }
    }
}

/// Every node carries a unique label.
pub struct Labeled {
    pub program: LabeledProgram,
}
