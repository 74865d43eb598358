//! A stack-based symbol table tracking nested scopes.
//!
//! Each binding records where the name was introduced (its block origin) and
//! its unsized type, plus two bits the analyzer maintains: read-only (loop
//! variables, function parameters) and assigned (distinguishes a forward
//! function declaration from its definition).

use std::collections::HashMap;

use crate::types::{BlockOrigin, UnsizedType};

/// What the analyzer knows about a name.
#[derive(Debug, Clone, PartialEq)]
pub struct VarInfo {
    pub origin: BlockOrigin,
    pub ty: UnsizedType,
}

#[derive(Debug, Clone)]
struct Entry {
    info: VarInfo,
    read_only: bool,
    assigned: bool,
}

/// A stack of scopes, innermost last. The root frame holds the program's
/// global names.
#[derive(Debug, Default)]
pub struct SymbolTable {
    frames: Vec<HashMap<String, Entry>>,
}

impl SymbolTable {
    /// Create a table with only the global frame.
    pub fn new() -> Self {
        SymbolTable {
            frames: vec![HashMap::new()],
        }
    }

    pub fn begin_scope(&mut self) {
        self.frames.push(HashMap::new());
    }

    /// Pops the innermost scope. The global frame is never popped.
    pub fn end_scope(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Insert into the innermost scope. Returns false (and leaves the table
    /// unchanged) if the name is already bound in that scope.
    pub fn enter(&mut self, name: &str, info: VarInfo) -> bool {
        let frame = self.frames.last_mut().expect("symbol table has no frames");
        if frame.contains_key(name) {
            return false;
        }
        frame.insert(
            name.to_string(),
            Entry {
                info,
                read_only: false,
                assigned: true,
            },
        );
        true
    }

    /// Look a name up, innermost scope first.
    pub fn look(&self, name: &str) -> Option<&VarInfo> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name))
            .map(|entry| &entry.info)
    }

    pub fn is_defined_in_current_scope(&self, name: &str) -> bool {
        self.frames
            .last()
            .map(|frame| frame.contains_key(name))
            .unwrap_or(false)
    }

    /// Is the binding for this name in the global frame?
    pub fn is_global(&self, name: &str) -> bool {
        for frame in self.frames.iter().rev().take(self.frames.len() - 1) {
            if frame.contains_key(name) {
                return false;
            }
        }
        self.frames[0].contains_key(name)
    }

    pub fn set_read_only(&mut self, name: &str) {
        if let Some(entry) = self.entry_mut(name) {
            entry.read_only = true;
        }
    }

    pub fn is_read_only(&self, name: &str) -> bool {
        self.entry(name).map(|e| e.read_only).unwrap_or(false)
    }

    pub fn set_is_unassigned(&mut self, name: &str) {
        if let Some(entry) = self.entry_mut(name) {
            entry.assigned = false;
        }
    }

    pub fn set_is_assigned(&mut self, name: &str) {
        if let Some(entry) = self.entry_mut(name) {
            entry.assigned = true;
        }
    }

    pub fn is_assigned(&self, name: &str) -> bool {
        self.entry(name).map(|e| e.assigned).unwrap_or(false)
    }

    /// Replace the data of an existing binding in place, wherever it lives
    /// on the stack. Used only by the analyzer to elevate a variable's
    /// origin to match what was assigned to it.
    pub fn unsafe_replace(&mut self, name: &str, info: VarInfo) {
        if let Some(entry) = self.entry_mut(name) {
            entry.info = info;
        }
    }

    fn entry(&self, name: &str) -> Option<&Entry> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    fn entry_mut(&mut self, name: &str) -> Option<&mut Entry> {
        self.frames
            .iter_mut()
            .rev()
            .find_map(|frame| frame.get_mut(name))
    }
}
