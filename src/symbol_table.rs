//! The single flat variable namespace of one generation run.
//!
//! Lilt has no lexical scoping: a name declared anywhere in the program is
//! visible everywhere after its declaration and keeps its type for the rest
//! of the run. The table is owned by the lowering context (never global
//! state), so independent generation runs cannot leak bindings into each
//! other. The only shadowing the language performs is the counted loop's
//! implicit counter, which saves and restores whatever binding its name had
//! before the loop.

use hashbrown::HashMap;

use crate::{ir::SlotId, ty};

/// Where a declared variable lives and what it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub slot: SlotId,
    pub ty: ty::Type,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    bindings: HashMap<String, Binding>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a new name. Returns `false` if the name is already declared;
    /// re-declaring is a compile error, never a shadow.
    #[must_use]
    pub fn declare(&mut self, name: &str, binding: Binding) -> bool {
        if self.bindings.contains_key(name) {
            return false;
        }

        self.bindings.insert(name.to_owned(), binding);
        true
    }

    pub fn lookup(&self, name: &str) -> Option<Binding> {
        self.bindings.get(name).copied()
    }

    /// Rebinds `name` unconditionally, returning the previous binding so the
    /// caller can [`restore`](Self::restore) it. Used only for the implicit
    /// loop counter.
    pub fn shadow(&mut self, name: &str, binding: Binding) -> Option<Binding> {
        self.bindings.insert(name.to_owned(), binding)
    }

    /// Undoes a [`shadow`](Self::shadow), reinstating the saved binding (or
    /// removing the name if it was unbound before).
    pub fn restore(&mut self, name: &str, previous: Option<Binding>) {
        match previous {
            Some(binding) => {
                self.bindings.insert(name.to_owned(), binding);
            }
            None => {
                self.bindings.remove(name);
            }
        }
    }
}
