//! Symbols and the scope stack
//!
//! Scopes are a stack of hash maps: the global scope sits at the bottom and
//! is never popped, every block or function body pushes a frame on entry
//! and drops it on exit. Lookups walk the stack from the top, so an inner
//! binding shadows an outer one of the same name.

use crate::parser::ast::{BaseType, SourceLocation};
use rustc_hash::FxHashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum SymbolKind {
    Variable,
    Parameter,
    /// `defined` is false while only a prototype has been seen
    Function {
        params: Vec<BaseType>,
        defined: bool,
    },
}

/// A named, typed entity; for functions `data_type` is the return type
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub data_type: BaseType,
    pub location: SourceLocation,
    pub used: bool,
}

impl Symbol {
    pub fn variable(name: &str, data_type: BaseType, location: SourceLocation) -> Self {
        Self::new(name, SymbolKind::Variable, data_type, location)
    }

    pub fn parameter(name: &str, data_type: BaseType, location: SourceLocation) -> Self {
        Self::new(name, SymbolKind::Parameter, data_type, location)
    }

    pub fn function(
        name: &str,
        return_type: BaseType,
        params: Vec<BaseType>,
        defined: bool,
        location: SourceLocation,
    ) -> Self {
        Self::new(
            name,
            SymbolKind::Function { params, defined },
            return_type,
            location,
        )
    }

    fn new(name: &str, kind: SymbolKind, data_type: BaseType, location: SourceLocation) -> Self {
        Self {
            name: name.to_string(),
            kind,
            data_type,
            location,
            used: false,
        }
    }

    /// Variables and parameters can be read and assigned; functions cannot
    pub fn is_value(&self) -> bool {
        !self.is_function()
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, SymbolKind::Function { .. })
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SymbolKind::Variable => write!(f, "variable {} {}", self.data_type, self.name),
            SymbolKind::Parameter => write!(f, "parameter {} {}", self.data_type, self.name),
            SymbolKind::Function { params, defined } => {
                let params: Vec<String> = params.iter().map(ToString::to_string).collect();
                write!(
                    f,
                    "function {} {}({}){}",
                    self.data_type,
                    self.name,
                    params.join(", "),
                    if *defined { "" } else { " [prototype]" }
                )
            }
        }
    }
}

pub struct SymbolTable {
    scopes: Vec<FxHashMap<String, Symbol>>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![FxHashMap::default()],
        }
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
        log::trace!("enter scope (depth {})", self.depth());
    }

    /// Pop the innermost scope and hand back its symbols, ordered by
    /// declaration position. The global scope is never popped.
    pub fn leave_scope(&mut self) -> Vec<Symbol> {
        if self.scopes.len() <= 1 {
            return Vec::new();
        }
        log::trace!("leave scope (depth {})", self.depth());
        let mut symbols: Vec<Symbol> = self
            .scopes
            .pop()
            .map(|scope| scope.into_values().collect())
            .unwrap_or_default();
        sort_by_location(&mut symbols);
        symbols
    }

    /// Number of scopes above the global one
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    pub fn is_global(&self) -> bool {
        self.scopes.len() == 1
    }

    /// Add a symbol to the innermost scope. A name already bound in that
    /// same scope is rejected and the symbol handed back.
    pub fn declare(&mut self, symbol: Symbol) -> Result<(), Symbol> {
        let Some(scope) = self.scopes.last_mut() else {
            return Err(symbol);
        };
        if scope.contains_key(&symbol.name) {
            return Err(symbol);
        }
        scope.insert(symbol.name.clone(), symbol);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        self.scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.get_mut(name))
    }

    /// Look in the innermost scope only
    pub fn lookup_current(&self, name: &str) -> Option<&Symbol> {
        self.scopes.last().and_then(|scope| scope.get(name))
    }

    pub fn lookup_current_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        self.scopes.last_mut().and_then(|scope| scope.get_mut(name))
    }

    /// Record a read of the nearest binding of `name`
    pub fn mark_used(&mut self, name: &str) {
        if let Some(symbol) = self.lookup_mut(name) {
            symbol.used = true;
        }
    }

    /// Global symbols ordered by declaration position
    pub fn globals(&self) -> Vec<Symbol> {
        let mut symbols: Vec<Symbol> = self
            .scopes
            .first()
            .map(|scope| scope.values().cloned().collect())
            .unwrap_or_default();
        sort_by_location(&mut symbols);
        symbols
    }
}

fn sort_by_location(symbols: &mut [Symbol]) {
    symbols.sort_by_key(|s| (s.location.line, s.location.column));
}
