use std::collections::HashMap;
use std::fmt;

use crate::Type;

/// A cheap handle to refer to symbols unambiguously
///
/// AST nodes store these instead of references; the [`SymbolTable`] owns
/// the symbols themselves and outlives the passes that read them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(usize);

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sym#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Function,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolKind::Variable => write!(f, "variable"),
            SymbolKind::Function => write!(f, "function"),
        }
    }
}

/// The resolved identity of a name
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Scope nesting level at the declaration site; global is 0
    pub depth: usize,
    pub ty: Type,
    /// Parameter types, for function symbols
    pub param_types: Vec<Type>,
}

/// A stack of scopes over an arena of symbols
///
/// A fresh table starts with the global scope already open; that scope is
/// never popped. Handed-out [`SymbolId`]s stay valid after their scope
/// exits.
#[derive(Debug)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    scopes: Vec<HashMap<String, SymbolId>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            symbols: Vec::new(),
            scopes: vec![HashMap::new()],
        }
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn exit_scope(&mut self) {
        assert!(self.scopes.len() > 1, "the global scope is never popped");
        self.scopes.pop();
    }

    /// Nesting level of the current scope; global is 0
    pub fn current_depth(&self) -> usize {
        self.scopes.len() - 1
    }

    /// Insert a name into the current scope
    ///
    /// Returns `None` if the name is already declared in that scope.
    pub fn declare(&mut self, name: &str, kind: SymbolKind) -> Option<SymbolId> {
        let depth = self.current_depth();
        let scope = self.scopes.last_mut()?;
        if scope.contains_key(name) {
            return None;
        }

        let id = SymbolId(self.symbols.len());
        self.symbols.push(Symbol {
            name: name.to_owned(),
            kind,
            depth,
            ty: Type::Unknown,
            param_types: Vec::new(),
        });
        scope.insert(name.to_owned(), id);
        Some(id)
    }

    /// Innermost binding of a name, searching top-down
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }

    pub fn is_declared_in_current_scope(&self, name: &str) -> bool {
        self.scopes
            .last()
            .is_some_and(|scope| scope.contains_key(name))
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0]
    }

    pub fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0]
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
