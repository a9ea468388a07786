use super::symbol::Symbol;
use super::value::Value;
use crate::frontend::grammar::Type;
use std::collections::HashMap;
use tracing::warn;

/// Handle to a scope inside a [`ScopeStore`]. Invalid once the scope is popped.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct ScopeId(usize);

#[derive(Debug, Default)]
struct ScopeData {
    symbols: HashMap<String, Symbol>,
    parent: Option<ScopeId>,
    children: Vec<ScopeId>,
}

/// Arena of scopes forming a tree through parent handles.
#[derive(Debug, Default)]
pub struct ScopeStore {
    scopes: Vec<Option<ScopeData>>,
    free: Vec<usize>,
}

impl ScopeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live scopes.
    pub fn len(&self) -> usize {
        self.scopes.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn new_root(&mut self) -> ScopeId {
        self.allocate(None)
    }

    /// Child of `parent`, for lexical nesting.
    pub fn push_nested(&mut self, parent: ScopeId) -> ScopeId {
        let id = self.allocate(Some(parent));
        if let Some(data) = self.data_mut(parent) {
            data.children.push(id);
        }
        id
    }

    /// Sibling of `scope`: a child of its parent, or another root when `scope`
    /// has no parent. Call frames are created this way so the callee only
    /// reaches the enclosing scopes, never the caller's locals.
    pub fn push_adjacent(&mut self, scope: ScopeId) -> ScopeId {
        match self.parent(scope) {
            Some(parent) => self.push_nested(parent),
            None => self.new_root(),
        }
    }

    /// Destroys `scope` together with everything nested in it.
    pub fn pop(&mut self, scope: ScopeId) {
        let parent = match self.data(scope) {
            Some(data) => data.parent,
            None => return,
        };
        if let Some(data) = parent.and_then(|parent| self.data_mut(parent)) {
            if data.children.last() == Some(&scope) {
                data.children.pop();
            } else {
                data.children.retain(|child| *child != scope);
            }
        }
        self.release(scope);
    }

    /// Drops every binding and child of `scope`, keeping the scope itself.
    pub fn clear(&mut self, scope: ScopeId) {
        let children = match self.data_mut(scope) {
            Some(data) => {
                data.symbols.clear();
                std::mem::take(&mut data.children)
            }
            None => return,
        };
        for child in children {
            self.release(child);
        }
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.data(scope).and_then(|data| data.parent)
    }

    pub fn children(&self, scope: ScopeId) -> &[ScopeId] {
        self.data(scope)
            .map(|data| data.children.as_slice())
            .unwrap_or(&[])
    }

    /// Adds an undefined symbol. Fails without mutation when `name` is already
    /// bound in this very scope.
    pub fn declare(&mut self, scope: ScopeId, name: &str, ty: Type) -> bool {
        self.insert(scope, Symbol::new(name, ty))
    }

    /// Adds a symbol with a value, with the same conflict rule as `declare`.
    pub fn define(&mut self, scope: ScopeId, name: &str, ty: Type, value: Value) -> bool {
        self.insert(scope, Symbol::with_value(name, ty, value))
    }

    pub fn is_declared_here(&self, scope: ScopeId, name: &str) -> bool {
        self.data(scope)
            .map_or(false, |data| data.symbols.contains_key(name))
    }

    /// Walks from `scope` to the root and returns the first binding of `name`.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        let owner = self.owner(scope, name)?;
        self.data(owner)?.symbols.get(name)
    }

    pub fn lookup_mut(&mut self, scope: ScopeId, name: &str) -> Option<&mut Symbol> {
        let owner = self.owner(scope, name)?;
        self.data_mut(owner)?.symbols.get_mut(name)
    }

    /// Binding of `name` in `scope` only, ignoring enclosing scopes.
    pub fn local_mut(&mut self, scope: ScopeId, name: &str) -> Option<&mut Symbol> {
        self.data_mut(scope)?.symbols.get_mut(name)
    }

    /// Scope in which a lookup of `name` from `scope` succeeds.
    pub fn owner(&self, scope: ScopeId, name: &str) -> Option<ScopeId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let data = self.data(id)?;
            if data.symbols.contains_key(name) {
                return Some(id);
            }
            current = data.parent;
        }
        None
    }

    fn insert(&mut self, scope: ScopeId, symbol: Symbol) -> bool {
        let data = match self.data_mut(scope) {
            Some(data) => data,
            None => return false,
        };
        if data.symbols.contains_key(symbol.identifier()) {
            warn!(name = symbol.identifier(), "identifier already bound in this scope");
            return false;
        }
        data.symbols.insert(symbol.identifier().to_owned(), symbol);
        true
    }

    fn allocate(&mut self, parent: Option<ScopeId>) -> ScopeId {
        let data = ScopeData {
            parent,
            ..ScopeData::default()
        };
        match self.free.pop() {
            Some(index) => {
                self.scopes[index] = Some(data);
                ScopeId(index)
            }
            None => {
                self.scopes.push(Some(data));
                ScopeId(self.scopes.len() - 1)
            }
        }
    }

    fn release(&mut self, scope: ScopeId) {
        let mut pending = vec![scope];
        while let Some(id) = pending.pop() {
            if let Some(data) = self.scopes.get_mut(id.0).and_then(Option::take) {
                pending.extend(data.children);
                self.free.push(id.0);
            }
        }
    }

    fn data(&self, scope: ScopeId) -> Option<&ScopeData> {
        self.scopes.get(scope.0).and_then(Option::as_ref)
    }

    fn data_mut(&mut self, scope: ScopeId) -> Option<&mut ScopeData> {
        self.scopes.get_mut(scope.0).and_then(Option::as_mut)
    }
}
