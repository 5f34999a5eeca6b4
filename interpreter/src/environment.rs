use flow::statement::VariableKind;

use crate::error::RuntimeError;
use crate::runtime_value::RuntimeValue;

/// Handle to a scope in the [`Environment`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(usize);

/// A named, mutable value cell owned by exactly one scope.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub kind: VariableKind,
    pub value: RuntimeValue,
}

/// Variable storage of one executing block.
#[derive(Debug, Clone)]
pub struct Scope {
    /// Non-owning link to the enclosing block's scope. None for the root.
    parent: Option<ScopeId>,
    /// Locally declared variables, in declaration order. Names are unique.
    variables: Vec<Variable>,
    /// Kind of the block this scope belongs to.
    block_kind: &'static str,
}

impl Scope {
    pub fn into_variables(self) -> Vec<Variable> {
        self.variables
    }

    fn get(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.variables.iter_mut().find(|v| v.name == name)
    }
}

/// The scope chain of a single program run.
///
/// Scopes live in an arena and point at their parent by index, so the
/// upward walk needs no back-references. Blocks run strictly nested, which
/// makes the arena a stack: a scope is pushed on block entry and popped
/// on exit, and a `ScopeId` stays valid while its block is running.
#[derive(Debug, Default)]
pub struct Environment {
    scopes: Vec<Scope>,
}

impl Environment {
    pub fn new() -> Self {
        Environment { scopes: Vec::new() }
    }

    pub fn push_scope(&mut self, parent: Option<ScopeId>, block_kind: &'static str) -> ScopeId {
        self.scopes.push(Scope {
            parent,
            variables: Vec::new(),
            block_kind,
        });
        tracing::trace!(block_kind, depth = self.scopes.len(), "push scope");
        ScopeId(self.scopes.len() - 1)
    }

    pub fn pop_scope(&mut self) -> Option<Scope> {
        let scope = self.scopes.pop()?;
        tracing::trace!(
            block_kind = scope.block_kind,
            locals = scope.variables.len(),
            "pop scope"
        );
        Some(scope)
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Declare a variable in `scope`. Re-declaring a local name replaces
    /// its kind and value in place.
    pub fn declare(
        &mut self,
        scope: ScopeId,
        name: &str,
        kind: VariableKind,
        value: RuntimeValue,
    ) {
        let scope = &mut self.scopes[scope.0];
        match scope.get_mut(name) {
            Some(existing) => {
                existing.kind = kind;
                existing.value = value;
            }
            None => scope.variables.push(Variable {
                name: name.to_string(),
                kind,
                value,
            }),
        }
    }

    /// True when `name` is declared directly in `scope`, ignoring ancestors.
    pub fn has_local(&self, scope: ScopeId, name: &str) -> bool {
        self.scope(scope).get(name).is_some()
    }

    /// The chain from the root down to `scope`, inclusive.
    pub fn block_tree(&self, scope: ScopeId) -> Vec<ScopeId> {
        let mut tree = vec![scope];
        let mut current = self.scope(scope).parent;
        while let Some(id) = current {
            tree.push(id);
            current = self.scope(id).parent;
        }
        tree.reverse();
        tree
    }

    /// Find the scope that `name` resolves to from `scope`.
    ///
    /// Ancestors are searched first, starting at the root, and `scope`'s own
    /// locals last. An outer declaration therefore wins over a local one of
    /// the same name.
    pub fn resolve_owner(&self, scope: ScopeId, name: &str) -> Option<ScopeId> {
        let tree = self.block_tree(scope);
        let (own, ancestors) = tree.split_last()?;
        ancestors
            .iter()
            .copied()
            .find(|&id| self.has_local(id, name))
            .or_else(|| self.has_local(*own, name).then_some(*own))
    }

    pub fn lookup(&self, scope: ScopeId, name: &str) -> Result<&Variable, RuntimeError> {
        self.resolve_owner(scope, name)
            .and_then(|owner| self.scope(owner).get(name))
            .ok_or_else(|| RuntimeError::UndeclaredVariable(name.to_string()))
    }

    pub fn lookup_mut(
        &mut self,
        scope: ScopeId,
        name: &str,
    ) -> Result<&mut Variable, RuntimeError> {
        let owner = self
            .resolve_owner(scope, name)
            .ok_or_else(|| RuntimeError::UndeclaredVariable(name.to_string()))?;
        self.scopes[owner.0]
            .get_mut(name)
            .ok_or_else(|| RuntimeError::UndeclaredVariable(name.to_string()))
    }
}
