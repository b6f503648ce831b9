//! Module: scope
//! Responsibility: shared, reference-counted state for one statement
//! lineage: parameter and alias sequences plus the criteria registry.
//! Does not own: expression trees or rendering.
//!
//! Every criteria derived from a root (subqueries, join participants,
//! clones) holds a clone of the same `CompilationScope`, so they all draw
//! names from one pair of counters.

mod registry;
mod sequence;


use crate::{
    config::CompileConfig,
    model::{EntityModel, MetadataSource},
};
use std::{
    collections::BTreeSet,
    fmt,
    sync::{
        Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
        atomic::{AtomicBool, Ordering},
    },
};
use thiserror::Error as ThisError;

// re-exports
pub use registry::CriteriaId;
pub use sequence::{AliasSequence, ParameterMap, ParameterSequence};

pub(crate) use registry::CriteriaRegistry;

///
/// CompilationScope
///
/// Explicit context object carrying the state shared by a root criteria
/// and everything derived from it. Cloning is cheap and shares state.
///

#[derive(Clone)]
pub struct CompilationScope {
    inner: Arc<ScopeInner>,
}

struct ScopeInner {
    metadata: Arc<dyn MetadataSource>,
    config: CompileConfig,
    parameters: ParameterSequence,
    aliases: AliasSequence,
    registry: CriteriaRegistry,
    user_aliases: RwLock<BTreeSet<String>>,
    // mutations hold it shared, `freeze` exclusively
    gate: RwLock<()>,
    frozen: AtomicBool,
}

impl CompilationScope {
    /// Create a scope with the default compile configuration.
    #[must_use]
    pub fn new(metadata: impl MetadataSource + 'static) -> Self {
        Self::with_config(Arc::new(metadata), CompileConfig::default())
    }

    /// Create a scope over shared metadata with an explicit configuration.
    #[must_use]
    pub fn with_config(metadata: Arc<dyn MetadataSource>, config: CompileConfig) -> Self {
        let parameters = ParameterSequence::new(config.parameter_prefix.clone());
        let aliases = AliasSequence::new(config.alias_prefix.clone());

        Self {
            inner: Arc::new(ScopeInner {
                metadata,
                config,
                parameters,
                aliases,
                registry: CriteriaRegistry::default(),
                user_aliases: RwLock::new(BTreeSet::new()),
                gate: RwLock::new(()),
                frozen: AtomicBool::new(false),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &CompileConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn metadata(&self) -> &dyn MetadataSource {
        self.inner.metadata.as_ref()
    }

    #[must_use]
    pub fn parameters(&self) -> &ParameterSequence {
        &self.inner.parameters
    }

    #[must_use]
    pub fn aliases(&self) -> &AliasSequence {
        &self.inner.aliases
    }

    /// Allocate a fresh parameter name from the shared sequence.
    #[must_use]
    pub fn next_parameter_name(&self) -> String {
        self.inner.parameters.next_parameter_name()
    }

    /// Allocate a fresh default alias from the shared sequence, skipping
    /// any alias a caller has fixed with `with_alias`.
    #[must_use]
    pub fn next_alias(&self) -> String {
        let taken = self
            .inner
            .user_aliases
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        loop {
            let alias = self.inner.aliases.next_alias();
            if !taken.contains(&alias) {
                return alias;
            }
        }
    }

    /// True when both handles point at the same shared state.
    #[must_use]
    pub fn shares_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of criteria registered so far.
    #[must_use]
    pub fn criteria_count(&self) -> usize {
        self.inner.registry.len()
    }

    // ------------------------------------------------------------------
    // Registry
    // ------------------------------------------------------------------

    /// Register a criteria slot. Fails while a compile holds the scope.
    pub(crate) fn register(
        &self,
        entity: Arc<EntityModel>,
        parent: Option<CriteriaId>,
    ) -> Result<CriteriaId, ScopeError> {
        let _gate = self.mutation_gate()?;

        self.inner.registry.register(entity, parent)
    }

    /// Shared hold on the gate, refused once a freeze has started.
    fn mutation_gate(&self) -> Result<RwLockReadGuard<'_, ()>, ScopeError> {
        let gate = self
            .inner
            .gate
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        if self.is_frozen() {
            return Err(ScopeError::Frozen);
        }

        Ok(gate)
    }

    /// Entity model behind a handle.
    pub fn entity_of(&self, id: CriteriaId) -> Result<Arc<EntityModel>, ScopeError> {
        Ok(self.inner.registry.slot(id)?.entity.clone())
    }

    /// Parent handle of a nested criteria, if any.
    pub fn parent_of(&self, id: CriteriaId) -> Result<Option<CriteriaId>, ScopeError> {
        Ok(self.inner.registry.slot(id)?.parent)
    }

    /// Alias of a criteria, assigning the next default alias on first use.
    ///
    /// Once assigned the alias never changes. Assignment is refused while
    /// the scope is frozen.
    pub fn alias_of(&self, id: CriteriaId) -> Result<String, ScopeError> {
        self.alias_of_inner(id, false)
    }

    fn alias_of_inner(&self, id: CriteriaId, holds_freeze: bool) -> Result<String, ScopeError> {
        let slot = self.inner.registry.slot(id)?;
        if let Some(alias) = slot.alias.get() {
            return Ok(alias.clone());
        }
        let _gate = if holds_freeze {
            None
        } else {
            Some(self.mutation_gate()?)
        };

        Ok(slot.alias.get_or_init(|| self.next_alias()).clone())
    }

    /// Alias of a criteria if one was already assigned.
    pub fn assigned_alias(&self, id: CriteriaId) -> Result<Option<String>, ScopeError> {
        Ok(self.inner.registry.slot(id)?.alias.get().cloned())
    }

    /// Fix a caller-chosen alias. Only the first assignment wins.
    pub(crate) fn assign_alias(&self, id: CriteriaId, alias: String) -> Result<(), ScopeError> {
        let _gate = self.mutation_gate()?;
        let slot = self.inner.registry.slot(id)?;
        if let Some(existing) = slot.alias.get() {
            return Err(ScopeError::AliasAssigned {
                id,
                alias: existing.clone(),
            });
        }

        // reserve before setting so a concurrent default draw skips it
        let reserved = self.user_aliases_mut().insert(alias.clone());
        slot.alias.set(alias).map_err(|alias| {
            if reserved {
                self.user_aliases_mut().remove(&alias);
            }
            ScopeError::AliasAssigned {
                id,
                alias: slot.alias.get().cloned().unwrap_or_default(),
            }
        })
    }

    fn user_aliases_mut(&self) -> RwLockWriteGuard<'_, BTreeSet<String>> {
        self.inner
            .user_aliases
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // ------------------------------------------------------------------
    // Freeze
    // ------------------------------------------------------------------

    /// Enter the compile phase. Only one freeze may be held at a time.
    pub fn freeze(&self) -> Result<FreezeGuard, ScopeError> {
        // waits for in-flight registrations; later ones see the flag
        let _gate = self
            .inner
            .gate
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        self.inner
            .frozen
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ScopeError::Busy)?;

        Ok(FreezeGuard {
            scope: self.clone(),
        })
    }

    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.inner.frozen.load(Ordering::Acquire)
    }
}

impl fmt::Debug for CompilationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompilationScope")
            .field("config", &self.inner.config)
            .field("parameters", &self.inner.parameters)
            .field("aliases", &self.inner.aliases)
            .field("criteria", &self.inner.registry.len())
            .field("frozen", &self.is_frozen())
            .finish_non_exhaustive()
    }
}

///
/// FreezeGuard
/// Holds a scope in the compile phase; releases it on drop, including
/// unwind.
///

#[must_use = "the scope unfreezes as soon as the guard is dropped"]
pub struct FreezeGuard {
    scope: CompilationScope,
}

impl FreezeGuard {
    #[must_use]
    pub const fn scope(&self) -> &CompilationScope {
        &self.scope
    }

    /// Alias lookup for the compile that holds the freeze. Unassigned
    /// aliases are still allocated here, before any SQL is rendered.
    pub fn alias_of(&self, id: CriteriaId) -> Result<String, ScopeError> {
        self.scope.alias_of_inner(id, true)
    }
}

impl Drop for FreezeGuard {
    fn drop(&mut self) {
        self.scope.inner.frozen.store(false, Ordering::Release);
    }
}

///
/// ScopeError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ScopeError {
    #[error("scope is frozen for compilation; construction must finish before compiling")]
    Frozen,

    #[error("scope is already being compiled")]
    Busy,

    #[error("criteria handle {id} is not registered in this scope")]
    UnknownCriteria { id: CriteriaId },

    #[error("criteria {id} already has alias '{alias}'")]
    AliasAssigned { id: CriteriaId, alias: String },

    #[error("criteria registry is full")]
    Exhausted,
}
