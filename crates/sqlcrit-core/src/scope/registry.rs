use crate::{model::EntityModel, scope::ScopeError};
use derive_more::Display;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

///
/// CriteriaId
///
/// Handle to one criteria registered in a `CompilationScope`.
/// Back-references (subquery → parent, join child → master, column
/// equality → other side) are stored as handles, never as borrows.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[display("#{_0}")]
pub struct CriteriaId(u32);

impl CriteriaId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

///
/// CriteriaSlot
/// Per-criteria state that must be reachable through a handle.
///

#[derive(Debug)]
pub(crate) struct CriteriaSlot {
    pub(crate) entity: Arc<EntityModel>,
    pub(crate) parent: Option<CriteriaId>,
    pub(crate) alias: OnceLock<String>,
}

///
/// CriteriaRegistry
/// Append-only table of criteria slots for one scope.
///

#[derive(Debug, Default)]
pub(crate) struct CriteriaRegistry {
    slots: RwLock<Vec<Arc<CriteriaSlot>>>,
}

impl CriteriaRegistry {
    pub(crate) fn register(
        &self,
        entity: Arc<EntityModel>,
        parent: Option<CriteriaId>,
    ) -> Result<CriteriaId, ScopeError> {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let id = u32::try_from(slots.len()).map_err(|_| ScopeError::Exhausted)?;
        slots.push(Arc::new(CriteriaSlot {
            entity,
            parent,
            alias: OnceLock::new(),
        }));

        Ok(CriteriaId(id))
    }

    pub(crate) fn slot(&self, id: CriteriaId) -> Result<Arc<CriteriaSlot>, ScopeError> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);

        slots
            .get(id.index())
            .cloned()
            .ok_or(ScopeError::UnknownCriteria { id })
    }

    pub(crate) fn len(&self) -> usize {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
