//! Exclusive edit rights, one open session per model system.

use crate::core::error::{EditError, EditResult, ModelSystemId};
use crate::editing::persistence::Persistence;
use log::debug;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// Tracks which model systems currently have an open editing session.
#[derive(Default)]
pub struct SessionController {
    open: Mutex<HashSet<ModelSystemId>>,
}

impl SessionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a controller wrapped in Arc for sharing.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Take exclusive edit rights for a model system.
    ///
    /// Fails with `SessionBusy` if a session is already open for it. The
    /// rights are released when the returned guard is dropped.
    pub fn acquire(self: &Arc<Self>, id: ModelSystemId) -> EditResult<SessionGuard> {
        if !self.open.lock().insert(id) {
            return Err(EditError::SessionBusy(id));
        }
        debug!("Opened session for model system {}", id);
        Ok(SessionGuard {
            controller: Arc::clone(self),
            id,
        })
    }

    pub fn is_open(&self, id: ModelSystemId) -> bool {
        self.open.lock().contains(&id)
    }

    pub fn open_count(&self) -> usize {
        self.open.lock().len()
    }

    /// Read a model system's stored document for export.
    ///
    /// Fails with `SessionBusy` while a session is open on it. No session can
    /// be opened on it until the read is complete.
    pub fn export(&self, id: ModelSystemId, store: &dyn Persistence) -> EditResult<Vec<u8>> {
        let open = self.open.lock();
        if open.contains(&id) {
            return Err(EditError::SessionBusy(id));
        }
        Ok(store.load(id)?)
    }

    fn release(&self, id: ModelSystemId) {
        self.open.lock().remove(&id);
        debug!("Closed session for model system {}", id);
    }
}

/// Exclusive edit rights for one model system.
pub struct SessionGuard {
    controller: Arc<SessionController>,
    id: ModelSystemId,
}

impl SessionGuard {
    pub fn model_system_id(&self) -> ModelSystemId {
        self.id
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.controller.release(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::persistence::MemoryStore;

    #[test]
    fn test_second_acquire_is_busy() {
        let controller = SessionController::new_shared();
        let id = ModelSystemId::new();

        let guard = controller.acquire(id).unwrap();
        assert!(controller.is_open(id));
        assert!(matches!(controller.acquire(id), Err(EditError::SessionBusy(_))));

        drop(guard);
        assert!(!controller.is_open(id));
        assert!(controller.acquire(id).is_ok());
    }

    #[test]
    fn test_independent_model_systems() {
        let controller = SessionController::new_shared();
        let _first = controller.acquire(ModelSystemId::new()).unwrap();
        let _second = controller.acquire(ModelSystemId::new()).unwrap();
        assert_eq!(controller.open_count(), 2);
    }

    #[test]
    fn test_export_blocked_while_open() {
        let controller = SessionController::new_shared();
        let store = MemoryStore::new();
        let id = ModelSystemId::new();
        store.persist(id, b"{}").unwrap();

        let guard = controller.acquire(id).unwrap();
        assert!(matches!(controller.export(id, &store), Err(EditError::SessionBusy(_))));

        drop(guard);
        assert_eq!(controller.export(id, &store).unwrap(), b"{}".to_vec());
    }
}
