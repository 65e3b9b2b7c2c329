//! Editing sessions.
//!
//! An [`EditingSession`] holds exclusive edit rights to one model system. All
//! mutations go through [`EditingSession::batch`] (or one of the single-step
//! wrappers), which runs under the session lock, records the applied commands
//! as one undoable batch and publishes the resulting change events.

use crate::catalog::HookCatalog;
use crate::core::config::EngineConfig;
use crate::core::error::{
    BoundaryId, EditError, EditResult, GraphResult, LinkId, ModelSystemId, NodeId, ValidationReport,
};
use crate::core::module::TypeDescriptor;
use crate::core::types::Position;
use crate::editing::buffer::CommandBuffer;
use crate::editing::command::CommandBatch;
use crate::editing::editor::Editor;
use crate::editing::events::{ChangeEvent, EventRegistry};
use crate::editing::ownership::{SessionController, SessionGuard};
use crate::editing::persistence::Persistence;
use crate::graph::{GraphCodec, ModelSystem, ModelSystemDocument};
use crate::validation::ValidationPipeline;
use crossbeam::channel::Receiver;
use log::{debug, info};
use parking_lot::Mutex;
use std::sync::Arc;

struct SessionState {
    model_system: ModelSystem,
    buffer: CommandBuffer,
}

/// Exclusive editing access to one model system.
pub struct EditingSession {
    catalog: Arc<HookCatalog>,
    state: Mutex<SessionState>,
    events: EventRegistry,
    codec: GraphCodec,
    validation: ValidationPipeline,
    config: EngineConfig,
    guard: SessionGuard,
}

impl EditingSession {
    /// Open a session on a model system.
    ///
    /// Fails with `SessionBusy` if another session holds the same model system.
    pub fn open(
        model_system: ModelSystem,
        catalog: Arc<HookCatalog>,
        controller: &Arc<SessionController>,
        config: EngineConfig,
    ) -> EditResult<Self> {
        let guard = controller.acquire(model_system.id())?;
        Ok(Self {
            catalog,
            state: Mutex::new(SessionState {
                model_system,
                buffer: CommandBuffer::from_config(&config.history),
            }),
            events: EventRegistry::new(),
            codec: GraphCodec::from_config(&config.document),
            validation: ValidationPipeline::default_pipeline(),
            config,
            guard,
        })
    }

    /// Load a stored model system and open a session on it.
    pub fn load(
        id: ModelSystemId,
        store: &dyn Persistence,
        catalog: Arc<HookCatalog>,
        controller: &Arc<SessionController>,
        config: EngineConfig,
    ) -> EditResult<Self> {
        let guard = controller.acquire(id)?;
        let bytes = store.load(id)?;
        let codec = GraphCodec::from_config(&config.document);
        let model_system = codec.from_bytes(id, &bytes, &catalog)?;
        info!("Loaded model system {} ({} node(s))", id, model_system.node_count());
        Ok(Self {
            catalog,
            state: Mutex::new(SessionState {
                model_system,
                buffer: CommandBuffer::from_config(&config.history),
            }),
            events: EventRegistry::new(),
            codec,
            validation: ValidationPipeline::default_pipeline(),
            config,
            guard,
        })
    }

    /// Replace the pipeline run before saving.
    pub fn with_validation(mut self, validation: ValidationPipeline) -> Self {
        self.validation = validation;
        self
    }

    pub fn id(&self) -> ModelSystemId {
        self.guard.model_system_id()
    }

    pub fn catalog(&self) -> &Arc<HookCatalog> {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Receive every change event published by this session from now on.
    pub fn subscribe(&self) -> Receiver<ChangeEvent> {
        self.events.subscribe()
    }

    // ========================================================================
    // Editing
    // ========================================================================

    /// Run several edits as one undoable step.
    ///
    /// If the closure fails, everything it applied is reversed and nothing is
    /// recorded or published.
    pub fn batch<T>(&self, f: impl FnOnce(&mut Editor<'_>) -> GraphResult<T>) -> EditResult<T> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let mut editor = Editor::new(&mut state.model_system, &self.catalog);
        match f(&mut editor) {
            Ok(value) => {
                let (commands, events) = editor.commit();
                debug!("Committed {} command(s)", commands.len());
                state.buffer.record(CommandBatch::new(commands));
                drop(guard);
                self.events.publish(&events);
                Ok(value)
            }
            Err(error) => {
                editor.rollback();
                debug!("Batch rolled back: {}", error);
                Err(error.into())
            }
        }
    }

    pub fn add_start(
        &self,
        boundary: BoundaryId,
        name: &str,
        description: Option<&str>,
        position: Position,
    ) -> EditResult<NodeId> {
        self.batch(|e| e.add_start(boundary, name, description, position))
    }

    pub fn add_node(
        &self,
        boundary: BoundaryId,
        name: &str,
        module_type: Option<&TypeDescriptor>,
    ) -> EditResult<NodeId> {
        self.batch(|e| e.add_node(boundary, name, module_type))
    }

    pub fn add_registered_node(&self, boundary: BoundaryId, name: &str, type_name: &str) -> EditResult<NodeId> {
        self.batch(|e| e.add_registered_node(boundary, name, type_name))
    }

    /// Remove a node together with every link touching it.
    pub fn remove_node(&self, node: NodeId) -> EditResult<()> {
        self.batch(|e| e.remove_node(node))
    }

    /// Change a node's type, severing links the new type can no longer hold.
    pub fn set_type(&self, node: NodeId, module_type: Option<&TypeDescriptor>) -> EditResult<()> {
        self.batch(|e| e.set_type(node, module_type))
    }

    pub fn set_registered_type(&self, node: NodeId, type_name: &str) -> EditResult<()> {
        self.batch(|e| e.set_registered_type(node, type_name))
    }

    pub fn set_parameter_value(&self, node: NodeId, literal: &str) -> EditResult<()> {
        self.batch(|e| e.set_parameter_value(node, literal))
    }

    pub fn rename(&self, node: NodeId, name: &str) -> EditResult<()> {
        self.batch(|e| e.rename(node, name))
    }

    pub fn set_description(&self, node: NodeId, description: Option<&str>) -> EditResult<()> {
        self.batch(|e| e.set_description(node, description))
    }

    pub fn set_disabled(&self, node: NodeId, disabled: bool) -> EditResult<()> {
        self.batch(|e| e.set_disabled(node, disabled))
    }

    pub fn move_node(&self, node: NodeId, x: f64, y: f64) -> EditResult<()> {
        self.batch(|e| e.move_node(node, x, y))
    }

    pub fn add_link(&self, origin: NodeId, hook: &str, destination: NodeId) -> EditResult<LinkId> {
        self.batch(|e| e.add_link(origin, hook, destination))
    }

    pub fn remove_link(&self, link: LinkId) -> EditResult<()> {
        self.batch(|e| e.remove_link(link))
    }

    pub fn add_boundary(&self, parent: BoundaryId, name: &str) -> EditResult<BoundaryId> {
        self.batch(|e| e.add_boundary(parent, name))
    }

    pub fn remove_boundary(&self, boundary: BoundaryId) -> EditResult<()> {
        self.batch(|e| e.remove_boundary(boundary))
    }

    // ========================================================================
    // History
    // ========================================================================

    pub fn undo(&self) -> EditResult<()> {
        let events = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            state.buffer.undo(&mut state.model_system)?
        };
        self.events.publish(&events);
        Ok(())
    }

    pub fn redo(&self) -> EditResult<()> {
        let events = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            state.buffer.redo(&mut state.model_system)?
        };
        self.events.publish(&events);
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        self.state.lock().buffer.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.state.lock().buffer.can_redo()
    }

    // ========================================================================
    // Reading
    // ========================================================================

    /// Read the model system under the session lock.
    pub fn read<T>(&self, f: impl FnOnce(&ModelSystem) -> T) -> T {
        f(&self.state.lock().model_system)
    }

    /// A copy of the model system as it stands.
    pub fn snapshot(&self) -> ModelSystem {
        self.read(ModelSystem::clone)
    }

    pub fn global_boundary(&self) -> BoundaryId {
        self.read(|ms| ms.global_boundary())
    }

    /// Run the validation pipeline against the current state.
    pub fn validate(&self) -> ValidationReport {
        let state = self.state.lock();
        self.validation.validate(&state.model_system, &self.catalog)
    }

    pub fn to_document(&self) -> EditResult<ModelSystemDocument> {
        let state = self.state.lock();
        Ok(self.codec.encode(&state.model_system)?)
    }

    /// Encode the model system and hand the document to a store.
    ///
    /// With `save.validate` set, a model system that fails validation is not
    /// written and `InvalidGraph` is returned.
    pub fn save(&self, store: &dyn Persistence) -> EditResult<()> {
        let bytes = {
            let state = self.state.lock();
            if self.config.save.validate {
                let report = self.validation.validate(&state.model_system, &self.catalog);
                if !report.can_save() {
                    return Err(EditError::InvalidGraph(report.summary()));
                }
            }
            self.codec.to_bytes(&state.model_system)?
        };
        store.persist(self.id(), &bytes)?;
        info!("Saved model system {} ({} bytes)", self.id(), bytes.len());
        Ok(())
    }

    /// Close the session, releasing edit rights, and return the model system.
    pub fn close(self) -> ModelSystem {
        let state = self.state.into_inner();
        debug!("Closing session for model system {}", self.guard.model_system_id());
        state.model_system
    }
}
