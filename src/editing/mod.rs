//! Editing: commands, history, sessions and persistence.
//!
//! Every mutation of a model system is expressed as a [`Command`] that knows
//! how to apply and reverse itself. Commands are grouped into batches by an
//! [`Editor`], recorded in a [`CommandBuffer`] and announced to observers as
//! [`ChangeEvent`]s.

pub mod buffer;
pub mod command;
pub mod editor;
pub mod events;
pub mod ownership;
pub mod persistence;
pub mod session;

pub use buffer::{CommandBuffer, EditingStack};
pub use command::{Command, CommandBatch, DetachedLink, NodeAttribute};
pub use editor::Editor;
pub use events::{ChangeEvent, EventRegistry, NodeProperty};
pub use ownership::{SessionController, SessionGuard};
pub use persistence::{FileStore, MemoryStore, Persistence};
pub use session::EditingSession;
