//! Registros de thread

pub mod accounting;
pub mod entity;
pub mod priority;
pub mod state;
pub mod table;

pub use accounting::Accounting;
pub use entity::{QueueLink, QueueSlot, Thread, ThreadId, ThreadSpec, Timeout, TimeoutLink};
pub use priority::{effective_priority, inherited_priority, Priority};
pub use state::ThreadState;
pub use table::ThreadTable;
