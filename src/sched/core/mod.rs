//! Núcleo do escalonador
//!
//! - `runqueue`: fila de prontos (bitmap + FIFO por nível)
//! - `sleep_queue`: fila de timeouts
//! - `policy`: regras puras de decisão
//! - `scheduler`: estado global, lock e auxiliares
//! - `switch`: escolha da próxima thread
//! - demais módulos: operações públicas do `Scheduler`

pub mod affinity;
pub mod cpu;
pub mod debug;
pub mod lifecycle;
pub mod policy;
pub mod preempt;
pub mod runqueue;
pub mod scheduler;
pub mod sleep_queue;
pub mod switch;
pub mod tick;

pub use cpu::CpuSlot;
pub use debug::ThreadInfo;
pub use policy::SchedulingPolicy;
pub use runqueue::ReadyQueue;
pub use scheduler::Scheduler;
pub use sleep_queue::TimeoutQueue;
pub use switch::ContextSwitch;
