//! Forge Sched.
//!
//! Núcleo de escalonamento de threads do Redstone OS para microcontroladores
//! (single-core e SMP). Define a fila de prontos por prioridade, as transições
//! de estado das threads, a decisão de preempção e o envio mínimo de IPIs.
//!
//! Tudo roda em memória: o relógio (ticks) e a entrega física de IPIs são
//! fornecidos pela plataforma.

#![cfg_attr(not(test), no_std)]

// Arena de threads e tabelas são alocadas uma vez na criação do scheduler
extern crate alloc;

// --- Baixo Nível ---
pub mod arch; // HAL (controle de interrupções)
pub mod klib; // Utilitários (bitmap, listas, logging, testes)
pub mod sync; // IrqSpinlock

// --- Núcleo ---
pub mod sched; // Threads, filas e motor de decisão
pub mod smp; // Topologia, per-CPU e IPIs

pub use sched::config::SchedConfig;
pub use sched::core::{ContextSwitch, Scheduler, ThreadInfo};
pub use sched::error::{SchedError, SchedResult};
pub use sched::sync::{WaitQueue, WaitQueueId};
pub use sched::task::{Priority, ThreadId, ThreadSpec, ThreadState, Timeout};
pub use smp::ipi::{IpiController, IpiMode, IpiStats, NoIpi};
pub use smp::topology::{CpuId, CpuMask};
