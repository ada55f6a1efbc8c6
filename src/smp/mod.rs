//! Módulo de Multiprocessamento Simétrico (SMP).
//!
//! Módulos contidos:
//! - `topology`: Identificadores e máscaras de CPU.
//! - `percpu`: Estado indexado por CPU.
//! - `ipi`: Seleção de alvos e entrega adiada de Inter-Processor Interrupts.

pub mod ipi;
pub mod percpu;
pub mod topology;

pub use percpu::PerCpu;
pub use topology::{CpuId, CpuMask, MAX_CPUS};
