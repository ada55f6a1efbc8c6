//! Implementação x86_64 bare-metal da HAL.

pub mod cpu;

pub use cpu::X64Cpu as Cpu;
