//! # Hardware Abstraction Layer (HAL)
//!
//! Única ponte entre o escalonador (lógica agnóstica) e o hardware. O núcleo
//! só precisa de uma coisa da CPU: desabilitar/restaurar interrupções locais
//! em volta das seções críticas.
//!
//! ## Seleção de Plataforma
//! - `x86_64` bare-metal (`target_os = "none"`): `cli`/`sti`/`pushfq` reais.
//! - Qualquer outro alvo: `hosted`, flag de interrupção simulada. É o que os
//!   testes e simuladores usam.
//!
//! `Cpu` é um *type alias* para a implementação concreta; o resto do crate
//! usa apenas `crate::arch::Cpu` + o trait `CpuOps`.

pub mod traits;

// Seleção de Arquitetura: x86_64 bare-metal
#[cfg(all(target_arch = "x86_64", target_os = "none"))]
pub mod x86_64;

#[cfg(all(target_arch = "x86_64", target_os = "none"))]
pub use self::x86_64 as platform;

// Plataforma hospedada (simulação / testes)
#[cfg(not(all(target_arch = "x86_64", target_os = "none")))]
pub mod hosted;

#[cfg(not(all(target_arch = "x86_64", target_os = "none")))]
pub use self::hosted as platform;

pub use platform::Cpu;
pub use traits::*;
