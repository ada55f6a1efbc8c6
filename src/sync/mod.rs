//! # Synchronization Primitives
//!
//! O escalonador só precisa de uma primitiva: um spinlock que desabilita as
//! interrupções locais enquanto está preso.
//!
//! ## Regras
//!
//! - Seções críticas curtas (mutação de fila + decisão)
//! - Nada de bloquear ou enviar IPI com o lock preso
//! - Um único lock global do escalonador, sem ordem de aquisição a respeitar

/// Spinlock com salvamento de interrupções
pub mod spinlock;

pub use spinlock::{IrqSpinlock, IrqSpinlockGuard};
