//! Implementação x86_64 das operações de CPU (HAL).
//!
//! Usa Assembly inline para controle de interrupções.
//!
//! # Segurança
//! Esta implementação assume que o código está rodando em modo longo (64-bit)
//! e nível de privilégio de kernel (Ring 0).

use crate::arch::traits::cpu::CpuOps;
use core::arch::asm;

/// Bit 9 de RFLAGS: Interrupt Flag
const RFLAGS_IF: u64 = 1 << 9;

pub struct X64Cpu;

impl CpuOps for X64Cpu {
    /// Desabilita interrupções (CLI).
    #[inline]
    fn disable_interrupts() {
        // SAFETY: Ring 0; CLI não toca memória.
        unsafe {
            asm!("cli", options(nomem, nostack, preserves_flags));
        }
    }

    /// Habilita interrupções (STI).
    /// Pode causar preempção imediata.
    #[inline]
    fn enable_interrupts() {
        // SAFETY: Ring 0; STI não toca memória.
        unsafe {
            asm!("sti", options(nomem, nostack, preserves_flags));
        }
    }

    /// Verifica se as interrupções estão habilitadas (RFLAGS.IF).
    #[inline]
    fn are_interrupts_enabled() -> bool {
        let rflags: u64;
        // SAFETY: PUSHFQ empilha RFLAGS, POP retira para registrador.
        unsafe {
            asm!("pushfq; pop {}", out(reg) rflags, options(nomem, preserves_flags));
        }
        (rflags & RFLAGS_IF) != 0
    }

    /// Dica para a CPU que estamos em um spinloop (PAUSE).
    #[inline]
    fn relax() {
        // SAFETY: PAUSE é apenas uma dica de spin-wait.
        unsafe {
            asm!("pause", options(nomem, nostack, preserves_flags));
        }
    }
}
