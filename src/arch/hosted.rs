//! Plataforma hospedada (simulação).
//!
//! Não existe registrador de interrupção real: a flag é apenas um
//! `AtomicBool`. A exclusão mútua de verdade vem do `spin::Mutex` dentro do
//! `IrqSpinlock`; aqui só mantemos o protocolo save/restore observável.
//! Com várias threads do host a flag é compartilhada e serve só de indicação.

use core::sync::atomic::{AtomicBool, Ordering};

use super::traits::CpuOps;

/// Flag de interrupção simulada (IF).
static INTERRUPTS: AtomicBool = AtomicBool::new(true);

pub struct HostedCpu;

impl CpuOps for HostedCpu {
    #[inline]
    fn disable_interrupts() {
        INTERRUPTS.store(false, Ordering::Release);
    }

    #[inline]
    fn enable_interrupts() {
        INTERRUPTS.store(true, Ordering::Release);
    }

    #[inline]
    fn are_interrupts_enabled() -> bool {
        INTERRUPTS.load(Ordering::Acquire)
    }
}

/// CPU da plataforma atual.
pub type Cpu = HostedCpu;
