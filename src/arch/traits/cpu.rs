//! Interface Abstrata de CPU (HAL).
//! Define as operações que qualquer arquitetura (x86, ARM, RISC-V) deve implementar.

pub trait CpuOps {
    /// Desabilita interrupções locais.
    /// Crítico para seções atômicas no escalonador.
    fn disable_interrupts();

    /// Habilita interrupções locais.
    fn enable_interrupts();

    /// Verifica se as interrupções estão habilitadas.
    fn are_interrupts_enabled() -> bool;

    /// Dica para a CPU que estamos em um spinloop.
    #[inline]
    fn relax() {
        core::hint::spin_loop();
    }

    /// Desabilita interrupções e devolve o estado anterior.
    ///
    /// Par de `irq_restore`. É a base do `IrqSpinlock`.
    #[inline]
    fn irq_save() -> bool {
        let enabled = Self::are_interrupts_enabled();
        Self::disable_interrupts();
        enabled
    }

    /// Restaura o estado salvo por `irq_save`.
    #[inline]
    fn irq_restore(were_enabled: bool) {
        if were_enabled {
            Self::enable_interrupts();
        }
    }
}
