//! IrqSpinlock - busy-wait com interrupções locais desabilitadas

use core::ops::{Deref, DerefMut};

use crate::arch::{Cpu, CpuOps};

/// Spinlock que salva e desabilita as interrupções locais antes de travar.
///
/// A ordem importa: primeiro `irq_save`, depois o spin. Assim um handler de
/// interrupção na mesma CPU nunca tenta pegar um lock que ela mesma segura.
/// O guard solta o mutex e só então restaura as interrupções.
///
/// # Quando NÃO usar
///
/// - Seções que podem demorar
/// - Quando pode chamar funções que dormem
pub struct IrqSpinlock<T> {
    inner: spin::Mutex<T>,
}

impl<T> IrqSpinlock<T> {
    /// Cria novo spinlock
    pub const fn new(data: T) -> Self {
        Self {
            inner: spin::Mutex::new(data),
        }
    }

    /// Adquire o lock
    pub fn lock(&self) -> IrqSpinlockGuard<'_, T> {
        let irq = Cpu::irq_save();
        let guard = self.inner.lock();
        IrqSpinlockGuard {
            guard: Some(guard),
            irq,
        }
    }

    /// Tenta adquirir sem bloquear
    pub fn try_lock(&self) -> Option<IrqSpinlockGuard<'_, T>> {
        let irq = Cpu::irq_save();
        match self.inner.try_lock() {
            Some(guard) => Some(IrqSpinlockGuard {
                guard: Some(guard),
                irq,
            }),
            None => {
                // Não conseguiu, restaurar interrupções
                Cpu::irq_restore(irq);
                None
            }
        }
    }

    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }

    /// Acesso exclusivo sem travar (já temos `&mut`)
    pub fn get_mut(&mut self) -> &mut T {
        self.inner.get_mut()
    }
}

/// Guard do spinlock - libera ao sair do escopo
pub struct IrqSpinlockGuard<'a, T> {
    // Option para poder soltar o mutex antes de restaurar as interrupções
    guard: Option<spin::MutexGuard<'a, T>>,
    irq: bool,
}

impl<T> Deref for IrqSpinlockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match &self.guard {
            Some(g) => g,
            None => unreachable!(),
        }
    }
}

impl<T> DerefMut for IrqSpinlockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        match &mut self.guard {
            Some(g) => g,
            None => unreachable!(),
        }
    }
}

impl<T> Drop for IrqSpinlockGuard<'_, T> {
    fn drop(&mut self) {
        // Liberar lock
        drop(self.guard.take());

        // Restaurar interrupções se estavam habilitadas
        Cpu::irq_restore(self.irq);
    }
}
