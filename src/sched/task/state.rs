//! Estados de thread
//!
//! Conjunto de flags independentes: uma thread pode estar, ao mesmo tempo,
//! pendente numa wait queue e com timeout armado, ou suspensa e dormindo.
//!
//! Ciclo de vida: `PRESTART → READY ⇄ {PENDING, SUSPENDED, TIMING} → DEAD`.

use bitflags::bitflags;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ThreadState: u8 {
        /// Criada, ainda não iniciada
        const PRESTART  = 1 << 0;
        /// Executável (na fila de prontos ou rodando)
        const READY     = 1 << 1;
        /// Esperando numa wait queue
        const PENDING   = 1 << 2;
        /// Suspensa explicitamente
        const SUSPENDED = 1 << 3;
        /// Na fila de timeouts
        const TIMING    = 1 << 4;
        /// Terminada
        const DEAD      = 1 << 5;
    }
}

impl ThreadState {
    /// Flags que decidem se a thread pode executar
    pub const EXECUTION_MASK: ThreadState = ThreadState::READY
        .union(ThreadState::PENDING)
        .union(ThreadState::SUSPENDED)
        .union(ThreadState::PRESTART)
        .union(ThreadState::DEAD);

    /// Flags que impedem a execução
    pub const BLOCKERS: ThreadState = ThreadState::PENDING
        .union(ThreadState::SUSPENDED)
        .union(ThreadState::PRESTART)
        .union(ThreadState::DEAD);

    /// Pronta para executar
    #[inline]
    pub fn is_ready(self) -> bool {
        self.intersection(Self::EXECUTION_MASK) == Self::READY
    }

    /// Pendente, suspensa, não iniciada ou morta
    #[inline]
    pub fn is_prevented_from_running(self) -> bool {
        self.intersects(Self::BLOCKERS)
    }

    /// Dormindo: fora da fila de prontos apenas por um timeout
    #[inline]
    pub fn is_sleeping(self) -> bool {
        self.contains(Self::TIMING) && !self.intersects(Self::READY | Self::PENDING)
    }

    /// Nada impede a thread de voltar para a fila de prontos
    #[inline]
    pub fn can_be_readied(self) -> bool {
        !self.intersects(Self::BLOCKERS | Self::TIMING)
    }
}
