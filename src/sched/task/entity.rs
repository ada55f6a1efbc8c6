//! Thread Control Block
//!
//! Registro de thread do ponto de vista do escalonador: prioridade, estado,
//! afinidade, contabilidade e os nós de fila. Pilha e contexto de CPU ficam
//! com a plataforma.

use core::fmt;

use super::accounting::Accounting;
use super::priority::Priority;
use super::state::ThreadState;
use crate::klib::list::Link;
use crate::sched::sync::WaitQueueId;
use crate::smp::topology::{CpuId, CpuMask};

/// Handle de thread: índice na arena + geração do slot.
///
/// Handles de slots reciclados são rejeitados com `NoSuchThread`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl ThreadId {
    #[inline]
    pub const fn index(&self) -> u32 {
        self.index
    }

    #[inline]
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    /// Valor único para logs (`geração << 32 | índice`)
    #[inline]
    pub const fn as_u64(&self) -> u64 {
        ((self.generation as u64) << 32) | self.index as u64
    }
}

impl fmt::Debug for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ThreadId({}#{})", self.index, self.generation)
    }
}

/// Marca do nó de fila (prontos ou wait queue)
pub enum QueueLink {}

/// Marca do nó da fila de timeouts
pub enum TimeoutLink {}

/// Dono do nó de fila da thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueSlot {
    None,
    Ready,
    Wait(WaitQueueId),
}

/// Tempo máximo de espera
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// Não espera
    NoWait,
    /// Espera indefinidamente
    Forever,
    /// Espera até `n` ticks
    Ticks(u64),
}

impl Timeout {
    /// `NoWait` ou `Ticks(0)`
    #[inline]
    pub const fn is_no_wait(&self) -> bool {
        matches!(self, Timeout::NoWait | Timeout::Ticks(0))
    }
}

/// Parâmetros de criação de thread
#[derive(Debug, Clone, Copy)]
pub struct ThreadSpec {
    pub name: &'static str,
    pub priority: Priority,
    pub cpu_mask: CpuMask,
    /// Fatia própria em ticks (0 = usa a fatia global)
    pub slice_ticks: u32,
}

impl ThreadSpec {
    pub const fn new(name: &'static str, priority: Priority) -> Self {
        Self {
            name,
            priority,
            cpu_mask: CpuMask::ALL,
            slice_ticks: 0,
        }
    }

    pub const fn with_cpu_mask(mut self, mask: CpuMask) -> Self {
        self.cpu_mask = mask;
        self
    }

    pub const fn with_time_slice(mut self, ticks: u32) -> Self {
        self.slice_ticks = ticks;
        self
    }
}

/// Thread Control Block
pub struct Thread {
    /// Slot ocupado?
    pub(crate) in_use: bool,
    /// Geração do slot na arena
    pub(crate) generation: u32,

    /// Nome (debug)
    pub name: &'static str,
    /// Prioridade efetiva
    pub priority: Priority,
    /// Prioridade definida explicitamente (restaurada após herança)
    pub base_priority: Priority,
    /// Estado atual
    pub state: ThreadState,
    /// Profundidade de `sched_lock`
    pub lock_count: u32,
    /// Última CPU que executou a thread
    pub owning_cpu: Option<CpuId>,
    /// CPU onde a thread é a corrente agora
    pub running_on: Option<CpuId>,
    /// CPUs permitidas
    pub cpu_mask: CpuMask,
    /// Fatia própria (0 = global)
    pub slice_ticks: u32,
    /// Thread idle de alguma CPU
    pub is_idle: bool,
    /// Última espera terminou por timeout
    pub timed_out: bool,
    /// Estatísticas de contabilidade
    pub accounting: Accounting,

    // --- Filas ---
    pub(crate) link: Link,
    pub(crate) slot: QueueSlot,
    pub(crate) timeout_link: Link,
    /// Tick absoluto de expiração, se `TIMING`
    pub(crate) wake_at: Option<u64>,
}

impl Thread {
    /// Slot livre da arena
    pub(crate) const fn vacant(generation: u32) -> Self {
        Self {
            in_use: false,
            generation,
            name: "",
            priority: Priority::IDLE,
            base_priority: Priority::IDLE,
            state: ThreadState::DEAD,
            lock_count: 0,
            owning_cpu: None,
            running_on: None,
            cpu_mask: CpuMask::EMPTY,
            slice_ticks: 0,
            is_idle: false,
            timed_out: false,
            accounting: Accounting::new(),
            link: Link::new(),
            slot: QueueSlot::None,
            timeout_link: Link::new(),
            wake_at: None,
        }
    }

    /// Nova thread em `PRESTART`
    pub(crate) fn new(spec: &ThreadSpec, generation: u32) -> Self {
        Self {
            in_use: true,
            name: spec.name,
            priority: spec.priority,
            base_priority: spec.priority,
            state: ThreadState::PRESTART,
            cpu_mask: spec.cpu_mask,
            slice_ticks: spec.slice_ticks,
            ..Self::vacant(generation)
        }
    }

    /// Preemptível: prioridade não cooperativa e escalonador destravado
    #[inline]
    pub fn is_preemptible(&self) -> bool {
        self.priority.is_preemptive() && self.lock_count == 0
    }

    /// Na fila de prontos
    #[inline]
    pub fn is_queued(&self) -> bool {
        self.slot == QueueSlot::Ready
    }

    /// Wait queue onde está pendente
    #[inline]
    pub fn pended_on(&self) -> Option<WaitQueueId> {
        match self.slot {
            QueueSlot::Wait(wq) => Some(wq),
            _ => None,
        }
    }

    #[inline]
    pub fn wake_at(&self) -> Option<u64> {
        self.wake_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nova_thread_em_prestart() {
        let spec = ThreadSpec::new("t", Priority::new(3).unwrap()).with_time_slice(4);
        let t = Thread::new(&spec, 7);
        assert_eq!(t.state, ThreadState::PRESTART);
        assert_eq!(t.base_priority, t.priority);
        assert_eq!(t.generation, 7);
        assert_eq!(t.slice_ticks, 4);
        assert_eq!(t.cpu_mask, CpuMask::ALL);
        assert!(t.is_preemptible());
        assert!(!t.is_queued());
    }

    #[test]
    fn preemptivel() {
        let mut t = Thread::new(&ThreadSpec::new("t", Priority::new(10).unwrap()), 0);
        t.lock_count = 1;
        assert!(!t.is_preemptible());
        t.lock_count = 0;
        t.priority = Priority::new(-1).unwrap();
        assert!(!t.is_preemptible());
    }

    #[test]
    fn timeout_no_wait() {
        assert!(Timeout::NoWait.is_no_wait());
        assert!(Timeout::Ticks(0).is_no_wait());
        assert!(!Timeout::Ticks(1).is_no_wait());
        assert!(!Timeout::Forever.is_no_wait());
    }
}
