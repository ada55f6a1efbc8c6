//! Estado por CPU do escalonador

use crate::sched::task::ThreadId;
use crate::smp::topology::CpuId;

/// Slot de uma CPU lógica
#[derive(Debug, Clone, Copy)]
pub struct CpuSlot {
    pub id: CpuId,
    /// `start_cpu` já rodou
    pub active: bool,
    /// Thread em execução (a idle quando não há nada pronto)
    pub current: Option<ThreadId>,
    /// Thread idle desta CPU
    pub idle: Option<ThreadId>,
    /// A corrente cedeu a vez: empate de prioridade pode trocar
    pub swap_ok: bool,
    /// A corrente chamou `yield_now` desde o último `schedule`
    pub yielded: bool,
    /// Ticks restantes da fatia da corrente
    pub slice_left: u32,
    /// Reavaliação pendente no próximo ponto de escalonamento
    pub need_resched: bool,
}

impl CpuSlot {
    pub const fn new(id: CpuId) -> Self {
        Self {
            id,
            active: false,
            current: None,
            idle: None,
            swap_ok: false,
            yielded: false,
            slice_left: 0,
            need_resched: false,
        }
    }
}
