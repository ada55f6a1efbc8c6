//! Regras de decisão do escalonador
//!
//! Funções puras sobre registros de thread; o `Scheduler` as aplica com o
//! lock preso.

use crate::sched::task::{Priority, Thread};

/// Classe de escalonamento de uma thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulingPolicy {
    /// Prioridade negativa: só sai da CPU por vontade própria
    Cooperative,
    /// Prioridade >= 0: pode ser preemptada
    Preemptive,
    /// Thread idle de uma CPU
    Idle,
}

impl SchedulingPolicy {
    pub fn of(thread: &Thread) -> Self {
        if thread.is_idle {
            Self::Idle
        } else if thread.priority.is_cooperative() {
            Self::Cooperative
        } else {
            Self::Preemptive
        }
    }
}

/// Parâmetros globais de time slicing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceConfig {
    pub ticks: u32,
    pub max_prio: Priority,
}

/// A corrente deve sair da CPU agora?
///
/// - corrente bloqueada (pendente, suspensa, dormindo, morta): sim;
/// - corrente cooperativa ou com `sched_lock`: nunca por esta checagem;
/// - senão: se a melhor pronta é estritamente mais urgente, ou igual e a
///   corrente esgotou a fatia / cedeu a vez.
pub fn must_switch(current: &Thread, best: Option<&Thread>, slice_expired: bool) -> bool {
    if !current.state.is_ready() {
        return true;
    }
    if !current.is_preemptible() {
        return false;
    }
    let Some(best) = best else {
        return false;
    };

    best.priority.is_higher_than(current.priority)
        || (best.priority == current.priority && slice_expired)
}

/// `candidate` pode tomar o lugar da corrente?
///
/// Verdadeiro quando a corrente cedeu a vez, está impedida de rodar, ou é
/// preemptível.
pub fn should_preempt(current: &Thread, swap_ok: bool) -> bool {
    swap_ok || current.state.is_prevented_from_running() || current.is_preemptible()
}

/// A thread participa de time slicing?
pub fn is_sliceable(thread: &Thread, slice: &SliceConfig) -> bool {
    if thread.is_idle || thread.state.is_prevented_from_running() {
        return false;
    }
    if thread.slice_ticks > 0 {
        return true;
    }
    thread.is_preemptible()
        && slice.ticks > 0
        && !thread.priority.is_higher_than(slice.max_prio)
}

/// Fatia a carregar quando a thread ganha a CPU
pub fn slice_for(thread: &Thread, slice: &SliceConfig) -> u32 {
    if thread.slice_ticks > 0 {
        thread.slice_ticks
    } else {
        slice.ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sched::task::{ThreadSpec, ThreadState};

    fn thread(prio: i32) -> Thread {
        let mut t = Thread::new(&ThreadSpec::new("t", Priority::new(prio).unwrap()), 0);
        t.state = ThreadState::READY;
        t
    }

    #[test]
    fn preempcao_por_prioridade_mais_alta() {
        let mut cur = thread(10);
        let best = thread(3);
        assert!(must_switch(&cur, Some(&best), false));

        cur.lock_count = 1;
        assert!(!must_switch(&cur, Some(&best), false));
    }

    #[test]
    fn cooperativa_nunca_preemptada() {
        let cur = thread(-1);
        let best = thread(-10);
        assert!(!must_switch(&cur, Some(&best), true));
    }

    #[test]
    fn empate_so_com_fatia_expirada() {
        let cur = thread(5);
        let peer = thread(5);
        assert!(!must_switch(&cur, Some(&peer), false));
        assert!(must_switch(&cur, Some(&peer), true));
        assert!(!must_switch(&cur, None, true));
    }

    #[test]
    fn corrente_bloqueada_sempre_troca() {
        let mut cur = thread(-5);
        cur.state = ThreadState::PENDING;
        assert!(must_switch(&cur, None, false));
        assert!(should_preempt(&cur, false));
    }

    #[test]
    fn should_preempt_regras() {
        let coop = thread(-2);
        assert!(!should_preempt(&coop, false));
        assert!(should_preempt(&coop, true));
        assert!(should_preempt(&thread(0), false));
    }

    #[test]
    fn sliceable() {
        let slice = SliceConfig {
            ticks: 10,
            max_prio: Priority::new(0).unwrap(),
        };
        assert!(is_sliceable(&thread(3), &slice));
        assert!(!is_sliceable(&thread(-3), &slice));

        // Fatia própria vale mesmo para cooperativas
        let mut coop = thread(-3);
        coop.slice_ticks = 2;
        assert!(is_sliceable(&coop, &slice));
        assert_eq!(slice_for(&coop, &slice), 2);

        let off = SliceConfig { ticks: 0, ..slice };
        assert!(!is_sliceable(&thread(3), &off));

        let mut idle = thread(3);
        idle.is_idle = true;
        assert!(!is_sliceable(&idle, &slice));
    }
}
