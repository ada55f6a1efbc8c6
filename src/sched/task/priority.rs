//! Prioridades de thread
//!
//! Inteiro com sinal; numericamente menor = mais urgente.
//!
//! ```text
//! -16 ........ -1 | 0 ........ 14 | 15
//!   cooperativas  |  preemptivas  | idle
//! ```
//!
//! Threads cooperativas nunca são preemptadas por outra thread; as
//! preemptivas podem ser. O nível 15 é reservado às threads idle.

use core::cmp::Ordering;
use core::fmt;

use crate::sched::config::{NUM_COOP_PRIORITIES, NUM_PREEMPT_PRIORITIES};
use crate::sched::error::{SchedError, SchedResult};

const COOP: i32 = NUM_COOP_PRIORITIES as i32;
const PREEMPT: i32 = NUM_PREEMPT_PRIORITIES as i32;

/// Prioridade efetiva de uma thread
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Priority(i32);

impl Priority {
    /// Mais urgente (cooperativa)
    pub const HIGHEST: Priority = Priority(-COOP);

    /// Menos urgente disponível para aplicações
    pub const LOWEST: Priority = Priority(PREEMPT - 1);

    /// Reservada às threads idle
    pub const IDLE: Priority = Priority(PREEMPT);

    /// Valida `-NUM_COOP ..= NUM_PREEMPT - 1`.
    pub const fn new(prio: i32) -> SchedResult<Self> {
        if prio < -COOP || prio >= PREEMPT {
            Err(SchedError::InvalidPriority)
        } else {
            Ok(Self(prio))
        }
    }

    /// `x`-ésima prioridade cooperativa (0 = mais urgente).
    pub const fn coop(x: i32) -> SchedResult<Self> {
        if x < 0 || x >= COOP {
            Err(SchedError::InvalidPriority)
        } else {
            Ok(Self(-(COOP - x)))
        }
    }

    /// `x`-ésima prioridade preemptiva (0 = mais urgente).
    pub const fn preempt(x: i32) -> SchedResult<Self> {
        Self::new(x)
    }

    /// Sem validação; uso interno (constantes e idle).
    pub(crate) const fn from_raw(prio: i32) -> Self {
        Self(prio)
    }

    #[inline]
    pub const fn get(self) -> i32 {
        self.0
    }

    #[inline]
    pub const fn is_cooperative(self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn is_preemptive(self) -> bool {
        self.0 >= 0
    }

    /// Índice do nível na fila de prontos (0 = mais urgente)
    #[inline]
    pub const fn level(self) -> usize {
        (self.0 + COOP) as usize
    }

    /// Estritamente mais urgente que `other`
    #[inline]
    pub const fn is_higher_than(self, other: Priority) -> bool {
        self.0 < other.0
    }

    /// Compara por urgência: `Greater` = `self` mais urgente.
    pub fn cmp_urgency(self, other: Priority) -> Ordering {
        other.0.cmp(&self.0)
    }

    /// A mais urgente das duas
    #[inline]
    pub fn most_urgent(self, other: Priority) -> Priority {
        if other.is_higher_than(self) {
            other
        } else {
            self
        }
    }
}

impl TryFrom<i32> for Priority {
    type Error = SchedError;

    fn try_from(prio: i32) -> SchedResult<Self> {
        Self::new(prio)
    }
}

impl From<Priority> for i32 {
    fn from(p: Priority) -> i32 {
        p.0
    }
}

impl fmt::Debug for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Priority({})", self.0)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Aplica o teto de prioridade: nada sobe acima de `ceiling`.
///
/// Numericamente é `max(requested, ceiling)`. Nunca rejeita.
#[inline]
pub fn effective_priority(requested: Priority, ceiling: Priority) -> Priority {
    if requested.0 >= ceiling.0 {
        requested
    } else {
        ceiling
    }
}

/// Prioridade herdada pelo dono de um recurso quando `waiter` espera por ele.
pub fn inherited_priority(owner: Priority, waiter: Priority, ceiling: Priority) -> Priority {
    effective_priority(owner.most_urgent(waiter), ceiling)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intervalo_valido() {
        assert_eq!(Priority::new(-16).map(Priority::get), Ok(-16));
        assert_eq!(Priority::new(14).map(Priority::get), Ok(14));
        assert_eq!(Priority::new(-17), Err(SchedError::InvalidPriority));
        assert_eq!(Priority::new(15), Err(SchedError::InvalidPriority));
        assert_eq!(Priority::try_from(100), Err(SchedError::InvalidPriority));
    }

    #[test]
    fn coop_e_preempt() {
        assert_eq!(Priority::coop(0), Ok(Priority::HIGHEST));
        assert_eq!(Priority::coop(15).map(Priority::get), Ok(-1));
        assert!(Priority::coop(16).is_err());
        assert!(Priority::coop(3).unwrap().is_cooperative());
        assert!(Priority::preempt(0).unwrap().is_preemptive());
    }

    #[test]
    fn niveis() {
        assert_eq!(Priority::new(-16).unwrap().level(), 0);
        assert_eq!(Priority::new(0).unwrap().level(), 16);
        assert_eq!(Priority::LOWEST.level(), 30);
        assert_eq!(Priority::IDLE.level(), 31);
    }

    #[test]
    fn teto_limita_sem_rejeitar() {
        let ceiling = Priority::new(-5).unwrap();
        let p = |v| Priority::new(v).unwrap();

        assert_eq!(effective_priority(p(-10), ceiling), ceiling);
        assert_eq!(effective_priority(p(-5), ceiling), ceiling);
        assert_eq!(effective_priority(p(3), ceiling), p(3));
    }

    #[test]
    fn heranca() {
        let p = |v| Priority::new(v).unwrap();
        assert_eq!(inherited_priority(p(10), p(2), Priority::HIGHEST), p(2));
        assert_eq!(inherited_priority(p(2), p(10), Priority::HIGHEST), p(2));
        assert_eq!(inherited_priority(p(10), p(-8), p(-1)), p(-1));
    }

    #[test]
    fn urgencia() {
        let a = Priority::new(-3).unwrap();
        let b = Priority::new(5).unwrap();
        assert!(a.is_higher_than(b));
        assert!(!a.is_higher_than(a));
        assert_eq!(a.cmp_urgency(b), Ordering::Greater);
        assert_eq!(b.most_urgent(a), a);
    }
}
