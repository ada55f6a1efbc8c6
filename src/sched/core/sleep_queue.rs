//! Fila de timeouts
//!
//! Threads dormindo ou pendentes com prazo. Usa o nó de timeout do registro,
//! independente do nó de fila: uma thread pendente com timeout está ao mesmo
//! tempo na sua wait queue e aqui.
//!
//! Ordenada por prazo (FIFO entre prazos iguais): a expiração só olha a
//! cabeça.

use crate::klib::list::IndexList;
use crate::sched::task::{ThreadState, ThreadTable, TimeoutLink};

pub struct TimeoutQueue {
    list: IndexList<TimeoutLink>,
}

impl TimeoutQueue {
    pub const fn new() -> Self {
        Self {
            list: IndexList::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Arma o timeout: `TIMING` + prazo absoluto.
    pub fn add(&mut self, table: &mut ThreadTable, index: usize, deadline: u64) {
        let thread = table.at_mut(index);
        debug_assert!(!thread.state.contains(ThreadState::TIMING));
        thread.state.insert(ThreadState::TIMING);
        thread.wake_at = Some(deadline);

        let after = self
            .list
            .iter(table)
            .find(|&i| table.at(i).wake_at.map_or(false, |at| at > deadline));
        match after {
            Some(at) => self.list.insert_before(table, at, index),
            None => self.list.push_back(table, index),
        }
    }

    /// Desarma. Retorna `false` se não estava armado (corrida perdida).
    pub fn abort(&mut self, table: &mut ThreadTable, index: usize) -> bool {
        let thread = table.at_mut(index);
        if !thread.state.contains(ThreadState::TIMING) {
            return false;
        }
        thread.state.remove(ThreadState::TIMING);
        thread.wake_at = None;
        self.list.remove(table, index);
        true
    }

    /// Cabeça da fila, se o prazo dela venceu em `now`
    pub fn first_expired(&self, table: &ThreadTable, now: u64) -> Option<usize> {
        self.list
            .head()
            .filter(|&i| table.at(i).wake_at.map_or(false, |at| at <= now))
    }

    /// Prazo mais próximo (para programar o timer)
    pub fn next_deadline(&self, table: &ThreadTable) -> Option<u64> {
        self.list.head().and_then(|i| table.at(i).wake_at)
    }

    /// Verifica que cada membro está marcado com `TIMING` e prazo.
    pub fn check_consistency(&self, table: &ThreadTable) -> Result<(), &'static str> {
        let mut len = 0;
        let mut last = 0;
        for index in self.list.iter(table) {
            let t = table.at(index);
            let Some(at) = t.wake_at.filter(|_| t.state.contains(ThreadState::TIMING)) else {
                return Err("timeout sem TIMING ou prazo");
            };
            if at < last {
                return Err("fila de timeouts fora de ordem");
            }
            last = at;
            len += 1;
            if len > table.capacity() {
                return Err("ciclo na fila de timeouts");
            }
        }
        if len != self.list.len() {
            return Err("tamanho da fila de timeouts incorreto");
        }
        Ok(())
    }
}

impl Default for TimeoutQueue {
    fn default() -> Self {
        Self::new()
    }
}
