//! Wait queues para bloqueio e sincronização
//!
//! Uma wait queue é uma fila FIFO de threads pendentes, pertencente a uma
//! primitiva de sincronização (semáforo, mutex, fila). O escalonador só sabe
//! pendurar e retirar threads dela, nunca o motivo da espera.
//!
//! As filas moram numa tabela de capacidade fixa dentro do lock do
//! escalonador; a primitiva guarda apenas o handle `WaitQueue`.

use alloc::vec::Vec;
use core::fmt;

use crate::klib::list::IndexList;
use crate::sched::error::{SchedError, SchedResult};
use crate::sched::task::{QueueLink, QueueSlot, ThreadState, ThreadTable};

/// Identificador de wait queue (índice + geração)
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct WaitQueueId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl WaitQueueId {
    #[inline]
    pub const fn index(&self) -> u32 {
        self.index
    }
}

impl fmt::Debug for WaitQueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WaitQueueId({}#{})", self.index, self.generation)
    }
}

/// Handle de uma wait queue, mantido pela primitiva dona.
///
/// Não é `Clone`: destruir a fila consome o handle.
#[derive(Debug, PartialEq, Eq)]
pub struct WaitQueue {
    id: WaitQueueId,
}

impl WaitQueue {
    #[inline]
    pub fn id(&self) -> WaitQueueId {
        self.id
    }
}

struct WaitSlot {
    in_use: bool,
    generation: u32,
    waiters: IndexList<QueueLink>,
}

/// Tabela de wait queues
pub struct WaitQueueTable {
    slots: Vec<WaitSlot>,
    free: Vec<u32>,
}

impl WaitQueueTable {
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            slots.push(WaitSlot {
                in_use: false,
                generation: 0,
                waiters: IndexList::new(),
            });
        }
        let free = (0..capacity as u32).rev().collect();
        Self { slots, free }
    }

    /// Filas em uso
    pub fn live(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub(crate) fn create(&mut self) -> SchedResult<WaitQueue> {
        let index = self.free.pop().ok_or(SchedError::WaitQueueTableFull)?;
        let slot = &mut self.slots[index as usize];
        slot.in_use = true;
        Ok(WaitQueue {
            id: WaitQueueId {
                index,
                generation: slot.generation,
            },
        })
    }

    /// Libera o slot. A fila precisa estar vazia.
    pub(crate) fn destroy(&mut self, wq: WaitQueue) -> SchedResult<()> {
        let index = self.index_of(wq.id)?;
        let slot = &mut self.slots[index];
        debug_assert!(slot.waiters.is_empty());
        slot.in_use = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(index as u32);
        Ok(())
    }

    fn index_of(&self, id: WaitQueueId) -> SchedResult<usize> {
        match self.slots.get(id.index as usize) {
            Some(s) if s.in_use && s.generation == id.generation => Ok(id.index as usize),
            _ => Err(SchedError::NoSuchWaitQueue),
        }
    }

    /// Pendura a thread `index` na cauda de `id`.
    ///
    /// O nó de fila da thread precisa estar livre.
    pub(crate) fn append(
        &mut self,
        table: &mut ThreadTable,
        id: WaitQueueId,
        index: usize,
    ) -> SchedResult<()> {
        let q = self.index_of(id)?;
        let thread = table.at_mut(index);
        if thread.slot != QueueSlot::None {
            return Err(SchedError::AlreadyQueued);
        }
        thread.slot = QueueSlot::Wait(id);
        self.slots[q].waiters.push_back(table, index);
        Ok(())
    }

    /// Retira a thread da wait queue onde estiver.
    ///
    /// No-op (retorna `false`) se ela não está em nenhuma.
    pub(crate) fn remove(&mut self, table: &mut ThreadTable, index: usize) -> bool {
        let QueueSlot::Wait(id) = table.at(index).slot else {
            return false;
        };
        let Ok(q) = self.index_of(id) else {
            return false;
        };
        self.slots[q].waiters.remove(table, index);
        table.at_mut(index).slot = QueueSlot::None;
        true
    }

    /// Retira a primeira da fila
    pub(crate) fn pop_front(
        &mut self,
        table: &mut ThreadTable,
        id: WaitQueueId,
    ) -> SchedResult<Option<usize>> {
        let q = self.index_of(id)?;
        let head = self.slots[q].waiters.pop_front(table);
        if let Some(index) = head {
            table.at_mut(index).slot = QueueSlot::None;
        }
        Ok(head)
    }

    pub fn len(&self, id: WaitQueueId) -> SchedResult<usize> {
        let q = self.index_of(id)?;
        Ok(self.slots[q].waiters.len())
    }

    /// Índices das pendentes em ordem FIFO
    pub(crate) fn waiters(&self, table: &ThreadTable, id: WaitQueueId) -> SchedResult<Vec<usize>> {
        let q = self.index_of(id)?;
        Ok(self.slots[q].waiters.iter(table).collect())
    }

    /// Cada membro deve estar `PENDING` e apontar para a própria fila.
    pub fn check_consistency(&self, table: &ThreadTable) -> Result<(), &'static str> {
        for (q, slot) in self.slots.iter().enumerate() {
            if !slot.in_use {
                if !slot.waiters.is_empty() {
                    return Err("wait queue livre com threads");
                }
                continue;
            }
            let id = WaitQueueId {
                index: q as u32,
                generation: slot.generation,
            };
            let mut len = 0;
            for index in slot.waiters.iter(table) {
                let t = table.at(index);
                if t.slot != QueueSlot::Wait(id) {
                    return Err("thread em wait queue sem o slot correspondente");
                }
                if !t.state.contains(ThreadState::PENDING) {
                    return Err("thread em wait queue sem PENDING");
                }
                len += 1;
            }
            if len != slot.waiters.len() {
                return Err("tamanho da wait queue divergente");
            }
        }
        Ok(())
    }
}
