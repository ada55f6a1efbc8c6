//! Fila de threads prontas
//!
//! Um FIFO por nível de prioridade + um bitmap de níveis não vazios.
//! Invariante: bit `i` definido ⇔ FIFO `i` não vazio.
//!
//! A thread corrente de cada CPU normalmente NÃO está aqui; ela só volta
//! para a fila quando é deslocada, cede a CPU ou esgota a fatia.

use alloc::vec::Vec;

use crate::klib::bitmap::PrioBitmap;
use crate::klib::list::IndexList;
use crate::sched::config::PRIO_LEVELS;
use crate::sched::error::{SchedError, SchedResult};
use crate::sched::task::{QueueLink, QueueSlot, ThreadId, ThreadState, ThreadTable};
use crate::smp::topology::CpuId;

pub struct ReadyQueue {
    bitmap: PrioBitmap,
    levels: Vec<IndexList<QueueLink>>,
    count: usize,
}

impl ReadyQueue {
    pub fn new() -> Self {
        let mut levels = Vec::with_capacity(PRIO_LEVELS);
        levels.resize_with(PRIO_LEVELS, IndexList::new);
        Self {
            bitmap: PrioBitmap::new(),
            levels,
            count: 0,
        }
    }

    /// Threads na fila
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn bitmap(&self) -> PrioBitmap {
        self.bitmap
    }

    /// Anexa a thread na cauda do seu nível.
    ///
    /// Marca `READY` e limpa `PRESTART`. Não decide preempção.
    pub fn enqueue(&mut self, table: &mut ThreadTable, id: ThreadId) -> SchedResult<()> {
        let index = table.index_of(id)?;
        let thread = table.at_mut(index);
        if thread.slot != QueueSlot::None {
            return Err(SchedError::AlreadyQueued);
        }
        if thread.is_idle {
            return Err(SchedError::ThreadIsIdle);
        }

        thread.state.remove(ThreadState::PRESTART);
        thread.state.insert(ThreadState::READY);
        thread.slot = QueueSlot::Ready;
        let level = thread.priority.level();

        self.levels[level].push_back(table, index);
        self.bitmap.set(level);
        self.count += 1;

        crate::ktrace!("(RunQ) enqueue tid=", id.as_u64());
        Ok(())
    }

    /// Remove a thread do seu nível. No-op se ela não está na fila.
    ///
    /// Retorna `true` se removeu.
    pub fn dequeue(&mut self, table: &mut ThreadTable, id: ThreadId) -> bool {
        let Ok(index) = table.index_of(id) else {
            return false;
        };
        self.dequeue_at(table, index)
    }

    pub(crate) fn dequeue_at(&mut self, table: &mut ThreadTable, index: usize) -> bool {
        let thread = table.at_mut(index);
        if thread.slot != QueueSlot::Ready {
            return false;
        }
        thread.slot = QueueSlot::None;
        let level = thread.priority.level();

        let list = &mut self.levels[level];
        list.remove(table, index);
        if list.is_empty() {
            self.bitmap.clear(level);
        }
        self.count -= 1;

        crate::ktrace!("(RunQ) dequeue idx=", index);
        true
    }

    /// Cabeça do nível mais urgente
    pub fn peek_highest(&self, table: &ThreadTable) -> Option<ThreadId> {
        let level = self.bitmap.lowest()?;
        let head = self.levels[level].head();
        debug_assert!(head.is_some(), "bitmap e lista divergem");
        head.map(|i| table.id_at(i))
    }

    /// Primeira thread, em ordem de prioridade/FIFO, que pode rodar em `cpu`.
    ///
    /// Ignora threads fora da afinidade e threads que ainda são a corrente de
    /// outra CPU (prontas de novo antes de saírem de lá).
    pub fn peek_highest_for(&self, table: &ThreadTable, cpu: CpuId) -> Option<ThreadId> {
        self.best_index_for(table, cpu).map(|i| table.id_at(i))
    }

    pub(crate) fn best_index_for(&self, table: &ThreadTable, cpu: CpuId) -> Option<usize> {
        for level in self.bitmap.iter() {
            for index in self.levels[level].iter(table) {
                let t = table.at(index);
                let free_here = t.running_on.map_or(true, |c| c == cpu);
                if t.cpu_mask.contains(cpu) && free_here {
                    return Some(index);
                }
            }
        }
        None
    }

    /// Move para a cauda do próprio nível (yield / fatia expirada).
    pub fn move_to_tail_of_own_priority(
        &mut self,
        table: &mut ThreadTable,
        id: ThreadId,
    ) -> SchedResult<()> {
        let index = table.index_of(id)?;
        self.dequeue_at(table, index);
        self.enqueue(table, id)
    }

    /// Está na fila de prontos?
    pub fn contains(&self, table: &ThreadTable, id: ThreadId) -> bool {
        table.get(id).map_or(false, |t| t.is_queued())
    }

    /// Itera em ordem de prioridade, FIFO dentro do nível
    pub fn iter<'a>(&'a self, table: &'a ThreadTable) -> impl Iterator<Item = ThreadId> + 'a {
        self.bitmap
            .iter()
            .flat_map(move |level| self.levels[level].iter(table))
            .map(move |i| table.id_at(i))
    }

    /// Verifica bitmap × listas, contagens e encadeamento.
    pub fn check_consistency(&self, table: &ThreadTable) -> Result<(), &'static str> {
        let mut total = 0;
        for (level, list) in self.levels.iter().enumerate() {
            if self.bitmap.test(level) == list.is_empty() {
                return Err("bitmap diverge da lista");
            }

            let mut prev = None;
            let mut len = 0;
            for index in list.iter(table) {
                let t = table.at(index);
                if !t.in_use {
                    return Err("slot livre na fila de prontos");
                }
                if t.slot != QueueSlot::Ready {
                    return Err("thread na fila sem QueueSlot::Ready");
                }
                if t.priority.level() != level {
                    return Err("thread no nível errado");
                }
                if !t.state.is_ready() {
                    return Err("thread não executável na fila de prontos");
                }
                if t.link.prev != prev {
                    return Err("back-link quebrado");
                }
                prev = Some(index);
                len += 1;
                if len > table.capacity() {
                    return Err("ciclo na lista");
                }
            }
            if len != list.len() || list.tail() != prev {
                return Err("tamanho ou cauda da lista incorretos");
            }
            total += len;
        }

        if total != self.count {
            return Err("contagem total incorreta");
        }
        Ok(())
    }
}

impl Default for ReadyQueue {
    fn default() -> Self {
        Self::new()
    }
}
