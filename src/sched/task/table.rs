//! Arena de threads
//!
//! Capacidade fixa, alocada uma vez. Slots livres ficam numa pilha; cada
//! liberação incrementa a geração do slot para invalidar handles antigos.

use alloc::vec::Vec;

use super::entity::{QueueLink, Thread, ThreadId, ThreadSpec, TimeoutLink};
use crate::klib::list::{Link, LinkArena};
use crate::sched::error::{SchedError, SchedResult};

pub struct ThreadTable {
    threads: Vec<Thread>,
    free: Vec<u32>,
}

impl ThreadTable {
    pub fn with_capacity(capacity: usize) -> Self {
        let mut threads = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            threads.push(Thread::vacant(0));
        }
        // Pilha invertida: o índice 0 sai primeiro
        let free = (0..capacity as u32).rev().collect();
        Self { threads, free }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.threads.len()
    }

    /// Threads vivas
    #[inline]
    pub fn len(&self) -> usize {
        self.threads.len() - self.free.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registra uma nova thread em `PRESTART`
    pub fn insert(&mut self, spec: &ThreadSpec) -> SchedResult<ThreadId> {
        let index = self.free.pop().ok_or(SchedError::ThreadTableFull)?;
        let slot = &mut self.threads[index as usize];
        let generation = slot.generation;
        *slot = Thread::new(spec, generation);
        Ok(ThreadId { index, generation })
    }

    /// Libera o slot. O chamador garante que a thread saiu de todas as filas.
    pub fn release(&mut self, id: ThreadId) -> SchedResult<()> {
        let index = self.index_of(id)?;
        let next_gen = id.generation.wrapping_add(1);
        self.threads[index] = Thread::vacant(next_gen);
        self.free.push(index as u32);
        Ok(())
    }

    /// Valida o handle e devolve o índice
    pub fn index_of(&self, id: ThreadId) -> SchedResult<usize> {
        match self.threads.get(id.index as usize) {
            Some(t) if t.in_use && t.generation == id.generation => Ok(id.index as usize),
            _ => Err(SchedError::NoSuchThread),
        }
    }

    pub fn get(&self, id: ThreadId) -> SchedResult<&Thread> {
        let index = self.index_of(id)?;
        Ok(&self.threads[index])
    }

    pub fn get_mut(&mut self, id: ThreadId) -> SchedResult<&mut Thread> {
        let index = self.index_of(id)?;
        Ok(&mut self.threads[index])
    }

    /// Acesso por índice já validado
    #[inline]
    pub(crate) fn at(&self, index: usize) -> &Thread {
        &self.threads[index]
    }

    #[inline]
    pub(crate) fn at_mut(&mut self, index: usize) -> &mut Thread {
        &mut self.threads[index]
    }

    /// Handle do slot `index`
    #[inline]
    pub(crate) fn id_at(&self, index: usize) -> ThreadId {
        ThreadId {
            index: index as u32,
            generation: self.threads[index].generation,
        }
    }

    /// Índices das threads vivas
    pub(crate) fn live_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.threads
            .iter()
            .enumerate()
            .filter(|(_, t)| t.in_use)
            .map(|(i, _)| i)
    }

    /// Handles das threads vivas
    pub fn ids(&self) -> impl Iterator<Item = ThreadId> + '_ {
        self.live_indices().map(move |i| self.id_at(i))
    }
}

impl LinkArena<QueueLink> for ThreadTable {
    #[inline]
    fn link(&self, index: usize) -> &Link {
        &self.threads[index].link
    }

    #[inline]
    fn link_mut(&mut self, index: usize) -> &mut Link {
        &mut self.threads[index].link
    }
}

impl LinkArena<TimeoutLink> for ThreadTable {
    #[inline]
    fn link(&self, index: usize) -> &Link {
        &self.threads[index].timeout_link
    }

    #[inline]
    fn link_mut(&mut self, index: usize) -> &mut Link {
        &mut self.threads[index].timeout_link
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sched::task::Priority;

    fn spec() -> ThreadSpec {
        ThreadSpec::new("t", Priority::new(0).unwrap())
    }

    #[test]
    fn insere_ate_encher() {
        let mut table = ThreadTable::with_capacity(2);
        let a = table.insert(&spec()).unwrap();
        let b = table.insert(&spec()).unwrap();
        assert_eq!((a.index(), b.index()), (0, 1));
        assert_eq!(table.insert(&spec()), Err(SchedError::ThreadTableFull));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn handle_obsoleto_rejeitado() {
        let mut table = ThreadTable::with_capacity(1);
        let old = table.insert(&spec()).unwrap();
        table.release(old).unwrap();
        assert_eq!(table.get(old).err(), Some(SchedError::NoSuchThread));

        // Mesmo slot, geração nova
        let new = table.insert(&spec()).unwrap();
        assert_eq!(new.index(), old.index());
        assert_ne!(new.generation(), old.generation());
        assert!(table.get(new).is_ok());
        assert_eq!(table.release(old), Err(SchedError::NoSuchThread));
    }

    #[test]
    fn ids_vivos() {
        let mut table = ThreadTable::with_capacity(4);
        let a = table.insert(&spec()).unwrap();
        let b = table.insert(&spec()).unwrap();
        let c = table.insert(&spec()).unwrap();
        table.release(b).unwrap();
        let ids: Vec<ThreadId> = table.ids().collect();
        assert_eq!(ids, vec![a, c]);
    }
}
