//! Variáveis Per-CPU
//!
//! Abordagem baseada em array: um slot por CPU lógica, indexado
//! explicitamente pelo `CpuId` de quem chama. Não há "CPU atual" implícita:
//! o escalonador recebe o id em cada operação e guarda o `PerCpu` dentro do
//! seu lock, então nenhum `UnsafeCell` é necessário.

use alloc::vec::Vec;

use super::topology::{CpuId, MAX_CPUS};

/// Estado replicado por CPU.
pub struct PerCpu<T> {
    data: Vec<T>,
}

impl<T> PerCpu<T> {
    /// Cria `count` slots, inicializando cada um com `init(cpu)`.
    ///
    /// `count` é limitado a `MAX_CPUS`.
    pub fn new_with(count: usize, mut init: impl FnMut(CpuId) -> T) -> Self {
        let count = count.min(MAX_CPUS);
        let mut data = Vec::with_capacity(count);
        for cpu in 0..count {
            data.push(init(cpu as CpuId));
        }
        Self { data }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Acesso a uma CPU específica
    #[inline]
    pub fn get(&self, cpu: CpuId) -> Option<&T> {
        self.data.get(cpu as usize)
    }

    #[inline]
    pub fn get_mut(&mut self, cpu: CpuId) -> Option<&mut T> {
        self.data.get_mut(cpu as usize)
    }

    /// Itera `(cpu, slot)`
    pub fn iter(&self) -> impl Iterator<Item = (CpuId, &T)> {
        self.data
            .iter()
            .enumerate()
            .map(|(i, slot)| (i as CpuId, slot))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (CpuId, &mut T)> {
        self.data
            .iter_mut()
            .enumerate()
            .map(|(i, slot)| (i as CpuId, slot))
    }
}
