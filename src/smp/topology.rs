//! Topologia de CPUs (SMP)
//!
//! CPUs lógicas são numeradas de 0 a N-1. O escalonador não sabe nada de
//! APIC/Hart IDs; a plataforma traduz na hora de entregar a IPI.

use core::fmt;

/// Identificador lógico de CPU (0 a N-1)
pub type CpuId = u32;

/// Número máximo de CPUs suportadas (uma por bit de `CpuMask`).
pub const MAX_CPUS: usize = 32;

/// Conjunto de CPUs, um bit por CPU lógica.
///
/// Usado como afinidade de thread e como alvo de IPI direcionada.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CpuMask(u32);

impl CpuMask {
    pub const EMPTY: CpuMask = CpuMask(0);

    /// Todas as `MAX_CPUS` CPUs
    pub const ALL: CpuMask = CpuMask(u32::MAX);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Apenas `cpu`
    pub const fn single(cpu: CpuId) -> Self {
        if (cpu as usize) < MAX_CPUS {
            Self(1 << cpu)
        } else {
            Self(0)
        }
    }

    /// As primeiras `count` CPUs
    pub const fn first(count: usize) -> Self {
        if count >= MAX_CPUS {
            Self::ALL
        } else {
            Self((1u32 << count) - 1)
        }
    }

    #[inline]
    pub const fn contains(&self, cpu: CpuId) -> bool {
        (cpu as usize) < MAX_CPUS && (self.0 & (1 << cpu)) != 0
    }

    #[inline]
    pub fn insert(&mut self, cpu: CpuId) {
        self.0 |= Self::single(cpu).0;
    }

    #[inline]
    pub fn remove(&mut self, cpu: CpuId) {
        self.0 &= !Self::single(cpu).0;
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn count(&self) -> usize {
        self.0.count_ones() as usize
    }

    #[inline]
    pub const fn union(self, other: CpuMask) -> CpuMask {
        CpuMask(self.0 | other.0)
    }

    #[inline]
    pub const fn intersection(self, other: CpuMask) -> CpuMask {
        CpuMask(self.0 & other.0)
    }

    /// Itera as CPUs do conjunto em ordem crescente
    pub fn iter(&self) -> impl Iterator<Item = CpuId> {
        let bits = self.0;
        (0..MAX_CPUS as CpuId).filter(move |cpu| bits & (1 << cpu) != 0)
    }
}

impl fmt::Debug for CpuMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<CpuId> for CpuMask {
    fn from_iter<I: IntoIterator<Item = CpuId>>(iter: I) -> Self {
        let mut mask = CpuMask::EMPTY;
        for cpu in iter {
            mask.insert(cpu);
        }
        mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_remove_contains() {
        let mut m = CpuMask::EMPTY;
        m.insert(1);
        m.insert(2);
        assert!(m.contains(1) && m.contains(2));
        assert!(!m.contains(0));
        m.remove(1);
        assert_eq!(m, CpuMask::single(2));
        assert_eq!(m.count(), 1);
    }

    #[test]
    fn fora_do_limite_e_ignorado() {
        let mut m = CpuMask::EMPTY;
        m.insert(40);
        assert!(m.is_empty());
        assert!(!CpuMask::ALL.contains(32));
    }

    #[test]
    fn first_e_iter() {
        assert_eq!(CpuMask::first(4).bits(), 0b1111);
        assert_eq!(CpuMask::first(32), CpuMask::ALL);
        let v: Vec<CpuId> = CpuMask::from_iter([3, 0, 9]).iter().collect();
        assert_eq!(v, vec![0, 3, 9]);
    }
}
