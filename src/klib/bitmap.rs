//! Bitmap de prioridades
//!
//! Uma palavra de 64 bits, um bit por nível de prioridade. Bit 0 é o nível
//! mais urgente; `lowest()` devolve o nível mais prioritário não vazio em
//! O(1) via `trailing_zeros`.

/// Bitmap de níveis ocupados da fila de prontos
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PrioBitmap(u64);

impl PrioBitmap {
    /// Número máximo de níveis representáveis
    pub const BITS: usize = 64;

    pub const fn new() -> Self {
        Self(0)
    }

    /// Define um bit
    #[inline]
    pub fn set(&mut self, index: usize) {
        debug_assert!(index < Self::BITS);
        self.0 |= 1u64 << index;
    }

    /// Limpa um bit
    #[inline]
    pub fn clear(&mut self, index: usize) {
        debug_assert!(index < Self::BITS);
        self.0 &= !(1u64 << index);
    }

    /// Testa um bit
    #[inline]
    pub fn test(&self, index: usize) -> bool {
        debug_assert!(index < Self::BITS);
        (self.0 & (1u64 << index)) != 0
    }

    /// Índice do bit mais baixo definido (nível mais urgente)
    #[inline]
    pub fn lowest(&self) -> Option<usize> {
        if self.0 == 0 {
            None
        } else {
            Some(self.0.trailing_zeros() as usize)
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.0.count_ones() as usize
    }

    #[inline]
    pub fn bits(&self) -> u64 {
        self.0
    }

    /// Itera os bits definidos em ordem crescente
    pub fn iter(&self) -> SetBits {
        SetBits(self.0)
    }
}

/// Iterador sobre os bits definidos
pub struct SetBits(u64);

impl Iterator for SetBits {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.0 == 0 {
            return None;
        }
        let bit = self.0.trailing_zeros() as usize;
        // Remove o bit mais baixo
        self.0 &= self.0 - 1;
        Some(bit)
    }
}
