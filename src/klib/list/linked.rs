//! Lista duplamente encadeada por índices.
//!
//! Os nós (`Link`) moram dentro dos registros de uma arena; a lista guarda
//! apenas cabeça, cauda e tamanho. Inserção na cauda e remoção arbitrária são
//! O(1) e não alocam.
//!
//! Um mesmo registro pode ter vários nós (ex.: fila de prontos/espera e fila
//! de timeout). O parâmetro `Tag` escolhe qual nó uma lista usa, então uma
//! lista nunca mexe no nó de outra.

use core::fmt;
use core::marker::PhantomData;

/// Nó embutido no registro
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Link {
    pub prev: Option<usize>,
    pub next: Option<usize>,
}

impl Link {
    pub const fn new() -> Self {
        Self {
            prev: None,
            next: None,
        }
    }
}

/// Arena que expõe o nó `Tag` de cada registro
pub trait LinkArena<Tag> {
    fn link(&self, index: usize) -> &Link;
    fn link_mut(&mut self, index: usize) -> &mut Link;
}

pub struct IndexList<Tag> {
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
    _tag: PhantomData<Tag>,
}

impl<Tag> IndexList<Tag> {
    pub const fn new() -> Self {
        Self {
            head: None,
            tail: None,
            len: 0,
            _tag: PhantomData,
        }
    }

    #[inline]
    pub fn head(&self) -> Option<usize> {
        self.head
    }

    #[inline]
    pub fn tail(&self) -> Option<usize> {
        self.tail
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Anexa `index` na cauda. O nó deve estar solto.
    pub fn push_back<A: LinkArena<Tag> + ?Sized>(&mut self, arena: &mut A, index: usize) {
        debug_assert!(*arena.link(index) == Link::new());
        debug_assert!(self.head != Some(index));

        *arena.link_mut(index) = Link {
            prev: self.tail,
            next: None,
        };

        match self.tail {
            None => self.head = Some(index),
            Some(tail) => arena.link_mut(tail).next = Some(index),
        }

        self.tail = Some(index);
        self.len += 1;
    }

    /// Insere `index` antes de `at`, que pertence à lista.
    pub fn insert_before<A: LinkArena<Tag> + ?Sized>(
        &mut self,
        arena: &mut A,
        at: usize,
        index: usize,
    ) {
        debug_assert!(*arena.link(index) == Link::new());

        let prev = arena.link(at).prev;
        *arena.link_mut(index) = Link {
            prev,
            next: Some(at),
        };
        arena.link_mut(at).prev = Some(index);

        match prev {
            None => self.head = Some(index),
            Some(p) => arena.link_mut(p).next = Some(index),
        }

        self.len += 1;
    }

    /// Remove `index` da lista. O chamador garante que ele pertence a ela.
    pub fn remove<A: LinkArena<Tag> + ?Sized>(&mut self, arena: &mut A, index: usize) {
        let Link { prev, next } = *arena.link(index);

        match prev {
            None => {
                debug_assert_eq!(self.head, Some(index));
                self.head = next;
            }
            Some(p) => arena.link_mut(p).next = next,
        }

        match next {
            None => {
                debug_assert_eq!(self.tail, Some(index));
                self.tail = prev;
            }
            Some(n) => arena.link_mut(n).prev = prev,
        }

        *arena.link_mut(index) = Link::new();
        self.len -= 1;
    }

    pub fn pop_front<A: LinkArena<Tag> + ?Sized>(&mut self, arena: &mut A) -> Option<usize> {
        let head = self.head?;
        self.remove(arena, head);
        Some(head)
    }

    /// Itera do início ao fim
    pub fn iter<'a, A: LinkArena<Tag> + ?Sized>(&self, arena: &'a A) -> Iter<'a, A, Tag> {
        Iter {
            arena,
            next: self.head,
            _tag: PhantomData,
        }
    }
}

impl<Tag> Default for IndexList<Tag> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Tag> fmt::Debug for IndexList<Tag> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexList")
            .field("head", &self.head)
            .field("tail", &self.tail)
            .field("len", &self.len)
            .finish()
    }
}

pub struct Iter<'a, A: ?Sized, Tag> {
    arena: &'a A,
    next: Option<usize>,
    _tag: PhantomData<Tag>,
}

impl<'a, A: LinkArena<Tag> + ?Sized, Tag> Iterator for Iter<'a, A, Tag> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let cur = self.next?;
        self.next = self.arena.link(cur).next;
        Some(cur)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct T;
    struct Arena(Vec<Link>);

    impl LinkArena<T> for Arena {
        fn link(&self, index: usize) -> &Link {
            &self.0[index]
        }
        fn link_mut(&mut self, index: usize) -> &mut Link {
            &mut self.0[index]
        }
    }

    fn arena(n: usize) -> Arena {
        Arena(vec![Link::new(); n])
    }

    #[test]
    fn fifo() {
        let mut a = arena(4);
        let mut l: IndexList<T> = IndexList::new();
        l.push_back(&mut a, 2);
        l.push_back(&mut a, 0);
        l.push_back(&mut a, 3);

        assert_eq!(l.len(), 3);
        assert_eq!(l.iter(&a).collect::<Vec<_>>(), vec![2, 0, 3]);
        assert_eq!(l.pop_front(&mut a), Some(2));
        assert_eq!(l.head(), Some(0));
    }

    #[test]
    fn insert_before_cabeca_e_meio() {
        let mut a = arena(4);
        let mut l: IndexList<T> = IndexList::new();
        l.push_back(&mut a, 1);
        l.push_back(&mut a, 3);
        l.insert_before(&mut a, 1, 0);
        l.insert_before(&mut a, 3, 2);

        assert_eq!(l.len(), 4);
        assert_eq!(l.head(), Some(0));
        assert_eq!(l.tail(), Some(3));
        assert_eq!(l.iter(&a).collect::<Vec<_>>(), vec![0, 1, 2, 3]);

        l.remove(&mut a, 2);
        assert_eq!(l.iter(&a).collect::<Vec<_>>(), vec![0, 1, 3]);
    }

    #[test]
    fn remove_meio_cabeca_cauda() {
        let mut a = arena(5);
        let mut l: IndexList<T> = IndexList::new();
        for i in 0..5 {
            l.push_back(&mut a, i);
        }

        l.remove(&mut a, 2);
        l.remove(&mut a, 0);
        l.remove(&mut a, 4);

        assert_eq!(l.iter(&a).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(l.head(), Some(1));
        assert_eq!(l.tail(), Some(3));
        assert_eq!(a.0[2], Link::new());

        // Nó removido pode voltar
        l.push_back(&mut a, 2);
        assert_eq!(l.tail(), Some(2));
        assert_eq!(l.len(), 3);
    }

    #[test]
    fn esvaziar() {
        let mut a = arena(1);
        let mut l: IndexList<T> = IndexList::new();
        l.push_back(&mut a, 0);
        assert_eq!(l.pop_front(&mut a), Some(0));
        assert!(l.is_empty());
        assert_eq!(l.head(), None);
        assert_eq!(l.tail(), None);
        assert_eq!(l.pop_front(&mut a), None);
    }
}
