//! Prioridade e trava de preempção
//!
//! `set_priority` muda a prioridade base; `inherit_priority` e
//! `restore_priority` são o apoio para mutexes com herança de prioridade e
//! mexem só na prioridade efetiva.

use crate::sched::core::scheduler::{SchedInner, Scheduler};
use crate::sched::error::{SchedError, SchedResult};
use crate::sched::task::{inherited_priority, Priority, ThreadId, ThreadState};
use crate::smp::ipi::IpiController;
use crate::smp::topology::{CpuId, CpuMask};

impl<I: IpiController> Scheduler<I> {
    /// Define a prioridade (base e efetiva) de `thread`.
    ///
    /// Uma thread na fila vai para a cauda do novo nível. Retorna `true` se a
    /// thread estava pronta e a decisão foi reavaliada.
    pub fn set_priority(&self, cpu: CpuId, thread: ThreadId, prio: Priority) -> SchedResult<bool> {
        self.with_lock(|s| {
            s.cpu(cpu)?;
            let index = s.threads.index_of(thread)?;
            let t = s.threads.at_mut(index);
            if t.is_idle {
                return Err(SchedError::ThreadIsIdle);
            }
            if t.state.contains(ThreadState::DEAD) {
                return Err(SchedError::Dead);
            }
            t.base_priority = prio;
            crate::ktrace!("(Sched) set_priority tid=", thread.as_u64());
            self.change_priority(s, cpu, index, prio)
        })
    }

    /// Eleva `owner` por causa de uma espera de prioridade `waiter`.
    ///
    /// A nova prioridade é limitada pelo teto configurado. Retorna `true` se
    /// ela mudou.
    pub fn inherit_priority(&self, cpu: CpuId, owner: ThreadId, waiter: Priority) -> SchedResult<bool> {
        self.with_lock(|s| {
            s.cpu(cpu)?;
            let index = s.threads.index_of(owner)?;
            let t = s.threads.at(index);
            if t.is_idle {
                return Err(SchedError::ThreadIsIdle);
            }
            if t.state.contains(ThreadState::DEAD) {
                return Err(SchedError::Dead);
            }

            let new = inherited_priority(t.priority, waiter, s.ceiling);
            if new == t.priority {
                return Ok(false);
            }
            crate::kdebug!("(Sched) herança: nova prioridade nível=", new.level());
            self.change_priority(s, cpu, index, new)?;
            Ok(true)
        })
    }

    /// Devolve `owner` à prioridade base. Retorna `true` se ela mudou.
    pub fn restore_priority(&self, cpu: CpuId, owner: ThreadId) -> SchedResult<bool> {
        self.with_lock(|s| {
            s.cpu(cpu)?;
            let index = s.threads.index_of(owner)?;
            let t = s.threads.at(index);
            if t.state.contains(ThreadState::DEAD) {
                return Err(SchedError::Dead);
            }
            let base = t.base_priority;
            if base == t.priority {
                return Ok(false);
            }
            self.change_priority(s, cpu, index, base)?;
            Ok(true)
        })
    }

    /// Desabilita a preempção da corrente de `cpu` (aninhável).
    pub fn sched_lock(&self, cpu: CpuId) -> SchedResult<()> {
        self.with_lock(|s| {
            let index = s.current_index(cpu)?;
            let t = s.threads.at_mut(index);
            if t.is_idle {
                return Err(SchedError::ThreadIsIdle);
            }
            t.lock_count = t.lock_count.saturating_add(1);
            Ok(())
        })
    }

    /// Desfaz um `sched_lock`. Ao zerar, reavalia a preempção.
    pub fn sched_unlock(&self, cpu: CpuId) -> SchedResult<()> {
        self.with_lock(|s| {
            let index = s.current_index(cpu)?;
            let t = s.threads.at_mut(index);
            if t.lock_count == 0 {
                crate::kwarn!("(Sched) sched_unlock sem lock na cpu=", cpu);
                return Err(SchedError::LockUnbalanced);
            }
            t.lock_count -= 1;
            if t.lock_count == 0 {
                self.update_local(s, cpu);
            }
            Ok(())
        })
    }

    /// A corrente de `cpu` pode ser preemptada?
    pub fn is_preempt_thread(&self, cpu: CpuId) -> SchedResult<bool> {
        let s = self.inner.lock();
        let index = s.current_index(cpu)?;
        Ok(s.threads.at(index).is_preemptible())
    }

    /// Aplica `prio` como prioridade efetiva.
    ///
    /// - na fila: sai e volta na cauda do novo nível; se subiu, outras CPUs
    ///   podem ter ficado obsoletas;
    /// - rodando noutra CPU e caiu: aquela CPU reavalia;
    /// - bloqueada: só o campo muda.
    fn change_priority(
        &self,
        s: &mut SchedInner,
        local: CpuId,
        index: usize,
        prio: Priority,
    ) -> SchedResult<bool> {
        let t = s.threads.at_mut(index);
        let old = t.priority;
        if !t.state.is_ready() {
            t.priority = prio;
            return Ok(false);
        }

        if t.is_queued() {
            let id = s.threads.id_at(index);
            s.ready.dequeue_at(&mut s.threads, index);
            s.threads.at_mut(index).priority = prio;
            s.ready.enqueue(&mut s.threads, id)?;
            if prio.is_higher_than(old) {
                self.flag_ipi_for(s, local, index);
            }
        } else {
            t.priority = prio;
            if let Some(running) = t.running_on {
                if running != local && old.is_higher_than(prio) {
                    self.ipi.flag(CpuMask::single(running));
                }
            }
        }

        if let Ok(slot) = s.cpu_mut(local) {
            if slot.active {
                slot.swap_ok = true;
            }
        }
        self.update_local(s, local);
        Ok(true)
    }
}
