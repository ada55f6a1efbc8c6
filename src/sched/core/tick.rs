//! Relógio do escalonador, timeouts e time slicing
//!
//! A fonte de tick da plataforma chama `announce_ticks` na CPU que recebeu a
//! interrupção do timer. As demais CPUs contam a própria fatia com
//! `slice_tick`.

use crate::sched::core::policy::{self, SliceConfig};
use crate::sched::core::scheduler::{SchedInner, Scheduler};
use crate::sched::error::SchedResult;
use crate::sched::task::{Priority, ThreadId, ThreadState};
use crate::smp::ipi::IpiController;
use crate::smp::topology::CpuId;

impl<I: IpiController> Scheduler<I> {
    /// Avança o relógio, expira timeouts vencidos e conta a fatia de `cpu`.
    ///
    /// Retorna quantas threads expiraram.
    pub fn announce_ticks(&self, cpu: CpuId, ticks: u64) -> SchedResult<usize> {
        self.with_lock(|s| {
            s.cpu(cpu)?;
            s.now = s.now.saturating_add(ticks);

            let mut expired = 0;
            while let Some(index) = s.timeouts.first_expired(&s.threads, s.now) {
                self.expire(s, cpu, index);
                expired += 1;
            }
            if expired > 0 {
                crate::ktrace!("(Sched) timeouts expirados=", expired);
            }

            self.count_slice(s, cpu, ticks);
            self.update_local(s, cpu);
            Ok(expired)
        })
    }

    /// Conta `ticks` na fatia da corrente de `cpu`, sem mexer no relógio.
    pub fn slice_tick(&self, cpu: CpuId, ticks: u64) -> SchedResult<()> {
        self.with_lock(|s| {
            s.active_cpu(cpu)?;
            self.count_slice(s, cpu, ticks);
            self.update_local(s, cpu);
            Ok(())
        })
    }

    /// O timeout de `thread` venceu.
    ///
    /// Mesma transição de um wake: sai da wait queue (marcando `timed_out`)
    /// e volta à fila de prontos. `false` se o timeout já não estava armado.
    pub fn on_timeout(&self, cpu: CpuId, thread: ThreadId) -> SchedResult<bool> {
        self.with_lock(|s| {
            s.cpu(cpu)?;
            let index = s.threads.index_of(thread)?;
            let fired = self.expire(s, cpu, index);
            self.update_local(s, cpu);
            Ok(fired)
        })
    }

    pub fn uptime_ticks(&self) -> u64 {
        self.inner.lock().now
    }

    /// Prazo absoluto mais próximo (para programar o timer em modo tickless)
    pub fn next_timeout(&self) -> Option<u64> {
        let s = self.inner.lock();
        s.timeouts.next_deadline(&s.threads)
    }

    /// Fatia global: `ticks` (0 desliga) para threads com prioridade até
    /// `max_prio`. Recarrega a fatia das correntes.
    pub fn set_time_slice(&self, ticks: u32, max_prio: Priority) {
        self.with_lock(|s| {
            s.slice = SliceConfig { ticks, max_prio };
            reload_slices(s);
        });
        crate::kdebug!("(Sched) fatia global=", ticks);
    }

    /// Fatia própria de `thread` (0 volta para a global)
    pub fn set_thread_time_slice(&self, thread: ThreadId, ticks: u32) -> SchedResult<()> {
        self.with_lock(|s| {
            s.threads.get_mut(thread)?.slice_ticks = ticks;
            reload_slices(s);
            Ok(())
        })
    }

    /// Núcleo de `on_timeout`
    fn expire(&self, s: &mut SchedInner, local: CpuId, index: usize) -> bool {
        if !s.timeouts.abort(&mut s.threads, index) {
            return false;
        }

        if s.waits.remove(&mut s.threads, index) {
            let t = s.threads.at_mut(index);
            t.state.remove(ThreadState::PENDING);
            t.timed_out = true;
        }
        self.ready_thread(s, local, index);
        true
    }

    /// Consome a fatia da corrente. Ao esgotar, ela vai para a cauda do seu
    /// nível e a CPU cede a vez.
    fn count_slice(&self, s: &mut SchedInner, cpu: CpuId, ticks: u64) {
        let Ok(index) = s.current_index(cpu) else {
            return;
        };
        let t = s.threads.at(index);
        if !policy::is_sliceable(t, &s.slice) {
            return;
        }
        let fresh = policy::slice_for(t, &s.slice);
        let ready = t.state.is_ready();

        let Some(slot) = s.cpus.get_mut(cpu) else {
            return;
        };
        let used = u32::try_from(ticks).unwrap_or(u32::MAX);
        if slot.slice_left > used {
            slot.slice_left -= used;
            return;
        }

        slot.slice_left = fresh;
        slot.swap_ok = true;
        slot.need_resched = true;

        if ready {
            let id = s.threads.id_at(index);
            // Só falha com handle inválido, e este acabou de ser validado
            let _ = s.ready.move_to_tail_of_own_priority(&mut s.threads, id);
        }
        crate::ktrace!("(Sched) fatia esgotada na cpu=", cpu);
    }
}

/// Recarrega a fatia de cada CPU ativa
fn reload_slices(s: &mut SchedInner) {
    let SchedInner {
        threads,
        cpus,
        slice,
        ..
    } = s;
    for (_, slot) in cpus.iter_mut() {
        if !slot.active {
            continue;
        }
        if let Some(t) = slot.current.and_then(|id| threads.get(id).ok()) {
            slot.slice_left = policy::slice_for(t, slice);
        }
    }
}
