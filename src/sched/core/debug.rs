//! Ferramentas de Debug para o Scheduler
//!
//! Fotografias do estado (sem efeitos colaterais) e verificação de
//! invariantes das filas.

use alloc::vec::Vec;

use super::policy::SchedulingPolicy;
use super::scheduler::{SchedInner, Scheduler};
use crate::sched::error::{SchedError, SchedResult};
use crate::sched::sync::WaitQueueId;
use crate::sched::task::{Accounting, Priority, QueueSlot, ThreadId, ThreadState};
use crate::smp::ipi::IpiController;
use crate::smp::topology::{CpuId, CpuMask};

/// Fotografia de uma thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadInfo {
    pub id: ThreadId,
    pub name: &'static str,
    pub priority: Priority,
    pub base_priority: Priority,
    pub state: ThreadState,
    pub policy: SchedulingPolicy,
    pub lock_count: u32,
    pub owning_cpu: Option<CpuId>,
    pub running_on: Option<CpuId>,
    pub cpu_mask: CpuMask,
    pub slice_ticks: u32,
    pub is_idle: bool,
    /// A última espera terminou por timeout
    pub timed_out: bool,
    /// Na fila de prontos
    pub queued: bool,
    pub pended_on: Option<WaitQueueId>,
    pub wake_at: Option<u64>,
    /// Inclui o trecho em andamento se a thread está rodando
    pub accounting: Accounting,
}

impl<I: IpiController> Scheduler<I> {
    pub fn thread_info(&self, thread: ThreadId) -> SchedResult<ThreadInfo> {
        let s = self.inner.lock();
        let t = s.threads.get(thread)?;

        let mut accounting = t.accounting;
        if t.running_on.is_some() {
            accounting.total_ticks += s.now.saturating_sub(accounting.last_start);
        }

        Ok(ThreadInfo {
            id: thread,
            name: t.name,
            priority: t.priority,
            base_priority: t.base_priority,
            state: t.state,
            policy: SchedulingPolicy::of(t),
            lock_count: t.lock_count,
            owning_cpu: t.owning_cpu,
            running_on: t.running_on,
            cpu_mask: t.cpu_mask,
            slice_ticks: t.slice_ticks,
            is_idle: t.is_idle,
            timed_out: t.timed_out,
            queued: t.is_queued(),
            pended_on: t.pended_on(),
            wake_at: t.wake_at(),
            accounting,
        })
    }

    /// Corrente de `cpu`
    pub fn current(&self, cpu: CpuId) -> SchedResult<ThreadId> {
        let s = self.inner.lock();
        s.active_cpu(cpu)?.current.ok_or(SchedError::CpuNotActive)
    }

    pub fn ready_count(&self) -> usize {
        self.inner.lock().ready.len()
    }

    /// Fila de prontos em ordem de escolha
    pub fn ready_snapshot(&self) -> Vec<ThreadId> {
        let s = self.inner.lock();
        s.ready.iter(&s.threads).collect()
    }

    /// Melhor pronta permitida em `cpu` (sem retirar)
    pub fn peek_highest_for(&self, cpu: CpuId) -> SchedResult<Option<ThreadId>> {
        let s = self.inner.lock();
        s.cpu(cpu)?;
        Ok(s.ready.peek_highest_for(&s.threads, cpu))
    }

    /// Threads vivas
    pub fn thread_count(&self) -> usize {
        self.inner.lock().threads.len()
    }

    /// Verifica todas as invariantes das filas e das CPUs.
    pub fn check_consistency(&self) -> Result<(), &'static str> {
        let s = self.inner.lock();
        s.check_consistency()
    }

    /// Despeja o estado no log (nível TRACE)
    pub fn dump_tasks(&self) {
        let s = self.inner.lock();
        crate::ktrace!("--- (Sched) DUMP ---");
        for (cpu, slot) in s.cpus.iter() {
            if let Some(cur) = slot.current {
                crate::ktrace!("  cpu=", cpu);
                crate::ktrace!("    current tid=", cur.as_u64());
            }
        }
        crate::ktrace!("  READY count=", s.ready.len());
        for id in s.ready.iter(&s.threads) {
            crate::ktrace!("    -> tid=", id.as_u64());
        }
        crate::ktrace!("  TIMING count=", s.timeouts.len());
        crate::ktrace!("--- (Sched) FIM DO DUMP ---");
    }
}

impl SchedInner {
    pub(crate) fn check_consistency(&self) -> Result<(), &'static str> {
        self.ready.check_consistency(&self.threads)?;
        self.timeouts.check_consistency(&self.threads)?;
        self.waits.check_consistency(&self.threads)?;

        for index in self.threads.live_indices() {
            let t = self.threads.at(index);
            match t.slot {
                QueueSlot::Ready if !t.state.is_ready() => {
                    return Err("thread na fila de prontos sem READY");
                }
                QueueSlot::Wait(_) if !t.state.contains(ThreadState::PENDING) => {
                    return Err("thread em wait queue sem PENDING");
                }
                QueueSlot::None | QueueSlot::Ready if t.state.contains(ThreadState::PENDING) => {
                    return Err("thread PENDING fora de wait queue");
                }
                _ => {}
            }
            if t.is_idle && t.is_queued() {
                return Err("idle na fila de prontos");
            }
            if let Some(cpu) = t.running_on {
                let current = self.cpus.get(cpu).and_then(|slot| slot.current);
                if current != Some(self.threads.id_at(index)) {
                    return Err("running_on não confere com a corrente da CPU");
                }
            }
        }

        for (cpu, slot) in self.cpus.iter() {
            if !slot.active {
                continue;
            }
            let current = slot.current.ok_or("CPU ativa sem corrente")?;
            let t = self.threads.get(current).map_err(|_| "corrente inválida")?;
            if t.running_on != Some(cpu) {
                return Err("corrente sem running_on");
            }
        }
        Ok(())
    }
}
