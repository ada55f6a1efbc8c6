//! Pend / unpend
//!
//! Interface usada pelas primitivas de sincronização. Uma thread pendente
//! sai da fila de prontos, ganha `PENDING` e entra na wait queue; com
//! `Timeout::Ticks` também entra na fila de timeouts.
//!
//! Acordar (unpend) e expirar (timeout) disputam a mesma thread: quem chega
//! primeiro vence, o outro vira no-op.

use alloc::vec::Vec;

use crate::sched::core::scheduler::{SchedInner, Scheduler};
use crate::sched::error::{SchedError, SchedResult};
use crate::sched::sync::{WaitQueue, WaitQueueId};
use crate::sched::task::{ThreadId, ThreadState, Timeout};
use crate::smp::ipi::IpiController;
use crate::smp::topology::CpuId;

impl<I: IpiController> Scheduler<I> {
    pub fn wait_queue_create(&self) -> SchedResult<WaitQueue> {
        self.with_lock(|s| s.waits.create())
    }

    /// Destrói a fila. Pendentes restantes são acordadas; retorna quantas.
    pub fn wait_queue_destroy(&self, cpu: CpuId, wq: WaitQueue) -> SchedResult<usize> {
        self.with_lock(|s| {
            s.cpu(cpu)?;
            let woken = self.unpend_all_locked(s, cpu, wq.id())?;
            s.waits.destroy(wq)?;
            self.update_local(s, cpu);
            if woken > 0 {
                crate::kwarn!("(WaitQ) destruída com pendentes=", woken);
            }
            Ok(woken)
        })
    }

    /// Pendura `thread` em `wq`.
    pub fn pend(
        &self,
        cpu: CpuId,
        thread: ThreadId,
        wq: &WaitQueue,
        timeout: Timeout,
    ) -> SchedResult<()> {
        if timeout.is_no_wait() {
            return Err(SchedError::WouldBlock);
        }
        self.with_lock(|s| {
            s.cpu(cpu)?;
            let index = s.threads.index_of(thread)?;
            self.pend_locked(s, cpu, index, wq.id(), timeout)
        })
    }

    /// Pendura a corrente de `cpu` em `wq`.
    pub fn pend_current(&self, cpu: CpuId, wq: &WaitQueue, timeout: Timeout) -> SchedResult<()> {
        if timeout.is_no_wait() {
            return Err(SchedError::WouldBlock);
        }
        self.with_lock(|s| {
            let index = s.current_index(cpu)?;
            self.pend_locked(s, cpu, index, wq.id(), timeout)
        })
    }

    /// Acorda a primeira pendente de `wq`.
    pub fn unpend_first(&self, cpu: CpuId, wq: &WaitQueue) -> SchedResult<Option<ThreadId>> {
        self.with_lock(|s| {
            s.cpu(cpu)?;
            let Some(index) = s.waits.pop_front(&mut s.threads, wq.id())? else {
                return Ok(None);
            };
            self.finish_unpend(s, cpu, index);
            self.update_local(s, cpu);
            Ok(Some(s.threads.id_at(index)))
        })
    }

    /// Tira `thread` da wait queue onde estiver.
    ///
    /// `false` se ela não estava pendente (corrida perdida para o timeout).
    pub fn unpend_thread(&self, cpu: CpuId, thread: ThreadId) -> SchedResult<bool> {
        self.with_lock(|s| {
            s.cpu(cpu)?;
            let index = s.threads.index_of(thread)?;
            if !s.waits.remove(&mut s.threads, index) {
                return Ok(false);
            }
            self.finish_unpend(s, cpu, index);
            self.update_local(s, cpu);
            Ok(true)
        })
    }

    /// Acorda todas as pendentes de `wq`
    pub fn unpend_all(&self, cpu: CpuId, wq: &WaitQueue) -> SchedResult<usize> {
        self.with_lock(|s| {
            s.cpu(cpu)?;
            let woken = self.unpend_all_locked(s, cpu, wq.id())?;
            self.update_local(s, cpu);
            Ok(woken)
        })
    }

    /// Pendentes de `wq` em ordem FIFO
    pub fn waiters(&self, wq: &WaitQueue) -> SchedResult<Vec<ThreadId>> {
        self.with_lock(|s| {
            let indices = s.waits.waiters(&s.threads, wq.id())?;
            Ok(indices.into_iter().map(|i| s.threads.id_at(i)).collect())
        })
    }

    fn pend_locked(
        &self,
        s: &mut SchedInner,
        cpu: CpuId,
        index: usize,
        wq: WaitQueueId,
        timeout: Timeout,
    ) -> SchedResult<()> {
        let t = s.threads.at(index);
        if t.is_idle {
            return Err(SchedError::ThreadIsIdle);
        }
        if !t.state.is_ready() {
            return Err(SchedError::NotRunnable);
        }
        // Valida o handle antes de mexer na thread
        s.waits.len(wq)?;

        self.unready(s, cpu, index);
        s.waits.append(&mut s.threads, wq, index)?;
        let t = s.threads.at_mut(index);
        t.state.insert(ThreadState::PENDING);
        t.timed_out = false;

        if let Timeout::Ticks(n) = timeout {
            let deadline = s.now.saturating_add(n);
            s.timeouts.add(&mut s.threads, index, deadline);
        }

        self.update_local(s, cpu);
        crate::ktrace!("(WaitQ) pend tid=", s.threads.id_at(index).as_u64());
        Ok(())
    }

    /// Conclui um unpend: desarma o timeout e devolve à fila de prontos.
    ///
    /// A thread já saiu da wait queue.
    fn finish_unpend(&self, s: &mut SchedInner, local: CpuId, index: usize) {
        s.timeouts.abort(&mut s.threads, index);
        s.threads.at_mut(index).state.remove(ThreadState::PENDING);
        self.ready_thread(s, local, index);
    }

    fn unpend_all_locked(&self, s: &mut SchedInner, local: CpuId, wq: WaitQueueId) -> SchedResult<usize> {
        let mut woken = 0;
        while let Some(index) = s.waits.pop_front(&mut s.threads, wq)? {
            self.finish_unpend(s, local, index);
            woken += 1;
        }
        Ok(woken)
    }
}

#[cfg(test)]
mod tests {
    use crate::sched::config::SchedConfig;
    use crate::sched::core::Scheduler;
    use crate::sched::error::SchedError;
    use crate::sched::task::{Priority, ThreadSpec, ThreadState, Timeout};

    fn sched() -> Scheduler {
        let s = Scheduler::single_core(SchedConfig::new()).unwrap();
        s.start_cpu(0).unwrap();
        s
    }

    fn spec(p: i32) -> ThreadSpec {
        ThreadSpec::new("t", Priority::new(p).unwrap())
    }

    #[test]
    fn pend_e_unpend_fifo() {
        let s = sched();
        let wq = s.wait_queue_create().unwrap();
        let a = s.spawn(0, spec(3)).unwrap();
        let b = s.spawn(0, spec(1)).unwrap();

        s.pend(0, a, &wq, Timeout::Forever).unwrap();
        s.pend(0, b, &wq, Timeout::Forever).unwrap();
        assert_eq!(s.ready_count(), 0);
        assert_eq!(s.waiters(&wq), Ok(vec![a, b]));
        assert!(s.thread_info(a).unwrap().state.contains(ThreadState::PENDING));
        s.check_consistency().unwrap();

        // FIFO, não por prioridade
        assert_eq!(s.unpend_first(0, &wq), Ok(Some(a)));
        assert!(s.thread_info(a).unwrap().queued);
        assert_eq!(s.unpend_all(0, &wq), Ok(1));
        assert_eq!(s.unpend_first(0, &wq), Ok(None));
        s.check_consistency().unwrap();
    }

    #[test]
    fn pend_no_wait_rejeitado() {
        let s = sched();
        let wq = s.wait_queue_create().unwrap();
        let a = s.spawn(0, spec(3)).unwrap();
        assert_eq!(s.pend(0, a, &wq, Timeout::NoWait), Err(SchedError::WouldBlock));
        assert_eq!(s.pend(0, a, &wq, Timeout::Ticks(0)), Err(SchedError::WouldBlock));
    }

    #[test]
    fn pend_exige_thread_pronta() {
        let s = sched();
        let wq = s.wait_queue_create().unwrap();
        let a = s.create_thread(spec(3)).unwrap();
        assert_eq!(s.pend(0, a, &wq, Timeout::Forever), Err(SchedError::NotRunnable));

        s.start(0, a).unwrap();
        s.pend(0, a, &wq, Timeout::Forever).unwrap();
        assert_eq!(s.pend(0, a, &wq, Timeout::Forever), Err(SchedError::NotRunnable));
    }

    #[test]
    fn pend_com_timeout_expira() {
        let s = sched();
        let wq = s.wait_queue_create().unwrap();
        let a = s.spawn(0, spec(3)).unwrap();
        s.pend(0, a, &wq, Timeout::Ticks(4)).unwrap();
        assert_eq!(s.thread_info(a).unwrap().wake_at, Some(4));

        assert_eq!(s.announce_ticks(0, 3), Ok(0));
        assert_eq!(s.announce_ticks(0, 1), Ok(1));

        let info = s.thread_info(a).unwrap();
        assert!(info.timed_out);
        assert!(info.queued);
        assert_eq!(info.pended_on, None);
        assert_eq!(s.waiters(&wq), Ok(vec![]));
        assert_eq!(s.unpend_thread(0, a), Ok(false));
    }

    #[test]
    fn unpend_desarma_timeout() {
        let s = sched();
        let wq = s.wait_queue_create().unwrap();
        let a = s.spawn(0, spec(3)).unwrap();
        s.pend(0, a, &wq, Timeout::Ticks(4)).unwrap();

        assert_eq!(s.unpend_thread(0, a), Ok(true));
        let info = s.thread_info(a).unwrap();
        assert_eq!(info.wake_at, None);
        assert!(!info.timed_out);
        assert_eq!(s.on_timeout(0, a), Ok(false));
    }

    #[test]
    fn pend_current_troca_de_thread() {
        let s = sched();
        let wq = s.wait_queue_create().unwrap();
        let a = s.spawn(0, spec(3)).unwrap();
        s.schedule(0).unwrap();
        assert_eq!(s.current(0), Ok(a));

        s.pend_current(0, &wq, Timeout::Forever).unwrap();
        assert!(s.need_resched(0).unwrap());
        let sw = s.schedule(0).unwrap().unwrap();
        assert_eq!(sw.from, a);
        assert!(!sw.preempted);
    }

    #[test]
    fn destroy_acorda_pendentes() {
        let s = sched();
        let wq = s.wait_queue_create().unwrap();
        let a = s.spawn(0, spec(3)).unwrap();
        s.pend(0, a, &wq, Timeout::Forever).unwrap();

        assert_eq!(s.wait_queue_destroy(0, wq), Ok(1));
        assert!(s.thread_info(a).unwrap().queued);
        s.check_consistency().unwrap();
    }

    #[test]
    fn suspensa_continua_fora_da_fila_apos_unpend() {
        let s = sched();
        let wq = s.wait_queue_create().unwrap();
        let a = s.spawn(0, spec(3)).unwrap();
        s.pend(0, a, &wq, Timeout::Forever).unwrap();
        s.suspend(0, a).unwrap();

        assert_eq!(s.unpend_first(0, &wq), Ok(Some(a)));
        assert!(!s.thread_info(a).unwrap().queued);
        s.resume(0, a).unwrap();
        assert!(s.thread_info(a).unwrap().queued);
    }
}
