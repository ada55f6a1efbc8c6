//! Ciclo de vida das threads
//!
//! `PRESTART → READY ⇄ {PENDING, SUSPENDED, TIMING} → DEAD`

use crate::sched::core::scheduler::Scheduler;
use crate::sched::error::{SchedError, SchedResult};
use crate::sched::task::{ThreadId, ThreadSpec, ThreadState, Timeout};
use crate::smp::ipi::IpiController;
use crate::smp::topology::CpuId;

impl<I: IpiController> Scheduler<I> {
    /// Torna executável uma thread criada. No-op se já iniciada.
    pub fn start(&self, cpu: CpuId, thread: ThreadId) -> SchedResult<()> {
        self.with_lock(|s| {
            s.cpu(cpu)?;
            let index = s.threads.index_of(thread)?;
            let t = s.threads.at_mut(index);
            if t.state.contains(ThreadState::DEAD) {
                return Err(SchedError::Dead);
            }
            if !t.state.contains(ThreadState::PRESTART) {
                return Ok(());
            }
            t.state.remove(ThreadState::PRESTART);

            self.ready_thread(s, cpu, index);
            self.update_local(s, cpu);
            crate::ktrace!("(Sched) start tid=", thread.as_u64());
            Ok(())
        })
    }

    /// `create_thread` + `start`
    pub fn spawn(&self, cpu: CpuId, spec: ThreadSpec) -> SchedResult<ThreadId> {
        let id = self.create_thread(spec)?;
        self.start(cpu, id)?;
        Ok(id)
    }

    /// A corrente cede a vez às threads de mesma prioridade.
    ///
    /// Vai para a cauda do seu nível; o próximo `schedule` decide.
    pub fn yield_now(&self, cpu: CpuId) -> SchedResult<()> {
        self.with_lock(|s| {
            let index = s.current_index(cpu)?;
            let t = s.threads.at(index);
            if !t.is_idle && t.state.is_ready() {
                let id = s.threads.id_at(index);
                s.ready.move_to_tail_of_own_priority(&mut s.threads, id)?;
            }

            let slot = s.cpu_mut(cpu)?;
            slot.swap_ok = true;
            slot.yielded = true;
            slot.need_resched = true;
            crate::ktrace!("(Sched) yield na cpu=", cpu);
            Ok(())
        })
    }

    /// Coloca a corrente para dormir.
    ///
    /// `NoWait` equivale a `yield_now`; `Forever` suspende a thread.
    pub fn sleep(&self, cpu: CpuId, timeout: Timeout) -> SchedResult<()> {
        let ticks = match timeout {
            Timeout::NoWait | Timeout::Ticks(0) => return self.yield_now(cpu),
            Timeout::Forever => {
                let current = self.current(cpu)?;
                return self.suspend(cpu, current);
            }
            Timeout::Ticks(n) => n,
        };

        self.with_lock(|s| {
            let index = s.current_index(cpu)?;
            let t = s.threads.at(index);
            if t.is_idle {
                return Err(SchedError::ThreadIsIdle);
            }
            if !t.state.is_ready() {
                return Err(SchedError::NotRunnable);
            }

            self.unready(s, cpu, index);
            let deadline = s.now.saturating_add(ticks);
            s.timeouts.add(&mut s.threads, index, deadline);
            crate::ktrace!("(Sched) sleep até tick=", deadline);
            Ok(())
        })
    }

    /// Acorda uma thread dormindo antes do prazo.
    ///
    /// Retorna `false` se ela não estava dormindo.
    pub fn wakeup(&self, cpu: CpuId, thread: ThreadId) -> SchedResult<bool> {
        self.with_lock(|s| {
            s.cpu(cpu)?;
            let index = s.threads.index_of(thread)?;
            if !s.threads.at(index).state.is_sleeping() {
                return Ok(false);
            }

            s.timeouts.abort(&mut s.threads, index);
            self.ready_thread(s, cpu, index);
            self.update_local(s, cpu);
            Ok(true)
        })
    }

    /// Suspende a thread. Cancela um sleep em andamento; uma espera com
    /// timeout continua armada.
    pub fn suspend(&self, cpu: CpuId, thread: ThreadId) -> SchedResult<()> {
        self.with_lock(|s| {
            s.cpu(cpu)?;
            let index = s.threads.index_of(thread)?;
            let t = s.threads.at(index);
            if t.is_idle {
                return Err(SchedError::ThreadIsIdle);
            }
            if t.state.contains(ThreadState::DEAD) {
                return Err(SchedError::Dead);
            }
            if t.state.contains(ThreadState::SUSPENDED) {
                return Ok(());
            }

            if t.state.is_sleeping() {
                s.timeouts.abort(&mut s.threads, index);
            }
            s.threads.at_mut(index).state.insert(ThreadState::SUSPENDED);
            self.unready(s, cpu, index);
            self.update_local(s, cpu);

            crate::kdebug!("(Sched) suspend tid=", thread.as_u64());
            Ok(())
        })
    }

    /// Retoma uma thread suspensa. No-op se não estava suspensa.
    pub fn resume(&self, cpu: CpuId, thread: ThreadId) -> SchedResult<()> {
        self.with_lock(|s| {
            s.cpu(cpu)?;
            let index = s.threads.index_of(thread)?;
            let t = s.threads.at_mut(index);
            if !t.state.contains(ThreadState::SUSPENDED) {
                return Ok(());
            }
            t.state.remove(ThreadState::SUSPENDED);

            self.ready_thread(s, cpu, index);
            self.update_local(s, cpu);
            Ok(())
        })
    }

    /// Termina a thread: sai de todas as filas e vira `DEAD`.
    ///
    /// Se ela está rodando em alguma CPU, aquela CPU é avisada.
    pub fn abort(&self, cpu: CpuId, thread: ThreadId) -> SchedResult<()> {
        self.with_lock(|s| {
            s.cpu(cpu)?;
            let index = s.threads.index_of(thread)?;
            let t = s.threads.at(index);
            if t.is_idle {
                return Err(SchedError::ThreadIsIdle);
            }
            if t.state.contains(ThreadState::DEAD) {
                return Ok(());
            }

            s.ready.dequeue_at(&mut s.threads, index);
            s.waits.remove(&mut s.threads, index);
            s.timeouts.abort(&mut s.threads, index);

            let t = s.threads.at_mut(index);
            t.state = ThreadState::DEAD;
            if let Some(running) = t.running_on {
                self.resched_cpu(s, cpu, running);
            }
            self.update_local(s, cpu);

            crate::kdebug!("(Sched) abort tid=", thread.as_u64());
            Ok(())
        })
    }

    /// Libera o slot de uma thread `DEAD` que já saiu da CPU.
    ///
    /// Handles antigos passam a falhar com `NoSuchThread`.
    pub fn reap(&self, thread: ThreadId) -> SchedResult<()> {
        self.with_lock(|s| {
            let t = s.threads.get(thread)?;
            if !t.state.contains(ThreadState::DEAD) {
                return Err(SchedError::NotDead);
            }
            if t.running_on.is_some() {
                return Err(SchedError::ThreadRunnable);
            }
            s.threads.release(thread)
        })
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
    fn start_e_idempotente() {
        let s = sched();
        let t = s.create_thread(spec(3)).unwrap();
        assert_eq!(s.thread_info(t).unwrap().state, ThreadState::PRESTART);
        s.start(0, t).unwrap();
        s.start(0, t).unwrap();
        assert_eq!(s.ready_count(), 1);
        assert!(s.need_resched(0).unwrap());
    }

    #[test]
    fn sleep_e_wakeup() {
        let s = sched();
        let t = s.spawn(0, spec(1)).unwrap();
        s.schedule(0).unwrap();
        assert_eq!(s.current(0), Ok(t));

        s.sleep(0, Timeout::Ticks(5)).unwrap();
        let info = s.thread_info(t).unwrap();
        assert!(info.state.is_sleeping());
        assert_eq!(info.wake_at, Some(5));

        // Sai da CPU para a idle
        let sw = s.schedule(0).unwrap().unwrap();
        assert_eq!(sw.from, t);
        assert!(!sw.preempted);

        assert_eq!(s.wakeup(0, t), Ok(true));
        assert_eq!(s.wakeup(0, t), Ok(false));
        assert!(s.thread_info(t).unwrap().queued);
        s.check_consistency().unwrap();
    }

    #[test]
    fn suspend_resume() {
        let s = sched();
        let t = s.spawn(0, spec(2)).unwrap();
        s.suspend(0, t).unwrap();
        assert_eq!(s.ready_count(), 0);
        assert!(s.thread_info(t).unwrap().state.contains(ThreadState::SUSPENDED));

        s.resume(0, t).unwrap();
        assert_eq!(s.ready_count(), 1);
        s.check_consistency().unwrap();
    }

    #[test]
    fn suspend_cancela_sleep() {
        let s = sched();
        let t = s.spawn(0, spec(2)).unwrap();
        s.schedule(0).unwrap();
        s.sleep(0, Timeout::Ticks(10)).unwrap();
        s.suspend(0, t).unwrap();
        assert_eq!(s.thread_info(t).unwrap().wake_at, None);

        s.resume(0, t).unwrap();
        assert!(s.thread_info(t).unwrap().state.contains(ThreadState::READY));
    }

    #[test]
    fn abort_e_reap() {
        let s = sched();
        let t = s.spawn(0, spec(4)).unwrap();
        s.schedule(0).unwrap();

        s.abort(0, t).unwrap();
        assert_eq!(s.reap(t), Err(SchedError::ThreadRunnable));
        assert!(s.need_resched(0).unwrap());

        s.schedule(0).unwrap();
        s.reap(t).unwrap();
        assert_eq!(s.thread_info(t).err(), Some(SchedError::NoSuchThread));
    }

    #[test]
    fn reap_exige_dead() {
        let s = sched();
        let t = s.spawn(0, spec(4)).unwrap();
        assert_eq!(s.reap(t), Err(SchedError::NotDead));
    }

    #[test]
    fn idle_protegida() {
        let s = sched();
        let idle = s.current(0).unwrap();
        assert_eq!(s.suspend(0, idle), Err(SchedError::ThreadIsIdle));
        assert_eq!(s.abort(0, idle), Err(SchedError::ThreadIsIdle));
        assert_eq!(s.sleep(0, Timeout::Ticks(3)), Err(SchedError::ThreadIsIdle));
    }

    #[test]
    fn sleep_no_wait_cede_a_vez() {
        let s = sched();
        let a = s.spawn(0, spec(5)).unwrap();
        let b = s.spawn(0, spec(5)).unwrap();
        s.schedule(0).unwrap();
        assert_eq!(s.current(0), Ok(a));

        s.sleep(0, Timeout::NoWait).unwrap();
        let sw = s.schedule(0).unwrap().unwrap();
        assert_eq!((sw.from, sw.to), (a, b));
    }
}
