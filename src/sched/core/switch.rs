//! Seleção da próxima thread (next-up) e troca de corrente
//!
//! A plataforma chama `schedule(cpu)` nos pontos de escalonamento (saída de
//! interrupção, após bloquear, após `yield_now`). Se a corrente mudou, ela
//! recebe um `ContextSwitch` e troca o contexto de CPU de verdade.

use crate::sched::core::policy;
use crate::sched::core::scheduler::{SchedInner, Scheduler};
use crate::sched::error::SchedResult;
use crate::sched::task::ThreadId;
use crate::smp::ipi::IpiController;
use crate::smp::topology::CpuId;

/// Troca de corrente decidida por `schedule`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextSwitch {
    pub cpu: CpuId,
    pub from: ThreadId,
    pub to: ThreadId,
    /// A anterior saiu sem bloquear nem ceder a vez (preempção ou fatia)
    pub preempted: bool,
}

impl<I: IpiController> Scheduler<I> {
    /// Decide quem roda em `cpu` e atualiza a corrente.
    ///
    /// Retorna `None` se a corrente continua.
    pub fn schedule(&self, cpu: CpuId) -> SchedResult<Option<ContextSwitch>> {
        self.with_lock(|s| {
            let from = s.current_index(cpu)?;
            let next = self.next_up(s, cpu, from)?;

            let slot = s.cpu_mut(cpu)?;
            slot.need_resched = false;
            let yielded = core::mem::take(&mut slot.yielded);
            if next == from {
                return Ok(None);
            }

            Ok(Some(self.switch_to(s, cpu, from, next, yielded)))
        })
    }

    /// Escolhe a próxima thread de `cpu`.
    ///
    /// Candidata: a melhor pronta permitida nesta CPU, ou a idle. A corrente
    /// ainda executável fica se for mais urgente, se empatar sem ter cedido a
    /// vez, ou se não puder ser preemptada. Uma corrente deslocada volta para
    /// a cauda do seu nível.
    fn next_up(&self, s: &mut SchedInner, cpu: CpuId, current: usize) -> SchedResult<usize> {
        let idle = s.cpu(cpu)?.idle.map(|id| s.threads.index_of(id)).transpose()?;
        let swap_ok = s.cpu(cpu)?.swap_ok;

        let cur = s.threads.at(current);
        let queued = cur.is_queued();
        let active = cur.state.is_ready();

        let mut next = match s.ready.best_index_for(&s.threads, cpu).or(idle) {
            Some(index) => index,
            None => current,
        };

        if active && next != current {
            let cand = s.threads.at(next);
            let cur_wins = cur.priority.is_higher_than(cand.priority)
                || (cur.priority == cand.priority && !swap_ok);
            if cur_wins || !policy::should_preempt(cur, swap_ok) {
                next = current;
            }
        }

        let cur_is_idle = s.threads.at(current).is_idle;
        if next != current && active && !cur_is_idle && !queued {
            // Corrente deslocada: precisa sair de `running_on` antes de ir
            // para a fila, senão nenhuma outra CPU pode pegá-la
            s.threads.at_mut(current).running_on = None;
            let id = s.threads.id_at(current);
            s.ready.enqueue(&mut s.threads, id)?;
            self.flag_ipi_for(s, cpu, current);
        }

        s.ready.dequeue_at(&mut s.threads, next);
        s.cpu_mut(cpu)?.swap_ok = false;
        Ok(next)
    }

    fn switch_to(
        &self,
        s: &mut SchedInner,
        cpu: CpuId,
        from: usize,
        to: usize,
        yielded: bool,
    ) -> ContextSwitch {
        let now = s.now;

        let old = s.threads.at_mut(from);
        let preempted = old.state.is_ready() && !yielded;
        old.accounting.end_exec(now);
        old.accounting.account_switch(!preempted);
        let released = old.running_on == Some(cpu);
        if released {
            old.running_on = None;
        }
        // Já estava na fila (yield ou fatia): só agora outra CPU pode pegá-la
        let requeued = released && old.is_queued();
        let from_id = s.threads.id_at(from);

        let new = s.threads.at_mut(to);
        new.running_on = Some(cpu);
        new.owning_cpu = Some(cpu);
        new.accounting.start_exec(now);
        let slice = policy::slice_for(new, &s.slice);
        let to_id = s.threads.id_at(to);

        if let Some(slot) = s.cpus.get_mut(cpu) {
            slot.current = Some(to_id);
            slot.slice_left = slice;
        }
        if requeued {
            self.flag_ipi_for(s, cpu, from);
        }

        crate::ktrace!("(Sched) switch para tid=", to_id.as_u64());
        ContextSwitch {
            cpu,
            from: from_id,
            to: to_id,
            preempted,
        }
    }
}
