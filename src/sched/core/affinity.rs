//! Afinidade de CPU
//!
//! A máscara só pode mudar enquanto a thread não está pronta (não iniciada,
//! pendente, suspensa ou dormindo). A fila de prontos nunca precisa ser
//! reordenada por isso.

use crate::sched::core::scheduler::Scheduler;
use crate::sched::error::{SchedError, SchedResult};
use crate::sched::task::ThreadId;
use crate::smp::ipi::IpiController;
use crate::smp::topology::{CpuId, CpuMask};

impl<I: IpiController> Scheduler<I> {
    pub fn cpu_mask_enable(&self, thread: ThreadId, cpu: CpuId) -> SchedResult<()> {
        self.check_cpu(cpu)?;
        self.modify_cpu_mask(thread, |mask| mask.union(CpuMask::single(cpu)))
    }

    pub fn cpu_mask_disable(&self, thread: ThreadId, cpu: CpuId) -> SchedResult<()> {
        self.check_cpu(cpu)?;
        self.modify_cpu_mask(thread, |mut mask| {
            mask.remove(cpu);
            mask
        })
    }

    /// Nenhuma CPU permitida: a thread não roda até ganhar alguma.
    pub fn cpu_mask_clear(&self, thread: ThreadId) -> SchedResult<()> {
        self.modify_cpu_mask(thread, |_| CpuMask::EMPTY)
    }

    pub fn cpu_mask_enable_all(&self, thread: ThreadId) -> SchedResult<()> {
        self.modify_cpu_mask(thread, |_| CpuMask::ALL)
    }

    /// Fixa a thread em uma única CPU
    pub fn cpu_pin(&self, thread: ThreadId, cpu: CpuId) -> SchedResult<()> {
        self.check_cpu(cpu)?;
        self.modify_cpu_mask(thread, |_| CpuMask::single(cpu))
    }

    fn check_cpu(&self, cpu: CpuId) -> SchedResult<()> {
        if (cpu as usize) < self.config.num_cpus {
            Ok(())
        } else {
            Err(SchedError::InvalidCpu)
        }
    }

    fn modify_cpu_mask(&self, thread: ThreadId, f: impl FnOnce(CpuMask) -> CpuMask) -> SchedResult<()> {
        self.with_lock(|s| {
            let t = s.threads.get_mut(thread)?;
            if t.is_idle {
                return Err(SchedError::ThreadIsIdle);
            }
            if t.state.is_ready() || t.running_on.is_some() {
                return Err(SchedError::ThreadRunnable);
            }
            t.cpu_mask = f(t.cpu_mask);
            crate::ktrace!("(Sched) afinidade=", t.cpu_mask.bits());
            Ok(())
        })
    }
}
