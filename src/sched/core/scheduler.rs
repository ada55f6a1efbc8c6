//! # Orquestrador de Agendamento
//!
//! Estrutura central: um único `IrqSpinlock` protege a arena de threads, a
//! fila de prontos, as wait queues, a fila de timeouts e o estado por CPU.
//!
//! ## Protocolo de cada operação pública
//! 1. Trava (interrupções locais desabilitadas).
//! 2. Muta filas/estados e reavalia a decisão da CPU local.
//! 3. Acumula em `IpiState` as CPUs remotas cuja decisão ficou obsoleta.
//! 4. Destrava e só então entrega as IPIs pendentes.
//!
//! Toda operação recebe explicitamente o `CpuId` de quem chama.

use crate::sched::config::SchedConfig;
use crate::sched::core::cpu::CpuSlot;
use crate::sched::core::policy::{self, SliceConfig};
use crate::sched::core::runqueue::ReadyQueue;
use crate::sched::core::sleep_queue::TimeoutQueue;
use crate::sched::error::{SchedError, SchedResult};
use crate::sched::sync::WaitQueueTable;
use crate::sched::task::{Priority, ThreadId, ThreadSpec, ThreadState, ThreadTable};
use crate::smp::ipi::{self, IpiController, IpiMode, IpiState, IpiStats, NoIpi, RemoteCpu};
use crate::smp::percpu::PerCpu;
use crate::smp::topology::{CpuId, CpuMask};
use crate::sync::IrqSpinlock;

/// Escalonador. `I` entrega as IPIs físicas.
pub struct Scheduler<I: IpiController = NoIpi> {
    pub(crate) config: SchedConfig,
    pub(crate) inner: IrqSpinlock<SchedInner>,
    pub(crate) ipi: IpiState,
    controller: I,
}

/// Estado protegido pelo lock do escalonador
pub(crate) struct SchedInner {
    pub(crate) threads: ThreadTable,
    pub(crate) ready: ReadyQueue,
    pub(crate) waits: WaitQueueTable,
    pub(crate) timeouts: TimeoutQueue,
    pub(crate) cpus: PerCpu<CpuSlot>,
    /// Relógio do escalonador (ticks)
    pub(crate) now: u64,
    pub(crate) slice: SliceConfig,
    pub(crate) ceiling: Priority,
}

impl Scheduler<NoIpi> {
    /// Escalonador sem entrega de IPI (single-core).
    pub fn single_core(config: SchedConfig) -> SchedResult<Self> {
        Self::new(config, NoIpi)
    }
}

impl<I: IpiController> Scheduler<I> {
    pub fn new(config: SchedConfig, controller: I) -> SchedResult<Self> {
        config.validate()?;

        let inner = SchedInner {
            threads: ThreadTable::with_capacity(config.max_threads),
            ready: ReadyQueue::new(),
            waits: WaitQueueTable::with_capacity(config.max_wait_queues),
            timeouts: TimeoutQueue::new(),
            cpus: PerCpu::new_with(config.num_cpus, CpuSlot::new),
            now: 0,
            slice: SliceConfig {
                ticks: config.time_slice_ticks,
                max_prio: config.time_slice_max_prio,
            },
            ceiling: config.priority_ceiling,
        };

        crate::kinfo!("(Sched) Inicializando scheduler. CPUs=", config.num_cpus);
        if config.ipi_mode == IpiMode::Broadcast && config.num_cpus > 1 {
            crate::kdebug!("(Sched) IPI em modo broadcast");
        }

        Ok(Self {
            config,
            inner: IrqSpinlock::new(inner),
            ipi: IpiState::new(config.ipi_mode),
            controller,
        })
    }

    #[inline]
    pub fn config(&self) -> &SchedConfig {
        &self.config
    }

    #[inline]
    pub fn controller(&self) -> &I {
        &self.controller
    }

    /// Executa `f` com o lock e entrega as IPIs acumuladas depois de soltá-lo.
    pub(crate) fn with_lock<R>(&self, f: impl FnOnce(&mut SchedInner) -> R) -> R {
        let result = {
            let mut guard = self.inner.lock();
            f(&mut *guard)
        };
        self.signal_pending_ipi();
        result
    }

    /// Registra a thread idle de `cpu` e marca a CPU como ativa.
    ///
    /// A idle tem `Priority::IDLE`, afinidade só com `cpu`, e nunca entra na
    /// fila de prontos. Chamar de novo devolve a mesma idle.
    pub fn start_cpu(&self, cpu: CpuId) -> SchedResult<ThreadId> {
        self.with_lock(|s| {
            let slot = s.cpu(cpu)?;
            if let Some(idle) = slot.idle {
                return Ok(idle);
            }

            let spec = ThreadSpec::new("idle", Priority::IDLE).with_cpu_mask(CpuMask::single(cpu));
            let id = s.threads.insert(&spec)?;
            let now = s.now;
            let thread = s.threads.get_mut(id)?;
            thread.is_idle = true;
            thread.state = ThreadState::READY;
            thread.running_on = Some(cpu);
            thread.owning_cpu = Some(cpu);
            thread.accounting.start_exec(now);

            let slot = s.cpu_mut(cpu)?;
            slot.idle = Some(id);
            slot.current = Some(id);
            slot.active = true;

            crate::kinfo!("(Sched) CPU ativa: ", cpu);
            Ok(id)
        })
    }

    /// Cria uma thread em `PRESTART` (não executável até `start`).
    pub fn create_thread(&self, spec: ThreadSpec) -> SchedResult<ThreadId> {
        self.with_lock(|s| {
            if !s.cpus.iter().any(|(cpu, _)| spec.cpu_mask.contains(cpu)) {
                return Err(SchedError::InvalidCpu);
            }
            let id = s.threads.insert(&spec)?;
            crate::ktrace!("(Sched) Thread criada tid=", id.as_u64());
            Ok(id)
        })
    }

    /// Decisão de preempção para `cpu` (sem efeitos colaterais).
    pub fn must_switch(&self, cpu: CpuId) -> SchedResult<bool> {
        let s = self.inner.lock();
        s.active_cpu(cpu)?;
        Ok(s.must_switch(cpu))
    }

    /// Há reavaliação pendente em `cpu`?
    pub fn need_resched(&self, cpu: CpuId) -> SchedResult<bool> {
        let s = self.inner.lock();
        Ok(s.cpu(cpu)?.need_resched)
    }

    /// Tratador da IPI de reschedule em `cpu`.
    ///
    /// Reavalia a decisão e registra `need_resched`. Idempotente; uma IPI
    /// obsoleta só conta como espúria. Retorna se a CPU deve trocar.
    pub fn ipi_handler(&self, cpu: CpuId) -> SchedResult<bool> {
        let effective = self.with_lock(|s| {
            s.active_cpu(cpu)?;
            let switch = s.must_switch(cpu);
            if switch {
                s.cpu_mut(cpu)?.need_resched = true;
            }
            Ok(switch)
        })?;

        self.ipi.record_receipt(effective);
        if !effective {
            crate::ktrace!("(IPI) espúria na cpu=", cpu);
        }
        Ok(effective)
    }

    /// Entrega as IPIs acumuladas. Chamado sem o lock.
    pub fn signal_pending_ipi(&self) -> CpuMask {
        self.ipi.signal(&self.controller)
    }

    /// IPIs acumuladas e ainda não entregues
    pub fn pending_ipi(&self) -> CpuMask {
        self.ipi.pending()
    }

    pub fn ipi_stats(&self) -> IpiStats {
        self.ipi.stats()
    }

    // =========================================================================
    // Auxiliares internos (lock preso)
    // =========================================================================

    /// Acumula IPIs para as CPUs que deveriam rodar a thread `index`.
    pub(crate) fn flag_ipi_for(&self, s: &SchedInner, local: CpuId, index: usize) {
        if s.cpus.len() < 2 {
            return;
        }
        let thread = s.threads.at(index);
        let views = s.remote_views();
        let mask = match self.ipi.mode() {
            IpiMode::Directed => {
                ipi::directed_targets(local, thread.priority, thread.cpu_mask, views)
            }
            IpiMode::Broadcast => ipi::broadcast_targets(local, views),
        };
        self.ipi.flag(mask);
    }

    /// Pede reavaliação em `target`: flag local ou IPI.
    pub(crate) fn resched_cpu(&self, s: &mut SchedInner, local: CpuId, target: CpuId) {
        if target == local {
            if let Some(slot) = s.cpus.get_mut(target) {
                slot.need_resched = true;
            }
        } else {
            self.ipi.flag(CpuMask::single(target));
        }
    }

    /// Devolve a thread à fila de prontos se nada mais a impede.
    ///
    /// Uma thread que ainda é a corrente de alguma CPU só recupera `READY`:
    /// ela continua lá e aquela CPU reavalia no próximo `schedule`.
    pub(crate) fn ready_thread(&self, s: &mut SchedInner, local: CpuId, index: usize) {
        let thread = s.threads.at_mut(index);
        if !thread.state.can_be_readied() || thread.is_queued() || thread.is_idle {
            return;
        }
        if thread.running_on.is_some() {
            thread.state.insert(ThreadState::READY);
            return;
        }

        let id = s.threads.id_at(index);
        if s.ready.enqueue(&mut s.threads, id).is_ok() {
            self.flag_ipi_for(s, local, index);
        }
    }

    /// Tira a thread de execução: sai da fila de prontos, perde `READY`, e a
    /// CPU onde ela roda precisa reavaliar.
    pub(crate) fn unready(&self, s: &mut SchedInner, local: CpuId, index: usize) {
        s.ready.dequeue_at(&mut s.threads, index);
        let thread = s.threads.at_mut(index);
        thread.state.remove(ThreadState::READY);
        if let Some(cpu) = thread.running_on {
            self.resched_cpu(s, local, cpu);
        }
    }

    /// Reavalia a decisão da CPU local depois de uma mutação.
    pub(crate) fn update_local(&self, s: &mut SchedInner, cpu: CpuId) {
        let active = s.cpus.get(cpu).map_or(false, |slot| slot.active);
        if active && s.must_switch(cpu) {
            if let Some(slot) = s.cpus.get_mut(cpu) {
                slot.need_resched = true;
            }
        }
    }
}

impl SchedInner {
    pub(crate) fn cpu(&self, cpu: CpuId) -> SchedResult<&CpuSlot> {
        self.cpus.get(cpu).ok_or(SchedError::InvalidCpu)
    }

    pub(crate) fn cpu_mut(&mut self, cpu: CpuId) -> SchedResult<&mut CpuSlot> {
        self.cpus.get_mut(cpu).ok_or(SchedError::InvalidCpu)
    }

    pub(crate) fn active_cpu(&self, cpu: CpuId) -> SchedResult<&CpuSlot> {
        let slot = self.cpu(cpu)?;
        if slot.active {
            Ok(slot)
        } else {
            Err(SchedError::CpuNotActive)
        }
    }

    /// Índice da thread corrente de uma CPU ativa
    pub(crate) fn current_index(&self, cpu: CpuId) -> SchedResult<usize> {
        let current = self
            .active_cpu(cpu)?
            .current
            .ok_or(SchedError::CpuNotActive)?;
        self.threads.index_of(current)
    }

    /// Visão das CPUs para o cálculo de alvos de IPI
    pub(crate) fn remote_views(&self) -> impl Iterator<Item = RemoteCpu> + '_ {
        self.cpus.iter().map(move |(id, slot)| RemoteCpu {
            id,
            active: slot.active,
            current: slot
                .current
                .and_then(|cur| self.threads.get(cur).ok())
                .map(|t| (t.priority, t.is_preemptible())),
        })
    }

    pub(crate) fn must_switch(&self, cpu: CpuId) -> bool {
        let Ok(index) = self.current_index(cpu) else {
            return false;
        };
        let current = self.threads.at(index);
        let swap_ok = self.cpus.get(cpu).map_or(false, |slot| slot.swap_ok);

        let best = self
            .ready
            .best_index_for(&self.threads, cpu)
            .filter(|&b| b != index)
            .map(|b| self.threads.at(b));

        policy::must_switch(current, best, swap_ok)
    }
}
