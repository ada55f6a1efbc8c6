//! Configuração do Scheduler
//!
//! Constantes de build + `SchedConfig` (parâmetros de runtime validados na
//! criação do escalonador).

use crate::klib::bitmap::PrioBitmap;
use crate::sched::error::{SchedError, SchedResult};
use crate::sched::task::Priority;
use crate::smp::ipi::IpiMode;
use crate::smp::topology::MAX_CPUS;

/// Níveis cooperativos (prioridades negativas)
pub const NUM_COOP_PRIORITIES: usize = 16;

/// Níveis preemptivos (prioridades 0..N-1)
pub const NUM_PREEMPT_PRIORITIES: usize = 15;

/// Total de níveis, incluindo o nível idle
pub const PRIO_LEVELS: usize = NUM_COOP_PRIORITIES + NUM_PREEMPT_PRIORITIES + 1;

// Um bit por nível na palavra do bitmap
const _: () = assert!(PRIO_LEVELS <= PrioBitmap::BITS);

/// Capacidade padrão da arena de threads (idle incluídas)
pub const DEFAULT_MAX_THREADS: usize = 64;

/// Capacidade padrão da tabela de wait queues
pub const MAX_WAIT_QUEUES: usize = 64;

/// Fatia de tempo padrão em ticks (0 desliga o time slicing global)
pub const DEFAULT_TIME_SLICE_TICKS: u32 = 10;

/// Prioridade mais urgente ainda sujeita a time slicing
pub const DEFAULT_TIME_SLICE_MAX_PRIO: i32 = 0;

/// Parâmetros de runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedConfig {
    /// CPUs lógicas (1..=MAX_CPUS)
    pub num_cpus: usize,
    /// Capacidade da arena de threads
    pub max_threads: usize,
    /// Capacidade da tabela de wait queues
    pub max_wait_queues: usize,
    /// Estratégia de alvos de IPI
    pub ipi_mode: IpiMode,
    /// Fatia global em ticks; 0 = sem time slicing global
    pub time_slice_ticks: u32,
    /// Threads mais prioritárias que isto não sofrem slicing global
    pub time_slice_max_prio: Priority,
    /// Teto aplicado à herança de prioridade
    pub priority_ceiling: Priority,
}

impl SchedConfig {
    /// Single-core, capacidades padrão.
    pub const fn new() -> Self {
        Self {
            num_cpus: 1,
            max_threads: DEFAULT_MAX_THREADS,
            max_wait_queues: MAX_WAIT_QUEUES,
            ipi_mode: IpiMode::default_for_build(),
            time_slice_ticks: DEFAULT_TIME_SLICE_TICKS,
            time_slice_max_prio: Priority::from_raw(DEFAULT_TIME_SLICE_MAX_PRIO),
            priority_ceiling: Priority::HIGHEST,
        }
    }

    pub const fn with_cpus(mut self, num_cpus: usize) -> Self {
        self.num_cpus = num_cpus;
        self
    }

    pub const fn with_max_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = max_threads;
        self
    }

    pub const fn with_max_wait_queues(mut self, max_wait_queues: usize) -> Self {
        self.max_wait_queues = max_wait_queues;
        self
    }

    pub const fn with_ipi_mode(mut self, mode: IpiMode) -> Self {
        self.ipi_mode = mode;
        self
    }

    pub const fn with_time_slice(mut self, ticks: u32, max_prio: Priority) -> Self {
        self.time_slice_ticks = ticks;
        self.time_slice_max_prio = max_prio;
        self
    }

    pub const fn with_priority_ceiling(mut self, ceiling: Priority) -> Self {
        self.priority_ceiling = ceiling;
        self
    }

    /// Valida a configuração.
    ///
    /// Cada CPU precisa de uma thread idle na arena, então a arena deve
    /// comportar pelo menos `num_cpus + 1` threads.
    pub fn validate(&self) -> SchedResult<()> {
        if self.num_cpus == 0 || self.num_cpus > MAX_CPUS {
            crate::kerror!("(Sched) num_cpus inválido=", self.num_cpus);
            return Err(SchedError::InvalidConfig);
        }
        if self.max_threads <= self.num_cpus || self.max_threads > u32::MAX as usize {
            crate::kerror!("(Sched) max_threads inválido=", self.max_threads);
            return Err(SchedError::InvalidConfig);
        }
        if self.max_wait_queues > u32::MAX as usize {
            return Err(SchedError::InvalidConfig);
        }
        if self.priority_ceiling == Priority::IDLE {
            return Err(SchedError::InvalidConfig);
        }
        Ok(())
    }
}

impl Default for SchedConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn niveis_cabem_no_bitmap() {
        assert_eq!(PRIO_LEVELS, 32);
        assert_eq!(Priority::IDLE.level(), PRIO_LEVELS - 1);
        assert_eq!(Priority::HIGHEST.level(), 0);
    }

    #[test]
    fn validate() {
        assert!(SchedConfig::new().validate().is_ok());
        assert!(SchedConfig::new().with_cpus(4).validate().is_ok());

        assert_eq!(
            SchedConfig::new().with_cpus(0).validate(),
            Err(SchedError::InvalidConfig)
        );
        assert_eq!(
            SchedConfig::new().with_cpus(MAX_CPUS + 1).validate(),
            Err(SchedError::InvalidConfig)
        );
        assert_eq!(
            SchedConfig::new().with_cpus(4).with_max_threads(4).validate(),
            Err(SchedError::InvalidConfig)
        );
        assert_eq!(
            SchedConfig::new()
                .with_priority_ceiling(Priority::IDLE)
                .validate(),
            Err(SchedError::InvalidConfig)
        );
    }

    #[test]
    fn builder_encadeia() {
        let cfg = SchedConfig::new()
            .with_cpus(2)
            .with_ipi_mode(IpiMode::Broadcast)
            .with_time_slice(0, Priority::HIGHEST);
        assert_eq!(cfg.num_cpus, 2);
        assert_eq!(cfg.ipi_mode, IpiMode::Broadcast);
        assert_eq!(cfg.time_slice_ticks, 0);
    }
}
