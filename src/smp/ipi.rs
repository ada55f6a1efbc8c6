//! Inter-Processor Interrupts (reschedule)
//!
//! O escalonador só usa um tipo de IPI: "reavalie quem deve rodar". Aqui
//! ficam:
//! - o trait que a plataforma implementa para entregar a IPI fisicamente;
//! - o cálculo de alvos (direcionado ou broadcast);
//! - o acumulador atômico de IPIs pendentes, esvaziado depois que o lock do
//!   escalonador é liberado;
//! - estatísticas.

use core::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use super::topology::{CpuId, CpuMask};
use crate::sched::task::Priority;

/// Entrega física de IPIs (fornecida pela plataforma).
///
/// Ao receber a interrupção, a CPU alvo deve chamar
/// `Scheduler::ipi_handler(cpu)`.
pub trait IpiController: Send + Sync {
    /// Envia a IPI de reschedule para cada CPU em `mask`.
    fn send_ipi(&self, mask: CpuMask);

    /// Envia para todas as outras CPUs.
    fn send_ipi_broadcast(&self);
}

/// Controlador nulo: single-core, ou plataforma sem IPI.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoIpi;

impl IpiController for NoIpi {
    fn send_ipi(&self, _mask: CpuMask) {}
    fn send_ipi_broadcast(&self) {}
}

/// Estratégia de seleção de alvos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpiMode {
    /// Apenas as CPUs cuja decisão ficou obsoleta
    Directed,
    /// Todas as outras CPUs ativas
    Broadcast,
}

impl IpiMode {
    /// Padrão do build: direcionado com a feature `smp`, broadcast sem ela.
    pub const fn default_for_build() -> Self {
        if cfg!(feature = "smp") {
            IpiMode::Directed
        } else {
            IpiMode::Broadcast
        }
    }
}

impl Default for IpiMode {
    fn default() -> Self {
        Self::default_for_build()
    }
}

/// Visão de uma CPU remota no momento do cálculo de alvos.
#[derive(Debug, Clone, Copy)]
pub struct RemoteCpu {
    pub id: CpuId,
    pub active: bool,
    /// Prioridade e preemptibilidade da thread corrente, se houver
    pub current: Option<(Priority, bool)>,
}

/// Máscara mínima de CPUs a interromper quando uma thread de prioridade
/// `candidate` (com afinidade `affinity`) fica pronta.
///
/// Uma CPU entra na máscara quando: não é a local, está ativa, tem thread
/// corrente, essa thread é preemptível e estritamente menos prioritária que
/// a candidata, e a candidata pode rodar nela.
pub fn directed_targets(
    local: CpuId,
    candidate: Priority,
    affinity: CpuMask,
    cpus: impl IntoIterator<Item = RemoteCpu>,
) -> CpuMask {
    let mut mask = CpuMask::EMPTY;

    for cpu in cpus {
        if cpu.id == local || !cpu.active || !affinity.contains(cpu.id) {
            continue;
        }
        let Some((prio, preemptible)) = cpu.current else {
            continue;
        };
        if preemptible && candidate.is_higher_than(prio) {
            mask.insert(cpu.id);
        }
    }

    mask
}

/// Todas as outras CPUs ativas.
pub fn broadcast_targets(local: CpuId, cpus: impl IntoIterator<Item = RemoteCpu>) -> CpuMask {
    cpus.into_iter()
        .filter(|cpu| cpu.id != local && cpu.active)
        .map(|cpu| cpu.id)
        .collect()
}

/// Snapshot das estatísticas de IPI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IpiStats {
    /// Chamadas a `send_ipi`
    pub directed_sends: u64,
    /// Chamadas a `send_ipi_broadcast`
    pub broadcast_sends: u64,
    /// Soma das CPUs alvo de todos os envios
    pub targeted_cpus: u64,
    /// IPIs tratadas por `ipi_handler`
    pub received: u64,
    /// IPIs que não mudaram a decisão da CPU alvo
    pub spurious: u64,
}

/// IPIs pendentes + contadores.
///
/// Vive fora do lock do escalonador: `flag` é chamado com o lock preso,
/// `signal` depois de liberá-lo.
pub struct IpiState {
    mode: IpiMode,
    pending: AtomicU32,
    directed_sends: AtomicU64,
    broadcast_sends: AtomicU64,
    targeted_cpus: AtomicU64,
    received: AtomicU64,
    spurious: AtomicU64,
}

impl IpiState {
    pub const fn new(mode: IpiMode) -> Self {
        Self {
            mode,
            pending: AtomicU32::new(0),
            directed_sends: AtomicU64::new(0),
            broadcast_sends: AtomicU64::new(0),
            targeted_cpus: AtomicU64::new(0),
            received: AtomicU64::new(0),
            spurious: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn mode(&self) -> IpiMode {
        self.mode
    }

    /// Acumula alvos
    #[inline]
    pub fn flag(&self, mask: CpuMask) {
        if !mask.is_empty() {
            self.pending.fetch_or(mask.bits(), Ordering::AcqRel);
        }
    }

    /// Alvos acumulados ainda não sinalizados
    #[inline]
    pub fn pending(&self) -> CpuMask {
        CpuMask::from_bits(self.pending.load(Ordering::Acquire))
    }

    /// Esvazia o acumulador e entrega uma única IPI.
    ///
    /// Retorna a máscara sinalizada (vazia se nada pendente).
    pub fn signal(&self, controller: &dyn IpiController) -> CpuMask {
        let mask = CpuMask::from_bits(self.pending.swap(0, Ordering::AcqRel));
        if mask.is_empty() {
            return mask;
        }

        match self.mode {
            IpiMode::Directed => {
                crate::ktrace!("(IPI) send mask=", mask.bits());
                controller.send_ipi(mask);
                self.directed_sends.fetch_add(1, Ordering::Relaxed);
            }
            IpiMode::Broadcast => {
                crate::ktrace!("(IPI) broadcast");
                controller.send_ipi_broadcast();
                self.broadcast_sends.fetch_add(1, Ordering::Relaxed);
            }
        }
        self.targeted_cpus
            .fetch_add(mask.count() as u64, Ordering::Relaxed);

        mask
    }

    /// Registra uma IPI recebida; `effective` diz se mudou a decisão.
    pub fn record_receipt(&self, effective: bool) {
        self.received.fetch_add(1, Ordering::Relaxed);
        if !effective {
            self.spurious.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn stats(&self) -> IpiStats {
        IpiStats {
            directed_sends: self.directed_sends.load(Ordering::Relaxed),
            broadcast_sends: self.broadcast_sends.load(Ordering::Relaxed),
            targeted_cpus: self.targeted_cpus.load(Ordering::Relaxed),
            received: self.received.load(Ordering::Relaxed),
            spurious: self.spurious.load(Ordering::Relaxed),
        }
    }
}
