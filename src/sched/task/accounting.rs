//! Contabilidade de Recursos (Accounting)
//!
//! Rastreia o consumo de CPU por thread (em ticks do escalonador) e as
//! trocas de contexto.

/// Estatísticas de uso de recursos de uma thread
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Accounting {
    /// Ticks de CPU consumidos
    pub total_ticks: u64,

    /// Tick em que a thread ganhou a CPU pela última vez
    pub last_start: u64,

    /// Vezes que a thread foi escolhida para rodar
    pub dispatches: u64,

    /// Saídas voluntárias (yield, espera, sleep)
    pub voluntary_switches: u64,

    /// Saídas involuntárias (preempção, fatia expirada)
    pub involuntary_switches: u64,
}

impl Accounting {
    pub const fn new() -> Self {
        Self {
            total_ticks: 0,
            last_start: 0,
            dispatches: 0,
            voluntary_switches: 0,
            involuntary_switches: 0,
        }
    }

    /// Registra o início da execução (a thread ganhou a CPU)
    pub fn start_exec(&mut self, now: u64) {
        self.last_start = now;
        self.dispatches += 1;
    }

    /// Registra o fim da execução. Retorna os ticks desta fatia.
    pub fn end_exec(&mut self, now: u64) -> u64 {
        // Relógio nunca volta; se voltar, ignora
        let delta = now.saturating_sub(self.last_start);
        self.total_ticks += delta;
        delta
    }

    /// Incrementa contadores de troca de contexto
    pub fn account_switch(&mut self, voluntary: bool) {
        if voluntary {
            self.voluntary_switches += 1;
        } else {
            self.involuntary_switches += 1;
        }
    }
}
