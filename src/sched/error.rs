//! Tipos de Erro do Escalonador
//!
//! Erros estruturados para diagnóstico preciso de falhas no escalonador.
//! Corridas benignas (ex.: timeout perdendo para um wake) não são erros: as
//! operações devolvem `false`/`None`.

/// Erros do escalonador
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedError {
    /// Prioridade fora do intervalo válido
    InvalidPriority,
    /// Handle de thread inválido ou obsoleto
    NoSuchThread,
    /// Thread já pertence a uma fila
    AlreadyQueued,
    /// Operação exige thread executável
    NotRunnable,
    /// Arena de threads cheia
    ThreadTableFull,
    /// Tabela de wait queues cheia
    WaitQueueTableFull,
    /// Handle de wait queue inválido
    NoSuchWaitQueue,
    /// Espera com `Timeout::NoWait`
    WouldBlock,
    /// CPU fora do intervalo configurado
    InvalidCpu,
    /// CPU ainda não iniciada
    CpuNotActive,
    /// Operação proibida para a thread idle
    ThreadIsIdle,
    /// Thread já terminada
    Dead,
    /// Thread ainda não terminada
    NotDead,
    /// Configuração inconsistente
    InvalidConfig,
    /// `sched_unlock` sem `sched_lock` correspondente
    LockUnbalanced,
    /// Operação exige thread fora de execução
    ThreadRunnable,
}

impl SchedError {
    /// Retorna descrição legível do erro
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidPriority => "Prioridade fora do intervalo",
            Self::NoSuchThread => "Thread inexistente ou handle obsoleto",
            Self::AlreadyQueued => "Thread já está em uma fila",
            Self::NotRunnable => "Thread não está pronta para executar",
            Self::ThreadTableFull => "Tabela de threads cheia",
            Self::WaitQueueTableFull => "Tabela de wait queues cheia",
            Self::NoSuchWaitQueue => "Wait queue inexistente",
            Self::WouldBlock => "Operação bloquearia (NoWait)",
            Self::InvalidCpu => "CPU inválida",
            Self::CpuNotActive => "CPU não iniciada",
            Self::ThreadIsIdle => "Operação proibida na thread idle",
            Self::Dead => "Thread terminada",
            Self::NotDead => "Thread ainda não terminou",
            Self::InvalidConfig => "Configuração inválida",
            Self::LockUnbalanced => "sched_unlock sem sched_lock",
            Self::ThreadRunnable => "Thread está executável",
        }
    }
}

impl core::fmt::Display for SchedError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tipo Result específico para operações do escalonador
pub type SchedResult<T> = Result<T, SchedError>;
