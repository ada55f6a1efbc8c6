//! # Escalonador
//!
//! Núcleo de escalonamento de tempo real: fila de prontos por prioridade,
//! transições de estado das threads, decisão de preempção, wait queues e
//! direcionamento de IPIs em SMP.
//!
//! ## Modelo
//! - Prioridade numérica menor = mais urgente. Negativas são cooperativas
//!   (só saem da CPU por vontade própria); `>= 0` são preemptivas.
//! - Cada CPU tem uma corrente e uma thread idle. A corrente nunca está na
//!   fila de prontos enquanto roda, exceto depois de ceder a vez.
//! - Toda operação recebe o `CpuId` de quem chama e roda sob um único
//!   `IrqSpinlock`. IPIs são enviadas depois de soltar o lock.

pub mod config;
pub mod core;
pub mod error;
pub mod sync;
pub mod task;
