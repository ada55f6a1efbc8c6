// =============================================================================
// SCHEDULER LOGGING SYSTEM - ZERO OVERHEAD
// =============================================================================
//
// Sistema de logging do Forge com custo ZERO em release.
//
// ARQUITETURA:
// - Usa features do Cargo para compile-time filtering
// - Com feature "no_logs", TODOS os macros viram expressões vazias
// - SEM core::fmt - Evita geração de código SSE/AVX
// - SEM alocação - Apenas strings e valores hex
// - Saída plugável: a plataforma registra um `LogSink` (serial, RTT,
//   buffer de teste...). Sem sink registrado, as mensagens são descartadas.
//
// NÍVEIS DE LOG (do mais crítico ao menos):
// - ERROR: Erros fatais ou críticos
// - WARN:  Situações suspeitas mas recuperáveis
// - INFO:  Fluxo normal de execução
// - DEBUG: Informações de debugging
// - TRACE: Detalhes extremos (cada operação)
//
// FEATURES:
// - no_logs:   Remove 100% dos logs (custo zero no binário)
// - log_error: Apenas ERROR, WARN
// - log_info:  ERROR, WARN, INFO (padrão)
// - log_debug: + DEBUG
// - log_trace: Todos os níveis
//
// COMO USAR:
//   kinfo!("(Sched) CPU ativa");               // Apenas string
//   kinfo!("(Sched) cpu=", cpu);               // String + hex
//   klog!("tid=", tid, " prio=", prio);        // Múltiplos valores
//
// =============================================================================

use spin::Once;

/// Destino das mensagens de log.
///
/// Implementado pela plataforma. Deve ser seguro chamar de qualquer CPU e com
/// interrupções desabilitadas (o escalonador loga dentro do lock).
pub trait LogSink: Sync {
    fn write_str(&self, s: &str);
}

static SINK: Once<&'static dyn LogSink> = Once::new();

/// Registra o sink global. Só o primeiro registro vale.
///
/// Retorna `false` se já havia um sink.
pub fn set_sink(sink: &'static dyn LogSink) -> bool {
    let mut installed = false;
    SINK.call_once(|| {
        installed = true;
        sink
    });
    installed
}

/// Existe sink registrado?
pub fn has_sink() -> bool {
    SINK.get().is_some()
}

#[inline]
pub fn emit_str(s: &str) {
    if let Some(sink) = SINK.get() {
        sink.write_str(s);
    }
}

#[inline]
pub fn emit_nl() {
    emit_str("\n");
}

/// Emite `0x` + 16 nibbles (largura fixa, sem formatação).
pub fn emit_hex(value: u64) {
    let Some(sink) = SINK.get() else {
        return;
    };

    let mut buf = [0u8; 18];
    buf[0] = b'0';
    buf[1] = b'x';
    for i in 0..16 {
        let nibble = ((value >> (60 - i * 4)) & 0xF) as u8;
        buf[2 + i] = nibble_to_ascii(nibble);
    }

    // Só ASCII hexadecimal no buffer
    if let Ok(s) = core::str::from_utf8(&buf) {
        sink.write_str(s);
    }
}

#[inline]
const fn nibble_to_ascii(nibble: u8) -> u8 {
    if nibble < 10 {
        b'0' + nibble
    } else {
        b'a' + (nibble - 10)
    }
}

// =============================================================================
// PREFIXOS COM CORES ANSI
// =============================================================================
//
// Formato: \x1b[<código>m  onde:
//   1;31 = Bold Red
//   1;33 = Bold Yellow
//   32   = Green
//   36   = Cyan
//   35   = Magenta
//   0    = Reset
//

pub const P_ERROR: &str = "\x1b[1;31m[ERRO]\x1b[0m ";
pub const P_WARN: &str = "\x1b[1;33m[WARN]\x1b[0m ";
pub const P_INFO: &str = "\x1b[32m[INFO]\x1b[0m ";
pub const P_DEBUG: &str = "\x1b[36m[DEBG]\x1b[0m ";
pub const P_TRACE: &str = "\x1b[35m[TRAC]\x1b[0m ";
pub const P_OK: &str = "\x1b[32m[OK]\x1b[0m ";
pub const P_FAIL: &str = "\x1b[1;31m[FAIL]\x1b[0m ";

// =============================================================================
// MACROS DE LOG - NÍVEL ERROR
// =============================================================================

#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kerror {
    ($msg:expr) => {{
        $crate::klib::logging::emit_str($crate::klib::logging::P_ERROR);
        $crate::klib::logging::emit_str($msg);
        $crate::klib::logging::emit_nl();
    }};
    ($msg:expr, $val:expr) => {{
        $crate::klib::logging::emit_str($crate::klib::logging::P_ERROR);
        $crate::klib::logging::emit_str($msg);
        $crate::klib::logging::emit_hex($val as u64);
        $crate::klib::logging::emit_nl();
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kerror {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS DE LOG - NÍVEL WARN
// =============================================================================

#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kwarn {
    ($msg:expr) => {{
        $crate::klib::logging::emit_str($crate::klib::logging::P_WARN);
        $crate::klib::logging::emit_str($msg);
        $crate::klib::logging::emit_nl();
    }};
    ($msg:expr, $val:expr) => {{
        $crate::klib::logging::emit_str($crate::klib::logging::P_WARN);
        $crate::klib::logging::emit_str($msg);
        $crate::klib::logging::emit_hex($val as u64);
        $crate::klib::logging::emit_nl();
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kwarn {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS DE LOG - NÍVEL INFO
// =============================================================================

#[cfg(all(
    not(feature = "no_logs"),
    any(feature = "log_info", feature = "log_debug", feature = "log_trace")
))]
#[macro_export]
macro_rules! kinfo {
    ($msg:expr) => {{
        $crate::klib::logging::emit_str($crate::klib::logging::P_INFO);
        $crate::klib::logging::emit_str($msg);
        $crate::klib::logging::emit_nl();
    }};
    ($msg:expr, $val:expr) => {{
        $crate::klib::logging::emit_str($crate::klib::logging::P_INFO);
        $crate::klib::logging::emit_str($msg);
        $crate::klib::logging::emit_hex($val as u64);
        $crate::klib::logging::emit_nl();
    }};
}

#[cfg(not(all(
    not(feature = "no_logs"),
    any(feature = "log_info", feature = "log_debug", feature = "log_trace")
)))]
#[macro_export]
macro_rules! kinfo {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS DE LOG - NÍVEL DEBUG
// =============================================================================

#[cfg(all(
    not(feature = "no_logs"),
    any(feature = "log_debug", feature = "log_trace")
))]
#[macro_export]
macro_rules! kdebug {
    ($msg:expr) => {{
        $crate::klib::logging::emit_str($crate::klib::logging::P_DEBUG);
        $crate::klib::logging::emit_str($msg);
        $crate::klib::logging::emit_nl();
    }};
    ($msg:expr, $val:expr) => {{
        $crate::klib::logging::emit_str($crate::klib::logging::P_DEBUG);
        $crate::klib::logging::emit_str($msg);
        $crate::klib::logging::emit_hex($val as u64);
        $crate::klib::logging::emit_nl();
    }};
}

#[cfg(not(all(
    not(feature = "no_logs"),
    any(feature = "log_debug", feature = "log_trace")
)))]
#[macro_export]
macro_rules! kdebug {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS DE LOG - NÍVEL TRACE
// =============================================================================
//
// ktrace! - Ativo apenas com log_trace. Cada operação de fila passa por aqui.
//

#[cfg(all(not(feature = "no_logs"), feature = "log_trace"))]
#[macro_export]
macro_rules! ktrace {
    ($msg:expr) => {{
        $crate::klib::logging::emit_str($crate::klib::logging::P_TRACE);
        $crate::klib::logging::emit_str($msg);
        $crate::klib::logging::emit_nl();
    }};
    ($msg:expr, $val:expr) => {{
        $crate::klib::logging::emit_str($crate::klib::logging::P_TRACE);
        $crate::klib::logging::emit_str($msg);
        $crate::klib::logging::emit_hex($val as u64);
        $crate::klib::logging::emit_nl();
    }};
}

#[cfg(not(all(not(feature = "no_logs"), feature = "log_trace")))]
#[macro_export]
macro_rules! ktrace {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS AUXILIARES
// =============================================================================

/// klog! - Log genérico sem prefixo de nível.
///
/// # Uso
/// ```ignore
/// klog!("tid=", tid);                        // String + hex
/// klog!("cpu=", cpu, " mask=", mask);        // Múltiplos
/// ```
#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! klog {
    ($msg:expr) => {{
        $crate::klib::logging::emit_str($msg);
    }};
    ($msg:expr, $val:expr) => {{
        $crate::klib::logging::emit_str($msg);
        $crate::klib::logging::emit_hex($val as u64);
    }};
    ($msg1:expr, $val:expr, $msg2:expr) => {{
        $crate::klib::logging::emit_str($msg1);
        $crate::klib::logging::emit_hex($val as u64);
        $crate::klib::logging::emit_str($msg2);
    }};
    ($msg1:expr, $val1:expr, $msg2:expr, $val2:expr) => {{
        $crate::klib::logging::emit_str($msg1);
        $crate::klib::logging::emit_hex($val1 as u64);
        $crate::klib::logging::emit_str($msg2);
        $crate::klib::logging::emit_hex($val2 as u64);
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! klog {
    ($($t:tt)*) => {{}};
}

/// knl! - Emite apenas newline.
#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! knl {
    () => {{
        $crate::klib::logging::emit_nl();
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! knl {
    () => {{}};
}

// =============================================================================
// MACROS DE STATUS (OK/FAIL)
// =============================================================================

/// kok! - Log de sucesso (prefixo verde [OK]).
#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kok {
    ($msg:expr) => {{
        $crate::klib::logging::emit_str($crate::klib::logging::P_OK);
        $crate::klib::logging::emit_str($msg);
        $crate::klib::logging::emit_nl();
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kok {
    ($($t:tt)*) => {{}};
}

/// kfail! - Log de falha (prefixo vermelho [FAIL]).
#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kfail {
    ($msg:expr) => {{
        $crate::klib::logging::emit_str($crate::klib::logging::P_FAIL);
        $crate::klib::logging::emit_str($msg);
        $crate::klib::logging::emit_nl();
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kfail {
    ($($t:tt)*) => {{}};
}
