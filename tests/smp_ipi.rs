//! Direcionamento de IPIs com várias CPUs.

use std::sync::Mutex;

use forge_sched::{
    CpuMask, IpiController, IpiMode, Priority, SchedConfig, Scheduler, ThreadId, ThreadSpec,
    Timeout,
};

/// Grava cada envio em vez de interromper CPUs
#[derive(Default)]
struct Recorder {
    directed: Mutex<Vec<CpuMask>>,
    broadcasts: Mutex<usize>,
}

impl Recorder {
    fn take(&self) -> Vec<CpuMask> {
        std::mem::take(&mut *self.directed.lock().unwrap())
    }

    fn broadcasts(&self) -> usize {
        *self.broadcasts.lock().unwrap()
    }
}

impl IpiController for Recorder {
    fn send_ipi(&self, mask: CpuMask) {
        self.directed.lock().unwrap().push(mask);
    }

    fn send_ipi_broadcast(&self) {
        *self.broadcasts.lock().unwrap() += 1;
    }
}

fn prio(p: i32) -> Priority {
    Priority::new(p).unwrap()
}

fn mask(cpus: &[u32]) -> CpuMask {
    cpus.iter().copied().collect()
}

/// 4 CPUs: 1 e 2 rodando prioridade 8, 3 rodando prioridade 2, 0 na idle.
fn four_cores(mode: IpiMode) -> (Scheduler<Recorder>, [ThreadId; 3]) {
    let cfg = SchedConfig::new()
        .with_cpus(4)
        .with_ipi_mode(mode)
        .with_time_slice(0, prio(0));
    let sched = Scheduler::new(cfg, Recorder::default()).unwrap();
    for cpu in 0..4 {
        sched.start_cpu(cpu).unwrap();
    }

    let plan = [(1, 8), (2, 8), (3, 2)];
    let mut ids = Vec::new();
    for (cpu, p) in plan {
        let spec = ThreadSpec::new("worker", prio(p)).with_cpu_mask(CpuMask::single(cpu));
        ids.push(sched.spawn(0, spec).unwrap());
    }
    for (i, (cpu, _)) in plan.iter().enumerate() {
        let sw = sched.schedule(*cpu).unwrap().unwrap();
        assert_eq!(sw.to, ids[i]);
    }

    sched.controller().take();
    (sched, [ids[0], ids[1], ids[2]])
}

#[test]
fn ipi_direcionada_minima() {
    let (sched, _) = four_cores(IpiMode::Directed);

    sched.spawn(0, ThreadSpec::new("novo", prio(5))).unwrap();

    assert_eq!(sched.controller().take(), vec![mask(&[1, 2])]);
    assert!(sched.pending_ipi().is_empty());
    // CPU local decide sozinha
    assert!(sched.need_resched(0).unwrap());
}

#[test]
fn handler_reavalia_e_conta_espurias() {
    let (sched, _) = four_cores(IpiMode::Directed);
    let t = sched.spawn(0, ThreadSpec::new("novo", prio(5))).unwrap();

    // CPU 0 pega primeiro; a IPI para 1 e 2 fica obsoleta
    let sw = sched.schedule(0).unwrap().unwrap();
    assert_eq!(sw.to, t);
    assert_eq!(sched.ipi_handler(1), Ok(false));
    assert_eq!(sched.ipi_handler(2), Ok(false));

    let stats = sched.ipi_stats();
    assert_eq!(stats.received, 2);
    assert_eq!(stats.spurious, 2);
}

#[test]
fn cpu_remota_assume_thread_mais_urgente() {
    let (sched, [w1, _, _]) = four_cores(IpiMode::Directed);
    // CPU 0 ocupada com algo mais urgente que 5
    sched.spawn(0, ThreadSpec::new("local", prio(1))).unwrap();
    sched.schedule(0).unwrap();
    sched.controller().take();

    let t = sched.spawn(0, ThreadSpec::new("novo", prio(5))).unwrap();
    assert_eq!(sched.controller().take(), vec![mask(&[1, 2])]);

    assert_eq!(sched.ipi_handler(1), Ok(true));
    let sw = sched.schedule(1).unwrap().unwrap();
    assert_eq!((sw.from, sw.to), (w1, t));
    assert!(sw.preempted);

    // A deslocada volta para a fila e só cabe na CPU 1
    assert_eq!(sched.ready_snapshot(), vec![w1]);
    assert_eq!(sched.ipi_handler(2), Ok(false));
    sched.check_consistency().unwrap();
}

#[test]
fn afinidade_limita_alvos() {
    let (sched, _) = four_cores(IpiMode::Directed);
    let spec = ThreadSpec::new("fixa", prio(5)).with_cpu_mask(mask(&[2, 3]));
    sched.spawn(0, spec).unwrap();
    assert_eq!(sched.controller().take(), vec![mask(&[2])]);
}

#[test]
fn cpu_cooperativa_ou_travada_nao_e_alvo() {
    let (sched, [w1, _, _]) = four_cores(IpiMode::Directed);
    sched.set_priority(1, w1, prio(-1)).unwrap();
    sched.controller().take();

    sched.spawn(0, ThreadSpec::new("novo", prio(5))).unwrap();
    assert_eq!(sched.controller().take(), vec![mask(&[2])]);
}

#[test]
fn broadcast_interrompe_todas_as_outras() {
    let (sched, _) = four_cores(IpiMode::Broadcast);
    let before = sched.controller().broadcasts();

    sched.spawn(0, ThreadSpec::new("novo", prio(5))).unwrap();
    assert_eq!(sched.controller().broadcasts(), before + 1);
    assert!(sched.controller().take().is_empty());
    assert_eq!(sched.ipi_handler(3), Ok(false));
}

#[test]
fn reduzir_prioridade_de_thread_remota_avisa_a_cpu() {
    let (sched, [_, _, w3]) = four_cores(IpiMode::Directed);
    sched.spawn(0, ThreadSpec::new("espera", prio(4)).with_cpu_mask(mask(&[3])))
        .unwrap();
    sched.controller().take();

    sched.set_priority(0, w3, prio(9)).unwrap();
    assert_eq!(sched.controller().take(), vec![mask(&[3])]);
    assert_eq!(sched.ipi_handler(3), Ok(true));
}

#[test]
fn pend_de_thread_remota_avisa_a_cpu() {
    let (sched, [_, w2, _]) = four_cores(IpiMode::Directed);
    let wq = sched.wait_queue_create().unwrap();

    sched.pend(0, w2, &wq, Timeout::Forever).unwrap();
    assert_eq!(sched.controller().take(), vec![mask(&[2])]);
    assert_eq!(sched.ipi_handler(2), Ok(true));
    let sw = sched.schedule(2).unwrap().unwrap();
    assert_eq!(sw.from, w2);
    assert!(!sw.preempted);
}

#[test]
fn abort_de_thread_remota() {
    let (sched, [w1, _, _]) = four_cores(IpiMode::Directed);
    sched.abort(0, w1).unwrap();
    assert_eq!(sched.controller().take(), vec![mask(&[1])]);

    assert_eq!(sched.reap(w1), Err(forge_sched::SchedError::ThreadRunnable));
    sched.ipi_handler(1).unwrap();
    sched.schedule(1).unwrap();
    sched.reap(w1).unwrap();
    sched.check_consistency().unwrap();
}

/// 2 CPUs: 0 roda L (10, presa na 0), 1 roda A (5, livre) e B (5, presa na 1)
/// espera na fila.
fn two_cores(slice: u32) -> (Scheduler<Recorder>, [ThreadId; 3]) {
    let cfg = SchedConfig::new()
        .with_cpus(2)
        .with_ipi_mode(IpiMode::Directed)
        .with_time_slice(slice, prio(0));
    let sched = Scheduler::new(cfg, Recorder::default()).unwrap();
    sched.start_cpu(0).unwrap();
    sched.start_cpu(1).unwrap();

    let l = sched
        .spawn(0, ThreadSpec::new("l", prio(10)).with_cpu_mask(CpuMask::single(0)))
        .unwrap();
    assert_eq!(sched.schedule(0).unwrap().map(|sw| sw.to), Some(l));

    let a = sched.spawn(0, ThreadSpec::new("a", prio(5))).unwrap();
    assert_eq!(sched.schedule(1).unwrap().map(|sw| sw.to), Some(a));
    assert_eq!(sched.schedule(0), Ok(None));

    let b = sched
        .spawn(0, ThreadSpec::new("b", prio(5)).with_cpu_mask(CpuMask::single(1)))
        .unwrap();
    assert_eq!(sched.ready_snapshot(), vec![b]);

    sched.controller().take();
    (sched, [l, a, b])
}

/// A saiu da CPU 1 mas segue pronta: a CPU 0 precisa ser avisada.
fn assert_cpu0_takes_over(sched: &Scheduler<Recorder>, [l, a, _]: [ThreadId; 3]) {
    assert_eq!(sched.controller().take(), vec![mask(&[0])]);
    assert_eq!(sched.ipi_handler(0), Ok(true));
    let sw = sched.schedule(0).unwrap().unwrap();
    assert_eq!((sw.from, sw.to), (l, a));
    sched.check_consistency().unwrap();
}

#[test]
fn yield_avisa_cpu_que_pode_assumir_a_thread() {
    let (sched, ids @ [_, a, b]) = two_cores(0);

    sched.yield_now(1).unwrap();
    let sw = sched.schedule(1).unwrap().unwrap();
    assert_eq!((sw.from, sw.to), (a, b));
    assert!(!sw.preempted);

    assert_cpu0_takes_over(&sched, ids);
}

#[test]
fn fatia_esgotada_avisa_cpu_que_pode_assumir_a_thread() {
    let (sched, ids @ [_, a, b]) = two_cores(2);

    sched.slice_tick(1, 2).unwrap();
    assert!(sched.need_resched(1).unwrap());
    let sw = sched.schedule(1).unwrap().unwrap();
    assert_eq!((sw.from, sw.to), (a, b));
    assert!(sw.preempted);

    assert_cpu0_takes_over(&sched, ids);
}
