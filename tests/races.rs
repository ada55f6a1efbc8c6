//! Corridas entre CPUs simuladas por threads do host.

use std::sync::{Arc, Barrier};
use std::thread;

use forge_sched::{IpiMode, NoIpi, Priority, SchedConfig, Scheduler, ThreadSpec, Timeout};

fn sched(cpus: usize) -> Arc<Scheduler<NoIpi>> {
    let cfg = SchedConfig::new()
        .with_cpus(cpus)
        .with_ipi_mode(IpiMode::Directed)
        .with_max_threads(32);
    let sched = Scheduler::new(cfg, NoIpi).unwrap();
    for cpu in 0..cpus as u32 {
        sched.start_cpu(cpu).unwrap();
    }
    Arc::new(sched)
}

#[test]
fn timeout_contra_wake_so_um_vence() {
    let sched = sched(2);
    let prio = Priority::new(3).unwrap();

    for _ in 0..200 {
        let wq = sched.wait_queue_create().unwrap();
        let t = sched.spawn(0, ThreadSpec::new("t", prio)).unwrap();
        sched.pend(0, t, &wq, Timeout::Ticks(1_000)).unwrap();

        let barrier = Arc::new(Barrier::new(2));
        let timer = {
            let sched = Arc::clone(&sched);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                sched.on_timeout(0, t).unwrap()
            })
        };
        let waker = {
            let sched = Arc::clone(&sched);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                sched.unpend_thread(1, t).unwrap()
            })
        };

        let timed_out = timer.join().unwrap();
        let woken = waker.join().unwrap();
        assert!(timed_out ^ woken);

        let info = sched.thread_info(t).unwrap();
        assert_eq!(info.timed_out, timed_out);
        assert!(info.queued);
        assert_eq!(info.wake_at, None);
        sched.check_consistency().unwrap();

        sched.abort(0, t).unwrap();
        sched.reap(t).unwrap();
        assert_eq!(sched.wait_queue_destroy(0, wq), Ok(0));
    }
}

#[test]
fn tick_contra_unpend_first() {
    let sched = sched(2);
    let prio = Priority::new(5).unwrap();

    for _ in 0..200 {
        let wq = Arc::new(sched.wait_queue_create().unwrap());
        let deadline = sched.uptime_ticks() + 1;
        let t = sched.spawn(0, ThreadSpec::new("t", prio)).unwrap();
        sched.pend(0, t, &wq, Timeout::Ticks(1)).unwrap();

        let barrier = Arc::new(Barrier::new(2));
        let ticker = {
            let sched = Arc::clone(&sched);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                sched.announce_ticks(0, 1).unwrap()
            })
        };
        let waker = {
            let sched = Arc::clone(&sched);
            let barrier = Arc::clone(&barrier);
            let wq = Arc::clone(&wq);
            thread::spawn(move || {
                barrier.wait();
                sched.unpend_first(1, &wq).unwrap()
            })
        };

        let expired = ticker.join().unwrap();
        let woken = waker.join().unwrap();
        assert_eq!(expired + usize::from(woken.is_some()), 1);
        assert!(sched.uptime_ticks() >= deadline);
        sched.check_consistency().unwrap();

        sched.abort(0, t).unwrap();
        sched.reap(t).unwrap();
        let wq = Arc::try_unwrap(wq).unwrap();
        assert_eq!(sched.wait_queue_destroy(0, wq), Ok(0));
    }
}

#[test]
fn spawns_concorrentes_mantem_invariantes() {
    let sched = sched(4);
    let mut handles = Vec::new();

    for cpu in 0..4u32 {
        let sched = Arc::clone(&sched);
        handles.push(thread::spawn(move || {
            let mut ids = Vec::new();
            for i in 0..6 {
                let prio = Priority::new(i * 3 - 5).unwrap();
                ids.push(sched.spawn(cpu, ThreadSpec::new("w", prio)).unwrap());
                sched.schedule(cpu).unwrap();
                sched.yield_now(cpu).unwrap();
                sched.schedule(cpu).unwrap();
            }
            ids
        }));
    }

    let mut total = 0;
    for h in handles {
        total += h.join().unwrap().len();
    }
    assert_eq!(total, 24);
    assert_eq!(sched.thread_count(), 24 + 4);
    sched.check_consistency().unwrap();

    // Toda thread criada está na fila ou rodando em exatamente uma CPU
    let running = (0..4)
        .filter(|&cpu| {
            let cur = sched.current(cpu).unwrap();
            !sched.thread_info(cur).unwrap().is_idle
        })
        .count();
    assert_eq!(sched.ready_count() + running, 24);
}
