use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use walrus_messenger::error::{ChannelError, Role};
use walrus_messenger::Core::Jitter;
use walrus_messenger::MPSC::{
    create_channel, run, run_consumer, run_consumer_with, run_producer, run_with,
    ConsumerConfig, ProducerConfig, RunConfig,
};

// Spinning workers need real cores; keep the threaded tests from piling up.
static TEST_LOCK: parking_lot::Mutex<()> = parking_lot::const_mutex(());

fn assert_strictly_increasing(values: &[u64]) {
    for pair in values.windows(2) {
        assert!(pair[0] < pair[1], "delivered {} then {}", pair[0], pair[1]);
    }
}

#[test]
fn two_producers_share_one_counter() {
    let _guard = TEST_LOCK.lock();

    for _ in 0..20 {
        let channel = create_channel(8).unwrap();
        let config = RunConfig::new().with_producers(2).with_final_sequence(500);

        let mut seen = Vec::new();
        let outcome = run_with(&channel, &config, |d| seen.push(d.value)).unwrap();

        assert!(!outcome.delivery.ordering_violation);
        assert_eq!(outcome.delivery.last_delivered, Some(500));
        assert!(seen.iter().all(|v| (1..=500).contains(v)));
        assert_strictly_increasing(&seen);

        // Every ticket in the budget is written exactly once.
        let written: u64 = outcome.producers.iter().map(|r| r.written).sum();
        assert_eq!(written, 500);
        assert!((501..=502).contains(&channel.issued()));
    }
}

#[test]
fn many_jittered_producers_keep_order() {
    let _guard = TEST_LOCK.lock();

    let channel = create_channel(16).unwrap();
    let config = RunConfig::new()
        .with_producers(4)
        .with_final_sequence(20_000)
        .with_producer_cost(Arc::new(Jitter::new(200)))
        .with_consumer_cost(Arc::new(Jitter::new(800)));

    let mut seen = Vec::new();
    let outcome = run_with(&channel, &config, |d| seen.push(d.value)).unwrap();

    assert!(!outcome.delivery.ordering_violation);
    assert_eq!(outcome.delivery.last_delivered, Some(20_000));
    assert_eq!(outcome.producers.len(), 4);
    for (i, report) in outcome.producers.iter().enumerate() {
        assert!(report.max_probes as usize <= channel.capacity(), "producer {i}: {report:?}");
    }
    assert_strictly_increasing(&seen);
}

#[test]
fn shared_counter_with_one_producer_starts_at_one() {
    let _guard = TEST_LOCK.lock();

    let channel = create_channel(4).unwrap();
    let config = RunConfig::new().with_shared_counter().with_final_sequence(10);

    let mut seen = Vec::new();
    let outcome = run_with(&channel, &config, |d| seen.push(d.value)).unwrap();

    assert_eq!(outcome.producers[0].written, 10);
    assert_eq!(seen.last(), Some(&10));
    assert!(seen.iter().all(|&v| v >= 1));
}

fn crash() {
    panic!("simulated producer crash");
}

#[test]
fn panicking_producer_fails_the_join() {
    let _guard = TEST_LOCK.lock();

    let channel = create_channel(4).unwrap();
    let config = RunConfig::new()
        .with_final_sequence(10)
        .with_producer_cost(Arc::new(crash));

    let result = run(&channel, &config);

    assert!(matches!(
        result,
        Err(ChannelError::Join {
            role: Role::Producer(0)
        })
    ));
    assert!(channel.is_interrupted());
    assert!(!channel.is_failed());
}

#[test]
fn second_consumer_is_turned_away() {
    let _guard = TEST_LOCK.lock();

    let channel = create_channel(4).unwrap();
    assert!(channel.store(1, 0));

    let started = Arc::new(AtomicBool::new(false));
    let first = {
        let channel = channel.clone();
        let started = started.clone();
        thread::spawn(move || {
            run_consumer_with(&channel, &ConsumerConfig::new(100), |_| {
                started.store(true, Ordering::Release)
            })
            .unwrap()
        })
    };

    while !started.load(Ordering::Acquire) {
        thread::yield_now();
    }
    assert!(matches!(
        run_consumer(&channel, &ConsumerConfig::new(100)),
        Err(ChannelError::ConsumerBusy)
    ));

    channel.interrupt();
    let report = first.join().unwrap();
    assert_eq!(report.delivered_count, 1);
}

#[test]
fn private_producer_cannot_join_a_shared_run() {
    let _guard = TEST_LOCK.lock();

    let channel = create_channel(4).unwrap();
    let shared = {
        let channel = channel.clone();
        thread::spawn(move || {
            run_producer(&channel, &ProducerConfig::new().with_shared_counter()).unwrap()
        })
    };

    while channel.issued() == 0 {
        thread::yield_now();
    }
    assert!(matches!(
        run_producer(&channel, &ProducerConfig::new().with_final_sequence(1)),
        Err(ChannelError::ProducerConflict)
    ));

    channel.interrupt();
    let report = shared.join().unwrap();
    assert!(report.halted);
    // The last producer out hands the edge back.
    assert!(!channel.snapshot().to_string().contains('X'));
}
