// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! End-to-end pipeline behavior against the scriptable mock face, on the
//! paused test clock.

use std::{collections::HashMap, sync::Arc, time::Duration};

use ndn_ft_client_rs::{
    client::naming,
    models::{interest::Interest, lp::NackReason},
    pipeline::{
        fixed::Pipeline,
        pending::{RxHandle, RxQueue},
        token::PitTokenGenerator,
    },
};
use tokio::time::{sleep, timeout};

use crate::integration_tests::common::{
    MockFace, SentInterest, data_event, nack_event,
};

fn logged_tokens(log: &Arc<std::sync::Mutex<Vec<SentInterest>>>) -> Vec<u64> {
    log.lock().unwrap().iter().map(|sent| sent.token).collect()
}

const PREFIX: &str = "/ndnc/ft";
const FILEPATH: &str = "/test.bin";

fn segment_interest(segment: u64, lifetime_ms: u64) -> Interest {
    let name = naming::segment_name(PREFIX, FILEPATH, 1, segment)
        .expect("segment name builds");
    Interest::new(name, Duration::from_millis(lifetime_ms))
}

fn enqueue_segments(
    pipeline: &Pipeline<MockFace>,
    handle: &RxHandle,
    count: u64,
    lifetime_ms: u64,
) {
    for segment in 0..count {
        assert!(
            pipeline.enqueue_interest(&segment_interest(segment, lifetime_ms), handle),
            "enqueue of segment {segment} failed"
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_happy_path_single_worker() {
    let face = MockFace::new(|sent| vec![(Duration::ZERO, data_event(sent, 1024))]);
    let log = face.log();

    let pipeline = Pipeline::new(face, 64);
    pipeline.run();
    assert!(pipeline.is_valid());

    let (handle, mut rx) = RxQueue::channel();
    enqueue_segments(&pipeline, &handle, 1, 1000);

    let delivery = rx.recv().await.expect("one delivery owed");
    let data = delivery.expect("data, not a sentinel");
    assert_eq!(data.name().segment(), Some(0));
    assert_eq!(data.content().len(), 1024);

    let counters = pipeline.counters();
    assert_eq!(counters.tx_interests(), 1);
    assert_eq!(counters.rx_data(), 1);
    assert_eq!(counters.timeouts(), 0);
    assert_eq!(log.lock().unwrap().len(), 1);

    pipeline.end().await;
    assert!(!pipeline.is_valid());
}

#[tokio::test(start_paused = true)]
async fn test_timeout_retry_exhausts_after_eight_attempts() {
    // The face drops everything: each Interest times out, is re-expressed
    // seven times, and finally fails with a sentinel.
    let face = MockFace::new(|_| Vec::new());
    let log = face.log();

    let pipeline = Pipeline::new(face, 4);
    pipeline.run();

    let (handle, mut rx) = RxQueue::channel();
    enqueue_segments(&pipeline, &handle, 4, 1000);

    for _ in 0..4 {
        let delivery = rx.recv().await.expect("delivery owed");
        assert!(delivery.is_none(), "expected a failure sentinel");
    }

    let log = log.lock().unwrap();
    assert_eq!(log.len(), 32, "4 interests x 8 attempts");

    // Every attempt of one logical Interest carries a distinct token.
    let mut tokens_by_name: HashMap<String, Vec<u64>> = HashMap::new();
    for sent in log.iter() {
        tokens_by_name
            .entry(sent.interest.name().to_uri())
            .or_default()
            .push(sent.token);
    }
    assert_eq!(tokens_by_name.len(), 4);
    for (name, tokens) in tokens_by_name {
        assert_eq!(tokens.len(), 8, "{name}");
        let unique: std::collections::HashSet<u64> = tokens.into_iter().collect();
        assert_eq!(unique.len(), 8, "{name}");
    }

    drop(log);

    let counters = pipeline.counters();
    assert_eq!(counters.tx_interests(), 32);
    assert_eq!(counters.timeouts(), 32);
    assert_eq!(counters.rx_data(), 0);

    pipeline.end().await;
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_nack_reexpresses_with_fresh_nonce_and_token() {
    let mut calls = 0usize;
    let face = MockFace::new(move |sent| {
        calls += 1;
        if calls == 1 {
            vec![(Duration::from_millis(1), nack_event(sent, NackReason::Duplicate))]
        } else {
            vec![(Duration::from_millis(1), data_event(sent, 1024))]
        }
    });
    let log = face.log();

    let pipeline = Pipeline::new(face, 16);
    pipeline.run();

    let (handle, mut rx) = RxQueue::channel();
    enqueue_segments(&pipeline, &handle, 1, 1000);

    let delivery = rx.recv().await.expect("delivery owed");
    assert!(delivery.is_some(), "duplicate nack must not fail the request");

    let log = log.lock().unwrap();
    assert_eq!(log.len(), 2, "original send plus one retransmission");
    assert_ne!(log[0].token, log[1].token, "retransmission re-tokens");
    assert_ne!(
        log[0].interest.nonce(),
        log[1].interest.nonce(),
        "retransmission refreshes the nonce"
    );
    assert_eq!(log[0].interest.name(), log[1].interest.name());
    drop(log);

    let counters = pipeline.counters();
    assert_eq!(counters.rx_nacks(), 1);
    assert_eq!(counters.timeouts(), 0);

    pipeline.end().await;
}

#[tokio::test(start_paused = true)]
async fn test_permanent_nack_fails_without_retry() {
    let face =
        MockFace::new(|sent| vec![(Duration::ZERO, nack_event(sent, NackReason::NoRoute))]);
    let log = face.log();

    let pipeline = Pipeline::new(face, 16);
    pipeline.run();

    let (handle, mut rx) = RxQueue::channel();
    enqueue_segments(&pipeline, &handle, 1, 1000);

    let delivery = rx.recv().await.expect("delivery owed");
    assert!(delivery.is_none(), "non-duplicate nack propagates the sentinel");

    assert_eq!(log.lock().unwrap().len(), 1, "no retransmission");
    assert_eq!(pipeline.counters().rx_nacks(), 1);

    pipeline.end().await;
}

#[tokio::test(start_paused = true)]
async fn test_window_saturation_bounds_in_flight() {
    let face = MockFace::new(|sent| vec![(Duration::from_millis(10), data_event(sent, 64))]);
    let outstanding = face.outstanding();
    let log = face.log();

    let pipeline = Pipeline::new(face, 8);
    pipeline.run();

    let (handle, mut rx) = RxQueue::channel();
    enqueue_segments(&pipeline, &handle, 100, 1000);

    let mut received = 0usize;
    for _ in 0..100 {
        let delivery = rx.recv().await.expect("delivery owed");
        assert!(delivery.is_some());
        received += 1;
    }
    assert_eq!(received, 100);

    assert_eq!(log.lock().unwrap().len(), 100);
    assert!(
        outstanding.lock().unwrap().max <= 8,
        "window must bound in-flight interests"
    );

    pipeline.end().await;
}

#[tokio::test(start_paused = true)]
async fn test_window_of_one_is_strict_request_response() {
    let face = MockFace::new(|sent| vec![(Duration::from_millis(1), data_event(sent, 64))]);
    let outstanding = face.outstanding();

    let pipeline = Pipeline::new(face, 1);
    pipeline.run();

    let (handle, mut rx) = RxQueue::channel();
    enqueue_segments(&pipeline, &handle, 5, 1000);

    for _ in 0..5 {
        assert!(rx.recv().await.expect("delivery owed").is_some());
    }
    assert_eq!(outstanding.lock().unwrap().max, 1);

    pipeline.end().await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_mid_flight_flushes_sentinels() {
    // Only the first 10 interests are answered; the rest hang in the PIT
    // until shutdown (lifetimes long enough not to expire).
    let face = MockFace::new(|sent| {
        if sent.index < 10 {
            vec![(Duration::ZERO, data_event(sent, 64))]
        } else {
            Vec::new()
        }
    });

    let pipeline = Pipeline::new(face, 64);
    pipeline.run();

    let (handle, mut rx) = RxQueue::channel();
    enqueue_segments(&pipeline, &handle, 50, 60_000);

    for _ in 0..10 {
        assert!(rx.recv().await.expect("delivery owed").is_some());
    }

    pipeline.end().await;
    // Idempotent: a second end() is indistinguishable from the first.
    pipeline.end().await;
    assert!(!pipeline.is_valid());

    let mut sentinels = 0usize;
    for _ in 0..40 {
        match rx.recv().await {
            Some(None) => sentinels += 1,
            other => panic!("expected sentinel, got {other:?}"),
        }
    }
    assert_eq!(sentinels, 40);

    // Everything owed has been delivered; the channel is now closed.
    drop(handle);
    assert!(rx.recv().await.is_none());

    assert_eq!(pipeline.counters().rx_data(), 10);
    assert!(
        !pipeline.enqueue_interest(&segment_interest(99, 1000), &{
            let (h, _rx) = RxQueue::channel();
            h
        }),
        "enqueue after shutdown must be refused"
    );
}

#[tokio::test(start_paused = true)]
async fn test_late_reply_is_dropped() {
    // The first attempt is answered after its deadline; the retry is answered
    // promptly. The late Data must not reach the worker.
    let mut calls = 0usize;
    let face = MockFace::new(move |sent| {
        calls += 1;
        if calls == 1 {
            vec![(Duration::from_millis(1500), data_event(sent, 64))]
        } else {
            vec![(Duration::from_millis(1), data_event(sent, 64))]
        }
    });
    let log = face.log();

    let pipeline = Pipeline::new(face, 4);
    pipeline.run();

    let (handle, mut rx) = RxQueue::channel();
    enqueue_segments(&pipeline, &handle, 1, 1000);

    let delivery = rx.recv().await.expect("delivery owed");
    assert!(delivery.is_some());

    // Let the stale reply for the first token arrive and be discarded.
    sleep(Duration::from_millis(700)).await;

    assert_eq!(log.lock().unwrap().len(), 2);
    let counters = pipeline.counters();
    assert_eq!(counters.timeouts(), 1);
    assert_eq!(counters.rx_data(), 1);
    assert_eq!(counters.spurious_drops(), 1);

    // Nothing further may show up on the worker queue.
    assert!(
        timeout(Duration::from_millis(100), rx.recv()).await.is_err(),
        "late reply must not be delivered"
    );

    pipeline.end().await;
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_nacks_do_not_consume_retry_budget() {
    // Every attempt is rejected as a duplicate. Timeout retries are capped at
    // eight attempts; nack retransmissions are not.
    let face = MockFace::new(|sent| {
        vec![(Duration::from_millis(1), nack_event(sent, NackReason::Duplicate))]
    });
    let log = face.log();

    let pipeline = Pipeline::new(face, 4);
    pipeline.run();

    let (handle, mut rx) = RxQueue::channel();
    enqueue_segments(&pipeline, &handle, 1, 1000);

    // Well past eight round-trips and still no verdict for the worker.
    assert!(timeout(Duration::from_millis(100), rx.recv()).await.is_err());
    assert!(
        log.lock().unwrap().len() > 8,
        "duplicate nacks must not count against the retry budget"
    );

    pipeline.end().await;
    // After shutdown the request is either sentineled (live in the PIT) or
    // discarded from the queue; it must never surface as Data.
    match timeout(Duration::from_millis(100), rx.recv()).await {
        Ok(Some(Some(_))) => panic!("nacked interest must not produce data"),
        _ => {},
    }
}

#[tokio::test(start_paused = true)]
async fn test_conservation_across_workers() {
    // Mixed outcomes: even sends succeed, odd sends fail permanently. Each
    // worker still receives exactly as many deliveries as it enqueued.
    let face = MockFace::new(|sent| {
        if sent.index % 2 == 0 {
            vec![(Duration::from_millis(1), data_event(sent, 64))]
        } else {
            vec![(Duration::from_millis(1), nack_event(sent, NackReason::NoRoute))]
        }
    });

    let pipeline = Arc::new(Pipeline::new(face, 32));
    pipeline.run();

    let mut workers = Vec::new();
    for worker in 0..3u64 {
        let pipeline = Arc::clone(&pipeline);
        workers.push(tokio::spawn(async move {
            let (handle, mut rx) = RxQueue::channel();
            for segment in 0..20u64 {
                let interest = segment_interest(worker * 100 + segment, 1000);
                assert!(pipeline.enqueue_interest(&interest, &handle));
            }
            let mut deliveries = 0usize;
            for _ in 0..20 {
                assert!(rx.recv().await.is_some(), "delivery owed");
                deliveries += 1;
            }
            deliveries
        }));
    }

    for worker in workers {
        assert_eq!(worker.await.expect("worker runs"), 20);
    }

    let counters = pipeline.counters();
    assert_eq!(counters.rx_data() + counters.rx_nacks(), 60);

    pipeline.end().await;
}

#[tokio::test(start_paused = true)]
async fn test_seeded_token_generators_repeat() {
    let make = |seed| {
        let face = MockFace::new(|sent| vec![(Duration::ZERO, data_event(sent, 16))]);
        let log = face.log();
        (
            Pipeline::with_token_generator(face, 8, PitTokenGenerator::seeded(seed)),
            log,
        )
    };

    let (first, first_log) = make(42);
    let (second, second_log) = make(42);

    for pipeline in [&first, &second] {
        pipeline.run();
        let (handle, mut rx) = RxQueue::channel();
        enqueue_segments(pipeline, &handle, 3, 1000);
        for _ in 0..3 {
            assert!(rx.recv().await.expect("delivery owed").is_some());
        }
    }

    assert_eq!(logged_tokens(&first_log), logged_tokens(&second_log));

    first.end().await;
    second.end().await;
}

#[tokio::test(start_paused = true)]
async fn test_end_without_run_does_not_hang() {
    let face = MockFace::new(|_| Vec::new());
    let pipeline = Pipeline::new(face, 8);
    assert!(!pipeline.is_valid(), "not valid before run");
    pipeline.end().await;
    assert!(!pipeline.is_valid());
}
