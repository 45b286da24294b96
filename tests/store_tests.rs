use tremorlink::core::Sample;
use tremorlink::store::{SlidingWindowStore, WINDOW_LEN};

fn sample(n: i32) -> Sample {
    Sample::new(n, n + 1000, n + 2000)
}

#[test]
fn test_full_latches_on_twentieth_push() {
    let store = SlidingWindowStore::new();
    for n in 1..=19 {
        store.push(sample(n));
        assert!(!store.is_full(), "full after only {n} pushes");
    }
    store.push(sample(20));
    assert!(store.is_full());

    // Keeps sliding, never shrinks below capacity.
    store.push(sample(21));
    assert!(store.is_full());
}

#[test]
fn test_fifo_eviction_keeps_most_recent() {
    let store = SlidingWindowStore::new();
    for n in 1..=25 {
        store.push(sample(n));
    }

    let snapshot = store.snapshot();
    assert_eq!(snapshot.len(), WINDOW_LEN);
    let expected: Vec<i32> = (6..=25).collect();
    assert_eq!(snapshot.channels[0], expected);
    let expected: Vec<i32> = (1006..=1025).collect();
    assert_eq!(snapshot.channels[1], expected);
    let expected: Vec<i32> = (2006..=2025).collect();
    assert_eq!(snapshot.channels[2], expected);
}

#[test]
fn test_channels_always_equal_length() {
    let store = SlidingWindowStore::new();
    for n in 1..=7 {
        store.push(sample(n));
        let snapshot = store.snapshot();
        assert_eq!(snapshot.channels[0].len(), snapshot.channels[1].len());
        assert_eq!(snapshot.channels[1].len(), snapshot.channels[2].len());
    }
}

#[test]
fn test_snapshot_is_a_copy() {
    let store = SlidingWindowStore::new();
    store.push(sample(1));
    let before = store.snapshot();
    store.push(sample(2));
    assert_eq!(before.len(), 1);
    assert_eq!(store.snapshot().len(), 2);
}

#[tokio::test]
async fn test_concurrent_push_and_snapshot_never_torn() {
    use std::sync::Arc;

    let store = Arc::new(SlidingWindowStore::new());
    let writer = {
        let store = store.clone();
        tokio::task::spawn_blocking(move || {
            for n in 1..=500 {
                store.push(sample(n));
            }
        })
    };
    let reader = {
        let store = store.clone();
        tokio::task::spawn_blocking(move || {
            for _ in 0..500 {
                let snapshot = store.snapshot();
                assert_eq!(snapshot.channels[0].len(), snapshot.channels[1].len());
                assert_eq!(snapshot.channels[1].len(), snapshot.channels[2].len());
            }
        })
    };
    writer.await.unwrap();
    reader.await.unwrap();
}
