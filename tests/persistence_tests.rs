use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tremorlink::core::Sample;
use tremorlink::observability::PipelineMetrics;
use tremorlink::pipeline::PipelineEvent;
use tremorlink::workers::{CsvSink, PersistError, PersistenceWorker, SampleSink};

#[tokio::test]
async fn test_csv_sink_appends_records_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let mut sink = CsvSink::create(dir.path()).await.unwrap();
    let path = sink.path().to_path_buf();

    for n in 1..=5 {
        sink.append(&Sample::new(n, n * 10, n * 100)).await.unwrap();
    }

    let contents = tokio::fs::read_to_string(&path).await.unwrap();
    let records: Vec<&str> = contents.lines().collect();
    assert_eq!(
        records,
        vec!["1,10,100", "2,20,200", "3,30,300", "4,40,400", "5,50,500"]
    );
}

#[tokio::test]
async fn test_csv_sink_target_name_embeds_timestamp() {
    let dir = tempfile::tempdir().unwrap();
    let sink = CsvSink::create(dir.path()).await.unwrap();
    let name = sink.path().file_name().unwrap().to_str().unwrap();
    // YYYY_MM_DD_HHMMSS.csv
    assert_eq!(name.len(), "2024_01_31_120000.csv".len());
    assert!(name.ends_with(".csv"));
    assert_eq!(&name[4..5], "_");
    assert_eq!(&name[7..8], "_");
    assert_eq!(&name[10..11], "_");
}

#[tokio::test]
async fn test_worker_persists_every_sample_in_arrival_order() {
    let dir = tempfile::tempdir().unwrap();
    let sink = CsvSink::create(dir.path()).await.unwrap();
    let path = sink.path().to_path_buf();
    let metrics = Arc::new(PipelineMetrics::new());

    let (tx, rx) = mpsc::channel(16);
    let (events_tx, _events_rx) = mpsc::channel(16);
    let worker = PersistenceWorker::new(Box::new(sink), metrics.clone());
    let task = tokio::spawn(worker.run(rx, events_tx));

    for n in 0..10 {
        tx.send(Sample::new(n, n, n)).await.unwrap();
    }
    drop(tx);
    task.await.unwrap();

    let contents = tokio::fs::read_to_string(&path).await.unwrap();
    assert_eq!(contents.lines().count(), 10);
    assert_eq!(metrics.records_persisted(), 10);
}

/// Sink that fails on one configured record index
struct FlakySink {
    fail_on: u64,
    seen: AtomicU64,
}

#[async_trait]
impl SampleSink for FlakySink {
    async fn append(&mut self, _sample: &Sample) -> Result<(), PersistError> {
        let index = self.seen.fetch_add(1, Ordering::SeqCst);
        if index == self.fail_on {
            return Err(PersistError::Io(std::io::Error::other("disk full")));
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_write_failure_does_not_block_later_records() {
    let metrics = Arc::new(PipelineMetrics::new());
    let (tx, rx) = mpsc::channel(16);
    let (events_tx, mut events_rx) = mpsc::channel(16);

    let sink = FlakySink {
        fail_on: 2,
        seen: AtomicU64::new(0),
    };
    let worker = PersistenceWorker::new(Box::new(sink), metrics.clone());
    let task = tokio::spawn(worker.run(rx, events_tx));

    for n in 0..5 {
        tx.send(Sample::new(n, 0, 0)).await.unwrap();
    }
    drop(tx);
    task.await.unwrap();

    // Record 2 failed; 0, 1, 3, 4 landed.
    assert_eq!(metrics.records_persisted(), 4);
    assert_eq!(metrics.persist_failures(), 1);
    let event = events_rx.recv().await.unwrap();
    assert!(matches!(event, PipelineEvent::PersistFailed(_)));
}
