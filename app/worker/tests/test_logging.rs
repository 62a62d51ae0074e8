//! FILENAME: app/worker/tests/test_logging.rs
//! PURPOSE: Log file output of a running worker.
//! CONTEXT: The log file is process-global, so everything touching it lives
//! in a single test.

use std::fs;
use worker::{
    close_log_file, get_log_path, sort_log_file, spawn, Inbound, Request, Slug, WorkerConfig,
};

#[tokio::test]
async fn test_worker_writes_sequenced_log_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logs").join("worker.log");

    let config = WorkerConfig {
        log_file: Some(path.clone()),
        ..WorkerConfig::default()
    };
    let worker = spawn(config).unwrap();
    assert_eq!(get_log_path(), Some(path.clone()));

    worker
        .send(Inbound::new(&Slug::new("early"), Request::CountCols))
        .unwrap();
    worker.shutdown().await.unwrap();

    let lines = sort_log_file().unwrap();
    close_log_file();
    assert_eq!(get_log_path(), None);

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), lines);

    let seqs: Vec<u64> = content
        .lines()
        .map(|line| line.split('|').next().unwrap().parse().unwrap())
        .collect();
    assert!(seqs.windows(2).all(|w| w[0] < w[1]));

    assert!(content.contains("|I|WORKER|spawning worker task"));
    assert!(content.contains("|D|DISPATCH|ENTER count cols slug=early"));
    assert!(content.contains("|W|DISPATCH|dropped count cols from early: not initialized"));
    assert!(content.contains("|I|WORKER|worker task finished"));
}
