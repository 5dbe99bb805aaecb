//! Timing behavior of the background engine's three submission policies.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use pretty_assertions::assert_eq;

use hangar::worker::Worker;

fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(String) + Clone + Send + 'static) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    (log, move |entry: String| sink.lock().unwrap().push(entry))
}

#[test]
fn debounce_runs_only_the_last_of_a_burst() {
    let worker = Worker::new(Duration::from_millis(80), Duration::from_secs(5)).unwrap();
    let (log, record) = recorder();
    let (done_tx, done_rx) = mpsc::channel();

    for i in 0..10 {
        let record = record.clone();
        let done_tx = done_tx.clone();
        worker.debounce(move || {
            record(format!("f{}", i));
            let _ = done_tx.send(());
        });
    }

    done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    // Nothing else may fire after the quiet period.
    thread::sleep(Duration::from_millis(200));
    assert_eq!(*log.lock().unwrap(), vec!["f9".to_string()]);
}

#[test]
fn separated_debounces_each_run() {
    let worker = Worker::new(Duration::from_millis(20), Duration::from_secs(5)).unwrap();
    let (tx, rx) = mpsc::channel();

    for i in 0..3 {
        let tx = tx.clone();
        worker.debounce(move || tx.send(i).unwrap());
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), i);
    }
}

#[test]
fn debounces_spaced_apart_behind_slow_work_both_run() {
    let worker = Worker::new(Duration::from_millis(30), Duration::from_secs(5)).unwrap();
    let (log, record) = recorder();
    let (done_tx, done_rx) = mpsc::channel();

    worker.queue(|| thread::sleep(Duration::from_millis(300)));
    thread::sleep(Duration::from_millis(20));
    let first = record.clone();
    worker.debounce(move || first("f1".to_string()));
    thread::sleep(Duration::from_millis(150));
    let second = record.clone();
    worker.debounce(move || {
        second("f2".to_string());
        let _ = done_tx.send(());
    });

    done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["f1".to_string(), "f2".to_string()]);
}

#[test]
fn debounce_load_burst_ends_in_one_final() {
    let worker = Worker::new(Duration::from_millis(20), Duration::from_secs(5)).unwrap();
    let (log, record) = recorder();
    let (done_tx, done_rx) = mpsc::channel();

    for i in 0..20 {
        let refresh = record.clone();
        let finish = record.clone();
        let done_tx = done_tx.clone();
        worker.debounce_load(
            move || {
                thread::sleep(Duration::from_millis(2));
                refresh(format!("refresh{}", i));
            },
            move || {
                finish(format!("final{}", i));
                let _ = done_tx.send(());
            },
            || {},
        );
    }

    done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    thread::sleep(Duration::from_millis(100));

    let log = log.lock().unwrap();
    let finals: Vec<&String> = log.iter().filter(|e| e.starts_with("final")).collect();
    assert_eq!(finals, vec!["final19"]);
    assert!(log.iter().any(|e| e.starts_with("refresh")));
    assert_eq!(log.last().map(String::as_str), Some("final19"));
}

#[test]
fn on_load_fires_only_for_slow_refresh() {
    let worker = Worker::new(Duration::from_millis(20), Duration::from_millis(30)).unwrap();
    let (tx, rx) = mpsc::channel();

    let fast_tx = tx.clone();
    let fast_done = tx.clone();
    worker.debounce_load(
        || {},
        move || fast_done.send("final-fast").unwrap(),
        move || fast_tx.send("load-fast").unwrap(),
    );
    assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "final-fast");

    let slow_tx = tx.clone();
    let slow_done = tx.clone();
    worker.debounce_load(
        || thread::sleep(Duration::from_millis(150)),
        move || slow_done.send("final-slow").unwrap(),
        move || slow_tx.send("load-slow").unwrap(),
    );
    assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "load-slow");
    assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "final-slow");
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
}

#[test]
fn functions_never_overlap() {
    let worker = Worker::new(Duration::from_millis(5), Duration::from_secs(5)).unwrap();
    let active = Arc::new(Mutex::new(0usize));
    let overlap = Arc::new(Mutex::new(false));

    let track_overlap = {
        let active = Arc::clone(&active);
        let overlap = Arc::clone(&overlap);
        move || {
            {
                let mut n = active.lock().unwrap();
                *n += 1;
                if *n > 1 {
                    *overlap.lock().unwrap() = true;
                }
            }
            thread::sleep(Duration::from_millis(3));
            *active.lock().unwrap() -= 1;
        }
    };

    for _ in 0..10 {
        worker.queue(track_overlap.clone());
        worker.debounce(track_overlap.clone());
        worker.debounce_load(track_overlap.clone(), track_overlap.clone(), || {});
    }
    worker.shutdown();
    assert!(!*overlap.lock().unwrap());
}

#[test]
fn queued_work_survives_shutdown() {
    let worker = Worker::new(Duration::from_millis(5), Duration::from_secs(5)).unwrap();
    let (log, record) = recorder();
    for i in 0..50 {
        let record = record.clone();
        worker.queue(move || record(i.to_string()));
    }
    drop(worker);
    assert_eq!(log.lock().unwrap().len(), 50);
}
