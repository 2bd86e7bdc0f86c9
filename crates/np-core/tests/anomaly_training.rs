//! Training, scoring, and model persistence end to end.

use chrono::{Duration, Utc};
use np_common::{MetricsSnapshot, MonitorConfig, ProtocolSplit};
use np_core::history::{MemoryStore, SnapshotStore};
use np_core::Monitor;
use std::sync::Arc;

fn synthetic_config() -> MonitorConfig {
    MonitorConfig {
        capture_enabled: false,
        ..Default::default()
    }
}

fn snapshot(incoming: f64, outgoing: f64, connections: u64) -> MetricsSnapshot {
    MetricsSnapshot {
        timestamp: Utc::now(),
        incoming_mbps: incoming,
        outgoing_mbps: outgoing,
        active_connections: connections,
        top_source_ips: Vec::new(),
        top_dest_ips: Vec::new(),
        top_ports: Vec::new(),
        protocols: ProtocolSplit {
            tcp_pct: 80.0,
            udp_pct: 20.0,
        },
        average_latency_ms: 30.0,
        packet_loss_pct: 0.5,
    }
}

/// 100 baseline snapshots with incoming in [100, 200] plus 5 spikes in
/// [500, 1000].
fn training_set() -> Vec<MetricsSnapshot> {
    let mut set = Vec::new();
    for i in 0..100u32 {
        let step = f64::from(i);
        set.push(snapshot(100.0 + step, 80.0 + step * 0.7, 100 + u64::from(i) * 2));
    }
    for i in 0..5u32 {
        let step = f64::from(i) * 100.0;
        set.push(snapshot(500.0 + step, 400.0 + step * 0.8, 800 + u64::from(i) * 40));
    }
    set
}

#[test]
fn traffic_spike_flags_after_training() {
    let monitor = Monitor::new(synthetic_config(), Arc::new(MemoryStore::new())).unwrap();

    // Untrained: neutral for any input.
    let untrained = monitor.score(&snapshot(800.0, 640.0, 900));
    assert!(!untrained.is_anomaly);
    assert_eq!(untrained.overall_score, 0.0);

    monitor.train(&training_set()).unwrap();

    let spike = monitor.score(&snapshot(800.0, 640.0, 900));
    assert!(spike.traffic_anomaly, "spike result {spike:?}");
    assert!(spike.is_anomaly);

    let baseline = monitor.score(&snapshot(150.0, 115.0, 200));
    assert!(!baseline.traffic_anomaly, "baseline result {baseline:?}");
}

#[test]
fn empty_training_input_is_explicit_failure() {
    let monitor = Monitor::new(synthetic_config(), Arc::new(MemoryStore::new())).unwrap();
    monitor.train(&training_set()).unwrap();
    let before = monitor.score(&snapshot(800.0, 640.0, 900));

    assert!(monitor.train(&[]).is_err());
    assert!(monitor.is_trained());
    assert_eq!(before, monitor.score(&snapshot(800.0, 640.0, 900)));
}

#[test]
fn trained_pair_survives_restart_via_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let config = MonitorConfig {
        model_dir: Some(dir.path().join("models")),
        ..synthetic_config()
    };

    {
        let monitor = Monitor::new(config.clone(), Arc::new(MemoryStore::new())).unwrap();
        monitor.train(&training_set()).unwrap();
    }

    // A fresh monitor restores the persisted pair before first use.
    let restored = Monitor::new(config, Arc::new(MemoryStore::new())).unwrap();
    assert!(restored.is_trained());
    assert!(restored.score(&snapshot(800.0, 640.0, 900)).traffic_anomaly);
}

#[test]
fn corrupt_artifact_leaves_monitor_untrained() {
    let dir = tempfile::tempdir().unwrap();
    let model_dir = dir.path().join("models");
    let config = MonitorConfig {
        model_dir: Some(model_dir.clone()),
        ..synthetic_config()
    };

    {
        let monitor = Monitor::new(config.clone(), Arc::new(MemoryStore::new())).unwrap();
        monitor.train(&training_set()).unwrap();
    }
    std::fs::write(model_dir.join("anomaly_models.json"), "{ not json").unwrap();

    let restored = Monitor::new(config, Arc::new(MemoryStore::new())).unwrap();
    assert!(!restored.is_trained());
    assert!(!restored.score(&snapshot(800.0, 640.0, 900)).is_anomaly);
}

#[test]
fn history_roundtrip_feeds_training() {
    let store = Arc::new(MemoryStore::new());
    for entry in training_set() {
        store.persist(&entry).unwrap();
    }

    let monitor = Monitor::new(synthetic_config(), store).unwrap();
    monitor.train_from_history(Duration::days(1)).unwrap();
    assert!(monitor.is_trained());
    assert!(monitor.score(&snapshot(800.0, 640.0, 900)).traffic_anomaly);
}
