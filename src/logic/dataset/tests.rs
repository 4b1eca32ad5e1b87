use super::generator::{GeneratorConfig, TrafficGenerator, SYNTHETIC_EPOCH_SECS};
use super::record::{Decisions, TrafficRecord};
use crate::constants::ANOMALY_RECORD_COUNT;
use crate::error::DetectorError;
use chrono::{DateTime, Duration, Utc};

fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap()
}

fn generate(record_count: usize, seed: u64) -> super::Dataset {
    TrafficGenerator::new(GeneratorConfig { record_count, seed })
        .unwrap()
        .generate(fixed_now())
        .unwrap()
}

#[test]
fn test_dataset_size_invariant() {
    for n in [1, 10, 1000] {
        let dataset = generate(n, 42);
        assert_eq!(dataset.len(), n + ANOMALY_RECORD_COUNT);
        assert_eq!(dataset.feature_matrix().dim(), (n + ANOMALY_RECORD_COUNT, 1));
        assert_eq!(dataset.labels().len(), n + ANOMALY_RECORD_COUNT);
    }
}

#[test]
fn test_injected_records_are_attacks() {
    let dataset = generate(1000, 42);
    let (normal, injected) = dataset.records().split_at(1000);

    assert!(normal.iter().all(|r| !r.is_attack));
    assert_eq!(injected.len(), 50);
    for r in injected {
        assert!(r.is_attack);
        assert!(r.data_size >= 5000.0 && r.data_size < 10000.0);
        assert_eq!(r.data_size.fract(), 0.0, "attack sizes are integer-valued");
        assert_eq!(r.src_ip, "10.0.0.100");
        assert_eq!(r.dst_ip, "10.0.0.200");
    }
    assert_eq!(dataset.attack_count(), 50);
}

#[test]
fn test_normal_records_shape() {
    let dataset = generate(1000, 42);
    let epoch = DateTime::<Utc>::from_timestamp(SYNTHETIC_EPOCH_SECS, 0).unwrap();

    for (i, r) in dataset.records()[..1000].iter().enumerate() {
        assert_eq!(r.timestamp, epoch + Duration::seconds(i as i64));
        for ip in [&r.src_ip, &r.dst_ip] {
            let last: u32 = ip.strip_prefix("192.168.1.").unwrap().parse().unwrap();
            assert!((1..=254).contains(&last), "octet {} out of pool", last);
        }
    }

    let sizes: Vec<f64> = dataset.records()[..1000].iter().map(|r| r.data_size).collect();
    let mean = sizes.iter().sum::<f64>() / sizes.len() as f64;
    let var = sizes.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / sizes.len() as f64;
    assert!((mean - 1000.0).abs() < 15.0, "mean = {}", mean);
    assert!((var.sqrt() - 100.0).abs() < 15.0, "std = {}", var.sqrt());
}

#[test]
fn test_attack_timestamps_follow_wall_clock() {
    let dataset = generate(100, 42);
    let now = fixed_now();

    for r in &dataset.records()[100..] {
        assert!(r.timestamp >= now);
        assert!(r.timestamp < now + Duration::seconds(300));
    }
    // Generation order is kept, never re-sorted by timestamp
    assert!(dataset.records()[99].timestamp < dataset.records()[100].timestamp);
}

#[test]
fn test_generation_is_deterministic() {
    let a = generate(200, 7);
    let b = generate(200, 7);
    assert_eq!(a.records(), b.records());

    let c = generate(200, 8);
    assert_ne!(a.feature_matrix(), c.feature_matrix());
}

#[test]
fn test_zero_record_count_rejected() {
    let result = TrafficGenerator::new(GeneratorConfig { record_count: 0, seed: 42 });
    assert!(matches!(result, Err(DetectorError::InvalidConfiguration(_))));
}

#[test]
fn test_record_json_before_and_after_pass() {
    let mut dataset = generate(3, 42);

    let line = dataset.records()[0].to_jsonl().unwrap();
    let value: serde_json::Value = serde_json::from_str(&line).unwrap();
    assert_eq!(value["is_attack"], 0);
    assert!(value.get("anomaly").is_none(), "no decisions before a pass");

    let decisions: Vec<Decisions> = (0..dataset.len())
        .map(|i| Decisions::new(i == 0, false))
        .collect();
    dataset.apply_decisions(&decisions).unwrap();

    let line = dataset.records()[0].to_jsonl().unwrap();
    let value: serde_json::Value = serde_json::from_str(&line).unwrap();
    assert_eq!(value["anomaly_if"], 1);
    assert_eq!(value["anomaly_mlp"], 0);
    assert_eq!(value["anomaly"], 1);
    assert!(value["timestamp"].as_str().unwrap().starts_with("2023-01-01T00:00:00"));

    let back: TrafficRecord = serde_json::from_str(&line).unwrap();
    assert_eq!(back.timestamp, dataset.records()[0].timestamp);
    assert_eq!(back.decisions, Some(Decisions::new(true, false)));
    assert!(back.is_anomaly());
    assert_eq!(dataset.anomalies().len(), 1);
}

#[test]
fn test_apply_decisions_length_mismatch() {
    let mut dataset = generate(3, 42);
    let result = dataset.apply_decisions(&[Decisions::new(true, true)]);
    assert!(matches!(result, Err(DetectorError::InvalidConfiguration(_))));
    assert!(dataset.records().iter().all(|r| r.decisions.is_none()));
}

#[test]
fn test_decisions_flag_is_derived() {
    for (forest, regressor) in [(false, false), (false, true), (true, false), (true, true)] {
        let d = Decisions::new(forest, regressor);
        assert_eq!(d.anomaly_if(), forest);
        assert_eq!(d.anomaly_mlp(), regressor);
        assert_eq!(d.anomaly(), forest || regressor);
    }
}

#[test]
fn test_decisions_with_disagreeing_flags_rejected() {
    let inconsistent = r#"{"anomaly_if":0,"anomaly_mlp":0,"anomaly":1}"#;
    assert!(serde_json::from_str::<Decisions>(inconsistent).is_err());

    let stale_combined = r#"{"anomaly_if":1,"anomaly_mlp":0,"anomaly":0}"#;
    assert!(serde_json::from_str::<Decisions>(stale_combined).is_err());

    let consistent = r#"{"anomaly_if":0,"anomaly_mlp":1,"anomaly":1}"#;
    let d: Decisions = serde_json::from_str(consistent).unwrap();
    assert_eq!(d, Decisions::new(false, true));
    assert_eq!(serde_json::to_string(&d).unwrap(), consistent);
}

#[test]
fn test_log_line_with_disagreeing_flags_rejected() {
    let base = r#""timestamp":"2023-01-01T00:00:00Z","src_ip":"192.168.1.5","dst_ip":"192.168.1.9","data_size":1000.0,"is_attack":0"#;

    let bad = format!(r#"{{{base},"anomaly_if":0,"anomaly_mlp":0,"anomaly":1}}"#);
    assert!(serde_json::from_str::<TrafficRecord>(&bad).is_err());

    let partial = format!(r#"{{{base},"anomaly_if":1}}"#);
    assert!(serde_json::from_str::<TrafficRecord>(&partial).is_err());

    let undecided: TrafficRecord = serde_json::from_str(&format!("{{{base}}}")).unwrap();
    assert!(undecided.decisions.is_none());

    let good = format!(r#"{{{base},"anomaly_if":1,"anomaly_mlp":0,"anomaly":1}}"#);
    let record: TrafficRecord = serde_json::from_str(&good).unwrap();
    assert_eq!(record.decisions, Some(Decisions::new(true, false)));
    assert!(record.is_anomaly());
}
