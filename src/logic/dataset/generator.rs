//! Synthetic Traffic Generator
//!
//! Sinh dữ liệu traffic giả lập: normal records + injected attack records.
//! All randomness comes from one seeded stream; only the attack timestamps
//! depend on the wall clock, which is passed in by the caller.

use std::f64::consts::PI;

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{Dataset, TrafficRecord};
use crate::constants::{ANOMALY_RECORD_COUNT, DEFAULT_RECORD_COUNT, DEFAULT_SEED};
use crate::error::{DetectorError, DetectorResult};

// ============================================================================
// CONSTANTS
// ============================================================================

/// 2023-01-01T00:00:00Z
pub const SYNTHETIC_EPOCH_SECS: i64 = 1_672_531_200;

const NORMAL_SUBNET: &str = "192.168.1.";
const ATTACKER_SRC_IP: &str = "10.0.0.100";
const TARGET_DST_IP: &str = "10.0.0.200";

const NORMAL_SIZE_MEAN: f64 = 1000.0;
const NORMAL_SIZE_STD: f64 = 100.0;
const ATTACK_SIZE_RANGE: std::ops::Range<i64> = 5000..10000;
const ATTACK_WINDOW_SECS: i64 = 300;

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Number of normal records (attack records are added on top)
    pub record_count: usize,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            record_count: DEFAULT_RECORD_COUNT,
            seed: DEFAULT_SEED,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> DetectorResult<()> {
        if self.record_count == 0 {
            return Err(DetectorError::invalid("record_count must be a positive integer"));
        }
        Ok(())
    }
}

// ============================================================================
// GENERATOR
// ============================================================================

pub struct TrafficGenerator {
    config: GeneratorConfig,
}

impl TrafficGenerator {
    pub fn new(config: GeneratorConfig) -> DetectorResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Build `record_count` normal records followed by the attack records.
    ///
    /// `now` anchors the attack timestamps, so the result is not sorted by time.
    pub fn generate(&self, now: DateTime<Utc>) -> DetectorResult<Dataset> {
        let n = self.config.record_count;
        let epoch = DateTime::<Utc>::from_timestamp(SYNTHETIC_EPOCH_SECS, 0)
            .ok_or_else(|| DetectorError::invalid("synthetic epoch out of range"))?;

        let mut rng = StdRng::seed_from_u64(self.config.seed);

        let src_ips: Vec<String> = (0..n).map(|_| random_host(&mut rng)).collect();
        let dst_ips: Vec<String> = (0..n).map(|_| random_host(&mut rng)).collect();
        let sizes: Vec<f64> = (0..n)
            .map(|_| NORMAL_SIZE_MEAN + NORMAL_SIZE_STD * standard_normal(&mut rng))
            .collect();

        let mut records = Vec::with_capacity(n + ANOMALY_RECORD_COUNT);
        for (i, ((src, dst), size)) in src_ips.into_iter().zip(dst_ips).zip(sizes).enumerate() {
            let timestamp = epoch + Duration::seconds(i as i64);
            records.push(TrafficRecord::new(timestamp, src, dst, size, false));
        }

        for _ in 0..ANOMALY_RECORD_COUNT {
            let offset = rng.gen_range(0..ATTACK_WINDOW_SECS);
            let size = rng.gen_range(ATTACK_SIZE_RANGE);
            records.push(TrafficRecord::new(
                now + Duration::seconds(offset),
                ATTACKER_SRC_IP,
                TARGET_DST_IP,
                size as f64,
                true,
            ));
        }

        log::info!(
            "Generated {} synthetic records ({} normal, {} injected)",
            records.len(),
            n,
            ANOMALY_RECORD_COUNT
        );

        Ok(Dataset::new(records))
    }
}

fn random_host(rng: &mut StdRng) -> String {
    format!("{}{}", NORMAL_SUBNET, rng.gen_range(1..255))
}

/// Box-Muller transform
fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}
