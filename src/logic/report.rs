//! Report Module - Human-readable detection output
//!
//! Renders the anomalous subset the way the results pane shows it, and
//! tallies a pass against the ground-truth label.

use std::fmt::Write;

use serde::Serialize;

use crate::logic::dataset::TrafficRecord;

const SEPARATOR: &str = "-----------------------------------";

/// Text report for one detection pass
pub fn render_report(anomalies: &[TrafficRecord]) -> String {
    if anomalies.is_empty() {
        return "No threats detected.".to_string();
    }

    let mut out = String::new();
    out.push_str("**Threat Detected!**\n\n");
    let _ = writeln!(out, "Total Anomalies Detected: {}\n", anomalies.len());
    out.push_str("Details of Detected Anomalies:\n");
    let _ = writeln!(out, "{SEPARATOR}");

    for record in anomalies {
        let _ = writeln!(out, "Timestamp: {}", record.timestamp.format("%Y-%m-%d %H:%M:%S"));
        let _ = writeln!(out, "Source IP: {}", record.src_ip);
        let _ = writeln!(out, "Destination IP: {}", record.dst_ip);
        let _ = writeln!(out, "Data Size: {} bytes", record.data_size);
        let _ = writeln!(out, "Is Attack: {}", if record.is_attack { "Yes" } else { "No" });
        let _ = writeln!(out, "{SEPARATOR}");
    }

    out
}

// ============================================================================
// SUMMARY
// ============================================================================

/// Counts for the current decisions against `is_attack`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DetectionSummary {
    pub total_records: usize,
    pub attacks: usize,
    pub flagged: usize,
    pub flagged_by_isolation: usize,
    pub flagged_by_mlp: usize,
    pub true_positives: usize,
    pub false_positives: usize,
    pub missed_attacks: usize,
}

impl DetectionSummary {
    /// Records without decisions count as not flagged
    pub fn from_records(records: &[TrafficRecord]) -> Self {
        let mut summary = Self {
            total_records: records.len(),
            ..Self::default()
        };

        for record in records {
            let flagged = record.is_anomaly();
            if let Some(d) = record.decisions {
                summary.flagged_by_isolation += usize::from(d.anomaly_if());
                summary.flagged_by_mlp += usize::from(d.anomaly_mlp());
            }
            summary.attacks += usize::from(record.is_attack);
            summary.flagged += usize::from(flagged);

            match (flagged, record.is_attack) {
                (true, true) => summary.true_positives += 1,
                (true, false) => summary.false_positives += 1,
                (false, true) => summary.missed_attacks += 1,
                (false, false) => {}
            }
        }

        summary
    }

    /// Share of attacks that were flagged
    pub fn recall(&self) -> f64 {
        if self.attacks == 0 {
            return 0.0;
        }
        self.true_positives as f64 / self.attacks as f64
    }
}

impl std::fmt::Display for DetectionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} records, {} flagged (isolation forest {}, mlp {}), {}/{} attacks caught, {} false positives",
            self.total_records,
            self.flagged,
            self.flagged_by_isolation,
            self.flagged_by_mlp,
            self.true_positives,
            self.attacks,
            self.false_positives
        )
    }
}
