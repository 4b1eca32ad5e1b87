use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DetectorError;
use crate::logic::threat::combine;

/// Per-record outcome of one detection pass.
///
/// Only the two model flags are stored; `anomaly` is always their OR.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(into = "DecisionFlags", try_from = "DecisionFlags")]
pub struct Decisions {
    anomaly_if: bool,
    anomaly_mlp: bool,
}

impl Decisions {
    pub fn new(anomaly_if: bool, anomaly_mlp: bool) -> Self {
        Self {
            anomaly_if,
            anomaly_mlp,
        }
    }

    /// Flagged by the isolation forest
    pub fn anomaly_if(&self) -> bool {
        self.anomaly_if
    }

    /// Flagged by the MLP regressor
    pub fn anomaly_mlp(&self) -> bool {
        self.anomaly_mlp
    }

    pub fn anomaly(&self) -> bool {
        combine(self.anomaly_if, self.anomaly_mlp)
    }
}

/// Wire form of `Decisions`: all three flags as 0/1
#[derive(Serialize, Deserialize)]
struct DecisionFlags {
    #[serde(with = "binary_flag")]
    anomaly_if: bool,
    #[serde(with = "binary_flag")]
    anomaly_mlp: bool,
    #[serde(with = "binary_flag")]
    anomaly: bool,
}

impl From<Decisions> for DecisionFlags {
    fn from(d: Decisions) -> Self {
        Self {
            anomaly_if: d.anomaly_if,
            anomaly_mlp: d.anomaly_mlp,
            anomaly: d.anomaly(),
        }
    }
}

impl TryFrom<DecisionFlags> for Decisions {
    type Error = DetectorError;

    fn try_from(flags: DecisionFlags) -> Result<Self, Self::Error> {
        let decisions = Decisions::new(flags.anomaly_if, flags.anomaly_mlp);
        if decisions.anomaly() != flags.anomaly {
            return Err(DetectorError::invalid(format!(
                "anomaly={} disagrees with anomaly_if={} OR anomaly_mlp={}",
                u8::from(flags.anomaly),
                u8::from(flags.anomaly_if),
                u8::from(flags.anomaly_mlp)
            )));
        }
        Ok(decisions)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(into = "RecordRow", try_from = "RecordRow")]
pub struct TrafficRecord {
    pub timestamp: DateTime<Utc>,
    pub src_ip: String,
    pub dst_ip: String,
    pub data_size: f64,

    // Ground truth, synthetic only
    pub is_attack: bool,

    // Absent until a detection pass has run
    pub decisions: Option<Decisions>,
}

impl TrafficRecord {
    pub fn new(
        timestamp: DateTime<Utc>,
        src_ip: impl Into<String>,
        dst_ip: impl Into<String>,
        data_size: f64,
        is_attack: bool,
    ) -> Self {
        Self {
            timestamp,
            src_ip: src_ip.into(),
            dst_ip: dst_ip.into(),
            data_size,
            is_attack,
            decisions: None,
        }
    }

    pub fn is_anomaly(&self) -> bool {
        self.decisions.is_some_and(|d| d.anomaly())
    }

    pub fn to_jsonl(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Flat JSON line; the decision flags are all present or all absent
#[derive(Serialize, Deserialize)]
struct RecordRow {
    timestamp: DateTime<Utc>,
    src_ip: String,
    dst_ip: String,
    data_size: f64,
    #[serde(with = "binary_flag")]
    is_attack: bool,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "binary_flag::optional")]
    anomaly_if: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "binary_flag::optional")]
    anomaly_mlp: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "binary_flag::optional")]
    anomaly: Option<bool>,
}

impl From<TrafficRecord> for RecordRow {
    fn from(r: TrafficRecord) -> Self {
        Self {
            timestamp: r.timestamp,
            src_ip: r.src_ip,
            dst_ip: r.dst_ip,
            data_size: r.data_size,
            is_attack: r.is_attack,
            anomaly_if: r.decisions.map(|d| d.anomaly_if),
            anomaly_mlp: r.decisions.map(|d| d.anomaly_mlp),
            anomaly: r.decisions.map(|d| d.anomaly()),
        }
    }
}

impl TryFrom<RecordRow> for TrafficRecord {
    type Error = DetectorError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        let decisions = match (row.anomaly_if, row.anomaly_mlp, row.anomaly) {
            (None, None, None) => None,
            (Some(anomaly_if), Some(anomaly_mlp), Some(anomaly)) => Some(Decisions::try_from(
                DecisionFlags {
                    anomaly_if,
                    anomaly_mlp,
                    anomaly,
                },
            )?),
            _ => {
                return Err(DetectorError::invalid(
                    "decision flags must be all present or all absent",
                ))
            }
        };

        Ok(Self {
            timestamp: row.timestamp,
            src_ip: row.src_ip,
            dst_ip: row.dst_ip,
            data_size: row.data_size,
            is_attack: row.is_attack,
            decisions,
        })
    }
}

/// 0/1 integer encoding for boolean flags
mod binary_flag {
    use serde::de::{Error, Unexpected};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match u8::deserialize(deserializer)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(D::Error::invalid_value(
                Unexpected::Unsigned(other as u64),
                &"0 or 1",
            )),
        }
    }

    /// Single 0/1 value, for use inside other wrappers
    #[derive(Deserialize)]
    pub struct Flag(#[serde(deserialize_with = "deserialize")] pub bool);

    pub mod optional {
        use serde::{Deserialize, Deserializer, Serializer};

        use super::Flag;

        pub fn serialize<S: Serializer>(
            value: &Option<bool>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(flag) => super::serialize(flag, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<bool>, D::Error> {
            Ok(Option::<Flag>::deserialize(deserializer)?.map(|Flag(flag)| flag))
        }
    }
}
