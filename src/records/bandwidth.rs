//! Bandwidth (traffic-shaping) profile record.
//! Rates are in Kbps, burst sizes in Kbits.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::record::Record;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandwidthProfileInfo {
    pub id: String,
    #[serde(rename = "cir", default)]
    pub committed_information_rate: u64,
    #[serde(rename = "cbs", default)]
    pub committed_burst_size: Option<u64>,
    #[serde(rename = "pir", default)]
    pub peak_information_rate: u64,
    #[serde(rename = "pbs", default)]
    pub peak_burst_size: Option<u64>,
    #[serde(rename = "eir", default)]
    pub exceeded_information_rate: u64,
    #[serde(rename = "ebs", default)]
    pub exceeded_burst_size: Option<u64>,
    /// Superseded by `gir`; still read from older documents.
    #[serde(rename = "air", default)]
    pub assured_information_rate: u64,
    #[serde(rename = "gir", default)]
    pub guaranteed_information_rate: u64,
}

impl BandwidthProfileInfo {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            committed_information_rate: 0,
            committed_burst_size: None,
            peak_information_rate: 0,
            peak_burst_size: None,
            exceeded_information_rate: 0,
            exceeded_burst_size: None,
            assured_information_rate: 0,
            guaranteed_information_rate: 0,
        }
    }

    /// Profile is expressed with EIR/EBS rather than PIR/PBS.
    pub fn uses_excess_rate(&self) -> bool {
        self.peak_information_rate == 0 && self.peak_burst_size.is_none()
    }
}

impl Record for BandwidthProfileInfo {
    const KIND: &'static str = "bandwidth profile";

    fn id(&self) -> &str {
        &self.id
    }
}

struct Burst(Option<u64>);

impl fmt::Display for Burst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(size) => write!(f, "{size}"),
            None => f.write_str("none"),
        }
    }
}

impl fmt::Display for BandwidthProfileInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cir={} cbs={}",
            self.id,
            self.committed_information_rate,
            Burst(self.committed_burst_size)
        )?;
        if self.uses_excess_rate() {
            write!(
                f,
                " eir={} ebs={}",
                self.exceeded_information_rate,
                Burst(self.exceeded_burst_size)
            )?;
        } else {
            write!(
                f,
                " pir={} pbs={}",
                self.peak_information_rate,
                Burst(self.peak_burst_size)
            )?;
        }
        write!(
            f,
            " air={} gir={}",
            self.assured_information_rate, self.guaranteed_information_rate
        )
    }
}
