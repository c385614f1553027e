//! Record schemas served by the directory.
//! Field names follow the camelCase JSON used by the configuration document
//! and by the remote directory service.

pub mod bandwidth;
pub mod subscriber;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use bandwidth::BandwidthProfileInfo;
pub use subscriber::{SubscriberAndDeviceInfo, UniTagInfo};

/// An 802.1Q VLAN identifier as carried in the JSON documents.
/// Values above 4095 other than [`VlanId::ANY`] are rejected on decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct VlanId(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VlanIdOutOfRange(pub u16);

impl fmt::Display for VlanIdOutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VLAN id {} out of range (0-4095 or 4096 for any)", self.0)
    }
}

impl std::error::Error for VlanIdOutOfRange {}

impl TryFrom<u16> for VlanId {
    type Error = VlanIdOutOfRange;

    fn try_from(vid: u16) -> Result<Self, Self::Error> {
        if vid > VlanId::MAX_VID && vid != VlanId::ANY.0 {
            return Err(VlanIdOutOfRange(vid));
        }
        Ok(VlanId(vid))
    }
}

impl From<VlanId> for u16 {
    fn from(vid: VlanId) -> Self {
        vid.0
    }
}

impl VlanId {
    /// "No VLAN assigned".
    pub const NO_VID: VlanId = VlanId(0);
    /// Wildcard used by match rules.
    pub const ANY: VlanId = VlanId(4096);
    /// Largest assignable identifier.
    pub const MAX_VID: u16 = 4095;

    pub fn is_none(self) -> bool {
        self == Self::NO_VID
    }
}

impl fmt::Display for VlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::NO_VID => write!(f, "None"),
            Self::ANY => write!(f, "Any"),
            VlanId(vid) => write!(f, "{vid}"),
        }
    }
}
