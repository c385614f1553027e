//! Subscriber and access-device record.

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use super::VlanId;
use crate::record::Record;

const NO_VALUE: i32 = -1;

fn no_value() -> i32 {
    NO_VALUE
}

/// Per-subscriber (or per-OLT) provisioning data keyed by serial number or port name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberAndDeviceInfo {
    pub id: String,
    #[serde(default)]
    pub nas_port_id: String,
    #[serde(default = "no_value")]
    pub uplink_port: i32,
    #[serde(default = "no_value")]
    pub slot: i32,
    /// MAC address of the device, as written in the document.
    #[serde(default)]
    pub hardware_identifier: Option<String>,
    #[serde(default)]
    pub ip_address: Option<Ipv4Addr>,
    #[serde(default)]
    pub nas_id: String,
    #[serde(default)]
    pub circuit_id: String,
    #[serde(default)]
    pub remote_id: String,
    #[serde(default)]
    pub nni_dhcp_trap_vid: VlanId,
    #[serde(default)]
    pub uni_tag_list: Vec<UniTagInfo>,
}

impl SubscriberAndDeviceInfo {
    /// Bare record with every optional field at its default.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            nas_port_id: String::new(),
            uplink_port: NO_VALUE,
            slot: NO_VALUE,
            hardware_identifier: None,
            ip_address: None,
            nas_id: String::new(),
            circuit_id: String::new(),
            remote_id: String::new(),
            nni_dhcp_trap_vid: VlanId::NO_VID,
            uni_tag_list: Vec::new(),
        }
    }

    /// First service whose `serviceName` matches.
    pub fn service(&self, name: &str) -> Option<&UniTagInfo> {
        self.uni_tag_list.iter().find(|tag| tag.service_name == name)
    }
}

impl Record for SubscriberAndDeviceInfo {
    const KIND: &'static str = "subscriber";

    fn id(&self) -> &str {
        &self.id
    }
}

/// One service (VLAN pair plus QoS references) provisioned on a UNI port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "UniTagDocument")]
pub struct UniTagInfo {
    pub uni_tag_match: VlanId,
    pub pon_c_tag: VlanId,
    pub pon_s_tag: VlanId,
    pub us_pon_c_tag_priority: i32,
    pub us_pon_s_tag_priority: i32,
    pub ds_pon_c_tag_priority: i32,
    pub ds_pon_s_tag_priority: i32,
    pub technology_profile_id: i32,
    pub upstream_bandwidth_profile: Option<String>,
    pub downstream_bandwidth_profile: Option<String>,
    pub upstream_olt_bandwidth_profile: Option<String>,
    pub downstream_olt_bandwidth_profile: Option<String>,
    pub service_name: String,
    pub enable_mac_learning: bool,
    pub configured_mac_address: String,
    pub is_dhcp_required: bool,
    pub is_igmp_required: bool,
    pub is_pppoe_required: bool,
}

/// Wire shape of [`UniTagInfo`]; OLT profiles fall back to the ONU ones.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UniTagDocument {
    #[serde(default)]
    uni_tag_match: VlanId,
    #[serde(default)]
    pon_c_tag: VlanId,
    #[serde(default)]
    pon_s_tag: VlanId,
    #[serde(default = "no_value")]
    us_pon_c_tag_priority: i32,
    #[serde(default = "no_value")]
    us_pon_s_tag_priority: i32,
    #[serde(default = "no_value")]
    ds_pon_c_tag_priority: i32,
    #[serde(default = "no_value")]
    ds_pon_s_tag_priority: i32,
    #[serde(default = "no_value")]
    technology_profile_id: i32,
    #[serde(default)]
    upstream_bandwidth_profile: Option<String>,
    #[serde(default)]
    downstream_bandwidth_profile: Option<String>,
    #[serde(default)]
    upstream_olt_bandwidth_profile: Option<String>,
    #[serde(default)]
    downstream_olt_bandwidth_profile: Option<String>,
    #[serde(default)]
    service_name: String,
    #[serde(default)]
    enable_mac_learning: bool,
    #[serde(default)]
    configured_mac_address: String,
    #[serde(default)]
    is_dhcp_required: bool,
    #[serde(default)]
    is_igmp_required: bool,
    #[serde(default)]
    is_pppoe_required: bool,
}

impl From<UniTagDocument> for UniTagInfo {
    fn from(doc: UniTagDocument) -> Self {
        let upstream_olt_bandwidth_profile = doc
            .upstream_olt_bandwidth_profile
            .or_else(|| doc.upstream_bandwidth_profile.clone());
        let downstream_olt_bandwidth_profile = doc
            .downstream_olt_bandwidth_profile
            .or_else(|| doc.downstream_bandwidth_profile.clone());
        Self {
            uni_tag_match: doc.uni_tag_match,
            pon_c_tag: doc.pon_c_tag,
            pon_s_tag: doc.pon_s_tag,
            us_pon_c_tag_priority: doc.us_pon_c_tag_priority,
            us_pon_s_tag_priority: doc.us_pon_s_tag_priority,
            ds_pon_c_tag_priority: doc.ds_pon_c_tag_priority,
            ds_pon_s_tag_priority: doc.ds_pon_s_tag_priority,
            technology_profile_id: doc.technology_profile_id,
            upstream_bandwidth_profile: doc.upstream_bandwidth_profile,
            downstream_bandwidth_profile: doc.downstream_bandwidth_profile,
            upstream_olt_bandwidth_profile,
            downstream_olt_bandwidth_profile,
            service_name: doc.service_name,
            enable_mac_learning: doc.enable_mac_learning,
            configured_mac_address: doc.configured_mac_address,
            is_dhcp_required: doc.is_dhcp_required,
            is_igmp_required: doc.is_igmp_required,
            is_pppoe_required: doc.is_pppoe_required,
        }
    }
}
