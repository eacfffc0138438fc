//! `community_id` — computes the Community ID v1 flow hash.
//!
//! The hash covers the network 5-tuple (source/destination address and
//! port, transport protocol) so that both directions of a flow produce the
//! same identifier: endpoints are ordered canonically before hashing. For
//! ICMP, message type and code stand in for ports, with request/response
//! pairs mapped onto each other; unpaired types are treated as one-way.

use std::cmp::Ordering;
use std::net::IpAddr;

use base64::Engine as Base64Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::Deserialize;
use sha1::{Digest, Sha1};

use millrace_event::{Value, ValueKind};

use crate::error::{PipelineError, Result};
use crate::processor::{Processor, ProcessorEvent};

const PROTO_ICMP: u8 = 1;
const PROTO_TCP: u8 = 6;
const PROTO_UDP: u8 = 17;
const PROTO_ICMP6: u8 = 58;
const PROTO_SCTP: u8 = 132;

/// Configuration for the `community_id` processor. All fields default to
/// the conventional ECS paths.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CommunityIdConfig {
    pub source_ip: String,
    pub source_port: String,
    pub destination_ip: String,
    pub destination_port: String,

    /// Transport protocol name field (`tcp`, `udp`, ...). Takes precedence
    /// over `iana_number`.
    pub transport: String,

    /// Numeric IANA protocol field, used when `transport` is absent.
    pub iana_number: String,

    pub icmp_type: String,
    pub icmp_code: String,

    /// The field to assign the hash to.
    pub target_field: String,

    /// Hash seed, for operators running multiple flow monitoring systems.
    pub seed: u16,

    pub ignore_missing: bool,
    pub ignore_failure: bool,
}

impl Default for CommunityIdConfig {
    fn default() -> Self {
        CommunityIdConfig {
            source_ip: "source.ip".to_string(),
            source_port: "source.port".to_string(),
            destination_ip: "destination.ip".to_string(),
            destination_port: "destination.port".to_string(),
            transport: "network.transport".to_string(),
            iana_number: "network.iana_number".to_string(),
            icmp_type: "icmp.type".to_string(),
            icmp_code: "icmp.code".to_string(),
            target_field: "network.community_id".to_string(),
            seed: 0,
            ignore_missing: false,
            ignore_failure: false,
        }
    }
}

/// Computes the Community ID v1 flow hash and stores it on the event.
#[derive(Debug)]
pub struct CommunityId {
    config: CommunityIdConfig,
}

pub fn new(config: CommunityIdConfig) -> Result<CommunityId> {
    Ok(CommunityId { config })
}

impl Processor for CommunityId {
    fn process(&self, event: &mut ProcessorEvent) -> Result<()> {
        let saddr = ip_field(event, &self.config.source_ip)?;
        let daddr = ip_field(event, &self.config.destination_ip)?;
        let proto = self.protocol(event)?;

        let (ports, one_way) = match proto {
            PROTO_TCP | PROTO_UDP | PROTO_SCTP => {
                let sport = u16_field(event, &self.config.source_port)?;
                let dport = u16_field(event, &self.config.destination_port)?;
                (Some((sport, dport)), false)
            }
            PROTO_ICMP | PROTO_ICMP6 => match opt_u16_field(event, &self.config.icmp_type)? {
                Some(icmp_type) => {
                    let equivalent = if proto == PROTO_ICMP {
                        icmp_v4_equivalent(icmp_type)
                    } else {
                        icmp_v6_equivalent(icmp_type)
                    };
                    match equivalent {
                        Some(counter_type) => (Some((icmp_type, counter_type)), false),
                        None => {
                            let code =
                                opt_u16_field(event, &self.config.icmp_code)?.unwrap_or(0);
                            (Some((icmp_type, code)), true)
                        }
                    }
                }
                None => (None, false),
            },
            _ => (None, false),
        };

        let id = community_id_v1(self.config.seed, saddr, daddr, proto, ports, one_way);
        event.put(&self.config.target_field, Value::from(id))?;
        Ok(())
    }

    fn ignore_missing(&self) -> bool {
        self.config.ignore_missing
    }

    fn ignore_failure(&self) -> bool {
        self.config.ignore_failure
    }
}

impl CommunityId {
    fn protocol(&self, event: &ProcessorEvent) -> Result<u8> {
        if let Some(value) = event.get(&self.config.transport) {
            let name = value.as_str().ok_or_else(|| PipelineError::TypeMismatch {
                field: self.config.transport.clone(),
                expected: ValueKind::String.to_string(),
                actual: value.kind().to_string(),
            })?;
            return transport_number(name).ok_or_else(|| {
                PipelineError::Other(format!("unsupported transport protocol {name:?}"))
            });
        }

        if let Some(value) = event.get(&self.config.iana_number) {
            let number = match value {
                Value::Integer(_) | Value::UnsignedInteger(_) => value.as_i64(),
                Value::String(text) => text.parse::<i64>().ok(),
                _ => None,
            }
            .ok_or_else(|| PipelineError::TypeMismatch {
                field: self.config.iana_number.clone(),
                expected: ValueKind::Integer.to_string(),
                actual: value.kind().to_string(),
            })?;
            return u8::try_from(number).map_err(|_| {
                PipelineError::Other(format!("protocol number {number} out of range"))
            });
        }

        Err(PipelineError::KeyMissing {
            key: self.config.transport.clone(),
        })
    }
}

// =============================================================================
// Field readers
// =============================================================================

fn ip_field(event: &ProcessorEvent, field: &str) -> Result<IpAddr> {
    let value = event.get(field).ok_or_else(|| PipelineError::KeyMissing {
        key: field.to_string(),
    })?;
    let text = value.as_str().ok_or_else(|| PipelineError::TypeMismatch {
        field: field.to_string(),
        expected: ValueKind::String.to_string(),
        actual: value.kind().to_string(),
    })?;
    text.parse()
        .map_err(|_| PipelineError::Other(format!("invalid IP address {text:?} in <{field}>")))
}

fn u16_field(event: &ProcessorEvent, field: &str) -> Result<u16> {
    match opt_u16_field(event, field)? {
        Some(value) => Ok(value),
        None => Err(PipelineError::KeyMissing {
            key: field.to_string(),
        }),
    }
}

fn opt_u16_field(event: &ProcessorEvent, field: &str) -> Result<Option<u16>> {
    let Some(value) = event.get(field) else {
        return Ok(None);
    };
    let number = value.as_i64().ok_or_else(|| PipelineError::TypeMismatch {
        field: field.to_string(),
        expected: ValueKind::Integer.to_string(),
        actual: value.kind().to_string(),
    })?;
    u16::try_from(number)
        .map(Some)
        .map_err(|_| PipelineError::Other(format!("value {number} in <{field}> out of range")))
}

fn transport_number(name: &str) -> Option<u8> {
    if name.eq_ignore_ascii_case("icmp") {
        Some(PROTO_ICMP)
    } else if name.eq_ignore_ascii_case("tcp") {
        Some(PROTO_TCP)
    } else if name.eq_ignore_ascii_case("udp") {
        Some(PROTO_UDP)
    } else if name.eq_ignore_ascii_case("icmpv6") || name.eq_ignore_ascii_case("ipv6-icmp") {
        Some(PROTO_ICMP6)
    } else if name.eq_ignore_ascii_case("sctp") {
        Some(PROTO_SCTP)
    } else {
        None
    }
}

// =============================================================================
// Hashing
// =============================================================================

/// Maps an ICMP message type to its counter type, making request/response
/// pairs hash to the same flow.
fn icmp_v4_equivalent(icmp_type: u16) -> Option<u16> {
    match icmp_type {
        0 => Some(8),   // echo reply <-> echo
        8 => Some(0),
        9 => Some(10),  // router advertisement <-> solicitation
        10 => Some(9),
        13 => Some(14), // timestamp <-> timestamp reply
        14 => Some(13),
        15 => Some(16), // information request <-> reply
        16 => Some(15),
        17 => Some(18), // address mask request <-> reply
        18 => Some(17),
        _ => None,
    }
}

fn icmp_v6_equivalent(icmp_type: u16) -> Option<u16> {
    match icmp_type {
        128 => Some(129), // echo request <-> reply
        129 => Some(128),
        130 => Some(131), // MLD listener query <-> report
        131 => Some(130),
        133 => Some(134), // router solicitation <-> advertisement
        134 => Some(133),
        135 => Some(136), // neighbor solicitation <-> advertisement
        136 => Some(135),
        _ => None,
    }
}

fn community_id_v1(
    seed: u16,
    saddr: IpAddr,
    daddr: IpAddr,
    proto: u8,
    ports: Option<(u16, u16)>,
    one_way: bool,
) -> String {
    let mut a = addr_octets(saddr);
    let mut b = addr_octets(daddr);
    let mut ports = ports;

    // Canonical endpoint ordering; one-way flows keep their direction.
    let in_order = one_way
        || match a.cmp(&b) {
            Ordering::Less => true,
            Ordering::Greater => false,
            Ordering::Equal => ports.is_none_or(|(sport, dport)| sport <= dport),
        };
    if !in_order {
        std::mem::swap(&mut a, &mut b);
        ports = ports.map(|(sport, dport)| (dport, sport));
    }

    let mut hasher = Sha1::new();
    hasher.update(seed.to_be_bytes());
    hasher.update(&a);
    hasher.update(&b);
    hasher.update([proto, 0]);
    if let Some((sport, dport)) = ports {
        hasher.update(sport.to_be_bytes());
        hasher.update(dport.to_be_bytes());
    }

    format!("1:{}", BASE64_STANDARD.encode(hasher.finalize()))
}

fn addr_octets(addr: IpAddr) -> Vec<u8> {
    match addr {
        IpAddr::V4(v4) => v4.octets().to_vec(),
        IpAddr::V6(v6) => v6.octets().to_vec(),
    }
}
