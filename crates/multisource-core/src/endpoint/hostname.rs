//! Build endpoints for a hostname from a mixed list of targets

use super::{Endpoint, ProviderSpecific, RecordType, Ttl, RESOURCE_LABEL_KEY};
use std::net::{Ipv4Addr, Ipv6Addr};

/// The record type a single target calls for
///
/// IPv4 literals map to `A`, IPv6 literals to `AAAA`, anything else is
/// treated as a hostname and maps to `CNAME`.
pub fn suitable_type(target: &str) -> RecordType {
    if target.parse::<Ipv4Addr>().is_ok() {
        RecordType::A
    } else if target.parse::<Ipv6Addr>().is_ok() {
        RecordType::Aaaa
    } else {
        RecordType::Cname
    }
}

/// Partition `targets` by record type and build one endpoint per type
///
/// Endpoints come out in the order A, AAAA, CNAME; types without targets
/// are skipped, so an empty target list yields no endpoints. Targets are
/// kept exactly as given, trailing dots included. Each endpoint gets `ttl`, a copy of `provider_specific` and `set_identifier`. When
/// `resource` is non-empty it is recorded under [`RESOURCE_LABEL_KEY`].
pub fn endpoints_for_hostname(
    hostname: &str,
    targets: &[String],
    ttl: Ttl,
    provider_specific: &ProviderSpecific,
    set_identifier: &str,
    resource: &str,
) -> Vec<Endpoint> {
    let mut a_targets = Vec::new();
    let mut aaaa_targets = Vec::new();
    let mut cname_targets = Vec::new();

    for target in targets {
        match suitable_type(target) {
            RecordType::A => a_targets.push(target.as_str()),
            RecordType::Aaaa => aaaa_targets.push(target.as_str()),
            _ => cname_targets.push(target.as_str()),
        }
    }

    [
        (RecordType::A, a_targets),
        (RecordType::Aaaa, aaaa_targets),
        (RecordType::Cname, cname_targets),
    ]
    .into_iter()
    .filter(|(_, grouped)| !grouped.is_empty())
    .map(|(record_type, grouped)| {
        let mut ep = Endpoint::with_ttl(hostname, record_type, ttl, Vec::<String>::new())
            .with_set_identifier(set_identifier);
        ep.targets = grouped.into_iter().map(str::to_string).collect();
        ep.provider_specific = provider_specific.clone();
        if !resource.is_empty() {
            ep.labels
                .insert(RESOURCE_LABEL_KEY.to_string(), resource.to_string());
        }
        ep
    })
    .collect()
}
