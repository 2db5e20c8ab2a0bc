//! Target rewriting
//!
//! When override targets are configured, every collected endpoint is
//! replaced by endpoints for the same name pointing at the override list.

use crate::endpoint::{Endpoint, endpoints_for_hostname};

/// Rewrite one endpoint to point at `default_targets`
///
/// The endpoint's name, TTL, provider-specific metadata and set identifier
/// are the template; the override list is partitioned by record type, so
/// one input may produce several outputs. Labels are not part of the
/// template and are copied onto every output afterwards.
///
/// The endpoint's own targets are ignored: an endpoint without targets is
/// rewritten like any other.
pub fn rewrite_targets(endpoint: &Endpoint, default_targets: &[String]) -> Vec<Endpoint> {
    let mut rewritten = endpoints_for_hostname(
        &endpoint.dns_name,
        default_targets,
        endpoint.record_ttl,
        &endpoint.provider_specific,
        &endpoint.set_identifier,
        "",
    );

    for ep in &mut rewritten {
        ep.labels = endpoint.labels.clone();
    }

    rewritten
}

/// Rewrite a batch of endpoints, preserving input order
pub fn rewrite_all(endpoints: &[Endpoint], default_targets: &[String]) -> Vec<Endpoint> {
    endpoints
        .iter()
        .flat_map(|ep| rewrite_targets(ep, default_targets))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{RecordType, Ttl, RESOURCE_LABEL_KEY};

    #[test]
    fn test_labels_replace_generated_labels() {
        let original = Endpoint::new("web.example.com", RecordType::Cname, ["lb.example.net"])
            .with_label("owner", "cluster-a");

        let rewritten = rewrite_targets(&original, &["10.0.0.1".to_string()]);

        assert_eq!(rewritten.len(), 1);
        assert_eq!(rewritten[0].labels, original.labels);
        assert!(!rewritten[0].labels.contains_key(RESOURCE_LABEL_KEY));
        assert_eq!(rewritten[0].record_type, RecordType::A);
    }

    #[test]
    fn test_rewrite_all_keeps_input_order() {
        let endpoints = vec![
            Endpoint::with_ttl("a.example.com", RecordType::A, Ttl(10), ["1.1.1.1"]),
            Endpoint::with_ttl("b.example.com", RecordType::A, Ttl(20), ["2.2.2.2"]),
        ];
        let targets = vec!["10.0.0.1".to_string(), "2001:db8::1".to_string()];

        let rewritten = rewrite_all(&endpoints, &targets);

        let names: Vec<_> = rewritten.iter().map(|ep| ep.dns_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["a.example.com", "a.example.com", "b.example.com", "b.example.com"]
        );
        assert_eq!(rewritten[2].record_ttl, Ttl(20));
        assert_eq!(rewritten[3].record_type, RecordType::Aaaa);
    }
}
