// # Endpoint
//
// The record type every source produces and the aggregator merges.
//
// An endpoint is one DNS name of one record type resolving to a set of
// targets. Sources attach labels (ownership, originating resource) and
// provider-specific properties that downstream registries interpret; the
// core treats both as opaque maps.
//
// ## Example
//
// ```rust
// use multisource_core::endpoint::{Endpoint, RecordType, Ttl};
//
// let ep = Endpoint::with_ttl("svc.example.com.", RecordType::A, Ttl(300), ["10.0.0.1"])
//     .with_set_identifier("blue")
//     .with_label("owner", "team-a");
//
// assert_eq!(ep.dns_name, "svc.example.com");
// ```

pub mod hostname;

pub use hostname::{endpoints_for_hostname, suitable_type};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Label key naming the owner of an endpoint
pub const OWNER_LABEL_KEY: &str = "owner";

/// Label key naming the resource an endpoint was generated from
pub const RESOURCE_LABEL_KEY: &str = "resource";

/// Arbitrary labels attached by the producing source
pub type Labels = BTreeMap<String, String>;

/// Provider-defined key/value metadata
pub type ProviderSpecific = BTreeMap<String, String>;

/// DNS record type of an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    /// IPv4 address record
    #[default]
    A,
    /// IPv6 address record
    Aaaa,
    /// Canonical name record
    Cname,
    /// Text record
    Txt,
    /// Service locator record
    Srv,
    /// Name server record
    Ns,
    /// Mail exchange record
    Mx,
    /// Pointer record
    Ptr,
}

impl RecordType {
    /// The DNS mnemonic for this record type
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Cname => "CNAME",
            RecordType::Txt => "TXT",
            RecordType::Srv => "SRV",
            RecordType::Ns => "NS",
            RecordType::Mx => "MX",
            RecordType::Ptr => "PTR",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "A" => Ok(RecordType::A),
            "AAAA" => Ok(RecordType::Aaaa),
            "CNAME" => Ok(RecordType::Cname),
            "TXT" => Ok(RecordType::Txt),
            "SRV" => Ok(RecordType::Srv),
            "NS" => Ok(RecordType::Ns),
            "MX" => Ok(RecordType::Mx),
            "PTR" => Ok(RecordType::Ptr),
            other => Err(crate::Error::invalid_input(format!(
                "Unknown record type: {}",
                other
            ))),
        }
    }
}

/// Time-to-live in seconds; zero means "not configured"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ttl(pub u32);

impl Ttl {
    /// Whether the source set an explicit TTL
    pub fn is_configured(&self) -> bool {
        self.0 > 0
    }
}

impl From<u32> for Ttl {
    fn from(secs: u32) -> Self {
        Ttl(secs)
    }
}

/// A DNS record produced by a source
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Endpoint {
    /// The name the record resolves
    pub dns_name: String,

    /// Target values, in the order the source produced them
    #[serde(default)]
    pub targets: Vec<String>,

    /// Record type
    #[serde(default)]
    pub record_type: RecordType,

    /// Distinguishes alternative records sharing one name (weighted, failover)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub set_identifier: String,

    /// Time-to-live
    #[serde(default)]
    pub record_ttl: Ttl,

    /// Labels attached by the producing source
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: Labels,

    /// Provider-specific metadata
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub provider_specific: ProviderSpecific,
}

impl Endpoint {
    /// Create an endpoint without a TTL
    pub fn new<I, T>(dns_name: impl Into<String>, record_type: RecordType, targets: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::with_ttl(dns_name, record_type, Ttl::default(), targets)
    }

    /// Create an endpoint with a TTL
    ///
    /// Trailing dots are stripped from the name and from every target.
    pub fn with_ttl<I, T>(
        dns_name: impl Into<String>,
        record_type: RecordType,
        ttl: Ttl,
        targets: I,
    ) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let targets = targets
            .into_iter()
            .map(|t| trim_trailing_dot(t.into()))
            .collect();

        Self {
            dns_name: trim_trailing_dot(dns_name.into()),
            targets,
            record_type,
            set_identifier: String::new(),
            record_ttl: ttl,
            labels: Labels::new(),
            provider_specific: ProviderSpecific::new(),
        }
    }

    /// Set the set identifier
    pub fn with_set_identifier(mut self, set_identifier: impl Into<String>) -> Self {
        self.set_identifier = set_identifier.into();
        self
    }

    /// Add a label
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Add a provider-specific property
    pub fn with_provider_specific(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.provider_specific.insert(key.into(), value.into());
        self
    }

    /// Look up a provider-specific property
    pub fn provider_specific_value(&self, key: &str) -> Option<&str> {
        self.provider_specific.get(key).map(String::as_str)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} IN {} {} [{}]",
            self.dns_name,
            self.record_ttl.0,
            self.record_type,
            self.set_identifier,
            self.targets.join(";")
        )
    }
}

fn trim_trailing_dot(mut value: String) -> String {
    if value.ends_with('.') {
        value.pop();
    }
    value
}
