// # Record Model
//
// Three shapes of the same DNS record:
//
// - `Record`: the declarative view. `name` is the bare subdomain, `id` is
//   whatever the store assigned (if anything).
// - `RecordPayload`: what is sent to the store on create/edit. No id,
//   defaults applied.
// - `RemoteRecord`: what the store lists back. `name` is fully qualified.
//
// `normalize_name` is the bridge between the last two.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Smallest TTL the store accepts, in seconds
pub const MIN_TTL: u32 = 600;

/// TTL sent when the record leaves it unset
pub const DEFAULT_TTL: &str = "600";

/// Priority sent when the record leaves it unset
pub const DEFAULT_PRIO: &str = "0";

/// A managed DNS record in its declarative form
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Record {
    /// Store-assigned identifier; `None` until created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Parent zone
    pub domain: String,

    /// Subdomain label relative to `domain`; empty for the apex
    #[serde(default)]
    pub name: String,

    /// DNS record type (A, AAAA, CNAME, MX, TXT, ...)
    #[serde(rename = "type")]
    pub record_type: String,

    /// Record value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Time-to-live in seconds, string encoded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<String>,

    /// Priority, string encoded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prio: Option<String>,

    /// Free-text annotation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Record {
    /// Create a record with the required coordinates
    pub fn new(
        domain: impl Into<String>,
        name: impl Into<String>,
        record_type: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            name: name.into(),
            record_type: record_type.into(),
            ..Self::default()
        }
    }

    /// Set the record content
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: impl Into<String>) -> Self {
        self.ttl = Some(ttl.into());
        self
    }

    /// Set the priority
    pub fn with_prio(mut self, prio: impl Into<String>) -> Self {
        self.prio = Some(prio.into());
        self
    }

    /// Set the notes
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Set the store identifier
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Check everything that can be checked without talking to the store
    pub fn validate(&self) -> Result<()> {
        if self.domain.is_empty() {
            return Err(Error::invalid_input("domain cannot be empty"));
        }

        if self.record_type.is_empty() {
            return Err(Error::invalid_input("type cannot be empty"));
        }

        if let Some(ttl) = &self.ttl {
            validate_ttl(ttl)?;
        }

        Ok(())
    }

    /// Parse the held identifier into the store's numeric form
    pub fn numeric_id(&self) -> Result<u64> {
        match &self.id {
            Some(id) => parse_record_id(id),
            None => Err(Error::invalid_input("record has no id")),
        }
    }

    /// Build the wire payload (everything except the id)
    pub fn to_payload(&self) -> RecordPayload {
        RecordPayload {
            name: self.name.clone(),
            record_type: self.record_type.clone(),
            content: self.content.clone().unwrap_or_default(),
            ttl: self.ttl.clone().unwrap_or_else(|| DEFAULT_TTL.to_string()),
            prio: self.prio.clone().unwrap_or_else(|| DEFAULT_PRIO.to_string()),
            notes: self.notes.clone().unwrap_or_default(),
        }
    }

    /// Overwrite the observable fields with the authoritative remote copy
    pub fn refresh_from(&mut self, remote: &RemoteRecord) {
        self.name = normalize_name(&remote.name, &self.domain);
        self.record_type = remote.record_type.clone();
        self.content = Some(remote.content.clone());
        // null ttl or prio reads back as unset
        self.ttl = non_empty(&remote.ttl);
        self.prio = non_empty(&remote.prio);
        self.notes = Some(remote.notes.clone());
    }
}

/// Record fields as sent to the store on create and edit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordPayload {
    /// Bare subdomain; the store qualifies it
    pub name: String,
    /// DNS record type
    #[serde(rename = "type")]
    pub record_type: String,
    /// Record value
    pub content: String,
    /// TTL in seconds
    pub ttl: String,
    /// Priority
    pub prio: String,
    /// Notes
    pub notes: String,
}

/// A record as listed by the store
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RemoteRecord {
    /// Store identifier, string encoded
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Fully-qualified name
    pub name: String,
    /// DNS record type
    #[serde(rename = "type")]
    pub record_type: String,
    /// Record value
    #[serde(default, deserialize_with = "string_or_null")]
    pub content: String,
    /// TTL in seconds
    #[serde(default, deserialize_with = "string_or_number_or_null")]
    pub ttl: String,
    /// Priority
    #[serde(default, deserialize_with = "string_or_number_or_null")]
    pub prio: String,
    /// Notes
    #[serde(default, deserialize_with = "string_or_null")]
    pub notes: String,
}

/// Recover the bare subdomain from the fully-qualified name the store returns
///
/// `"foo.example.com"` under `"example.com"` is `"foo"`, the apex is `""`.
/// A name that does not end in the domain is returned as is. The domain is
/// matched ignoring ASCII case.
pub fn normalize_name(fqdn: &str, domain: &str) -> String {
    if fqdn.eq_ignore_ascii_case(domain) {
        return String::new();
    }

    let Some(dot) = fqdn.len().checked_sub(domain.len() + 1) else {
        return fqdn.to_string();
    };

    match (fqdn.get(..dot), fqdn.get(dot..)) {
        (Some(label), Some(rest))
            if rest.starts_with('.') && rest[1..].eq_ignore_ascii_case(domain) =>
        {
            label.to_string()
        }
        _ => fqdn.to_string(),
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Parse an identifier held in state into the store's numeric form
pub fn parse_record_id(id: &str) -> Result<u64> {
    id.trim()
        .parse::<u64>()
        .map_err(|e| Error::invalid_input(format!("record id '{}' is not numeric: {}", id, e)))
}

/// Reject TTLs the store would refuse
pub fn validate_ttl(ttl: &str) -> Result<u32> {
    let value: u32 = ttl
        .trim()
        .parse()
        .map_err(|e| Error::invalid_input(format!("invalid value for ttl '{}': {}", ttl, e)))?;

    if value < MIN_TTL {
        return Err(Error::invalid_input(format!(
            "provided ttl {} is less than {}",
            value, MIN_TTL
        )));
    }

    Ok(value)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Str(String),
    Int(i64),
}

fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    Ok(match Scalar::deserialize(d)? {
        Scalar::Str(s) => s,
        Scalar::Int(n) => n.to_string(),
    })
}

fn string_or_number_or_null<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<String, D::Error> {
    Ok(match Option::<Scalar>::deserialize(d)? {
        Some(Scalar::Str(s)) => s,
        Some(Scalar::Int(n)) => n.to_string(),
        None => String::new(),
    })
}

fn string_or_null<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}
