// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

use super::Value;
use crate::common::Error;
use crate::impl_wrapper_str;
use serde::Serialize;

/// Provider-assigned identity of a record.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Serialize)]
pub struct RecordId(pub String);
impl_wrapper_str!(RecordId);

/// A DNS record as listed by the provider.
#[derive(Clone, Debug, PartialEq)]
pub struct DnsRecord {
    /// Provider-assigned identity.
    pub record_id: RecordId,
    /// Name relative to the zone, e.g. `_acme-challenge.foo`.
    pub record_name: String,
    /// `TXT`, `A`, etc.
    pub record_type: String,
    /// Record content.
    pub record_data: String,
    /// Zone the record belongs to.
    pub zone_host: String,
    /// Priority field (MX); 0 otherwise.
    pub aux: u32,
}

impl DnsRecord {
    /// Read a record from one entry of the `get_dns_settings` reply.
    pub fn from_value(value: &Value) -> Result<Self, Error> {
        let text = |key: &str| -> Result<String, Error> {
            value
                .get(key)
                .and_then(Value::to_text)
                .ok_or_else(|| Error::Decode(format!("dns record without {key}: {value:?}")))
        };
        let optional_text = |key: &str| value.get(key).and_then(Value::to_text);
        let aux = match value.get("record_aux") {
            None | Some(Value::Null) => 0,
            Some(aux) => aux
                .as_f64()
                .filter(|n| *n >= 0.0 && n.fract() == 0.0 && *n <= u32::MAX as f64)
                .map(|n| n as u32)
                .ok_or_else(|| Error::Decode(format!("invalid record_aux {aux:?}")))?,
        };
        Ok(Self {
            record_id: RecordId(text("record_id")?),
            record_name: text("record_name")?,
            record_type: text("record_type")?,
            // An empty TXT record is sent as nil.
            record_data: optional_text("record_data").unwrap_or_default(),
            zone_host: optional_text("record_zone")
                .or_else(|| optional_text("zone_host"))
                .unwrap_or_default(),
            aux,
        })
    }

    /// Read all records of a `get_dns_settings` reply.
    pub fn list_from_value(value: &Value) -> Result<Vec<Self>, Error> {
        match value {
            Value::List(list) => list.iter().map(Self::from_value).collect(),
            Value::Null => Ok(Vec::new()),
            other => Err(Error::Decode(format!("expected a list of records, got {other:?}"))),
        }
    }
}

/// Parameters of `add_dns_settings`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewDnsRecord {
    /// Zone, with trailing dot.
    pub zone_host: String,
    /// `TXT`, `A`, etc.
    pub record_type: String,
    /// Name relative to the zone.
    pub record_name: String,
    /// Record content.
    pub record_data: String,
    /// Priority field, sent as text.
    #[serde(rename = "record_aux")]
    pub aux: String,
}

impl NewDnsRecord {
    /// A TXT record `name` in `zone` (without trailing dot) holding `data`.
    pub fn txt(zone: &str, name: &str, data: &str) -> Self {
        Self {
            zone_host: format!("{zone}."),
            record_type: "TXT".to_string(),
            record_name: name.to_string(),
            record_data: data.to_string(),
            aux: "0".to_string(),
        }
    }
}
