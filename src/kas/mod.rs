// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

/// Session handling and record operations.
mod client;
/// Records as listed and created by the provider.
mod record;
/// SOAP envelopes.
pub(crate) mod soap;
/// Unit tests
mod tests;
/// Typed response tree.
mod value;
/// XML element tree.
mod xml;

pub use self::client::{Credential, DnsSettings, KasClient, SessionToken};
pub use self::record::{DnsRecord, NewDnsRecord, RecordId};
pub use self::soap::{parse_reply, request_envelope, SoapReply, API_NAMESPACE, AUTH_NAMESPACE};
pub use self::value::Value;
pub use self::xml::{parse_xml, XmlElement};
