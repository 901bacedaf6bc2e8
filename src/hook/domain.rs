// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

use crate::common::Error;

/// ACME challenge record name prefix.
pub const ACME_CHALLENGE_RECORD: &str = "_acme-challenge";

/// Strip a wildcard prefix and a trailing root dot.
pub fn normalize_domain(domain: &str) -> &str {
    let domain = domain.strip_prefix("*.").unwrap_or(domain);
    domain.strip_suffix('.').unwrap_or(domain)
}

/// Split `fqdn` into subdomain and zone, the zone being the last two labels.
///
/// Multi-label public suffixes such as `co.uk` are not recognized.
pub fn split_domain(fqdn: &str) -> Result<(String, String), Error> {
    let labels: Vec<&str> = fqdn.split('.').collect();
    if labels.len() < 2 {
        return Err(Error::Validation(format!(
            "{fqdn:?} needs at least two labels"
        )));
    }
    if labels.iter().any(|label| label.is_empty()) {
        return Err(Error::Validation(format!("{fqdn:?} has an empty label")));
    }
    let (subdomain, zone) = labels.split_at(labels.len() - 2);
    Ok((subdomain.join("."), zone.join(".")))
}

/// Name of the challenge record relative to its zone.
pub fn challenge_record_name(subdomain: &str) -> String {
    if subdomain.is_empty() {
        ACME_CHALLENGE_RECORD.to_string()
    } else {
        format!("{ACME_CHALLENGE_RECORD}.{subdomain}")
    }
}

/// Fully qualified, absolute name of the challenge record.
pub fn challenge_record_fqdn(record_name: &str, zone: &str) -> String {
    format!("{record_name}.{zone}.")
}
