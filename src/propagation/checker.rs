// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

use crate::common::Error;
use crate::log::StringLogger;
use async_trait::async_trait;

/// The character-strings of one TXT record, as received.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TxtRecord(pub Vec<Vec<u8>>);

impl TxtRecord {
    /// A record holding the single character-string `text`.
    pub fn from_text(text: &str) -> Self {
        Self(vec![text.as_bytes().to_vec()])
    }

    /// Whether this record carries exactly `token`.
    ///
    /// Either one character-string equals `token`, or all of them joined do
    /// (values longer than 255 bytes are split across strings).
    pub fn matches(&self, token: &str) -> bool {
        let token = token.as_bytes();
        self.0.iter().any(|s| s.as_slice() == token) || self.0.concat() == token
    }
}

/// Answers TXT queries.
#[async_trait]
pub trait TxtLookup {
    /// All TXT records of `name`. Errors include NXDOMAIN and timeouts.
    async fn lookup_txt(&self, name: &str) -> Result<Vec<TxtRecord>, Error>;
}

/// Whether any of `records` carries exactly `token`.
pub fn txt_matches(records: &[TxtRecord], token: &str) -> bool {
    records.iter().any(|r| r.matches(token))
}

/// Checks whether a TXT record is publicly visible.
pub struct PropagationChecker<L> {
    lookup: L,
    logger: StringLogger,
}

impl<L: TxtLookup> PropagationChecker<L> {
    /// Create a checker that queries through `lookup`.
    pub fn new(lookup: L, logger: StringLogger) -> Self {
        Self { lookup, logger }
    }

    /// One check: `true` iff a TXT record of `fqdn` equals `token`.
    ///
    /// Resolution errors count as "not yet propagated"; they are logged and
    /// the caller decides whether to try again.
    pub async fn await_propagation(&self, fqdn: &str, token: &str) -> bool {
        match self.lookup.lookup_txt(fqdn).await {
            Ok(records) => txt_matches(&records, token),
            Err(e) => {
                self.logger.warn(format!(" + {e}. Retrying query..."));
                false
            }
        }
    }

    /// The underlying resolver.
    pub fn lookup(&self) -> &L {
        &self.lookup
    }
}
