// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use hyper::StatusCode;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
/// An enum that encapsulates the ways a challenge hook can fail.
///
/// # Example
///
/// Error::Conflict(format!("{name}: TXT record exists with different token"))
pub enum Error {
    /// The provider rejected the credentials.
    Auth(String),
    /// An existing record does not carry the expected token.
    Conflict(String),
    /// The provider response contains an unsupported or malformed node.
    Decode(String),
    /// DNS resolution failed (usually transient while a record propagates).
    Dns(String),
    /// HTTP transport error.
    Http(StatusCode, String),
    /// The provider answered, but reported failure.
    RemoteCall(String),
    /// Miscellaneous error.
    String(String),
    /// The record did not propagate before the configured deadline.
    Timeout(String),
    /// Malformed input such as a single-label domain or a missing variable.
    Validation(String),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Error::Auth(s) => write!(f, "authentication failed: {s}"),
            Error::Conflict(s) => write!(f, "conflict: {s}"),
            Error::Decode(s) => write!(f, "cannot decode response: {s}"),
            Error::Dns(s) => write!(f, "dns: {s}"),
            Error::Http(status_code, mesg) => write!(f, "{status_code}: {mesg}"),
            Error::RemoteCall(s) => write!(f, "remote call failed: {s}"),
            Error::String(s) => Display::fmt(&s, f),
            Error::Timeout(s) => write!(f, "timed out: {s}"),
            Error::Validation(s) => write!(f, "invalid input: {s}"),
        }
    }
}

impl std::error::Error for Error {}
