// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

#![warn(missing_docs)]
//! ACME DNS-01 challenge hook for the KAS API: creates and removes the
//! `_acme-challenge` TXT record and waits until public DNS serves it.

/// Types common to the whole hook: errors and configuration.
pub mod common;
pub use common::*;

/// Deploy and clean actions.
pub mod hook;
pub use hook::*;

/// A client of the KAS SOAP API.
pub mod kas;
pub use kas::*;

/// Thread-safe logging.
pub mod log;
pub use log::*;

/// Checks whether a record is publicly visible.
pub mod propagation;
pub use propagation::*;

/// Macros for wrapper tuples.
pub mod serde_utils;
