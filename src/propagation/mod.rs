// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

/// Record matching and the single propagation check.
mod checker;
/// Hickory-backed TXT lookups.
mod resolver;

pub use self::checker::{txt_matches, PropagationChecker, TxtLookup, TxtRecord};
pub use self::resolver::{resolve_nameservers, HickoryLookup};
