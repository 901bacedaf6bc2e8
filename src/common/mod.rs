// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

mod config;
/// An enum that encapsulates a variety of error types.
mod error;

pub use self::config::{
    HookConfig, HookConfigBuilder, HookSettings, KasCredentials, KasSettings,
    PropagationSettings, DEFAULT_CONFIG_FILE,
};
pub use self::error::Error;
