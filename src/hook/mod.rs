// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

/// Command line actions.
mod action;
/// Deploy and clean.
mod challenge;
/// Domain splitting and record names.
mod domain;

pub use self::action::{ChallengeRequest, HookAction, Invocation};
pub use self::challenge::{ChallengeHook, CleanOutcome, DeployOutcome, PollPolicy};
pub use self::domain::{
    challenge_record_fqdn, challenge_record_name, normalize_domain, split_domain,
    ACME_CHALLENGE_RECORD,
};
