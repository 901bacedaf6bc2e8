// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

use crate::common::{Error, KasCredentials};
use std::str::FromStr;

/// Hook actions a dehydrated-style ACME client sends.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum HookAction {
    /// `deploy_challenge`
    DeployChallenge,
    /// `clean_challenge`
    CleanChallenge,
    /// A known lifecycle action this hook has nothing to do for.
    Ignored(String),
}

impl HookAction {
    /// Lifecycle actions accepted as no-ops.
    pub const IGNORED: [&'static str; 9] = [
        "deploy_cert",
        "deploy_ocsp",
        "exit_hook",
        "generate_csr",
        "invalid_challenge",
        "request_failure",
        "startup_hook",
        "sync_cert",
        "unchanged_cert",
    ];

    /// Whether the action edits DNS records.
    pub fn needs_provider(&self) -> bool {
        !matches!(self, HookAction::Ignored(_))
    }

    /// Verb used in failure messages.
    pub fn verb(&self) -> &'static str {
        match self {
            HookAction::CleanChallenge => "clean",
            _ => "deploy",
        }
    }

    /// Line printed when the action fails for `domain`.
    pub fn failure(&self, domain: Option<&str>, error: &Error) -> String {
        match domain {
            Some(domain) => format!("Failed to {} challenge for {domain}: {error}", self.verb()),
            None => format!("Failed to {} challenge: {error}", self.verb()),
        }
    }
}

impl FromStr for HookAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deploy_challenge" => Ok(HookAction::DeployChallenge),
            "clean_challenge" => Ok(HookAction::CleanChallenge),
            _ if Self::IGNORED.contains(&s) => Ok(HookAction::Ignored(s.to_string())),
            _ => Err(Error::Validation(format!("Invalid hook action: {s}"))),
        }
    }
}

/// Arguments of `deploy_challenge` and `clean_challenge`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChallengeRequest {
    /// Domain being validated.
    pub domain: String,
    /// Challenge value (token file name); only logged.
    pub challenge: String,
    /// Content of the TXT record.
    pub token: String,
}

impl ChallengeRequest {
    /// Read `<domain> <challenge> <token>`; further arguments are ignored.
    pub fn from_args(args: &[String]) -> Result<Self, Error> {
        match args {
            [domain, challenge, token, ..] => Ok(Self {
                domain: domain.clone(),
                challenge: challenge.clone(),
                token: token.clone(),
            }),
            _ => Err(Error::Validation(format!(
                "expected <domain> <challenge> <token>, got {} argument(s)",
                args.len()
            ))),
        }
    }
}

/// What one command line asks for, checked before any network call.
#[derive(Debug)]
pub enum Invocation {
    /// A lifecycle action with nothing to do; exits successfully.
    Skip,
    /// Deploy or clean a record.
    Run {
        /// `DeployChallenge` or `CleanChallenge`.
        action: HookAction,
        /// Domain and token.
        request: ChallengeRequest,
        /// Provider login.
        credentials: KasCredentials,
    },
}

impl Invocation {
    /// Check `action` and `args`, then read credentials through `lookup`.
    ///
    /// `Err` holds the line to print before exiting with failure.
    pub fn parse(
        action: &str,
        args: &[String],
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, String> {
        let action: HookAction = action
            .parse()
            .map_err(|_| format!("Invalid hook action: {action}"))?;
        if !action.needs_provider() {
            return Ok(Invocation::Skip);
        }
        let request = ChallengeRequest::from_args(args).map_err(|e| action.failure(None, &e))?;
        let credentials = KasCredentials::from_lookup(lookup)
            .map_err(|e| action.failure(Some(&request.domain), &e))?;
        Ok(Invocation::Run {
            action,
            request,
            credentials,
        })
    }
}
