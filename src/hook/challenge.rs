// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

use super::domain::{challenge_record_fqdn, challenge_record_name, normalize_domain, split_domain};
use crate::common::{Error, PropagationSettings};
use crate::kas::{DnsRecord, DnsSettings, NewDnsRecord, RecordId};
use crate::log::StringLogger;
use crate::propagation::{PropagationChecker, TxtLookup};
use std::time::Duration;
use tokio::time::Instant;

/// How often and how long to wait for a record to become visible.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PollPolicy {
    /// Pause between checks.
    pub interval: Duration,
    /// Overall deadline; `None` waits forever.
    pub timeout: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            timeout: None,
        }
    }
}

impl From<&PropagationSettings> for PollPolicy {
    fn from(settings: &PropagationSettings) -> Self {
        Self {
            interval: settings.interval(),
            timeout: settings.timeout(),
        }
    }
}

/// What `deploy_challenge` did.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DeployOutcome {
    /// A record was created and is publicly visible.
    Created {
        /// Id of the new record.
        record_id: RecordId,
        /// Number of propagation checks, including the successful one.
        checks: usize,
    },
    /// A record with the same name and token already existed.
    AlreadyPresent,
}

/// What `clean_challenge` did.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CleanOutcome {
    /// The record was deleted.
    Removed {
        /// Id of the deleted record.
        record_id: RecordId,
    },
    /// There was no record to delete.
    NotFound,
}

/// Deploys and cleans DNS-01 challenge records.
pub struct ChallengeHook<'a, D: ?Sized, L> {
    dns: &'a D,
    propagation: &'a PropagationChecker<L>,
    policy: PollPolicy,
    logger: StringLogger,
}

impl<'a, D, L> ChallengeHook<'a, D, L>
where
    D: DnsSettings + ?Sized,
    L: TxtLookup,
{
    /// Create a hook that edits records through `dns`.
    pub fn new(
        dns: &'a D,
        propagation: &'a PropagationChecker<L>,
        policy: PollPolicy,
        logger: StringLogger,
    ) -> Self {
        Self {
            dns,
            propagation,
            policy,
            logger,
        }
    }

    /// Create the TXT record for `domain` and wait until it is visible.
    pub async fn deploy_challenge(
        &self,
        domain: &str,
        challenge: &str,
        token: &str,
    ) -> Result<DeployOutcome, Error> {
        let (subdomain, zone) = split_domain(normalize_domain(domain))?;
        self.logger.trace(format!(" + Creating TXT record: {domain} => {token}"));
        self.logger.trace(format!(" + Challenge: {challenge}"));
        self.logger.trace(format!(" + Zone: {zone}"));

        let name = challenge_record_name(&subdomain);
        if let Some(existing) = self.find_record(&zone, &name).await? {
            if existing.record_data != token {
                return Err(Error::Conflict(format!(
                    "TXT record {name} already exists with different token."
                )));
            }
            self.logger.trace(" + TXT record exists, skipping creation.".to_string());
            return Ok(DeployOutcome::AlreadyPresent);
        }

        let record_id = self
            .dns
            .add_dns_settings(&NewDnsRecord::txt(&zone, &name, token))
            .await?;
        self.logger.trace(format!(" + TXT record added. (record_id: {record_id})"));

        let checks = self.poll(&challenge_record_fqdn(&name, &zone), token).await?;
        self.logger.trace(" + TXT record created.".to_string());
        Ok(DeployOutcome::Created { record_id, checks })
    }

    /// Delete the TXT record for `domain`, if it carries `token`.
    pub async fn clean_challenge(&self, domain: &str, token: &str) -> Result<CleanOutcome, Error> {
        let (subdomain, zone) = split_domain(normalize_domain(domain))?;
        self.logger.trace(format!(" + Removing TXT record: {domain} => {token}"));

        let name = challenge_record_name(&subdomain);
        let existing = match self.find_record(&zone, &name).await? {
            Some(existing) => existing,
            None => {
                self.logger.trace(" + No TXT record found.".to_string());
                return Ok(CleanOutcome::NotFound);
            }
        };
        if existing.record_data != token {
            return Err(Error::Conflict(format!(
                "TXT record {name} exists with different token."
            )));
        }
        self.dns.delete_dns_settings(&existing.record_id).await?;
        self.logger.trace(format!(
            " + TXT record removed. (record_id: {})",
            existing.record_id
        ));
        Ok(CleanOutcome::Removed {
            record_id: existing.record_id,
        })
    }

    async fn find_record(&self, zone: &str, name: &str) -> Result<Option<DnsRecord>, Error> {
        Ok(self
            .dns
            .get_dns_settings(zone)
            .await?
            .into_iter()
            .find(|record| record.record_name == name))
    }

    // Returns the number of checks it took.
    async fn poll(&self, fqdn: &str, token: &str) -> Result<usize, Error> {
        let started = Instant::now();
        let mut checks = 1;
        while !self.propagation.await_propagation(fqdn, token).await {
            if let Some(timeout) = self.policy.timeout {
                if started.elapsed() + self.policy.interval > timeout {
                    return Err(Error::Timeout(format!(
                        "{fqdn} not visible after {} checks",
                        checks
                    )));
                }
            }
            self.logger.trace(format!(
                " + DNS not propagated, waiting {}s...",
                self.policy.interval.as_secs()
            ));
            tokio::time::sleep(self.policy.interval).await;
            checks += 1;
        }
        Ok(checks)
    }
}
