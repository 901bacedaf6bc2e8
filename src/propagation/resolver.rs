// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

use super::{TxtLookup, TxtRecord};
use crate::common::{Error, PropagationSettings};
use crate::log::StringLogger;
use async_trait::async_trait;
use hickory_resolver::config::{NameServerConfig, ResolverConfig, ResolverOpts};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::xfer::Protocol;
use hickory_resolver::{Resolver, TokioResolver};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// TXT lookups through hickory, without caching.
pub struct HickoryLookup {
    nameservers: Vec<IpAddr>,
    resolver: TokioResolver,
}

impl HickoryLookup {
    const DNS_PORT: u16 = 53;
    const ATTEMPTS: usize = 2;

    /// Query `nameservers`, or the system resolver if there are none.
    pub fn new(nameservers: Vec<IpAddr>, query_timeout: Duration) -> Result<Self, Error> {
        let mut opts = ResolverOpts::default();
        opts.timeout = query_timeout;
        opts.attempts = Self::ATTEMPTS;
        // Every check must reach the network.
        opts.cache_size = 0;

        let resolver = if nameservers.is_empty() {
            TokioResolver::builder_tokio()
                .map_err(|e| Error::Dns(format!("system resolver: {e}")))?
                .with_options(opts)
                .build()
        } else {
            let mut config = ResolverConfig::new();
            for ip in &nameservers {
                let addr = SocketAddr::new(*ip, Self::DNS_PORT);
                config.add_name_server(NameServerConfig::new(addr, Protocol::Udp));
                config.add_name_server(NameServerConfig::new(addr, Protocol::Tcp));
            }
            Resolver::builder_with_config(config, TokioConnectionProvider::default())
                .with_options(opts)
                .build()
        };
        Ok(Self {
            nameservers,
            resolver,
        })
    }

    /// Resolve the configured nameserver hostnames once, then build a lookup
    /// pinned to the addresses found. Falls back to the system resolver when
    /// none resolve.
    pub async fn from_settings(
        settings: &PropagationSettings,
        logger: &StringLogger,
    ) -> Result<Self, Error> {
        let nameservers = resolve_nameservers(&settings.nameservers, logger).await?;
        if nameservers.is_empty() {
            logger.trace(" + Using system resolver for propagation checks".to_string());
        } else {
            logger.trace(format!(" + Using nameservers {nameservers:?} for propagation checks"));
        }
        Self::new(nameservers, settings.query_timeout())
    }

    /// The pinned nameservers; empty when the system resolver is used.
    pub fn nameservers(&self) -> &[IpAddr] {
        &self.nameservers
    }
}

#[async_trait]
impl TxtLookup for HickoryLookup {
    async fn lookup_txt(&self, name: &str) -> Result<Vec<TxtRecord>, Error> {
        let lookup = self
            .resolver
            .txt_lookup(name)
            .await
            .map_err(|e| Error::Dns(format!("{name}: {e}")))?;
        Ok(lookup
            .iter()
            .map(|txt| TxtRecord(txt.txt_data().iter().map(|s| s.to_vec()).collect()))
            .collect())
    }
}

/// Look up the first A record of each of `hostnames` with the system
/// resolver. Hostnames that fail are logged and skipped.
pub async fn resolve_nameservers(
    hostnames: &[String],
    logger: &StringLogger,
) -> Result<Vec<IpAddr>, Error> {
    if hostnames.is_empty() {
        return Ok(Vec::new());
    }
    let resolver = TokioResolver::builder_tokio()
        .map_err(|e| Error::Dns(format!("system resolver: {e}")))?
        .build();
    let mut addresses = Vec::new();
    for hostname in hostnames {
        let result = resolver
            .ipv4_lookup(hostname.as_str())
            .await
            .map_err(|e| Error::Dns(e.to_string()))
            .and_then(|lookup| {
                lookup
                    .iter()
                    .next()
                    .map(|a| IpAddr::V4(a.0))
                    .ok_or_else(|| Error::Dns("no A record".to_string()))
            });
        if let Ok(ip) = logger.call(format!(" + Resolving nameserver {hostname}"), result) {
            addresses.push(ip);
        }
    }
    Ok(addresses)
}
