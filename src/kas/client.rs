// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

use super::soap::{parse_reply, request_envelope, SoapReply, API_NAMESPACE, AUTH_NAMESPACE};
use super::{DnsRecord, NewDnsRecord, RecordId, Value};
use crate::common::{Error, KasCredentials, KasSettings};
use crate::impl_wrapper_str;
use async_trait::async_trait;
use hyper::{http::HeaderValue, HeaderMap, StatusCode};
use reqwest::Client;
use serde::Serialize;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Record operations offered by the provider.
#[async_trait]
pub trait DnsSettings {
    /// List all records of `zone_host`.
    async fn get_dns_settings(&self, zone_host: &str) -> Result<Vec<DnsRecord>, Error>;

    /// Create a record, returning its id.
    async fn add_dns_settings(&self, record: &NewDnsRecord) -> Result<RecordId, Error>;

    /// Delete a record by id.
    async fn delete_dns_settings(&self, record_id: &RecordId) -> Result<(), Error>;
}

/// Session token returned by the provider.
#[derive(Clone, Default, Eq, PartialEq, Serialize)]
pub struct SessionToken(pub String);
impl_wrapper_str!(SessionToken);

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

/// Authenticated session. Obtained once and reused until the process exits.
#[derive(Clone, Debug)]
pub struct Credential {
    /// KAS login.
    pub username: String,
    /// Token sent with every call.
    pub session_token: SessionToken,
    /// Requested lifetime; renewed by the provider on every call.
    pub lifetime: Duration,
}

/// Client of the KAS SOAP API.
pub struct KasClient {
    api_url: String,
    client: Client,
    credential: Credential,
    // Earliest instant the provider accepts the next call.
    next_call: Mutex<Option<Instant>>,
}

impl KasClient {
    const USER_AGENT: &'static str = "kas-acme-hook";
    /// Longest pause honored between two calls.
    pub const MAX_FLOOD_DELAY: Duration = Duration::from_secs(60);

    fn build_http_client(settings: &KasSettings) -> Result<Client, Error> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            reqwest::header::CONTENT_TYPE,
            HeaderValue::from_static("text/xml; charset=utf-8"),
        );
        default_headers.insert(
            reqwest::header::USER_AGENT,
            HeaderValue::from_static(Self::USER_AGENT),
        );
        Client::builder()
            .timeout(settings.timeout())
            .default_headers(default_headers)
            .build()
            .map_err(Self::map_error)
    }

    /// Create a session with `credentials`.
    pub async fn authenticate(
        settings: &KasSettings,
        credentials: &KasCredentials,
    ) -> Result<Self, Error> {
        #[derive(Serialize)]
        struct AuthParams<'a> {
            kas_login: &'a str,
            kas_auth_type: &'a str,
            kas_auth_data: &'a str,
            session_lifetime: u64,
            session_update_lifetime: &'a str,
        }
        let client = Self::build_http_client(settings)?;
        let params = serde_json::to_string(&AuthParams {
            kas_login: &credentials.username,
            kas_auth_type: "plain",
            kas_auth_data: &credentials.password,
            session_lifetime: settings.session_lifetime,
            session_update_lifetime: "Y",
        })
        .map_err(|e| Error::String(format!("json: {e}")))?;

        let body = request_envelope(AUTH_NAMESPACE, "KasAuth", &params);
        let text = Self::post(&client, &settings.auth_url, AUTH_NAMESPACE, "KasAuth", body).await?;
        let session_token = match parse_reply(&text)? {
            SoapReply::Fault(fault) => return Err(Error::Auth(fault)),
            SoapReply::Return(ret) => match Value::decode(&ret)? {
                Value::String(token) if !token.is_empty() => SessionToken(token),
                other => {
                    return Err(Error::Auth(format!("unexpected session token {other:?}")))
                }
            },
        };

        Ok(Self {
            api_url: settings.api_url.clone(),
            client,
            credential: Credential {
                username: credentials.username.clone(),
                session_token,
                lifetime: Duration::from_secs(settings.session_lifetime),
            },
            next_call: Mutex::new(None),
        })
    }

    /// The session in use.
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Call `action` with `params` and return the `ReturnInfo` of the reply.
    pub async fn call<P: Serialize + ?Sized>(&self, action: &str, params: &P) -> Result<Value, Error> {
        #[derive(Serialize)]
        struct ApiParams<'a, P: Serialize + ?Sized> {
            kas_login: &'a str,
            kas_auth_type: &'a str,
            kas_auth_data: &'a str,
            kas_action: &'a str,
            #[serde(rename = "KasRequestParams")]
            params: &'a P,
        }
        let params = serde_json::to_string(&ApiParams {
            kas_login: &self.credential.username,
            kas_auth_type: "session",
            kas_auth_data: self.credential.session_token.as_str(),
            kas_action: action,
            params,
        })
        .map_err(|e| Error::String(format!("json: {e}")))?;

        self.wait_for_flood_delay().await;
        let body = request_envelope(API_NAMESPACE, "KasApi", &params);
        let text = Self::post(&self.client, &self.api_url, API_NAMESPACE, "KasApi", body).await?;
        let ret = match parse_reply(&text)? {
            SoapReply::Fault(fault) => {
                return Err(Error::RemoteCall(format!("{action}: {fault}")));
            }
            SoapReply::Return(ret) => ret,
        };
        let decoded = Value::decode_pairs(ret.children())?;
        let response = decoded
            .get("Response")
            .ok_or_else(|| Error::RemoteCall(format!("{action}: no Response in {decoded:?}")))?;

        if let Some(delay) = response.get("KasFloodDelay").and_then(Value::as_f64) {
            self.set_flood_delay(delay);
        }

        if response.get("ReturnString").and_then(Value::as_str) != Some("TRUE") {
            return Err(Error::RemoteCall(format!("{action}: {response:?}")));
        }
        Ok(response.get("ReturnInfo").cloned().unwrap_or(Value::Null))
    }

    async fn post(
        client: &Client,
        url: &str,
        namespace: &str,
        method: &str,
        body: String,
    ) -> Result<String, Error> {
        let response = client
            .post(url)
            .header("SOAPAction", format!("{namespace}#{method}"))
            .body(body)
            .send()
            .await
            .map_err(Self::map_error)?;
        let status = response.status();
        let text = response.text().await.map_err(Self::map_error)?;
        // Faults arrive with status 500 and are decoded by the caller.
        if !status.is_success() && !text.contains("Fault>") {
            return Err(Error::Http(status, text));
        }
        Ok(text)
    }

    /// Pause the provider asks for after a call, capped at `MAX_FLOOD_DELAY`.
    /// `None` for zero, negative or non-numeric values.
    pub fn flood_delay(delay_secs: f64) -> Option<Duration> {
        if delay_secs.is_nan() || delay_secs <= 0.0 {
            return None;
        }
        let delay = Duration::try_from_secs_f64(delay_secs).unwrap_or(Self::MAX_FLOOD_DELAY);
        Some(delay.min(Self::MAX_FLOOD_DELAY))
    }

    fn set_flood_delay(&self, delay_secs: f64) {
        let Some(deadline) =
            Self::flood_delay(delay_secs).and_then(|delay| Instant::now().checked_add(delay))
        else {
            return;
        };
        if let Ok(mut next_call) = self.next_call.lock() {
            *next_call = Some(deadline);
        }
    }

    async fn wait_for_flood_delay(&self) {
        let next_call = self.next_call.lock().ok().and_then(|mut n| n.take());
        if let Some(next_call) = next_call {
            tokio::time::sleep_until(next_call).await;
        }
    }

    fn map_error(e: reqwest::Error) -> Error {
        let status = e.status().unwrap_or(StatusCode::FAILED_DEPENDENCY);
        Error::Http(status, format!("{e}"))
    }
}

#[async_trait]
impl DnsSettings for KasClient {
    async fn get_dns_settings(&self, zone_host: &str) -> Result<Vec<DnsRecord>, Error> {
        #[derive(Serialize)]
        struct Params<'a> {
            zone_host: &'a str,
        }
        let info = self.call("get_dns_settings", &Params { zone_host }).await?;
        DnsRecord::list_from_value(&info)
    }

    async fn add_dns_settings(&self, record: &NewDnsRecord) -> Result<RecordId, Error> {
        let info = self.call("add_dns_settings", record).await?;
        info.to_text()
            .map(RecordId)
            .ok_or_else(|| Error::Decode(format!("add_dns_settings returned {info:?}")))
    }

    async fn delete_dns_settings(&self, record_id: &RecordId) -> Result<(), Error> {
        #[derive(Serialize)]
        struct Params<'a> {
            record_id: &'a RecordId,
        }
        self.call("delete_dns_settings", &Params { record_id }).await?;
        Ok(())
    }
}
