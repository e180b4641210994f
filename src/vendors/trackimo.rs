use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{GatewayError, Result};
use crate::models::trackimo::{
    AccountInfo, DeviceCommand, OAuthCode, TokenResponse, TrackimoDeviceDetails,
    TrackimoDeviceSummary, TrackimoFix,
};

const OAUTH_REDIRECT: &str = "https://app.trackimo.com/api/internal/v1/oauth_redirect";
const OAUTH_SCOPE: &str = "locations,notifications,devices,accounts,settings,geozones";

#[derive(Clone, Deserialize)]
pub struct TrackimoCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
}

#[derive(Clone, Deserialize)]
pub struct TrackimoRefresh {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

/// Bearer token plus the account it belongs to. Fixed for the life of a
/// connection.
#[derive(Debug, Clone, Serialize)]
pub struct TrackimoSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires: Option<DateTime<Utc>>,
    pub account_id: i64,
}

/// Trackimo REST operations used by the gateway. Each call is one round trip.
#[async_trait]
pub trait TrackimoApi: Send + Sync {
    async fn login(&self, credentials: &TrackimoCredentials) -> Result<TrackimoSession>;

    async fn refresh(&self, refresh: &TrackimoRefresh) -> Result<TrackimoSession>;

    async fn device_page(
        &self,
        session: &TrackimoSession,
        page: u32,
        limit: u32,
    ) -> Result<Vec<TrackimoDeviceSummary>>;

    async fn device_details(
        &self,
        session: &TrackimoSession,
        device_id: i64,
    ) -> Result<TrackimoDeviceDetails>;

    /// Latest fix of every listed device, one entry per device that has one.
    async fn latest_fixes(
        &self,
        session: &TrackimoSession,
        device_ids: &[i64],
    ) -> Result<Vec<TrackimoFix>>;

    async fn location(&self, session: &TrackimoSession, device_id: i64)
        -> Result<Option<TrackimoFix>>;

    async fn history(
        &self,
        session: &TrackimoSession,
        device_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<TrackimoFix>>;

    async fn command(
        &self,
        session: &TrackimoSession,
        device_id: i64,
        command: DeviceCommand,
    ) -> Result<()>;
}

/// reqwest-backed client for `app.trackimo.com`.
pub struct HttpTrackimoClient {
    http: Client,
    timeout: Duration,
    api_url: String,
    internal_url: String,
    login_url: String,
}

impl HttpTrackimoClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            timeout,
            api_url: format!("{}/api/v3", base_url),
            internal_url: format!("{}/api/internal/v1", base_url),
            login_url: format!("{}/api/internal/v2/user/login", base_url),
        })
    }

    fn account_url(&self, session: &TrackimoSession, path: &str) -> String {
        format!("{}/accounts/{}/{}", self.api_url, session.account_id, path)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        session: &TrackimoSession,
        url: &str,
        query: &[(&str, String)],
        what: &str,
    ) -> Result<T> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&session.access_token)
            .query(query)
            .send()
            .await?;
        read_json(response, what).await
    }

    async fn session_from_token(
        &self,
        token: TokenResponse,
        fallback_refresh: Option<&str>,
    ) -> Result<TrackimoSession> {
        let account: AccountInfo = {
            let response = self
                .http
                .get(format!("{}/users/me", self.internal_url))
                .bearer_auth(&token.access_token)
                .send()
                .await?;
            read_json(response, "account lookup").await?
        };

        Ok(TrackimoSession {
            access_token: token.access_token,
            refresh_token: token
                .refresh_token
                .or_else(|| fallback_refresh.map(str::to_string)),
            expires: token
                .expires_in
                .map(|ms| Utc::now() + ChronoDuration::milliseconds(ms as i64)),
            account_id: account.account_id,
        })
    }
}

async fn check_status(response: Response, what: &str) -> Result<String> {
    let status = response.status();
    let body = response.text().await?;
    classify_status(status, body, what)
}

async fn read_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    let body = check_status(response, what).await?;
    decode_body(&body, what)
}

/// Maps vendor status codes onto the gateway's error kinds and returns the body.
fn classify_status(status: StatusCode, body: String, what: &str) -> Result<String> {
    match status {
        s if s.is_success() => Ok(body),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            warn!("Trackimo rejected {}: {}", what, status);
            Err(GatewayError::Auth(format!("trackimo rejected {} ({})", what, status)))
        }
        StatusCode::NOT_FOUND => Err(GatewayError::NotFound(format!("trackimo {} not found", what))),
        _ => {
            warn!("Trackimo {} failed: {} - {}", what, status, body);
            Err(GatewayError::Vendor(format!("trackimo {} failed with {}", what, status)))
        }
    }
}

/// An empty body reads as JSON `null`, so `Option<T>` targets see `None`.
fn decode_body<T: DeserializeOwned>(body: &str, what: &str) -> Result<T> {
    let body = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(body)
        .map_err(|e| GatewayError::Vendor(format!("unexpected trackimo {} payload: {}", what, e)))
}

#[async_trait]
impl TrackimoApi for HttpTrackimoClient {
    async fn login(&self, credentials: &TrackimoCredentials) -> Result<TrackimoSession> {
        // The form login sets a session cookie the authorize step relies on,
        // so it gets its own cookie jar.
        let login_http = Client::builder()
            .cookie_store(true)
            .timeout(self.timeout)
            .build()?;

        let response = login_http
            .post(&self.login_url)
            .json(&json!({
                "username": credentials.username,
                "password": credentials.password,
                "remember_me": true,
                "whitelabel": "TRACKIMO",
            }))
            .send()
            .await?;
        check_status(response, "login").await?;
        debug!("Trackimo form login accepted");

        let response = login_http
            .get(format!("{}/oauth2/auth", self.api_url))
            .query(&[
                ("client_id", credentials.client_id.as_str()),
                ("redirect_uri", OAUTH_REDIRECT),
                ("response_type", "code"),
                ("scope", OAUTH_SCOPE),
            ])
            .send()
            .await?;
        let code: OAuthCode = read_json(response, "authorization").await?;

        let response = login_http
            .post(format!("{}/oauth2/token", self.api_url))
            .json(&json!({
                "client_id": credentials.client_id,
                "client_secret": credentials.client_secret,
                "code": code.code,
            }))
            .send()
            .await?;
        let token: TokenResponse = read_json(response, "token exchange").await?;

        let session = self.session_from_token(token, None).await?;
        info!("Trackimo login successful for account {}", session.account_id);
        Ok(session)
    }

    async fn refresh(&self, refresh: &TrackimoRefresh) -> Result<TrackimoSession> {
        let response = self
            .http
            .post(format!("{}/oauth2/token/refresh", self.api_url))
            .json(&json!({
                "client_id": refresh.client_id,
                "client_secret": refresh.client_secret,
                "refresh_token": refresh.refresh_token,
            }))
            .send()
            .await?;
        let token: TokenResponse = read_json(response, "token refresh").await?;

        let session = self
            .session_from_token(token, Some(&refresh.refresh_token))
            .await?;
        info!("Trackimo session restored for account {}", session.account_id);
        Ok(session)
    }

    async fn device_page(
        &self,
        session: &TrackimoSession,
        page: u32,
        limit: u32,
    ) -> Result<Vec<TrackimoDeviceSummary>> {
        let url = self.account_url(session, "devices");
        let page: Option<Vec<TrackimoDeviceSummary>> = self
            .get(
                session,
                &url,
                &[("limit", limit.to_string()), ("page", page.to_string())],
                "device list",
            )
            .await?;
        Ok(page.unwrap_or_default())
    }

    async fn device_details(
        &self,
        session: &TrackimoSession,
        device_id: i64,
    ) -> Result<TrackimoDeviceDetails> {
        let url = self.account_url(session, &format!("devices/{}", device_id));
        let details: Option<TrackimoDeviceDetails> =
            self.get(session, &url, &[], "device").await?;
        Ok(details.unwrap_or_default())
    }

    async fn latest_fixes(
        &self,
        session: &TrackimoSession,
        device_ids: &[i64],
    ) -> Result<Vec<TrackimoFix>> {
        let response = self
            .http
            .post(self.account_url(session, "locations/filter"))
            .bearer_auth(&session.access_token)
            .query(&[("limit", device_ids.len().to_string()), ("page", "1".to_string())])
            .json(&json!({ "device_ids": device_ids }))
            .send()
            .await?;
        let fixes: Option<Vec<TrackimoFix>> = read_json(response, "location filter").await?;
        Ok(fixes.unwrap_or_default())
    }

    async fn location(
        &self,
        session: &TrackimoSession,
        device_id: i64,
    ) -> Result<Option<TrackimoFix>> {
        let url = self.account_url(session, &format!("devices/{}/location", device_id));
        self.get(session, &url, &[], "device location").await
    }

    async fn history(
        &self,
        session: &TrackimoSession,
        device_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<TrackimoFix>> {
        let url = self.account_url(session, &format!("devices/{}/history", device_id));
        let fixes: Option<Vec<TrackimoFix>> = self
            .get(
                session,
                &url,
                &[
                    ("from", from.timestamp().to_string()),
                    ("to", to.timestamp().to_string()),
                    ("limit", limit.to_string()),
                    ("page", "1".to_string()),
                ],
                "device history",
            )
            .await?;
        Ok(fixes.unwrap_or_default())
    }

    async fn command(
        &self,
        session: &TrackimoSession,
        device_id: i64,
        command: DeviceCommand,
    ) -> Result<()> {
        let response = self
            .http
            .post(self.account_url(session, &format!("devices/ops/{}", command.path())))
            .bearer_auth(&session.access_token)
            .json(&command.body(device_id))
            .send()
            .await?;
        check_status(response, "device").await?;
        Ok(())
    }
}
