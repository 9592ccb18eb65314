use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, error, trace};

use crate::logger::{MessageLogMode, MessageLogger};
use crate::protocol::{
    decode_status, parse_heater_list, request_path, setpoint_path, setpoint_tenths, status_path,
    HEATER_LIST_PATH,
};
use crate::settings::DeviceSettings;
use crate::types::*;
use crate::{Error, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// The two remote operations the poll loop and override requests depend on.
///
/// Implementations make exactly one attempt per call; retrying is up to the
/// caller.
pub trait Transport: Send + Sync {
    fn fetch_status(&self, heater: u8) -> impl Future<Output = Result<BoilerStatus>> + Send;

    fn set_temperature(
        &self,
        heater: u8,
        room: u8,
        temperature: f64,
    ) -> impl Future<Output = Result<()>> + Send;
}

pub struct IncomfortClientBuilder {
    host: String,
    protocol: String,
    credentials: Option<(String, String)>,
    timeout: Duration,
    log_mode: Option<MessageLogMode>,
    log_path: Option<String>,
}

impl IncomfortClientBuilder {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            protocol: "http".to_string(),
            credentials: None,
            timeout: DEFAULT_TIMEOUT,
            log_mode: None,
            log_path: None,
        }
    }

    pub fn protocol(mut self, proto: &str) -> Self {
        self.protocol = proto.to_string();
        self
    }

    /// Use HTTP basic auth and the gateway's `/protect/` endpoints.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn message_log(mut self, mode: MessageLogMode, path: impl Into<String>) -> Self {
        self.log_mode = Some(mode);
        self.log_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<IncomfortClient> {
        let http = reqwest::Client::builder().timeout(self.timeout).build()?;

        let logger = match (self.log_mode, self.log_path) {
            (Some(mode), Some(path)) => Some(Mutex::new(MessageLogger::new(mode, &path)?)),
            _ => None,
        };

        Ok(IncomfortClient {
            http,
            base_url: format!("{}://{}", self.protocol, self.host),
            credentials: self.credentials,
            logger,
        })
    }
}

/// HTTP client for an InComfort LAN gateway.
pub struct IncomfortClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<(String, String)>,
    logger: Option<Mutex<MessageLogger>>,
}

impl IncomfortClient {
    pub fn builder(host: impl Into<String>) -> IncomfortClientBuilder {
        IncomfortClientBuilder::new(host)
    }

    pub fn from_settings(settings: &DeviceSettings) -> Result<Self> {
        let mut builder = IncomfortClientBuilder::new(&settings.host);
        if let Some((user, pass)) = settings.credentials() {
            builder = builder.credentials(user, pass);
        }
        builder.build()
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }

    /// List the boilers behind the gateway. Empty slots are skipped.
    pub async fn heater_list(&self) -> Result<Vec<Heater>> {
        let result = match self.get_json(HEATER_LIST_PATH, true).await {
            Ok(body) => parse_heater_list(&body),
            Err(e) => Err(e),
        };
        if let Err(ref e) = result {
            error!(error = %e, "heater list request failed");
        }
        result
    }

    async fn send(&self, path: &str) -> Result<reqwest::Response> {
        let req_path = request_path(path, self.is_authenticated());
        let url = format!("{}{}", self.base_url, req_path);
        debug!(path = %req_path, "gateway request");

        let mut req = self.http.get(&url);
        if let Some((user, pass)) = &self.credentials {
            req = req.basic_auth(user, Some(pass));
        }

        let resp = match req.send().await {
            Ok(resp) => resp,
            Err(e) => {
                self.with_logger(|l| l.log_request(&req_path, None));
                return Err(e.into());
            }
        };

        let status = resp.status();
        debug!(path = %req_path, status = status.as_u16(), "gateway response");
        self.with_logger(|l| l.log_request(&req_path, Some(status.as_u16())));

        if status != StatusCode::OK {
            return Err(Error::Status {
                code: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }
        Ok(resp)
    }

    async fn get_json(&self, path: &str, log_body: bool) -> Result<Value> {
        let body = self.send(path).await?.text().await?;
        let json: Value = serde_json::from_str(&body)
            .map_err(|e| Error::Protocol(format!("{path}: {e}")))?;
        if log_body {
            debug!(path, body = %json, "gateway body");
        } else {
            trace!(path, body = %json, "gateway body");
        }
        Ok(json)
    }

    fn with_logger(&self, f: impl FnOnce(&mut MessageLogger)) {
        if let Some(logger) = &self.logger {
            f(&mut logger.lock());
        }
    }
}

impl Transport for IncomfortClient {
    async fn fetch_status(&self, heater: u8) -> Result<BoilerStatus> {
        let body = self.get_json(&status_path(heater), false).await?;
        self.with_logger(|l| l.log_status(heater, &body));
        decode_status(&body)
    }

    async fn set_temperature(&self, heater: u8, room: u8, temperature: f64) -> Result<()> {
        let path = setpoint_path(heater, room, temperature);
        debug!(heater, room, temperature, path = %path, "setting temperature");
        self.with_logger(|l| l.log_command(heater, room, temperature, setpoint_tenths(temperature)));

        if let Err(e) = self.send(&path).await {
            error!(heater, room, temperature, error = %e, "setTemperature failed");
            return Err(e);
        }
        Ok(())
    }
}
