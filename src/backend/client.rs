//! HTTPS client for the OPNsense REST API.
//!
//! Every manifest method maps to one endpoint below `/api/`. Path
//! placeholders are filled from the tool arguments; what is left becomes the
//! query string of a GET or the JSON body of a POST.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use rmcp::model::JsonObject;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use super::{Backend, BackendError, ConnectionSettings};
use crate::domains::tools::manifest::{Manifest, MethodSpec, Placeholder, Verb};

/// Endpoint listing firmware packages and their install state.
const FIRMWARE_INFO_PATH: &str = "core/firmware/info";

/// Argument carrying the request body of write endpoints.
const DATA_ARG: &str = "data";

/// A fully resolved HTTP request.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Request {
    pub verb: Verb,
    pub url: Url,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// OPNsense API client authenticating with an API key/secret pair.
pub struct OpnsenseClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
    api_secret: String,
    manifest: Arc<Manifest>,
}

impl OpnsenseClient {
    /// Build a client. No request is sent.
    pub fn new(settings: &ConnectionSettings, manifest: Arc<Manifest>) -> Result<Self, BackendError> {
        let base_url = Url::parse(&settings.url)
            .map_err(|e| BackendError::invalid_argument(format!("invalid url '{}': {}", settings.url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::invalid_argument(format!(
                "invalid url '{}'",
                settings.url
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .danger_accept_invalid_certs(!settings.verify_ssl)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BackendError::request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            api_key: settings.api_key.clone(),
            api_secret: settings.api_secret.clone(),
            manifest,
        })
    }

    async fn send(&self, request: Request) -> Result<Value, BackendError> {
        debug!("{:?} {}", request.verb, request.url);
        let builder = match request.verb {
            Verb::Get => self.http.get(request.url).query(&request.query),
            Verb::Post => self
                .http
                .post(request.url)
                .json(&request.body.unwrap_or_else(|| Value::Object(JsonObject::new()))),
        };

        let response = builder
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(BackendError::http(
                status.as_u16(),
                status.canonical_reason().unwrap_or_default(),
                Some(text).filter(|t| !t.trim().is_empty()),
            ));
        }

        Ok(decode_body(text))
    }
}

#[async_trait]
impl Backend for OpnsenseClient {
    #[instrument(skip(self, args))]
    async fn call(&self, module: &str, method: &str, args: JsonObject) -> Result<Value, BackendError> {
        let (_, spec) = self.manifest.find(module, method).ok_or_else(|| {
            BackendError::invalid_argument(format!("no endpoint for {}.{}", module, method))
        })?;
        let request = build_request(&self.base_url, spec, args)?;
        self.send(request).await
    }

    async fn installed_plugins(&self) -> Result<Vec<String>, BackendError> {
        let request = Request {
            verb: Verb::Get,
            url: endpoint_url(&self.base_url, FIRMWARE_INFO_PATH, &mut JsonObject::new())?,
            query: Vec::new(),
            body: None,
        };
        let info = self.send(request).await?;
        installed_packages(info)
    }
}

/// Resolve a method call to a concrete request.
pub(crate) fn build_request(
    base_url: &Url,
    spec: &MethodSpec,
    mut args: JsonObject,
) -> Result<Request, BackendError> {
    let url = endpoint_url(base_url, &spec.path, &mut args)?;

    match spec.verb {
        Verb::Get => Ok(Request {
            verb: Verb::Get,
            url,
            query: query_pairs(&args)?,
            body: None,
        }),
        Verb::Post => {
            let body = match args.remove(DATA_ARG) {
                Some(data) => data,
                None => Value::Object(args),
            };
            Ok(Request {
                verb: Verb::Post,
                url,
                query: Vec::new(),
                body: Some(body),
            })
        }
    }
}

/// `{base}/api/{path}` with placeholders taken out of `args`.
fn endpoint_url(base_url: &Url, path: &str, args: &mut JsonObject) -> Result<Url, BackendError> {
    let mut url = base_url.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| BackendError::invalid_argument(format!("invalid base url '{}'", base_url)))?;
        segments.pop_if_empty().push("api");
        for segment in path.split('/') {
            match Placeholder::parse(segment) {
                Some(Placeholder { name, optional }) => match args.remove(name) {
                    Some(value) if optional && value.is_null() => {}
                    Some(value) => {
                        segments.push(&path_value(name, &value)?);
                    }
                    None if optional => {}
                    None => {
                        return Err(BackendError::invalid_argument(format!(
                            "missing required argument '{}'",
                            name
                        )));
                    }
                },
                None => {
                    segments.push(segment);
                }
            }
        }
    }
    Ok(url)
}

fn path_value(name: &str, value: &Value) -> Result<String, BackendError> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Value::Bool(true) => Ok("1".to_string()),
        Value::Bool(false) => Ok("0".to_string()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(BackendError::invalid_argument(format!(
            "argument '{}' must be a non-empty string",
            name
        ))),
    }
}

fn query_pairs(args: &JsonObject) -> Result<Vec<(String, String)>, BackendError> {
    args.iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Bool(_) | Value::Number(_) => value.to_string(),
                _ => {
                    return Err(BackendError::invalid_argument(format!(
                        "argument '{}' must be a scalar",
                        key
                    )));
                }
            };
            Ok((key.clone(), value))
        })
        .collect()
}

fn decode_body(text: String) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

#[derive(Debug, Deserialize)]
struct FirmwareInfo {
    #[serde(default)]
    package: Vec<PackageInfo>,
}

#[derive(Debug, Deserialize)]
struct PackageInfo {
    name: String,
    #[serde(default)]
    installed: Value,
}

impl PackageInfo {
    fn is_installed(&self) -> bool {
        match &self.installed {
            Value::String(s) => s == "1",
            Value::Number(n) => n.as_u64() == Some(1),
            Value::Bool(b) => *b,
            _ => false,
        }
    }
}

/// Names of the installed packages in a `core/firmware/info` payload.
fn installed_packages(info: Value) -> Result<Vec<String>, BackendError> {
    let info: FirmwareInfo =
        serde_json::from_value(info).map_err(|e| BackendError::decode(e.to_string()))?;
    Ok(info
        .package
        .into_iter()
        .filter(PackageInfo::is_installed)
        .map(|p| p.name)
        .collect())
}
