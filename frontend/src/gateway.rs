use std::fmt;
use std::rc::Rc;

use async_trait::async_trait;
use gloo_net::http::Request;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use web_sys::AbortSignal;
use yew::Callback;

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::session::AuthStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Dashboard,
    Budgets,
    Expenses,
    Investments,
}

impl Route {
    pub fn requires_session(self) -> bool {
        !matches!(self, Route::Login | Route::Register)
    }
}

pub trait Navigator {
    fn navigate(&self, route: Route);
}

impl Navigator for Callback<Route> {
    fn navigate(&self, route: Route) {
        self.emit(route);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// A call as the rest of the client describes it: relative path, no credential.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }
}

/// What actually leaves the client, with the absolute URL and the credential resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct Outbound {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Option<String>,
    pub authorization: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

#[async_trait(?Send)]
pub trait Transport {
    /// Performs one HTTP exchange. Only failures to get any response at all are errors here;
    /// status handling belongs to the [`Gateway`].
    async fn dispatch(&self, request: Outbound) -> Result<ApiResponse>;
}

/// `fetch` through gloo-net with a fixed abort deadline per request.
pub struct GlooTransport {
    timeout_millis: u32,
}

impl GlooTransport {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            timeout_millis: config.timeout_millis(),
        }
    }
}

#[async_trait(?Send)]
impl Transport for GlooTransport {
    async fn dispatch(&self, request: Outbound) -> Result<ApiResponse> {
        let builder = match request.method {
            Method::Get => Request::get(&request.url),
            Method::Post => Request::post(&request.url),
            Method::Put => Request::put(&request.url),
            Method::Delete => Request::delete(&request.url),
        };
        let signal = AbortSignal::timeout_with_u32(self.timeout_millis);
        let mut builder = builder
            .abort_signal(Some(&signal))
            .query(request.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        if let Some(authorization) = &request.authorization {
            builder = builder.header("Authorization", authorization);
        }

        let prepared = match request.body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(body),
            None => builder.build(),
        }
        .map_err(|err| ApiError::Network(err.to_string()))?;

        let response = prepared
            .send()
            .await
            .map_err(|err| ApiError::Network(err.to_string()))?;
        let status = response.status();
        into_response(status, response.text().await)
    }
}

/// A body that could not be read is a transport failure, whatever the status line said.
fn into_response(
    status: u16,
    body: std::result::Result<String, gloo_net::Error>,
) -> Result<ApiResponse> {
    match body {
        Ok(body) => Ok(ApiResponse { status, body }),
        Err(err) => Err(ApiError::Network(format!(
            "status {status} but the body could not be read: {err}"
        ))),
    }
}

/// The single outbound path. Attaches the session credential to every call and turns a 401
/// into a cleared session plus a trip to the login view.
#[derive(Clone)]
pub struct Gateway {
    config: Rc<ClientConfig>,
    auth: AuthStore,
    transport: Rc<dyn Transport>,
    navigator: Rc<dyn Navigator>,
}

impl Gateway {
    pub fn new(
        config: ClientConfig,
        auth: AuthStore,
        transport: Rc<dyn Transport>,
        navigator: Rc<dyn Navigator>,
    ) -> Self {
        Self {
            config: Rc::new(config),
            auth,
            transport,
            navigator,
        }
    }

    pub fn auth(&self) -> &AuthStore {
        &self.auth
    }

    pub fn navigator(&self) -> &Rc<dyn Navigator> {
        &self.navigator
    }

    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let outbound = Outbound {
            method: request.method,
            url: self.config.endpoint(&request.path),
            query: request.query,
            body: request.body.map(|body| body.to_string()),
            authorization: self.auth.authorization_header_value(),
        };
        debug!("{} {}", outbound.method, outbound.url);

        let response = self.transport.dispatch(outbound).await?;
        if response.status == 401 {
            warn!("{} rejected the session credential", request.path);
            self.auth.clear_session();
            self.navigator.navigate(Route::Login);
            return Err(ApiError::Unauthorized);
        }
        if !response.is_success() {
            warn!("{} failed with status {}", request.path, response.status);
            return Err(ApiError::Rejected {
                status: response.status,
                message: response.body,
            });
        }
        Ok(response)
    }

    pub async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        self.send(request).await?.json()
    }
}

impl PartialEq for Gateway {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.config, &other.config) && self.auth == other.auth
    }
}
