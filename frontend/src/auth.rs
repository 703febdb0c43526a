use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};
use crate::gateway::{ApiRequest, Gateway, Route};
use crate::session::DEFAULT_TOKEN_SCHEME;

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
}

fn credentials<'a>(email: &'a str, password: &'a str) -> Result<Credentials<'a>> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(ApiError::Invalid(
            "Email and password are required".to_string(),
        ));
    }
    Ok(Credentials { email, password })
}

/// Login, registration, logout and the route guard.
#[derive(Clone, PartialEq)]
pub struct AuthService {
    gateway: Gateway,
}

impl AuthService {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub fn is_signed_in(&self) -> bool {
        self.gateway.auth().has_session()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        let request = ApiRequest::post("users/login").json(&credentials(email, password)?)?;
        let response: AuthResponse = self.gateway.fetch(request).await?;
        let scheme = response
            .token_type
            .filter(|scheme| !scheme.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TOKEN_SCHEME.to_string());
        self.gateway
            .auth()
            .set_session(&response.access_token, &scheme);
        info!("signed in as {}", email.trim());
        self.gateway.navigator().navigate(Route::Dashboard);
        Ok(())
    }

    /// Registration never signs the user in; it sends them to the login view.
    pub async fn register(&self, email: &str, password: &str) -> Result<()> {
        let request = ApiRequest::post("users/register").json(&credentials(email, password)?)?;
        self.gateway.send(request).await?;
        info!("registered {}", email.trim());
        self.gateway.navigator().navigate(Route::Login);
        Ok(())
    }

    pub fn logout(&self) {
        self.gateway.auth().clear_session();
        self.gateway.navigator().navigate(Route::Login);
    }

    /// Lets `route` through only if it is public or a session exists; otherwise redirects.
    pub fn guard(&self, route: Route) -> bool {
        if route.requires_session() && !self.is_signed_in() {
            self.gateway.navigator().navigate(Route::Login);
            return false;
        }
        true
    }
}
