//! `/auth/{provider}/{step}` endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, RawQuery, State},
    response::{IntoResponse, Redirect, Response},
};
use tracing::{info, warn};
use url::form_urlencoded;

use super::gateway::GatewayParams;
use super::provider::{AuthStep, Provider};
use crate::portal::AppState;
use crate::{Error, Result};

/// Dispatch to the login or callback leg for a provider.
///
/// Only `google`/`facebook` × `login`/`callback` are routed; anything else
/// is a 404.
pub async fn auth_handler(
    State(state): State<Arc<AppState>>,
    Path((provider, step)): Path<(String, String)>,
    RawQuery(query): RawQuery,
) -> Response {
    let result = match (provider.parse::<Provider>(), step.parse::<AuthStep>()) {
        (Ok(provider), Ok(AuthStep::Login)) => login(&state, provider, query.as_deref()).await,
        (Ok(provider), Ok(AuthStep::Callback)) => {
            callback(&state, provider, query.as_deref()).await
        }
        (Err(e), _) | (_, Err(e)) => {
            warn!(provider = %provider, step = %step, "Unknown auth route");
            Err(e)
        }
    };

    match result {
        Ok(redirect) => redirect.into_response(),
        Err(e) => e.into_public_response(),
    }
}

/// Send the browser to the provider, carrying the gateway's query as state.
async fn login(state: &AppState, provider: Provider, query: Option<&str>) -> Result<Redirect> {
    let settings = state.page_settings().await;
    let credentials = provider.credentials(&settings)?;

    let url = state
        .oauth
        .authorize_url(provider, &credentials, query.unwrap_or_default())?;

    info!(provider = provider.slug(), "Redirecting guest to identity provider");
    Ok(Redirect::temporary(&url))
}

/// Finish the code exchange and hand the guest over to the gateway.
async fn callback(state: &AppState, provider: Provider, query: Option<&str>) -> Result<Redirect> {
    let mut code = None;
    let mut oauth_state = None;
    for (key, value) in form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
        match &*key {
            "code" if code.is_none() => code = Some(value.into_owned()),
            "state" if oauth_state.is_none() => oauth_state = Some(value.into_owned()),
            _ => {}
        }
    }

    let code = code.filter(|c| !c.is_empty()).ok_or(Error::MissingCode)?;

    let settings = state.page_settings().await;
    let credentials = provider.credentials(&settings)?;

    let access_token = state
        .oauth
        .exchange_code(provider, &credentials, &code)
        .await?;
    let email = state.oauth.fetch_email(provider, &access_token).await?;

    if email.is_empty() {
        if state.oauth.config().require_email {
            return Err(Error::MissingEmail);
        }
        warn!(provider = provider.slug(), "Provider returned no email");
    } else if let Err(e) = state.emails.record(&email, provider.email_source()).await {
        warn!(provider = provider.slug(), error = %e, "Failed to record guest email");
    }

    let gateway = GatewayParams::from_state(
        oauth_state.as_deref().unwrap_or_default(),
        &state.config.gateway,
    );
    info!(
        provider = provider.slug(),
        gateway = %gateway.login_url,
        "Guest authenticated, redirecting to gateway"
    );

    Ok(Redirect::temporary(
        &gateway.login_redirect(&email, &state.config.gateway.password),
    ))
}
