use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::error::AppError;
use crate::infrastructure::config::Config;

/// Speech API key for the current request, injected into request extensions.
///
/// `None` when the request carried no key and no server-side fallback is
/// configured; handlers decide whether that is fatal.
#[derive(Clone)]
pub struct ApiCredential(pub Option<String>);

impl ApiCredential {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl std::fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ApiCredential")
            .field(&self.0.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Credential middleware: a bearer token on the request wins over the
/// configured `OPENAI_API_KEY`
pub async fn credential_middleware(
    State(config): State<Arc<Config>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let from_header = match request.headers().get(header::AUTHORIZATION) {
        None => None,
        Some(value) => {
            let value = value
                .to_str()
                .map_err(|_| AppError::Unauthorized("Invalid authorization header".to_string()))?;
            let token = value.strip_prefix("Bearer ").ok_or_else(|| {
                AppError::Unauthorized("Invalid authorization format".to_string())
            })?;
            Some(token.trim().to_string()).filter(|t| !t.is_empty())
        }
    };

    let source = if from_header.is_some() {
        "header"
    } else if config.openai_api_key.is_some() {
        "config"
    } else {
        "none"
    };
    tracing::debug!(credential_source = source, "Credential resolved");

    let credential = from_header.or_else(|| config.openai_api_key.clone());
    request.extensions_mut().insert(ApiCredential(credential));

    Ok(next.run(request).await)
}
