//! Per-target login parameter resolution.
//!
//! Login parameters come from two scopes: run-wide options ("global") and the
//! per-host credential record ("credential"). Resolution is field-by-field
//! with global winning whenever both scopes define a field; unset fields fall
//! back silently. Each resolved field records its provenance for diagnostics.

use std::collections::BTreeMap;

use url::Url;

use crate::config::{CredentialRecord, LoginOptions};

/// Which scope a resolved login field came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    /// Run-wide options.
    Global,
    /// Per-host credential record.
    Credential,
}

impl FieldSource {
    /// Provenance label used in diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldSource::Global => "global",
            FieldSource::Credential => "credential",
        }
    }
}

/// A fully resolved login plan for one target host.
///
/// Built fresh per target; never persisted. A `None` source means the field
/// fell back to its default (the target URL for `url`, POST for `method`,
/// empty for `headers`/`payload`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginPlan {
    /// Login endpoint.
    pub url: String,
    /// Scope that supplied `url`.
    pub url_source: Option<FieldSource>,
    /// HTTP method, uppercase. Defaults to POST.
    pub method: String,
    /// Scope that supplied `method`.
    pub method_source: Option<FieldSource>,
    /// Extra request headers.
    pub headers: BTreeMap<String, String>,
    /// Scope that supplied `headers`.
    pub headers_source: Option<FieldSource>,
    /// Form/body payload fields.
    pub payload: BTreeMap<String, String>,
    /// Scope that supplied `payload`.
    pub payload_source: Option<FieldSource>,
}

/// Resolves a login plan for `target` from the global options and the
/// target's credential record.
///
/// Global values take precedence whenever both scopes define the same field;
/// there is no cross-scope merging within a field.
pub fn build_login_info(
    target: &Url,
    options: Option<&LoginOptions>,
    credential: Option<&CredentialRecord>,
) -> LoginPlan {
    let (url, url_source) = resolve(
        options.and_then(|o| o.url.clone()),
        credential.and_then(|c| c.url.clone()),
    );
    let (method, method_source) = resolve(
        options.and_then(|o| o.method.clone()),
        credential.and_then(|c| c.method.clone()),
    );
    let (headers, headers_source) = resolve(
        options.and_then(|o| o.headers.clone()),
        credential.and_then(|c| c.headers.clone()),
    );
    let (payload, payload_source) = resolve(
        options.and_then(|o| o.payload.clone()),
        credential.and_then(|c| c.payload.clone()),
    );

    LoginPlan {
        url: url.unwrap_or_else(|| target.to_string()),
        url_source,
        method: method
            .map(|m| m.to_ascii_uppercase())
            .unwrap_or_else(|| "POST".to_string()),
        method_source,
        headers: headers.unwrap_or_default(),
        headers_source,
        payload: payload.unwrap_or_default(),
        payload_source,
    }
}

fn resolve<T>(global: Option<T>, credential: Option<T>) -> (Option<T>, Option<FieldSource>) {
    match (global, credential) {
        (Some(value), _) => (Some(value), Some(FieldSource::Global)),
        (None, Some(value)) => (Some(value), Some(FieldSource::Credential)),
        (None, None) => (None, None),
    }
}
