//! Content-Security-Policy header.
//!
//! The base directive set allows the embedded wallet and login flows used by
//! the browser clients of this service (Privy, WalletConnect, Cloudflare
//! Turnstile). Deployments can extend individual directives and switch to
//! report-only mode through configuration.

use crate::config::CspConfig;
use crate::errors::IssuerError;
use axum::http::{HeaderName, HeaderValue};
use tower_http::set_header::SetResponseHeaderLayer;

pub const CSP_HEADER: &str = "content-security-policy";
pub const CSP_REPORT_ONLY_HEADER: &str = "content-security-policy-report-only";

/// Rendered policy, ready to attach to every response.
#[derive(Debug, Clone)]
pub struct ContentSecurityPolicy {
    header_name: HeaderName,
    value: HeaderValue,
}

impl ContentSecurityPolicy {
    /// Build the policy from the base directives plus configured extensions.
    ///
    /// # Errors
    ///
    /// `Configuration` if a configured source cannot appear in a header value.
    pub fn from_config(config: &CspConfig) -> Result<Self, IssuerError> {
        let policy = render_directives(config);

        let value = HeaderValue::from_str(&policy).map_err(|e| {
            IssuerError::Configuration(format!("invalid Content-Security-Policy source: {e}"))
        })?;

        let header_name = if config.report_only {
            HeaderName::from_static(CSP_REPORT_ONLY_HEADER)
        } else {
            HeaderName::from_static(CSP_HEADER)
        };

        Ok(Self { header_name, value })
    }

    pub fn header_name(&self) -> &HeaderName {
        &self.header_name
    }

    pub fn value(&self) -> &HeaderValue {
        &self.value
    }

    /// Layer that sets the policy on every response, replacing any existing
    /// value.
    pub fn layer(&self) -> SetResponseHeaderLayer<HeaderValue> {
        SetResponseHeaderLayer::overriding(self.header_name.clone(), self.value.clone())
    }
}

fn with_extra(base: &str, extra: &[String]) -> String {
    if extra.is_empty() {
        base.to_string()
    } else {
        format!("{base} {}", extra.join(" "))
    }
}

fn render_directives(config: &CspConfig) -> String {
    let mut directives = vec![
        "default-src 'self'".to_string(),
        with_extra(
            "script-src 'self' https://challenges.cloudflare.com",
            &config.additional_script_src,
        ),
        with_extra("style-src 'self' 'unsafe-inline'", &config.additional_style_src),
        with_extra("img-src 'self' data: blob:", &config.additional_img_src),
        with_extra("font-src 'self'", &config.additional_font_src),
        "object-src 'none'".to_string(),
        "base-uri 'self'".to_string(),
        "form-action 'self'".to_string(),
        "frame-ancestors 'none'".to_string(),
        "child-src https://auth.privy.io https://verify.walletconnect.com https://verify.walletconnect.org".to_string(),
        "frame-src https://auth.privy.io https://verify.walletconnect.com https://verify.walletconnect.org https://challenges.cloudflare.com".to_string(),
        with_extra(
            "connect-src 'self' https://auth.privy.io wss://relay.walletconnect.com wss://relay.walletconnect.org wss://www.walletlink.org https://*.rpc.privy.systems https://explorer-api.walletconnect.com",
            &config.additional_connect_src,
        ),
        "worker-src 'self'".to_string(),
        "manifest-src 'self'".to_string(),
    ];

    if let Some(report_uri) = &config.report_uri {
        directives.push(format!("report-uri {report_uri}"));
    }

    directives.join("; ")
}
