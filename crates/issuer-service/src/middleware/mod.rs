pub mod http_metrics;
pub mod security_headers;

pub use http_metrics::http_metrics_middleware;
pub use security_headers::ContentSecurityPolicy;
