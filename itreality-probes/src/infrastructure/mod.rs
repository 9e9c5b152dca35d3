//! Network-backed implementations of the lookup seams

pub mod dns_client;
pub mod http;
pub mod preflight;
pub mod tls_client;

pub use dns_client::TrustDnsClient;
pub use http::build_http_client;
pub use preflight::DnsDomainResolver;
pub use tls_client::RustlsCertificateSource;
