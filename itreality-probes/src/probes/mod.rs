//! Signal probes, one per category

pub mod breach;
pub mod dns;
pub mod email;
pub mod exposure;
pub mod subdomains;
pub mod techstack;
pub mod tls;

pub use breach::BreachProbe;
pub use dns::DnsProbe;
pub use email::EmailAuthProbe;
pub use exposure::ExposureProbe;
pub use subdomains::SubdomainProbe;
pub use techstack::TechStackProbe;
pub use tls::TlsProbe;
