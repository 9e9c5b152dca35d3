//! IT Reality Probes - independent public-signal collectors
//!
//! Each probe implements [`itreality_core::domain::Probe`] and produces one
//! [`itreality_core::domain::SignalBlock`]. Probes never return errors:
//! lookup failures become failed or lower-confidence blocks.
//!
//! ## Probes
//!
//! - [`DnsProbe`] - A/AAAA/NS/MX presence and RDAP registration data
//! - [`EmailAuthProbe`] - SPF, DMARC and DKIM records
//! - [`TlsProbe`] - leaf certificate on port 443
//! - [`TechStackProbe`] - homepage header and body fingerprint
//! - [`ExposureProbe`] - hosting classification from PTR and NS names
//! - [`BreachProbe`] - known breaches for the domain
//! - [`SubdomainProbe`] - certificate transparency names
//!
//! ## Usage
//!
//! ```rust,ignore
//! use itreality_probes::ProbeFactory;
//! use itreality_core::config::ProbesConfig;
//!
//! let factory = ProbeFactory::from_config(&ProbesConfig::default())?;
//! let probes = factory.probes();
//! ```

pub mod domain;
pub mod factory;
pub mod infrastructure;
pub mod probes;

pub use domain::{CertificateSource, DnsClient, LeafCertificate, LookupError, TlsProbeError};
pub use factory::{ProbeFactory, ProbeSetupError};
pub use probes::*;
