//! CLI command implementations

pub mod collect;
pub mod report;
pub mod schedule;
pub mod snapshot;
pub mod tick;

use itreality_core::domain::DomainName;

use super::OutputWriter;

/// Parse a domain argument, reporting a bad one on stderr
pub(crate) fn parse_domain(output: &OutputWriter, input: &str) -> Option<DomainName> {
    match DomainName::parse(input) {
        Ok(domain) => Some(domain),
        Err(e) => {
            output.error(format!("invalid domain {input:?}: {e}"));
            None
        }
    }
}
