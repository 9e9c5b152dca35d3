//! Property tests for domain name normalization

use itreality_core::domain::DomainName;
use proptest::prelude::*;

fn label() -> impl Strategy<Value = String> {
    "[a-z]([a-z0-9-]{0,20}[a-z0-9])?"
}

fn hostname() -> impl Strategy<Value = String> {
    prop::collection::vec(label(), 2..5).prop_map(|labels| labels.join("."))
}

proptest! {
    #[test]
    fn url_decorations_are_stripped(
        host in hostname(),
        scheme in prop::option::of(prop_oneof!["http://", "https://"]),
        port in prop::option::of(1u16..65535),
        path in prop::option::of("/[a-z0-9/]{0,12}"),
    ) {
        let mut input = format!("{}{}", scheme.unwrap_or_default(), host.to_uppercase());
        if let Some(port) = port {
            input.push_str(&format!(":{port}"));
        }
        if let Some(path) = path {
            input.push_str(&path);
        }

        let parsed = DomainName::parse(&input).expect("valid hostname must parse");
        prop_assert_eq!(parsed.as_str(), host.as_str());
    }

    #[test]
    fn parsing_is_idempotent(host in hostname()) {
        let once = DomainName::parse(&host).expect("valid hostname must parse");
        let twice = DomainName::parse(once.as_str()).expect("normalized hostname must parse");
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn arbitrary_input_never_panics(input in ".{0,80}") {
        if let Ok(domain) = DomainName::parse(&input) {
            prop_assert!(domain.as_str().len() <= 253);
            prop_assert!(domain.as_str().contains('.'));
            prop_assert_eq!(domain.as_str(), domain.as_str().to_ascii_lowercase());
        }
    }
}
