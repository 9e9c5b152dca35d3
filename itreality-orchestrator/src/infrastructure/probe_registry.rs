//! Probe registry for the signal orchestrator

use std::collections::HashMap;
use std::sync::Arc;

use itreality_core::domain::{Probe, SignalCategory};

/// Registry of probes, at most one per signal category
pub struct ProbeRegistry {
    probes: HashMap<SignalCategory, Arc<dyn Probe>>,
}

impl ProbeRegistry {
    pub fn new() -> Self {
        Self {
            probes: HashMap::new(),
        }
    }

    pub fn with_probes(probes: impl IntoIterator<Item = Arc<dyn Probe>>) -> Self {
        let mut registry = Self::new();
        for probe in probes {
            registry.register(probe);
        }
        registry
    }

    /// Register a probe, replacing any probe already registered for its category
    pub fn register(&mut self, probe: Arc<dyn Probe>) {
        self.probes.insert(probe.category(), probe);
    }

    pub fn get_probe(&self, category: SignalCategory) -> Option<Arc<dyn Probe>> {
        self.probes.get(&category).cloned()
    }

    /// Registered categories in canonical order
    pub fn registered_categories(&self) -> Vec<SignalCategory> {
        SignalCategory::ALL
            .iter()
            .copied()
            .filter(|category| self.probes.contains_key(category))
            .collect()
    }

    /// Registered probes in canonical category order
    pub fn probes(&self) -> Vec<Arc<dyn Probe>> {
        SignalCategory::ALL
            .iter()
            .filter_map(|category| self.get_probe(*category))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }
}

impl Default for ProbeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use itreality_core::domain::{ProbeContext, SignalBlock};

    struct StubProbe(SignalCategory);

    #[async_trait]
    impl Probe for StubProbe {
        fn category(&self) -> SignalCategory {
            self.0
        }

        async fn collect(&self, _ctx: &ProbeContext) -> SignalBlock {
            SignalBlock::failed(self.0, "stub")
        }
    }

    #[test]
    fn test_registry_orders_and_replaces() {
        let mut registry = ProbeRegistry::new();
        registry.register(Arc::new(StubProbe(SignalCategory::Tls)));
        registry.register(Arc::new(StubProbe(SignalCategory::Dns)));
        registry.register(Arc::new(StubProbe(SignalCategory::Tls)));

        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.registered_categories(),
            vec![SignalCategory::Dns, SignalCategory::Tls]
        );
        assert!(registry.get_probe(SignalCategory::Hibp).is_none());
    }
}
