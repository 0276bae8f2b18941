//! `PortRegistry` contract (spec §6): compatibility checks consumed by the
//! edge-creation collaborator.
//!
//! Connection `a -> b` is allowed iff:
//! - both ids exist;
//! - effective polarities differ (source-like on one side, sink-like on
//!   the other);
//! - compatibility holds: `relay` bypasses any sink-like, any source-like
//!   bypasses `intercept`, `bidirectional` bypasses everything, otherwise
//!   each side's `compatible_with` lists the other's id or uses `'*'`.

use crate::ids::PortSchemaId;
use crate::model::schema::{Polarity, PortSchema, WILDCARD};
use rustc_hash::FxHashMap;

pub struct PortRegistry<'a> {
    ports: FxHashMap<&'a str, &'a PortSchema>,
}

impl<'a> PortRegistry<'a> {
    pub fn new(ports: impl IntoIterator<Item = &'a PortSchema>) -> Self {
        Self { ports: ports.into_iter().map(|p| (p.id.as_str(), p)).collect() }
    }

    pub fn get(&self, id: &PortSchemaId) -> Option<&'a PortSchema> {
        self.ports.get(id.as_str()).copied()
    }

    /// `canConnect(a, b)` from spec §6.
    pub fn can_connect(&self, a: &PortSchemaId, b: &PortSchemaId) -> bool {
        let (Some(pa), Some(pb)) = (self.get(a), self.get(b)) else {
            return false;
        };

        if !polarity_compatible(pa.polarity, pb.polarity) {
            return false;
        }

        compatibility_bypass(pa.polarity, pb.polarity)
            || lists_each_other(pa, pb)
    }
}

fn polarity_compatible(a: Polarity, b: Polarity) -> bool {
    (a.is_source_like() && b.is_sink_like()) || (b.is_source_like() && a.is_sink_like())
}

fn compatibility_bypass(a: Polarity, b: Polarity) -> bool {
    let relay_vs_sink = (a == Polarity::Relay && b.is_sink_like()) || (b == Polarity::Relay && a.is_sink_like());
    let source_vs_intercept =
        (a.is_source_like() && b == Polarity::Intercept) || (b.is_source_like() && a == Polarity::Intercept);
    let bidirectional = a == Polarity::Bidirectional || b == Polarity::Bidirectional;
    relay_vs_sink || source_vs_intercept || bidirectional
}

fn lists_each_other(a: &PortSchema, b: &PortSchema) -> bool {
    let a_lists_b = a.compatible_with.iter().any(|id| id == WILDCARD || id == b.id.as_str());
    let b_lists_a = b.compatible_with.iter().any(|id| id == WILDCARD || id == a.id.as_str());
    a_lists_b || b_lists_a
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port(id: &str, polarity: Polarity, compatible_with: &[&str]) -> PortSchema {
        PortSchema {
            id: PortSchemaId::new(id),
            display_name: id.to_string(),
            semantic_description: String::new(),
            polarity,
            compatible_with: compatible_with.iter().map(|s| s.to_string()).collect(),
            color: "#000".to_string(),
            extra: Default::default(),
        }
    }

    #[test]
    fn blocks_same_polarity_family() {
        let data_out = port("data-out", Polarity::Source, &["data-in"]);
        let event_out = port("event-out", Polarity::Source, &[]);
        let registry = PortRegistry::new([&data_out, &event_out]);
        assert!(!registry.can_connect(&data_out.id, &event_out.id));
    }

    #[test]
    fn allows_listed_compatible_pair() {
        let data_out = port("data-out", Polarity::Source, &["data-in"]);
        let data_in = port("data-in", Polarity::Sink, &[]);
        let registry = PortRegistry::new([&data_out, &data_in]);
        assert!(registry.can_connect(&data_out.id, &data_in.id));
    }

    #[test]
    fn relay_bypasses_compatible_with() {
        let relay = port("relay", Polarity::Relay, &[]);
        let data_in = port("data-in", Polarity::Sink, &["something-else"]);
        let registry = PortRegistry::new([&relay, &data_in]);
        assert!(registry.can_connect(&relay.id, &data_in.id));
    }

    #[test]
    fn unknown_id_is_rejected() {
        let data_out = port("data-out", Polarity::Source, &["data-in"]);
        let registry = PortRegistry::new([&data_out]);
        assert!(!registry.can_connect(&data_out.id, &PortSchemaId::new("missing")));
    }

    #[test]
    fn bidirectional_bypasses_everything() {
        let bidi = port("bidi", Polarity::Bidirectional, &[]);
        let other = port("other", Polarity::Source, &[]);
        let registry = PortRegistry::new([&bidi, &other]);
        assert!(registry.can_connect(&bidi.id, &other.id));
    }
}
