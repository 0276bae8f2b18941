//! Granular subscription registry (spec §4.1).
//!
//! Handlers take no arguments — they must re-read fresh state via the
//! adapter's getters, per spec. Each topic fires only when that slice
//! changed within the committed transaction; `General` fires on any change.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Nodes,
    Edges,
    Schemas,
    PortSchemas,
    SchemaGroups,
    PackageManifest,
    Deployables,
    /// The page list / active-page slice. Named `Levels` to match the
    /// granular subscription spelled out in spec §4.1
    /// (`subscribeToLevels`) — within this crate "level" means "page", the
    /// unit of canvas isolation described in spec §3.
    Levels,
}

pub const ALL_TOPICS: [Topic; 8] = [
    Topic::Nodes,
    Topic::Edges,
    Topic::Schemas,
    Topic::PortSchemas,
    Topic::SchemaGroups,
    Topic::PackageManifest,
    Topic::Deployables,
    Topic::Levels,
];

pub type Handler = Box<dyn FnMut()>;

#[derive(Default)]
pub struct Subscribers {
    general: Vec<Handler>,
    by_topic: std::collections::HashMap<Topic, Vec<Handler>>,
    next_id: u64,
}

/// Opaque handle returned by `subscribe*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl Subscribers {
    pub fn subscribe_general(&mut self, handler: Handler) -> SubscriptionId {
        self.general.push(handler);
        self.alloc_id()
    }

    pub fn subscribe_topic(&mut self, topic: Topic, handler: Handler) -> SubscriptionId {
        self.by_topic.entry(topic).or_default().push(handler);
        self.alloc_id()
    }

    fn alloc_id(&mut self) -> SubscriptionId {
        let id = self.next_id;
        self.next_id += 1;
        SubscriptionId(id)
    }

    /// Dispatch to every dirty topic's subscribers, then — if anything in
    /// the transaction changed at all, including slices with no dedicated
    /// topic (document title/description, schema packages, schema
    /// relationships) — to the general subscribers. Once per committed
    /// transaction.
    pub fn notify(&mut self, dirty: &std::collections::HashSet<Topic>, any_change: bool) {
        for topic in ALL_TOPICS {
            if dirty.contains(&topic) {
                if let Some(handlers) = self.by_topic.get_mut(&topic) {
                    for h in handlers.iter_mut() {
                        h();
                    }
                }
            }
        }
        if any_change {
            for h in self.general.iter_mut() {
                h();
            }
        }
    }

}
