//! Prometheus counters served on `/metrics`.

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct MutationLabels {
    pub entity: &'static str,
    pub op: &'static str,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct TransitionLabels {
    pub to: String,
}

pub struct Metrics {
    registry: Registry,
    mutations: Family<MutationLabels, Counter>,
    transitions: Family<TransitionLabels, Counter>,
    chat_messages: Counter,
    chat_deliveries: Counter,
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix("offcampus");
        let mutations = Family::<MutationLabels, Counter>::default();
        let transitions = Family::<TransitionLabels, Counter>::default();
        let chat_messages = Counter::default();
        let chat_deliveries = Counter::default();

        registry.register(
            "content_mutations",
            "Successful writes to comments, replies, topics, posts, likes and reports",
            mutations.clone(),
        );
        registry.register(
            "moderation_transitions",
            "Report status changes by target status",
            transitions.clone(),
        );
        registry.register("chat_messages", "Chat messages persisted", chat_messages.clone());
        registry.register(
            "chat_deliveries",
            "Chat events handed to live connections",
            chat_deliveries.clone(),
        );

        Self {
            registry,
            mutations,
            transitions,
            chat_messages,
            chat_deliveries,
        }
    }

    pub fn mutation(&self, entity: &'static str, op: &'static str) {
        self.mutations.get_or_create(&MutationLabels { entity, op }).inc();
    }

    pub fn transition(&self, to: &str) {
        self.transitions
            .get_or_create(&TransitionLabels { to: to.to_string() })
            .inc();
    }

    pub fn chat_delivered(&self, connections: usize) {
        self.chat_messages.inc();
        self.chat_deliveries.inc_by(connections as u64);
    }

    /// OpenMetrics text exposition.
    pub fn encode(&self) -> Result<String, std::fmt::Error> {
        let mut out = String::new();
        encode(&mut out, &self.registry)?;
        Ok(out)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}
