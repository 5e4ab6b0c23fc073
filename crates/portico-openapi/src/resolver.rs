//! Tag-based route exposure

use portico_core::RouteDescriptor;
use serde_json::Value;

/// Tag marking operations the gateway exposes
pub const DEFAULT_PUBLIC_TAG: &str = "public-api";

/// Tag marking operations the gateway proxies but hides from docs
pub const DEFAULT_HIDDEN_TAG: &str = "private-api";

/// Tag hidden routes carry in the gateway's own documentation
pub const DEFAULT_HIDDEN_MARKER: &str = "X-HIDDEN";

/// How a route is exposed by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exposure {
    /// Proxied and documented
    Public,
    /// Proxied, marked hidden in documentation
    Hidden,
    /// Not proxied at all
    Excluded,
}

/// Exposure settings for one service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPolicy {
    /// Tag that makes a route public
    pub public_tag: String,
    /// Tag that makes a route hidden
    pub hidden_tag: String,
    /// Externally-visible replacement for the hidden tag
    pub hidden_marker: String,
    /// Rewrite tags for downstream documentation; when off, routes lose
    /// their `tags` field entirely
    pub expose_docs: bool,
    /// Drop hidden routes instead of proxying them
    pub ignore_hidden: bool,
}

impl Default for TagPolicy {
    fn default() -> Self {
        Self {
            public_tag: DEFAULT_PUBLIC_TAG.to_string(),
            hidden_tag: DEFAULT_HIDDEN_TAG.to_string(),
            hidden_marker: DEFAULT_HIDDEN_MARKER.to_string(),
            expose_docs: true,
            ignore_hidden: false,
        }
    }
}

impl TagPolicy {
    /// Policy with the given public and hidden tags
    pub fn new(public_tag: impl Into<String>, hidden_tag: impl Into<String>) -> Self {
        Self {
            public_tag: public_tag.into(),
            hidden_tag: hidden_tag.into(),
            ..Self::default()
        }
    }

    /// Set the hidden marker
    pub fn hidden_marker(mut self, marker: impl Into<String>) -> Self {
        self.hidden_marker = marker.into();
        self
    }

    /// Enable or disable documentation exposure
    pub fn expose_docs(mut self, enabled: bool) -> Self {
        self.expose_docs = enabled;
        self
    }

    /// Enable or disable dropping hidden routes
    pub fn ignore_hidden(mut self, enabled: bool) -> Self {
        self.ignore_hidden = enabled;
        self
    }

    fn is_public(&self, tag: &str) -> bool {
        tag.eq_ignore_ascii_case(&self.public_tag)
    }

    fn is_hidden(&self, tag: &str) -> bool {
        tag.eq_ignore_ascii_case(&self.hidden_tag)
    }

    /// Classify a route by its tags. A route carrying the hidden tag, or
    /// already carrying the hidden marker, is hidden.
    pub fn classify(&self, route: &RouteDescriptor) -> Exposure {
        let mut retained = false;
        let mut hidden = false;
        for tag in route.tags() {
            if self.is_hidden(tag) {
                retained = true;
                hidden = true;
            } else if self.is_public(tag) {
                retained = true;
            } else if tag.eq_ignore_ascii_case(&self.hidden_marker) {
                hidden = true;
            }
        }

        match (retained, hidden) {
            (false, _) => Exposure::Excluded,
            (true, true) => Exposure::Hidden,
            (true, false) => Exposure::Public,
        }
    }

    /// The route as the gateway exposes it, or `None` when it is dropped.
    /// The input route is never modified.
    pub fn expose(&self, route: &RouteDescriptor) -> Option<RouteDescriptor> {
        match self.classify(route) {
            Exposure::Excluded => return None,
            Exposure::Hidden if self.ignore_hidden => return None,
            Exposure::Hidden | Exposure::Public => {}
        }

        let mut exposed = route.clone();
        if self.expose_docs {
            if let Some(Value::Array(tags)) = exposed.schema.get_mut("tags") {
                *tags = self.rewrite_tags(tags);
            }
        } else {
            exposed.schema.retain(|key, _| key != "tags");
        }
        Some(exposed)
    }

    fn rewrite_tags(&self, tags: &[Value]) -> Vec<Value> {
        let remap_hidden = !self.hidden_tag.eq_ignore_ascii_case(&self.hidden_marker);
        tags.iter()
            .filter_map(|tag| match tag.as_str() {
                Some(name) if self.is_hidden(name) && remap_hidden => {
                    Some(Value::String(self.hidden_marker.clone()))
                }
                Some(name) if !self.is_hidden(name) && self.is_public(name) => None,
                _ => Some(tag.clone()),
            })
            .collect()
    }
}

/// Resolve compiled routes against a policy, keeping source order
pub fn resolve(routes: &[RouteDescriptor], policy: &TagPolicy) -> Vec<RouteDescriptor> {
    routes.iter().filter_map(|route| policy.expose(route)).collect()
}
