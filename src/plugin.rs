//! Plugin registry: the named classifiers whose order sets label priority.
//!
//! Only a plugin's name matters here. The registry enumerates active
//! plugins in registration order and that order, highest priority first,
//! is what priority resolution checks labels against.

use crate::model::Level3Kind;

/// A named classifier.
pub trait Plugin {
    fn name(&self) -> &str;
}

/// Flags actions repeating the other actor's wording.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoPlugin;

impl Plugin for EchoPlugin {
    fn name(&self) -> &str {
        Level3Kind::Echo.as_str()
    }
}

/// Flags actions that change subject.
#[derive(Debug, Clone, Copy, Default)]
pub struct TopicShiftPlugin;

impl Plugin for TopicShiftPlugin {
    fn name(&self) -> &str {
        Level3Kind::TopicShift.as_str()
    }
}

/// Flags actions that undo or repeat very recent own content.
#[derive(Debug, Clone, Copy, Default)]
pub struct MindlessEditPlugin;

impl Plugin for MindlessEditPlugin {
    fn name(&self) -> &str {
        Level3Kind::MindlessEdit.as_str()
    }
}

/// A plugin declared by name in configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedPlugin {
    name: String,
}

impl NamedPlugin {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Plugin for NamedPlugin {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Active plugins, in priority order.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in interpretive plugins: echo, topic shift, mindless edit.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(EchoPlugin);
        registry.register(TopicShiftPlugin);
        registry.register(MindlessEditPlugin);
        registry
    }

    /// A registry of configured names, kept in the given order.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = Self::new();
        for name in names {
            registry.register(NamedPlugin::new(name));
        }
        registry
    }

    /// Add a plugin at the lowest priority.
    pub fn register(&mut self, plugin: impl Plugin + 'static) {
        self.plugins.push(Box::new(plugin));
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Plugin> {
        self.plugins.iter().map(AsRef::as_ref)
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Plugin names in registration order. Duplicates are kept.
    pub fn priority_order(&self) -> Vec<String> {
        self.iter().map(|p| p.name().to_string()).collect()
    }
}
