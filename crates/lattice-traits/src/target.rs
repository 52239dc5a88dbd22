//! Targets: the visual-tree nodes whose attributes traits edit.
//!
//! The trait subsystem only needs three things from a target: a live
//! property lookup, its stored attributes, and a setter that applies a
//! trait's value. [`Component`] is an in-memory implementation that also
//! publishes its own mutations, which lets models mirror changes made by
//! other actors.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use lattice_traits_core::Signal;
use parking_lot::RwLock;

use crate::model::{SetOptions, TraitModel};

/// Which storage of a target changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// A stored attribute.
    Attribute,
    /// A live property.
    Property,
}

/// Payload of a target's change signal.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetChange {
    pub key: String,
    pub kind: ChangeKind,
    /// The new value; `None` when the key was removed.
    pub value: Option<String>,
    /// Options of the write that caused the change.
    pub options: SetOptions,
}

impl TargetChange {
    pub fn is_property(&self) -> bool {
        self.kind == ChangeKind::Property
    }
}

/// The node a trait edits.
///
/// Implementations own their storage; trait models only keep a weak
/// reference. `set_target_value` may have arbitrary side effects, including
/// emitting further changes synchronously.
pub trait Target: Send + Sync {
    /// A live (computed) property.
    fn get(&self, key: &str) -> Option<String>;

    /// Snapshot of the stored attributes.
    fn attributes(&self) -> BTreeMap<String, String>;

    /// A single stored attribute.
    fn attribute(&self, key: &str) -> Option<String> {
        self.attributes().get(key).cloned()
    }

    /// Apply a trait's value to the target.
    ///
    /// `options` carry the origin of the change so the target can tell edits
    /// from its own echoes downstream.
    fn set_target_value(&self, model: &TraitModel, value: &str, options: &SetOptions);

    /// Change notifications, when the target publishes them.
    fn changes(&self) -> Option<&Signal<TargetChange>> {
        None
    }
}

/// An in-memory target with attribute and property storage.
///
/// # Signals
///
/// - `changed(TargetChange)`: an attribute or property value changed
pub struct Component {
    tag: String,
    attributes: RwLock<BTreeMap<String, String>>,
    properties: RwLock<HashMap<String, String>>,

    /// Signal emitted when an attribute or property changes.
    pub changed: Signal<TargetChange>,
}

impl Component {
    /// Create a component with no attributes.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: RwLock::new(BTreeMap::new()),
            properties: RwLock::new(HashMap::new()),
            changed: Signal::new(),
        }
    }

    /// Add an attribute during construction.
    pub fn with_attribute(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.write().insert(key.into(), value.into());
        self
    }

    /// Add a property during construction.
    pub fn with_property(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.write().insert(key.into(), value.into());
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Write an attribute, emitting `changed` if it differs.
    pub fn set_attribute(&self, key: &str, value: impl Into<String>, options: SetOptions) -> bool {
        let value = value.into();
        let previous = self
            .attributes
            .write()
            .insert(key.to_string(), value.clone());
        self.notify(key, ChangeKind::Attribute, previous, Some(value), options)
    }

    /// Remove an attribute, emitting `changed` if it existed.
    pub fn remove_attribute(&self, key: &str, options: SetOptions) -> bool {
        let previous = self.attributes.write().remove(key);
        self.notify(key, ChangeKind::Attribute, previous, None, options)
    }

    /// Write a live property, emitting `changed` if it differs.
    pub fn set_property(&self, key: &str, value: impl Into<String>, options: SetOptions) -> bool {
        let value = value.into();
        let previous = self
            .properties
            .write()
            .insert(key.to_string(), value.clone());
        self.notify(key, ChangeKind::Property, previous, Some(value), options)
    }

    fn notify(
        &self,
        key: &str,
        kind: ChangeKind,
        previous: Option<String>,
        value: Option<String>,
        options: SetOptions,
    ) -> bool {
        if previous == value {
            return false;
        }
        if !options.silent {
            self.changed.emit(TargetChange {
                key: key.to_string(),
                kind,
                value,
                options,
            });
        }
        true
    }
}

impl Target for Component {
    fn get(&self, key: &str) -> Option<String> {
        self.properties.read().get(key).cloned()
    }

    fn attributes(&self) -> BTreeMap<String, String> {
        self.attributes.read().clone()
    }

    fn attribute(&self, key: &str) -> Option<String> {
        self.attributes.read().get(key).cloned()
    }

    fn set_target_value(&self, model: &TraitModel, value: &str, options: &SetOptions) {
        if model.change_prop() {
            self.set_property(model.name(), value, *options);
        } else {
            self.set_attribute(model.name(), value, *options);
        }
    }

    fn changes(&self) -> Option<&Signal<TargetChange>> {
        Some(&self.changed)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("tag", &self.tag)
            .field("attributes", &*self.attributes.read())
            .field("properties", &*self.properties.read())
            .finish()
    }
}

static_assertions::assert_impl_all!(Component: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Origin;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_component_storage() {
        let component = Component::new("img")
            .with_attribute("alt", "Logo")
            .with_property("width", "100px");

        assert_eq!(component.attribute("alt").as_deref(), Some("Logo"));
        assert_eq!(component.get("width").as_deref(), Some("100px"));
        assert_eq!(component.get("alt"), None);
        assert_eq!(component.attributes().len(), 1);
    }

    #[test]
    fn test_component_emits_changes_with_options() {
        let component = Component::new("a");
        let received = Arc::new(Mutex::new(Vec::new()));

        let received_clone = received.clone();
        component.changed.connect(move |change| {
            received_clone.lock().push(change.clone());
        });

        assert!(component.set_attribute("href", "/home", SetOptions::external_sync()));
        assert!(!component.set_attribute("href", "/home", SetOptions::external_sync()));
        assert!(component.set_attribute("title", "x", SetOptions::silent()));
        assert!(component.remove_attribute("href", SetOptions::programmatic()));

        let received = received.lock();
        assert_eq!(received.len(), 2);
        assert_eq!(received[0].key, "href");
        assert_eq!(received[0].options.origin, Origin::ExternalSync);
        assert_eq!(received[1].value, None);
    }

    #[test]
    fn test_set_target_value_respects_change_prop() {
        let component = Component::new("div");
        let attr_model = TraitModel::new("title");
        let prop_model = TraitModel::new("width").with_change_prop(true);

        component.set_target_value(&attr_model, "Hello", &SetOptions::local_edit());
        component.set_target_value(&prop_model, "50px", &SetOptions::local_edit());

        assert_eq!(component.attribute("title").as_deref(), Some("Hello"));
        assert_eq!(component.get("width").as_deref(), Some("50px"));
        assert_eq!(component.attribute("width"), None);
    }
}
