//! Trait model: one editable property bound to one target.
//!
//! A [`TraitModel`] describes a property (name, label, input type, bounds),
//! holds its current value, and owns the signals a view listens to. Every
//! write carries [`SetOptions`], whose [`Origin`] tells listeners where the
//! change came from so they can decide whether to push it to the target,
//! refresh the display, or both.
//!
//! # Example
//!
//! ```
//! use lattice_traits::{SetOptions, TraitModel};
//!
//! let model = TraitModel::new("title").with_placeholder("Page title");
//!
//! model.value_changed.connect(|change| {
//!     println!("{:?} from {:?}", change.value, change.options.origin);
//! });
//!
//! assert!(model.set_value("Home", SetOptions::programmatic()));
//! // Writing the same value again is not a change
//! assert!(!model.set_value("Home", SetOptions::programmatic()));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use lattice_traits_core::{ConnectionId, Element, Property, Signal};
use parking_lot::Mutex;

use crate::config::TraitConfig;
use crate::target::{Target, TargetChange};

/// Where a value change came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Origin {
    /// The user edited the rendered control.
    LocalEdit,
    /// The target changed on its own; only the display needs to follow.
    ExternalSync,
    /// Code set the value directly.
    #[default]
    ProgrammaticSet,
}

/// Options accompanying a model write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SetOptions {
    /// Store the value without notifying listeners.
    pub silent: bool,
    /// Where the change came from.
    pub origin: Origin,
}

impl SetOptions {
    /// Options for an edit made in the rendered control.
    pub fn local_edit() -> Self {
        Self {
            silent: false,
            origin: Origin::LocalEdit,
        }
    }

    /// Options for a change mirrored from the target.
    pub fn external_sync() -> Self {
        Self {
            silent: false,
            origin: Origin::ExternalSync,
        }
    }

    /// Options for a change made from code.
    pub fn programmatic() -> Self {
        Self::default()
    }

    /// Options for a write that must not notify anyone.
    pub fn silent() -> Self {
        Self {
            silent: true,
            origin: Origin::ProgrammaticSet,
        }
    }

    /// Whether the change originated from the target itself.
    pub fn from_target(&self) -> bool {
        self.origin == Origin::ExternalSync
    }
}

/// Payload of [`TraitModel::value_changed`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValueChange {
    /// Name of the trait that changed.
    pub name: String,
    /// The new value.
    pub value: Option<String>,
    /// Options the value was written with.
    pub options: SetOptions,
}

struct ViewBinding {
    value: ConnectionId,
    removed: ConnectionId,
    type_changed: ConnectionId,
}

struct TargetBinding {
    target: Weak<dyn Target>,
    changes: Option<ConnectionId>,
}

/// An editable property descriptor bound to a single target.
///
/// # Signals
///
/// - `value_changed(ValueChange)`: the value changed and the write was not silent
/// - `type_changed(String)`: the input type changed; views rebuild their control
/// - `removed(())`: the model left its collection; views tear down
pub struct TraitModel {
    name: String,
    label: Option<String>,
    trait_type: Property<String>,
    value: Property<Option<String>>,
    change_prop: bool,
    placeholder: Option<String>,
    default_value: Option<String>,
    min: Option<String>,
    max: Option<String>,
    no_label: bool,
    attributes: BTreeMap<String, String>,

    target: Mutex<Option<TargetBinding>>,
    /// Input element kept across re-renders of an enclosing list.
    retained_input: Mutex<Option<Element>>,
    view_binding: Mutex<Option<ViewBinding>>,
    is_removed: AtomicBool,

    /// Signal emitted when the value changes.
    pub value_changed: Signal<ValueChange>,
    /// Signal emitted when the input type changes.
    pub type_changed: Signal<String>,
    /// Signal emitted once when the model is removed.
    pub removed: Signal<()>,
}

impl TraitModel {
    /// Create a text trait for `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            trait_type: Property::new("text".to_string()),
            value: Property::new(None),
            change_prop: false,
            placeholder: None,
            default_value: None,
            min: None,
            max: None,
            no_label: false,
            attributes: BTreeMap::new(),
            target: Mutex::new(None),
            retained_input: Mutex::new(None),
            view_binding: Mutex::new(None),
            is_removed: AtomicBool::new(false),
            value_changed: Signal::new(),
            type_changed: Signal::new(),
            removed: Signal::new(),
        }
    }

    /// Create a model from a declarative definition.
    pub fn from_config(config: TraitConfig) -> Self {
        let mut model = Self::new(config.name);
        model.label = config.label;
        if let Some(trait_type) = config.trait_type {
            model.trait_type.set_silent(trait_type);
        }
        model.value.set_silent(config.value);
        model.change_prop = config.change_prop;
        model.placeholder = config.placeholder;
        model.default_value = config.default_value;
        model.min = config.min;
        model.max = config.max;
        model.no_label = config.no_label;
        model.attributes = config.attributes;
        model
    }

    /// Set the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the input type.
    pub fn with_type(self, trait_type: impl Into<String>) -> Self {
        self.trait_type.set_silent(trait_type.into());
        self
    }

    /// Set the initial value.
    pub fn with_value(self, value: impl Into<String>) -> Self {
        self.value.set_silent(Some(value.into()));
        self
    }

    /// Read a live target property instead of a stored attribute.
    pub fn with_change_prop(mut self, change_prop: bool) -> Self {
        self.change_prop = change_prop;
        self
    }

    /// Set the placeholder text.
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Set the default value, used as placeholder fallback.
    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }

    /// Set the accepted range.
    pub fn with_range(mut self, min: impl Into<String>, max: impl Into<String>) -> Self {
        self.min = Some(min.into());
        self.max = Some(max.into());
        self
    }

    /// Render without a label region.
    pub fn with_no_label(mut self, no_label: bool) -> Self {
        self.no_label = no_label;
        self
    }

    /// Add an attribute for the view's root element.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    // -------------------------------------------------------------------------
    // Descriptor
    // -------------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn trait_type(&self) -> String {
        self.trait_type.get()
    }

    pub fn change_prop(&self) -> bool {
        self.change_prop
    }

    pub fn placeholder(&self) -> Option<&str> {
        self.placeholder.as_deref()
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default_value.as_deref()
    }

    pub fn min(&self) -> Option<&str> {
        self.min.as_deref()
    }

    pub fn max(&self) -> Option<&str> {
        self.max.as_deref()
    }

    pub fn no_label(&self) -> bool {
        self.no_label
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    // -------------------------------------------------------------------------
    // Value
    // -------------------------------------------------------------------------

    /// The current value; `None` when never set.
    pub fn value(&self) -> Option<String> {
        self.value.get()
    }

    /// Write the value.
    ///
    /// Returns `true` if the value changed. `value_changed` is emitted only
    /// for an actual change written without `silent`. No lock is held while
    /// listeners run, so they may write the model again.
    pub fn set_value(&self, value: impl Into<String>, options: SetOptions) -> bool {
        let value = value.into();
        if !self.value.set(Some(value.clone())) {
            return false;
        }
        tracing::trace!(target: "lattice_traits::model", name = %self.name, %value, ?options, "value changed");
        if !options.silent {
            self.value_changed.emit(ValueChange {
                name: self.name.clone(),
                value: Some(value),
                options,
            });
        }
        true
    }

    /// Change the input type, notifying bound views.
    pub fn set_type(&self, trait_type: impl Into<String>) -> bool {
        let trait_type = trait_type.into();
        if !self.trait_type.set(trait_type.clone()) {
            return false;
        }
        self.type_changed.emit(trait_type);
        true
    }

    // -------------------------------------------------------------------------
    // Target
    // -------------------------------------------------------------------------

    /// The bound target, if it is still alive.
    pub fn target(&self) -> Option<Arc<dyn Target>> {
        self.target
            .lock()
            .as_ref()
            .and_then(|binding| binding.target.upgrade())
    }

    /// Bind the model to its target.
    ///
    /// Only a weak reference is kept. When the target publishes changes,
    /// changes to this trait's key are mirrored into the model with
    /// [`Origin::ExternalSync`]. Binding again replaces the previous
    /// target and its tracking connection.
    pub fn bind_target(self: &Arc<Self>, target: &Arc<dyn Target>) {
        self.release_target();

        let changes = target.changes().map(|signal| {
            let weak_model = Arc::downgrade(self);
            signal.connect(move |change: &TargetChange| {
                if let Some(model) = weak_model.upgrade() {
                    model.on_target_change(change);
                }
            })
        });

        *self.target.lock() = Some(TargetBinding {
            target: Arc::downgrade(target),
            changes,
        });
        tracing::debug!(target: "lattice_traits::model", name = %self.name, tracked = changes.is_some(), "bound to target");
    }

    fn on_target_change(&self, change: &TargetChange) {
        if change.key != self.name || change.is_property() != self.change_prop {
            return;
        }
        let options = SetOptions {
            silent: change.options.silent,
            origin: Origin::ExternalSync,
        };
        self.set_value(change.value.clone().unwrap_or_default(), options);
    }

    fn release_target(&self) {
        let binding = self.target.lock().take();
        if let Some(TargetBinding {
            target,
            changes: Some(id),
        }) = binding
        {
            if let Some(target) = target.upgrade() {
                if let Some(signal) = target.changes() {
                    signal.disconnect(id);
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Retained input
    // -------------------------------------------------------------------------

    /// The input element kept from the last render, if any.
    pub fn retained_input(&self) -> Option<Element> {
        self.retained_input.lock().clone()
    }

    /// Keep an input element for later renders.
    pub fn retain_input(&self, input: Option<Element>) {
        *self.retained_input.lock() = input;
    }

    /// Drop the retained input so the next render builds a new one.
    pub fn invalidate_input(&self) {
        self.retained_input.lock().take();
    }

    // -------------------------------------------------------------------------
    // View slots
    // -------------------------------------------------------------------------

    /// Connect a view's slots, disconnecting the slots of any view bound
    /// before. A model therefore drives at most one view.
    pub fn replace_view_slots<V, R, T>(&self, on_value: V, on_removed: R, on_type: T)
    where
        V: Fn(&ValueChange) + Send + Sync + 'static,
        R: Fn(&()) + Send + Sync + 'static,
        T: Fn(&String) + Send + Sync + 'static,
    {
        let mut binding = self.view_binding.lock();
        if let Some(previous) = binding.take() {
            tracing::debug!(target: "lattice_traits::model", name = %self.name, "replacing view slots");
            self.disconnect_view(previous);
        }
        *binding = Some(ViewBinding {
            value: self.value_changed.connect(on_value),
            removed: self.removed.connect(on_removed),
            type_changed: self.type_changed.connect(on_type),
        });
    }

    /// Disconnect the bound view's slots.
    pub fn release_view_slots(&self) {
        let binding = self.view_binding.lock().take();
        if let Some(binding) = binding {
            self.disconnect_view(binding);
        }
    }

    /// Whether a view is currently connected.
    pub fn has_view(&self) -> bool {
        self.view_binding.lock().is_some()
    }

    fn disconnect_view(&self, binding: ViewBinding) {
        self.value_changed.disconnect(binding.value);
        self.removed.disconnect(binding.removed);
        self.type_changed.disconnect(binding.type_changed);
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Remove the model: notify views once, then stop tracking the target.
    pub fn remove(&self) {
        if self.is_removed.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::debug!(target: "lattice_traits::model", name = %self.name, "removing trait");
        self.removed.emit(());
        self.release_target();
    }

    /// Whether [`remove`](Self::remove) has run.
    pub fn is_removed(&self) -> bool {
        self.is_removed.load(Ordering::SeqCst)
    }
}

impl Drop for TraitModel {
    fn drop(&mut self) {
        self.release_target();
    }
}

impl fmt::Debug for TraitModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraitModel")
            .field("name", &self.name)
            .field("type", &self.trait_type.get())
            .field("value", &self.value.get())
            .field("change_prop", &self.change_prop)
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(TraitModel: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_set_value_emits_on_change_only() {
        let model = TraitModel::new("title");
        let received = Arc::new(Mutex::new(Vec::new()));

        let received_clone = received.clone();
        model.value_changed.connect(move |change| {
            received_clone.lock().push((change.value.clone(), change.options.origin));
        });

        assert!(model.set_value("a", SetOptions::local_edit()));
        assert!(!model.set_value("a", SetOptions::local_edit()));
        assert!(model.set_value("b", SetOptions::external_sync()));

        assert_eq!(
            *received.lock(),
            vec![
                (Some("a".to_string()), Origin::LocalEdit),
                (Some("b".to_string()), Origin::ExternalSync),
            ]
        );
    }

    #[test]
    fn test_silent_write_stores_without_notifying() {
        let model = TraitModel::new("title");
        let calls = Arc::new(AtomicUsize::new(0));

        let calls_clone = calls.clone();
        model.value_changed.connect(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert!(model.set_value("quiet", SetOptions::silent()));
        assert_eq!(model.value().as_deref(), Some("quiet"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_from_target_only_for_external_sync() {
        assert!(SetOptions::external_sync().from_target());
        assert!(!SetOptions::local_edit().from_target());
        assert!(!SetOptions::programmatic().from_target());
        assert!(!SetOptions::silent().from_target());
    }

    #[test]
    fn test_from_config() {
        let config = TraitConfig {
            name: "href".into(),
            label: Some("Link".into()),
            trait_type: Some("url".into()),
            value: Some("https://example.com".into()),
            placeholder: Some("https://".into()),
            ..Default::default()
        };
        let model = TraitModel::from_config(config);

        assert_eq!(model.name(), "href");
        assert_eq!(model.label(), Some("Link"));
        assert_eq!(model.trait_type(), "url");
        assert_eq!(model.value().as_deref(), Some("https://example.com"));
        assert_eq!(model.placeholder(), Some("https://"));
        assert!(!model.change_prop());
    }

    #[test]
    fn test_default_type_is_text() {
        let model = TraitModel::from_config(TraitConfig::named("alt"));
        assert_eq!(model.trait_type(), "text");
        assert_eq!(model.value(), None);
    }

    #[test]
    fn test_set_type_notifies() {
        let model = TraitModel::new("size");
        let received = Arc::new(Mutex::new(Vec::new()));

        let received_clone = received.clone();
        model.type_changed.connect(move |t| received_clone.lock().push(t.clone()));

        assert!(model.set_type("number"));
        assert!(!model.set_type("number"));
        assert_eq!(*received.lock(), vec!["number".to_string()]);
    }

    #[test]
    fn test_replace_view_slots_does_not_stack() {
        let model = TraitModel::new("title");
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let first_clone = first.clone();
        model.replace_view_slots(
            move |_| {
                first_clone.fetch_add(1, Ordering::SeqCst);
            },
            |_| {},
            |_| {},
        );
        let second_clone = second.clone();
        model.replace_view_slots(
            move |_| {
                second_clone.fetch_add(1, Ordering::SeqCst);
            },
            |_| {},
            |_| {},
        );

        assert_eq!(model.value_changed.connection_count(), 1);
        assert_eq!(model.removed.connection_count(), 1);
        assert_eq!(model.type_changed.connection_count(), 1);

        model.set_value("x", SetOptions::programmatic());
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);

        model.release_view_slots();
        assert!(!model.has_view());
        assert_eq!(model.value_changed.connection_count(), 0);
    }

    #[test]
    fn test_retained_input_slot() {
        let model = TraitModel::new("title");
        assert!(model.retained_input().is_none());

        let input = Element::new("input");
        model.retain_input(Some(input.clone()));
        assert!(model.retained_input().unwrap().ptr_eq(&input));

        model.invalidate_input();
        assert!(model.retained_input().is_none());
    }

    #[test]
    fn test_dropped_model_stops_tracking_target() {
        use crate::target::Component;

        let component = Arc::new(Component::new("a"));
        let target: Arc<dyn Target> = component.clone();

        let model = Arc::new(TraitModel::new("title"));
        model.bind_target(&target);
        assert_eq!(component.changed.connection_count(), 1);

        drop(model);
        assert_eq!(component.changed.connection_count(), 0);
    }

    #[test]
    fn test_remove_fires_once() {
        let model = TraitModel::new("title");
        let calls = Arc::new(AtomicUsize::new(0));

        let calls_clone = calls.clone();
        model.removed.connect(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        model.remove();
        model.remove();
        assert!(model.is_removed());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
