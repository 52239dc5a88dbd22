//! Trait view: the binding controller between a trait model and its target.
//!
//! A [`TraitView`] renders a labelled control for one [`TraitModel`] and
//! keeps the control, the model and the target in sync:
//!
//! - A native change on the control writes the control's value into the
//!   model as a [`Origin::LocalEdit`].
//! - A model change is dispatched on its origin:
//!   - [`Origin::ExternalSync`] only refreshes the displayed value. Calling
//!     the target's setter here would echo the change back to its source.
//!   - [`Origin::LocalEdit`] pushes the value to the target with the original
//!     options, so the target can tell the origin downstream.
//!   - [`Origin::ProgrammaticSet`] pushes to the target and also refreshes
//!     the display, since the control did not produce the value. This goes
//!     beyond the plain contract, which only calls the target setter.
//! - When the model is removed the view detaches its subtree and drops all
//!   its connections.
//!
//! Rendering is implemented in [`crate::render`].

use std::fmt;
use std::sync::{Arc, Weak};

use lattice_traits_core::{ConnectionId, Element};
use parking_lot::Mutex;

use crate::config::{EditorHandle, ViewConfig};
use crate::model::{Origin, SetOptions, TraitModel, ValueChange};
use crate::render::FieldRenderer;
use crate::target::Target;
use crate::variant::InputVariant;

/// Lifecycle state of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    /// Constructed, slots not connected yet.
    Unbound,
    /// Connected to the model; both sync directions are live.
    Bound,
    /// The model was removed. Terminal.
    Removed,
}

pub(crate) struct ViewState {
    pub(crate) binding: BindingState,
    /// Default input built for the current render cycle.
    pub(crate) default_input: Option<Element>,
    /// The input handle placed by the last render.
    pub(crate) el_input: Option<Element>,
}

/// Renders and binds one trait.
pub struct TraitView {
    model: Arc<TraitModel>,
    target: Option<Weak<dyn Target>>,
    variant: Arc<dyn InputVariant>,
    config: ViewConfig,
    el: Element,
    pub(crate) state: Mutex<ViewState>,
    el_change: Mutex<Option<ConnectionId>>,
}

impl TraitView {
    /// Create a view for `model` and bind it.
    ///
    /// Any view previously bound to the same model stops receiving its
    /// notifications. The variant's `init` hook runs once binding is done.
    pub fn new(
        model: Arc<TraitModel>,
        variant: Arc<dyn InputVariant>,
        config: ViewConfig,
    ) -> Arc<Self> {
        let target = model.target().map(|target| Arc::downgrade(&target));
        let el = Element::new("div");
        for (key, value) in model.attributes() {
            el.set_attribute(key.as_str(), value.as_str());
        }

        let view = Arc::new(Self {
            model,
            target,
            variant,
            config,
            el,
            state: Mutex::new(ViewState {
                binding: BindingState::Unbound,
                default_input: None,
                el_input: None,
            }),
            el_change: Mutex::new(None),
        });
        view.bind();
        view.variant.init(&view);
        view
    }

    /// Connect the view again, replacing its existing connections.
    pub fn reinitialize(self: &Arc<Self>) {
        if self.binding_state() == BindingState::Removed {
            return;
        }
        self.bind();
    }

    fn bind(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);

        let on_value = weak.clone();
        let on_removed = weak.clone();
        let on_type = weak.clone();
        self.model.replace_view_slots(
            move |change: &ValueChange| {
                if let Some(view) = on_value.upgrade() {
                    view.on_value_change(change);
                }
            },
            move |_| {
                if let Some(view) = on_removed.upgrade() {
                    view.remove_view();
                }
            },
            move |_| {
                if let Some(view) = on_type.upgrade() {
                    view.on_type_change();
                }
            },
        );

        // Native change events are delegated to the root element, so the
        // connection survives re-renders that swap the input.
        let on_change = weak;
        let id = self.el.changed().connect(move |_origin: &Element| {
            if let Some(view) = on_change.upgrade() {
                view.on_change();
            }
        });
        if let Some(previous) = self.el_change.lock().replace(id) {
            self.el.changed().disconnect(previous);
        }

        self.state.lock().binding = BindingState::Bound;
        tracing::debug!(target: "lattice_traits::view", name = %self.model.name(), "view bound");
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn model(&self) -> &Arc<TraitModel> {
        &self.model
    }

    /// The target being edited, while it is alive.
    pub fn component(&self) -> Option<Arc<dyn Target>> {
        self.target.as_ref().and_then(Weak::upgrade)
    }

    pub fn variant(&self) -> &Arc<dyn InputVariant> {
        &self.variant
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// The owning editor.
    pub fn em(&self) -> Option<&EditorHandle> {
        self.config.em.as_ref()
    }

    /// The view's root element.
    pub fn el(&self) -> &Element {
        &self.el
    }

    pub fn binding_state(&self) -> BindingState {
        self.state.lock().binding
    }

    /// Normalized label text.
    pub fn label(&self) -> String {
        FieldRenderer::label_text(&self.model)
    }

    /// The element currently displaying the value, if rendered.
    pub fn input_element(&self) -> Option<Element> {
        let state = self.state.lock();
        state
            .default_input
            .clone()
            .or_else(|| state.el_input.clone())
    }

    // -------------------------------------------------------------------------
    // Synchronization
    // -------------------------------------------------------------------------

    /// Handle a native change on the control: copy its value into the model.
    ///
    /// Without a rendered input, or when the input has no value, nothing is
    /// propagated.
    pub fn on_change(&self) {
        if self.binding_state() != BindingState::Bound {
            return;
        }
        let Some(input) = self.input_element() else {
            return;
        };
        if let Some(value) = self.variant.input_value(&input) {
            tracing::trace!(target: "lattice_traits::view", name = %self.model.name(), %value, "control edited");
            self.model.set_value(value, SetOptions::local_edit());
        }
    }

    /// Handle a model value change.
    ///
    /// Unlike the plain two-way contract, where every change not coming from
    /// the target only reaches the target setter, a
    /// [`Origin::ProgrammaticSet`] also rewrites the displayed input. A
    /// programmatic set arriving while the user is typing replaces the text
    /// being edited. Write with [`SetOptions::local_edit`] to update the
    /// target without touching the control.
    pub fn on_value_change(&self, change: &ValueChange) {
        if self.binding_state() != BindingState::Bound {
            return;
        }
        match change.options.origin {
            Origin::ExternalSync => self.refresh_input(),
            Origin::LocalEdit => self.push_to_target(&change.options),
            Origin::ProgrammaticSet => {
                self.push_to_target(&change.options);
                self.refresh_input();
            }
        }
    }

    /// Display a value in the control. A no-op when nothing is rendered.
    pub fn set_input_value(&self, value: &str) {
        if let Some(input) = self.input_element() {
            self.variant.set_input_value(&input, value);
        }
    }

    fn refresh_input(&self) {
        let value = self.model.value().unwrap_or_default();
        self.set_input_value(&value);
    }

    fn push_to_target(&self, options: &SetOptions) {
        let Some(value) = self.variant.value_for_target(self) else {
            return;
        };
        match self.component() {
            Some(target) => {
                tracing::trace!(target: "lattice_traits::view", name = %self.model.name(), %value, origin = ?options.origin, "pushing value to target");
                target.set_target_value(&self.model, &value, options);
            }
            None => {
                tracing::trace!(target: "lattice_traits::view", name = %self.model.name(), "target dropped, value not pushed");
            }
        }
    }

    fn on_type_change(&self) {
        if self.binding_state() != BindingState::Bound {
            return;
        }
        if let Err(err) = self.rerender() {
            tracing::warn!(target: "lattice_traits::view", name = %self.model.name(), error = %err, "rerender after type change failed");
        }
    }

    // -------------------------------------------------------------------------
    // Teardown
    // -------------------------------------------------------------------------

    /// Detach the rendered subtree and release every connection.
    pub fn remove_view(&self) {
        {
            let mut state = self.state.lock();
            if state.binding == BindingState::Removed {
                return;
            }
            state.binding = BindingState::Removed;
            state.default_input = None;
            state.el_input = None;
        }

        self.model.release_view_slots();
        if let Some(id) = self.el_change.lock().take() {
            self.el.changed().disconnect(id);
        }
        self.el.detach();

        tracing::debug!(target: "lattice_traits::view", name = %self.model.name(), "view removed");
        self.variant.removed(self);
    }
}

impl fmt::Debug for TraitView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraitView")
            .field("model", &self.model.name())
            .field("state", &self.binding_state())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(TraitView: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::Component;
    use crate::variant::DefaultVariant;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn view_for(model: TraitModel, target: &Arc<Component>) -> Arc<TraitView> {
        let model = Arc::new(model);
        let target: Arc<dyn Target> = target.clone();
        model.bind_target(&target);
        TraitView::new(model, Arc::new(DefaultVariant), ViewConfig::default())
    }

    #[test]
    fn test_new_view_is_bound() {
        let target = Arc::new(Component::new("div"));
        let view = view_for(TraitModel::new("title"), &target);

        assert_eq!(view.binding_state(), BindingState::Bound);
        assert!(view.model().has_view());
        assert_eq!(view.el().changed().connection_count(), 1);
        assert!(view.component().is_some());
    }

    #[test]
    fn test_reinitialize_does_not_stack() {
        let target = Arc::new(Component::new("div"));
        let view = view_for(TraitModel::new("title"), &target);

        view.reinitialize();
        view.reinitialize();

        assert_eq!(view.model().value_changed.connection_count(), 1);
        assert_eq!(view.model().removed.connection_count(), 1);
        assert_eq!(view.el().changed().connection_count(), 1);
    }

    #[test]
    fn test_on_change_without_input_is_noop() {
        let target = Arc::new(Component::new("div"));
        let view = view_for(TraitModel::new("title"), &target);

        view.on_change();
        assert_eq!(view.model().value(), None);
        assert_eq!(target.attribute("title"), None);
    }

    #[test]
    fn test_set_input_value_without_input_is_noop() {
        let target = Arc::new(Component::new("div"));
        let view = view_for(TraitModel::new("title"), &target);

        view.set_input_value("ignored");
        assert!(view.input_element().is_none());
    }

    #[test]
    fn test_attributes_applied_to_root() {
        let target = Arc::new(Component::new("div"));
        let view = view_for(
            TraitModel::new("title").with_attribute("data-trait", "title"),
            &target,
        );
        assert_eq!(view.el().attribute("data-trait").as_deref(), Some("title"));
    }

    #[test]
    fn test_init_and_removed_hooks() {
        #[derive(Default)]
        struct Hooks {
            init: AtomicUsize,
            removed: AtomicUsize,
        }
        impl InputVariant for Hooks {
            fn init(&self, _view: &TraitView) {
                self.init.fetch_add(1, Ordering::SeqCst);
            }
            fn removed(&self, _view: &TraitView) {
                self.removed.fetch_add(1, Ordering::SeqCst);
            }
        }

        let hooks = Arc::new(Hooks::default());
        let model = Arc::new(TraitModel::new("title"));
        let view = TraitView::new(model.clone(), hooks.clone(), ViewConfig::default());
        assert_eq!(hooks.init.load(Ordering::SeqCst), 1);

        model.remove();
        model.remove();
        assert_eq!(view.binding_state(), BindingState::Removed);
        assert_eq!(hooks.removed.load(Ordering::SeqCst), 1);
        assert!(!model.has_view());
        assert_eq!(view.el().changed().connection_count(), 0);
    }

    #[test]
    fn test_push_without_target_is_noop() {
        let model = Arc::new(TraitModel::new("title"));
        let view = TraitView::new(model.clone(), Arc::new(DefaultVariant), ViewConfig::default());

        assert!(view.component().is_none());
        model.set_value("orphan", SetOptions::local_edit());
        assert_eq!(model.value().as_deref(), Some("orphan"));
    }
}
