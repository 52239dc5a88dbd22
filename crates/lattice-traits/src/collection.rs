//! The set of traits edited on one target.
//!
//! A [`TraitCollection`] owns the models and views for a single target and
//! renders them into one container element. Variants are picked from a
//! [`VariantRegistry`] by trait type.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use lattice_traits::{Component, Target, TraitCollection, VariantRegistry, ViewConfig};
//!
//! let target: Arc<dyn Target> = Arc::new(Component::new("a").with_attribute("href", "/"));
//! let traits = TraitCollection::new(&target, ViewConfig::new("trt-", "gjs-"), VariantRegistry::new());
//!
//! traits.add_json(r#"["title", { "name": "href", "type": "url" }]"#)?;
//! let panel = traits.render()?;
//! assert_eq!(panel.child_count(), 2);
//! # Ok::<(), lattice_traits::Error>(())
//! ```

use std::fmt;
use std::sync::{Arc, Weak};

use lattice_traits_core::{Element, ElementTreeDebug};
use parking_lot::Mutex;

use crate::config::{TraitConfig, ViewConfig};
use crate::error::{Error, Result};
use crate::model::TraitModel;
use crate::target::Target;
use crate::variant::VariantRegistry;
use crate::view::TraitView;

/// Models and views for one target.
pub struct TraitCollection {
    target: Weak<dyn Target>,
    config: ViewConfig,
    registry: VariantRegistry,
    views: Mutex<Vec<Arc<TraitView>>>,
    container: Element,
}

impl TraitCollection {
    pub fn new(target: &Arc<dyn Target>, config: ViewConfig, registry: VariantRegistry) -> Self {
        let container = Element::new("div");
        container.set_class_name(format!("{}traits", config.style_prefix));
        Self {
            target: Arc::downgrade(target),
            config,
            registry,
            views: Mutex::new(Vec::new()),
            container,
        }
    }

    /// The edited target, while it is alive.
    pub fn target(&self) -> Option<Arc<dyn Target>> {
        self.target.upgrade()
    }

    /// The element views are rendered into.
    pub fn container(&self) -> &Element {
        &self.container
    }

    /// Add a trait and create its bound view.
    pub fn add(&self, config: TraitConfig) -> Result<Arc<TraitView>> {
        if config.name.trim().is_empty() {
            return Err(Error::MissingName);
        }
        if self.get(&config.name).is_some() {
            return Err(Error::DuplicateTrait(config.name));
        }

        let model = Arc::new(TraitModel::from_config(config));
        if let Some(target) = self.target() {
            model.bind_target(&target);
        }
        let variant = self.registry.variant_for(&model.trait_type());
        let view = TraitView::new(model, variant, self.config.clone());

        // Variant init may have re-entered the collection
        let mut views = self.views.lock();
        if views.iter().any(|v| v.model().name() == view.model().name()) {
            drop(views);
            view.model().remove();
            return Err(Error::DuplicateTrait(view.model().name().to_string()));
        }
        views.push(view.clone());
        drop(views);

        tracing::debug!(target: "lattice_traits::collection", name = %view.model().name(), trait_type = %view.model().trait_type(), "trait added");
        Ok(view)
    }

    /// Add every trait of a JSON definition list.
    pub fn add_json(&self, json: &str) -> Result<Vec<Arc<TraitView>>> {
        TraitConfig::list_from_json(json)?
            .into_iter()
            .map(|config| self.add(config))
            .collect()
    }

    /// The model of a trait.
    pub fn get(&self, name: &str) -> Option<Arc<TraitModel>> {
        self.view(name).map(|view| view.model().clone())
    }

    /// The view of a trait.
    pub fn view(&self, name: &str) -> Option<Arc<TraitView>> {
        self.views
            .lock()
            .iter()
            .find(|view| view.model().name() == name)
            .cloned()
    }

    /// Trait names in insertion order.
    pub fn names(&self) -> Vec<String> {
        self.views
            .lock()
            .iter()
            .map(|view| view.model().name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.views.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.lock().is_empty()
    }

    /// Remove a trait. Its view detaches and drops its connections.
    pub fn remove(&self, name: &str) -> Option<Arc<TraitModel>> {
        let view = {
            let mut views = self.views.lock();
            let index = views.iter().position(|view| view.model().name() == name)?;
            views.remove(index)
        };
        let model = view.model().clone();
        model.remove();
        tracing::debug!(target: "lattice_traits::collection", %name, "trait removed");
        Some(model)
    }

    /// Remove every trait.
    pub fn reset(&self) {
        let views = std::mem::take(&mut *self.views.lock());
        for view in &views {
            view.model().remove();
        }
        self.container.clear_children();
        tracing::debug!(target: "lattice_traits::collection", count = views.len(), "traits reset");
    }

    /// Render every view into the container.
    ///
    /// Inputs retained on the models are reused, so a control being edited
    /// keeps its identity across panel renders.
    /// On failure the container keeps the views it held before.
    pub fn render(&self) -> Result<Element> {
        let views = self.views.lock().clone();
        let rendered = views
            .iter()
            .map(|view| view.render())
            .collect::<Result<Vec<_>>>()?;

        self.container.clear_children();
        for el in &rendered {
            self.container.append_child(el);
        }
        if tracing::enabled!(target: "lattice_traits::collection", tracing::Level::TRACE) {
            let tree = ElementTreeDebug::new().with_max_depth(6).format_tree(&self.container);
            tracing::trace!(target: "lattice_traits::collection", count = views.len(), %tree, "traits rendered");
        }
        Ok(self.container.clone())
    }
}

impl Drop for TraitCollection {
    fn drop(&mut self) {
        self.reset();
    }
}

impl fmt::Debug for TraitCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraitCollection")
            .field("names", &self.names())
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(TraitCollection: Send, Sync);
