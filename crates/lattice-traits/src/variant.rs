//! Input variants: per-type customization of a trait view.
//!
//! Every trait view renders through an [`InputVariant`]. The trait's methods
//! all have defaults that implement the base text-input contract, so a
//! variant only overrides what it needs. Hooks returning `Option` use `None`
//! to mean "not provided"; the view then falls back to its built-in
//! behaviour at that extension point.
//!
//! # Example
//!
//! ```
//! use lattice_traits::{InputContent, InputVariant, TraitView};
//!
//! /// A `<select>` whose value is read from its markup.
//! struct SelectVariant;
//!
//! impl InputVariant for SelectVariant {
//!     fn create_input(&self, _view: &TraitView) -> Option<InputContent> {
//!         Some(InputContent::Markup(
//!             r#"<select><option value="a">A</option></select>"#.to_string(),
//!         ))
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use lattice_traits_core::Element;

use crate::view::TraitView;

/// What a variant's input builder produced.
#[derive(Debug, Clone)]
pub enum InputContent {
    /// Markup injected into the field; its first element becomes the input.
    Markup(String),
    /// A constructed element used directly as the input.
    Element(Element),
}

/// Customization points of a trait view.
pub trait InputVariant: Send + Sync {
    /// Build the input control. `None` uses the default text input.
    fn create_input(&self, _view: &TraitView) -> Option<InputContent> {
        None
    }

    /// Build the label markup. `None` uses the default label; `Some("")`
    /// renders an empty label region.
    fn create_label(&self, _view: &TraitView, _label: &str) -> Option<String> {
        None
    }

    /// Markup placed inside the field wrapper before the input is inserted.
    /// `None` uses the default `[data-input]` field; `Some("")` places the
    /// input directly in the wrapper.
    fn template_input(&self, _view: &TraitView) -> Option<String> {
        None
    }

    /// Append a constructed input after existing field children (`true`) or
    /// insert it before them (`false`).
    fn append_input(&self) -> bool {
        true
    }

    /// Whether the view renders a label region.
    fn has_label(&self, view: &TraitView) -> bool {
        !view.model().no_label()
    }

    /// The value sent to the target when the model changes locally.
    fn value_for_target(&self, view: &TraitView) -> Option<String> {
        view.model().value()
    }

    /// Read the value displayed by an input.
    fn input_value(&self, input: &Element) -> Option<String> {
        input.value()
    }

    /// Display a value in an input.
    fn set_input_value(&self, input: &Element, value: &str) {
        input.set_value(value);
    }

    /// Called once the view is bound to its model.
    fn init(&self, _view: &TraitView) {}

    /// Called after the view was torn down.
    fn removed(&self, _view: &TraitView) {}

    /// Called at the end of every render.
    fn on_render(&self, _view: &TraitView) {}
}

/// The base contract, with no customization.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultVariant;

impl InputVariant for DefaultVariant {}

/// Maps trait types to input variants.
#[derive(Clone)]
pub struct VariantRegistry {
    variants: HashMap<String, Arc<dyn InputVariant>>,
    fallback: Arc<dyn InputVariant>,
}

impl Default for VariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl VariantRegistry {
    /// A registry that resolves every type to [`DefaultVariant`].
    pub fn new() -> Self {
        Self {
            variants: HashMap::new(),
            fallback: Arc::new(DefaultVariant),
        }
    }

    /// Register the variant for a trait type, replacing any previous one.
    pub fn register(&mut self, trait_type: impl Into<String>, variant: Arc<dyn InputVariant>) {
        self.variants.insert(trait_type.into(), variant);
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, trait_type: impl Into<String>, variant: Arc<dyn InputVariant>) -> Self {
        self.register(trait_type, variant);
        self
    }

    /// Whether a type has its own variant.
    pub fn contains(&self, trait_type: &str) -> bool {
        self.variants.contains_key(trait_type)
    }

    /// The variant for a type, or the default variant.
    pub fn variant_for(&self, trait_type: &str) -> Arc<dyn InputVariant> {
        self.variants
            .get(trait_type)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

impl fmt::Debug for VariantRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<_> = self.variants.keys().collect();
        types.sort();
        f.debug_struct("VariantRegistry")
            .field("types", &types)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker;
    impl InputVariant for Marker {
        fn append_input(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_registry_fallback() {
        let registry = VariantRegistry::new().with("color", Arc::new(Marker));

        assert!(registry.contains("color"));
        assert!(!registry.contains("text"));
        assert!(!registry.variant_for("color").append_input());
        assert!(registry.variant_for("text").append_input());
    }

    #[test]
    fn test_default_input_value_hooks() {
        let input = Element::new("input");
        DefaultVariant.set_input_value(&input, "12");
        assert_eq!(DefaultVariant.input_value(&input).as_deref(), Some("12"));

        let div = Element::new("div");
        assert_eq!(DefaultVariant.input_value(&div), None);
    }
}
