//! Display value resolution.
//!
//! Computes the value a trait's control starts with from the model and its
//! target. Resolution is pure: it never writes to the model. Instead it
//! reports whether the model disagrees with the resolved value, and the
//! caller decides how to bring the two in line.

use crate::model::TraitModel;
use crate::target::Target;

/// Where the display value is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionMode {
    /// The target's live property named after the trait.
    LiveProperty,
    /// The model's own value, falling back to the target's attribute.
    Attribute,
}

impl ResolutionMode {
    /// The mode a model resolves in.
    pub fn of(model: &TraitModel) -> Self {
        if model.change_prop() {
            Self::LiveProperty
        } else {
            Self::Attribute
        }
    }
}

/// Outcome of resolving a trait's display value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The value to display; never undefined.
    pub value: String,
    /// The model's value differs from `value` and should be brought in line.
    pub needs_sync: bool,
}

/// Resolve the display value of `model` against `target`.
///
/// - In [`ResolutionMode::LiveProperty`] the target's property wins,
///   whatever the model holds.
/// - In [`ResolutionMode::Attribute`] a non-empty model value wins,
///   otherwise the target's attribute is used.
///
/// Anything still undefined (including a missing target) resolves to the
/// empty string.
pub fn resolve(model: &TraitModel, target: Option<&dyn Target>) -> Resolution {
    let name = model.name();
    let current = model.value();

    let resolved = match ResolutionMode::of(model) {
        ResolutionMode::LiveProperty => target.and_then(|target| target.get(name)),
        ResolutionMode::Attribute => current
            .clone()
            .filter(|value| !value.is_empty())
            .or_else(|| target.and_then(|target| target.attribute(name))),
    };

    let value = resolved.unwrap_or_default();
    let needs_sync = current.as_deref() != Some(value.as_str());
    Resolution { value, needs_sync }
}

/// Resolve only the display value.
pub fn resolve_value(model: &TraitModel, target: Option<&dyn Target>) -> String {
    resolve(model, target).value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::Component;

    #[test]
    fn test_change_prop_reads_live_property() {
        let target = Component::new("div").with_property("width", "100px");
        let model = TraitModel::new("width")
            .with_change_prop(true)
            .with_value("20px");

        let resolution = resolve(&model, Some(&target));
        assert_eq!(resolution.value, "100px");
        assert!(resolution.needs_sync);
    }

    #[test]
    fn test_attribute_mode_prefers_model_value() {
        let target = Component::new("a").with_attribute("title", "From target");
        let model = TraitModel::new("title").with_value("From model");

        let resolution = resolve(&model, Some(&target));
        assert_eq!(resolution.value, "From model");
        assert!(!resolution.needs_sync);
    }

    #[test]
    fn test_empty_model_value_falls_back_to_attribute() {
        let target = Component::new("a").with_attribute("title", "From target");
        let model = TraitModel::new("title").with_value("");

        assert_eq!(resolve_value(&model, Some(&target)), "From target");
    }

    #[test]
    fn test_undefined_resolves_to_empty_string() {
        let target = Component::new("a");
        let model = TraitModel::new("title");

        let resolution = resolve(&model, Some(&target));
        assert_eq!(resolution.value, "");
        // The model is undefined, so it must be brought in line
        assert!(resolution.needs_sync);

        assert_eq!(resolve_value(&model, None), "");
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let target = Component::new("a").with_attribute("href", "/about");
        let model = TraitModel::new("href");

        let first = resolve(&model, Some(&target));
        let second = resolve(&model, Some(&target));
        assert_eq!(first, second);
        assert_eq!(model.value(), None);
    }
}
