//! Rendering of trait views.
//!
//! [`FieldRenderer`] holds the pure builders: label text and markup, the
//! wrapper scaffold, and the default text input. The render cycle itself is
//! implemented on [`TraitView`] because it interleaves those builders with
//! the view's variant hooks and input bookkeeping.
//!
//! A rendered view looks like this (prefixes omitted):
//!
//! ```text
//! <div class="trait__wrp">                       root element
//!   <div class="trait">
//!     <div class="label-wrp" data-label>         only when labelled
//!       <div class="label" title="Width">Width</div>
//!     </div>
//!     <div class="field-wrp field-wrp--text" data-input>
//!       <div class="field field-text" data-input>
//!         <input type="text" placeholder="">     the input handle
//!       </div>
//!     </div>
//!   </div>
//! </div>
//! ```

use lattice_traits_core::{Element, PerfSpan};
use quick_xml::escape::escape;

use crate::config::ViewConfig;
use crate::error::{Error, Result};
use crate::model::{SetOptions, TraitModel};
use crate::resolve::resolve;
use crate::target::Target;
use crate::variant::InputContent;
use crate::view::TraitView;

/// Builders for the pieces of a trait view.
#[derive(Debug, Clone)]
pub struct FieldRenderer {
    pfx: String,
    ppfx: String,
}

impl FieldRenderer {
    pub fn new(config: &ViewConfig) -> Self {
        Self {
            pfx: config.style_prefix.clone(),
            ppfx: config.p_style_prefix.clone(),
        }
    }

    /// Label text: the label (or name) capitalized, hyphens as spaces.
    pub fn label_text(model: &TraitModel) -> String {
        let source = model
            .label()
            .filter(|label| !label.is_empty())
            .unwrap_or_else(|| model.name());
        capitalize(source).replace('-', " ")
    }

    /// Default label markup.
    pub fn label_markup(&self, label: &str) -> String {
        let label = escape(label);
        format!(r#"<div class="{}label" title="{label}">{label}</div>"#, self.ppfx)
    }

    /// Class of the inner field for a trait type.
    pub fn field_class(&self, trait_type: &str) -> String {
        format!("{ppfx}field {ppfx}field-{trait_type}", ppfx = self.ppfx)
    }

    /// Default markup placed inside the field wrapper.
    pub fn default_template_input(&self, trait_type: &str) -> String {
        format!(
            r#"<div class="{}" data-input></div>"#,
            escape(&self.field_class(trait_type))
        )
    }

    /// Build the `{pfx}trait` wrapper with its label and field regions.
    pub fn scaffold(
        &self,
        trait_type: &str,
        has_label: bool,
        template_input: &str,
    ) -> lattice_traits_core::Result<Element> {
        let ppfx = &self.ppfx;
        let wrapper = Element::new("div");
        wrapper.set_class_name(format!("{}trait", self.pfx));

        if has_label {
            let label = Element::new("div");
            label.set_class_name(format!("{ppfx}label-wrp"));
            label.set_attribute("data-label", "");
            wrapper.append_child(&label);
        }

        let field = Element::new("div");
        field.set_class_name(format!("{ppfx}field-wrp {ppfx}field-wrp--{trait_type}"));
        field.set_attribute("data-input", "");
        field.append_markup(template_input)?;
        wrapper.append_child(&field);

        Ok(wrapper)
    }

    /// Build the default text-like input, seeded with the resolved value.
    ///
    /// When the model disagrees with the resolved value it is updated
    /// silently first, so model and control start out consistent.
    pub fn build_default_input(model: &TraitModel, target: Option<&dyn Target>) -> Element {
        let trait_type = model.trait_type();
        let trait_type = if trait_type.is_empty() {
            "text".to_string()
        } else {
            trait_type
        };
        let placeholder = non_empty(model.placeholder())
            .or_else(|| non_empty(model.default_value()))
            .unwrap_or("");

        let input = Element::new("input");
        input.set_attribute("type", trait_type);
        input.set_attribute("placeholder", placeholder);

        let resolution = resolve(model, target);
        if resolution.needs_sync {
            model.set_value(resolution.value.clone(), SetOptions::silent());
        }
        input.set_value(resolution.value);

        if let Some(min) = non_empty(model.min()) {
            input.set_attribute("min", min);
        }
        if let Some(max) = non_empty(model.max()) {
            input.set_attribute("max", max);
        }

        input
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl TraitView {
    /// Render the view and return its root element.
    ///
    /// The default input cached for the previous cycle is dropped, but an
    /// input retained on the model is reused as is.
    pub fn render(&self) -> Result<Element> {
        let _span = PerfSpan::new("trait_view_render");
        let renderer = FieldRenderer::new(self.config());
        let model = self.model();
        let trait_type = model.trait_type();
        let has_label = self.variant().has_label(self);

        self.state.lock().default_input = None;

        let template = self
            .variant()
            .template_input(self)
            .unwrap_or_else(|| renderer.default_template_input(&trait_type));
        let wrapper = renderer
            .scaffold(&trait_type, has_label, &template)
            .map_err(|e| Error::markup(model.name(), e))?;

        let el = self.el();
        el.clear_children();
        el.append_child(&wrapper);

        if has_label {
            self.render_label(&renderer)?;
        }
        self.render_field()?;

        el.set_class_name(format!("{}trait__wrp", self.config().style_prefix));
        tracing::trace!(target: "lattice_traits::view", name = %model.name(), "rendered");
        self.variant().on_render(self);
        Ok(el.clone())
    }

    /// Drop the retained input and render from scratch.
    pub fn rerender(&self) -> Result<Element> {
        tracing::debug!(target: "lattice_traits::view", name = %self.model().name(), "rerendering");
        self.model().invalidate_input();
        self.render()
    }

    fn render_label(&self, renderer: &FieldRenderer) -> Result<()> {
        let label = self.label();
        let markup = self
            .variant()
            .create_label(self, &label)
            .unwrap_or_else(|| renderer.label_markup(&label));

        for region in self.el().descendants_with_attribute("data-label") {
            region
                .append_markup(&markup)
                .map_err(|e| Error::markup(self.model().name(), e))?;
        }
        Ok(())
    }

    fn render_field(&self) -> Result<()> {
        let model = self.model();
        let Some(field) = self.el().descendants_with_attribute("data-input").pop() else {
            tracing::warn!(target: "lattice_traits::view", name = %model.name(), "no [data-input] region to render into");
            return Ok(());
        };

        let content = match model.retained_input() {
            Some(retained) => InputContent::Element(retained),
            None => match self.variant().create_input(self) {
                Some(content) => content,
                None => InputContent::Element(self.default_input()),
            },
        };

        let el_input = match content {
            InputContent::Markup(markup) => {
                field
                    .set_inner_markup(&markup)
                    .map_err(|e| Error::markup(model.name(), e))?;
                let first = field.first_child();
                if first.is_none() {
                    tracing::warn!(target: "lattice_traits::view", name = %model.name(), "input markup produced no element");
                }
                first
            }
            InputContent::Element(input) => {
                if self.variant().append_input() {
                    field.append_child(&input);
                } else {
                    field.prepend_child(&input);
                }
                Some(input)
            }
        };

        self.state.lock().el_input = el_input.clone();
        model.retain_input(el_input);
        Ok(())
    }

    /// The default input for this render cycle, built on first use.
    fn default_input(&self) -> Element {
        if let Some(input) = self.state.lock().default_input.clone() {
            return input;
        }
        let target = self.component();
        let input = FieldRenderer::build_default_input(self.model(), target.as_deref());
        self.state.lock().default_input = Some(input.clone());
        input
    }
}
