//! Trait editing for Lattice Traits.
//!
//! A *trait* is one editable attribute or property of a component in a
//! visual editor: the `href` of a link, the `alt` of an image, the live
//! `width` of a block. This crate renders a labelled control for each trait
//! and keeps three parties consistent:
//!
//! - the [`TraitModel`], which holds the trait's descriptor and value,
//! - the [`Target`] being edited, such as a [`Component`],
//! - the rendered control, an [`Element`](lattice_traits_core::Element) in
//!   a headless tree.
//!
//! [`TraitView`] is the binding controller between them. Every model write
//! carries an [`Origin`], so a change mirrored from the target refreshes the
//! display without being pushed back, and a user edit reaches the target
//! exactly once.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use lattice_traits::{Component, SetOptions, Target, TraitCollection, VariantRegistry, ViewConfig};
//!
//! let link = Arc::new(Component::new("a").with_attribute("title", "Home"));
//! let target: Arc<dyn Target> = link.clone();
//! let traits = TraitCollection::new(&target, ViewConfig::new("trt-", "gjs-"), VariantRegistry::new());
//!
//! let view = traits.add_json(r#"["title"]"#)?.remove(0);
//! traits.render()?;
//!
//! // The user types in the control
//! let input = view.input_element().expect("rendered input");
//! input.set_value("About");
//! input.dispatch_change();
//! assert_eq!(link.attribute("title").as_deref(), Some("About"));
//!
//! // Another actor edits the target; only the display follows
//! link.set_attribute("title", "Contact", SetOptions::external_sync());
//! assert_eq!(input.value().as_deref(), Some("Contact"));
//! # Ok::<(), lattice_traits::Error>(())
//! ```

pub mod collection;
pub mod config;
mod error;
pub mod model;
pub mod render;
pub mod resolve;
pub mod target;
pub mod variant;
pub mod view;

pub use collection::TraitCollection;
pub use config::{EditorHandle, TraitConfig, ViewConfig};
pub use error::{Error, Result};
pub use model::{Origin, SetOptions, TraitModel, ValueChange};
pub use render::FieldRenderer;
pub use resolve::{Resolution, ResolutionMode, resolve, resolve_value};
pub use target::{ChangeKind, Component, Target, TargetChange};
pub use variant::{DefaultVariant, InputContent, InputVariant, VariantRegistry};
pub use view::{BindingState, TraitView};
