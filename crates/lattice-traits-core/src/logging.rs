//! Logging and debugging facilities for Lattice Traits.
//!
//! This module provides:
//! - Target names for filtering `tracing` output by subsystem
//! - Debug visualization for element trees
//! - Performance tracing hooks for profiling
//!
//! # Tracing Integration
//!
//! Lattice Traits uses the `tracing` crate for instrumentation. Library code
//! never installs a subscriber; to see logs, install one in your application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("lattice_traits=debug,lattice_traits_core::signal=trace")
//!     .init();
//! ```

use std::fmt::Write as FmtWrite;

use crate::element::Element;

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core framework target.
    pub const CORE: &str = "lattice_traits_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "lattice_traits_core::signal";
    /// Element tree target.
    pub const ELEMENT: &str = "lattice_traits_core::element";
    /// Trait model target.
    pub const MODEL: &str = "lattice_traits::model";
    /// Binding controller target.
    pub const VIEW: &str = "lattice_traits::view";
    /// Trait collection target.
    pub const COLLECTION: &str = "lattice_traits::collection";
}

/// Debug utility for visualizing element trees.
///
/// Produces one line per element, indented by depth, showing the tag, the
/// attributes in insertion order and the current value of form controls.
#[derive(Debug, Clone)]
pub struct ElementTreeDebug {
    indent_size: usize,
    max_depth: Option<usize>,
}

impl Default for ElementTreeDebug {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementTreeDebug {
    /// Create a visualizer with two-space indentation and no depth limit.
    pub fn new() -> Self {
        Self {
            indent_size: 2,
            max_depth: None,
        }
    }

    /// Limit how deep the tree is printed.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Format the subtree rooted at `root`.
    pub fn format_tree(&self, root: &Element) -> String {
        let mut output = String::new();
        self.format_into(root, 0, &mut output);
        output
    }

    fn format_into(&self, element: &Element, depth: usize, output: &mut String) {
        if self.max_depth.is_some_and(|max| depth > max) {
            return;
        }

        let indent = " ".repeat(depth * self.indent_size);
        let _ = write!(output, "{indent}<{}", element.tag());
        for (key, value) in element.attributes() {
            if value.is_empty() {
                let _ = write!(output, " {key}");
            } else {
                let _ = write!(output, " {key}=\"{value}\"");
            }
        }
        output.push('>');
        if let Some(value) = element.value() {
            let _ = write!(output, " value={value:?}");
        }
        output.push('\n');

        for child in element.children() {
            self.format_into(&child, depth + 1, output);
        }
    }
}

/// A performance tracing span guard.
///
/// Wraps a `tracing` span that is entered for the lifetime of the guard.
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    ///
    /// The span will be active until the guard is dropped.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::trace_span!(target: "lattice_traits::perf", "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}
