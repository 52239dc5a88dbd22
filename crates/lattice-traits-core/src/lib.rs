//! Core systems for Lattice Traits.
//!
//! This crate provides the foundational components that trait editors are
//! built from:
//!
//! - **Signal/Slot System**: Per-object observer lists with stable connection IDs
//! - **Property System**: Values with change detection
//! - **Element Tree**: A headless visual tree with markup parsing and
//!   bubbling change notifications
//! - **Logging**: Tracing targets and debug visualization
//!
//! # Signal/Slot Example
//!
//! ```
//! use lattice_traits_core::Signal;
//!
//! // Create a signal that notifies when a value changes
//! let value_changed = Signal::<i32>::new();
//!
//! // Connect a slot to handle the signal
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//!
//! // Emit the signal
//! value_changed.emit(42);
//!
//! // Disconnect when done
//! value_changed.disconnect(conn_id);
//! ```
//!
//! # Element Example
//!
//! ```
//! use lattice_traits_core::Element;
//!
//! let wrapper = Element::new("div");
//! wrapper.set_inner_markup(r#"<input type="text">"#)?;
//!
//! let input = wrapper.first_child().expect("parsed input");
//! input.set_value("10px");
//! input.dispatch_change();
//! # Ok::<(), lattice_traits_core::Error>(())
//! ```

pub mod element;
mod error;
pub mod logging;
pub mod property;
pub mod signal;

pub use element::Element;
pub use error::{Error, Result};
pub use logging::{ElementTreeDebug, PerfSpan};
pub use property::Property;
pub use signal::{ConnectionGuard, ConnectionId, Signal};
