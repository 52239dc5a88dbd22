//! Headless element tree.
//!
//! [`Element`] is a lightweight stand-in for a document node: a tag, ordered
//! attributes, text, a live `value` property for form controls, and an
//! owned list of children with a weak link back to the parent. Trait views
//! build their visual subtree out of elements, and input variants may hand
//! back either a constructed element or a markup fragment that is parsed
//! into elements.
//!
//! # Handles
//!
//! `Element` is a cheap, clonable handle. Clones refer to the same node;
//! use [`Element::ptr_eq`] to test identity.
//!
//! # Change notification
//!
//! [`Element::dispatch_change`] plays the part of a native `change` event:
//! the element's [`changed`](Element::changed) signal fires first, then the
//! same notification bubbles to every ancestor. The signal argument is the
//! element the change originated from, so a container can listen once and
//! serve whatever input is currently inside it.
//!
//! # Markup
//!
//! Markup is parsed leniently, HTML style: attributes without a value are
//! accepted (`<div data-input>`), and void elements such as `<input>` do not
//! need a closing tag. Elements still open at the end of the fragment are
//! closed implicitly.
//!
//! ```
//! use lattice_traits_core::Element;
//!
//! let field = Element::new("div");
//! field.set_inner_markup(r#"<input type="number" min="0">"#).unwrap();
//! let input = field.first_child().unwrap();
//! assert_eq!(input.attribute("type").as_deref(), Some("number"));
//! assert_eq!(input.value().as_deref(), Some(""));
//! ```

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{Error, Result};
use crate::signal::Signal;

/// Elements that never have children and need no closing tag.
const VOID_ELEMENTS: &[&str] = &["input", "br", "hr", "img", "meta", "link"];

/// Elements that always expose a `value`.
const FORM_CONTROLS: &[&str] = &["input", "select", "textarea"];

fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.iter().any(|void| void.eq_ignore_ascii_case(tag))
}

fn is_form_control(tag: &str) -> bool {
    FORM_CONTROLS.iter().any(|ctl| ctl.eq_ignore_ascii_case(tag))
}

struct ElementData {
    tag: String,
    attributes: Vec<(String, String)>,
    text: String,
    /// Live value, distinct from the `value` attribute once written.
    value: Option<String>,
    children: Vec<Element>,
    parent: Weak<ElementInner>,
}

impl ElementData {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

struct ElementInner {
    data: RwLock<ElementData>,
    changed: Signal<Element>,
}

/// A handle to a node in the headless element tree.
#[derive(Clone)]
pub struct Element {
    inner: Arc<ElementInner>,
}

impl Element {
    /// Create a detached element with the given tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ElementInner {
                data: RwLock::new(ElementData {
                    tag: tag.into(),
                    attributes: Vec::new(),
                    text: String::new(),
                    value: None,
                    children: Vec::new(),
                    parent: Weak::new(),
                }),
                changed: Signal::new(),
            }),
        }
    }

    /// Whether two handles refer to the same element.
    pub fn ptr_eq(&self, other: &Element) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// The element's tag name.
    pub fn tag(&self) -> String {
        self.inner.data.read().tag.clone()
    }

    // -------------------------------------------------------------------------
    // Attributes
    // -------------------------------------------------------------------------

    /// Get an attribute value.
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.inner.data.read().attribute(name).map(str::to_string)
    }

    /// Check whether an attribute is present (valueless attributes included).
    pub fn has_attribute(&self, name: &str) -> bool {
        self.inner.data.read().attribute(name).is_some()
    }

    /// Set an attribute, keeping its position if it already exists.
    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        let mut data = self.inner.data.write();
        match data.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => data.attributes.push((name, value)),
        }
    }

    /// Remove an attribute, returning its previous value.
    pub fn remove_attribute(&self, name: &str) -> Option<String> {
        let mut data = self.inner.data.write();
        let index = data.attributes.iter().position(|(key, _)| key == name)?;
        Some(data.attributes.remove(index).1)
    }

    /// All attributes in insertion order.
    pub fn attributes(&self) -> Vec<(String, String)> {
        self.inner.data.read().attributes.clone()
    }

    /// The `class` attribute, or an empty string.
    pub fn class_name(&self) -> String {
        self.attribute("class").unwrap_or_default()
    }

    /// Replace the `class` attribute.
    pub fn set_class_name(&self, class: impl Into<String>) {
        self.set_attribute("class", class);
    }

    /// Check whether the `class` attribute contains a class.
    pub fn has_class(&self, class: &str) -> bool {
        self.inner
            .data
            .read()
            .attribute("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    // -------------------------------------------------------------------------
    // Content
    // -------------------------------------------------------------------------

    /// Text content directly owned by this element.
    pub fn text(&self) -> String {
        self.inner.data.read().text.clone()
    }

    /// Replace the element's own text content.
    pub fn set_text(&self, text: impl Into<String>) {
        self.inner.data.write().text = text.into();
    }

    fn push_text(&self, text: &str) {
        self.inner.data.write().text.push_str(text);
    }

    /// The element's live value.
    ///
    /// Form controls always have a value: the last written one, else their
    /// `value` attribute, else the empty string. Other elements only have a
    /// value once one has been written.
    pub fn value(&self) -> Option<String> {
        let data = self.inner.data.read();
        if let Some(value) = &data.value {
            return Some(value.clone());
        }
        if is_form_control(&data.tag) {
            return Some(data.attribute("value").unwrap_or_default().to_string());
        }
        None
    }

    /// Write the element's live value. The `value` attribute is untouched.
    pub fn set_value(&self, value: impl Into<String>) {
        self.inner.data.write().value = Some(value.into());
    }

    // -------------------------------------------------------------------------
    // Tree structure
    // -------------------------------------------------------------------------

    /// The parent element, if attached.
    pub fn parent(&self) -> Option<Element> {
        self.inner
            .data
            .read()
            .parent
            .upgrade()
            .map(|inner| Element { inner })
    }

    /// Snapshot of the children.
    pub fn children(&self) -> Vec<Element> {
        self.inner.data.read().children.clone()
    }

    /// The first child, if any.
    pub fn first_child(&self) -> Option<Element> {
        self.inner.data.read().children.first().cloned()
    }

    /// Number of children.
    pub fn child_count(&self) -> usize {
        self.inner.data.read().children.len()
    }

    /// Whether `self` is `other` or one of its ancestors.
    pub fn contains(&self, other: &Element) -> bool {
        let mut current = Some(other.clone());
        while let Some(element) = current {
            if element.ptr_eq(self) {
                return true;
            }
            current = element.parent();
        }
        false
    }

    /// Append a child, moving it out of any previous parent.
    pub fn append_child(&self, child: &Element) {
        self.insert_child(child, false);
    }

    /// Insert a child before the current first child.
    pub fn prepend_child(&self, child: &Element) {
        self.insert_child(child, true);
    }

    fn insert_child(&self, child: &Element, front: bool) {
        if child.contains(self) {
            tracing::warn!(target: "lattice_traits_core::element", tag = %child.tag(), "refusing to insert an element into its own subtree");
            return;
        }
        child.detach();
        child.inner.data.write().parent = Arc::downgrade(&self.inner);
        let mut data = self.inner.data.write();
        if front {
            data.children.insert(0, child.clone());
        } else {
            data.children.push(child.clone());
        }
    }

    /// Remove this element from its parent. Returns `false` if it had none.
    pub fn detach(&self) -> bool {
        let parent = self.inner.data.read().parent.upgrade();
        let Some(parent) = parent else {
            return false;
        };
        parent
            .data
            .write()
            .children
            .retain(|child| !Arc::ptr_eq(&child.inner, &self.inner));
        self.inner.data.write().parent = Weak::new();
        true
    }

    /// Remove all children and the element's own text.
    pub fn clear_children(&self) {
        let children = {
            let mut data = self.inner.data.write();
            data.text.clear();
            std::mem::take(&mut data.children)
        };
        for child in children {
            child.inner.data.write().parent = Weak::new();
        }
    }

    /// Descendants carrying an attribute, in document order.
    ///
    /// The element itself is not included.
    pub fn descendants_with_attribute(&self, name: &str) -> Vec<Element> {
        let mut found = Vec::new();
        for child in self.children() {
            child.collect_with_attribute(name, &mut found);
        }
        found
    }

    fn collect_with_attribute(&self, name: &str, found: &mut Vec<Element>) {
        if self.has_attribute(name) {
            found.push(self.clone());
        }
        for child in self.children() {
            child.collect_with_attribute(name, found);
        }
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    /// Signal fired when a change is dispatched on this element or bubbles
    /// up from a descendant. The argument is the originating element.
    pub fn changed(&self) -> &Signal<Element> {
        &self.inner.changed
    }

    /// Fire a change notification on this element and all its ancestors.
    pub fn dispatch_change(&self) {
        tracing::trace!(target: "lattice_traits_core::element", tag = %self.tag(), "dispatching change");
        let mut current = Some(self.clone());
        while let Some(element) = current {
            element.inner.changed.emit(self.clone());
            current = element.parent();
        }
    }

    // -------------------------------------------------------------------------
    // Markup
    // -------------------------------------------------------------------------

    /// Parse a markup fragment into detached top-level elements.
    pub fn parse_markup(markup: &str) -> Result<Vec<Element>> {
        let mut reader = Reader::from_str(markup);
        let config = reader.config_mut();
        config.trim_text(true);
        config.check_end_names = false;
        config.allow_unmatched_ends = true;

        let mut roots = Vec::new();
        let mut stack: Vec<Element> = Vec::new();

        loop {
            let position = reader.buffer_position() as u64;
            match reader.read_event() {
                Ok(Event::Start(start)) => {
                    let element = element_from_start(&start, position)?;
                    attach(&mut roots, &stack, &element);
                    if !is_void(&element.tag()) {
                        stack.push(element);
                    }
                }
                Ok(Event::Empty(start)) => {
                    let element = element_from_start(&start, position)?;
                    attach(&mut roots, &stack, &element);
                }
                Ok(Event::End(end)) => {
                    let name = String::from_utf8_lossy(end.name().as_ref()).to_string();
                    if is_void(&name) {
                        continue;
                    }
                    match stack.pop() {
                        Some(open) if open.tag().eq_ignore_ascii_case(&name) => {}
                        _ => {
                            return Err(Error::UnbalancedMarkup {
                                found: name,
                                position,
                            });
                        }
                    }
                }
                Ok(Event::Text(text)) => {
                    let content = text
                        .unescape()
                        .map_err(|e| Error::markup(e.to_string(), position))?;
                    if let Some(open) = stack.last() {
                        open.push_text(&content);
                    }
                }
                Ok(Event::CData(cdata)) => {
                    if let Some(open) = stack.last() {
                        open.push_text(&String::from_utf8_lossy(&cdata));
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(Error::markup(e.to_string(), position)),
            }
        }

        Ok(roots)
    }

    /// Replace all children with the elements parsed from `markup`.
    pub fn set_inner_markup(&self, markup: &str) -> Result<()> {
        let parsed = Self::parse_markup(markup)?;
        self.clear_children();
        for element in &parsed {
            self.append_child(element);
        }
        Ok(())
    }

    /// Append the elements parsed from `markup`, returning them.
    pub fn append_markup(&self, markup: &str) -> Result<Vec<Element>> {
        let parsed = Self::parse_markup(markup)?;
        for element in &parsed {
            self.append_child(element);
        }
        Ok(parsed)
    }

    /// Serialize this element and its subtree.
    pub fn to_markup(&self) -> String {
        let mut writer = Writer::new(Vec::new());
        self.write_to(&mut writer);
        String::from_utf8(writer.into_inner()).unwrap_or_default()
    }

    fn write_to(&self, writer: &mut Writer<Vec<u8>>) {
        let (tag, attributes, text, children) = {
            let data = self.inner.data.read();
            (
                data.tag.clone(),
                data.attributes.clone(),
                data.text.clone(),
                data.children.clone(),
            )
        };

        let mut start = BytesStart::new(tag.as_str());
        for (key, value) in &attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if children.is_empty() && text.is_empty() && is_void(&tag) {
            let _ = writer.write_event(Event::Empty(start));
            return;
        }

        let _ = writer.write_event(Event::Start(start));
        if !text.is_empty() {
            let _ = writer.write_event(Event::Text(BytesText::new(&text)));
        }
        for child in &children {
            child.write_to(writer);
        }
        let _ = writer.write_event(Event::End(BytesEnd::new(tag.as_str())));
    }
}

fn attach(roots: &mut Vec<Element>, stack: &[Element], element: &Element) {
    match stack.last() {
        Some(parent) => parent.append_child(element),
        None => roots.push(element.clone()),
    }
}

fn element_from_start(start: &BytesStart<'_>, position: u64) -> Result<Element> {
    let element = Element::new(String::from_utf8_lossy(start.name().as_ref()).to_string());
    for attr in start.html_attributes() {
        let attr = attr.map_err(|e| Error::markup(e.to_string(), position))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| Error::markup(e.to_string(), position))?
            .into_owned();
        element.set_attribute(key, value);
    }
    Ok(element)
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.inner.data.read();
        f.debug_struct("Element")
            .field("tag", &data.tag)
            .field("attributes", &data.attributes)
            .field("value", &data.value)
            .field("children", &data.children.len())
            .finish()
    }
}

static_assertions::assert_impl_all!(Element: Send, Sync);
