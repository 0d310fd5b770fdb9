use crate::names::{
    attribute_name, class_token, class_tokens, dataset_attribute, dataset_key, style_property,
};
use batch_update::{
    ElementHandle, Event, EventHandler, HandleError, HandleKey, LifeToken, ListenerOptions,
    Value, format_number,
};
use core_types::next_handle_key;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

const LOG_TARGET: &str = "dom.element";

const METHODS: &[&str] = &["focus", "blur", "click", "scrollIntoView", "remove"];

const PROPERTIES: &[&str] = &[
    "id",
    "className",
    "textContent",
    "title",
    "hidden",
    "value",
    "checked",
    "disabled",
    "tabIndex",
];

#[derive(Debug)]
pub enum TreeError {
    CycleDetected,
    SelfAppend,
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::CycleDetected => f.write_str("append would create a cycle"),
            TreeError::SelfAppend => f.write_str("cannot append an element to itself"),
        }
    }
}

impl std::error::Error for TreeError {}

/// Child of an element.
#[derive(Clone, Debug)]
pub enum Node {
    Element(ElementRef),
    Text(Rc<RefCell<String>>),
}

struct Listener {
    event_type: String,
    handler: EventHandler,
    options: ListenerOptions,
}

struct ElementData {
    key: HandleKey,
    tag: String,
    attributes: Vec<(String, String)>,
    style: Vec<(String, String)>,
    children: Vec<Node>,
    parent: Weak<RefCell<ElementData>>,
    listeners: Vec<Listener>,
    handler_slots: Vec<(String, EventHandler)>,
    value: String,
    checked: bool,
    focused: bool,
    scroll_requests: usize,
}

impl ElementData {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn set_attr(&mut self, name: String, value: &str) {
        match self.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attributes.push((name, value.to_string())),
        }
    }

    fn remove_attr(&mut self, name: &str) {
        self.attributes.retain(|(k, _)| k != name);
    }

    fn set_bool_attr(&mut self, name: &str, on: bool) {
        if on {
            self.set_attr(name.to_string(), "");
        } else {
            self.remove_attr(name);
        }
    }

    fn classes(&self) -> Vec<String> {
        class_tokens(self.attr("class"))
    }

    fn set_classes(&mut self, classes: &[String]) {
        if classes.is_empty() {
            self.remove_attr("class");
        } else {
            self.set_attr("class".to_string(), &classes.join(" "));
        }
    }
}

/// Shared handle to an in-memory element.
///
/// Clones alias the same node, so a snapshot taken by the update engine
/// mutates the live tree.
#[derive(Clone)]
pub struct ElementRef(Rc<RefCell<ElementData>>);

impl fmt::Debug for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        f.debug_struct("ElementRef")
            .field("key", &data.key)
            .field("tag", &data.tag)
            .field("attributes", &data.attributes)
            .finish()
    }
}

impl PartialEq for ElementRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl ElementRef {
    pub(crate) fn new(tag: &str) -> Self {
        Self(Rc::new(RefCell::new(ElementData {
            key: next_handle_key(),
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            style: Vec::new(),
            children: Vec::new(),
            parent: Weak::new(),
            listeners: Vec::new(),
            handler_slots: Vec::new(),
            value: String::new(),
            checked: false,
            focused: false,
            scroll_requests: 0,
        })))
    }

    // =========================================================================
    // Tree
    // =========================================================================

    pub fn parent(&self) -> Option<ElementRef> {
        self.0.borrow().parent.upgrade().map(ElementRef)
    }

    pub fn children(&self) -> Vec<Node> {
        self.0.borrow().children.clone()
    }

    pub fn element_children(&self) -> Vec<ElementRef> {
        self.0
            .borrow()
            .children
            .iter()
            .filter_map(|node| match node {
                Node::Element(el) => Some(el.clone()),
                Node::Text(_) => None,
            })
            .collect()
    }

    fn is_ancestor_of(&self, other: &ElementRef) -> bool {
        let mut current = other.parent();
        while let Some(node) = current {
            if node == *self {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// Move `child` to the end of this element's children.
    pub fn append(&self, child: &ElementRef) -> Result<(), TreeError> {
        if child == self {
            return Err(TreeError::SelfAppend);
        }
        if child.is_ancestor_of(self) {
            log::debug!(
                target: LOG_TARGET,
                "rejected append of {:?} into its descendant",
                child.key()
            );
            return Err(TreeError::CycleDetected);
        }
        child.detach();
        child.0.borrow_mut().parent = Rc::downgrade(&self.0);
        self.0
            .borrow_mut()
            .children
            .push(Node::Element(child.clone()));
        Ok(())
    }

    pub fn append_text(&self, text: &str) {
        self.0
            .borrow_mut()
            .children
            .push(Node::Text(Rc::new(RefCell::new(text.to_string()))));
    }

    /// Remove this element from its parent, if any.
    pub fn detach(&self) {
        let Some(parent) = self.parent() else {
            return;
        };
        parent.0.borrow_mut().children.retain(|node| match node {
            Node::Element(el) => el != self,
            Node::Text(_) => true,
        });
        self.0.borrow_mut().parent = Weak::new();
    }

    /// Elements below this one in tree order.
    pub fn descendants(&self) -> Vec<ElementRef> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementRef> = self.element_children().into_iter().rev().collect();
        while let Some(el) = stack.pop() {
            stack.extend(el.element_children().into_iter().rev());
            out.push(el);
        }
        out
    }

    // =========================================================================
    // Read access
    // =========================================================================

    pub fn tag(&self) -> String {
        self.0.borrow().tag.clone()
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.0
            .borrow()
            .attr(&name.to_ascii_lowercase())
            .map(str::to_string)
    }

    pub fn attributes(&self) -> Vec<(String, String)> {
        self.0.borrow().attributes.clone()
    }

    pub fn classes(&self) -> Vec<String> {
        self.0.borrow().classes()
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.classes().iter().any(|c| c == name)
    }

    /// Accepts either `backgroundColor` or `background-color`.
    pub fn style(&self, property: &str) -> Option<String> {
        let name = style_property(property).ok()?;
        self.0
            .borrow()
            .style
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.clone())
    }

    pub fn data(&self, key: &str) -> Option<String> {
        let name = dataset_attribute(key).ok()?;
        self.attribute(&name)
    }

    pub fn dataset(&self) -> Vec<(String, String)> {
        self.0
            .borrow()
            .attributes
            .iter()
            .filter_map(|(k, v)| dataset_key(k).map(|key| (key, v.clone())))
            .collect()
    }

    pub fn text_content(&self) -> String {
        fn collect(nodes: &[Node], out: &mut String) {
            for node in nodes {
                match node {
                    Node::Text(text) => out.push_str(&text.borrow()),
                    Node::Element(el) => collect(&el.0.borrow().children, out),
                }
            }
        }
        let mut out = String::new();
        collect(&self.0.borrow().children, &mut out);
        out
    }

    pub fn value(&self) -> String {
        self.0.borrow().value.clone()
    }

    pub fn checked(&self) -> bool {
        self.0.borrow().checked
    }

    pub fn is_focused(&self) -> bool {
        self.0.borrow().focused
    }

    pub fn scroll_requests(&self) -> usize {
        self.0.borrow().scroll_requests
    }

    pub fn listener_count(&self, event_type: &str) -> usize {
        self.0
            .borrow()
            .listeners
            .iter()
            .filter(|l| l.event_type == event_type)
            .count()
    }

    pub fn has_handler_slot(&self, slot: &str) -> bool {
        self.0.borrow().handler_slots.iter().any(|(k, _)| k == slot)
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Run listeners for `event_type`, then the matching `on*` slot.
    ///
    /// Returns the number of handlers run. `once` listeners are removed
    /// before any handler runs, so handlers may freely mutate the element.
    pub fn dispatch(&self, event_type: &str) -> usize {
        let (key, handlers) = {
            let mut data = self.0.borrow_mut();
            let mut run = Vec::new();
            data.listeners.retain(|l| {
                if l.event_type != event_type {
                    return true;
                }
                run.push(l.handler.clone());
                !l.options.once
            });
            let slot = format!("on{event_type}");
            if let Some((_, h)) = data.handler_slots.iter().find(|(k, _)| *k == slot) {
                run.push(h.clone());
            }
            (data.key, run)
        };
        log::trace!(
            target: LOG_TARGET,
            "dispatch '{event_type}' to {key:?}: {} handler(s)",
            handlers.len()
        );
        let event = Event {
            event_type: event_type.to_string(),
            target: key,
        };
        for handler in &handlers {
            handler.call(&event);
        }
        handlers.len()
    }

    fn set_text_content(&self, text: &str) {
        let mut data = self.0.borrow_mut();
        for node in data.children.drain(..) {
            if let Node::Element(el) = node {
                el.0.borrow_mut().parent = Weak::new();
            }
        }
        if !text.is_empty() {
            data.children
                .push(Node::Text(Rc::new(RefCell::new(text.to_string()))));
        }
    }
}

fn text_of(name: &str, value: &Value) -> Result<String, HandleError> {
    match value {
        Value::Null => Ok(String::new()),
        other => other.to_text().ok_or_else(|| HandleError::TypeMismatch {
            name: name.to_string(),
            expected: "a primitive",
            got: other.kind(),
        }),
    }
}

impl ElementHandle for ElementRef {
    fn key(&self) -> HandleKey {
        self.0.borrow().key
    }

    fn life_token(&self) -> Option<LifeToken> {
        let token: LifeToken = Rc::<RefCell<ElementData>>::downgrade(&self.0);
        Some(token)
    }

    fn set_style(&mut self, property: &str, value: &str) -> Result<(), HandleError> {
        let name = style_property(property)?;
        let mut data = self.0.borrow_mut();
        let pos = data.style.iter().position(|(k, _)| *k == name);
        match (pos, value.is_empty()) {
            (Some(pos), true) => {
                data.style.remove(pos);
            }
            (Some(pos), false) => data.style[pos].1 = value.to_string(),
            (None, true) => {}
            (None, false) => data.style.push((name, value.to_string())),
        }
        Ok(())
    }

    fn add_class(&mut self, name: &str) -> Result<(), HandleError> {
        let name = class_token(name)?;
        let mut data = self.0.borrow_mut();
        let mut classes = data.classes();
        if !classes.iter().any(|c| c == name) {
            classes.push(name.to_string());
        }
        data.set_classes(&classes);
        Ok(())
    }

    fn remove_class(&mut self, name: &str) -> Result<(), HandleError> {
        let name = class_token(name)?;
        let mut data = self.0.borrow_mut();
        let mut classes = data.classes();
        classes.retain(|c| c != name);
        data.set_classes(&classes);
        Ok(())
    }

    fn toggle_class(&mut self, name: &str) -> Result<bool, HandleError> {
        if self.has_class(class_token(name)?) {
            self.remove_class(name)?;
            Ok(false)
        } else {
            self.add_class(name)?;
            Ok(true)
        }
    }

    fn replace_class(&mut self, old: &str, new: &str) -> Result<bool, HandleError> {
        let old = class_token(old)?;
        let new = class_token(new)?;
        let mut data = self.0.borrow_mut();
        let mut classes = data.classes();
        let Some(pos) = classes.iter().position(|c| c == old) else {
            return Ok(false);
        };
        if classes.iter().any(|c| c == new) {
            classes.remove(pos);
        } else {
            classes[pos] = new.to_string();
        }
        data.set_classes(&classes);
        Ok(true)
    }

    fn set_attribute(&mut self, name: &str, value: &str) -> Result<(), HandleError> {
        let name = attribute_name(name)?;
        self.0.borrow_mut().set_attr(name, value);
        Ok(())
    }

    fn remove_attribute(&mut self, name: &str) -> Result<(), HandleError> {
        let name = attribute_name(name)?;
        self.0.borrow_mut().remove_attr(&name);
        Ok(())
    }

    fn set_data(&mut self, key: &str, value: &str) -> Result<(), HandleError> {
        let name = dataset_attribute(key)?;
        self.0.borrow_mut().set_attr(name, value);
        Ok(())
    }

    fn add_event_listener(
        &mut self,
        event_type: &str,
        handler: EventHandler,
        options: ListenerOptions,
    ) -> Result<(), HandleError> {
        if event_type.is_empty() {
            return Err(HandleError::InvalidName(event_type.to_string()));
        }
        let mut data = self.0.borrow_mut();
        let duplicate = data.listeners.iter().any(|l| {
            l.event_type == event_type
                && l.handler.ptr_eq(&handler)
                && l.options.capture == options.capture
        });
        if !duplicate {
            data.listeners.push(Listener {
                event_type: event_type.to_string(),
                handler,
                options,
            });
        }
        Ok(())
    }

    fn set_handler_slot(&mut self, slot: &str, handler: EventHandler) -> Result<(), HandleError> {
        let slot = slot.to_ascii_lowercase();
        let mut data = self.0.borrow_mut();
        match data.handler_slots.iter_mut().find(|(k, _)| *k == slot) {
            Some((_, existing)) => *existing = handler,
            None => data.handler_slots.push((slot, handler)),
        }
        Ok(())
    }

    fn has_method(&self, name: &str) -> bool {
        METHODS.contains(&name)
    }

    fn invoke_method(&mut self, name: &str, _args: &[Value]) -> Result<Value, HandleError> {
        match name {
            "focus" => self.0.borrow_mut().focused = true,
            "blur" => self.0.borrow_mut().focused = false,
            "click" => {
                self.dispatch("click");
            }
            "scrollIntoView" => {
                if self.parent().is_none() && self.tag() != "body" {
                    return Err(HandleError::Detached);
                }
                self.0.borrow_mut().scroll_requests += 1;
            }
            "remove" => self.detach(),
            other => return Err(HandleError::UnknownMethod(other.to_string())),
        }
        Ok(Value::Null)
    }

    fn has_property(&self, name: &str) -> bool {
        PROPERTIES.contains(&name)
    }

    fn set_property(&mut self, name: &str, value: &Value) -> Result<(), HandleError> {
        match name {
            "id" => {
                let text = text_of(name, value)?;
                self.0.borrow_mut().set_attr("id".to_string(), &text);
            }
            "className" => {
                let text = text_of(name, value)?;
                self.0.borrow_mut().set_attr("class".to_string(), &text);
            }
            "title" => {
                let text = text_of(name, value)?;
                self.0.borrow_mut().set_attr("title".to_string(), &text);
            }
            "textContent" => {
                let text = text_of(name, value)?;
                self.set_text_content(&text);
            }
            "value" => self.0.borrow_mut().value = text_of(name, value)?,
            "checked" => self.0.borrow_mut().checked = value.is_truthy(),
            "hidden" | "disabled" => {
                self.0.borrow_mut().set_bool_attr(name, value.is_truthy());
            }
            "tabIndex" => {
                let n = match value {
                    Value::Number(n) => Some(*n),
                    Value::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                }
                .filter(|n| n.is_finite())
                .ok_or_else(|| HandleError::TypeMismatch {
                    name: name.to_string(),
                    expected: "a number",
                    got: value.kind(),
                })?;
                self.0
                    .borrow_mut()
                    .set_attr("tabindex".to_string(), &format_number(n.trunc()));
            }
            other => return Err(HandleError::UnknownProperty(other.to_string())),
        }
        Ok(())
    }
}
