//! Host-facing capabilities.
//!
//! The engine never creates or destroys handles; it only drives the
//! mutations exposed by [`ElementHandle`]. Collections are read through
//! [`HandleCollection::materialize`], which must return a snapshot that
//! stays valid even if the underlying live source changes afterwards.

use crate::value::{EventHandler, Value};
use core_types::{CollectionKey, HandleKey, next_collection_key};
use std::any::Any;
use std::fmt;
use std::rc::{Rc, Weak};

/// Error raised by a host while performing one mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandleError {
    InvalidStyleProperty(String),
    InvalidName(String),
    UnknownMethod(String),
    UnknownProperty(String),
    TypeMismatch {
        name: String,
        expected: &'static str,
        got: &'static str,
    },
    Detached,
}

impl fmt::Display for HandleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandleError::InvalidStyleProperty(name) => write!(f, "invalid style property '{name}'"),
            HandleError::InvalidName(name) => write!(f, "invalid name '{name}'"),
            HandleError::UnknownMethod(name) => write!(f, "unknown method '{name}'"),
            HandleError::UnknownProperty(name) => write!(f, "unknown property '{name}'"),
            HandleError::TypeMismatch {
                name,
                expected,
                got,
            } => write!(f, "'{name}' expects {expected}, got {got}"),
            HandleError::Detached => f.write_str("element is detached"),
        }
    }
}

impl std::error::Error for HandleError {}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    pub capture: bool,
    pub once: bool,
    pub passive: bool,
}

/// Weak reference that stops upgrading once the node it was taken from is
/// gone. Side tables use it to forget identities of dropped handles.
pub type LifeToken = Weak<dyn Any>;

/// One addressable UI node.
pub trait ElementHandle {
    /// Identity used by side tables; stable for the lifetime of the node.
    fn key(&self) -> HandleKey;

    /// `None` means the host cannot report liveness; entries keyed by such
    /// handles are kept until released explicitly.
    fn life_token(&self) -> Option<LifeToken> {
        None
    }

    // =========================================================================
    // Style, classes, attributes, data
    // =========================================================================

    /// An empty `value` clears the property.
    fn set_style(&mut self, property: &str, value: &str) -> Result<(), HandleError>;

    fn add_class(&mut self, name: &str) -> Result<(), HandleError>;

    fn remove_class(&mut self, name: &str) -> Result<(), HandleError>;

    /// Returns whether the class is present afterwards.
    fn toggle_class(&mut self, name: &str) -> Result<bool, HandleError>;

    /// Returns `false` (and changes nothing) when `old` is absent.
    fn replace_class(&mut self, old: &str, new: &str) -> Result<bool, HandleError>;

    fn set_attribute(&mut self, name: &str, value: &str) -> Result<(), HandleError>;

    fn remove_attribute(&mut self, name: &str) -> Result<(), HandleError>;

    fn set_data(&mut self, key: &str, value: &str) -> Result<(), HandleError>;

    // =========================================================================
    // Events
    // =========================================================================

    fn add_event_listener(
        &mut self,
        event_type: &str,
        handler: EventHandler,
        options: ListenerOptions,
    ) -> Result<(), HandleError>;

    /// Assign an `on*` handler slot, replacing any previous handler.
    fn set_handler_slot(&mut self, slot: &str, handler: EventHandler) -> Result<(), HandleError>;

    // =========================================================================
    // Methods & properties
    // =========================================================================

    fn has_method(&self, name: &str) -> bool;

    fn invoke_method(&mut self, name: &str, args: &[Value]) -> Result<Value, HandleError>;

    fn has_property(&self, name: &str) -> bool;

    fn set_property(&mut self, name: &str, value: &Value) -> Result<(), HandleError>;
}

/// One position of a materialized collection.
#[derive(Clone, Debug)]
pub enum Slot<H> {
    Element(H),
    /// Nothing at this position.
    Empty,
    /// A node that is not a usable element (text, comment, ...).
    Foreign,
}

impl<H> Slot<H> {
    pub fn as_element(&self) -> Option<&H> {
        match self {
            Slot::Element(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut H> {
        match self {
            Slot::Element(h) => Some(h),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self, Slot::Element(_))
    }
}

/// Ordered, finite source of element handles.
pub trait HandleCollection {
    type Handle: ElementHandle;

    fn key(&self) -> CollectionKey;

    fn life_token(&self) -> Option<LifeToken> {
        None
    }

    /// Snapshot the current contents. Called once per update.
    fn materialize(&self) -> Vec<Slot<Self::Handle>>;
}

/// Fixed list of slots with its own identity.
#[derive(Clone, Debug)]
pub struct StaticCollection<H> {
    key: CollectionKey,
    life: Rc<()>,
    slots: Vec<Slot<H>>,
}

impl<H> StaticCollection<H> {
    pub fn new(handles: impl IntoIterator<Item = H>) -> Self {
        Self::from_slots(handles.into_iter().map(Slot::Element))
    }

    pub fn from_slots(slots: impl IntoIterator<Item = Slot<H>>) -> Self {
        Self {
            key: next_collection_key(),
            life: Rc::new(()),
            slots: slots.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[Slot<H>] {
        &self.slots
    }
}

impl<H: ElementHandle + Clone> HandleCollection for StaticCollection<H> {
    type Handle = H;

    fn key(&self) -> CollectionKey {
        self.key
    }

    fn life_token(&self) -> Option<LifeToken> {
        let token: LifeToken = Rc::<()>::downgrade(&self.life);
        Some(token)
    }

    fn materialize(&self) -> Vec<Slot<H>> {
        self.slots.clone()
    }
}

/// Lookup query understood by a [`HandleSource`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Query {
    Class(String),
    Tag(String),
}

/// Resolves identifiers and queries to handles.
///
/// Caching and invalidation are the source's business; the engine only
/// consumes the results.
pub trait HandleSource {
    type Handle: ElementHandle;
    type Collection: HandleCollection<Handle = Self::Handle>;

    fn element_by_id(&self, id: &str) -> Option<Self::Handle>;

    fn collection(&self, query: &Query) -> Self::Collection;
}
