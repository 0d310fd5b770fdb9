use crate::element::{ElementRef, Node};
use batch_update::{HandleCollection, HandleSource, LifeToken, Query, Slot};
use core_types::{CollectionKey, next_collection_key};
use std::rc::Rc;

/// Tree of elements rooted at a `body` element.
#[derive(Clone, Debug)]
pub struct Document {
    body: ElementRef,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            body: ElementRef::new("body"),
        }
    }

    pub fn body(&self) -> &ElementRef {
        &self.body
    }

    /// New detached element; attach it with [`ElementRef::append`].
    pub fn create_element(&self, tag: &str) -> ElementRef {
        ElementRef::new(tag)
    }

    /// First element in tree order whose `id` attribute equals `id`.
    pub fn get_element_by_id(&self, id: &str) -> Option<ElementRef> {
        if id.is_empty() {
            return None;
        }
        self.body
            .descendants()
            .into_iter()
            .find(|el| el.attribute("id").as_deref() == Some(id))
    }

    pub fn by_class(&self, class: &str) -> LiveCollection {
        LiveCollection::new(self.body.clone(), Filter::Class(class.to_string()))
    }

    pub fn by_tag(&self, tag: &str) -> LiveCollection {
        LiveCollection::new(self.body.clone(), Filter::Tag(tag.to_ascii_lowercase()))
    }

    /// Child nodes of `parent`, text nodes included.
    pub fn children_of(&self, parent: &ElementRef) -> LiveCollection {
        LiveCollection::new(parent.clone(), Filter::Children)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Filter {
    Class(String),
    Tag(String),
    Children,
}

/// Query over a subtree, re-evaluated on every read.
///
/// Elements that stop matching drop out on the next read, including while an
/// update is running against an earlier snapshot.
#[derive(Clone, Debug)]
pub struct LiveCollection {
    key: CollectionKey,
    life: Rc<()>,
    scope: ElementRef,
    filter: Filter,
}

impl LiveCollection {
    fn new(scope: ElementRef, filter: Filter) -> Self {
        Self {
            key: next_collection_key(),
            life: Rc::new(()),
            scope,
            filter,
        }
    }

    pub fn len(&self) -> usize {
        self.materialize().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn elements(&self) -> Vec<ElementRef> {
        self.materialize()
            .into_iter()
            .filter_map(|slot| match slot {
                Slot::Element(el) => Some(el),
                _ => None,
            })
            .collect()
    }
}

impl HandleCollection for LiveCollection {
    type Handle = ElementRef;

    fn key(&self) -> CollectionKey {
        self.key
    }

    fn life_token(&self) -> Option<LifeToken> {
        let token: LifeToken = Rc::<()>::downgrade(&self.life);
        Some(token)
    }

    fn materialize(&self) -> Vec<Slot<ElementRef>> {
        match &self.filter {
            Filter::Children => self
                .scope
                .children()
                .into_iter()
                .map(|node| match node {
                    Node::Element(el) => Slot::Element(el),
                    Node::Text(_) => Slot::Foreign,
                })
                .collect(),
            Filter::Class(class) => self
                .scope
                .descendants()
                .into_iter()
                .filter(|el| el.has_class(class))
                .map(Slot::Element)
                .collect(),
            Filter::Tag(tag) => self
                .scope
                .descendants()
                .into_iter()
                .filter(|el| tag == "*" || el.tag() == *tag)
                .map(Slot::Element)
                .collect(),
        }
    }
}

impl HandleSource for Document {
    type Handle = ElementRef;
    type Collection = LiveCollection;

    fn element_by_id(&self, id: &str) -> Option<ElementRef> {
        self.get_element_by_id(id)
    }

    fn collection(&self, query: &Query) -> LiveCollection {
        match query {
            Query::Class(class) => self.by_class(class),
            Query::Tag(tag) => self.by_tag(tag),
        }
    }
}
