//! One-time enhancement of handles and collections.
//!
//! Markers live in side tables keyed by identity, never on the handle
//! itself. Enhancement wraps the input in an adapter that owns it and
//! exposes `update`; the original handle is left untouched. Markers of
//! handles the host reports as dropped are forgotten.

use crate::apply::ElementApplier;
use crate::collection::{ApplyResult, CollectionUpdater};
use crate::handle::{ElementHandle, HandleCollection, LifeToken};
use crate::value::{Descriptor, Value};
use core_types::{CollectionKey, HandleKey};
use std::collections::HashMap;
use std::hash::Hash;
use std::ops::{Deref, DerefMut};

const LOG_TARGET: &str = "batch_update.enhance";

/// External provider of a richer enhancement, preferred when registered.
pub trait EnhancementFacility<C: HandleCollection> {
    fn enhance_one(&mut self, handle: C::Handle) -> C::Handle;

    fn enhance_many(&mut self, collection: C) -> C;
}

/// Who performed the enhancement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnhancedBy {
    Local,
    Facility,
}

/// Handle plus update capability.
#[derive(Clone, Debug)]
pub struct Enhanced<H> {
    handle: H,
    applier: ElementApplier,
    origin: EnhancedBy,
}

impl<H: ElementHandle> Enhanced<H> {
    pub fn update(&mut self, descriptor: &Descriptor) -> &mut Self {
        self.applier.apply(&mut self.handle, descriptor);
        self
    }

    pub fn origin(&self) -> EnhancedBy {
        self.origin
    }

    pub fn into_inner(self) -> H {
        self.handle
    }
}

impl<H> Deref for Enhanced<H> {
    type Target = H;

    fn deref(&self) -> &H {
        &self.handle
    }
}

impl<H> DerefMut for Enhanced<H> {
    fn deref_mut(&mut self) -> &mut H {
        &mut self.handle
    }
}

/// Collection plus update capability.
#[derive(Clone, Debug)]
pub struct EnhancedCollection<C> {
    collection: C,
    updater: CollectionUpdater,
    origin: EnhancedBy,
}

impl<C: HandleCollection> EnhancedCollection<C> {
    pub fn update(&self, descriptor: &Descriptor) -> ApplyResult {
        self.updater.update(&self.collection, descriptor)
    }

    pub fn update_value(&self, descriptor: &Value) -> ApplyResult {
        self.updater.update_value(Some(&self.collection), descriptor)
    }

    pub fn origin(&self) -> EnhancedBy {
        self.origin
    }

    pub fn into_inner(self) -> C {
        self.collection
    }
}

impl<C> Deref for EnhancedCollection<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.collection
    }
}

/// Table size below which dead entries are left in place.
const SWEEP_FLOOR: usize = 64;

#[derive(Debug)]
struct Marker {
    origin: EnhancedBy,
    life: Option<LifeToken>,
}

impl Marker {
    fn is_live(&self) -> bool {
        self.life.as_ref().is_none_or(|life| life.strong_count() > 0)
    }
}

/// Identity-keyed markers. Entries whose handle has been dropped are swept
/// whenever the table doubles in size.
#[derive(Debug)]
struct MarkerTable<K> {
    entries: HashMap<K, Marker>,
    sweep_at: usize,
}

impl<K: Copy + Eq + Hash> MarkerTable<K> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            sweep_at: SWEEP_FLOOR,
        }
    }

    fn origin(&self, key: K) -> Option<EnhancedBy> {
        self.entries
            .get(&key)
            .filter(|marker| marker.is_live())
            .map(|marker| marker.origin)
    }

    fn mark(&mut self, key: K, origin: EnhancedBy, life: Option<LifeToken>) {
        if self.entries.len() >= self.sweep_at {
            self.sweep();
            self.sweep_at = (self.entries.len() * 2).max(SWEEP_FLOOR);
        }
        self.entries.insert(key, Marker { origin, life });
    }

    fn sweep(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, marker| marker.is_live());
        before - self.entries.len()
    }

    fn release(&mut self, key: K) -> bool {
        self.entries.remove(&key).is_some()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

pub struct EnhancementGuard<C: HandleCollection> {
    elements: MarkerTable<HandleKey>,
    collections: MarkerTable<CollectionKey>,
    facility: Option<Box<dyn EnhancementFacility<C>>>,
    applier: ElementApplier,
}

impl<C: HandleCollection> Default for EnhancementGuard<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: HandleCollection> EnhancementGuard<C> {
    pub fn new() -> Self {
        Self::with_applier(ElementApplier::default())
    }

    pub fn with_applier(applier: ElementApplier) -> Self {
        Self {
            elements: MarkerTable::new(),
            collections: MarkerTable::new(),
            facility: None,
            applier,
        }
    }

    /// Prefer `facility` for handles and collections not yet enhanced.
    pub fn register_facility(&mut self, facility: Box<dyn EnhancementFacility<C>>) {
        self.facility = Some(facility);
    }

    pub fn has_facility(&self) -> bool {
        self.facility.is_some()
    }

    pub fn is_enhanced(&self, key: HandleKey) -> bool {
        self.elements.origin(key).is_some()
    }

    pub fn is_collection_enhanced(&self, key: CollectionKey) -> bool {
        self.collections.origin(key).is_some()
    }

    /// Drop the marker of a handle whose host cannot report liveness.
    pub fn release(&mut self, key: HandleKey) -> bool {
        self.elements.release(key)
    }

    pub fn release_collection(&mut self, key: CollectionKey) -> bool {
        self.collections.release(key)
    }

    /// Remove markers of dropped handles and collections now instead of on
    /// the next growth. Returns how many were removed.
    pub fn sweep(&mut self) -> usize {
        self.elements.sweep() + self.collections.sweep()
    }

    /// Markers currently held, dead ones not yet swept included.
    pub fn marker_count(&self) -> usize {
        self.elements.len() + self.collections.len()
    }

    pub fn ensure_enhanced(&mut self, handle: C::Handle) -> Enhanced<C::Handle> {
        let key = handle.key();
        if let Some(origin) = self.elements.origin(key) {
            log::trace!(target: LOG_TARGET, "handle {key:?} already enhanced");
            return Enhanced {
                handle,
                applier: self.applier.clone(),
                origin,
            };
        }
        let life = handle.life_token();
        let (handle, origin) = match self.facility.as_mut() {
            Some(facility) => (facility.enhance_one(handle), EnhancedBy::Facility),
            None => (handle, EnhancedBy::Local),
        };
        self.elements.mark(key, origin, life);
        let result_key = handle.key();
        if result_key != key {
            self.elements.mark(result_key, origin, handle.life_token());
        }
        log::debug!(target: LOG_TARGET, "enhanced handle {key:?} ({origin:?})");
        Enhanced {
            handle,
            applier: self.applier.clone(),
            origin,
        }
    }

    pub fn ensure_enhanced_collection(&mut self, collection: C) -> EnhancedCollection<C> {
        let key = collection.key();
        let updater = CollectionUpdater::with_applier(self.applier.clone());
        if let Some(origin) = self.collections.origin(key) {
            log::trace!(target: LOG_TARGET, "collection {key:?} already enhanced");
            return EnhancedCollection {
                collection,
                updater,
                origin,
            };
        }
        let life = collection.life_token();
        let (collection, origin) = match self.facility.as_mut() {
            Some(facility) => (facility.enhance_many(collection), EnhancedBy::Facility),
            None => (collection, EnhancedBy::Local),
        };
        self.collections.mark(key, origin, life);
        let result_key = collection.key();
        if result_key != key {
            self.collections.mark(result_key, origin, collection.life_token());
        }
        log::debug!(target: LOG_TARGET, "enhanced collection {key:?} ({origin:?})");
        EnhancedCollection {
            collection,
            updater,
            origin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::StaticCollection;
    use crate::test_support::RecordingElement;
    use std::cell::Cell;
    use std::rc::Rc;

    type Recorders = StaticCollection<RecordingElement>;

    struct CountingFacility {
        one: Rc<Cell<usize>>,
        many: Rc<Cell<usize>>,
    }

    impl EnhancementFacility<Recorders> for CountingFacility {
        fn enhance_one(&mut self, mut handle: RecordingElement) -> RecordingElement {
            self.one.set(self.one.get() + 1);
            let _ = handle.add_class("enhanced");
            handle
        }

        fn enhance_many(&mut self, collection: Recorders) -> Recorders {
            self.many.set(self.many.get() + 1);
            collection
        }
    }

    #[test]
    fn local_enhancement_is_idempotent() {
        let mut guard = EnhancementGuard::<Recorders>::new();
        let el = RecordingElement::default();
        let first = guard.ensure_enhanced(el.clone());
        assert_eq!(first.origin(), EnhancedBy::Local);
        assert!(guard.is_enhanced(el.key()));
        let second = guard.ensure_enhanced(first.into_inner());
        assert_eq!(second.origin(), EnhancedBy::Local);
        assert_eq!(guard.marker_count(), 1);
    }

    #[test]
    fn marker_is_not_stored_on_the_handle() {
        let mut guard = EnhancementGuard::<Recorders>::new();
        let el = RecordingElement::default();
        guard.ensure_enhanced(el.clone());
        let state = el.state.borrow();
        assert!(state.attributes.is_empty());
        assert!(state.properties.is_empty());
        assert!(state.data.is_empty());
    }

    #[test]
    fn facility_runs_once_per_handle() {
        let one = Rc::new(Cell::new(0));
        let many = Rc::new(Cell::new(0));
        let mut guard = EnhancementGuard::<Recorders>::new();
        guard.register_facility(Box::new(CountingFacility {
            one: one.clone(),
            many: many.clone(),
        }));
        let el = RecordingElement::default();
        let a = guard.ensure_enhanced(el.clone());
        let b = guard.ensure_enhanced(el.clone());
        assert_eq!(a.origin(), EnhancedBy::Facility);
        assert_eq!(b.origin(), EnhancedBy::Facility);
        assert_eq!(one.get(), 1);
        assert_eq!(el.state.borrow().classes, ["enhanced"]);

        let c = Recorders::new([el.clone()]);
        guard.ensure_enhanced_collection(c.clone());
        guard.ensure_enhanced_collection(c.clone());
        assert_eq!(many.get(), 1);
        assert!(guard.is_collection_enhanced(c.key()));
    }

    #[test]
    fn enhanced_handle_updates() {
        let mut guard = EnhancementGuard::<Recorders>::new();
        let mut el = guard.ensure_enhanced(RecordingElement::default());
        el.update(&Descriptor::new().with("title", "a"))
            .update(&Descriptor::new().with("lang", "en"));
        assert_eq!(el.attribute("title").as_deref(), Some("a"));
        assert_eq!(el.attribute("lang").as_deref(), Some("en"));
    }

    #[test]
    fn enhanced_collection_updates() {
        let mut guard = EnhancementGuard::<Recorders>::new();
        let items = [RecordingElement::default(), RecordingElement::default()];
        let c = guard.ensure_enhanced_collection(Recorders::new(items.clone()));
        let result = c.update(&Descriptor::new().with("title", "x"));
        assert_eq!(result.stats.bulk_update_count, 2);
        assert_eq!(c.len(), 2);
        assert!(items.iter().all(|el| el.attribute("title").as_deref() == Some("x")));
    }

    struct ReplacingFacility {
        calls: Rc<Cell<usize>>,
    }

    impl EnhancementFacility<Recorders> for ReplacingFacility {
        fn enhance_one(&mut self, _handle: RecordingElement) -> RecordingElement {
            self.calls.set(self.calls.get() + 1);
            RecordingElement::default()
        }

        fn enhance_many(&mut self, collection: Recorders) -> Recorders {
            self.calls.set(self.calls.get() + 1);
            Recorders::from_slots(collection.slots().to_vec())
        }
    }

    #[test]
    fn facility_result_is_marked_too() {
        let calls = Rc::new(Cell::new(0));
        let mut guard = EnhancementGuard::<Recorders>::new();
        guard.register_facility(Box::new(ReplacingFacility {
            calls: calls.clone(),
        }));
        let input = RecordingElement::default();
        let first = guard.ensure_enhanced(input.clone());
        let replacement = first.into_inner();
        assert_ne!(replacement.key(), input.key());

        let again = guard.ensure_enhanced(replacement.clone());
        assert_eq!(again.origin(), EnhancedBy::Facility);
        assert!(guard.is_enhanced(input.key()));
        assert!(guard.is_enhanced(replacement.key()));
        assert_eq!(calls.get(), 1);

        let collection = Recorders::new([input]);
        let wrapped = guard.ensure_enhanced_collection(collection.clone()).into_inner();
        assert_ne!(wrapped.key(), collection.key());
        guard.ensure_enhanced_collection(wrapped);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn dropped_handles_are_forgotten() {
        let mut guard = EnhancementGuard::<Recorders>::new();
        for _ in 0..1000 {
            let mut el = guard.ensure_enhanced(RecordingElement::default());
            el.update(&Descriptor::new().with("title", "x"));
            guard.ensure_enhanced_collection(Recorders::new([RecordingElement::default()]));
        }
        assert!(guard.marker_count() <= 2 * SWEEP_FLOOR);

        let kept = RecordingElement::default();
        guard.ensure_enhanced(kept.clone());
        guard.sweep();
        assert_eq!(guard.marker_count(), 1);
        assert!(guard.is_enhanced(kept.key()));
    }

    #[test]
    fn dead_marker_does_not_report_enhanced() {
        let mut guard = EnhancementGuard::<Recorders>::new();
        let el = RecordingElement::default();
        let key = el.key();
        guard.ensure_enhanced(el);
        assert!(!guard.is_enhanced(key));
        assert_eq!(guard.sweep(), 1);
    }

    #[test]
    fn release_allows_re_enhancement() {
        let mut guard = EnhancementGuard::<Recorders>::new();
        let el = RecordingElement::default();
        guard.ensure_enhanced(el.clone());
        assert!(guard.release(el.key()));
        assert!(!guard.is_enhanced(el.key()));
        assert!(!guard.release(el.key()));
    }
}
