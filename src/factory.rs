use log::{debug, trace};
use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

/*
A FactoryCache owns a factory building one computation unit per key, and
guarantees the factory runs at most once per distinct key: every call to
'get_or_create' after the first returns a clone of the Rc stored by the
first call, so callers observe the identical unit instance for as long as
the cache lives.

This matters when units memoize internally: a unit rebuilt on every lookup
starts with an empty memo and never hits. Entries are inserted, never
removed nor replaced.

Keys must have stable, well-defined equality and hashing; a key type whose
equality drifts shows up as spurious rebuilds, which the cache cannot
detect.

Not for concurrent use (the backing map is a RefCell, so the type is not
Sync). The 'shared' module provides the mutex-guarded equivalent. The
factory may consult the same cache for other keys: no borrow is held while
it runs, and if a nested call races the insertion the first stored unit
wins.
 */
pub struct FactoryCache<K, U, F> {
    units: RefCell<HashMap<K, Rc<U>>>,
    factory: F,
}

impl<K, U, F> FactoryCache<K, U, F> {
    pub fn new(factory: F) -> Self {
        FactoryCache {
            units: RefCell::new(HashMap::new()),
            factory,
        }
    }

    /// Number of units built so far.
    pub fn len(&self) -> usize {
        self.units.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.borrow().is_empty()
    }
}

impl<K, U, F> FactoryCache<K, U, F>
where
    K: Eq + Hash + Clone,
    F: Fn(&K) -> U,
{
    /// Return the unit stored for this key, building it on the first request.
    /// The same Rc allocation is returned on every subsequent call.
    pub fn get_or_create(&self, key: &K) -> Rc<U> {
        if let Some(unit) = self.units.borrow().get(key) {
            trace!("unit cache hit");
            return unit.clone();
        }
        debug!("unit cache miss, invoking factory ({} built so far)", self.len());
        let unit = Rc::new((self.factory)(key));
        self.units
            .borrow_mut()
            .entry(key.clone())
            .or_insert(unit)
            .clone()
    }
}

impl<K, U, E, F> FactoryCache<K, U, F>
where
    K: Eq + Hash + Clone,
    F: Fn(&K) -> Result<U, E>,
{
    /// Fallible twin of 'get_or_create', for factories returning Result.
    /// An Err propagates to the caller and nothing is stored, so a later
    /// call with the same key runs the factory again: construction failure
    /// is never memoized.
    pub fn get_or_try_create(&self, key: &K) -> Result<Rc<U>, E> {
        if let Some(unit) = self.units.borrow().get(key) {
            trace!("unit cache hit");
            return Ok(unit.clone());
        }
        let unit = match (self.factory)(key) {
            Ok(unit) => Rc::new(unit),
            Err(e) => {
                debug!("factory failed, key stays absent");
                return Err(e);
            }
        };
        debug!("unit cache miss, factory succeeded ({} built so far)", self.len());
        Ok(self
            .units
            .borrow_mut()
            .entry(key.clone())
            .or_insert(unit)
            .clone())
    }
}
