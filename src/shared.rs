use log::{debug, trace};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

/*
SharedFactoryCache is the thread-safe flavor of FactoryCache: same
contract (one factory run per distinct key, identical Arc returned
forever after), usable from concurrent callers.

The whole check-then-insert sequence runs under one mutex, factory call
included. Two callers can therefore never both observe "absent" for a key
and both construct: the factory runs at most once per key even under
races, at the price of serializing constructions. Consequence: the
factory must not call back into the same cache, that would deadlock.

A factory that panics poisons the cache instance; panics are not an error
channel here. Fallible construction goes through 'get_or_try_create',
which stores nothing on Err.
 */
pub struct SharedFactoryCache<K, U, F> {
    units: Mutex<HashMap<K, Arc<U>>>,
    factory: F,
}

impl<K, U, F> SharedFactoryCache<K, U, F> {
    pub fn new(factory: F) -> Self {
        SharedFactoryCache {
            units: Mutex::new(HashMap::new()),
            factory,
        }
    }

    /// Number of units built so far.
    pub fn len(&self) -> usize {
        self.units.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.lock().unwrap().is_empty()
    }
}

impl<K, U, F> SharedFactoryCache<K, U, F>
where
    K: Eq + Hash + Clone,
    F: Fn(&K) -> U,
{
    /// Return the unit stored for this key, building it on the first
    /// request. The same Arc allocation is returned on every subsequent
    /// call, from any thread.
    pub fn get_or_create(&self, key: &K) -> Arc<U> {
        let mut units = self.units.lock().unwrap();
        if let Some(unit) = units.get(key) {
            trace!("unit cache hit");
            return unit.clone();
        }
        debug!("unit cache miss, invoking factory ({} built so far)", units.len());
        let unit = Arc::new((self.factory)(key));
        units.insert(key.clone(), unit.clone());
        unit
    }
}

impl<K, U, E, F> SharedFactoryCache<K, U, F>
where
    K: Eq + Hash + Clone,
    F: Fn(&K) -> Result<U, E>,
{
    /// Fallible twin of 'get_or_create'. An Err propagates and nothing is
    /// stored, so a later call with the same key runs the factory again.
    pub fn get_or_try_create(&self, key: &K) -> Result<Arc<U>, E> {
        let mut units = self.units.lock().unwrap();
        if let Some(unit) = units.get(key) {
            trace!("unit cache hit");
            return Ok(unit.clone());
        }
        let unit = match (self.factory)(key) {
            Ok(unit) => Arc::new(unit),
            Err(e) => {
                debug!("factory failed, key stays absent");
                return Err(e);
            }
        };
        debug!("unit cache miss, factory succeeded ({} built so far)", units.len());
        units.insert(key.clone(), unit.clone());
        Ok(unit)
    }
}
