/*!
 Lookup tables supplied by the host application: class name substitutions and per-class decode
 routines.
*/

use std::{
    collections::{BTreeMap, HashMap},
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::Arc,
};

use crate::{
    error::typedstream::TypedStreamError,
    typedstream::{
        coder::{Coder, Decodable},
        models::Value,
    },
};

/// Maps archived class names to the names their decode routines are registered under
///
/// Substitution only changes which routine is invoked, never how the stream is read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassRegistry {
    substitutions: BTreeMap<String, String>,
}

impl ClassRegistry {
    /// Decode instances archived as `archived` with the routine registered for `local`
    pub fn decode_class_name(&mut self, archived: &str, local: &str) {
        self.substitutions
            .insert(archived.to_string(), local.to_string());
    }

    /// The name to dispatch instances of the archived class to
    pub fn dispatch_name(&self, archived: &str) -> String {
        self.substitutions
            .get(archived)
            .cloned()
            .unwrap_or_else(|| archived.to_string())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.substitutions
            .iter()
            .map(|(archived, local)| (archived.as_str(), local.as_str()))
    }
}

/// Decode routines keyed by dispatch name, populated before the first decode call
#[derive(Clone, Default)]
pub struct DecodableRegistry {
    routines: HashMap<String, Arc<dyn Decodable>>,
}

impl DecodableRegistry {
    /// Register a closure that decodes instances of `name`
    pub fn register<F>(&mut self, name: &str, routine: F)
    where
        F: Fn(&mut dyn Coder) -> Result<Value, TypedStreamError> + Send + Sync + 'static,
    {
        self.routines.insert(name.to_string(), Arc::new(routine));
    }

    /// Register a [`Decodable`] implementation for instances of `name`
    pub fn register_decodable(&mut self, name: &str, routine: Arc<dyn Decodable>) {
        self.routines.insert(name.to_string(), routine);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.routines.contains_key(name)
    }

    /// Get the routine for a dispatch name
    ///
    /// Returns a new handle so the caller can hand the coder that owns this registry to the routine.
    pub(crate) fn get(&self, name: &str) -> Result<Arc<dyn Decodable>, TypedStreamError> {
        self.routines
            .get(name)
            .cloned()
            .ok_or_else(|| TypedStreamError::DecodableTypeNotFound(name.to_string()))
    }
}

impl Debug for DecodableRegistry {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let mut names: Vec<&String> = self.routines.keys().collect();
        names.sort();
        fmt.debug_struct("DecodableRegistry")
            .field("routines", &names)
            .finish()
    }
}
