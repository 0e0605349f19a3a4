//! Console variable access
//!
//! The console itself lives outside this workspace; visualization code only
//! needs to read integer toggles by name, and treats a missing toggle as
//! "use the default".

use std::collections::HashMap;

/// Read access to named integer toggles
pub trait ToggleSource {
    /// Current value of `name`, or `None` when it is not registered
    fn read_int(&self, name: &str) -> Option<i64>;
}

/// No toggles registered at all
#[derive(Debug, Clone, Copy, Default)]
pub struct NoToggles;

impl ToggleSource for NoToggles {
    fn read_int(&self, _name: &str) -> Option<i64> {
        None
    }
}

/// Simple map-backed toggle table
#[derive(Debug, Clone, Default)]
pub struct ToggleTable {
    values: HashMap<String, i64>,
}

impl ToggleTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or overwrite a toggle
    pub fn set(&mut self, name: impl Into<String>, value: i64) -> &mut Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Remove a toggle
    pub fn remove(&mut self, name: &str) -> Option<i64> {
        self.values.remove(name)
    }
}

impl ToggleSource for ToggleTable {
    fn read_int(&self, name: &str) -> Option<i64> {
        self.values.get(name).copied()
    }
}

impl<S: ToggleSource + ?Sized> ToggleSource for &S {
    fn read_int(&self, name: &str) -> Option<i64> {
        (**self).read_int(name)
    }
}
