//! Configuration values that may depend on the invoking session.

use crate::trigger::Trigger;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::sync::Arc;

/// A value that is either fixed or computed from the trigger at check time
/// (for example a longer cooldown for one channel, or no quota for moderators).
///
/// Deserializes from a plain `T`, which yields [`Computed::Fixed`].
pub enum Computed<T> {
    Fixed(T),
    Dynamic(Arc<dyn Fn(&Trigger) -> T + Send + Sync>),
}

impl<T> Computed<T> {
    /// Wrap a resolver closure.
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn(&Trigger) -> T + Send + Sync + 'static,
    {
        Computed::Dynamic(Arc::new(f))
    }
}

impl<T: Clone> Computed<T> {
    /// Concrete value for `trigger`.
    pub fn resolve(&self, trigger: &Trigger) -> T {
        match self {
            Computed::Fixed(value) => value.clone(),
            Computed::Dynamic(f) => f(trigger),
        }
    }
}

impl<T> From<T> for Computed<T> {
    fn from(value: T) -> Self {
        Computed::Fixed(value)
    }
}

impl<T: Default> Default for Computed<T> {
    fn default() -> Self {
        Computed::Fixed(T::default())
    }
}

impl<T: Clone> Clone for Computed<T> {
    fn clone(&self) -> Self {
        match self {
            Computed::Fixed(value) => Computed::Fixed(value.clone()),
            Computed::Dynamic(f) => Computed::Dynamic(f.clone()),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Computed::Fixed(value) => f.debug_tuple("Fixed").field(value).finish(),
            Computed::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Computed<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Computed::Fixed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_ignores_trigger() {
        let value: Computed<i64> = 5.into();
        assert_eq!(value.resolve(&Trigger::new()), 5);
    }

    #[test]
    fn dynamic_sees_trigger() {
        let value = Computed::dynamic(|t: &Trigger| if t.user_id() == Some("mod") { 0 } else { 3 });
        assert_eq!(value.resolve(&Trigger::new().user("mod")), 0);
        assert_eq!(value.clone().resolve(&Trigger::new().user("pleb")), 3);
        assert_eq!(format!("{:?}", value), "Dynamic(..)");
    }

    #[test]
    fn deserializes_as_fixed() {
        let value: Computed<f64> = serde_json::from_str("2.5").unwrap();
        assert!(matches!(value, Computed::Fixed(v) if v == 2.5));
    }
}
