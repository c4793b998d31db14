use std::collections::BTreeMap;

use crate::error::Error;
use crate::problem::Key;

/// A numeric parameter indexed by a typed key tuple. Lookups outside the loaded
/// keys are data errors, never defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Param<K: Key> {
    name: String,
    values: BTreeMap<K, f64>,
}

impl<K: Key> Param<K> {
    pub fn new<I>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
    {
        Param {
            name: name.into(),
            values: values.into_iter().collect(),
        }
    }

    /// The same `value` for every key in `keys`
    pub fn broadcast<I>(name: impl Into<String>, keys: I, value: f64) -> Self
    where
        I: IntoIterator<Item = K>,
    {
        Param::new(name, keys.into_iter().map(|k| (k, value)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, key: K) -> Result<f64, Error> {
        self.values
            .get(&key)
            .copied()
            .ok_or_else(|| Error::MissingKey {
                table: self.name.clone(),
                key: key.label(),
            })
    }

    pub fn contains(&self, key: K) -> bool {
        self.values.contains_key(&key)
    }

    /// Multiplies every value by `factor`, renaming the parameter
    pub fn scale(&self, name: impl Into<String>, factor: f64) -> Self {
        Param::new(name, self.values.iter().map(|(&k, &v)| (k, v * factor)))
    }

    /// Checks that every key of `domain` has a value.
    pub fn ensure_total<I>(&self, domain: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = K>,
    {
        for key in domain {
            self.get(key)?;
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, f64)> + '_ {
        self.values.iter().map(|(&k, &v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{ProductId, TesterId};

    #[test]
    fn missing_key_names_table_and_key() {
        let p = Param::new("tester_ability", [((TesterId::new(1), ProductId::new(2)), 3.0)]);
        assert_eq!(p.get((TesterId::new(1), ProductId::new(2))).unwrap(), 3.0);

        let err = p.get((TesterId::new(2), ProductId::new(2))).unwrap_err();
        assert_eq!(err.to_string(), "parameter tester_ability has no value for (2,2)");
    }

    #[test]
    fn broadcast_and_scale() {
        let keys = [TesterId::new(1), TesterId::new(4)];
        let hours = Param::broadcast("work_hours", keys, 168.0);
        assert_eq!(hours.len(), 2);
        assert!(hours.ensure_total(keys).is_ok());
        assert!(hours.ensure_total([TesterId::new(2)]).is_err());

        let half = hours.scale("half", 0.5);
        assert_eq!(half.name(), "half");
        assert_eq!(half.get(TesterId::new(4)).unwrap(), 84.0);
    }
}
