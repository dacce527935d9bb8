use alloc::{string::String, sync::Arc};
use core::fmt;

use indexmap::IndexMap;

use super::Value;
use crate::{Error, Result, schema::DictionarySchema};

/// An ordered map from string keys to simple values.
///
/// Every [`put`](Dictionary::put) validates the value against the simple
/// value grammar. A dictionary may be *constrained* by a
/// [`DictionarySchema`], in which case values stored under a declared
/// property must also fit that property's type.
///
/// Storage is copy-on-write, so cloning a dictionary is cheap and the clone
/// shares its entries until either side is modified.
///
/// # Example
///
/// ```
/// use dictum::{Dictionary, Value};
///
/// let mut dict = Dictionary::new();
/// dict.put("name", "Alice").unwrap();
/// dict.put("age", 30).unwrap();
/// assert_eq!(dict.key_at(1), Some("age"));
///
/// // storing null removes the key
/// dict.put("name", Value::Null).unwrap();
/// assert_eq!(dict.len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct Dictionary {
    entries: Arc<IndexMap<String, Value>>,
    schema: Option<Arc<DictionarySchema>>,
}

impl Dictionary {
    /// Creates an empty schemaless dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty dictionary constrained by `schema`.
    #[must_use]
    pub fn constrained(schema: Arc<DictionarySchema>) -> Self {
        Self {
            entries: Arc::default(),
            schema: Some(schema),
        }
    }

    /// Builds a schemaless dictionary, validating every entry.
    pub fn from_entries<K, V, I>(entries: I) -> Result<Self>
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut dict = Self::new();
        for (key, value) in entries {
            dict.put(key, value)?;
        }
        Ok(dict)
    }

    #[must_use]
    pub fn schema(&self) -> Option<&Arc<DictionarySchema>> {
        self.schema.as_ref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Stores `value` under `key` and returns the previous value.
    ///
    /// Storing [`Value::Null`] removes the key. Replacing the value of an
    /// existing key keeps its position.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<Option<Value>> {
        let key = key.into();
        let value = value.into();
        if value.is_null() {
            return Ok(self.remove(&key));
        }
        value.check()?;
        if let Some(schema) = &self.schema {
            if let Some(property) = schema.property(&key) {
                property.check(&key, &value)?;
            }
        }
        Ok(Arc::make_mut(&mut self.entries).insert(key, value))
    }

    /// Removes `key`, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        if !self.entries.contains_key(key) {
            return None;
        }
        Arc::make_mut(&mut self.entries).shift_remove(key)
    }

    /// Moves the value stored under `from` to `to` and returns whatever `to`
    /// held before. If `from` is absent, `to` is removed.
    pub fn rename(&mut self, from: &str, to: &str) -> Result<Option<Value>> {
        let value = self.remove(from).unwrap_or_default();
        self.put(to, value)
    }

    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            self.entries = Arc::default();
        }
    }

    /// Looks `name` up, then each alias in order, returning the key that
    /// matched along with its value.
    pub fn search<'a, S: AsRef<str>>(
        &'a self,
        name: &str,
        aliases: impl IntoIterator<Item = S>,
    ) -> Option<(&'a str, &'a Value)> {
        if let Some((key, value)) = self.entries.get_key_value(name) {
            return Some((key.as_str(), value));
        }
        aliases.into_iter().find_map(|alias| {
            self.entries
                .get_key_value(alias.as_ref())
                .map(|(key, value)| (key.as_str(), value))
        })
    }

    /// Returns the key at insertion position `pos`.
    #[must_use]
    pub fn key_at(&self, pos: usize) -> Option<&str> {
        self.entries.get_index(pos).map(|(key, _)| key.as_str())
    }

    /// Returns the value at insertion position `pos`.
    #[must_use]
    pub fn value_at(&self, pos: usize) -> Option<&Value> {
        self.entries.get_index(pos).map(|(_, value)| value)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.entries.iter()
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, String, Value> {
        self.entries.keys()
    }

    pub fn values(&self) -> indexmap::map::Values<'_, String, Value> {
        self.entries.values()
    }

    /// Copies this dictionary, keeping its schema.
    ///
    /// A shallow copy gets its own top-level map but shares nested arrays and
    /// dictionaries with `self`. A deep copy shares nothing.
    #[must_use]
    pub fn duplicate(&self, deep: bool) -> Dictionary {
        let entries = if deep {
            self.entries
                .iter()
                .map(|(key, value)| (key.clone(), value.deep_clone()))
                .collect()
        } else {
            IndexMap::clone(&self.entries)
        };
        Dictionary {
            entries: Arc::new(entries),
            schema: self.schema.clone(),
        }
    }

    /// Returns a read-only view of this dictionary.
    #[must_use]
    pub fn immutable(&self) -> ImmutableDictionary<'_> {
        ImmutableDictionary { inner: self }
    }

    /// Whether every key declared by `schema` holds a value of the declared
    /// type. Keys the schema does not know are ignored.
    #[must_use]
    pub fn is_compatible_with(&self, schema: Option<&DictionarySchema>) -> bool {
        let Some(schema) = schema else {
            return true;
        };
        if let Some(own) = &self.schema {
            if core::ptr::eq(Arc::as_ptr(own), schema) {
                return true;
            }
        }
        self.entries.iter().all(|(key, value)| {
            schema
                .property(key)
                .is_none_or(|property| property.check(key, value).is_ok())
        })
    }

    /// Returns a copy bound to `schema`.
    pub fn project(&self, schema: Arc<DictionarySchema>) -> Result<Dictionary> {
        if !self.is_compatible_with(Some(&schema)) {
            return Err(Error::InvalidValue(format!(
                "dictionary is not compatible with schema '{}'",
                schema.name().unwrap_or("<anonymous>")
            )));
        }
        Ok(Dictionary {
            entries: Arc::new(IndexMap::clone(&self.entries)),
            schema: Some(schema),
        })
    }

    /// Whether both dictionaries share the same storage.
    #[must_use]
    pub fn ptr_eq(&self, other: &Dictionary) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }
}

impl PartialEq for Dictionary {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for Dictionary {}

impl fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl fmt::Display for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}: {value}")?;
        }
        f.write_str("}")
    }
}

impl<'a> IntoIterator for &'a Dictionary {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Operations shared by [`Dictionary`] and [`ImmutableDictionary`].
pub trait DictionaryAccess {
    fn get(&self, key: &str) -> Option<&Value>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn key_at(&self, pos: usize) -> Option<&str>;

    fn value_at(&self, pos: usize) -> Option<&Value>;

    fn search<'a>(&'a self, name: &str, aliases: &[String]) -> Option<(&'a str, &'a Value)>;

    fn is_compatible_with(&self, schema: Option<&DictionarySchema>) -> bool;

    fn duplicate(&self, deep: bool) -> Dictionary;

    fn put(&mut self, key: &str, value: Value) -> Result<Option<Value>>;

    fn remove(&mut self, key: &str) -> Result<Option<Value>>;

    fn rename(&mut self, from: &str, to: &str) -> Result<Option<Value>>;

    fn clear(&mut self) -> Result<()>;
}

impl DictionaryAccess for Dictionary {
    fn get(&self, key: &str) -> Option<&Value> {
        Dictionary::get(self, key)
    }

    fn len(&self) -> usize {
        Dictionary::len(self)
    }

    fn key_at(&self, pos: usize) -> Option<&str> {
        Dictionary::key_at(self, pos)
    }

    fn value_at(&self, pos: usize) -> Option<&Value> {
        Dictionary::value_at(self, pos)
    }

    fn search<'a>(&'a self, name: &str, aliases: &[String]) -> Option<(&'a str, &'a Value)> {
        Dictionary::search(self, name, aliases)
    }

    fn is_compatible_with(&self, schema: Option<&DictionarySchema>) -> bool {
        Dictionary::is_compatible_with(self, schema)
    }

    fn duplicate(&self, deep: bool) -> Dictionary {
        Dictionary::duplicate(self, deep)
    }

    fn put(&mut self, key: &str, value: Value) -> Result<Option<Value>> {
        Dictionary::put(self, key, value)
    }

    fn remove(&mut self, key: &str) -> Result<Option<Value>> {
        Ok(Dictionary::remove(self, key))
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<Option<Value>> {
        Dictionary::rename(self, from, to)
    }

    fn clear(&mut self) -> Result<()> {
        Dictionary::clear(self);
        Ok(())
    }
}

/// A read-only view over a [`Dictionary`].
///
/// Reads go straight to the backing dictionary; every mutation fails with
/// [`Error::UnsupportedOperation`].
#[derive(Clone, Copy, Debug)]
pub struct ImmutableDictionary<'a> {
    inner: &'a Dictionary,
}

impl<'a> ImmutableDictionary<'a> {
    #[must_use]
    pub fn inner(&self) -> &'a Dictionary {
        self.inner
    }

    pub fn iter(&self) -> indexmap::map::Iter<'a, String, Value> {
        self.inner.iter()
    }

    fn rejected(op: &str) -> Error {
        Error::UnsupportedOperation(format!("cannot {op} an immutable dictionary"))
    }
}

impl DictionaryAccess for ImmutableDictionary<'_> {
    fn get(&self, key: &str) -> Option<&Value> {
        self.inner.get(key)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn key_at(&self, pos: usize) -> Option<&str> {
        self.inner.key_at(pos)
    }

    fn value_at(&self, pos: usize) -> Option<&Value> {
        self.inner.value_at(pos)
    }

    fn search<'b>(&'b self, name: &str, aliases: &[String]) -> Option<(&'b str, &'b Value)> {
        self.inner.search(name, aliases)
    }

    fn is_compatible_with(&self, schema: Option<&DictionarySchema>) -> bool {
        self.inner.is_compatible_with(schema)
    }

    fn duplicate(&self, deep: bool) -> Dictionary {
        self.inner.duplicate(deep)
    }

    fn put(&mut self, _key: &str, _value: Value) -> Result<Option<Value>> {
        Err(Self::rejected("put into"))
    }

    fn remove(&mut self, _key: &str) -> Result<Option<Value>> {
        Err(Self::rejected("remove from"))
    }

    fn rename(&mut self, _from: &str, _to: &str) -> Result<Option<Value>> {
        Err(Self::rejected("rename a key of"))
    }

    fn clear(&mut self) -> Result<()> {
        Err(Self::rejected("clear"))
    }
}

impl PartialEq<Dictionary> for ImmutableDictionary<'_> {
    fn eq(&self, other: &Dictionary) -> bool {
        self.inner == other
    }
}

#[cfg(test)]
mod tests {
    use alloc::{string::ToString, vec};

    use super::*;
    use crate::value::ValueType;

    fn sample() -> Dictionary {
        Dictionary::from_entries([
            ("name", Value::from("Alice")),
            ("age", Value::from(30)),
            ("tags", Value::array(["a", "b"])),
        ])
        .unwrap()
    }

    #[test]
    fn test_put_rejects_heterogeneous_arrays() {
        let mut dict = Dictionary::new();
        let err = dict
            .put("mixed", Value::array([Value::from(1), Value::from("x")]))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidValue(_)));
        assert!(dict.is_empty());
    }

    #[test]
    fn test_null_removes() {
        let mut dict = sample();
        let previous = dict.put("age", Value::Null).unwrap();
        assert_eq!(previous, Some(Value::from(30)));
        assert!(!dict.contains_key("age"));
        assert_eq!(dict.key_at(1), Some("tags"));
    }

    #[test]
    fn test_ordinal_access() {
        let mut dict = sample();
        assert_eq!(dict.key_at(0), Some("name"));
        assert_eq!(dict.value_at(1), Some(&Value::from(30)));
        assert_eq!(dict.key_at(3), None);

        // replacing a value keeps its position
        dict.put("name", "Bob").unwrap();
        assert_eq!(dict.key_at(0), Some("name"));
        assert_eq!(dict.value_at(0), Some(&Value::from("Bob")));
    }

    #[test]
    fn test_search() {
        let dict = sample();
        assert_eq!(
            dict.search("title", ["nickname", "name"]),
            Some(("name", &Value::from("Alice")))
        );
        assert_eq!(
            dict.search("age", ["name"]),
            Some(("age", &Value::from(30)))
        );
        assert_eq!(dict.search("missing", Vec::<String>::new()), None);
    }

    #[test]
    fn test_rename() {
        let mut dict = sample();
        assert_eq!(dict.rename("age", "years").unwrap(), None);
        assert_eq!(dict.get("years"), Some(&Value::from(30)));
        assert!(!dict.contains_key("age"));

        let previous = dict.rename("missing", "name").unwrap();
        assert_eq!(previous, Some(Value::from("Alice")));
        assert!(!dict.contains_key("name"));
    }

    #[test]
    fn test_duplicate() {
        let mut nested = Dictionary::new();
        nested.put("x", 1).unwrap();
        let mut dict = Dictionary::new();
        dict.put("nested", nested).unwrap();

        let shallow = dict.duplicate(false);
        let deep = dict.duplicate(true);
        assert_eq!(shallow, dict);
        assert_eq!(deep, dict);

        let original = dict.get("nested").and_then(Value::as_dictionary).unwrap();
        let shared = shallow.get("nested").and_then(Value::as_dictionary).unwrap();
        let cloned = deep.get("nested").and_then(Value::as_dictionary).unwrap();
        assert!(original.ptr_eq(shared));
        assert!(!original.ptr_eq(cloned));

        // the top-level map is never shared
        let mut shallow = shallow;
        shallow.put("y", 2).unwrap();
        assert!(!dict.contains_key("y"));
    }

    #[test]
    fn test_immutable_view() {
        let dict = sample();
        let mut view = dict.immutable();
        assert_eq!(view.len(), 3);
        assert_eq!(view.get("name"), Some(&Value::from("Alice")));
        assert_eq!(view.key_at(2), Some("tags"));
        assert_eq!(view, dict);

        for err in [
            view.put("x", Value::from(1)).unwrap_err(),
            view.remove("name").unwrap_err(),
            view.rename("name", "title").unwrap_err(),
        ] {
            assert!(matches!(err, Error::UnsupportedOperation(_)));
        }
        assert!(matches!(
            view.clear().unwrap_err(),
            Error::UnsupportedOperation(_)
        ));
        assert_eq!(dict.len(), 3);
    }

    #[test]
    fn test_constrained_put() {
        let schema = DictionarySchema::create()
            .add_property("a", |p| p.with_type(ValueType::of::<f64>()))
            .add_property("n", |p| p.with_type(ValueType::of::<i32>()))
            .build()
            .unwrap();
        let mut dict = Dictionary::constrained(Arc::new(schema));

        dict.put("a", 3).unwrap();
        dict.put("other", "anything").unwrap();
        let err = dict.put("n", 3.5).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value: property 'n' is not of type i32"
        );
        let err = dict.put("a", "3").unwrap_err();
        assert!(matches!(err, Error::InvalidValue(_)));
    }

    #[test]
    fn test_compatibility() {
        let schema = DictionarySchema::create()
            .add_property("level", |p| p.with_type(ValueType::of::<i32>()))
            .build()
            .unwrap();
        let mut dict = Dictionary::new();
        dict.put("level", 3).unwrap();
        dict.put("extra", vec![true]).unwrap();
        assert!(dict.is_compatible_with(Some(&schema)));
        assert!(dict.is_compatible_with(None));

        dict.put("level", 3.0).unwrap();
        assert!(!dict.is_compatible_with(Some(&schema)));
        assert!(dict.project(Arc::new(schema)).is_err());
    }

    #[test]
    fn test_display() {
        let dict = sample();
        assert_eq!(
            dict.to_string(),
            r#"{name: "Alice", age: 30, tags: ["a", "b"]}"#
        );
    }
}
