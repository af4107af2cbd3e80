// fortnml/src/namelist/core.rs

//! Core Namelist struct and basic operations.

use super::formatting::FormatOptions;
use crate::fortran_types::FortranValue;
use linked_hash_map::LinkedHashMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

const COGROUP_PREFIX: &str = "_grp_";

/// Internal key of the `id`-th member of cogroup `name`.
pub(crate) fn cogroup_key(name: &str, id: usize) -> String {
    format!("{}{}_{}", COGROUP_PREFIX, name, id)
}

/// Public name of an entry, stripping the cogroup decoration if present.
pub(crate) fn basename(key: &str) -> &str {
    match key.strip_prefix(COGROUP_PREFIX) {
        Some(rest) => rest.rsplit_once('_').map_or(rest, |(name, _)| name),
        None => key,
    }
}

/// An ordered, case-insensitive map of namelist entries.
///
/// A top-level `Namelist` maps group names to groups, each of which is again
/// a `Namelist` mapping variable names to values. Derived types nest the
/// same way. Keys are stored in lower case.
///
/// Repeated groups (cogroups) are stored under distinct internal keys of the
/// form `_grp_<name>_<n>` and exposed together through [`Namelist::cogroup`].
#[derive(Debug, Clone, Default)]
pub struct Namelist {
    pub(crate) entries: LinkedHashMap<String, FortranValue>,
    pub(crate) cogroups: LinkedHashMap<String, Vec<String>>,
    pub(crate) start_index: LinkedHashMap<String, Vec<Option<i64>>>,
    pub(crate) default_start_index: Option<i64>,
    pub(crate) format: FormatOptions,
}

impl Namelist {
    /// Create a new empty namelist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty namelist whose vectors are assumed to start at `index`
    /// when they have no explicit start index.
    pub fn with_default_start_index(index: i64) -> Self {
        Self {
            default_start_index: Some(index),
            ..Self::default()
        }
    }

    /// Number of stored entries; each cogroup member counts separately.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check for a variable, group or cogroup name.
    pub fn contains(&self, key: &str) -> bool {
        let key = key.to_lowercase();
        self.entries.contains_key(&key) || self.cogroups.contains_key(&key)
    }

    /// True if `key` names a repeated group.
    pub fn is_cogroup(&self, key: &str) -> bool {
        self.cogroups.contains_key(&key.to_lowercase())
    }

    /// Get a value by name.
    ///
    /// Repeated groups are not returned here; use [`Namelist::cogroup`].
    pub fn get(&self, key: &str) -> Option<&FortranValue> {
        self.entries.get(&key.to_lowercase())
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut FortranValue> {
        self.entries.get_mut(&key.to_lowercase())
    }

    /// Set a value, keeping the position of an existing entry.
    ///
    /// Lists of derived types are promoted to derived type arrays. Setting
    /// the name of a cogroup replaces all of its members.
    pub fn set<T: Into<FortranValue>>(&mut self, key: &str, value: T) -> &mut Self {
        let key = key.to_lowercase();
        let value: FortranValue = value.into();
        let value = value.normalize();

        if let Some(members) = self.cogroups.remove(&key) {
            for member in members {
                self.entries.remove(&member);
            }
        }

        match self.entries.get_mut(&key) {
            Some(slot) => *slot = value,
            None => {
                self.entries.insert(key, value);
            }
        }
        self
    }

    /// Remove an entry. Removing a cogroup name removes every member and
    /// returns them as a derived type array.
    pub fn remove(&mut self, key: &str) -> Option<FortranValue> {
        let key = key.to_lowercase();
        if let Some(members) = self.cogroups.remove(&key) {
            let groups = members
                .iter()
                .map(|member| match self.entries.remove(member) {
                    Some(FortranValue::Derived(nml)) => Some(nml),
                    _ => None,
                })
                .collect();
            return Some(FortranValue::DerivedArray(groups));
        }
        self.start_index.remove(&key);
        self.entries.remove(&key)
    }

    /// Iterate over `(name, value)` pairs in insertion order. Cogroup members
    /// are reported under their shared name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FortranValue)> {
        self.entries.iter().map(|(k, v)| (basename(k), v))
    }

    /// Entry names in insertion order; a cogroup name repeats per member.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| basename(k))
    }

    /// Iterate over entries by internal key.
    pub(crate) fn raw_entries(&self) -> impl Iterator<Item = (&String, &FortranValue)> {
        self.entries.iter()
    }

    /// Get a group by name.
    pub fn group(&self, name: &str) -> Option<&Namelist> {
        self.get(name).and_then(FortranValue::as_namelist)
    }

    pub fn group_mut(&mut self, name: &str) -> Option<&mut Namelist> {
        self.get_mut(name).and_then(FortranValue::as_namelist_mut)
    }

    /// Iterate over `((group, variable), value)` across all groups.
    pub fn groups(&self) -> impl Iterator<Item = ((&str, &str), &FortranValue)> {
        self.iter().flat_map(|(grp, value)| {
            value
                .as_namelist()
                .into_iter()
                .flat_map(move |nml| nml.iter().map(move |(var, v)| ((grp, var), v)))
        })
    }

    /// Starting subscripts of an array variable, one per axis. `None` marks an
    /// axis whose first index is unknown.
    pub fn start_index(&self, key: &str) -> Option<&[Option<i64>]> {
        self.start_index.get(&key.to_lowercase()).map(Vec::as_slice)
    }

    pub fn set_start_index(&mut self, key: &str, start: Vec<Option<i64>>) {
        let key = key.to_lowercase();
        match self.start_index.get_mut(&key) {
            Some(slot) => *slot = start,
            None => {
                self.start_index.insert(key, start);
            }
        }
    }

    pub fn remove_start_index(&mut self, key: &str) -> Option<Vec<Option<i64>>> {
        self.start_index.remove(&key.to_lowercase())
    }

    /// All recorded start indices.
    pub fn start_indices(&self) -> impl Iterator<Item = (&str, &[Option<i64>])> {
        self.start_index.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn default_start_index(&self) -> Option<i64> {
        self.default_start_index
    }

    pub fn set_default_start_index(&mut self, index: Option<i64>) {
        self.default_start_index = index;
    }
}

/// Equality compares entries only, ignoring entry order, start indices and
/// formatting properties.
impl PartialEq for Namelist {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .all(|(k, v)| other.entries.get(k) == Some(v))
    }
}

impl Serialize for Namelist {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let extra = usize::from(!self.start_index.is_empty());
        let mut map = serializer.serialize_map(Some(self.entries.len() + extra))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        if !self.start_index.is_empty() {
            map.serialize_entry("_start_index", &StartIndex(&self.start_index))?;
        }
        map.end()
    }
}

struct StartIndex<'a>(&'a LinkedHashMap<String, Vec<Option<i64>>>);

impl Serialize for StartIndex<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter())
    }
}
