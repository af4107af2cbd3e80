// fortnml/src/namelist/cogroup.rs

//! Repeated namelist groups.
//!
//! A file may hold several groups with the same name. Each one is stored
//! under its own internal key and the views here address them by position,
//! writing through to the owning namelist.

use super::core::{cogroup_key, Namelist};
use crate::fortran_types::FortranValue;

impl Namelist {
    /// Convert an existing group into a cogroup of one, in place.
    ///
    /// Does nothing if `name` already is a cogroup. If no group of that name
    /// exists, an empty cogroup record is created.
    pub fn create_cogroup(&mut self, name: &str) {
        let name = name.to_lowercase();
        if self.cogroups.contains_key(&name) {
            return;
        }

        let mut members = Vec::new();
        if self.entries.contains_key(&name) {
            let internal = cogroup_key(&name, 0);
            let old = std::mem::take(&mut self.entries);
            for (key, value) in old {
                if key == name {
                    self.entries.insert(internal.clone(), value);
                } else {
                    self.entries.insert(key, value);
                }
            }
            members.push(internal);
        }
        self.cogroups.insert(name, members);
    }

    /// Append another group named `name`, turning an existing group of the
    /// same name into a cogroup.
    pub fn add_cogroup(&mut self, name: &str, group: Namelist) {
        let name = name.to_lowercase();
        self.create_cogroup(&name);

        let prefix = cogroup_key(&name, 0);
        let prefix = &prefix[..prefix.len() - 1];
        let next_id = self
            .cogroups
            .get(&name)
            .and_then(|members| {
                members
                    .iter()
                    .filter_map(|m| m.strip_prefix(prefix)?.parse::<usize>().ok())
                    .max()
            })
            .map_or(0, |id| id + 1);

        let internal = cogroup_key(&name, next_id);
        log::debug!("adding cogroup member {}", internal);
        self.entries
            .insert(internal.clone(), FortranValue::Derived(group));
        if let Some(members) = self.cogroups.get_mut(&name) {
            members.push(internal);
        }
    }

    /// Read-only view of the groups sharing `name`, in file order.
    pub fn cogroup(&self, name: &str) -> Option<Cogroup<'_>> {
        let name = name.to_lowercase();
        let keys = self.cogroups.get(&name)?.clone();
        Some(Cogroup { nml: self, keys })
    }

    /// Mutable view of the groups sharing `name`.
    pub fn cogroup_mut(&mut self, name: &str) -> Option<CogroupMut<'_>> {
        let name = name.to_lowercase();
        if !self.cogroups.contains_key(&name) {
            return None;
        }
        Some(CogroupMut { nml: self, name })
    }

    /// Internal keys of a cogroup's members.
    pub(crate) fn cogroup_keys(&self, name: &str) -> Option<&[String]> {
        self.cogroups.get(&name.to_lowercase()).map(Vec::as_slice)
    }
}

/// Ordered read-only view of a cogroup.
pub struct Cogroup<'a> {
    nml: &'a Namelist,
    keys: Vec<String>,
}

impl<'a> Cogroup<'a> {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&'a Namelist> {
        let key = self.keys.get(index)?;
        self.nml.entries.get(key).and_then(FortranValue::as_namelist)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Namelist> + '_ {
        (0..self.keys.len()).filter_map(move |i| self.get(i))
    }

    /// Internal keys of the members, in order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

/// Write-through view of a cogroup.
pub struct CogroupMut<'a> {
    nml: &'a mut Namelist,
    name: String,
}

impl CogroupMut<'_> {
    fn key(&self, index: usize) -> Option<String> {
        self.nml.cogroups.get(&self.name)?.get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.nml.cogroups.get(&self.name).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Namelist> {
        let key = self.key(index)?;
        self.nml
            .entries
            .get_mut(&key)
            .and_then(FortranValue::as_namelist_mut)
    }

    /// Replace the member at `index`. Returns false if there is no such member.
    pub fn set(&mut self, index: usize, group: Namelist) -> bool {
        match self.key(index).and_then(|key| self.nml.entries.get_mut(&key)) {
            Some(slot) => {
                *slot = FortranValue::Derived(group);
                true
            }
            None => false,
        }
    }

    /// Remove the member at `index`. The cogroup record is dropped with its
    /// last member.
    pub fn remove(&mut self, index: usize) -> Option<Namelist> {
        let key = self.key(index)?;
        let removed = self.nml.entries.remove(&key);

        if let Some(members) = self.nml.cogroups.get_mut(&self.name) {
            members.remove(index);
            if members.is_empty() {
                self.nml.cogroups.remove(&self.name);
            }
        }

        match removed {
            Some(FortranValue::Derived(nml)) => Some(nml),
            _ => None,
        }
    }

    /// Update every member with the variables of `values`.
    pub fn update(&mut self, values: &Namelist) {
        for i in 0..self.len() {
            if let Some(group) = self.get_mut(i) {
                for (key, value) in values.raw_entries() {
                    group.set(key, value.clone());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(var: &str, value: i64) -> Namelist {
        let mut nml = Namelist::new();
        nml.set(var, value);
        nml
    }

    #[test]
    fn test_create_cogroup_keeps_position() {
        let mut nml = Namelist::new();
        nml.set("a", group("x", 1))
            .set("b", group("y", 2))
            .set("c", group("z", 3));
        nml.create_cogroup("B");

        let keys: Vec<&String> = nml.entries.keys().collect();
        assert_eq!(keys, vec!["a", "_grp_b_0", "c"]);
        assert!(nml.contains("b"));
        assert!(nml.is_cogroup("b"));
        assert_eq!(nml.cogroup("b").map(|c| c.len()), Some(1));
    }

    #[test]
    fn test_add_cogroup() {
        let mut nml = Namelist::new();
        nml.set("grp", group("x", 1));
        nml.set("other", group("y", 0));
        nml.add_cogroup("grp", group("x", 2));

        let keys: Vec<&str> = nml.keys().collect();
        assert_eq!(keys, vec!["grp", "other", "grp"]);

        let cogroup = nml.cogroup("GRP").unwrap();
        let values: Vec<i64> = cogroup
            .iter()
            .filter_map(|g| g.get("x").and_then(FortranValue::as_i64))
            .collect();
        assert_eq!(values, vec![1, 2]);
        assert_eq!(cogroup.keys(), &["_grp_grp_0", "_grp_grp_1"]);
        assert!(nml.get("grp").is_none());
    }

    #[test]
    fn test_add_to_empty_cogroup() {
        let mut nml = Namelist::new();
        nml.create_cogroup("g");
        nml.add_cogroup("g", group("x", 1));
        assert_eq!(nml.cogroup_keys("g"), Some(&["_grp_g_0".to_string()][..]));
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut nml = Namelist::new();
        nml.add_cogroup("g", group("x", 1));
        nml.add_cogroup("g", group("x", 2));
        nml.add_cogroup("g", group("x", 3));
        nml.cogroup_mut("g").unwrap().remove(0);
        nml.add_cogroup("g", group("x", 4));
        assert_eq!(
            nml.cogroup_keys("g").unwrap(),
            &["_grp_g_1", "_grp_g_2", "_grp_g_3"]
        );
    }

    #[test]
    fn test_write_through() {
        let mut nml = Namelist::new();
        nml.add_cogroup("g", group("x", 1));
        nml.add_cogroup("g", group("x", 2));

        {
            let mut view = nml.cogroup_mut("g").unwrap();
            view.get_mut(1).unwrap().set("x", 20);
            assert!(view.set(0, group("x", 10)));
            assert!(!view.set(5, group("x", 0)));
            view.update(&group("y", 7));
        }

        let view = nml.cogroup("g").unwrap();
        assert_eq!(view.get(0).and_then(|g| g.get("x")), Some(&FortranValue::Integer(10)));
        assert_eq!(view.get(1).and_then(|g| g.get("x")), Some(&FortranValue::Integer(20)));
        assert!(view.iter().all(|g| g.get("y") == Some(&FortranValue::Integer(7))));
    }

    #[test]
    fn test_remove_last_member_drops_record() {
        let mut nml = Namelist::new();
        nml.add_cogroup("g", group("x", 1));
        let removed = nml.cogroup_mut("g").unwrap().remove(0);
        assert_eq!(removed, Some(group("x", 1)));
        assert!(!nml.contains("g"));
        assert!(nml.is_empty());
    }

    #[test]
    fn test_remove_cogroup_by_name() {
        let mut nml = Namelist::new();
        nml.add_cogroup("g", group("x", 1));
        nml.add_cogroup("g", group("x", 2));
        let removed = nml.remove("g");
        assert_eq!(
            removed,
            Some(FortranValue::DerivedArray(vec![
                Some(group("x", 1)),
                Some(group("x", 2))
            ]))
        );
        assert!(nml.is_empty());
    }
}
