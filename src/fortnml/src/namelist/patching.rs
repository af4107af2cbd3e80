// fortnml/src/namelist/patching.rs

//! Merging of repeated assignments and namelist-level patching.

use super::core::{basename, Namelist};
use crate::fortran_types::FortranValue;

/// Merge a newly parsed value into a prior value of the same variable.
///
/// Two derived types merge field by field. Anything else is merged as a
/// list, element by element, where a non-null new element wins.
pub fn merge_values(src: FortranValue, new: FortranValue) -> FortranValue {
    match (src, new) {
        (FortranValue::Derived(mut src), FortranValue::Derived(new)) => {
            merge_namelists(&mut src, new);
            FortranValue::Derived(src)
        }
        (src, new) => FortranValue::from_elements(merge_lists(
            src.into_elements(),
            new.into_elements(),
        )),
    }
}

/// Merge two element lists, padding the shorter one with nulls.
pub fn merge_lists(mut src: Vec<FortranValue>, mut new: Vec<FortranValue>) -> Vec<FortranValue> {
    let len = src.len().max(new.len());
    src.resize(len, FortranValue::Null);
    new.resize(len, FortranValue::Null);

    src.into_iter()
        .zip(new)
        .map(|pair| match pair {
            (FortranValue::Derived(mut s), FortranValue::Derived(n)) => {
                merge_namelists(&mut s, n);
                FortranValue::Derived(s)
            }
            (s @ FortranValue::Array(_), n @ FortranValue::Array(_)) => {
                FortranValue::from_elements(merge_lists(s.into_elements(), n.into_elements()))
            }
            (s, FortranValue::Null) => s,
            (_, n) => n,
        })
        .collect()
}

/// Merge the contents of `patch` into `src`, recursing into shared keys.
pub fn merge_namelists(src: &mut Namelist, patch: Namelist) {
    for (key, start) in patch.start_index {
        src.set_start_index(&key, start);
    }

    for (key, value) in patch.entries {
        match src.entries.get_mut(&key) {
            Some(slot) => {
                let prior = std::mem::replace(slot, FortranValue::Null);
                *slot = merge_values(prior, value);
            }
            None => {
                src.entries.insert(key, value);
            }
        }
    }
}

impl Namelist {
    /// Update the variables of each group from `other`, creating any groups
    /// that do not yet exist.
    ///
    /// A group in `other` applies to every member of a cogroup with the same
    /// name. When `other` itself holds a cogroup, its members are matched to
    /// this namelist's members by position.
    pub fn patch(&mut self, other: &Namelist) {
        let mut seen: Vec<(String, usize)> = Vec::new();

        for (raw_key, value) in other.raw_entries() {
            let Some(patch_grp) = value.as_namelist() else {
                continue;
            };
            let name = basename(raw_key).to_string();

            if !other.is_cogroup(&name) {
                match self.cogroup_mut(&name) {
                    Some(mut members) => members.update(patch_grp),
                    None => self.patch_group(&name, patch_grp),
                }
                continue;
            }

            let position = match seen.iter_mut().find(|(n, _)| *n == name) {
                Some((_, count)) => {
                    *count += 1;
                    *count
                }
                None => {
                    seen.push((name.clone(), 0));
                    0
                }
            };

            let target = self
                .cogroup_keys(&name)
                .and_then(|keys| keys.get(position))
                .cloned();
            match target {
                Some(key) => {
                    if let Some(grp) = self.entries.get_mut(&key).and_then(FortranValue::as_namelist_mut) {
                        update_group(grp, patch_grp);
                    }
                }
                None if position == 0 && !self.is_cogroup(&name) => {
                    self.patch_group(&name, patch_grp)
                }
                None => self.add_cogroup(&name, patch_grp.clone()),
            }
        }
    }

    fn patch_group(&mut self, name: &str, patch_grp: &Namelist) {
        if self.group(name).is_none() {
            self.set(name, Namelist::new());
        }
        if let Some(grp) = self.group_mut(name) {
            update_group(grp, patch_grp);
        }
    }
}

fn update_group(grp: &mut Namelist, patch_grp: &Namelist) {
    for (key, value) in patch_grp.raw_entries() {
        grp.set(key, value.clone());
        match patch_grp.start_index(key) {
            Some(start) => grp.set_start_index(key, start.to_vec()),
            None => {
                grp.remove_start_index(key);
            }
        }
    }
}
