//! Id lookups over a decoded profile
//!
//! pprof messages reference each other by id and strings by table index.
//! [`ProfileTables`] checks every reference once so later code can look
//! things up without re-validating.

use std::collections::HashMap;

use super::proto::{Function, Location, Profile};
use crate::domain::ProfileError;

/// Validated id → message maps for one profile
#[derive(Debug)]
pub struct ProfileTables<'p> {
    strings: &'p [String],
    functions: HashMap<u64, &'p Function>,
    locations: HashMap<u64, &'p Location>,
}

impl<'p> ProfileTables<'p> {
    /// Index and validate `profile`
    ///
    /// # Errors
    /// Returns [`ProfileError::Invalid`] on a dangling id, a duplicate id, a
    /// string index outside the string table, or a sample whose value count
    /// does not match `sample_type`.
    pub fn new(profile: &'p Profile) -> Result<Self, ProfileError> {
        let invalid = ProfileError::Invalid;
        let strings = profile.string_table.as_slice();
        if strings.first().map(String::as_str) != Some("") {
            return Err(invalid("string table must start with an empty string".to_string()));
        }
        let check_str = |index: i64, what: &str| -> Result<(), ProfileError> {
            match usize::try_from(index) {
                Ok(i) if i < strings.len() => Ok(()),
                _ => Err(invalid(format!("{what} string index {index} out of range"))),
            }
        };

        if profile.sample_type.is_empty() {
            return Err(invalid("profile has no sample types".to_string()));
        }
        for value_type in profile.sample_type.iter().chain(&profile.period_type) {
            check_str(value_type.r#type, "value type")?;
            check_str(value_type.unit, "value unit")?;
        }
        for &index in [profile.drop_frames, profile.keep_frames, profile.default_sample_type, profile.doc_url]
            .iter()
            .chain(&profile.comment)
        {
            check_str(index, "profile")?;
        }
        for mapping in &profile.mapping {
            check_str(mapping.filename, "mapping filename")?;
            check_str(mapping.build_id, "mapping build id")?;
        }

        let mut functions = HashMap::with_capacity(profile.function.len());
        for function in &profile.function {
            check_str(function.name, "function name")?;
            check_str(function.system_name, "function system name")?;
            check_str(function.filename, "function filename")?;
            if function.id == 0 || functions.insert(function.id, function).is_some() {
                return Err(invalid(format!("bad or duplicate function id {}", function.id)));
            }
        }

        let mut locations = HashMap::with_capacity(profile.location.len());
        for location in &profile.location {
            for line in &location.line {
                if line.function_id != 0 && !functions.contains_key(&line.function_id) {
                    return Err(invalid(format!(
                        "location {} references unknown function {}",
                        location.id, line.function_id
                    )));
                }
            }
            if location.id == 0 || locations.insert(location.id, location).is_some() {
                return Err(invalid(format!("bad or duplicate location id {}", location.id)));
            }
        }

        for (n, sample) in profile.sample.iter().enumerate() {
            if sample.value.len() != profile.sample_type.len() {
                return Err(invalid(format!(
                    "sample {n} has {} values, expected {}",
                    sample.value.len(),
                    profile.sample_type.len()
                )));
            }
            if let Some(id) = sample.location_id.iter().find(|id| !locations.contains_key(*id)) {
                return Err(invalid(format!("sample {n} references unknown location {id}")));
            }
            for label in &sample.label {
                check_str(label.key, "label key")?;
                check_str(label.str, "label value")?;
                check_str(label.num_unit, "label unit")?;
            }
        }

        Ok(Self { strings, functions, locations })
    }

    /// String at `index`, or "" when out of range
    #[must_use]
    pub fn string(&self, index: i64) -> &'p str {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.strings.get(i))
            .map_or("", String::as_str)
    }

    #[must_use]
    pub fn location(&self, id: u64) -> Option<&'p Location> {
        self.locations.get(&id).copied()
    }

    /// Name of the function a frame is charged to
    ///
    /// That is the function of the location's last line: the physical frame
    /// that inlined the others.
    #[must_use]
    pub fn frame_function(&self, location_id: u64) -> Option<&'p str> {
        let line = self.location(location_id)?.line.last()?;
        let function = self.functions.get(&line.function_id)?;
        Some(self.string(function.name))
    }

    /// Largest function id in use, 0 for none
    #[must_use]
    pub fn max_function_id(&self) -> u64 {
        self.functions.keys().copied().max().unwrap_or(0)
    }

    /// Largest location id in use, 0 for none
    #[must_use]
    pub fn max_location_id(&self) -> u64 {
        self.locations.keys().copied().max().unwrap_or(0)
    }
}

/// Index of `s` in the string table, appending it if absent
pub fn intern(strings: &mut Vec<String>, s: &str) -> i64 {
    let index = strings.iter().position(|existing| existing == s).unwrap_or_else(|| {
        strings.push(s.to_string());
        strings.len() - 1
    });
    i64::try_from(index).unwrap_or(i64::MAX)
}
