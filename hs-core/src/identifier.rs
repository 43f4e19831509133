//! Hierarchical identifiers for hardware and sensors
//!
//! An identifier is a `/`-separated path such as `/amdcpu/0/temperature/0`.
//! It is the key used for settings lookups, so it must render identically
//! across runs for the same device and sensor.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::{HypersenseError, Result};

/// Path separator between identifier segments
pub const SEPARATOR: char = '/';

/// Stable hierarchical path naming a device, sensor or parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier {
    path: String,
}

impl Identifier {
    /// Build an identifier from its segments.
    ///
    /// Fails with `InvalidIdentifier` if any segment contains the separator.
    pub fn new<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut path = String::new();
        append_segments(&mut path, segments)?;
        Ok(Self { path })
    }

    /// Build a child identifier by appending segments to this one
    pub fn join<I, S>(&self, segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut path = self.path.clone();
        append_segments(&mut path, segments)?;
        Ok(Self { path })
    }

    /// Canonical rendered form
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Segments of the path, without separators
    pub fn segments(&self) -> impl Iterator<Item = &str> + '_ {
        self.path.split(SEPARATOR).skip(1)
    }
}

fn append_segments<I, S>(path: &mut String, segments: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for segment in segments {
        let segment = segment.as_ref();
        if segment.contains(SEPARATOR) {
            return Err(HypersenseError::invalid_identifier(segment));
        }
        path.push(SEPARATOR);
        path.push_str(segment);
    }
    Ok(())
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.path
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_renders_with_leading_slash() {
        let id = Identifier::new(["amdcpu", "0"]).unwrap();
        assert_eq!(id.to_string(), "/amdcpu/0");
        assert_eq!(id.as_str(), "/amdcpu/0");
    }

    #[test]
    fn test_join_extends_parent() {
        let hw = Identifier::new(["amdcpu", "0"]).unwrap();
        let sensor = hw.join(["temperature", "0"]).unwrap();
        assert_eq!(sensor.to_string(), "/amdcpu/0/temperature/0");
        assert_eq!(sensor.join(["name"]).unwrap().to_string(), "/amdcpu/0/temperature/0/name");
    }

    #[test]
    fn test_rejects_separator_in_segment() {
        let err = Identifier::new(["amdcpu", "0/1"]).unwrap_err();
        assert!(matches!(err, HypersenseError::InvalidIdentifier { ref segment } if segment == "0/1"));

        let hw = Identifier::new(["amdcpu"]).unwrap();
        assert!(hw.join(["load/2"]).is_err());
    }

    #[test]
    fn test_equality_follows_rendered_path() {
        let a = Identifier::new(["amdcpu", "0", "load", "1"]).unwrap();
        let b = Identifier::new(["amdcpu", "0"]).unwrap().join(["load", "1"]).unwrap();
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_segments_roundtrip() {
        let id = Identifier::new(["amdcpu", "0", "load", "1"]).unwrap();
        let segments: Vec<&str> = id.segments().collect();
        assert_eq!(segments, vec!["amdcpu", "0", "load", "1"]);
    }

    #[test]
    fn test_serializes_as_string() {
        let id = Identifier::new(["amdcpu", "0"]).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"/amdcpu/0\"");
    }
}
