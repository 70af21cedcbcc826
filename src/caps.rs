//! Capability descriptors.
//!
//! A [`Caps`] value describes what a pad can produce or accept: an optional
//! media type plus a set of named field constraints. The core never looks
//! inside the media type; it only intersects constraints, tests whether
//! every constraint is fixed, and compares descriptors for equality.
//!
//! ```rust
//! use mediagraph::caps::Caps;
//!
//! let src = Caps::new("video/x-raw").with_int_range("width", 320, 1920);
//! let sink = Caps::new("video/x-raw").with_int("width", 640);
//!
//! let common = src.intersect(&sink).unwrap();
//! assert!(common.is_fixed());
//! assert_eq!(common.get_int("width"), Some(640));
//! ```

use std::collections::BTreeMap;
use std::fmt;

/// A single value inside a caps field.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldValue {
    /// Integer value (width, height, channels, rate).
    Int(i64),
    /// String value (format names, layouts).
    Str(String),
    /// Boolean flag.
    Bool(bool),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{v}"),
            FieldValue::Str(v) => write!(f, "{v}"),
            FieldValue::Bool(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(i64::from(v))
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Str(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Str(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

/// A constraint on a caps field.
///
/// `Fixed` is fully resolved; every other variant is still open and has to
/// be fixated before the field counts as negotiated.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum CapsValue<T> {
    /// Exact value (fully constrained).
    Fixed(T),
    /// Range of acceptable values (inclusive).
    Range {
        /// Minimum acceptable value.
        min: T,
        /// Maximum acceptable value.
        max: T,
    },
    /// List of acceptable values (ordered by preference, first is best).
    List(Vec<T>),
    /// Any value accepted (unresolved).
    #[default]
    Any,
}

impl<T: Clone + Ord> CapsValue<T> {
    /// Check if a value is accepted by this constraint.
    pub fn accepts(&self, value: &T) -> bool {
        match self {
            Self::Fixed(v) => v == value,
            Self::Range { min, max } => value >= min && value <= max,
            Self::List(values) => values.contains(value),
            Self::Any => true,
        }
    }

    /// Whether this constraint is resolved to a single value.
    pub fn is_fixed(&self) -> bool {
        matches!(self, Self::Fixed(_))
    }

    /// Intersect two constraints, finding common values.
    ///
    /// Returns `None` if there's no overlap.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        match (self, other) {
            (Self::Any, other) => Some(other.clone()),
            (self_, Self::Any) => Some(self_.clone()),

            (Self::Fixed(a), Self::Fixed(b)) => (a == b).then(|| Self::Fixed(a.clone())),

            (Self::Fixed(v), Self::Range { min, max })
            | (Self::Range { min, max }, Self::Fixed(v)) => {
                (v >= min && v <= max).then(|| Self::Fixed(v.clone()))
            }

            (Self::Fixed(v), Self::List(list)) | (Self::List(list), Self::Fixed(v)) => {
                list.contains(v).then(|| Self::Fixed(v.clone()))
            }

            (
                Self::Range {
                    min: min1,
                    max: max1,
                },
                Self::Range {
                    min: min2,
                    max: max2,
                },
            ) => {
                let new_min = min1.max(min2);
                let new_max = max1.min(max2);
                if new_min > new_max {
                    None
                } else if new_min == new_max {
                    Some(Self::Fixed(new_min.clone()))
                } else {
                    Some(Self::Range {
                        min: new_min.clone(),
                        max: new_max.clone(),
                    })
                }
            }

            (Self::Range { min, max }, Self::List(list))
            | (Self::List(list), Self::Range { min, max }) => Self::from_candidates(
                list.iter()
                    .filter(|v| *v >= min && *v <= max)
                    .cloned()
                    .collect(),
            ),

            // Preference order comes from the first list.
            (Self::List(list1), Self::List(list2)) => Self::from_candidates(
                list1
                    .iter()
                    .filter(|v| list2.contains(v))
                    .cloned()
                    .collect(),
            ),
        }
    }

    /// Fixate: choose a single value from the constraint.
    ///
    /// Returns the preferred value (first in list, min in range).
    /// Returns `None` for `Any` (cannot fixate without default).
    pub fn fixate(&self) -> Option<T> {
        match self {
            Self::Fixed(v) => Some(v.clone()),
            Self::Range { min, .. } => Some(min.clone()),
            Self::List(values) => values.first().cloned(),
            Self::Any => None,
        }
    }

    fn from_candidates(mut values: Vec<T>) -> Option<Self> {
        match values.len() {
            0 => None,
            1 => values.pop().map(Self::Fixed),
            _ => Some(Self::List(values)),
        }
    }
}

impl<T: fmt::Display> fmt::Display for CapsValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(v) => write!(f, "{v}"),
            Self::Range { min, max } => write!(f, "[ {min}, {max} ]"),
            Self::List(values) => {
                write!(f, "{{ ")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, " }}")
            }
            Self::Any => write!(f, "ANY"),
        }
    }
}

/// A capability descriptor: media type plus named field constraints.
///
/// Caps without a media type and without fields accept anything.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Caps {
    media_type: Option<String>,
    fields: BTreeMap<String, CapsValue<FieldValue>>,
}

impl Caps {
    /// Caps that accept any format.
    pub fn any() -> Self {
        Self::default()
    }

    /// Caps for a media type with no field constraints yet.
    pub fn new(media_type: impl Into<String>) -> Self {
        Self {
            media_type: Some(media_type.into()),
            fields: BTreeMap::new(),
        }
    }

    /// Set a field to an arbitrary constraint.
    pub fn with_field(mut self, name: impl Into<String>, value: CapsValue<FieldValue>) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Set a field to a fixed integer.
    pub fn with_int(self, name: impl Into<String>, value: i64) -> Self {
        self.with_field(name, CapsValue::Fixed(FieldValue::Int(value)))
    }

    /// Set a field to an inclusive integer range.
    pub fn with_int_range(self, name: impl Into<String>, min: i64, max: i64) -> Self {
        self.with_field(
            name,
            CapsValue::Range {
                min: FieldValue::Int(min),
                max: FieldValue::Int(max),
            },
        )
    }

    /// Set a field to a fixed string.
    pub fn with_str(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_field(name, CapsValue::Fixed(FieldValue::Str(value.into())))
    }

    /// Set a field to a list of acceptable values.
    pub fn with_list<V: Into<FieldValue>>(
        self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.with_field(name, CapsValue::List(values))
    }

    /// Declare a field whose value is not resolved yet.
    pub fn with_unresolved(self, name: impl Into<String>) -> Self {
        self.with_field(name, CapsValue::Any)
    }

    /// The media type, if constrained.
    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    /// Get a field constraint.
    pub fn get(&self, name: &str) -> Option<&CapsValue<FieldValue>> {
        self.fields.get(name)
    }

    /// Get a fixed integer field.
    pub fn get_int(&self, name: &str) -> Option<i64> {
        match self.fields.get(name) {
            Some(CapsValue::Fixed(FieldValue::Int(v))) => Some(*v),
            _ => None,
        }
    }

    /// Get a fixed string field.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.fields.get(name) {
            Some(CapsValue::Fixed(FieldValue::Str(v))) => Some(v),
            _ => None,
        }
    }

    /// Iterate over the field constraints in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &CapsValue<FieldValue>)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether these caps accept anything.
    pub fn is_any(&self) -> bool {
        self.media_type.is_none() && self.fields.is_empty()
    }

    /// Whether the media type is known and every field is fixed.
    pub fn is_fixed(&self) -> bool {
        self.media_type.is_some() && self.fields.values().all(CapsValue::is_fixed)
    }

    /// Intersect with another descriptor.
    ///
    /// Fields present on only one side are carried over unchanged. Returns
    /// `None` when the media types differ or any shared field has no overlap.
    pub fn intersect(&self, other: &Caps) -> Option<Caps> {
        let media_type = match (&self.media_type, &other.media_type) {
            (Some(a), Some(b)) if a != b => return None,
            (Some(a), _) | (None, Some(a)) => Some(a.clone()),
            (None, None) => None,
        };

        let mut fields = self.fields.clone();
        for (name, theirs) in &other.fields {
            let merged = match fields.get(name) {
                Some(ours) => ours.intersect(theirs)?,
                None => theirs.clone(),
            };
            fields.insert(name.clone(), merged);
        }

        Some(Caps { media_type, fields })
    }

    /// Whether the two descriptors have a common format.
    pub fn can_intersect(&self, other: &Caps) -> bool {
        self.intersect(other).is_some()
    }

    /// Resolve every open field to its preferred value.
    ///
    /// Fields that are `Any` stay unresolved, so the result is only fixed
    /// when every field had a concrete candidate.
    pub fn fixate(&self) -> Caps {
        let fields = self
            .fields
            .iter()
            .map(|(name, value)| {
                let fixed = value.fixate().map_or(CapsValue::Any, CapsValue::Fixed);
                (name.clone(), fixed)
            })
            .collect();
        Caps {
            media_type: self.media_type.clone(),
            fields,
        }
    }

    /// The `(width, height)` of fixed video caps.
    ///
    /// Returns `None` when the caps are not fixed or either dimension is
    /// missing.
    pub fn video_size(&self) -> Option<(i64, i64)> {
        if !self.is_fixed() {
            return None;
        }
        Some((self.get_int("width")?, self.get_int("height")?))
    }
}

impl fmt::Display for Caps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_any() {
            return write!(f, "ANY");
        }
        write!(f, "{}", self.media_type.as_deref().unwrap_or("*"))?;
        for (name, value) in &self.fields {
            write!(f, ", {name}={value}")?;
        }
        Ok(())
    }
}

/// Intersect two optional descriptors, where `None` means unconstrained.
pub(crate) fn intersect_optional(a: Option<&Caps>, b: Option<&Caps>) -> Option<Option<Caps>> {
    match (a, b) {
        (None, None) => Some(None),
        (Some(c), None) | (None, Some(c)) => Some(Some(c.clone())),
        (Some(a), Some(b)) => a.intersect(b).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_intersect() {
        let fixed = CapsValue::Fixed(1920);
        let range = CapsValue::Range { min: 640, max: 3840 };
        let list = CapsValue::List(vec![1280, 1920]);

        assert_eq!(fixed.intersect(&range), Some(CapsValue::Fixed(1920)));
        assert_eq!(fixed.intersect(&list), Some(CapsValue::Fixed(1920)));
        assert_eq!(CapsValue::Fixed(1).intersect(&CapsValue::Fixed(2)), None);
        assert_eq!(range.intersect(&CapsValue::Any), Some(range.clone()));
        assert_eq!(
            CapsValue::Range { min: 0, max: 10 }.intersect(&CapsValue::Range { min: 10, max: 20 }),
            Some(CapsValue::Fixed(10))
        );
        assert_eq!(
            CapsValue::List(vec![1, 2, 3]).intersect(&CapsValue::List(vec![3, 2])),
            Some(CapsValue::List(vec![2, 3]))
        );
    }

    #[test]
    fn test_value_fixate() {
        assert_eq!(CapsValue::Range { min: 5, max: 9 }.fixate(), Some(5));
        assert_eq!(CapsValue::List(vec![7, 3]).fixate(), Some(7));
        assert_eq!(CapsValue::<i32>::Any.fixate(), None);
    }

    #[test]
    fn test_mismatched_width() {
        let a = Caps::new("video/x-raw").with_int("width", 640);
        let b = Caps::new("video/x-raw").with_int("width", 1280);
        assert!(a.intersect(&b).is_none());
        assert!(!a.can_intersect(&b));
    }

    #[test]
    fn test_media_type_mismatch() {
        let a = Caps::new("audio/x-raw");
        let b = Caps::new("video/x-raw");
        assert!(a.intersect(&b).is_none());
        assert_eq!(Caps::any().intersect(&a), Some(a));
    }

    #[test]
    fn test_fields_carry_over() {
        let a = Caps::new("video/x-raw").with_int("width", 640);
        let b = Caps::any().with_int("height", 480);
        let both = a.intersect(&b).unwrap();
        assert_eq!(both.video_size(), Some((640, 480)));
    }

    #[test]
    fn test_fixed_and_unresolved() {
        let open = Caps::new("video/x-raw")
            .with_int("width", 640)
            .with_unresolved("height");
        assert!(!open.is_fixed());
        assert_eq!(open.video_size(), None);
        assert!(!open.fixate().is_fixed());

        let ranged = Caps::new("video/x-raw")
            .with_int_range("width", 320, 640)
            .with_list("height", [480i64, 240]);
        let fixed = ranged.fixate();
        assert!(fixed.is_fixed());
        assert_eq!(fixed.video_size(), Some((320, 480)));
    }

    #[test]
    fn test_display() {
        let caps = Caps::new("video/x-raw")
            .with_int("width", 640)
            .with_int_range("height", 1, 10)
            .with_unresolved("format");
        assert_eq!(
            caps.to_string(),
            "video/x-raw, format=ANY, height=[ 1, 10 ], width=640"
        );
        assert_eq!(Caps::any().to_string(), "ANY");
    }
}
