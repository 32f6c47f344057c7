//! Paths into a form data tree.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One step of a [`DataPath`]: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(i) => write!(f, "{i}"),
            PathSegment::Key(k) => f.write_str(k),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(value: &str) -> Self {
        PathSegment::Key(value.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(value: String) -> Self {
        PathSegment::Key(value)
    }
}

impl From<usize> for PathSegment {
    fn from(value: usize) -> Self {
        PathSegment::Index(value)
    }
}

/// Ordered sequence of keys and indices from the root of the data tree.
///
/// Serialises as a JSON array (`["list", 0, "name"]`) and displays dotted
/// (`list.0.name`).
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataPath(Vec<PathSegment>);

impl DataPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    /// Returns a new path with `segment` appended.
    pub fn join(&self, segment: impl Into<PathSegment>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        DataPath(segments)
    }

    pub fn push(&mut self, segment: impl Into<PathSegment>) {
        self.0.push(segment.into());
    }

    pub fn parent(&self) -> Option<DataPath> {
        if self.0.is_empty() {
            None
        } else {
            Some(DataPath(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    pub fn starts_with(&self, prefix: &DataPath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Parses an RFC 6901 pointer (`/list/0/name`) into `root`, using the
    /// data to tell indices from keys: a numeric token is an index only
    /// where `root` holds an array.
    ///
    /// Past the end of the data, numeric tokens become indices.
    pub fn from_pointer_in(pointer: &str, root: &Value) -> Self {
        let mut node = Some(root);
        let segments = pointer_tokens(pointer)
            .map(|token| {
                let segment = match (node, numeric(&token)) {
                    (Some(Value::Object(_)), _) | (_, None) => PathSegment::Key(token),
                    (_, Some(i)) => PathSegment::Index(i),
                };
                node = node.and_then(|n| match &segment {
                    PathSegment::Key(k) => n.get(k),
                    PathSegment::Index(i) => n.get(*i),
                });
                segment
            })
            .collect();
        DataPath(segments)
    }

    /// Looks the path up in `root`.
    pub fn get<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        let mut current = root;
        for segment in &self.0 {
            current = match (segment, current) {
                (PathSegment::Key(k), Value::Object(map)) => map.get(k)?,
                (PathSegment::Index(i), Value::Array(items)) => items.get(*i)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// The first index on this path lying past the end of its array in
    /// `root`, with that array's length. A missing array counts as empty.
    ///
    /// Writing at `len` appends; anything beyond would leave holes.
    pub fn out_of_range(&self, root: &Value) -> Option<(usize, usize)> {
        let mut node = Some(root);
        for segment in &self.0 {
            if let PathSegment::Index(index) = segment {
                let len = node.and_then(Value::as_array).map_or(0, Vec::len);
                if *index > len {
                    return Some((*index, len));
                }
            }
            node = node.and_then(|n| match segment {
                PathSegment::Key(k) => n.get(k),
                PathSegment::Index(i) => n.get(*i),
            });
        }
        None
    }

    /// Returns a copy of `root` with `value` stored at this path.
    ///
    /// Missing containers are created on the way down; an index past the
    /// end of an array pads it with `null`. `root` itself is left untouched.
    pub fn set(&self, root: &Value, value: Value) -> Value {
        set_in(root, &self.0, value)
    }

    /// Returns a copy of `root` without the object member this path names.
    ///
    /// Paths ending in an index, or naming nothing, leave `root` as is.
    pub fn remove(&self, root: &Value) -> Value {
        let (Some(parent), Some(PathSegment::Key(key))) = (self.parent(), self.last()) else {
            return root.clone();
        };
        match parent.get(root) {
            Some(Value::Object(map)) if map.contains_key(key) => {
                let mut map = map.clone();
                map.shift_remove(key);
                parent.set(root, Value::Object(map))
            }
            _ => root.clone(),
        }
    }
}

fn pointer_tokens(pointer: &str) -> impl Iterator<Item = String> + '_ {
    pointer
        .split('/')
        .skip(1)
        .map(|token| token.replace("~1", "/").replace("~0", "~"))
}

fn numeric(token: &str) -> Option<usize> {
    token
        .parse::<usize>()
        .ok()
        .filter(|_| !token.starts_with('+'))
}

fn set_in(node: &Value, segments: &[PathSegment], value: Value) -> Value {
    let Some((head, rest)) = segments.split_first() else {
        return value;
    };
    match head {
        PathSegment::Key(key) => {
            let mut map = match node {
                Value::Object(map) => map.clone(),
                _ => Map::new(),
            };
            let child = map.get(key).cloned().unwrap_or(Value::Null);
            map.insert(key.clone(), set_in(&child, rest, value));
            Value::Object(map)
        }
        PathSegment::Index(index) => {
            let mut items = match node {
                Value::Array(items) => items.clone(),
                _ => Vec::new(),
            };
            if items.len() <= *index {
                items.resize(*index + 1, Value::Null);
            }
            let child = std::mem::take(&mut items[*index]);
            items[*index] = set_in(&child, rest, value);
            Value::Array(items)
        }
    }
}

impl fmt::Display for DataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl<S: Into<PathSegment>> FromIterator<S> for DataPath {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        DataPath(iter.into_iter().map(Into::into).collect())
    }
}

impl From<Vec<PathSegment>> for DataPath {
    fn from(value: Vec<PathSegment>) -> Self {
        DataPath(value)
    }
}

/// Builds a [`DataPath`] from keys and indices: `path!["list", 0, "name"]`.
#[macro_export]
macro_rules! path {
    () => { $crate::path::DataPath::root() };
    ($($seg:expr),+ $(,)?) => {
        $crate::path::DataPath::from(vec![$($crate::path::PathSegment::from($seg)),+])
    };
}
