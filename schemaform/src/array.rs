//! Array items with stable identities.
//!
//! Every entry carries an [`ItemId`] minted by an [`IdAllocator`]. Ids are
//! never derived from value or position, so a renderer can key its widgets
//! on them across removals and reorders. Operations never mutate: each
//! returns a new [`ArrayEntries`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::CapabilityError,
    path::{DataPath, PathSegment},
    schema::{AdditionalItems, ItemsLayout, items_layout},
    ui::UiHints,
};

/// Opaque identity of one array entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(u64);

impl ItemId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

/// Mints [`ItemId`]s. One allocator serves a whole form, so ids are unique
/// form-wide and never handed out twice.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn mint(&mut self) -> ItemId {
        let id = ItemId(self.next);
        self.next += 1;
        id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrayEntry {
    pub id: ItemId,
    pub value: Value,
}

/// Per-entry capability flags handed to templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemCapabilities {
    pub has_move_up: bool,
    pub has_move_down: bool,
    pub has_remove: bool,
}

/// What the schema and UI hints allow for one array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayConstraints {
    pub min_items: usize,
    pub max_items: Option<usize>,
    /// Number of per-position schemas, for tuples.
    pub tuple_len: Option<usize>,
    /// Whether a tuple accepts items past its positions.
    pub additional_items: bool,
    pub orderable: bool,
    pub addable: bool,
    pub removable: bool,
}

impl Default for ArrayConstraints {
    fn default() -> Self {
        Self {
            min_items: 0,
            max_items: None,
            tuple_len: None,
            additional_items: true,
            orderable: true,
            addable: true,
            removable: true,
        }
    }
}

impl ArrayConstraints {
    /// Reads constraints from a resolved array schema and its hints.
    pub fn from_schema(schema: &Value, ui: &UiHints) -> Self {
        let count = |key: &str| schema.get(key).and_then(Value::as_u64).map(|n| n as usize);
        let (tuple_len, additional_items) = match items_layout(schema) {
            ItemsLayout::Tuple { items, additional } => (
                Some(items.len()),
                !matches!(additional, AdditionalItems::Forbidden),
            ),
            _ => (None, true),
        };
        Self {
            min_items: count("minItems").unwrap_or(0),
            max_items: count("maxItems"),
            tuple_len,
            additional_items,
            orderable: ui.orderable(),
            addable: ui.addable(),
            removable: ui.removable(),
        }
    }

    pub fn is_tuple(&self) -> bool {
        self.tuple_len.is_some()
    }

    /// Tuple positions stay put; items past them may move among themselves.
    fn movable(&self, index: usize) -> bool {
        self.orderable && self.tuple_len.is_none_or(|len| index >= len)
    }

    fn check_add(&self, len: usize) -> Result<(), CapabilityError> {
        if let Some(tuple_len) = self.tuple_len {
            if !self.additional_items && len >= tuple_len {
                return Err(CapabilityError::FixedLength { len: tuple_len });
            }
        }
        if !self.addable {
            return Err(CapabilityError::NotAddable);
        }
        if let Some(max) = self.max_items {
            if len >= max {
                return Err(CapabilityError::AboveMaximum { max });
            }
        }
        Ok(())
    }

    fn check_remove(&self, index: usize, len: usize) -> Result<(), CapabilityError> {
        if index >= len {
            return Err(CapabilityError::IndexOutOfRange { index, len });
        }
        if let Some(tuple_len) = self.tuple_len {
            if index < tuple_len {
                return Err(CapabilityError::FixedLength { len: tuple_len });
            }
        }
        if !self.removable {
            return Err(CapabilityError::NotRemovable);
        }
        if len <= self.min_items {
            return Err(CapabilityError::BelowMinimum {
                min: self.min_items,
            });
        }
        Ok(())
    }
}

/// The ordered entries of one array.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ArrayEntries(Vec<ArrayEntry>);

impl ArrayEntries {
    /// Wraps plain values, minting an id for each.
    pub fn from_values(values: &[Value], ids: &mut IdAllocator) -> Self {
        Self(
            values
                .iter()
                .map(|value| ArrayEntry {
                    id: ids.mint(),
                    value: value.clone(),
                })
                .collect(),
        )
    }

    /// Adopts new values, keeping ids by position.
    ///
    /// Entries past the old length get fresh ids; entries past the new
    /// length are dropped.
    pub fn reconcile(&self, values: &[Value], ids: &mut IdAllocator) -> Self {
        Self(
            values
                .iter()
                .enumerate()
                .map(|(i, value)| ArrayEntry {
                    id: self.0.get(i).map(|e| e.id).unwrap_or_else(|| ids.mint()),
                    value: value.clone(),
                })
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArrayEntry> {
        self.0.iter()
    }

    pub fn get(&self, index: usize) -> Option<&ArrayEntry> {
        self.0.get(index)
    }

    pub fn ids(&self) -> Vec<ItemId> {
        self.0.iter().map(|e| e.id).collect()
    }

    pub fn position(&self, id: ItemId) -> Option<usize> {
        self.0.iter().position(|e| e.id == id)
    }

    pub fn values(&self) -> Vec<Value> {
        self.0.iter().map(|e| e.value.clone()).collect()
    }

    pub fn to_value(&self) -> Value {
        Value::Array(self.values())
    }

    pub fn can_add(&self, constraints: &ArrayConstraints) -> bool {
        constraints.check_add(self.len()).is_ok()
    }

    pub fn capabilities(&self, constraints: &ArrayConstraints, index: usize) -> ItemCapabilities {
        let len = self.len();
        ItemCapabilities {
            has_move_up: index > 0
                && index < len
                && constraints.movable(index)
                && constraints.movable(index - 1),
            has_move_down: index + 1 < len
                && constraints.movable(index)
                && constraints.movable(index + 1),
            has_remove: constraints.check_remove(index, len).is_ok(),
        }
    }

    /// Inserts `value` after `after`, or at the end when `after` is `None`
    /// or past the end. Tuples only grow at the end.
    pub fn add(
        &self,
        constraints: &ArrayConstraints,
        after: Option<usize>,
        value: Value,
        ids: &mut IdAllocator,
    ) -> Result<Self, CapabilityError> {
        constraints.check_add(self.len())?;
        let at = self.insertion_index(constraints, after);
        let mut entries = self.0.clone();
        entries.insert(
            at,
            ArrayEntry {
                id: ids.mint(),
                value,
            },
        );
        Ok(Self(entries))
    }

    /// Where [`ArrayEntries::add`] puts a new entry.
    pub fn insertion_index(&self, constraints: &ArrayConstraints, after: Option<usize>) -> usize {
        let at = after.map_or(self.len(), |i| i.saturating_add(1)).min(self.len());
        match constraints.tuple_len {
            Some(tuple_len) => at.max(tuple_len.min(self.len())),
            None => at,
        }
    }

    pub fn remove(&self, constraints: &ArrayConstraints, index: usize) -> Result<Self, CapabilityError> {
        constraints.check_remove(index, self.len())?;
        let mut entries = self.0.clone();
        entries.remove(index);
        Ok(Self(entries))
    }

    /// Swaps `index` with its predecessor; a no-op for the first entry.
    pub fn move_up(&self, constraints: &ArrayConstraints, index: usize) -> Result<Self, CapabilityError> {
        self.check_index(index)?;
        if index == 0 {
            return Ok(self.clone());
        }
        self.swap(constraints, index - 1, index)
    }

    /// Swaps `index` with its successor; a no-op for the last entry.
    pub fn move_down(&self, constraints: &ArrayConstraints, index: usize) -> Result<Self, CapabilityError> {
        self.check_index(index)?;
        if index + 1 == self.len() {
            return Ok(self.clone());
        }
        self.swap(constraints, index, index + 1)
    }

    fn swap(&self, constraints: &ArrayConstraints, a: usize, b: usize) -> Result<Self, CapabilityError> {
        if !constraints.movable(a) || !constraints.movable(b) {
            return Err(CapabilityError::NotOrderable);
        }
        let mut entries = self.0.clone();
        entries.swap(a, b);
        Ok(Self(entries))
    }

    /// Replaces the value at `index`; its id is kept.
    pub fn replace(&self, index: usize, value: Value) -> Result<Self, CapabilityError> {
        self.check_index(index)?;
        let mut entries = self.0.clone();
        entries[index].value = value;
        Ok(Self(entries))
    }

    fn check_index(&self, index: usize) -> Result<(), CapabilityError> {
        if index >= self.len() {
            return Err(CapabilityError::IndexOutOfRange {
                index,
                len: self.len(),
            });
        }
        Ok(())
    }
}

/// Entries of every array in a form, keyed by data path.
#[derive(Debug, Default)]
pub struct ArrayStore {
    arrays: BTreeMap<DataPath, ArrayEntries>,
    ids: IdAllocator,
}

impl ArrayStore {
    pub fn get(&self, path: &DataPath) -> Option<&ArrayEntries> {
        self.arrays.get(path)
    }

    pub fn ids(&mut self) -> &mut IdAllocator {
        &mut self.ids
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    /// Entries for the array at `path` holding `values`.
    ///
    /// Known arrays keep their ids by position; unknown ones get fresh ids.
    pub fn sync(&mut self, path: &DataPath, values: &[Value]) -> &ArrayEntries {
        let entries = match self.arrays.remove(path) {
            Some(known) if known.iter().map(|e| &e.value).eq(values.iter()) => known,
            Some(known) => known.reconcile(values, &mut self.ids),
            None => ArrayEntries::from_values(values, &mut self.ids),
        };
        self.arrays.entry(path.clone()).or_insert(entries)
    }

    pub fn insert(&mut self, path: DataPath, entries: ArrayEntries) {
        self.arrays.insert(path, entries);
    }

    /// Forgets every array. Ids already handed out stay retired.
    pub fn clear(&mut self) {
        self.arrays.clear();
    }

    /// Drops arrays whose path no longer holds an array in `data`.
    pub fn prune(&mut self, data: &Value) {
        self.arrays
            .retain(|path, _| path.get(data).is_some_and(Value::is_array));
    }

    /// Moves the state of arrays nested in the items of the array at
    /// `array` after its items were rearranged.
    ///
    /// `moved` maps an old item index to its new one; state under items
    /// that map to `None` is dropped.
    pub fn remap(&mut self, array: &DataPath, moved: impl Fn(usize) -> Option<usize>) {
        let depth = array.len();
        let nested: Vec<DataPath> = self
            .arrays
            .keys()
            .filter(|path| path.len() > depth && path.starts_with(array))
            .cloned()
            .collect();
        let mut relocated = Vec::with_capacity(nested.len());
        for path in nested {
            let Some(entries) = self.arrays.remove(&path) else {
                continue;
            };
            let PathSegment::Index(old) = path.segments()[depth] else {
                continue;
            };
            if let Some(new) = moved(old) {
                let mut segments = path.segments().to_vec();
                segments[depth] = PathSegment::Index(new);
                relocated.push((DataPath::from(segments), entries));
            }
        }
        self.arrays.extend(relocated);
    }
}
