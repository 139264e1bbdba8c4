use std::{collections::BTreeMap, fmt};

use chrono::NaiveDate;
use serde::{
    de::{self, MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::dates::iso_day;

const SLOT_KEY_PREFIX: &str = "revision";

/// Due date and completion flag for one revision slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionRecord {
    #[serde(with = "iso_day")]
    pub date: NaiveDate,
    pub completed: bool,
}

impl RevisionRecord {
    pub fn pending(date: NaiveDate) -> Self {
        Self {
            date,
            completed: false,
        }
    }
}

/// Key of the slot at zero-based `index`: `revision1`, `revision2`, ...
pub fn slot_key(index: usize) -> String {
    format!("{SLOT_KEY_PREFIX}{}", index + 1)
}

/// Zero-based slot index for a `revisionN` key.
pub fn parse_slot_key(key: &str) -> Option<usize> {
    let number: usize = key.strip_prefix(SLOT_KEY_PREFIX)?.parse().ok()?;
    number.checked_sub(1)
}

/// Ordered revision slots of one session.
///
/// Slot `i` is always `revision{i+1}`; the string keys only exist in the
/// serialized form, where the slots become a `{"revisionN": record}` object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevisionSlots(Vec<RevisionRecord>);

impl RevisionSlots {
    pub fn new(records: Vec<RevisionRecord>) -> Self {
        Self(records)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RevisionRecord> {
        self.0.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut RevisionRecord> {
        self.0.get_mut(index)
    }

    pub fn by_key(&self, key: &str) -> Option<&RevisionRecord> {
        parse_slot_key(key).and_then(|index| self.get(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &RevisionRecord> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut RevisionRecord> {
        self.0.iter_mut()
    }

    /// `(key, record)` pairs in slot order.
    pub fn entries(&self) -> impl Iterator<Item = (String, &RevisionRecord)> {
        self.0
            .iter()
            .enumerate()
            .map(|(index, record)| (slot_key(index), record))
    }

    /// Vacuously true for a session without slots.
    pub fn all_completed(&self) -> bool {
        self.0.iter().all(|record| record.completed)
    }

    pub fn completed_count(&self) -> usize {
        self.0.iter().filter(|record| record.completed).count()
    }
}

impl FromIterator<RevisionRecord> for RevisionSlots {
    fn from_iter<I: IntoIterator<Item = RevisionRecord>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for RevisionSlots {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, record) in self.entries() {
            map.serialize_entry(&key, record)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RevisionSlots {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(SlotsVisitor)
    }
}

struct SlotsVisitor;

impl<'de> Visitor<'de> for SlotsVisitor {
    type Value = RevisionSlots;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an object keyed by revision1..revisionN")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut by_index = BTreeMap::new();
        while let Some((key, record)) = access.next_entry::<String, RevisionRecord>()? {
            let index = parse_slot_key(&key)
                .ok_or_else(|| de::Error::custom(format!("invalid revision slot key '{key}'")))?;
            if by_index.insert(index, record).is_some() {
                return Err(de::Error::custom(format!("duplicate revision slot '{key}'")));
            }
        }

        // BTreeMap iterates in index order, so contiguous means key == position.
        for (position, index) in by_index.keys().enumerate() {
            if position != *index {
                return Err(de::Error::custom(format!(
                    "revision slots must be contiguous, missing '{}'",
                    slot_key(position)
                )));
            }
        }

        Ok(by_index.into_values().collect())
    }
}
