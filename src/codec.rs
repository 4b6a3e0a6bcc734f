//! # Activity codec
//!
//! The remote record stores each group of sub-activities as one flat,
//! human-readable text field. Business code works on structured lists and
//! only crosses into the flat form here, when a record is written or read.
//!
//! Entries are joined with `"; "` and split on `";"`. An entry that itself
//! contains `;` cannot survive a round trip: it comes back as several
//! entries. That loss is accepted; the text format is shared with the
//! service and other readers of it.

use serde::{Deserialize, Serialize};

pub const DELIMITER: &str = "; ";
const SPLIT_ON: char = ';';

/// Join non-empty trimmed entries into one field.
pub fn encode_list<I, S>(entries: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    entries
        .into_iter()
        .filter_map(|entry| {
            let trimmed = entry.as_ref().trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .collect::<Vec<_>>()
        .join(DELIMITER)
}

/// Split a field back into trimmed, non-empty entries.
pub fn decode_list(text: &str) -> Vec<String> {
    text.split(SPLIT_ON)
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

/// Time-of-day slot of a care activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CareSlot {
    Morning,
    Afternoon,
    Evening,
}

impl CareSlot {
    /// Matching order when decoding.
    pub const ALL: [CareSlot; 3] = [CareSlot::Morning, CareSlot::Afternoon, CareSlot::Evening];

    pub fn label(self) -> &'static str {
        match self {
            CareSlot::Morning => "Sáng",
            CareSlot::Afternoon => "Chiều",
            CareSlot::Evening => "Tối",
        }
    }

    fn marker(self) -> String {
        format!("{}:", self.label())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareSlots {
    pub morning: String,
    pub afternoon: String,
    pub evening: String,
}

impl CareSlots {
    pub fn get(&self, slot: CareSlot) -> &str {
        match slot {
            CareSlot::Morning => &self.morning,
            CareSlot::Afternoon => &self.afternoon,
            CareSlot::Evening => &self.evening,
        }
    }

    pub fn set(&mut self, slot: CareSlot, value: impl Into<String>) {
        let value = value.into();
        match slot {
            CareSlot::Morning => self.morning = value,
            CareSlot::Afternoon => self.afternoon = value,
            CareSlot::Evening => self.evening = value,
        }
    }

    pub fn is_empty(&self) -> bool {
        CareSlot::ALL.iter().all(|slot| self.get(*slot).trim().is_empty())
    }

    /// `"Sáng: <value>; Chiều: <value>; Tối: <value>"`, empty slots omitted.
    pub fn encode(&self) -> String {
        encode_list(CareSlot::ALL.iter().filter_map(|slot| {
            let value = self.get(*slot).trim();
            (!value.is_empty()).then(|| format!("{}: {}", slot.label(), value))
        }))
    }

    /// Labels are matched as substrings, not prefixes, and the first label
    /// found in `CareSlot::ALL` order claims the segment. A value that
    /// mentions another slot's label can therefore land in the wrong slot.
    /// Segments without any label are dropped.
    pub fn decode(text: &str) -> Self {
        let mut slots = CareSlots::default();
        for segment in decode_list(text) {
            for slot in CareSlot::ALL {
                let marker = slot.marker();
                if segment.contains(&marker) {
                    let value = segment.replacen(&marker, "", 1);
                    slots.set(slot, value.trim());
                    break;
                }
            }
        }
        slots
    }
}

/// A list-typed editing surface always offers at least one slot to type in.
pub fn ensure_one_slot<T: Default>(items: &mut Vec<T>) {
    if items.is_empty() {
        items.push(T::default());
    }
}
