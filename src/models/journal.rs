use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use super::ids::{DogId, JournalId, TrainerId, UserId};
use crate::codec::{self, CareSlots};

pub const DEFAULT_HEALTH_STATUS: &str = "Tốt";

/// One journal entry in the shape the remote service stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct JournalRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<JournalId>,
    pub dog_id: DogId,
    pub trainer_id: TrainerId,
    #[validate(length(min = 1, message = "Journal date is required"))]
    pub journal_date: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub training_activities: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub care_activities: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub operation_activities: String,

    #[serde(default = "default_health_status", deserialize_with = "health_or_default")]
    pub health_status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub behavior_notes: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub weather_conditions: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub challenges: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub next_goals: String,

    /// Minutes, summed from the training blocks at save time.
    #[serde(default, deserialize_with = "null_as_default")]
    pub training_duration: u32,
    #[validate(range(max = 100, message = "Success rate must be between 0 and 100"))]
    #[serde(default, deserialize_with = "null_as_default")]
    pub success_rate: u32,

    // Filled in by the service; never sent back.
    #[serde(default, skip_serializing)]
    pub dog_name: Option<String>,
    #[serde(default, skip_serializing)]
    pub trainer_name: Option<String>,
    #[serde(default, skip_serializing)]
    pub approval_status: Option<ApprovalStatus>,
    #[serde(default, skip_serializing)]
    pub approved_by: Option<UserId>,
    #[serde(default, skip_serializing)]
    pub approver_name: Option<String>,
    #[serde(default, skip_serializing)]
    pub approved_at: Option<String>,
    #[serde(default, skip_serializing)]
    pub rejection_reason: Option<String>,
    #[serde(default, skip_serializing)]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

fn default_health_status() -> String {
    DEFAULT_HEALTH_STATUS.to_string()
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn health_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(default_health_status))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingBlock {
    pub content: String,
    /// Raw minutes as typed.
    pub duration: String,
    /// Raw percentage as typed.
    pub success_rate: String,
}

impl TrainingBlock {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationBlock {
    pub content: String,
}

/// The structured, editable form of a journal entry.
///
/// Only `to_record` / `from_record` touch the flat text encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalDraft {
    pub id: Option<JournalId>,
    pub dog_name: String,
    pub journal_date: String,
    pub training_blocks: Vec<TrainingBlock>,
    pub care: CareSlots,
    pub operation_blocks: Vec<OperationBlock>,
    pub health_status: String,
    pub behavior_notes: String,
    pub weather_conditions: String,
    pub challenges: String,
    pub next_goals: String,
}

impl JournalDraft {
    /// A blank entry for `dog_name` on `journal_date`.
    pub fn empty(dog_name: impl Into<String>, journal_date: impl Into<String>) -> Self {
        let mut draft = Self {
            id: None,
            dog_name: dog_name.into(),
            journal_date: journal_date.into(),
            training_blocks: Vec::new(),
            care: CareSlots::default(),
            operation_blocks: Vec::new(),
            health_status: default_health_status(),
            behavior_notes: String::new(),
            weather_conditions: String::new(),
            challenges: String::new(),
            next_goals: String::new(),
        };
        draft.populate_blocks();
        draft
    }

    pub fn from_record(record: &JournalRecord, dog_name: impl Into<String>) -> Self {
        let mut draft = Self {
            id: record.id,
            dog_name: record.dog_name.clone().unwrap_or_else(|| dog_name.into()),
            journal_date: record.journal_date.clone(),
            training_blocks: codec::decode_list(&record.training_activities)
                .into_iter()
                .map(TrainingBlock::new)
                .collect(),
            care: CareSlots::decode(&record.care_activities),
            operation_blocks: codec::decode_list(&record.operation_activities)
                .into_iter()
                .map(|content| OperationBlock { content })
                .collect(),
            health_status: record.health_status.clone(),
            behavior_notes: record.behavior_notes.clone(),
            weather_conditions: record.weather_conditions.clone(),
            challenges: record.challenges.clone(),
            next_goals: record.next_goals.clone(),
        };
        draft.populate_blocks();
        draft
    }

    /// Guarantee one training and one operation block to edit.
    pub fn populate_blocks(&mut self) {
        codec::ensure_one_slot(&mut self.training_blocks);
        codec::ensure_one_slot(&mut self.operation_blocks);
    }

    pub fn training_duration(&self) -> u32 {
        training_duration(&self.training_blocks)
    }

    pub fn success_rate(&self) -> u32 {
        success_rate(&self.training_blocks)
    }

    /// Encode for the wire. Derived totals are always recomputed from the
    /// blocks as they are now.
    pub fn to_record(&self, dog_id: DogId, trainer_id: TrainerId) -> JournalRecord {
        let health_status = match self.health_status.trim() {
            "" => default_health_status(),
            status => status.to_string(),
        };
        JournalRecord {
            id: self.id,
            dog_id,
            trainer_id,
            journal_date: self.journal_date.trim().to_string(),
            training_activities: codec::encode_list(
                self.training_blocks.iter().map(|block| block.content.as_str()),
            ),
            care_activities: self.care.encode(),
            operation_activities: codec::encode_list(
                self.operation_blocks.iter().map(|block| block.content.as_str()),
            ),
            health_status,
            behavior_notes: self.behavior_notes.clone(),
            weather_conditions: self.weather_conditions.clone(),
            challenges: self.challenges.clone(),
            next_goals: self.next_goals.clone(),
            training_duration: self.training_duration(),
            success_rate: self.success_rate(),
            dog_name: None,
            trainer_name: None,
            approval_status: None,
            approved_by: None,
            approver_name: None,
            approved_at: None,
            rejection_reason: None,
            created_at: None,
            updated_at: None,
        }
    }
}

/// Leading optional sign and digits, the rest ignored: `"12.5"` is 12 and
/// `"10 phút"` is 10. `None` when no digit comes first.
fn parse_whole(raw: &str) -> Option<i64> {
    let text = raw.trim_start();
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return None;
    }
    let value = rest[..digits_end]
        .bytes()
        .fold(0i64, |acc, d| acc.saturating_mul(10).saturating_add(i64::from(d - b'0')));
    Some(if negative { -value } else { value })
}

/// Total minutes across blocks; unparsable durations count as zero.
pub fn training_duration(blocks: &[TrainingBlock]) -> u32 {
    let total: i64 = blocks
        .iter()
        .filter_map(|block| parse_whole(&block.duration))
        .map(|minutes| minutes.max(0))
        .sum();
    u32::try_from(total).unwrap_or(u32::MAX)
}

/// Rounded mean of the rates that parse; blocks without one are left out of
/// the denominator. Zero when no block carries a rate.
pub fn success_rate(blocks: &[TrainingBlock]) -> u32 {
    let rates: Vec<i64> = blocks
        .iter()
        .filter_map(|block| parse_whole(&block.success_rate))
        .collect();
    if rates.is_empty() {
        return 0;
    }
    let mean = rates.iter().sum::<i64>() as f64 / rates.len() as f64;
    mean.round().clamp(0.0, 100.0) as u32
}
