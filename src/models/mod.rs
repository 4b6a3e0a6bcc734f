pub mod dog;
pub mod ids;
pub mod journal;

pub use dog::Dog;
pub use ids::{DogId, JournalId, TrainerId, UserId};
pub use journal::{
    ApprovalStatus, JournalDraft, JournalRecord, OperationBlock, TrainingBlock,
    DEFAULT_HEALTH_STATUS,
};
