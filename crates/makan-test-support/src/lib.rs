//! Shared test doubles and fixtures for the Makan ranking pipeline.

mod bus;
mod clock;
mod fixtures;
mod index;
mod stores;

pub use bus::{FailingEventBus, RecordingEventBus};
pub use clock::FixedClock;
pub use fixtures::{retract_envelope, sample_dish, vote_envelope};
pub use index::{FailingIndexWriter, FlakyIndexWriter, RecordingIndexWriter};
pub use stores::{
    FailingVoteStore, InMemoryAggregateStore, InMemoryDishCatalog, InMemoryVoteStore,
    RecordingDeadLetterStore,
};
