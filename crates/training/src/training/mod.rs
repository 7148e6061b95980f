//! Training infrastructure for byte-level BPE.
//!
//! Pre-tokenization is partitioned and parallel; the merge loop is sequential
//! and driven by an incremental pair index.

pub mod counter;
pub mod pair_index;
pub mod parallel;
pub mod partition;
pub mod trainer;

pub use counter::FrequencyTable;
pub use pair_index::PairIndex;
pub use parallel::par_map_reduce;
pub use partition::find_chunk_boundaries;
pub use trainer::{
    BpeTrainer, TrainedModel, TrainingConfig, TrainingConfigBuilder, DEFAULT_SPECIAL_TOKEN,
};
