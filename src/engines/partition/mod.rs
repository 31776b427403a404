pub mod base;
pub mod kfold;
pub mod stratified;
pub mod types;

pub use base::Partitioner;
pub use kfold::KFoldPartitioner;
pub use stratified::StratifiedPartitioner;
pub use types::FoldAssignment;

use crate::config::{PartitionConfig, PartitionStrategy};

/// Build the partitioner selected by the configuration.
pub fn from_config(config: &PartitionConfig) -> Box<dyn Partitioner> {
    match config.strategy {
        PartitionStrategy::Stratified => Box::new(StratifiedPartitioner::new(
            config.n_folds,
            config.shuffle,
            config.seed,
        )),
        PartitionStrategy::Plain => Box::new(KFoldPartitioner::new(
            config.n_folds,
            config.shuffle,
            config.seed,
        )),
    }
}
