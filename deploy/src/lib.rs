pub mod artifact;
pub mod deployer;
pub mod error;
pub mod plan;
pub mod report;
pub mod sequencer;
pub mod shared;
