pub mod batch;
pub mod caption;
pub mod config;
pub mod error;
pub mod media;
pub mod name;

pub use batch::{
    enumerate_jobs, print_summary, run_batch, BatchReport, BatchRequest, Composer,
    CompositionJob, FfmpegComposer, JobOutcome, JobRecord,
};
pub use config::Config;
pub use error::{ClipstormError, Result};
