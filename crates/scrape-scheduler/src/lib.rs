//! Async scrape scheduler: submit returns a job id, a runner drives the job, status is polled.

mod memory;
mod registry;
mod runner;
mod trait_;

pub use memory::{InMemoryScheduler, SchedulerConfig};
pub use registry::{JobRegistry, RegistryError};
pub use runner::JobRunner;
pub use trait_::{Scheduler, SchedulerError};
