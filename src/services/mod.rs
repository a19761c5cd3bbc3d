pub mod clock;
pub mod csv;
pub mod exporter;
pub mod job;
pub mod scheduler;
pub mod source;
pub mod storage;

#[cfg(test)]
pub mod testing;

pub use clock::SystemClock;
pub use job::ExportJob;
pub use scheduler::SyncScheduler;
pub use storage::build_object_store;
