pub mod gate;
pub mod loader;
pub mod processor;
pub mod supervisor;
pub mod worker;
pub mod writer;

pub use gate::NotificationGate;
pub use processor::{ProcessOutcome, TriggerProcessor};
pub use supervisor::Supervisor;
pub use worker::{Worker, WorkerState};
