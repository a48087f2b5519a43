pub mod batch;
pub mod config;
pub mod dispatch;
pub mod group;
pub mod params;
pub mod random;

pub use batch::{Batch, BatchController, BatchPlan};
pub use dispatch::{Dispatcher, DispatcherFactory, HttpTarget};
