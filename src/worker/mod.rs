//! # Worker Module
//!
//! The consumer loop, the per-message handler, and shutdown coordination.

pub mod consumer;
pub mod handler;
pub mod shutdown;

pub use consumer::{
    ConsumerSettings, ConsumerState, ConsumerStats, ConsumerStatsSnapshot, QueueConsumer,
};
pub use handler::{
    FulfillmentWork, MessageHandler, OrderProcessingHandler, ProcessingStage, SimulatedFulfillment,
};
pub use shutdown::ShutdownCoordinator;
