pub mod client;
pub mod error;
pub mod handler;
pub mod registry;

pub use client::{MqttClientConfig, MqttEventLoop, MqttIngestClient};
pub use error::MqttError;
pub use handler::{MessageHandler, StatusMessageHandler};
pub use registry::{SubscriptionEntry, SubscriptionRegistry};
