use thiserror::Error;

#[derive(Error, Debug)]
pub enum MqttError {
    #[error("MQTT connect failed: {0}")]
    Connect(String),

    #[error("timed out waiting for MQTT broker connection")]
    ConnectTimeout,

    #[error("MQTT subscribe failed for '{topic}': {reason}")]
    Subscribe { topic: String, reason: String },

    #[error("timed out waiting for subscribe on '{0}'")]
    SubscribeTimeout(String),

    #[error("MQTT publish failed for '{topic}': {reason}")]
    Publish { topic: String, reason: String },

    #[error("timed out waiting for publish on '{0}'")]
    PublishTimeout(String),

    #[error("invalid broker URL: {0}")]
    InvalidBrokerUrl(String),
}
