use crate::error::MqttError;
use crate::handler::MessageHandler;
use crate::registry::SubscriptionRegistry;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, Publish, QoS};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Connection settings for the ingest broker session.
#[derive(Debug, Clone)]
pub struct MqttClientConfig {
    /// Broker URL in the form `mqtt://host:port`, `tcp://host:port`, or `host:port`
    pub broker_url: String,
    pub client_id: String,
    pub username: String,
    pub password: String,
    /// Keep-alive interval; the transport bounds its ping handling by this
    pub keep_alive: Duration,
    /// Fixed wait between reconnect attempts after a connection loss
    pub reconnect_interval: Duration,
    /// Bounded wait applied to subscribe and publish calls
    pub operation_timeout: Duration,
    /// Bounded wait for the first broker acknowledgment at startup
    pub connect_timeout: Duration,
}

impl Default for MqttClientConfig {
    fn default() -> Self {
        Self {
            broker_url: "tcp://localhost:1883".to_string(),
            client_id: "fleetstat".to_string(),
            username: String::new(),
            password: String::new(),
            keep_alive: Duration::from_secs(30),
            reconnect_interval: Duration::from_secs(3),
            operation_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Handle for subscribing and publishing on the ingest broker session.
///
/// Connection loss is handled by the companion [`MqttEventLoop`]: it logs
/// the loss, waits a fixed interval, and lets the transport re-establish
/// the session, replaying the subscription registry on every reconnect.
/// There is no externally observable "down" state beyond logs.
#[derive(Clone)]
pub struct MqttIngestClient {
    client: AsyncClient,
    registry: Arc<SubscriptionRegistry>,
    operation_timeout: Duration,
}

impl MqttIngestClient {
    /// Establishes the broker session.
    ///
    /// Fails fatally if the very first connection attempt does not reach
    /// a broker acknowledgment within the connect timeout; after that the
    /// returned event loop self-heals.
    pub async fn connect(
        config: MqttClientConfig,
    ) -> Result<(Self, MqttEventLoop), MqttError> {
        let (host, port) = parse_broker_url(&config.broker_url)?;

        let mut options = MqttOptions::new(&config.client_id, host, port);
        options.set_keep_alive(config.keep_alive);
        options.set_clean_session(true);
        if !config.username.is_empty() {
            options.set_credentials(&config.username, &config.password);
        }

        let (client, mut eventloop) = AsyncClient::new(options, 100);

        // Wait for the first ConnAck; everything later self-heals, but a
        // broker that never answers at startup is fatal.
        let first_ack = timeout(config.connect_timeout, async {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => return Ok(()),
                    Ok(_) => continue,
                    Err(e) => return Err(MqttError::Connect(e.to_string())),
                }
            }
        })
        .await;

        match first_ack {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(MqttError::ConnectTimeout),
        }

        info!(broker_url = %config.broker_url, client_id = %config.client_id, "connected to MQTT broker");

        let registry = Arc::new(SubscriptionRegistry::new());

        let ingest_client = Self {
            client: client.clone(),
            registry: Arc::clone(&registry),
            operation_timeout: config.operation_timeout,
        };

        let event_loop = MqttEventLoop {
            client,
            eventloop,
            registry,
            reconnect_interval: config.reconnect_interval,
            operation_timeout: config.operation_timeout,
        };

        Ok((ingest_client, event_loop))
    }

    /// Subscribes a handler to a topic filter.
    ///
    /// The entry is registered before the transport subscribe, so a
    /// timeout leaves it registered — the next reconnect cycle retries it.
    pub async fn subscribe(
        &self,
        topic_filter: &str,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<(), MqttError> {
        self.registry.register(topic_filter, handler);

        match timeout(
            self.operation_timeout,
            self.client
                .subscribe(topic_filter.to_string(), QoS::AtLeastOnce),
        )
        .await
        {
            Ok(Ok(())) => {
                info!(topic = %topic_filter, "subscribed");
                Ok(())
            }
            Ok(Err(e)) => Err(MqttError::Subscribe {
                topic: topic_filter.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(MqttError::SubscribeTimeout(topic_filter.to_string())),
        }
    }

    /// Publishes a payload with a bounded wait. No local retry queue —
    /// an error is terminal for the attempt.
    pub async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), MqttError> {
        match timeout(
            self.operation_timeout,
            self.client
                .publish(topic.to_string(), QoS::AtLeastOnce, false, payload.to_vec()),
        )
        .await
        {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(MqttError::Publish {
                topic: topic.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(MqttError::PublishTimeout(topic.to_string())),
        }
    }
}

/// Long-running transport loop: dispatches inbound publishes, replays the
/// subscription registry on every reconnect, and sleeps a fixed interval
/// after a connection loss instead of hot-looping.
pub struct MqttEventLoop {
    client: AsyncClient,
    eventloop: EventLoop,
    registry: Arc<SubscriptionRegistry>,
    reconnect_interval: Duration,
    operation_timeout: Duration,
}

impl MqttEventLoop {
    pub async fn run(mut self, token: CancellationToken) -> Result<(), anyhow::Error> {
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("MQTT event loop cancelled");
                    let _ = self.client.disconnect().await;
                    return Ok(());
                }
                event = self.eventloop.poll() => match event {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("MQTT session (re)established");
                        self.resubscribe_all().await;
                    }
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        self.dispatch(publish);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "MQTT connection lost");
                        tokio::select! {
                            _ = token.cancelled() => return Ok(()),
                            _ = tokio::time::sleep(self.reconnect_interval) => {}
                        }
                    }
                }
            }
        }
    }

    /// Reissues every registered subscription against the new session.
    /// A failure for one topic is logged and does not abort the rest.
    async fn resubscribe_all(&mut self) {
        let entries = self.registry.snapshot();
        for entry in entries {
            info!(topic = %entry.topic_filter, "resubscribing");
            match timeout(
                self.operation_timeout,
                self.client
                    .subscribe(entry.topic_filter.clone(), QoS::AtLeastOnce),
            )
            .await
            {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!(topic = %entry.topic_filter, error = %e, "failed to resubscribe");
                }
                Err(_) => {
                    error!(topic = %entry.topic_filter, "timed out resubscribing");
                }
            }
        }
    }

    /// Delivers a publish to every matching handler, each on its own task
    /// so handlers run concurrently and never block the event loop.
    fn dispatch(&self, publish: Publish) {
        let topic = publish.topic;
        let payload = publish.payload;
        let retained = publish.retain;

        for entry in self.registry.matching(&topic) {
            let topic = topic.clone();
            let payload = payload.clone();
            tokio::spawn(async move {
                entry.handler.handle(&topic, &payload, retained).await;
            });
        }
    }
}

/// Parse broker URL in format mqtt://host:port, tcp://host:port, or host:port
fn parse_broker_url(url: &str) -> Result<(String, u16), MqttError> {
    let trimmed = url.trim_start_matches("mqtt://").trim_start_matches("tcp://");

    let parts: Vec<&str> = trimmed.split(':').collect();
    match parts.len() {
        1 => Ok((parts[0].to_string(), 1883)), // Default MQTT port
        2 => {
            let port = parts[1]
                .parse::<u16>()
                .map_err(|_| MqttError::InvalidBrokerUrl(format!("bad port in '{}'", url)))?;
            Ok((parts[0].to_string(), port))
        }
        _ => Err(MqttError::InvalidBrokerUrl(url.to_string())),
    }
}
