//! # Subscription Demultiplexer
//!
//! Turns the channel's single raw inbound stream into independent per-type
//! streams.
//!
//! ## Routes
//!
//! A route is keyed by `(TypeId, Option<BasicAction>)` and owns one broadcast
//! sender. Every caller subscribing with the same key shares that route; the
//! route counts its subscribers and is removed when the last one is dropped.
//!
//! ## Pump
//!
//! While at least one route exists a single pump task reads raw frames from
//! the channel, decodes each frame once, and hands the shared decoded message
//! to every matching route. When the last route goes away the pump detaches
//! from the channel. The connection itself stays open, and frames arriving
//! with no route attached are not replayed to later subscribers.

use crate::channel::{FrameEvent, TransportChannel};
use crate::codec::EnvelopeCodec;
use crate::error::TransportError;
use futures::Stream;
use parking_lot::Mutex;
use std::any::TypeId;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Weak};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use vernite_schema::{BasicAction, DynMessage, VerniteMessage};
use vernite_telemetry::{ACTIVE_ROUTES, FRAMES_DROPPED, MESSAGES_ROUTED};

/// Identity of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteKey {
    type_id: TypeId,
    action: Option<BasicAction>,
}

impl RouteKey {
    /// Key for messages of type `T`, optionally filtered by action.
    ///
    /// `Unspecified` is not a filter; it keys the same route as `None`.
    #[must_use]
    pub fn of<T: VerniteMessage>(action: Option<BasicAction>) -> Self {
        Self::new(TypeId::of::<T>(), action)
    }

    #[must_use]
    pub fn new(type_id: TypeId, action: Option<BasicAction>) -> Self {
        Self {
            type_id,
            action: action.filter(|action| *action != BasicAction::Unspecified),
        }
    }

    #[must_use]
    pub fn action(&self) -> Option<BasicAction> {
        self.action
    }

    /// Same type, and same action when the key names one.
    #[must_use]
    pub fn matches(&self, message: &dyn DynMessage) -> bool {
        self.type_id == message.message_type_id()
            && self.action.map_or(true, |action| message.action() == Some(action))
    }
}

/// What a route delivers to its subscribers.
#[derive(Debug, Clone)]
pub enum Delivery {
    Message(Arc<dyn DynMessage>),
    Terminated(TransportError),
}

struct Route {
    sender: broadcast::Sender<Delivery>,
    subscribers: usize,
}

#[derive(Default)]
struct RouteTable {
    routes: HashMap<RouteKey, Route>,
    pump: Option<JoinHandle<()>>,
    /// Generation of the current pump. An aborted pump may still be running
    /// until its next await point; frames it holds must not reach new routes.
    generation: u64,
    /// Set once the channel terminates; no route can be attached afterwards.
    terminal: Option<TransportError>,
}

struct DemuxInner {
    channel: TransportChannel,
    codec: EnvelopeCodec,
    route_capacity: usize,
    table: Mutex<RouteTable>,
}

/// Routes decoded inbound messages to per-type subscriptions.
#[derive(Clone)]
pub struct Demultiplexer {
    inner: Arc<DemuxInner>,
}

impl Demultiplexer {
    pub fn new(channel: TransportChannel, codec: EnvelopeCodec, route_capacity: usize) -> Self {
        Self {
            inner: Arc::new(DemuxInner {
                channel,
                codec,
                route_capacity: route_capacity.max(1),
                table: Mutex::new(RouteTable::default()),
            }),
        }
    }

    /// Typed stream of `T` messages, filtered by `action` when given.
    pub fn subscribe<T: VerniteMessage>(
        &self,
        action: Option<BasicAction>,
    ) -> Result<MessageStream<T>, TransportError> {
        let type_name = self.inner.codec.registry().resolve_name_of::<T>()?.to_string();
        let subscription = self.attach(RouteKey::of::<T>(action), type_name)?;
        Ok(MessageStream::new(subscription))
    }

    /// Untyped stream of the message type named `type_name`.
    pub fn subscribe_named(
        &self,
        type_name: &str,
        action: Option<BasicAction>,
    ) -> Result<Subscription, TransportError> {
        let type_id = self.inner.codec.registry().resolve_type_id(type_name)?;
        self.attach(RouteKey::new(type_id, action), type_name.to_string())
    }

    /// Pack `message` and queue it as one outbound frame.
    pub fn publish<T: VerniteMessage>(&self, message: &T) -> Result<(), TransportError> {
        self.publish_dyn(message)
    }

    pub fn publish_dyn(&self, message: &dyn DynMessage) -> Result<(), TransportError> {
        let frame = self.inner.codec.pack_dyn(message)?;
        self.inner.channel.send(frame)
    }

    /// Number of live routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.inner.table.lock().routes.len()
    }

    /// Subscribers sharing the route for `key`; 0 if no such route.
    #[must_use]
    pub fn subscriber_count(&self, key: &RouteKey) -> usize {
        self.inner
            .table
            .lock()
            .routes
            .get(key)
            .map_or(0, |route| route.subscribers)
    }

    /// Whether the pump is currently attached to the channel.
    #[must_use]
    pub fn is_pumping(&self) -> bool {
        self.inner.table.lock().pump.is_some()
    }

    #[must_use]
    pub fn codec(&self) -> &EnvelopeCodec {
        &self.inner.codec
    }

    #[must_use]
    pub fn channel(&self) -> &TransportChannel {
        &self.inner.channel
    }

    fn attach(&self, key: RouteKey, type_name: String) -> Result<Subscription, TransportError> {
        let mut table = self.inner.table.lock();
        if let Some(cause) = &table.terminal {
            return Err(cause.clone());
        }

        if table.pump.is_none() {
            // Receiver attached synchronously so no frame slips by before the
            // pump task first runs.
            let events = self.inner.channel.inbound()?;
            table.generation += 1;
            let generation = table.generation;
            table.pump = Some(tokio::spawn(pump(
                Arc::downgrade(&self.inner),
                events,
                generation,
            )));
            debug!(generation, "Demultiplexer pump attached");
        }

        let capacity = self.inner.route_capacity;
        let route = table.routes.entry(key).or_insert_with(|| {
            debug!(type_name = %type_name, action = ?key.action, "Route attached");
            ACTIVE_ROUTES.inc();
            Route {
                sender: broadcast::channel(capacity).0,
                subscribers: 0,
            }
        });
        route.subscribers += 1;
        let receiver = route.sender.subscribe();

        Ok(Subscription {
            receiver,
            key,
            type_name,
            terminal: None,
            demux: Arc::clone(&self.inner),
        })
    }
}

impl fmt::Debug for Demultiplexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Demultiplexer")
            .field("routes", &self.route_count())
            .finish()
    }
}

impl DemuxInner {
    fn route_frame(&self, frame: &[u8], generation: u64) {
        let message: Arc<dyn DynMessage> = match self.codec.unpack(frame) {
            Ok(message) => Arc::from(message),
            Err(e) => {
                let reason = match e {
                    TransportError::UnknownType { .. } => "unknown_type",
                    _ => "decode_failure",
                };
                FRAMES_DROPPED.with_label_values(&[reason]).inc();
                warn!(error = %e, bytes = frame.len(), "Dropping inbound frame");
                return;
            }
        };

        let type_name = self
            .codec
            .registry()
            .resolve_name(message.message_type_id())
            .unwrap_or("unknown");

        let table = self.table.lock();
        if table.generation != generation {
            return;
        }
        let mut routed = 0usize;
        for (key, route) in &table.routes {
            if key.matches(message.as_ref()) {
                // A route with no live receiver is about to be removed.
                let _ = route.sender.send(Delivery::Message(Arc::clone(&message)));
                MESSAGES_ROUTED.with_label_values(&[type_name]).inc();
                routed += 1;
            }
        }
        debug!(type_name, routes = routed, "Inbound message routed");
    }

    fn terminate(&self, cause: TransportError, generation: u64) {
        let mut table = self.table.lock();
        if table.generation != generation {
            return;
        }
        table.pump = None;
        for route in table.routes.values() {
            let _ = route.sender.send(Delivery::Terminated(cause.clone()));
        }
        debug!(error = %cause, routes = table.routes.len(), "Demultiplexer terminated");
        table.terminal = Some(cause);
    }

    fn detach(&self, key: &RouteKey, type_name: &str) {
        let mut table = self.table.lock();
        if let Entry::Occupied(mut entry) = table.routes.entry(*key) {
            let route = entry.get_mut();
            route.subscribers = route.subscribers.saturating_sub(1);
            if route.subscribers == 0 {
                entry.remove();
                ACTIVE_ROUTES.dec();
                info!(type_name = %type_name, action = ?key.action, "Unsubscribe");
            }
        }

        if table.routes.is_empty() {
            if let Some(pump) = table.pump.take() {
                pump.abort();
                debug!("Demultiplexer pump detached");
            }
        }
    }
}

async fn pump(
    demux: Weak<DemuxInner>,
    mut events: broadcast::Receiver<FrameEvent>,
    generation: u64,
) {
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                FRAMES_DROPPED
                    .with_label_values(&["lagged"])
                    .inc_by(skipped as f64);
                warn!(skipped, "Demultiplexer lagged behind the connection, frames dropped");
                continue;
            }
            Err(RecvError::Closed) => FrameEvent::Terminated(TransportError::ChannelClosed),
        };

        let Some(inner) = demux.upgrade() else {
            return;
        };
        match event {
            FrameEvent::Frame(frame) => inner.route_frame(&frame, generation),
            FrameEvent::Terminated(cause) => {
                inner.terminate(cause, generation);
                return;
            }
        }
    }
}

/// One caller's view of a route.
///
/// Dropping the last subscription of a route removes the route.
pub struct Subscription {
    receiver: broadcast::Receiver<Delivery>,
    key: RouteKey,
    type_name: String,
    /// Sticky once seen: every later receive returns it again.
    terminal: Option<TransportError>,
    demux: Arc<DemuxInner>,
}

impl Subscription {
    /// Next message on this route.
    ///
    /// Returns the terminal error once the channel is gone, and keeps
    /// returning it afterwards.
    pub async fn recv(&mut self) -> Result<Arc<dyn DynMessage>, TransportError> {
        if let Some(cause) = &self.terminal {
            return Err(cause.clone());
        }

        loop {
            match self.receiver.recv().await {
                Ok(Delivery::Message(message)) => return Ok(message),
                Ok(Delivery::Terminated(cause)) => return Err(self.finish(cause)),
                Err(RecvError::Lagged(skipped)) => self.lagged(skipped),
                Err(RecvError::Closed) => return Err(self.finish(TransportError::ChannelClosed)),
            }
        }
    }

    /// Next message if one is buffered.
    pub fn try_recv(&mut self) -> Result<Option<Arc<dyn DynMessage>>, TransportError> {
        if let Some(cause) = &self.terminal {
            return Err(cause.clone());
        }

        loop {
            match self.receiver.try_recv() {
                Ok(Delivery::Message(message)) => return Ok(Some(message)),
                Ok(Delivery::Terminated(cause)) => return Err(self.finish(cause)),
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Lagged(skipped)) => self.lagged(skipped),
                Err(TryRecvError::Closed) => {
                    return Err(self.finish(TransportError::ChannelClosed))
                }
            }
        }
    }

    #[must_use]
    pub fn key(&self) -> RouteKey {
        self.key
    }

    /// Dotted wire name of the subscribed type.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    fn finish(&mut self, cause: TransportError) -> TransportError {
        self.terminal = Some(cause.clone());
        cause
    }

    fn lagged(&self, skipped: u64) {
        FRAMES_DROPPED
            .with_label_values(&["lagged"])
            .inc_by(skipped as f64);
        warn!(
            type_name = %self.type_name,
            skipped,
            "Subscriber lagged, oldest messages dropped"
        );
    }
}

impl Clone for Subscription {
    /// Adds one subscriber to the same route.
    fn clone(&self) -> Self {
        let mut table = self.demux.table.lock();
        let terminal = self.terminal.clone().or_else(|| table.terminal.clone());
        let receiver = match table.routes.get_mut(&self.key) {
            Some(route) => {
                route.subscribers += 1;
                route.sender.subscribe()
            }
            // unreachable while `self` holds a count, kept total anyway
            None => self.receiver.resubscribe(),
        };

        Self {
            receiver,
            key: self.key,
            type_name: self.type_name.clone(),
            terminal,
            demux: Arc::clone(&self.demux),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.demux.detach(&self.key, &self.type_name);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("type_name", &self.type_name)
            .field("action", &self.key.action)
            .finish()
    }
}

/// Typed view of a [`Subscription`].
pub struct MessageStream<T> {
    subscription: Subscription,
    _marker: PhantomData<fn() -> T>,
}

impl<T: VerniteMessage> MessageStream<T> {
    fn new(subscription: Subscription) -> Self {
        Self {
            subscription,
            _marker: PhantomData,
        }
    }

    pub async fn recv(&mut self) -> Result<Arc<T>, TransportError> {
        let message = self.subscription.recv().await?;
        self.downcast(message)
    }

    pub fn try_recv(&mut self) -> Result<Option<Arc<T>>, TransportError> {
        match self.subscription.try_recv()? {
            Some(message) => self.downcast(message).map(Some),
            None => Ok(None),
        }
    }

    /// Stream of messages ending right after the terminal error.
    pub fn into_stream(self) -> impl Stream<Item = Result<Arc<T>, TransportError>> + Send {
        futures::stream::unfold(Some(self), |state| async move {
            let mut stream = state?;
            match stream.recv().await {
                Ok(message) => Some((Ok(message), Some(stream))),
                Err(cause) => Some((Err(cause), None)),
            }
        })
    }

    #[must_use]
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    fn downcast(&self, message: Arc<dyn DynMessage>) -> Result<Arc<T>, TransportError> {
        let actual = message.rust_type_name();
        message
            .into_any_arc()
            .downcast::<T>()
            .map_err(|_| TransportError::UnexpectedType {
                expected: self.subscription.type_name.clone(),
                actual: actual.to_string(),
            })
    }
}

impl<T> Clone for MessageStream<T> {
    fn clone(&self) -> Self {
        Self {
            subscription: self.subscription.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for MessageStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MessageStream")
            .field(&self.subscription)
            .finish()
    }
}
