//! One connection's worth of watching.

use anyhow::{bail, Context, Result};
use std::future::Future;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use vernite_schema::{BasicAction, ROOT_PACKAGE};
use vernite_transport::{MessageTransport, Subscription, TransportError, TypeRegistry};

/// Type the liveness driver already handles; not worth logging.
const KEEPALIVE_TYPE: &str = "vernite.KeepAlive";

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// Local shutdown signal.
    Interrupted,
    /// The connection ended on its own.
    Terminated(TransportError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub end: SessionEnd,
    /// Messages logged across all watched types.
    pub received: u64,
}

/// Resolve the types to watch. Empty means every registered type except
/// keep-alives.
pub fn watch_list(registry: &TypeRegistry, requested: &[String]) -> Result<Vec<String>> {
    if requested.is_empty() {
        return Ok(registry
            .names()
            .into_iter()
            .filter(|name| *name != KEEPALIVE_TYPE)
            .map(str::to_string)
            .collect());
    }

    let mut names = Vec::with_capacity(requested.len());
    for name in requested {
        // Accept `Task` as shorthand for `vernite.Task`.
        let dotted = if registry.contains(name) {
            name.clone()
        } else {
            format!("{ROOT_PACKAGE}.{name}")
        };
        if !registry.contains(&dotted) {
            bail!(
                "unknown message type '{name}', known types: {}",
                registry.names().join(", ")
            );
        }
        if !names.contains(&dotted) {
            names.push(dotted);
        }
    }
    Ok(names)
}

/// The filter to apply when watching `type_name`.
///
/// Types without an `action` field would never match a filter, so they are
/// watched unfiltered.
pub fn action_for(
    registry: &TypeRegistry,
    type_name: &str,
    action: Option<BasicAction>,
) -> Result<Option<BasicAction>> {
    let Some(action) = action else {
        return Ok(None);
    };
    if registry.has_action(type_name)? {
        Ok(Some(action))
    } else {
        warn!(type_name, action = ?action, "Type has no action field, watching unfiltered");
        Ok(None)
    }
}

/// Log every watched message until the connection ends or `shutdown` fires.
pub async fn run_session(
    transport: MessageTransport,
    watch: &[String],
    action: Option<BasicAction>,
    shutdown: impl Future<Output = ()>,
) -> Result<SessionReport> {
    let mut watchers = JoinSet::new();
    for name in watch {
        let filter = action_for(transport.registry(), name, action)?;
        let subscription = transport
            .subscribe_named(name, filter)
            .with_context(|| format!("Failed to watch {name}"))?;
        watchers.spawn(log_messages(subscription));
    }
    info!(types = watch.len(), action = ?action, "Watching message types");

    let end = tokio::select! {
        _ = shutdown => {
            transport.shutdown();
            SessionEnd::Interrupted
        }
        cause = transport.terminated() => SessionEnd::Terminated(cause),
    };

    // Watchers end on the terminal error that follows either branch.
    let mut received = 0;
    while let Some(result) = watchers.join_next().await {
        received += result.context("Watcher task panicked")?;
    }

    info!(
        received,
        echoed = transport.liveness().echoed(),
        "Session ended"
    );
    Ok(SessionReport { end, received })
}

async fn log_messages(mut subscription: Subscription) -> u64 {
    let mut seen = 0;
    loop {
        match subscription.recv().await {
            Ok(message) => {
                seen += 1;
                info!(
                    type_name = subscription.type_name(),
                    action = ?message.action(),
                    message = ?message,
                    "Message received"
                );
            }
            Err(cause) => {
                debug!(type_name = subscription.type_name(), cause = %cause, "Watcher stopped");
                return seen;
            }
        }
    }
}
