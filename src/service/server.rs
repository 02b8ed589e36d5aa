//! # CoIoT Broadcast Listener
//!
//! Listens for unsolicited status broadcasts and republishes each decoded
//! status as a [`ServerEvent::Status`].
//!
//! Inbound datagrams are handled one at a time in arrival order. Only datagrams
//! carrying the broadcast code `0.30` on the status path are considered; all
//! others are ignored. A datagram that fails to decode is logged and dropped
//! without affecting the datagrams after it.
//!
//! ## Lifecycle
//! - [`CoiotServer::listen`] binds through the transport and starts dispatching.
//! - [`CoiotServer::close`] (or [`CoiotServer::unsubscribe`]) tears the socket
//!   down and stops dispatching. The server can listen again afterwards.
//!
//! Bind and close failures are returned to the caller and also published as
//! [`ServerEvent::Error`].

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::config::ServerConfig;
use crate::core::options::{COIOT_CODE, COIOT_STATUS_PATH};
use crate::error::{constants, ProtocolError, Result};
use crate::protocol::{decode_status, StatusMessage};
use crate::transport::{InboundRequest, ReplyHandle, ServerTransport};
use crate::utils::metrics::global_metrics;

/// Events published by [`CoiotServer`].
#[derive(Debug)]
pub enum ServerEvent {
    /// The transport is bound and broadcasts are being dispatched
    Listening,
    /// The transport was closed
    Close,
    /// A bind or close attempt failed
    Error(String),
    /// A decoded status broadcast, with the handle to answer its exchange
    Status {
        status: StatusMessage,
        reply: ReplyHandle,
    },
}

type InboundReceiver = mpsc::UnboundedReceiver<InboundRequest>;

struct Dispatcher {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<InboundReceiver>,
}

/// Broadcast listener over a [`ServerTransport`].
pub struct CoiotServer<T: ServerTransport> {
    transport: Arc<T>,
    events: mpsc::UnboundedSender<ServerEvent>,
    inbound: Option<InboundReceiver>,
    dispatcher: Option<Dispatcher>,
}

impl<T: ServerTransport> CoiotServer<T> {
    /// Bind to the transport's inbound request source.
    ///
    /// Returns the server and the receiving end of its event stream.
    pub fn new(transport: T) -> Result<(Self, mpsc::UnboundedReceiver<ServerEvent>)> {
        let inbound = transport.incoming()?;
        let (events, events_rx) = mpsc::unbounded_channel();

        let server = Self {
            transport: Arc::new(transport),
            events,
            inbound: Some(inbound),
            dispatcher: None,
        };
        Ok((server, events_rx))
    }

    /// Like [`CoiotServer::new`], after checking the bind target in `config`.
    ///
    /// The transport owns the socket; the config only names where it should
    /// be bound and which group it should join.
    pub fn from_config(
        transport: T,
        config: &ServerConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ServerEvent>)> {
        let bind = config.bind_addr()?;
        let group = config.multicast_group()?;
        info!(
            bind = %bind,
            group = %group,
            interface = config.multicast_interface.as_deref().unwrap_or("any"),
            "Configuring CoIoT listener"
        );
        Self::new(transport)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn is_listening(&self) -> bool {
        self.dispatcher.is_some()
    }

    /// Bind the transport and start dispatching broadcasts.
    #[instrument(skip(self))]
    pub async fn listen(&mut self) -> Result<()> {
        if self.dispatcher.is_some() {
            return Err(self.fail(ProtocolError::TransportError(
                constants::ERR_ALREADY_LISTENING.to_string(),
            )));
        }

        let inbound = match self.inbound.take() {
            Some(inbound) => inbound,
            None => {
                return Err(self.fail(ProtocolError::TransportError(
                    constants::ERR_INBOUND_UNAVAILABLE.to_string(),
                )))
            }
        };

        if let Err(err) = self.transport.listen().await {
            self.inbound = Some(inbound);
            return Err(self.fail(err));
        }

        let (shutdown, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(dispatch(inbound, self.events.clone(), shutdown_rx));
        self.dispatcher = Some(Dispatcher { shutdown, task });

        info!("CoIoT listener started");
        self.emit(ServerEvent::Listening);
        Ok(())
    }

    /// Close the transport and stop dispatching.
    #[instrument(skip(self))]
    pub async fn close(&mut self) -> Result<()> {
        if let Err(err) = self.transport.close().await {
            return Err(self.fail(err));
        }

        if let Some(Dispatcher { shutdown, task }) = self.dispatcher.take() {
            let _ = shutdown.send(());
            match task.await {
                Ok(inbound) => self.inbound = Some(inbound),
                Err(join_err) => {
                    error!(error = %join_err, "Dispatch task failed");
                    return Err(self.fail(ProtocolError::TransportError(
                        constants::ERR_LISTENER_LOST.to_string(),
                    )));
                }
            }
        }

        info!("CoIoT listener closed");
        self.emit(ServerEvent::Close);
        Ok(())
    }

    /// Stop listening. Same as [`CoiotServer::close`].
    pub async fn unsubscribe(&mut self) -> Result<()> {
        self.close().await
    }

    fn emit(&self, event: ServerEvent) {
        // Nobody listening for events is not an error
        let _ = self.events.send(event);
    }

    fn fail(&self, err: ProtocolError) -> ProtocolError {
        warn!(error = %err, "CoIoT listener lifecycle error");
        self.emit(ServerEvent::Error(err.to_string()));
        err
    }
}

/// Dispatch inbound requests until shut down. Hands the receiver back so the
/// listener can be restarted.
async fn dispatch(
    mut inbound: InboundReceiver,
    events: mpsc::UnboundedSender<ServerEvent>,
    mut shutdown: oneshot::Receiver<()>,
) -> InboundReceiver {
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            request = inbound.recv() => match request {
                Some(request) => handle_inbound(request, &events),
                None => {
                    debug!("Inbound request source ended");
                    break;
                }
            },
        }
    }
    inbound
}

fn handle_inbound(request: InboundRequest, events: &mpsc::UnboundedSender<ServerEvent>) {
    let metrics = global_metrics();
    metrics.inbound_received();

    let InboundRequest { message, reply } = request;
    if message.code != COIOT_CODE || message.path != COIOT_STATUS_PATH {
        metrics.inbound_ignored();
        debug!(code = %message.code, path = %message.path, remote = %message.remote, "Ignoring datagram");
        return;
    }

    match decode_status(&message) {
        Ok(status) => {
            metrics.status_published();
            debug!(
                device = %status.identity.raw,
                serial = status.serial,
                remote = %message.remote,
                "Status broadcast decoded"
            );
            let _ = events.send(ServerEvent::Status { status, reply });
        }
        Err(err) => {
            metrics.decode_failure();
            warn!(remote = %message.remote, error = %err, "Dropping malformed status broadcast");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::memory::MemoryTransport;

    #[tokio::test]
    async fn test_listen_without_inbound_source_reports_it() {
        let (mut server, mut events) = CoiotServer::new(MemoryTransport::new()).unwrap();
        server.inbound = None;

        let err = server.listen().await.unwrap_err();
        assert!(
            matches!(&err, ProtocolError::TransportError(msg) if msg == constants::ERR_INBOUND_UNAVAILABLE)
        );
        assert!(!server.is_listening());

        match events.try_recv() {
            Ok(ServerEvent::Error(message)) => {
                assert!(message.contains(constants::ERR_INBOUND_UNAVAILABLE));
                assert!(!message.contains(constants::ERR_LISTENER_LOST));
            }
            other => panic!("expected an error event, got {:?}", other),
        }
    }
}
