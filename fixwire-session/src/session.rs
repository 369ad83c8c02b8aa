/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! The session task.
//!
//! One Tokio task owns everything mutable about a session: the transport,
//! the lifecycle phase, both sequence counters, and the heartbeat clock.
//! Application threads talk to it through a command mailbox, so all state
//! mutation is serialized here and no lock is held across a suspension
//! point.
//!
//! The task is a failure containment domain. Inbound protocol errors drop
//! the frame, handler panics are caught and logged, transport loss tears
//! the connection down and rearms a reconnect timer. Nothing unwinds past
//! this module.

use crate::config::{SessionConfig, SessionKey};
use crate::handler::{DisconnectReason, SessionHandler};
use crate::heartbeat::{next_test_req_id, HeartbeatClock};
use crate::registry;
use crate::sequence::{SequenceCheck, SequenceManager};
use crate::state::Phase;
use bytes::{Bytes, BytesMut};
use fixwire_codec::{display_frame, FrameEncoder, FrameParser};
use fixwire_core::error::SessionError;
use fixwire_core::message::{InboundMessage, MsgType, OutboundMessage};
use fixwire_core::types::FixTimestamp;
use fixwire_transport::{BoxedStream, Connector, FrameSplitter, TcpConnector};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::codec::Framed;
use tracing::{debug, error, info, warn};

/// Delay between the loss of a connection and the next attempt.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Commands the registry sends into a session task.
pub(crate) enum Command {
    /// Transmit a user-authored message.
    Send {
        /// The message to transmit.
        message: OutboundMessage,
        /// Receives the written bytes (SOH rendered as `|`) or the error.
        ack: oneshot::Sender<Result<String, SessionError>>,
    },
    /// Log out, close and deregister.
    Stop {
        /// Acknowledged once the session is deregistered.
        ack: oneshot::Sender<()>,
    },
}

/// How one connection attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectExit {
    /// The application stopped the session; the task must end.
    Stopped,
    /// The connection is gone; rearm the reconnect timer.
    Reconnect,
}

type SessionFramed = Framed<BoxedStream, FrameSplitter>;

/// State owned by one session task.
pub(crate) struct SessionTask {
    key: SessionKey,
    config: Arc<SessionConfig>,
    handler: Arc<dyn SessionHandler>,
    connector: Arc<dyn Connector>,
    sequences: SequenceManager,
    parser: FrameParser,
    phase: Phase,
}

impl SessionTask {
    /// Spawns the task for a validated configuration and returns nothing;
    /// the caller reaches it through the mailbox it created.
    pub(crate) fn spawn(
        config: SessionConfig,
        handler: Arc<dyn SessionHandler>,
        connector: Arc<dyn Connector>,
        commands: mpsc::Receiver<Command>,
    ) {
        let parser = FrameParser::new().with_strict_checksum(config.validate_checksum);
        let task = Self {
            key: config.session_key.clone(),
            config: Arc::new(config),
            handler,
            connector,
            sequences: SequenceManager::new(),
            parser,
            phase: Phase::Disconnected,
        };
        tokio::spawn(task.run(commands));
    }

    /// Spawns with the default TCP connector.
    pub(crate) fn spawn_tcp(
        config: SessionConfig,
        handler: Arc<dyn SessionHandler>,
        commands: mpsc::Receiver<Command>,
    ) {
        Self::spawn(config, handler, Arc::new(TcpConnector::new()), commands);
    }

    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        info!(session = %self.key, host = %self.config.host, port = self.config.port,
              "session task started");

        loop {
            match self.connect_once(&mut commands).await {
                ConnectExit::Stopped => break,
                ConnectExit::Reconnect => {
                    self.set_phase(Phase::Disconnected);
                    if self.wait_reconnect(&mut commands).await == ConnectExit::Stopped {
                        break;
                    }
                }
            }
        }

        registry::deregister(&self.key);
        info!(session = %self.key, "session task stopped");
    }

    /// One full connection: connect, log on, pump frames until the
    /// connection ends or the session is stopped.
    async fn connect_once(&mut self, commands: &mut mpsc::Receiver<Command>) -> ConnectExit {
        self.set_phase(Phase::Connecting);

        let stream = match self
            .connector
            .connect(&self.config.host, self.config.port, &self.config.transport_opts)
            .await
        {
            Ok(stream) => stream,
            Err(err) => {
                warn!(session = %self.key, host = %self.config.host,
                      port = self.config.port, error = %err, "connect failed");
                return ConnectExit::Reconnect;
            }
        };
        info!(session = %self.key, host = %self.config.host, port = self.config.port,
              "transport connected");

        let splitter = FrameSplitter::new().with_max_frame_size(self.config.max_message_size);
        let mut framed = Framed::new(stream, splitter);
        let mut clock = HeartbeatClock::new(self.config.heartbeat_interval);

        let logon_fields = match self.config.logon_strategy.build_logon_fields(&self.config) {
            Ok(fields) => fields,
            Err(err) => {
                error!(session = %self.key, error = %err, "logon strategy failed");
                return ConnectExit::Reconnect;
            }
        };
        // ResetSeqNumFlag resets our counter before tag 34 is rendered.
        if logon_fields.iter().any(|(tag, value)| *tag == 141 && value == "Y") {
            self.sequences.reset_outbound();
        }
        let body = logon_fields.iter().map(|(tag, value)| (*tag, value.as_str()));
        if let Err(err) = self
            .write_frame(&mut framed, &mut clock, &MsgType::Logon, body)
            .await
        {
            warn!(session = %self.key, error = %err, "logon send failed");
            return ConnectExit::Reconnect;
        }
        self.set_phase(Phase::LogonSent);

        let mut ticker = time::interval_at(
            time::Instant::now() + self.config.heartbeat_interval,
            self.config.heartbeat_interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                frame = framed.next() => match frame {
                    Some(Ok(frame)) => {
                        if let Some(exit) = self.handle_frame(frame, &mut framed, &mut clock).await {
                            return exit;
                        }
                    }
                    Some(Err(err)) => {
                        warn!(session = %self.key, error = %err, "transport error");
                        self.connection_lost(err.to_string()).await;
                        return ConnectExit::Reconnect;
                    }
                    None => {
                        info!(session = %self.key, "transport closed by peer");
                        self.connection_lost("transport closed".to_string()).await;
                        return ConnectExit::Reconnect;
                    }
                },

                command = commands.recv() => match command {
                    Some(Command::Send { message, ack }) => {
                        if let Some(exit) =
                            self.handle_send(message, ack, &mut framed, &mut clock).await
                        {
                            return exit;
                        }
                    }
                    Some(Command::Stop { ack }) => {
                        self.shutdown(Some((&mut framed, &mut clock))).await;
                        let _ = ack.send(());
                        return ConnectExit::Stopped;
                    }
                    None => {
                        debug!(session = %self.key, "mailbox closed, stopping");
                        return ConnectExit::Stopped;
                    }
                },

                _ = ticker.tick() => {
                    if let Some(exit) = self.handle_tick(&mut framed, &mut clock).await {
                        return exit;
                    }
                }
            }
        }
    }

    /// Sleeps out the reconnect delay while still answering the mailbox.
    async fn wait_reconnect(&mut self, commands: &mut mpsc::Receiver<Command>) -> ConnectExit {
        debug!(session = %self.key, delay_secs = RECONNECT_DELAY.as_secs(), "reconnect scheduled");
        let delay = time::sleep(RECONNECT_DELAY);
        tokio::pin!(delay);

        loop {
            tokio::select! {
                _ = &mut delay => return ConnectExit::Reconnect,

                command = commands.recv() => match command {
                    Some(Command::Send { ack, .. }) => {
                        let _ = ack.send(Err(SessionError::NotLoggedOn));
                    }
                    Some(Command::Stop { ack }) => {
                        self.shutdown(None).await;
                        let _ = ack.send(());
                        return ConnectExit::Stopped;
                    }
                    None => return ConnectExit::Stopped,
                }
            }
        }
    }

    /// Graceful stop: best-effort Logout when connected, handler upcall,
    /// deregistration.
    async fn shutdown(&mut self, connected: Option<(&mut SessionFramed, &mut HeartbeatClock)>) {
        if let Some((framed, clock)) = connected {
            self.set_phase(Phase::LoggingOut);
            if let Err(err) = self
                .write_frame(framed, clock, &MsgType::Logout, std::iter::empty::<(u32, &str)>())
                .await
            {
                debug!(session = %self.key, error = %err, "logout send failed");
            }
        }
        self.dispatch_logout(DisconnectReason::Stopped).await;
        self.set_phase(Phase::Disconnected);
        registry::deregister(&self.key);
    }

    async fn handle_send(
        &mut self,
        message: OutboundMessage,
        ack: oneshot::Sender<Result<String, SessionError>>,
        framed: &mut SessionFramed,
        clock: &mut HeartbeatClock,
    ) -> Option<ConnectExit> {
        if !self.phase.is_logged_on() {
            let _ = ack.send(Err(SessionError::NotLoggedOn));
            return None;
        }

        let msg_type = message.msg_type().clone();
        let result = self
            .write_frame(framed, clock, &msg_type, message.wire_fields())
            .await;
        match result {
            Ok(frame) => {
                let _ = ack.send(Ok(display_frame(&frame)));
                None
            }
            Err(err) => {
                let transport_down = matches!(err, SessionError::Transport(_));
                let reason = err.to_string();
                let _ = ack.send(Err(err));
                if transport_down {
                    self.connection_lost(reason).await;
                    Some(ConnectExit::Reconnect)
                } else {
                    None
                }
            }
        }
    }

    async fn handle_tick(
        &mut self,
        framed: &mut SessionFramed,
        clock: &mut HeartbeatClock,
    ) -> Option<ConnectExit> {
        if clock.heartbeat_due() {
            if let Err(err) = self
                .write_frame(framed, clock, &MsgType::Heartbeat, std::iter::empty::<(u32, &str)>())
                .await
            {
                warn!(session = %self.key, error = %err, "heartbeat send failed");
                self.connection_lost(err.to_string()).await;
                return Some(ConnectExit::Reconnect);
            }
        }

        if self.config.enforce_test_request {
            if clock.probe_timed_out() {
                warn!(session = %self.key, test_req_id = ?clock.pending_probe(),
                      "test request unanswered");
                self.connection_lost("test request unanswered".to_string()).await;
                return Some(ConnectExit::Reconnect);
            }
            if clock.probe_due() {
                let id = next_test_req_id();
                match self
                    .write_frame(framed, clock, &MsgType::TestRequest, [(112, id.as_str())])
                    .await
                {
                    Ok(_) => clock.note_probe(id),
                    Err(err) => {
                        warn!(session = %self.key, error = %err, "test request send failed");
                        self.connection_lost(err.to_string()).await;
                        return Some(ConnectExit::Reconnect);
                    }
                }
            }
        }

        None
    }

    /// Parses one frame and runs the sequencing rules.
    async fn handle_frame(
        &mut self,
        frame: BytesMut,
        framed: &mut SessionFramed,
        clock: &mut HeartbeatClock,
    ) -> Option<ConnectExit> {
        let message = match self.parser.parse(frame.freeze()) {
            Ok(message) => message,
            Err(err) => {
                // Protocol error: drop, log, never advance the counter.
                warn!(session = %self.key, error = %err, "dropping malformed frame");
                return None;
            }
        };

        debug!(session = %self.key, frame = %display_frame(message.raw()), "received frame");
        clock.record_received(
            message.msg_type() == &MsgType::Heartbeat,
            message.field_str(112),
        );

        // A Logon carrying 141=Y resets the inbound counter before the
        // sequence comparison below.
        if message.msg_type() == &MsgType::Logon && message.field_str(141) == Some("Y") {
            debug!(session = %self.key, "peer requested sequence reset");
            self.sequences.set_inbound(1);
        }

        match self.sequences.check_inbound(message.seq_num()) {
            SequenceCheck::Gap { expected, received } => {
                // Recovery policy belongs to the handler; the counter does
                // not move for frames we have not seen the predecessors of.
                warn!(session = %self.key, expected, received, "sequence gap");
                self.dispatch_session_message(message).await;
                None
            }
            SequenceCheck::Duplicate { expected, received } => {
                if message.poss_dup() {
                    debug!(session = %self.key, expected, received,
                           "possible duplicate, deferring to handler");
                    self.dispatch_session_message(message).await;
                } else {
                    debug!(session = %self.key, expected, received, "dropping duplicate frame");
                }
                None
            }
            SequenceCheck::InOrder => {
                self.sequences.advance_inbound();
                self.dispatch(message, framed, clock).await
            }
        }
    }

    /// Dispatches an in-sequence message by type.
    async fn dispatch(
        &mut self,
        message: InboundMessage,
        framed: &mut SessionFramed,
        clock: &mut HeartbeatClock,
    ) -> Option<ConnectExit> {
        let msg_type = message.msg_type().clone();
        match msg_type {
            MsgType::Logon => {
                info!(session = %self.key, "logon confirmed");
                self.set_phase(Phase::LoggedOn);
                self.dispatch_logon().await;
                None
            }
            MsgType::Heartbeat => None,
            MsgType::TestRequest => {
                let body = message
                    .field_str(112)
                    .map(|id| (112, id.to_string()))
                    .into_iter()
                    .collect::<Vec<_>>();
                let echo = body.iter().map(|(tag, value)| (*tag, value.as_str()));
                if let Err(err) = self
                    .write_frame(framed, clock, &MsgType::Heartbeat, echo)
                    .await
                {
                    warn!(session = %self.key, error = %err, "test request reply failed");
                    self.connection_lost(err.to_string()).await;
                    return Some(ConnectExit::Reconnect);
                }
                None
            }
            MsgType::ResendRequest | MsgType::Reject => {
                self.dispatch_session_message(message).await;
                None
            }
            MsgType::SequenceReset => {
                self.apply_sequence_reset(&message);
                None
            }
            MsgType::Logout => {
                let text = message.field_str(58).map(str::to_string);
                info!(session = %self.key, text = text.as_deref().unwrap_or(""), "peer logout");
                self.dispatch_logout(DisconnectReason::Logout(text)).await;
                Some(ConnectExit::Reconnect)
            }
            _ => {
                self.dispatch_app_message(message).await;
                None
            }
        }
    }

    fn apply_sequence_reset(&mut self, message: &InboundMessage) {
        let new_seq = match message.field(36).map(|f| f.as_u64()) {
            Some(Ok(value)) => value,
            _ => {
                warn!(session = %self.key, "sequence reset without usable NewSeqNo, ignoring");
                return;
            }
        };

        // GapFillFlag absent counts as a gap fill; an explicit N is the
        // peer hard-resetting the stream.
        if message.field_str(123) == Some("N") {
            info!(session = %self.key, new_seq, "sequence reset (hard)");
        } else {
            info!(session = %self.key, new_seq, "sequence reset (gap fill)");
        }
        self.sequences.set_inbound(new_seq);
    }

    /// Builds, numbers and writes one frame.
    ///
    /// Standard headers go out in the fixed order 35, 49, 56, 34, 50, 52;
    /// tag 34 carries the counter peeked before the write and the counter
    /// commits only after the transport accepted the frame.
    async fn write_frame<'a, I>(
        &mut self,
        framed: &mut SessionFramed,
        clock: &mut HeartbeatClock,
        msg_type: &MsgType,
        body: I,
    ) -> Result<Bytes, SessionError>
    where
        I: IntoIterator<Item = (u32, &'a str)>,
    {
        let seq = self.sequences.peek_outbound();

        let mut encoder = FrameEncoder::new(self.config.begin_string.as_str());
        encoder.field(35, msg_type.as_str())?;
        encoder.field(49, self.config.sender_comp_id.as_str())?;
        encoder.field(56, self.config.target_comp_id.as_str())?;
        encoder.uint_field(34, seq);
        if let Some(sub_id) = &self.config.sender_sub_id {
            encoder.field(50, sub_id)?;
        }
        encoder.field(52, &FixTimestamp::now().format(true))?;
        for (tag, value) in body {
            encoder.field(tag, value)?;
        }
        let frame = encoder.finish();

        framed
            .send(frame.clone())
            .await
            .map_err(|err| SessionError::Transport(err.to_string()))?;

        self.sequences.commit_outbound();
        clock.record_sent();
        debug!(session = %self.key, frame = %display_frame(&frame), "sent frame");
        Ok(frame)
    }

    /// Transport-loss path: handler upcall, then the caller rearms the
    /// reconnect timer. Sequence counters survive the reconnect.
    async fn connection_lost(&mut self, cause: String) {
        self.dispatch_logout(DisconnectReason::ConnectionLost(cause)).await;
        self.set_phase(Phase::Disconnected);
    }

    fn set_phase(&mut self, next: Phase) {
        if self.phase != next {
            debug!(session = %self.key, from = %self.phase, to = %next, "phase change");
            self.phase = next;
        }
    }

    async fn dispatch_logon(&self) {
        let handler = Arc::clone(&self.handler);
        let key = self.key.clone();
        let config = Arc::clone(&self.config);
        self.barrier(
            "on_logon",
            tokio::spawn(async move { handler.on_logon(key, config).await }),
        )
        .await;
    }

    async fn dispatch_app_message(&self, message: InboundMessage) {
        let handler = Arc::clone(&self.handler);
        let key = self.key.clone();
        let config = Arc::clone(&self.config);
        self.barrier(
            "on_app_message",
            tokio::spawn(async move { handler.on_app_message(key, message, config).await }),
        )
        .await;
    }

    async fn dispatch_session_message(&self, message: InboundMessage) {
        let handler = Arc::clone(&self.handler);
        let key = self.key.clone();
        let config = Arc::clone(&self.config);
        self.barrier(
            "on_session_message",
            tokio::spawn(async move { handler.on_session_message(key, message, config).await }),
        )
        .await;
    }

    async fn dispatch_logout(&self, reason: DisconnectReason) {
        let handler = Arc::clone(&self.handler);
        let key = self.key.clone();
        let config = Arc::clone(&self.config);
        self.barrier(
            "on_logout",
            tokio::spawn(async move { handler.on_logout(key, reason, config).await }),
        )
        .await;
    }

    /// Failure barrier around handler upcalls. The callback runs in its own
    /// task; a panic surfaces as a join error here and is logged with the
    /// payload instead of unwinding into the session.
    async fn barrier(&self, callback: &str, task: JoinHandle<()>) {
        if let Err(err) = task.await {
            error!(session = %self.key, callback, error = %err, "handler callback failed");
        }
    }
}
