//! Client Session Controller
//!
//! Peer-side counterpart of the gateway: one instance per logged-in user,
//! owning that user's single realtime connection. Mirrors presence, keeps
//! unread markers for chats that are not open, and drives the call
//! lifecycle through a `CallSession` that remembers the remote party
//! independently of the open chat.
//!
//! Media capture, the WebRTC peer and the ringtone are collaborators behind
//! traits; outbound events go to an mpsc queue drained by the transport.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::domain::{
    message_chat_id, message_key, CallAnswerPayload, CallDirection, CallIncomingPayload,
    CallInitiatePayload, CallLog, CallLogRepository, CallPhase, CallSession, CallTargetPayload,
    ChatId, ChatMembers, ClientEvent, HandshakePayload, MessageId, MessageRouting, ServerEvent,
    UserId,
};

/// Captured local camera/microphone tracks.
pub trait MediaStream: Send {
    fn stop(&mut self);
}

#[derive(Debug, thiserror::Error)]
#[error("media unavailable: {0}")]
pub struct MediaError(pub String);

#[async_trait]
pub trait MediaDevices: Send + Sync {
    async fn acquire(&self, video: bool) -> Result<Box<dyn MediaStream>, MediaError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerRole {
    Initiator,
    Responder,
}

#[derive(Debug, thiserror::Error)]
#[error("peer endpoint failed: {0}")]
pub struct PeerError(pub String);

/// Local WebRTC endpoint. Its local signal is reported back through
/// [`ClientSession::on_local_signal`].
pub trait PeerEndpoint: Send {
    fn signal(&mut self, remote: Value) -> Result<(), PeerError>;
    fn destroy(&mut self);
}

pub trait PeerFactory: Send + Sync {
    fn create(&self, role: PeerRole, stream: &dyn MediaStream) -> Box<dyn PeerEndpoint>;
}

/// Incoming-call ring indication.
pub trait Ringer: Send + Sync {
    fn start(&self);
    fn stop(&self);
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("a call is already in progress")]
    CallInProgress,

    #[error("no incoming call to answer")]
    NoIncomingCall,

    #[error("no active call")]
    NoActiveCall,

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Peer(#[from] PeerError),

    #[error("realtime connection closed")]
    Disconnected,
}

#[derive(Debug, Clone)]
pub struct LocalUser {
    pub id: UserId,
    pub name: String,
}

/// The chat currently open in the client.
#[derive(Debug, Clone)]
pub struct ChatContext {
    pub chat_id: ChatId,
    pub members: ChatMembers,
}

/// A message that arrived for a chat that was not open.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub message_key: Option<String>,
    pub chat_id: Option<ChatId>,
    pub message: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptState {
    Delivered,
    Seen,
}

/// Collaborators of a session.
#[derive(Clone)]
pub struct SessionDeps {
    pub media: Arc<dyn MediaDevices>,
    pub peers: Arc<dyn PeerFactory>,
    pub ringer: Arc<dyn Ringer>,
    pub call_log: Arc<dyn CallLogRepository>,
}

enum CallState {
    Idle,
    Incoming {
        session: CallSession,
        signal: Value,
    },
    Live {
        session: CallSession,
        media: Box<dyn MediaStream>,
        peer: Box<dyn PeerEndpoint>,
        signal_sent: bool,
    },
}

pub struct ClientSession {
    user: LocalUser,
    deps: SessionDeps,
    outbound: mpsc::UnboundedSender<ClientEvent>,
    connected: bool,
    online: Vec<UserId>,
    open_chat: Option<ChatContext>,
    notifications: Vec<Notification>,
    typing: HashSet<ChatId>,
    receipts: HashMap<MessageId, ReceiptState>,
    call: CallState,
}

impl ClientSession {
    pub fn new(user: LocalUser, deps: SessionDeps, outbound: mpsc::UnboundedSender<ClientEvent>) -> Self {
        Self {
            user,
            deps,
            outbound,
            connected: false,
            online: Vec::new(),
            open_chat: None,
            notifications: Vec::new(),
            typing: HashSet::new(),
            receipts: HashMap::new(),
            call: CallState::Idle,
        }
    }

    /// Send the handshake for this user on a fresh connection, then re-join
    /// the open chat's room since rooms do not survive a reconnect.
    pub fn connect(&mut self) -> Result<(), SessionError> {
        self.emit(ClientEvent::Handshake(HandshakePayload {
            user_id: self.user.id.clone(),
            name: Some(self.user.name.clone()),
        }))?;
        if let Some(room) = self.open_chat_id().cloned() {
            self.emit(ClientEvent::JoinRoom(room))?;
        }
        Ok(())
    }

    /// Open a chat: join its room and clear its unread markers.
    pub fn open_chat(&mut self, chat: ChatContext) -> Result<(), SessionError> {
        self.notifications
            .retain(|n| n.chat_id.as_ref() != Some(&chat.chat_id));
        self.typing.clear();
        let room = chat.chat_id.clone();
        self.open_chat = Some(chat);
        self.emit(ClientEvent::JoinRoom(room))
    }

    pub fn close_chat(&mut self) {
        self.open_chat = None;
        self.typing.clear();
    }

    pub async fn handle(&mut self, event: ServerEvent) -> Result<(), SessionError> {
        match event {
            ServerEvent::HandshakeAck(ack) => {
                self.connected = true;
                tracing::debug!(user_id = %ack.user_id, connection_id = %ack.connection_id, "Realtime session established");
            }
            ServerEvent::PresenceOnline(users) => self.online = users,
            ServerEvent::PresenceOffline(user) => self.online.retain(|u| *u != user),
            ServerEvent::TypingStart(chat) => {
                if self.is_open(&chat) {
                    self.typing.insert(chat);
                }
            }
            ServerEvent::TypingStop(chat) => {
                self.typing.remove(&chat);
            }
            ServerEvent::MessageReceived(message) => self.message_received(message),
            ServerEvent::DeliveryUpdate(id) => {
                self.receipts.entry(id).or_insert(ReceiptState::Delivered);
            }
            ServerEvent::SeenUpdate(id) => {
                self.receipts.insert(id, ReceiptState::Seen);
            }
            ServerEvent::CallIncoming(payload) => self.call_incoming(payload)?,
            ServerEvent::CallAccepted(signal) => self.call_accepted(signal)?,
            ServerEvent::CallRejected => self.call_rejected(),
            ServerEvent::CallLeave => self.call_left().await,
            ServerEvent::HeartbeatAck => tracing::trace!("Heartbeat acknowledged"),
        }
        Ok(())
    }

    /// Place a call. The offer goes out once the peer reports its local signal.
    pub async fn start_call(
        &mut self,
        remote: UserId,
        remote_name: Option<String>,
        is_video: bool,
    ) -> Result<(), SessionError> {
        if !matches!(self.call, CallState::Idle) {
            return Err(SessionError::CallInProgress);
        }

        let media = self.deps.media.acquire(is_video).await.map_err(|e| {
            tracing::warn!(error = %e, "Could not acquire local media for outgoing call");
            e
        })?;
        let peer = self.deps.peers.create(PeerRole::Initiator, media.as_ref());

        tracing::info!(remote_user = %remote, is_video = is_video, "Starting call");
        self.call = CallState::Live {
            session: CallSession::outgoing(self.user.id.clone(), remote, remote_name, is_video),
            media,
            peer,
            signal_sent: false,
        };
        Ok(())
    }

    /// The local peer produced its signal: send the offer or the answer.
    pub fn on_local_signal(&mut self, signal: Value) -> Result<(), SessionError> {
        let event = {
            let CallState::Live { session, signal_sent, .. } = &mut self.call else {
                return Err(SessionError::NoActiveCall);
            };
            if *signal_sent {
                tracing::debug!("Local signal already sent, ignoring");
                return Ok(());
            }
            *signal_sent = true;

            match session.direction {
                CallDirection::Outgoing => ClientEvent::CallInitiate(CallInitiatePayload {
                    target_user_id: session.remote_user_id.clone(),
                    signal,
                    caller_id: self.user.id.clone(),
                    caller_name: Some(self.user.name.clone()),
                    is_video: session.is_video,
                }),
                CallDirection::Incoming => {
                    session.mark_active(Utc::now());
                    ClientEvent::CallAnswer(CallAnswerPayload {
                        target_user_id: session.remote_user_id.clone(),
                        signal,
                    })
                }
            }
        };
        self.emit(event)
    }

    /// Answer the ringing call with a non-initiating peer.
    ///
    /// A media failure only surfaces locally; the caller is not told.
    pub async fn answer_call(&mut self) -> Result<(), SessionError> {
        let (mut session, signal) = match std::mem::replace(&mut self.call, CallState::Idle) {
            CallState::Incoming { session, signal } => (session, signal),
            other => {
                self.call = other;
                return Err(SessionError::NoIncomingCall);
            }
        };
        self.deps.ringer.stop();

        let mut media = self.deps.media.acquire(session.is_video).await.map_err(|e| {
            tracing::warn!(error = %e, caller = %session.remote_user_id, "Could not acquire local media to answer");
            e
        })?;
        let mut peer = self.deps.peers.create(PeerRole::Responder, media.as_ref());
        if let Err(e) = peer.signal(signal) {
            peer.destroy();
            media.stop();
            return Err(e.into());
        }

        session.phase = CallPhase::Connecting;
        self.call = CallState::Live {
            session,
            media,
            peer,
            signal_sent: false,
        };
        Ok(())
    }

    pub fn decline_call(&mut self) -> Result<(), SessionError> {
        match std::mem::replace(&mut self.call, CallState::Idle) {
            CallState::Incoming { session, .. } => {
                self.deps.ringer.stop();
                self.emit(ClientEvent::CallReject(CallTargetPayload {
                    target_user_id: session.remote_user_id,
                }))
            }
            other => {
                self.call = other;
                Err(SessionError::NoIncomingCall)
            }
        }
    }

    /// Hang up. `call-end` goes to the session's remote party regardless of
    /// which chat is open. Returns the call log if one was persisted.
    pub async fn end_call(&mut self) -> Result<Option<CallLog>, SessionError> {
        match std::mem::replace(&mut self.call, CallState::Idle) {
            CallState::Live { session, media, peer, .. } => {
                if let Err(e) = self.emit(ClientEvent::CallEnd(CallTargetPayload {
                    target_user_id: session.remote_user_id.clone(),
                })) {
                    tracing::warn!(error = %e, "Could not send call-end");
                }
                teardown(media, peer);
                Ok(self.persist_call_log(session).await)
            }
            ringing @ CallState::Incoming { .. } => {
                self.call = ringing;
                self.decline_call()?;
                Ok(None)
            }
            CallState::Idle => Err(SessionError::NoActiveCall),
        }
    }

    /// The transport dropped: release local resources without telling the
    /// remote party.
    pub fn transport_lost(&mut self) {
        self.connected = false;
        match std::mem::replace(&mut self.call, CallState::Idle) {
            CallState::Live { media, peer, .. } => {
                tracing::info!("Transport lost during call, releasing media");
                teardown(media, peer);
            }
            CallState::Incoming { .. } => self.deps.ringer.stop(),
            CallState::Idle => {}
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn online_users(&self) -> &[UserId] {
        &self.online
    }

    pub fn is_online(&self, user: &UserId) -> bool {
        self.online.contains(user)
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn open_chat_id(&self) -> Option<&ChatId> {
        self.open_chat.as_ref().map(|c| &c.chat_id)
    }

    pub fn is_typing(&self, chat: &ChatId) -> bool {
        self.typing.contains(chat)
    }

    pub fn receipt(&self, id: &MessageId) -> Option<ReceiptState> {
        self.receipts.get(id).copied()
    }

    /// The current call, ringing or live.
    pub fn call(&self) -> Option<&CallSession> {
        match &self.call {
            CallState::Idle => None,
            CallState::Incoming { session, .. } | CallState::Live { session, .. } => Some(session),
        }
    }

    fn is_open(&self, chat: &ChatId) -> bool {
        self.open_chat_id() == Some(chat)
    }

    fn message_received(&mut self, message: Value) {
        if MessageRouting::from_message(&message).is_some_and(|r| r.sender == self.user.id) {
            return;
        }
        let chat_id = message_chat_id(&message);
        if chat_id.as_ref().is_some_and(|c| self.is_open(c)) {
            return;
        }

        let key = message_key(&message);
        if key.is_some() && self.notifications.iter().any(|n| n.message_key == key) {
            return;
        }
        self.notifications.insert(
            0,
            Notification {
                message_key: key,
                chat_id,
                message,
            },
        );
    }

    fn call_incoming(&mut self, payload: CallIncomingPayload) -> Result<(), SessionError> {
        match &mut self.call {
            CallState::Incoming { session, signal } if session.remote_user_id == payload.caller_id => {
                tracing::debug!(caller = %payload.caller_id, "Repeated offer from ringing caller, replacing signal");
                *signal = payload.signal;
                return Ok(());
            }
            CallState::Live { session, .. } if session.remote_user_id == payload.caller_id => {
                tracing::debug!(caller = %payload.caller_id, "Offer from current call party, ignoring");
                return Ok(());
            }
            _ => {}
        }

        if !matches!(self.call, CallState::Idle) {
            tracing::info!(caller = %payload.caller_id, "Busy, rejecting incoming call");
            return self.emit(ClientEvent::CallReject(CallTargetPayload {
                target_user_id: payload.caller_id,
            }));
        }

        tracing::info!(caller = %payload.caller_id, is_video = payload.is_video, "Incoming call");
        self.call = CallState::Incoming {
            session: CallSession::incoming(
                self.user.id.clone(),
                payload.caller_id,
                payload.caller_name,
                payload.is_video,
            ),
            signal: payload.signal,
        };
        self.deps.ringer.start();
        Ok(())
    }

    fn call_accepted(&mut self, signal: Value) -> Result<(), SessionError> {
        match &mut self.call {
            CallState::Live { session, peer, .. }
                if session.direction == CallDirection::Outgoing && session.phase == CallPhase::Ringing =>
            {
                peer.signal(signal)?;
                session.mark_active(Utc::now());
                tracing::info!(remote_user = %session.remote_user_id, "Call accepted");
            }
            _ => tracing::debug!("Ignoring call-accepted without a ringing outgoing call"),
        }
        Ok(())
    }

    fn call_rejected(&mut self) {
        match std::mem::replace(&mut self.call, CallState::Idle) {
            CallState::Live { session, media, peer, .. } if session.direction == CallDirection::Outgoing => {
                tracing::info!(remote_user = %session.remote_user_id, "Call rejected");
                teardown(media, peer);
            }
            other => self.call = other,
        }
    }

    async fn call_left(&mut self) {
        match std::mem::replace(&mut self.call, CallState::Idle) {
            CallState::Live { session, media, peer, .. } => {
                tracing::info!(remote_user = %session.remote_user_id, "Remote party ended the call");
                teardown(media, peer);
                self.persist_call_log(session).await;
            }
            CallState::Incoming { session, .. } => {
                tracing::info!(caller = %session.remote_user_id, "Caller hung up before answer");
                self.deps.ringer.stop();
            }
            CallState::Idle => {}
        }
    }

    /// Persist the call log when a chat is open. Failures are logged only.
    async fn persist_call_log(&mut self, mut session: CallSession) -> Option<CallLog> {
        session.phase = CallPhase::Ended;
        let chat = self.open_chat.as_ref()?;
        let log = CallLog::ended(chat.chat_id.clone(), &session, Utc::now());

        match self.deps.call_log.log_call(&log).await {
            Ok(persisted) => {
                if let Some(message) = persisted {
                    if let Err(e) = self.emit(ClientEvent::MessageSent(message)) {
                        tracing::warn!(error = %e, "Could not relay call log message");
                    }
                }
                Some(log)
            }
            Err(e) => {
                tracing::warn!(error = %e, chat_id = %log.chat_id, "Failed to persist call log");
                None
            }
        }
    }

    fn emit(&self, event: ClientEvent) -> Result<(), SessionError> {
        tracing::trace!(event = event.event_name(), "Emitting");
        self.outbound.send(event).map_err(|_| SessionError::Disconnected)
    }
}

fn teardown(mut media: Box<dyn MediaStream>, mut peer: Box<dyn PeerEndpoint>) {
    peer.destroy();
    media.stop();
}
