use std::future::{Future, pending};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::common::{
    ChannelEvent, ChannelId, Credential, InboundFrame, NetworkCommand, NetworkEvent,
    OutboundFrame, SessionId, SessionOutcome,
};
use crate::error::{ClientError, ClientResult};

use super::rest::ApiClient;
use super::socket::{self, SocketMessage, SocketReader, SocketWriter};

/// Trạng thái kênh chat: tối đa một kết nối mở tại một thời điểm.
enum Channel {
    Closed,
    Open(OpenChannel),
}

struct OpenChannel {
    id: ChannelId,
    writer: SocketWriter,
    reader: SocketReader,
}

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Kết quả bắt tay WebSocket, gửi về vòng lặp chính từ task kết nối.
struct ConnectOutcome {
    channel: ChannelId,
    result: ClientResult<(SocketWriter, SocketReader)>,
}

/// Thực thi lệnh mạng từ UI và đẩy kết quả ngược lên dưới dạng sự kiện.
///
/// REST và bắt tay WebSocket chạy trong task riêng nên chỉ treo thao tác
/// khởi tạo nó; socket đã mở được đọc ngay trong vòng lặp chính.
pub struct NetworkWorker {
    api: ApiClient,
    event_sender: mpsc::Sender<NetworkEvent>,
    command_receiver: mpsc::Receiver<NetworkCommand>,
    channel: Channel,
    /// Kênh mới nhất đang bắt tay; kết quả của id khác bị bỏ.
    connecting: Option<ChannelId>,
    connect_timeout: Duration,
    connect_sender: mpsc::Sender<ConnectOutcome>,
    connect_receiver: mpsc::Receiver<ConnectOutcome>,
}

impl NetworkWorker {
    pub fn new(
        api: ApiClient,
        event_sender: mpsc::Sender<NetworkEvent>,
        command_receiver: mpsc::Receiver<NetworkCommand>,
    ) -> Self {
        let (connect_sender, connect_receiver) = mpsc::channel(8);
        Self {
            api,
            event_sender,
            command_receiver,
            channel: Channel::Closed,
            connecting: None,
            connect_timeout: CONNECT_TIMEOUT,
            connect_sender,
            connect_receiver,
        }
    }

    #[cfg(test)]
    fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub async fn run(mut self) {
        log::info!("Network worker started");

        loop {
            tokio::select! {
                command = self.command_receiver.recv() => {
                    if let Some(command) = command {
                        self.handle_command(command).await;
                    } else {
                        break;
                    }
                }
                Some(outcome) = self.connect_receiver.recv() => {
                    self.handle_connected(outcome).await;
                }
                (channel, incoming) = next_incoming(&mut self.channel) => {
                    self.handle_incoming(channel, incoming).await;
                }
            }
        }

        self.close_channel().await;
        log::info!("Network worker stopped");
    }

    async fn handle_command(&mut self, command: NetworkCommand) {
        match command {
            NetworkCommand::Login { email, password } => {
                let api = self.api.clone();
                self.spawn_request(async move {
                    Some(match api.login(&email, &password).await {
                        Ok(credential) => {
                            log::info!("Login succeeded");
                            NetworkEvent::LoggedIn(credential)
                        }
                        Err(err) => NetworkEvent::LoginFailed(err.user_message("Login failed")),
                    })
                });
            }
            NetworkCommand::Signup {
                username,
                email,
                password,
            } => {
                let api = self.api.clone();
                self.spawn_request(async move {
                    Some(match api.signup(&username, &email, &password).await {
                        Ok(()) => NetworkEvent::SignedUp,
                        Err(err) => NetworkEvent::SignupFailed(err.user_message("Signup failed")),
                    })
                });
            }
            NetworkCommand::FetchProfile(auth) => {
                let api = self.api.clone();
                self.spawn_session(auth.session, async move {
                    match api.profile(&auth.credential).await {
                        Ok(profile) => Some(SessionOutcome::ProfileLoaded(profile)),
                        Err(err) => {
                            log::warn!("Failed to load profile: {err}");
                            None
                        }
                    }
                });
            }
            NetworkCommand::FetchFriends(auth) => {
                let api = self.api.clone();
                self.spawn_session(auth.session, async move {
                    Some(match api.list_friends(&auth.credential).await {
                        Ok(friends) => SessionOutcome::FriendsLoaded(friends),
                        Err(err) => {
                            log::warn!("Failed to load friends: {err}");
                            SessionOutcome::FriendsUnavailable
                        }
                    })
                });
            }
            NetworkCommand::FetchIncomingRequests(auth) => {
                let api = self.api.clone();
                self.spawn_session(auth.session, async move {
                    Some(match api.incoming_requests(&auth.credential).await {
                        Ok(requests) => SessionOutcome::IncomingLoaded(requests),
                        Err(err) => {
                            log::warn!("Failed to load incoming requests: {err}");
                            SessionOutcome::IncomingUnavailable
                        }
                    })
                });
            }
            NetworkCommand::RespondToRequest {
                auth,
                sender_id,
                action,
            } => {
                let api = self.api.clone();
                self.spawn_session(auth.session, async move {
                    Some(
                        match api
                            .respond_to_request(&auth.credential, sender_id, action)
                            .await
                        {
                            Ok(_) => SessionOutcome::RequestResolved { sender_id, action },
                            Err(err) => SessionOutcome::ActionFailed(
                                err.user_message("Error responding to friend request"),
                            ),
                        },
                    )
                });
            }
            NetworkCommand::RemoveFriend { auth, friend_id } => {
                let api = self.api.clone();
                self.spawn_session(auth.session, async move {
                    Some(match api.remove_friend(&auth.credential, friend_id).await {
                        Ok(_) => SessionOutcome::FriendRemoved { friend_id },
                        Err(err) => {
                            SessionOutcome::ActionFailed(err.user_message("Error removing friend"))
                        }
                    })
                });
            }
            NetworkCommand::SearchUsers { auth, query } => {
                let api = self.api.clone();
                self.spawn_session(auth.session, async move {
                    Some(match api.search_users(&auth.credential, &query).await {
                        Ok(users) => SessionOutcome::SearchResults(users),
                        Err(err) => {
                            SessionOutcome::ActionFailed(err.user_message("User search failed"))
                        }
                    })
                });
            }
            NetworkCommand::SendFriendRequest { auth, receiver_id } => {
                let api = self.api.clone();
                self.spawn_session(auth.session, async move {
                    Some(
                        match api.send_friend_request(&auth.credential, receiver_id).await {
                            Ok(message) => SessionOutcome::FriendRequestSent {
                                receiver_id,
                                message: message
                                    .unwrap_or_else(|| "Friend request sent.".to_string()),
                            },
                            Err(err) => SessionOutcome::ActionFailed(
                                err.user_message("Error sending friend request"),
                            ),
                        },
                    )
                });
            }
            NetworkCommand::CancelFriendRequest { auth, receiver_id } => {
                let api = self.api.clone();
                self.spawn_session(auth.session, async move {
                    Some(
                        match api.cancel_friend_request(&auth.credential, receiver_id).await {
                            Ok(message) => SessionOutcome::FriendRequestCancelled {
                                receiver_id,
                                message: message
                                    .unwrap_or_else(|| "Friend request canceled.".to_string()),
                            },
                            Err(err) => SessionOutcome::ActionFailed(
                                err.user_message("Error cancelling friend request"),
                            ),
                        },
                    )
                });
            }
            NetworkCommand::OpenSocket {
                channel,
                credential,
            } => {
                self.close_channel().await;
                self.start_connect(channel, &credential).await;
            }
            NetworkCommand::CloseSocket => self.close_channel().await,
            NetworkCommand::SendFrame { channel, frame } => {
                if let Err(err) = self.send_frame(channel, &frame).await {
                    log::warn!("Failed to send frame on channel {channel}: {err}");
                    self.emit(NetworkEvent::Channel {
                        channel,
                        event: ChannelEvent::Error(err.to_string()),
                    })
                    .await;
                }
            }
        }
    }

    async fn start_connect(&mut self, channel: ChannelId, credential: &Credential) {
        let url = match self.api.endpoints().chat_socket(credential.as_str()) {
            Ok(url) => url,
            Err(err) => {
                self.report_failed(channel, err).await;
                return;
            }
        };

        self.connecting = Some(channel);
        let sender = self.connect_sender.clone();
        let limit = self.connect_timeout;
        tokio::spawn(async move {
            let result = match tokio::time::timeout(limit, socket::connect(&url)).await {
                Ok(result) => result,
                Err(_) => Err(ClientError::ConnectTimeout(limit)),
            };
            if sender.send(ConnectOutcome { channel, result }).await.is_err() {
                log::debug!("Worker stopped before chat channel {channel} connected");
            }
        });
    }

    async fn handle_connected(&mut self, outcome: ConnectOutcome) {
        let ConnectOutcome { channel, result } = outcome;
        if self.connecting != Some(channel) {
            log::debug!("Discarding connect result for superseded chat channel {channel}");
            if let Ok((mut writer, _reader)) = result {
                if let Err(err) = writer.close().await {
                    log::debug!("Closing superseded chat channel {channel} returned: {err}");
                }
            }
            return;
        }

        self.connecting = None;
        match result {
            Ok((writer, reader)) => {
                log::info!("Chat channel {channel} open");
                self.channel = Channel::Open(OpenChannel {
                    id: channel,
                    writer,
                    reader,
                });
                self.emit(NetworkEvent::Channel {
                    channel,
                    event: ChannelEvent::Opened,
                })
                .await;
            }
            Err(err) => self.report_failed(channel, err).await,
        }
    }

    async fn report_failed(&self, channel: ChannelId, err: ClientError) {
        log::warn!("Chat channel {channel} failed to open: {err}");
        self.emit(NetworkEvent::Channel {
            channel,
            event: ChannelEvent::Failed(err.to_string()),
        })
        .await;
    }

    /// Đóng kênh đang mở và bỏ mọi lần bắt tay còn dang dở.
    async fn close_channel(&mut self) {
        self.connecting = None;
        if let Channel::Open(mut open) = std::mem::replace(&mut self.channel, Channel::Closed) {
            if let Err(err) = open.writer.close().await {
                log::debug!("Closing chat channel {} returned: {err}", open.id);
            }
            log::info!("Chat channel {} closed", open.id);
        }
    }

    async fn send_frame(&mut self, channel: ChannelId, frame: &OutboundFrame) -> ClientResult<()> {
        let Channel::Open(open) = &mut self.channel else {
            return Err(ClientError::NotConnected);
        };
        if open.id != channel {
            return Err(ClientError::NotConnected);
        }
        let text = frame.to_json()?;
        log::debug!("-> channel {channel}: {text}");
        open.writer.send_text(text).await
    }

    async fn handle_incoming(
        &mut self,
        channel: ChannelId,
        incoming: Option<ClientResult<SocketMessage>>,
    ) {
        match incoming {
            Some(Ok(SocketMessage::Text(text))) => match InboundFrame::parse(&text) {
                Ok(frame) => {
                    log::debug!("<- channel {channel}: {text}");
                    self.emit(NetworkEvent::Channel {
                        channel,
                        event: ChannelEvent::Frame(frame),
                    })
                    .await;
                }
                Err(err) => log::warn!("Dropping unparseable frame on channel {channel}: {err}"),
            },
            Some(Ok(SocketMessage::Close { code, reason })) => {
                log::info!("Chat channel {channel} closed by server ({code} {reason})");
                self.mark_closed(channel).await;
            }
            Some(Err(err)) => {
                log::warn!("Chat channel {channel} read error: {err}");
                self.emit(NetworkEvent::Channel {
                    channel,
                    event: ChannelEvent::Error(err.to_string()),
                })
                .await;
                self.mark_closed(channel).await;
            }
            None => {
                log::info!("Chat channel {channel} stream ended");
                self.mark_closed(channel).await;
            }
        }
    }

    async fn mark_closed(&mut self, channel: ChannelId) {
        self.channel = Channel::Closed;
        self.emit(NetworkEvent::Channel {
            channel,
            event: ChannelEvent::Closed,
        })
        .await;
    }

    async fn emit(&self, event: NetworkEvent) {
        if let Err(err) = self.event_sender.send(event).await {
            log::warn!("Failed to notify UI: {err}");
        }
    }

    fn spawn_request<F>(&self, request: F)
    where
        F: Future<Output = Option<NetworkEvent>> + Send + 'static,
    {
        let sender = self.event_sender.clone();
        tokio::spawn(async move {
            if let Some(event) = request.await {
                if let Err(err) = sender.send(event).await {
                    log::warn!("Failed to notify UI: {err}");
                }
            }
        });
    }

    fn spawn_session<F>(&self, session: SessionId, request: F)
    where
        F: Future<Output = Option<SessionOutcome>> + Send + 'static,
    {
        self.spawn_request(async move {
            request
                .await
                .map(|outcome| NetworkEvent::Session { session, outcome })
        });
    }
}

async fn next_incoming(channel: &mut Channel) -> (ChannelId, Option<ClientResult<SocketMessage>>) {
    match channel {
        Channel::Open(open) => (open.id, open.reader.recv().await),
        Channel::Closed => pending().await,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::{SinkExt, StreamExt};
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;
    use tokio::time::timeout;
    use tokio_tungstenite::tungstenite::Message;
    use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::common::{Authed, ChatMessage};
    use crate::config::Endpoints;

    struct Harness {
        commands: mpsc::Sender<NetworkCommand>,
        events: mpsc::Receiver<NetworkEvent>,
    }

    impl Harness {
        fn start(api_base: &str) -> Self {
            Self::start_with_timeout(api_base, CONNECT_TIMEOUT)
        }

        fn start_with_timeout(api_base: &str, connect_timeout: Duration) -> Self {
            let (cmd_tx, cmd_rx) = mpsc::channel(16);
            let (event_tx, event_rx) = mpsc::channel(16);
            let api = ApiClient::new(Endpoints::parse(api_base).unwrap());
            let worker =
                NetworkWorker::new(api, event_tx, cmd_rx).with_connect_timeout(connect_timeout);
            tokio::spawn(worker.run());
            Self {
                commands: cmd_tx,
                events: event_rx,
            }
        }

        async fn send(&self, command: NetworkCommand) {
            self.commands.send(command).await.unwrap();
        }

        async fn next_event(&mut self) -> NetworkEvent {
            timeout(Duration::from_secs(5), self.events.recv())
                .await
                .expect("timed out waiting for worker event")
                .expect("worker dropped event channel")
        }
    }

    fn auth(session: SessionId) -> Authed {
        Authed {
            session,
            credential: Credential::new("tok"),
        }
    }

    #[tokio::test]
    async fn login_success_and_failure_become_events() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "t1"})))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Nope"})))
            .mount(&server)
            .await;

        let mut harness = Harness::start(&server.uri());
        let login = NetworkCommand::Login {
            email: "a@gmail.com".to_string(),
            password: "pw".to_string(),
        };

        harness.send(login.clone()).await;
        assert_eq!(
            harness.next_event().await,
            NetworkEvent::LoggedIn(Credential::new("t1"))
        );

        harness.send(login).await;
        assert_eq!(
            harness.next_event().await,
            NetworkEvent::LoginFailed("Nope".to_string())
        );
    }

    #[tokio::test]
    async fn failed_friend_list_is_tagged_with_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/friends/list"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut harness = Harness::start(&server.uri());
        harness.send(NetworkCommand::FetchFriends(auth(4))).await;
        assert_eq!(
            harness.next_event().await,
            NetworkEvent::Session {
                session: 4,
                outcome: SessionOutcome::FriendsUnavailable,
            }
        );
    }

    #[tokio::test]
    async fn failed_profile_is_logged_without_event() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Expired"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/friends/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let mut harness = Harness::start(&server.uri());
        harness.send(NetworkCommand::FetchProfile(auth(2))).await;
        harness.send(NetworkCommand::FetchFriends(auth(2))).await;
        assert_eq!(
            harness.next_event().await,
            NetworkEvent::Session {
                session: 2,
                outcome: SessionOutcome::FriendsLoaded(Vec::new()),
            }
        );
        assert!(
            timeout(Duration::from_millis(300), harness.events.recv())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn failed_remove_uses_generic_message_without_detail() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/friends/remove/7"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let mut harness = Harness::start(&server.uri());
        harness
            .send(NetworkCommand::RemoveFriend {
                auth: auth(1),
                friend_id: 7,
            })
            .await;
        assert_eq!(
            harness.next_event().await,
            NetworkEvent::Session {
                session: 1,
                outcome: SessionOutcome::ActionFailed("Error removing friend".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn send_frame_without_channel_reports_error() {
        let mut harness = Harness::start("http://127.0.0.1:9");
        harness
            .send(NetworkCommand::SendFrame {
                channel: 3,
                frame: OutboundFrame::History { friend_id: 1 },
            })
            .await;
        assert_eq!(
            harness.next_event().await,
            NetworkEvent::Channel {
                channel: 3,
                event: ChannelEvent::Error(ClientError::NotConnected.to_string()),
            }
        );
    }

    #[tokio::test]
    async fn unreachable_socket_reports_failed() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut harness = Harness::start(&format!("http://{addr}"));
        harness
            .send(NetworkCommand::OpenSocket {
                channel: 1,
                credential: Credential::new("tok"),
            })
            .await;
        let event = harness.next_event().await;
        assert!(matches!(
            event,
            NetworkEvent::Channel {
                channel: 1,
                event: ChannelEvent::Failed(_)
            }
        ));
    }

    #[tokio::test]
    async fn socket_round_trip_and_server_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (uri_tx, uri_rx) = oneshot::channel::<String>();
        let (received_tx, received_rx) = oneshot::channel::<String>();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_hdr_async(
                stream,
                move |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
                    let _ = uri_tx.send(request.uri().to_string());
                    Ok(response)
                },
            )
            .await
            .unwrap();

            if let Some(Ok(Message::Text(text))) = ws.next().await {
                let _ = received_tx.send(text.to_string());
            }
            ws.send(Message::text("garbage")).await.unwrap();
            ws.send(Message::text(
                json!({"type": "message", "from": 1, "to": 7, "content": "hi",
                       "timestamp": "2024-05-01T10:00:00+00:00"})
                .to_string(),
            ))
            .await
            .unwrap();
            ws.send(Message::text(json!({"error": "You are not friends with this user"}).to_string()))
                .await
                .unwrap();
            ws.close(None).await.unwrap();
        });

        let mut harness = Harness::start(&format!("http://{addr}"));
        harness
            .send(NetworkCommand::OpenSocket {
                channel: 1,
                credential: Credential::new("tok"),
            })
            .await;
        assert_eq!(
            harness.next_event().await,
            NetworkEvent::Channel {
                channel: 1,
                event: ChannelEvent::Opened
            }
        );
        assert_eq!(uri_rx.await.unwrap(), "/chat/ws?token=tok");

        harness
            .send(NetworkCommand::SendFrame {
                channel: 1,
                frame: OutboundFrame::Message {
                    to: 7,
                    content: "hi".to_string(),
                },
            })
            .await;
        assert_eq!(
            received_rx.await.unwrap(),
            r#"{"type":"message","to":7,"content":"hi"}"#
        );

        // Frame "garbage" bị bỏ qua, frame kế tiếp vẫn được chuyển lên.
        assert_eq!(
            harness.next_event().await,
            NetworkEvent::Channel {
                channel: 1,
                event: ChannelEvent::Frame(InboundFrame::Message(ChatMessage {
                    from: 1,
                    to: Some(7),
                    content: "hi".to_string(),
                    timestamp: Some("2024-05-01T10:00:00+00:00".to_string()),
                })),
            }
        );
        assert_eq!(
            harness.next_event().await,
            NetworkEvent::Channel {
                channel: 1,
                event: ChannelEvent::Frame(InboundFrame::Error(
                    "You are not friends with this user".to_string()
                )),
            }
        );
        assert_eq!(
            harness.next_event().await,
            NetworkEvent::Channel {
                channel: 1,
                event: ChannelEvent::Closed
            }
        );
    }

    #[tokio::test]
    async fn reopening_closes_previous_channel() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (first_closed_tx, first_closed_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let (first, _) = listener.accept().await.unwrap();
            let mut first = tokio_tungstenite::accept_async(first).await.unwrap();
            let (second, _) = listener.accept().await.unwrap();
            let _second = tokio_tungstenite::accept_async(second).await.unwrap();

            loop {
                match first.next().await {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    Some(Ok(_)) => continue,
                }
            }
            let _ = first_closed_tx.send(());
            // Giữ kết nối thứ hai cho tới khi test kết thúc.
            std::future::pending::<()>().await;
        });

        let mut harness = Harness::start(&format!("http://{addr}"));
        for channel in [1, 2] {
            harness
                .send(NetworkCommand::OpenSocket {
                    channel,
                    credential: Credential::new("tok"),
                })
                .await;
            assert_eq!(
                harness.next_event().await,
                NetworkEvent::Channel {
                    channel,
                    event: ChannelEvent::Opened
                }
            );
        }

        timeout(Duration::from_secs(5), first_closed_rx)
            .await
            .expect("first channel was not closed")
            .unwrap();

        // Frame cho kênh cũ không được gửi trên kênh mới.
        harness
            .send(NetworkCommand::SendFrame {
                channel: 1,
                frame: OutboundFrame::History { friend_id: 2 },
            })
            .await;
        assert_eq!(
            harness.next_event().await,
            NetworkEvent::Channel {
                channel: 1,
                event: ChannelEvent::Error(ClientError::NotConnected.to_string()),
            }
        );
    }

    /// Trả `[]` cho mọi request REST nhưng không bao giờ trả lời bắt tay
    /// WebSocket trên `/chat/ws`.
    async fn stalling_socket_server() -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut stalled = Vec::new();
            loop {
                let (mut stream, _) = listener.accept().await.unwrap();
                let mut buf = vec![0u8; 4096];
                let mut read = 0;
                while !buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = stream.read(&mut buf[read..]).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    read += n;
                }
                if buf[..read].starts_with(b"GET /chat/ws") {
                    stalled.push(stream);
                    continue;
                }
                stream
                    .write_all(
                        b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\n\
                          content-length: 2\r\nconnection: close\r\n\r\n[]",
                    )
                    .await
                    .unwrap();
            }
        });
        addr
    }

    /// Chấp nhận một kết nối WebSocket và báo khi nhận được close frame.
    async fn socket_server_reporting_close(
        handshake_delay: Duration,
    ) -> (std::net::SocketAddr, oneshot::Receiver<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (closed_tx, closed_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(handshake_delay).await;
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            loop {
                match ws.next().await {
                    Some(Ok(Message::Close(_))) => break,
                    Some(Ok(_)) => continue,
                    None | Some(Err(_)) => return,
                }
            }
            let _ = closed_tx.send(());
        });
        (addr, closed_rx)
    }

    #[tokio::test]
    async fn stalled_handshake_does_not_block_rest_and_times_out() {
        let addr = stalling_socket_server().await;
        let connect_timeout = Duration::from_secs(1);
        let mut harness = Harness::start_with_timeout(&format!("http://{addr}"), connect_timeout);

        harness
            .send(NetworkCommand::OpenSocket {
                channel: 1,
                credential: Credential::new("tok"),
            })
            .await;
        harness.send(NetworkCommand::FetchFriends(auth(1))).await;
        assert_eq!(
            harness.next_event().await,
            NetworkEvent::Session {
                session: 1,
                outcome: SessionOutcome::FriendsLoaded(Vec::new()),
            }
        );
        assert_eq!(
            harness.next_event().await,
            NetworkEvent::Channel {
                channel: 1,
                event: ChannelEvent::Failed(
                    ClientError::ConnectTimeout(connect_timeout).to_string()
                ),
            }
        );
    }

    #[tokio::test]
    async fn close_socket_sends_close_frame_and_rejects_frames() {
        let (addr, closed_rx) = socket_server_reporting_close(Duration::ZERO).await;
        let mut harness = Harness::start(&format!("http://{addr}"));
        harness
            .send(NetworkCommand::OpenSocket {
                channel: 1,
                credential: Credential::new("tok"),
            })
            .await;
        assert_eq!(
            harness.next_event().await,
            NetworkEvent::Channel {
                channel: 1,
                event: ChannelEvent::Opened
            }
        );

        harness.send(NetworkCommand::CloseSocket).await;
        timeout(Duration::from_secs(5), closed_rx)
            .await
            .expect("server never saw a close frame")
            .unwrap();

        harness
            .send(NetworkCommand::SendFrame {
                channel: 1,
                frame: OutboundFrame::History { friend_id: 7 },
            })
            .await;
        assert_eq!(
            harness.next_event().await,
            NetworkEvent::Channel {
                channel: 1,
                event: ChannelEvent::Error(ClientError::NotConnected.to_string()),
            }
        );
    }

    #[tokio::test]
    async fn connection_finishing_after_close_is_discarded() {
        let (addr, closed_rx) = socket_server_reporting_close(Duration::from_millis(300)).await;
        let mut harness = Harness::start(&format!("http://{addr}"));
        harness
            .send(NetworkCommand::OpenSocket {
                channel: 1,
                credential: Credential::new("tok"),
            })
            .await;
        harness.send(NetworkCommand::CloseSocket).await;

        // Kết nối muộn được đóng lại thay vì được cài làm kênh hiện tại.
        timeout(Duration::from_secs(5), closed_rx)
            .await
            .expect("late connection was not closed")
            .unwrap();

        harness
            .send(NetworkCommand::SendFrame {
                channel: 1,
                frame: OutboundFrame::History { friend_id: 7 },
            })
            .await;
        assert_eq!(
            harness.next_event().await,
            NetworkEvent::Channel {
                channel: 1,
                event: ChannelEvent::Error(ClientError::NotConnected.to_string()),
            }
        );
    }
}
