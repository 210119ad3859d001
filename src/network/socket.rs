//! WebSocket transport cho kênh chat.
//!
//! Bọc `tokio-tungstenite` thành hai nửa đọc/ghi độc lập để dùng trong
//! vòng `tokio::select!` của worker.

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use reqwest::Url;
use tokio_tungstenite::tungstenite::Message;

use crate::error::ClientResult;

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Frame đã nhận, bỏ qua binary/ping/pong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketMessage {
    Text(String),
    Close { code: u16, reason: String },
}

pub struct SocketWriter {
    sink: SplitSink<WsStream, Message>,
}

impl SocketWriter {
    pub async fn send_text(&mut self, text: String) -> ClientResult<()> {
        self.sink.send(Message::Text(text)).await?;
        Ok(())
    }

    /// Đóng sink; tungstenite gửi close frame khi đóng.
    pub async fn close(&mut self) -> ClientResult<()> {
        self.sink.close().await?;
        Ok(())
    }
}

pub struct SocketReader {
    stream: SplitStream<WsStream>,
}

impl SocketReader {
    /// `None` khi stream kết thúc.
    pub async fn recv(&mut self) -> Option<ClientResult<SocketMessage>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(SocketMessage::Text(text))),
                Ok(Message::Close(frame)) => {
                    let (code, reason) = frame
                        .map(|frame| (u16::from(frame.code), frame.reason.to_string()))
                        .unwrap_or((1005, String::new()));
                    return Some(Ok(SocketMessage::Close { code, reason }));
                }
                Ok(Message::Binary(_) | Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {
                    continue;
                }
                Err(err) => return Some(Err(err.into())),
            }
        }
    }
}

pub async fn connect(url: &Url) -> ClientResult<(SocketWriter, SocketReader)> {
    let (stream, _response) = tokio_tungstenite::connect_async(url.as_str()).await?;
    let (sink, stream) = stream.split();
    Ok((SocketWriter { sink }, SocketReader { stream }))
}
