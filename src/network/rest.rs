use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::common::{Credential, Friend, FriendAction, FriendRequest, UserProfile, UserSummary};
use crate::config::Endpoints;
use crate::error::{ClientError, ClientResult};

/// HTTP client cho API bên ngoài. Mỗi thao tác là đúng một request,
/// không retry, không timeout ngoài mặc định của transport.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    endpoints: Endpoints,
}

#[derive(Deserialize)]
struct TokenBody {
    access_token: String,
}

#[derive(Deserialize)]
struct MessageBody {
    #[serde(default)]
    message: Option<String>,
}

impl ApiClient {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            http: Client::new(),
            endpoints,
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub async fn signup(&self, username: &str, email: &str, password: &str) -> ClientResult<()> {
        let request = self.http.post(self.endpoints.api("auth/signup")?).json(&json!({
            "username": username,
            "email": email,
            "password": password,
        }));
        send(request).await?;
        Ok(())
    }

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<Credential> {
        let request = self.http.post(self.endpoints.api("auth/login")?).json(&json!({
            "email": email,
            "password": password,
        }));
        let body: TokenBody = read_json(send(request).await?).await?;
        Ok(Credential::new(body.access_token))
    }

    pub async fn profile(&self, credential: &Credential) -> ClientResult<UserProfile> {
        let request = self.authed(self.http.get(self.endpoints.api("users/me")?), credential);
        read_json(send(request).await?).await
    }

    pub async fn list_friends(&self, credential: &Credential) -> ClientResult<Vec<Friend>> {
        let request = self.authed(self.http.get(self.endpoints.api("friends/list")?), credential);
        read_json(send(request).await?).await
    }

    pub async fn incoming_requests(
        &self,
        credential: &Credential,
    ) -> ClientResult<Vec<FriendRequest>> {
        let url = self.endpoints.api("friends/requests/incoming")?;
        let request = self.authed(self.http.get(url), credential);
        read_json(send(request).await?).await
    }

    pub async fn respond_to_request(
        &self,
        credential: &Credential,
        sender_id: i64,
        action: FriendAction,
    ) -> ClientResult<Option<String>> {
        let url = self.endpoints.api("friends/respond")?;
        let request = self
            .authed(self.http.post(url), credential)
            .json(&json!({ "sender_id": sender_id, "action": action.as_str() }));
        read_message(send(request).await?).await
    }

    pub async fn remove_friend(
        &self,
        credential: &Credential,
        friend_id: i64,
    ) -> ClientResult<Option<String>> {
        let url = self.endpoints.api(&format!("friends/remove/{friend_id}"))?;
        let request = self.authed(self.http.delete(url), credential);
        read_message(send(request).await?).await
    }

    /// Tìm theo một phần username. Server trả 404 khi không có kết quả.
    pub async fn search_users(
        &self,
        credential: &Credential,
        query: &str,
    ) -> ClientResult<Vec<UserSummary>> {
        let url = self.endpoints.api("users/search")?;
        let request = self
            .authed(self.http.get(url), credential)
            .query(&[("username", query)]);
        match send(request).await {
            Ok(response) => read_json(response).await,
            Err(err) if err.status() == Some(404) => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }

    pub async fn send_friend_request(
        &self,
        credential: &Credential,
        receiver_id: i64,
    ) -> ClientResult<Option<String>> {
        let url = self.endpoints.api("friends/request")?;
        let request = self
            .authed(self.http.post(url), credential)
            .json(&json!({ "receiver_id": receiver_id }));
        read_message(send(request).await?).await
    }

    pub async fn cancel_friend_request(
        &self,
        credential: &Credential,
        receiver_id: i64,
    ) -> ClientResult<Option<String>> {
        let url = self
            .endpoints
            .api(&format!("friends/request/cancel/{receiver_id}"))?;
        let request = self.authed(self.http.delete(url), credential);
        read_message(send(request).await?).await
    }

    fn authed(&self, request: RequestBuilder, credential: &Credential) -> RequestBuilder {
        request.bearer_auth(credential.as_str())
    }
}

async fn send(request: RequestBuilder) -> ClientResult<Response> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    log::warn!("API request failed with {status}");
    Err(api_error(status, &body))
}

fn api_error(status: StatusCode, body: &str) -> ClientError {
    ClientError::Api {
        status: status.as_u16(),
        message: extract_detail(body),
    }
}

/// Lấy `detail` từ body lỗi: chuỗi, hoặc danh sách lỗi validation (`msg`).
pub fn extract_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::String(detail) if !detail.trim().is_empty() => Some(detail.clone()),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn read_message(response: Response) -> ClientResult<Option<String>> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice::<MessageBody>(&bytes)
        .ok()
        .and_then(|body| body.message))
}
