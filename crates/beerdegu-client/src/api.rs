//! REST client for the rooms API.
//!
//! Only the calls a room session needs: the membership preflight, plus the
//! lobby operations the shell exposes. Every request carries
//! `Authorization: Token <token>` from the injected [`AuthSession`].

use std::time::Duration;

use beerdegu_core::{AuthSession, Membership, Role};
use beerdegu_proto::{BeerId, BeerItem, RoomState};
use reqwest::{Client, Method, RequestBuilder, Response, header::AUTHORIZATION};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use url::Url;

use crate::error::ApiError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Page<T> {
    /// Total number of items across pages.
    pub count: u64,
    /// URL of the next page.
    pub next: Option<String>,
    /// URL of the previous page.
    pub previous: Option<String>,
    /// Items on this page.
    pub results: Vec<T>,
}

/// A user as the REST API renders it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserRef {
    /// User ID.
    pub id: u64,
    /// Login name.
    pub username: String,
}

/// Lobby listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoomSummary {
    /// Room ID.
    pub id: u64,
    /// Room code, used in every room URL.
    pub name: String,
    /// Joining requires a password.
    #[serde(default)]
    pub has_password: bool,
    /// Room owner.
    pub host: Option<UserRef>,
    /// Participant limit.
    pub slots: u32,
    /// Lifecycle stage.
    pub state: RoomState,
    /// Participants currently in the room.
    #[serde(default)]
    pub users_count: u32,
}

/// Parameters for a new room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRoom {
    /// Room code.
    pub name: String,
    /// Join password. Empty for an open room.
    pub password: String,
    /// Participant limit. The backend picks one when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slots: Option<u32>,
}

#[derive(Deserialize)]
struct MembershipBody {
    is_host: bool,
    #[serde(default)]
    token: Option<String>,
}

#[derive(Serialize)]
struct JoinBody<'a> {
    password: &'a str,
}

#[derive(Serialize)]
struct BeerBody {
    beer_id: BeerId,
}

/// Authenticated rooms API client. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RoomsApi {
    client: Client,
    base_url: Url,
    auth: AuthSession,
}

impl RoomsApi {
    /// Client for the backend at `base_url`.
    ///
    /// # Errors
    ///
    /// - `ClientBuilder` if the TLS stack cannot be initialized.
    pub fn new(base_url: &Url, auth: AuthSession) -> Result<Self, ApiError> {
        let client =
            Client::builder().timeout(REQUEST_TIMEOUT).build().map_err(ApiError::ClientBuilder)?;
        Ok(Self { client, base_url: base_url.clone(), auth })
    }

    /// Preflight: is the caller a member of `room`, and as what?
    ///
    /// # Errors
    ///
    /// - `NotMember` for any non-2xx answer. The caller belongs in the lobby.
    pub async fn check_membership(&self, room: &str) -> Result<Membership, ApiError> {
        let url = self.room_url(room, &["in"])?;
        let path = url.path().to_string();

        let response = self.request(Method::GET, url).send().await.map_err(|source| {
            ApiError::RequestSend { path: path.clone(), source }
        })?;
        let status = response.status();
        if !status.is_success() {
            tracing::info!(room, %status, "membership check refused");
            return Err(ApiError::NotMember { room: room.to_string(), status });
        }

        let body: MembershipBody = decode(response, path).await?;
        Ok(Membership { role: Role::from_host_flag(body.is_host), socket_token: body.token })
    }

    /// First page of the lobby listing.
    pub async fn list_rooms(&self) -> Result<Page<RoomSummary>, ApiError> {
        let url = self.api_url(&["rooms"])?;
        let path = url.path().to_string();
        let response = execute(self.request(Method::GET, url), &path).await?;
        decode(response, path).await
    }

    /// First page of beers matching `query`, for picking what to add to a
    /// room.
    pub async fn search_beers(&self, query: &str) -> Result<Page<BeerItem>, ApiError> {
        let mut url = self.api_url(&["beers"])?;
        url.query_pairs_mut().append_pair("search", query);
        let path = url.path().to_string();
        let response = execute(self.request(Method::GET, url), &path).await?;
        decode(response, path).await
    }

    /// Create a room hosted by the caller.
    pub async fn create_room(&self, room: &NewRoom) -> Result<(), ApiError> {
        let url = self.api_url(&["rooms"])?;
        let path = url.path().to_string();
        execute(self.request(Method::POST, url).json(room), &path).await?;
        Ok(())
    }

    /// Join `room`, with its password if it has one.
    pub async fn join_room(&self, room: &str, password: &str) -> Result<(), ApiError> {
        let url = self.room_url(room, &["join"])?;
        let path = url.path().to_string();
        let request = self.request(Method::PUT, url).json(&JoinBody { password });
        execute(request, &path).await?;
        Ok(())
    }

    /// Leave `room`.
    pub async fn leave_room(&self, room: &str) -> Result<(), ApiError> {
        let url = self.room_url(room, &["leave"])?;
        let path = url.path().to_string();
        execute(self.request(Method::DELETE, url), &path).await?;
        Ok(())
    }

    /// Add a beer to the room's catalog. Host only.
    ///
    /// Connected sessions only see the change after
    /// [`beerdegu_app::RoomHandle::refresh_catalog`].
    pub async fn add_beer(&self, room: &str, beer_id: BeerId) -> Result<(), ApiError> {
        let url = self.room_url(room, &["beers"])?;
        let path = url.path().to_string();
        execute(self.request(Method::PUT, url).json(&BeerBody { beer_id }), &path).await?;
        Ok(())
    }

    /// Remove a beer from the room's catalog. Host only.
    pub async fn remove_beer(&self, room: &str, beer_id: BeerId) -> Result<(), ApiError> {
        let mut url = self.room_url(room, &["beers"])?;
        url.query_pairs_mut().append_pair("id", &beer_id.to_string());
        let path = url.path().to_string();
        execute(self.request(Method::DELETE, url), &path).await?;
        Ok(())
    }

    /// Download the finished room's report document.
    pub async fn download_report(&self, room: &str) -> Result<Vec<u8>, ApiError> {
        let url = self.room_url(room, &["report"])?;
        let path = url.path().to_string();
        let response = execute(self.request(Method::GET, url), &path).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|source| ApiError::DecodeResponse { path, source })?;
        Ok(bytes.to_vec())
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client.request(method, url).header(AUTHORIZATION, self.auth.authorization())
    }

    /// `/api/<segments>/`, with every segment percent-encoded.
    fn api_url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push("api")
            .extend(segments)
            .push("");
        Ok(url)
    }

    fn room_url(&self, room: &str, tail: &[&str]) -> Result<Url, ApiError> {
        let mut segments = vec!["rooms", room];
        segments.extend_from_slice(tail);
        self.api_url(&segments)
    }
}

async fn execute(request: RequestBuilder, path: &str) -> Result<Response, ApiError> {
    let response = request
        .send()
        .await
        .map_err(|source| ApiError::RequestSend { path: path.to_string(), source })?;

    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ApiError::RequestStatus { path: path.to_string(), status })
    }
}

async fn decode<T: DeserializeOwned>(response: Response, path: String) -> Result<T, ApiError> {
    response.json::<T>().await.map_err(|source| ApiError::DecodeResponse { path, source })
}
