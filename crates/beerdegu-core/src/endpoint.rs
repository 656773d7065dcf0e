//! Per-room socket endpoint.

use std::fmt;

use url::{Position, Url};

use crate::error::ConnectionError;

/// Socket URL for one room: `{base}/ws/room/{code}/?token={token}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomEndpoint {
    url: Url,
    room_code: String,
}

impl RoomEndpoint {
    /// Build the endpoint for `room_code` under `ws_base`.
    ///
    /// # Errors
    ///
    /// - `InvalidEndpoint` if the base is not a `ws`/`wss` URL that can carry
    ///   a path, or the room code is blank.
    pub fn new(
        ws_base: &str,
        room_code: &str,
        token: Option<&str>,
    ) -> Result<Self, ConnectionError> {
        let room_code = room_code.trim();
        if room_code.is_empty() {
            return Err(ConnectionError::InvalidEndpoint("room code is empty".into()));
        }

        let mut url =
            Url::parse(ws_base).map_err(|e| ConnectionError::InvalidEndpoint(e.to_string()))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(ConnectionError::InvalidEndpoint(format!(
                "unsupported scheme {:?}",
                url.scheme()
            )));
        }

        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                ConnectionError::InvalidEndpoint(format!("{ws_base} cannot be a base"))
            })?;
            segments.pop_if_empty().extend(["ws", "room", room_code, ""]);
        }

        url.set_query(None);
        if let Some(token) = token {
            url.query_pairs_mut().append_pair("token", token);
        }

        Ok(Self { url, room_code: room_code.to_string() })
    }

    /// Full URL to dial.
    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Room code the endpoint points at.
    pub fn room_code(&self) -> &str {
        &self.room_code
    }
}

impl fmt::Display for RoomEndpoint {
    /// Prints the URL without the query so tokens stay out of logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url[..Position::AfterPath])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_room_path_with_token() {
        let endpoint = RoomEndpoint::new("ws://127.0.0.1:8000", "ABCD", Some("t0k")).unwrap();
        assert_eq!(endpoint.url(), "ws://127.0.0.1:8000/ws/room/ABCD/?token=t0k");
        assert_eq!(endpoint.room_code(), "ABCD");
    }

    #[test]
    fn keeps_base_path() {
        let endpoint = RoomEndpoint::new("wss://beerdegu.example/live/", "R1", None).unwrap();
        assert_eq!(endpoint.url(), "wss://beerdegu.example/live/ws/room/R1/");
    }

    #[test]
    fn escapes_room_code() {
        let endpoint = RoomEndpoint::new("ws://localhost", "a/b", None).unwrap();
        assert_eq!(endpoint.url(), "ws://localhost/ws/room/a%2Fb/");
    }

    #[test]
    fn display_hides_token() {
        let endpoint = RoomEndpoint::new("ws://localhost:8000", "ABCD", Some("secret")).unwrap();
        assert_eq!(endpoint.to_string(), "ws://localhost:8000/ws/room/ABCD/");
    }

    #[test]
    fn rejects_bad_input() {
        assert!(RoomEndpoint::new("http://localhost", "ABCD", None).is_err());
        assert!(RoomEndpoint::new("not a url", "ABCD", None).is_err());
        assert!(RoomEndpoint::new("ws://localhost", "  ", None).is_err());
    }
}
