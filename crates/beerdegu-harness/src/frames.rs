//! Builders for server events, as the server would send them.

use beerdegu_proto::{
    AggregateResult, BeerId, BeerItem, BeerSummary, ChatMessage, Participant, RatingDraft,
    RoomState, ServerEvent, UserRating,
};

/// Roster of `(id, username)` pairs.
pub fn roster(users: &[(u64, &str)]) -> ServerEvent {
    ServerEvent::Roster(
        users
            .iter()
            .map(|&(id, name)| Participant { id, display_name: name.to_string() })
            .collect(),
    )
}

/// Catalog of `(id, name)` pairs without metadata.
pub fn catalog(beers: &[(BeerId, &str)]) -> ServerEvent {
    ServerEvent::Catalog(beers.iter().map(|&(id, name)| BeerItem::new(id, name)).collect())
}

/// Chat line.
pub fn chat(author: &str, text: &str) -> ServerEvent {
    ServerEvent::ChatMessage(ChatMessage { author: author.to_string(), text: text.to_string() })
}

/// Lifecycle update.
pub fn lifecycle(state: RoomState) -> ServerEvent {
    ServerEvent::Lifecycle { state }
}

/// Stored draft for one beer.
pub fn draft(beer_id: BeerId, draft: RatingDraft) -> ServerEvent {
    ServerEvent::DraftData { beer_id: Some(beer_id), draft }
}

/// Personal results.
pub fn user_results(ratings: Vec<RatingDraft>) -> ServerEvent {
    ServerEvent::UserResults(
        ratings
            .into_iter()
            .map(|rating| UserRating { beer: None, rating, extra: Default::default() })
            .collect(),
    )
}

/// Aggregate results of `(beer name, average)` pairs.
pub fn aggregate_results(averages: &[(&str, Option<f64>)]) -> ServerEvent {
    ServerEvent::AggregateResults(
        averages
            .iter()
            .map(|&(name, average_rating)| AggregateResult {
                beer: BeerSummary { name: name.to_string(), ..BeerSummary::default() },
                average_rating,
            })
            .collect(),
    )
}
