//! Request handlers for the browser-facing contract.
//!
//! Catalog and selector work is in-memory and runs inline. Anything that
//! touches the vote store runs on the blocking pool.

use std::collections::BTreeSet;

use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use ballot_core::{BallotError, BallotResult, ItemId, ResultsSnapshot, TallyEntry};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::state::{AppState, MAX_LEADERBOARD_LIMIT};

pub const VOTE_ACCEPTED_MESSAGE: &str = "Vote processed!";

#[derive(Debug, Deserialize)]
pub struct RandomImageParams {
    /// Comma-separated ids the client is already showing.
    pub exclude: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RandomImageResponse {
    pub image_id: ItemId,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoteResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct HallOfFameParams {
    pub limit: Option<usize>,
}

pub async fn random_image(
    State(state): State<AppState>,
    params: Result<Query<RandomImageParams>, QueryRejection>,
) -> Result<Json<RandomImageResponse>, ApiError> {
    let Query(params) = params.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let exclude = parse_exclude(params.exclude.as_deref())?;

    let image_id = state
        .service
        .random_item(&exclude, &mut rand::thread_rng())?;
    Ok(Json(RandomImageResponse { image_id }))
}

pub async fn save_vote(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<VoteResponse>, ApiError> {
    let Json(body) = payload.map_err(|rejection| match rejection {
        JsonRejection::MissingJsonContentType(_) => ApiError::UnsupportedMediaType,
        other => ApiError::BadRequest(other.body_text()),
    })?;
    let id = item_id_from_body(&body)?;

    let service = state.service.clone();
    let receipt = run_blocking(move || service.record_vote(id)).await?;
    tracing::info!(item_id = %receipt.item_id, votes = receipt.votes, "vote accepted");

    Ok(Json(VoteResponse {
        message: VOTE_ACCEPTED_MESSAGE.to_string(),
    }))
}

pub async fn get_results(
    State(state): State<AppState>,
) -> Result<Json<ResultsSnapshot>, ApiError> {
    let service = state.service.clone();
    let snapshot = run_blocking(move || service.snapshot()).await?;
    Ok(Json(snapshot))
}

pub async fn hall_of_fame(
    State(state): State<AppState>,
    params: Result<Query<HallOfFameParams>, QueryRejection>,
) -> Result<Json<Vec<TallyEntry>>, ApiError> {
    let Query(params) = params.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let limit = params.limit.unwrap_or(state.leaderboard_size);
    if !(1..=MAX_LEADERBOARD_LIMIT).contains(&limit) {
        return Err(ApiError::BadRequest(format!(
            "limit must be between 1 and {MAX_LEADERBOARD_LIMIT}"
        )));
    }

    let service = state.service.clone();
    let top = run_blocking(move || service.leaderboard(limit)).await?;
    Ok(Json(top))
}

pub async fn health() -> &'static str {
    "OK"
}

/// Pull `image_id` out of a vote body.
///
/// Accepts a JSON number or a digit string. A missing, null, or blank id is
/// reported as missing; anything else unparsable is malformed.
fn item_id_from_body(body: &Value) -> Result<ItemId, ApiError> {
    let raw = match body.get("image_id") {
        None | Some(Value::Null) => return Err(ApiError::MissingItemId),
        Some(Value::String(s)) if s.trim().is_empty() => return Err(ApiError::MissingItemId),
        Some(raw) => raw,
    };

    serde_json::from_value::<ItemId>(raw.clone()).map_err(|err| {
        tracing::debug!(image_id = %raw, error = %err, "unparsable image id");
        ApiError::Ballot(BallotError::malformed("Invalid image ID"))
    })
}

fn parse_exclude(raw: Option<&str>) -> Result<BTreeSet<ItemId>, ApiError> {
    let Some(raw) = raw else {
        return Ok(BTreeSet::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<ItemId>()
                .map_err(|err| ApiError::BadRequest(format!("Invalid exclude list: {err}")))
        })
        .collect()
}

/// Run a store operation on the blocking pool.
///
/// Once spawned the closure runs to completion even if the request future is
/// dropped, so an accepted vote is never half applied.
async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> BallotResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?
        .map_err(ApiError::from)
}

#[cfg(test)]
mod tests {
    use super::{item_id_from_body, parse_exclude};
    use crate::error::ApiError;
    use ballot_core::ItemId;
    use serde_json::json;

    #[test]
    fn body_accepts_numbers_and_digit_strings() {
        assert_eq!(
            item_id_from_body(&json!({"image_id": 42})).expect("number"),
            ItemId::new(42)
        );
        assert_eq!(
            item_id_from_body(&json!({"image_id": "42"})).expect("string"),
            ItemId::new(42)
        );
    }

    #[test]
    fn body_without_id_is_missing() {
        for body in [json!({}), json!({"image_id": null}), json!({"image_id": "  "}), json!([])] {
            assert!(
                matches!(item_id_from_body(&body), Err(ApiError::MissingItemId)),
                "{body}"
            );
        }
    }

    #[test]
    fn body_with_garbage_id_is_malformed() {
        for body in [
            json!({"image_id": -1}),
            json!({"image_id": 1.5}),
            json!({"image_id": "12abc"}),
            json!({"image_id": true}),
        ] {
            assert!(
                matches!(item_id_from_body(&body), Err(ApiError::Ballot(_))),
                "{body}"
            );
        }
    }

    #[test]
    fn exclude_list_parsing() {
        assert!(parse_exclude(None).expect("none").is_empty());
        assert!(parse_exclude(Some("")).expect("empty").is_empty());

        let ids = parse_exclude(Some("3, 1,,3")).expect("list");
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec![ItemId::new(1), ItemId::new(3)]);

        assert!(matches!(
            parse_exclude(Some("1,x")),
            Err(ApiError::BadRequest(_))
        ));
    }
}
