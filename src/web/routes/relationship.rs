use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::database::store::RelationshipStore;
use crate::services::mentions;
use crate::services::{FriendList, RelationshipService};

#[derive(Debug, Deserialize)]
pub struct FriendsRequest {
    #[serde(default)]
    pub friends: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListFriendRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct RequestorTargetRequest {
    #[serde(default)]
    pub requestor: String,
    #[serde(default)]
    pub target: String,
}

#[derive(Debug, Deserialize)]
pub struct RecipientsRequest {
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommonResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FriendListResponse {
    pub success: bool,
    #[serde(flatten)]
    pub list: FriendList,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecipientsResponse {
    pub success: bool,
    pub recipients: Vec<String>,
}

// Every failure is a 400; rule and store errors are not told apart here.
fn bad_request(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            success: false,
            message: message.into(),
        }),
    )
        .into_response()
}

fn ok() -> Response {
    Json(CommonResponse { success: true }).into_response()
}

fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn validate_emails(emails: &[&str]) -> Result<(), Response> {
    if emails.iter().all(|e| mentions::is_valid_email(e)) {
        Ok(())
    } else {
        Err(bad_request("INVALID_EMAIL_FORMAT"))
    }
}

fn parse_friend_pair(friends: &[String]) -> Result<(String, String), Response> {
    let [first, second, ..] = friends else {
        return Err(bad_request("AT_LEAST_TWO_EMAILS_ARE_REQUIRED"));
    };
    let (first, second) = (normalize_email(first), normalize_email(second));
    if first.is_empty() || second.is_empty() {
        return Err(bad_request("AT_LEAST_TWO_EMAILS_ARE_REQUIRED"));
    }
    validate_emails(&[&first, &second])?;
    if first == second {
        return Err(bad_request("CANNOT_TARGET_YOURSELF"));
    }
    Ok((first, second))
}

fn parse_requestor_target(req: &RequestorTargetRequest) -> Result<(String, String), Response> {
    let (requestor, target) = (normalize_email(&req.requestor), normalize_email(&req.target));
    if requestor.is_empty() || target.is_empty() {
        return Err(bad_request("REQUESTOR_AND_TARGET_ARE_REQUIRED"));
    }
    validate_emails(&[&requestor, &target])?;
    if requestor == target {
        return Err(bad_request("CANNOT_TARGET_YOURSELF"));
    }
    Ok((requestor, target))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        warn!("Rejected relationship request body: {}", rejection);
        bad_request(rejection.body_text())
    })
}

pub async fn add_friend_handler<S: RelationshipStore>(
    State(service): State<RelationshipService<S>>,
    payload: Result<Json<FriendsRequest>, JsonRejection>,
) -> Response {
    let (a, b) = match body(payload).and_then(|req| parse_friend_pair(&req.friends)) {
        Ok(pair) => pair,
        Err(resp) => return resp,
    };

    match service.add_friendship(&a, &b).await {
        Ok(()) => ok(),
        Err(e) => {
            warn!("Add friend failed for {} and {}: {}", a, b, e);
            bad_request(e.to_string())
        }
    }
}

pub async fn list_friend_handler<S: RelationshipStore>(
    State(service): State<RelationshipService<S>>,
    payload: Result<Json<ListFriendRequest>, JsonRejection>,
) -> Response {
    let req = match body(payload) {
        Ok(req) => req,
        Err(resp) => return resp,
    };
    let email = normalize_email(&req.email);
    if email.is_empty() {
        return bad_request("EMAIL_IS_REQUIRED");
    }
    if let Err(resp) = validate_emails(&[&email]) {
        return resp;
    }

    match service.list_friendships(&email).await {
        Ok(list) => Json(FriendListResponse {
            success: true,
            list,
        })
        .into_response(),
        Err(e) => {
            warn!("List friends failed for {}: {}", email, e);
            bad_request(e.to_string())
        }
    }
}

pub async fn list_common_friends_handler<S: RelationshipStore>(
    State(service): State<RelationshipService<S>>,
    payload: Result<Json<FriendsRequest>, JsonRejection>,
) -> Response {
    let (a, b) = match body(payload).and_then(|req| parse_friend_pair(&req.friends)) {
        Ok(pair) => pair,
        Err(resp) => return resp,
    };

    match service.list_common_friends(&a, &b).await {
        Ok(list) => Json(FriendListResponse {
            success: true,
            list,
        })
        .into_response(),
        Err(e) => {
            warn!("List common friends failed for {} and {}: {}", a, b, e);
            bad_request(e.to_string())
        }
    }
}

pub async fn add_subscriber_handler<S: RelationshipStore>(
    State(service): State<RelationshipService<S>>,
    payload: Result<Json<RequestorTargetRequest>, JsonRejection>,
) -> Response {
    let (requestor, target) = match body(payload).and_then(|req| parse_requestor_target(&req)) {
        Ok(pair) => pair,
        Err(resp) => return resp,
    };

    match service.add_subscriber(&requestor, &target).await {
        Ok(()) => ok(),
        Err(e) => {
            warn!("Subscribe failed for {} -> {}: {}", requestor, target, e);
            bad_request(e.to_string())
        }
    }
}

pub async fn add_block_handler<S: RelationshipStore>(
    State(service): State<RelationshipService<S>>,
    payload: Result<Json<RequestorTargetRequest>, JsonRejection>,
) -> Response {
    let (requestor, target) = match body(payload).and_then(|req| parse_requestor_target(&req)) {
        Ok(pair) => pair,
        Err(resp) => return resp,
    };

    match service.add_block(&requestor, &target).await {
        Ok(()) => ok(),
        Err(e) => {
            warn!("Block failed for {} -> {}: {}", requestor, target, e);
            bad_request(e.to_string())
        }
    }
}

pub async fn recipients_handler<S: RelationshipStore>(
    State(service): State<RelationshipService<S>>,
    payload: Result<Json<RecipientsRequest>, JsonRejection>,
) -> Response {
    let req = match body(payload) {
        Ok(req) => req,
        Err(resp) => return resp,
    };
    let sender = normalize_email(&req.sender);
    if sender.is_empty() {
        return bad_request("SENDER_IS_REQUIRED");
    }
    if let Err(resp) = validate_emails(&[&sender]) {
        return resp;
    }

    match service.recipients(&sender, &req.text).await {
        Ok(recipients) => Json(RecipientsResponse {
            success: true,
            recipients,
        })
        .into_response(),
        Err(e) => {
            warn!("Recipients lookup failed for {}: {}", sender, e);
            bad_request(e.to_string())
        }
    }
}
