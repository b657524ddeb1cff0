use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::auth::SessionClaims;
use crate::error::AppError;
use crate::store::MessageRepository;
use crate::validators::is_valid_message;

#[derive(Deserialize)]
pub struct PostMessageRequest {
    pub content: String,
}

/// GET /api/messages
///
/// The whole feed, oldest first.
pub async fn list_messages(
    feed: web::Data<dyn MessageRepository>,
) -> Result<HttpResponse, AppError> {
    let messages = feed.list().await?;
    Ok(HttpResponse::Ok().json(messages))
}

/// POST /api/messages
///
/// Appends a message sent by the authenticated user. The sender always comes
/// from the session token.
pub async fn post_message(
    form: web::Json<PostMessageRequest>,
    claims: web::ReqData<SessionClaims>,
    feed: web::Data<dyn MessageRepository>,
) -> Result<HttpResponse, AppError> {
    let content = is_valid_message(&form.content)?;
    let message = feed.append(&claims.username, &content).await?;

    tracing::info!(
        message_id = message.id,
        sender = %message.sender,
        "Message posted"
    );

    Ok(HttpResponse::Created().json(message))
}
