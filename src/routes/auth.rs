/// Authentication Routes
///
/// Registration, login, and the current session's identity.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{CredentialStore, SessionClaims, TokenService};
use crate::error::{AppError, ErrorContext};
use crate::validators::is_valid_username;

/// Body of both register and login requests
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub username: String,
    pub issued_at: Option<String>,
    pub expires_at: Option<String>,
}

/// POST /api/register
///
/// # Errors
/// - 400: invalid username or empty password
/// - 409: username already taken
/// - 500: hashing or storage failure
pub async fn register(
    form: web::Json<CredentialsRequest>,
    credentials: web::Data<CredentialStore>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_registration");

    let username = is_valid_username(&form.username)?;
    credentials.create(&username, &form.password).await?;

    tracing::info!(
        request_id = %context.request_id,
        operation = %context.operation,
        username = %username,
        "User registered successfully"
    );

    Ok(HttpResponse::Created().json(RegisterResponse {
        message: "User registered successfully!".to_string(),
    }))
}

/// POST /api/login
///
/// # Errors
/// - 401: unknown username or wrong password, reported identically
/// - 500: storage or signing failure
pub async fn login(
    form: web::Json<CredentialsRequest>,
    credentials: web::Data<CredentialStore>,
    tokens: web::Data<TokenService>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_login").with_username(form.username.clone());

    credentials.authenticate(&form.username, &form.password).await?;
    let token = tokens.issue(&form.username)?;

    tracing::info!(
        request_id = %context.request_id,
        operation = %context.operation,
        username = ?context.username,
        "User logged in successfully"
    );

    Ok(HttpResponse::Ok().json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: tokens.ttl().num_seconds(),
    }))
}

/// GET /api/me
///
/// Identity asserted by the caller's session token (injected by `JwtMiddleware`).
pub async fn current_session(claims: web::ReqData<SessionClaims>) -> HttpResponse {
    let claims = claims.into_inner();

    HttpResponse::Ok().json(SessionResponse {
        issued_at: claims.issued_at().map(|t| t.to_rfc3339()),
        expires_at: claims.expires_at().map(|t| t.to_rfc3339()),
        username: claims.username,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    use crate::store::InMemoryAccountRepository;

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn lines_containing(&self, needle: &str) -> usize {
            let logs = self.0.lock().unwrap();
            String::from_utf8_lossy(&logs)
                .lines()
                .filter(|line| line.contains(needle))
                .count()
        }
    }

    #[actix_web::test]
    async fn test_rejected_registration_is_logged_once() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::TRACE)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let credentials =
            CredentialStore::new(Arc::new(InMemoryAccountRepository::new()), 4).unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(credentials))
                .route("/api/register", web::post().to(register)),
        )
        .await;

        for expected in [201, 409] {
            let request = test::TestRequest::post()
                .uri("/api/register")
                .set_json(serde_json::json!({"username": "alice", "password": "secret123"}))
                .to_request();
            let response = test::call_service(&app, request).await;
            assert_eq!(response.status().as_u16(), expected);
        }

        assert_eq!(logs.lines_containing("Username already taken"), 1);
    }
}
