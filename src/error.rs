/// Error Handling Module
///
/// One domain enum per concern, unified under `AppError`:
/// 1. Input validation (`ValidationError`)
/// 2. Account credentials (`CredentialError`)
/// 3. Session tokens (`TokenError`)
/// 4. Persistence (`StorageError`)
/// 5. Startup configuration (`ConfigError`)
///
/// `AppError` implements `ResponseError`, so handlers and middleware can
/// return it directly and get a structured JSON body plus a log line.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// Validation errors for input data
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyField(&'static str),
    TooLong(&'static str, usize),
    InvalidFormat(&'static str),
    SuspiciousContent(&'static str),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} is empty", field),
            ValidationError::TooLong(field, max) => {
                write!(f, "{} is too long (maximum {} characters)", field, max)
            }
            ValidationError::InvalidFormat(field) => write!(f, "{} has invalid format", field),
            ValidationError::SuspiciousContent(field) => {
                write!(f, "{} contains suspicious content", field)
            }
        }
    }
}

impl StdError for ValidationError {}

/// Account registration and password check errors
#[derive(Debug)]
pub enum CredentialError {
    AlreadyExists(String),
    NotFound,
    /// Public form of `NotFound` and a password mismatch.
    InvalidCredentials,
    HashingFailed(String),
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialError::AlreadyExists(username) => {
                write!(f, "Username already taken: {}", username)
            }
            CredentialError::NotFound => write!(f, "Account not found"),
            CredentialError::InvalidCredentials => write!(f, "Invalid credentials"),
            CredentialError::HashingFailed(msg) => write!(f, "Password hashing failed: {}", msg),
        }
    }
}

impl StdError for CredentialError {}

/// Session token errors
#[derive(Debug)]
pub enum TokenError {
    SigningFailed(String),
    Malformed(String),
    BadSignature,
    Expired,
    Missing,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::SigningFailed(msg) => write!(f, "Token signing failed: {}", msg),
            TokenError::Malformed(msg) => write!(f, "Malformed token: {}", msg),
            TokenError::BadSignature => write!(f, "Token signature mismatch"),
            TokenError::Expired => write!(f, "Token has expired"),
            TokenError::Missing => write!(f, "Missing authentication token"),
        }
    }
}

impl StdError for TokenError {}

/// Persistence errors
#[derive(Debug)]
pub enum StorageError {
    UniqueViolation(String),
    QueryExecution(String),
    ConnectionPool(String),
    LockPoisoned,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::UniqueViolation(msg) => write!(f, "Duplicate entry: {}", msg),
            StorageError::QueryExecution(msg) => write!(f, "Query error: {}", msg),
            StorageError::ConnectionPool(msg) => write!(f, "Database connection error: {}", msg),
            StorageError::LockPoisoned => write!(f, "In-memory store lock poisoned"),
        }
    }
}

impl StdError for StorageError {}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        // 23505 = unique_violation
        if let Some(db_err) = err.as_database_error() {
            if db_err.code().as_deref() == Some("23505") {
                return StorageError::UniqueViolation(db_err.message().to_string());
            }
        }

        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StorageError::ConnectionPool(err.to_string())
            }
            other => StorageError::QueryExecution(other.to_string()),
        }
    }
}

/// Configuration errors
#[derive(Debug)]
pub enum ConfigError {
    InvalidValue(String),
    ParseError(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config value: {}", msg),
            ConfigError::ParseError(msg) => write!(f, "Config parse error: {}", msg),
        }
    }
}

impl StdError for ConfigError {}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// ============================================================================
/// 2. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

#[derive(Debug)]
pub enum AppError {
    Validation(ValidationError),
    Credential(CredentialError),
    Token(TokenError),
    Storage(StorageError),
    Config(ConfigError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Credential(e) => write!(f, "{}", e),
            AppError::Token(e) => write!(f, "{}", e),
            AppError::Storage(e) => write!(f, "{}", e),
            AppError::Config(e) => write!(f, "{}", e),
        }
    }
}

impl StdError for AppError {}

// ============================================================================
// FROM IMPLEMENTATIONS
// ============================================================================

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<CredentialError> for AppError {
    fn from(err: CredentialError) -> Self {
        AppError::Credential(err)
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        AppError::Token(err)
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Storage(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// Error response structure for HTTP responses
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Human-readable error message
    pub message: String,
    /// Error code for client-side handling
    pub code: String,
    /// HTTP status code
    pub status: u16,
    /// Timestamp when error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Trait for converting errors to HTTP responses with proper logging
pub trait ErrorHandler {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse);
    fn log_error(&self, request_id: &str);
}

impl AppError {
    /// Stable status, code and client-facing message for this error.
    ///
    /// Internal detail (driver messages, bcrypt errors) never reaches the
    /// client; `NotFound` renders exactly like `InvalidCredentials`.
    fn classify(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Validation(e) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string()),

            AppError::Credential(e) => match e {
                CredentialError::AlreadyExists(_) => (
                    StatusCode::CONFLICT,
                    "ALREADY_EXISTS",
                    "Username already taken".to_string(),
                ),
                CredentialError::NotFound | CredentialError::InvalidCredentials => (
                    StatusCode::UNAUTHORIZED,
                    "INVALID_CREDENTIALS",
                    "Invalid username or password".to_string(),
                ),
                CredentialError::HashingFailed(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "HASHING_FAILED",
                    "Internal server error".to_string(),
                ),
            },

            AppError::Token(e) => match e {
                TokenError::SigningFailed(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SIGNING_FAILED",
                    "Internal server error".to_string(),
                ),
                TokenError::Expired => (
                    StatusCode::UNAUTHORIZED,
                    "TOKEN_EXPIRED",
                    "Token has expired".to_string(),
                ),
                TokenError::Malformed(_) | TokenError::BadSignature => (
                    StatusCode::UNAUTHORIZED,
                    "TOKEN_INVALID",
                    "Invalid token".to_string(),
                ),
                TokenError::Missing => (
                    StatusCode::UNAUTHORIZED,
                    "MISSING_TOKEN",
                    "Missing authentication token".to_string(),
                ),
            },

            AppError::Storage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
                "Storage error occurred".to_string(),
            ),

            AppError::Config(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIG_ERROR",
                "Server configuration error".to_string(),
            ),
        }
    }
}

impl ErrorHandler for AppError {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse) {
        let (status, code, message) = self.classify();

        let error_response = ErrorResponse::new(
            request_id.to_string(),
            message,
            code.to_string(),
            status.as_u16(),
        );

        (status, error_response)
    }

    fn log_error(&self, request_id: &str) {
        match self {
            AppError::Validation(e) => {
                tracing::warn!(request_id = request_id, error = %e, "Validation error");
            }
            AppError::Credential(CredentialError::HashingFailed(_)) => {
                tracing::error!(request_id = request_id, error = %self, "Password hashing error");
            }
            AppError::Credential(e) => {
                tracing::warn!(request_id = request_id, error = %e, "Credential rejected");
            }
            AppError::Token(TokenError::SigningFailed(_)) => {
                tracing::error!(request_id = request_id, error = %self, "Token signing error");
            }
            AppError::Token(e) => {
                tracing::warn!(request_id = request_id, error = %e, "Authentication error");
            }
            AppError::Storage(e) => {
                tracing::error!(request_id = request_id, error = %e, "Storage error");
            }
            AppError::Config(e) => {
                tracing::error!(request_id = request_id, error = %e, "Configuration error");
            }
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let request_id = uuid::Uuid::new_v4().to_string();
        self.log_error(&request_id);

        let (status, error_response) = <Self as ErrorHandler>::error_response(self, &request_id);

        HttpResponse::build(status).json(error_response)
    }

    fn status_code(&self) -> StatusCode {
        self.classify().0
    }
}

// ============================================================================
// 4. ERROR CONTEXT ENRICHMENT
// ============================================================================

/// Per-operation context carried through a handler for correlated logging.
/// Failures are logged by `ResponseError::error_response`, not here.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub request_id: String,
    pub username: Option<String>,
    pub operation: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            username: None,
            operation: operation.into(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}
