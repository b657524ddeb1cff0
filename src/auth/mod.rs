/// Authentication module
///
/// Credential storage with bcrypt hashing, and stateless session tokens
/// (HS256 JWTs) with passive expiry.

mod claims;
mod credentials;
mod jwt;
mod password;

pub use claims::SessionClaims;
pub use credentials::CredentialStore;
pub use jwt::TokenService;
pub use password::hash_password;
pub use password::verify_password;
pub use password::MAX_PASSWORD_BYTES;
