pub mod claims;
pub mod errors;
pub mod gate;
pub mod handler;
pub mod issuer;

pub use claims::TokenClaims;
pub use errors::TokenError;
pub use gate::TokenGate;
pub use handler::JwtHandler;
pub use issuer::TokenIssuer;
