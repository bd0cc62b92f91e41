pub mod config;
pub mod domain;
pub mod inbound;
pub mod outbound;

pub use domain::credential;
pub use outbound::cache;
pub use outbound::repositories;
