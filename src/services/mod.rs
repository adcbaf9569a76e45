// src/services/mod.rs
//
// Shared services module containing business logic services
// that can be used across different domain modules

pub mod aws;
pub mod email;
pub mod media;
pub mod password;
pub mod token_store;
pub mod tokens;

// Re-export commonly used types for convenience
pub use aws::AwsService;
pub use media::MediaService;
pub use token_store::RefreshTokenStore;
pub use tokens::TokenService;
