pub mod auth;
pub mod error;
pub mod network;

pub use auth::{ServicePrincipalTokenProvider, StaticToken, TokenProvider};
pub use error::VerifyError;
pub use network::{NetworkClient, Subnet, VirtualNetwork};
