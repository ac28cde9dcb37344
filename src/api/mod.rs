mod auth;
pub mod client;
pub mod session;
pub mod types;

pub use auth::{authenticate, authenticate_opt, resolve_session, AuthFailure, AuthSuccess};
pub use client::{ApiClient, ApiError, ClientConfig, SlashPolicy};
pub use session::{NoSession, Session, SessionResolver, SessionStore};
