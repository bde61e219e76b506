// src/session/mod.rs
// Session lifecycle: token storage, cached authentication, login/logout

mod manager;
mod state;
mod token;

pub use manager::{LoginResponse, SessionManager};
pub use state::Session;
pub use token::TokenStore;
