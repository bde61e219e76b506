// src/user/mod.rs
// User profile model and the settings sync store

mod model;
mod store;

pub use model::{Favorites, User, UserSettings};
pub use store::UserStore;
