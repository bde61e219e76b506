// src/api/endpoints.rs
// Lexi API paths

pub const JWT_VALIDATE: &str = "/api/jwt/validate";
pub const USERS_LOGIN: &str = "/api/users/login";
pub const USERS_REGISTER: &str = "/api/users/register";
pub const USERS_SETTINGS: &str = "/api/users/settings";
pub const USERS_FAVORITES: &str = "/api/users/favorites";
pub const USERS_UPDATE: &str = "/api/users/update";
pub const USERS_SECURITY: &str = "/api/users/security";
