//! Backend routes consumed by the client.

pub const RECIPES: &str = "/recipes";
pub const INGREDIENTS: &str = "/ingredients";
pub const REGISTER: &str = "/register";
pub const LOGOUT: &str = "/logout";
