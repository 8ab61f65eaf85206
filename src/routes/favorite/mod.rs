mod handler;

pub use handler::{add_favorite, get_favorites, remove_favorite};
