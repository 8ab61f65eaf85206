mod handler;

pub(crate) use handler::load_user_view;
pub use handler::{create_user, delete_user, get_user, list_users, login};
