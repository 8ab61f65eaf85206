mod handler;

pub use handler::{
    create_entity, delete_entity, favorited_by, get_entity, list_entities, update_entity,
};
