mod entity;
mod user;

pub use entity::{
    Attributes, ENTITY_IMAGE_MAX_LEN, ENTITY_NAME_MAX_LEN, EntityKind, EntityRecord, EntityView,
    NewEntity,
};
pub use user::{
    CreateUserRequest, EMAIL_MAX_LEN, LoginRequest, NewUser, PERSON_NAME_MAX_LEN, User,
    UserProfile, UserSummary, UserView,
};
