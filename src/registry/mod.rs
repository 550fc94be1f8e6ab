pub mod room;
pub mod user;

pub use room::RoomRegistry;
pub use user::UserRegistry;
