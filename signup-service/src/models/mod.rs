pub mod invitation;
pub mod user;

pub use invitation::{Invitation, Role};
pub use user::UserRecord;
