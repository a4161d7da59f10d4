//! Services layer for the invitation-redemption workflow.

pub mod error;
mod identity;
mod signup;
mod store;

pub use error::SignupError;
pub use identity::{
    AdminApiClient, IdentityError, IdentityProvider, MockIdentityProvider, ProvisionedAccount,
};
pub use signup::SignupService;
pub use store::{Database, MemoryStore, SignupStore};
