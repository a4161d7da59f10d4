pub mod origin;

pub use origin::{OriginPolicy, ValidatedOrigin, origin_guard};
