//! Domain Types

pub mod catalog;
pub mod content;
pub mod grant;
pub mod submission;
pub mod user;

pub use catalog::*;
pub use content::*;
pub use grant::*;
pub use submission::*;
pub use user::*;
