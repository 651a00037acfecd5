//! Command implementations.

pub mod extract;
pub mod profile;
pub mod prompt;
pub mod schema;

pub use self::extract::execute_extract;
pub use self::profile::execute_profile;
pub use self::prompt::execute_prompt;
pub use self::schema::execute_schema;
