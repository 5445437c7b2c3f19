pub mod config;
pub mod observability;
pub mod path;
pub mod path_validation;

pub use path_validation::{is_path_valid, read_whole_file, validate_path, PathError, TrustMode};
