pub mod files;
pub mod tag_validator;
pub mod tags;
