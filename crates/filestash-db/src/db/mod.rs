pub mod file;
pub mod tag;

pub use file::PgFileRepository;
pub use tag::PgTagRepository;
