pub mod archive_repository;

pub use archive_repository::ArchiveRepository;
