pub mod archive_service;
pub mod cli_controller;

pub use archive_service::ArchiveService;
pub use cli_controller::ejecutar_cli;
