//! Storage adapters implementing the ports in [`crate::ports`].

pub mod memory_ledger_repository;
pub mod memory_user_directory;
pub mod postgres_ledger_repository;
pub mod postgres_user_directory;

pub use memory_ledger_repository::InMemoryLedgerRepository;
pub use memory_user_directory::InMemoryUserDirectory;
pub use postgres_ledger_repository::PostgresLedgerRepository;
pub use postgres_user_directory::PostgresUserDirectory;
