//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_record_repository;
mod postgres_record_repository;

pub use in_memory_record_repository::InMemoryRecordRepository;
pub use postgres_record_repository::PostgresRecordRepository;
