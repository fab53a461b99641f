//! Storage implementations.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::{MonthlyAnalysis, PostgresStore, SkillField};
