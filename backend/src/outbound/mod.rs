//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL repositories using Diesel ORM
//! - **memory**: process-local repositories for development and tests
//! - **cache**: the TTL-bounded project id pool
//! - **llm**: the streaming OpenAI-compatible model client
//! - **storage**: the `cap-std` file store
//!
//! Adapters translate between domain types and infrastructure
//! representations. They contain no business logic.

pub mod cache;
pub mod llm;
pub mod memory;
pub mod persistence;
pub mod random;
pub mod storage;
