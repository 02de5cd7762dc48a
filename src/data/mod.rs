//! Data layer: core types, loading, aggregation and export.
//!
//! Architecture:
//! ```text
//!  data/<group>_환경데이터.csv     data/4개교_생육결과데이터.xlsx
//!        │                               │
//!        │                         ┌──────────┐
//!        │                         │ resolve   │  NFC file-name lookup
//!        │                         └──────────┘
//!        ▼                               ▼
//!   ┌──────────┐                   ┌──────────┐
//!   │  loader   │  csv → Table     │  loader   │  sheets → Table
//!   └──────────┘                   └──────────┘
//!        └──────────────┬────────────────┘
//!                       ▼
//!               ┌──────────────┐
//!               │    cache      │  Arc<Snapshot>, keyed by (path, mtime)
//!               └──────────────┘
//!                       │
//!                       ▼
//!               ┌──────────────┐
//!               │  aggregate    │  means, counts, best performer, trend
//!               └──────────────┘
//!                       │
//!                       ▼
//!            ui / export / --report
//! ```

pub mod aggregate;
pub mod cache;
pub mod error;
pub mod export;
pub mod filter;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod loader;
pub mod model;
pub mod resolve;
pub mod schema;
