//! # News Harness
//!
//! Ingest news article records into a document store and query them back
//! by exact-match filter or keyword relevance.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌────────────┐   ┌──────────────┐
//! │ JSON export │──▶│  normalize  │──▶│  batches   │──▶│    Store     │
//! │ / news API  │   │  (record)   │   │  (ingest)  │   │ Weaviate/mem │
//! └─────────────┘   └─────────────┘   └────────────┘   └──────┬───────┘
//!                                                             │
//!                              ensure_collection ─────────────┤
//!                                (provision)                  ▼
//!                                                      ┌────────────┐
//!                                                      │   query    │
//!                                                      │ filter/bm25│
//!                                                      └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! nh provision                       # create the collection if missing
//! nh ingest articles.json            # normalize and upload in batches
//! nh filter source BBC --limit 5     # exact-match lookup
//! nh search "tariff"                 # keyword-ranked lookup
//! nh list                            # first few records
//! nh stats                           # collection overview
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Typed errors per component |
//! | [`models`] | Core data types |
//! | [`record`] | Raw record normalization |
//! | [`store`] | Store trait and backends |
//! | [`provision`] | Collection provisioning |
//! | [`ingest`] | Batch ingestion |
//! | [`query`] | Filter, keyword, and listing lookups |
//! | [`sources`] | Raw record file loading |
//! | [`stats`] | Collection overview |

pub mod config;
pub mod error;
pub mod ingest;
pub mod models;
pub mod provision;
pub mod query;
pub mod record;
pub mod sources;
pub mod stats;
pub mod store;
