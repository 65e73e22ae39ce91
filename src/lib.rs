//! # QA Knowledge Base
//!
//! Documentation-grounded context retrieval for QA test generation.
//!
//! The crate ingests free-form support documents (specs, UI/UX guides, API
//! docs) plus one reference HTML page, splits them into overlapping chunks,
//! embeds and indexes the chunks, and retrieves the most relevant chunks for
//! a natural-language query as a single formatted context string. A
//! downstream generation layer consumes that context to produce test cases
//! and automation scripts; this crate only guarantees correct chunking,
//! indexing, and deterministic ranked retrieval.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────────────┐   ┌───────────┐
//! │ Support  │──▶│ Pipeline            │──▶│  SQLite    │
//! │ docs+HTML│   │ Parse+Chunk+Embed  │   │ index dir  │
//! └──────────┘   └────────────────────┘   └─────┬─────┘
//!                                               │
//!                        query ──▶ embed ──▶ top-k ──▶ context
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! qakb build --docs ./docs --page ./checkout.html
//! qakb query "discount code rules"
//! qakb status
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`models`] | Core data types |
//! | [`error`] | Typed pipeline error kinds |
//! | [`parse`] | Support-document normalization |
//! | [`chunk`] | Sliding-window text chunking |
//! | [`embedding`] | Embedding gateway abstraction |
//! | [`store`] | Index store trait, SQLite and in-memory backends |
//! | [`ingest`] | Ingestion pipeline (full rebuild) |
//! | [`retrieve`] | Query embedding, ranking, context formatting |
//! | [`service`] | Owned knowledge-base handle |

pub mod chunk;
pub mod config;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod models;
pub mod parse;
pub mod retrieve;
pub mod service;
pub mod store;
