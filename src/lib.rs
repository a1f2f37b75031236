//! # Document Duplicator
//!
//! Select documents from a content store and hand them to a duplication engine.
//!
//! The core is a query resolution and selection pipeline: an operator input —
//! a free-form query or a schema-type pick — is resolved against the store,
//! the raw results are validated against the active schema and stripped of
//! drafts, and the surviving working set is offered to an external
//! duplication engine together with a capability token.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌────────────┐
//! │ Query input  │──▶│   Resolve    │──▶│   Filter    │
//! │ query / type │   │ store query │   │ schema+draft│
//! └──────────────┘   └─────────────┘   └─────┬──────┘
//!                                            │
//!                        ┌───────────────────┤
//!                        ▼                   ▼
//!                  ┌──────────┐       ┌─────────────┐
//!                  │   CLI    │       │ Duplication │
//!                  │  (ddup)  │       │   engine    │
//!                  └──────────┘       └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! ddup types                                # list schema document types
//! ddup select --query '*[_type=="article"]' # free-form selection
//! ddup select --type "Article"              # pick a type by title
//! ddup duplicate --type "Article"           # select and hand off
//! ddup serve                                # start the session server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`schema`] | Schema index: registered types, title lookup |
//! | [`store`] | Content-store HTTP client |
//! | [`resolve`] | Query executor adapter |
//! | [`filter`] | Schema-conformance and draft-exclusion passes |
//! | [`session`] | Selection session reducer |
//! | [`select`] | Selection pipeline and view states |
//! | [`duplicate`] | Duplication engine boundary |
//! | [`server`] | Session HTTP server |

pub mod config;
pub mod duplicate;
pub mod filter;
pub mod models;
pub mod resolve;
pub mod schema;
pub mod select;
pub mod server;
pub mod session;
pub mod store;
