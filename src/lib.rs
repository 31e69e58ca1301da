//! Flattening and filtering scene-index framework for renderable scene
//! graphs in pure Rust.
//!
//! A scene is exposed as a tree of prims, each carrying a nested, lazily
//! evaluated key/value data source. Filtering scene indices wrap one input
//! scene and republish a transformed view plus translated change
//! notifications; the flattening stage resolves inherited state (primvars,
//! transforms, visibility, purpose) so every prim can be queried
//! independently, with per-prim caches and fine-grained invalidation.

pub mod ds;
pub mod filter;
pub mod gf;
pub mod path;
pub mod scene;
pub mod schema;
pub mod tf;
pub mod vt;
