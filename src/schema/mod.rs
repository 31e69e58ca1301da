//! Typed views over well-known container layouts.
//!
//! A schema wraps a container data source and exposes its agreed-upon
//! children through typed accessors. Schemas never apply fallbacks; absence
//! is reported as absence so flattening providers can distinguish authored
//! from inherited state.

pub mod basis_curves;
pub mod coord_sys;
pub mod implicit;
pub mod material;
pub mod mesh;
pub mod primvars;
pub mod purpose;
pub mod render_settings;
pub mod scene_globals;
pub mod visibility;
pub mod xform;

pub use basis_curves::BasisCurvesSchema;
pub use coord_sys::CoordSysBindingSchema;
pub use material::MaterialBindingsSchema;
pub use mesh::MeshSchema;
pub use primvars::{PrimvarSchema, PrimvarsSchema};
pub use purpose::PurposeSchema;
pub use render_settings::RenderSettingsSchema;
pub use scene_globals::SceneGlobalsSchema;
pub use visibility::VisibilitySchema;
pub use xform::XformSchema;
