//! Shared type definitions for the bizrunner action framework.
//!
//! Types defined here are shared by the runner core, the database layer, and
//! any host application, and flow downstream to `TypeScript` via `ts-rs` so
//! front ends can render action errors.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for resource identifiers
//! - [`errors`] -- [`ValidationError`], the unit of recorded failure
//! - [`status`] -- [`StatusSnapshot`], the serializable status view

pub mod errors;
pub mod ids;
pub mod status;

pub use errors::ValidationError;
pub use ids::ProjectId;
pub use status::StatusSnapshot;

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // Files are written to `bindings/` relative to the crate root.
        use ts_rs::TS;

        let _ = crate::ids::ProjectId::export_all();
        let _ = crate::errors::ValidationError::export_all();
        let _ = crate::status::StatusSnapshot::export_all();
    }
}
