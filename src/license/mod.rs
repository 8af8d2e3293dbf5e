//! Catalog record mapping and the package classification rule chain.
//!
//! - [`record`] — maps raw catalog key/value records to [`PackageMetadata`](crate::models::PackageMetadata),
//!   rejecting missing or non-numeric fields.
//! - [`classifier`] — ordered rule chain deciding whether a package protects its apps,
//!   is a removal candidate, or is skipped.

pub mod classifier;
pub mod record;
