//! Metadata (MDEF) model for mdefgen.
//!
//! Parses a metadata document describing a data source's tables, virtual
//! tables, stored procedures and columns into an immutable [`Schema`], and
//! computes the [`SchemaDiff`] between two schema versions.
//!
//! ```rust,no_run
//! use mdefgen_mdef::Schema;
//!
//! let newer = Schema::load("Source_12.mdef")?;
//! let older = Schema::load("Source_11.mdef")?;
//!
//! match newer.difference(&older) {
//!     Some(diff) => println!("{} new tables", diff.tables.len()),
//!     None => println!("no difference"),
//! }
//! # Ok::<(), mdefgen_mdef::MdefError>(())
//! ```

pub mod diff;
pub mod error;
pub mod model;
pub mod schema;

pub use diff::{SchemaDiff, diff};
pub use error::{MdefError, Result};
pub use model::{AccessRule, ApiAccess, Column, LiteralKind, SqlType, StoredProcedure, Table};
pub use schema::Schema;
