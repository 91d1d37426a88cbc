//! Sample extraction and test-case synthesis for mdefgen.
//!
//! Baseline `SELECT *` results are parsed into a [`SampleMap`]; the
//! [`QuerySynthesizer`] turns the map (or the schema diff alone) into SQL
//! statements per [`TestCategory`], and [`TestSetDocument`] serializes them
//! for the suite runner.
//!
//! ```rust,no_run
//! use mdefgen_mdef::Schema;
//! use mdefgen_synth::{QuerySynthesizer, ResultDocument, SampleMap, SynthRng};
//!
//! let diff = Schema::load("new.mdef")?
//!     .difference(&Schema::load("old.mdef")?)
//!     .expect("new tables");
//! let results = vec![ResultDocument::load("SQL_SELECT_ALL-SQL_QUERY-1.xml")?];
//! let samples = SampleMap::extract(&diff.tables, &results)?;
//!
//! let mut synth = QuerySynthesizer::new(SynthRng::new(7));
//! for query in synth.select_top(&samples)? {
//!     println!("{query}");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod category;
pub mod document;
pub mod error;
pub mod generators;
pub mod result;
pub mod rng;
pub mod sample;

pub use category::TestCategory;
pub use document::{TestQuery, TestSetDocument, test_env_xml, test_suite_xml};
pub use error::{Result, SynthError};
pub use generators::{ProcedureCall, QuerySynthesizer, SynthesisInput};
pub use result::{ResultColumn, ResultDocument};
pub use rng::{Rng, SynthRng};
pub use sample::{ColumnSample, SampleMap, SampleValue, TableSample};
