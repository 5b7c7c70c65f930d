//! # Append durability benchmark
//!
//! Measures what it costs to make sequential appends durable under each
//! combination of open flags, explicit sync calls and preallocation.
//!
//! ## Core idea
//! A strategy is pure data: how the file is opened, whether space is
//! reserved up front, and which sync follows each write. One runner executes
//! any strategy, excludes setup from the measurement, and reports how many
//! of each primitive it issued.
//!
//! ```no_run
//! use append_bench::{lookup, Runner, Options, DEFAULT_PAYLOAD};
//!
//! let runner = Runner::new(Options::default());
//! let result = runner.run(lookup("DataSync")?, 1000, DEFAULT_PAYLOAD)?;
//! println!("{result}");
//! # Ok::<(), append_bench::Error>(())
//! ```

pub mod error;
pub mod io;
pub mod options;
pub mod runner;
pub mod scratch;
pub mod strategy;

// Public re-exports for the top-level API
pub use error::{Error, Primitive, Result, SetupStage};
pub use options::{default_payload, Options, DEFAULT_PAYLOAD, DEFAULT_PREALLOCATE_LEN};
pub use runner::{run, validate_iterations, OpCounts, RunResult, Runner};
pub use strategy::{lookup, names, Preallocation, Strategy, SyncKind, CATALOGUE};
