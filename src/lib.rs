//! smapcheck: correctness harness for semantic-map and rename tooling.
//!
//! Runs a three-phase validation protocol over a corpus of test cases:
//! compile the source, check semantic-map completeness against an
//! independently produced identifier list, then rename every identifier
//! occurrence in turn and recompile. The compiler, semantic-map generator,
//! identifier lister, and rename tool are external collaborators invoked as
//! subprocesses; the harness owns only the protocol and its reporting.

pub mod cases;
pub mod error;
pub mod render;
pub mod report;
pub mod runner;
pub mod smap;
pub mod toolchain;
