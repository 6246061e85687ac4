//! The Diagnostic error taxonomy (spec §7, SPEC_FULL.md §2.1). These are the
//! only two failures a caller of [`crate::emitter::build`] can recover from;
//! everything else the back-end can encounter is an internal invariant
//! violation and `panic!`s instead (spec §7: "They must never be reachable
//! on well-formed checker output").

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Diagnostic {
    #[error("There is no entrypoint in the target!")]
    MissingEntrypoint { target: String },

    #[error("Could not write to the output file!")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
