//! The Program buffer (spec §4.1): an append-only instruction list plus a
//! table of forward-reference Waypoints, serialized line-by-line at the end.
//! Separating waypoint *allocation* from *definition* lets the emitter emit
//! forward jumps without backpatching — a Waypoint is a handle that only
//! becomes a concrete instruction index at serialization time.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::common::Map;
use crate::instruction::Instruction;

/// An opaque handle to a not-yet-necessarily-defined instruction position.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Waypoint(usize);

impl std::fmt::Display for Waypoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The ordered instruction stream plus its Waypoint→index table.
#[derive(Default, Debug)]
pub struct Program {
    instructions: Vec<Instruction>,
    waypoints: Map<Waypoint, Option<usize>>,
    next_waypoint: usize,
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }

    /// Appends an instruction. O(1).
    pub fn append(&mut self, instruction: Instruction) {
        log::trace!("program: appending instruction #{}", self.instructions.len());
        self.instructions.push(instruction);
    }

    /// Creates a new, undefined waypoint.
    pub fn waypoint(&mut self) -> Waypoint {
        let handle = Waypoint(self.next_waypoint);
        self.next_waypoint += 1;
        self.waypoints.insert(handle, None);
        handle
    }

    /// Pins `waypoint` to the index of the *next* instruction to be
    /// appended. Panics (internal invariant violation) if already defined or
    /// if the handle was never allocated by this Program.
    pub fn define(&mut self, waypoint: Waypoint) {
        let next_index = self.instructions.len();
        match self.waypoints.get_mut(&waypoint) {
            None => unreachable!("define called on a waypoint foreign to this program"),
            Some(Some(_)) => unreachable!("waypoint {waypoint} defined twice"),
            Some(slot) => {
                log::debug!("program: waypoint {waypoint} defined at index {next_index}");
                *slot = Some(next_index);
            }
        }
    }

    /// Returns the pinned index of `waypoint`. Panics if it is still
    /// undefined — every `define` must precede any `resolve` (spec §8
    /// property 3, "waypoint totality").
    pub fn resolve(&self, waypoint: Waypoint) -> usize {
        match self.waypoints.get(&waypoint) {
            Some(Some(index)) => *index,
            Some(None) => unreachable!("waypoint {waypoint} resolved before being defined"),
            None => unreachable!("resolve called on a waypoint foreign to this program"),
        }
    }

    /// The number of instructions emitted so far.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Writes one line per instruction, using the platform's line separator
    /// (spec §4.1; §5 measures reproducibility "modulo the platform's line
    /// separator").
    pub fn serialize<W: Write>(&self, mut writer: W) -> io::Result<()> {
        let line_separator = if cfg!(windows) { "\r\n" } else { "\n" };
        for instruction in &self.instructions {
            write!(writer, "{}{line_separator}", instruction.render(self))?;
        }
        Ok(())
    }

    /// Renders the whole program to a `String`, always using `\n` — useful
    /// for tests and for embedding in diagnostics, where a platform-specific
    /// separator would make assertions unportable.
    pub fn to_text(&self) -> String {
        self.instructions
            .iter()
            .map(|i| i.render(self))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
