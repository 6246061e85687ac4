//! The Register model (spec §3): symbolic value-location tags, each carrying
//! exactly the data needed to print it. Registers are cheap value types —
//! freely copyable, with no lifetime of their own. Their validity is governed
//! by the temporary [`crate::stack::Stack`], not by ownership.

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::common::{Id, Name};
use crate::program::Waypoint;

/// A symbolic value location.
#[derive(Clone, Copy, PartialEq, Debug, Display, Serialize, Deserialize)]
pub enum Register {
    /// A global variable slot, printed `{source}${identifier}`.
    #[display("{_0}")]
    Global(Name),
    /// A local slot scoped to an owner (a procedure, or the synthetic
    /// `{target}$entrypoint`), printed `{source}${identifier}${local}`.
    #[display("{owner}${local}")]
    Local { owner: Name, local: Id },
    /// The *i*-th parameter slot of a procedure, printed using the Local
    /// scheme with identifier `param${index}`.
    #[display("{procedure}$param${index}")]
    Parameter { procedure: Name, index: usize },
    /// A numbered scratch slot, printed `_{index}`.
    #[display("_{_0}")]
    Temporary(usize),
    /// An inlined floating-point literal.
    #[display("{}", format_number(*_0))]
    NumberConstant(f64),
    /// An inlined color literal, printed `%RRGGBBAA`.
    #[display("%{_0:08X}")]
    ColorConstant(u32),
    /// An inlined string literal, printed quoted.
    #[display("{_0:?}")]
    StringConstant(Id),
    /// A reference to a linked building, printed as its link name.
    #[display("{_0}")]
    Link(Id),
    /// A late-bound integer, resolved to a [`Waypoint`]'s instruction index
    /// only at serialization.
    #[display("{_0}")]
    InstructionAddress(Waypoint),
    /// A hardware-defined slot, printed `@{name}`.
    #[display("@{_0}")]
    Builtin(Id),
    /// The program counter, printed `@counter`.
    #[display("@counter")]
    Counter,
    /// The null/no-value register, printed `null`.
    #[display("null")]
    Null,
}

impl Register {
    /// The local slot holding a procedure's return value.
    pub fn return_value(procedure: Name) -> Register {
        Register::Local {
            owner: procedure,
            local: Id::new("return$value".to_owned()),
        }
    }

    /// The local slot holding a procedure's return address.
    pub fn return_location(procedure: Name) -> Register {
        Register::Local {
            owner: procedure,
            local: Id::new("return$location".to_owned()),
        }
    }

    /// A hardware-defined slot named `name`, printed `@{name}`.
    pub fn builtin(name: impl AsRef<str>) -> Register {
        Register::Builtin(Id::new(name.as_ref().to_owned()))
    }

    /// Whether this register is a legitimate copy-back destination: a
    /// writable L-value slot, as opposed to a constant, address, link, or
    /// builtin value (spec §4.4.2 / §9, "volatile argument").
    pub fn is_volatile(&self) -> bool {
        matches!(
            self,
            Register::Global(_) | Register::Local { .. } | Register::Parameter { .. }
        )
    }

    /// Whether this register is a [`Register::Temporary`] with the given
    /// index — used by the Stack to decide whether it sits on top.
    pub fn temporary_index(&self) -> Option<usize> {
        match self {
            Register::Temporary(index) => Some(*index),
            _ => None,
        }
    }
}

impl Register {
    /// Renders this register the way the serialized program must: identical
    /// to the derived [`Display`] impl except for
    /// [`Register::InstructionAddress`], which prints the waypoint's
    /// resolved instruction index rather than the raw waypoint handle.
    pub fn render(&self, program: &crate::program::Program) -> String {
        match self {
            Register::InstructionAddress(waypoint) => program.resolve(*waypoint).to_string(),
            other => other.to_string(),
        }
    }
}

/// Formats a number with the least digits that preserve value equality,
/// per spec §4.1's serialization contract.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let mut text = format!("{value}");
        if !text.contains('.') && !text.contains('e') && !text.contains("inf") && !text.contains("NaN") {
            text.push_str(".0");
        }
        text
    }
}
