//! The table-driven set of built-in procedures (spec §3 items 5-13, §4.4.2
//! "Built-in procedure call", §4.4.3 "Built-in argument building").
//!
//! A built-in procedure is, from the emitter's point of view, just another
//! [`crate::semantic::Definition`] a `Call` can resolve to — it is looked up
//! by [`crate::common::Name`] exactly like a user procedure or global, via
//! [`crate::semantic::DefinitionKind::Builtin`]. What distinguishes it is how
//! its argument list becomes an [`Instruction`]: positionally, with optional
//! zero-padding up to a fixed arity and an optional fixed "dummy" operand
//! spliced in at position 1 (spec §4.4.2's "With dummy" pattern — e.g. a
//! `readCell1` builtin that hard-codes which memory cell it addresses, the
//! user only supplying the result and the address).

use serde::{Deserialize, Serialize};

use crate::common::{Id, Map};
use crate::instruction::{
    Control, ControlKind, Draw, DrawKind, Instruction, LookupKind, UnitControl, UnitControlKind,
};
use crate::register::Register;
use crate::semantic::{Definition, DefinitionKind, Source};

/// Which [`Instruction`] family a builtin constructs, and how its padded
/// positional argument list maps onto that family's fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuiltinShape {
    /// `sensor result object property` (spec §3 item 5).
    Sensor,
    /// `read result cell address` (spec §3 item 6).
    Read,
    /// `write value cell address` (spec §3 item 6).
    Write,
    /// `draw {kind} args...` (spec §3 item 7).
    Draw(DrawKind),
    /// `print value` (spec §3 item 9).
    Print,
    /// `printflush target` (spec §3 item 9).
    PrintFlush,
    /// `getlink result index` (spec §3 item 10... "Linking").
    GetLink,
    /// `control {kind} building args...` (spec §3 item 10).
    Control(ControlKind),
    /// `ucontrol {kind} args...` (spec §3 item 11).
    UnitControl(UnitControlKind),
    /// `lookup {kind} result index` (spec §3 item 12).
    Lookup(LookupKind),
    /// `wait seconds` (spec §3 item 13).
    Wait,
    /// `stop` (spec §3 item 13).
    Stop,
}

/// A single built-in procedure's calling shape: its declared arity and any
/// fixed dummy operand (spec §6.1: "Built-in procedures expose their
/// parameter count and any dummy argument").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinProcedure {
    pub arity: usize,
    pub dummy: Option<Register>,
    pub shape: BuiltinShape,
}

impl BuiltinProcedure {
    pub fn direct(arity: usize, shape: BuiltinShape) -> Self {
        BuiltinProcedure {
            arity,
            dummy: None,
            shape,
        }
    }

    pub fn with_dummy(arity: usize, dummy: Register, shape: BuiltinShape) -> Self {
        BuiltinProcedure {
            arity,
            dummy: Some(dummy),
            shape,
        }
    }

    /// Builds the instruction for a call to this builtin, given the already
    /// lowered-and-popped argument list (spec §4.4.3: lower each provided
    /// argument, pop it, pad with `Null` to arity). The dummy, if any, is
    /// spliced in between positions 0 and 1 *after* padding, per §4.4.2.
    pub fn build(&self, mut args: Vec<Register>) -> Instruction {
        while args.len() < self.arity {
            args.push(Register::Null);
        }
        if let Some(dummy) = self.dummy {
            let at = args.len().min(1);
            args.insert(at, dummy);
        }
        match self.shape {
            BuiltinShape::Sensor => Instruction::Sensor {
                result: args[0],
                object: args[1],
                property: args[2],
            },
            BuiltinShape::Read => Instruction::Read {
                result: args[0],
                cell: args[1],
                address: args[2],
            },
            BuiltinShape::Write => Instruction::Write {
                value: args[0],
                cell: args[1],
                address: args[2],
            },
            BuiltinShape::Draw(kind) => Instruction::Draw(Draw { kind, args }),
            BuiltinShape::Print => Instruction::Print { value: args[0] },
            BuiltinShape::PrintFlush => Instruction::PrintFlush { target: args[0] },
            BuiltinShape::GetLink => Instruction::GetLink {
                result: args[0],
                index: args[1],
            },
            BuiltinShape::Control(kind) => Instruction::Control(Control {
                kind,
                building: args[0],
                args: args[1..].to_vec(),
            }),
            BuiltinShape::UnitControl(kind) => Instruction::UnitControl(UnitControl { kind, args }),
            BuiltinShape::Lookup(kind) => Instruction::Lookup {
                kind,
                result: args[0],
                index: args[1],
            },
            BuiltinShape::Wait => Instruction::Wait { seconds: args[0] },
            BuiltinShape::Stop => Instruction::Stop,
        }
    }
}

/// The name of the synthetic source every builtin procedure lives under,
/// analogous to a standard-library module.
pub const STD_SOURCE: &str = "mlog";

/// Builds the `mlog` standard-library [`Source`]: one globals entry per
/// instruction family (spec §2 "a large, table-driven set of built-in
/// procedures that map to specific assembly mnemonics and argument
/// shapes"), each a [`Definition`] with empty `dependencies` and a
/// [`DefinitionKind::Builtin`] payload — exactly the shape spec §6.1
/// describes the checker handing the back-end for a built-in procedure.
/// Radar is deliberately absent here — it is resolved through
/// [`crate::semantic::Expression::RadarCall`], not a builtin [`Name`]
/// lookup, per spec §4.5's "the emitter dispatches on the semantic Call
/// target's variant identity" wording for that one family.
///
/// A real pipeline's loader (out of scope here, spec §1) would merge this
/// into the `Target` it hands the back-end under the [`STD_SOURCE`] name;
/// this crate's tests and CLI do so explicitly since there is no real
/// loader/checker in this repository.
pub fn standard_library() -> Source {
    use BuiltinShape::*;
    use ControlKind as CK;
    use DrawKind as DK;
    use LookupKind as LK;
    use UnitControlKind as UK;

    let mut globals = Map::new();
    let mut define = |identifier: &str, procedure: BuiltinProcedure| {
        globals.insert(
            Id::new(identifier.to_owned()),
            Definition {
                dependencies: Vec::new(),
                kind: DefinitionKind::Builtin(procedure),
            },
        );
    };

    define("sensor", BuiltinProcedure::direct(3, Sensor));
    define(
        "readCell1",
        BuiltinProcedure::with_dummy(2, Register::Link(Id::new("cell1".to_owned())), Read),
    );
    define(
        "writeCell1",
        BuiltinProcedure::with_dummy(2, Register::Link(Id::new("cell1".to_owned())), Write),
    );
    define("read", BuiltinProcedure::direct(3, Read));
    define("write", BuiltinProcedure::direct(3, Write));

    define("drawClear", BuiltinProcedure::direct(3, Draw(DK::Clear)));
    define("drawColor", BuiltinProcedure::direct(4, Draw(DK::Color)));
    define("drawCol", BuiltinProcedure::direct(1, Draw(DK::Col)));
    define("drawStroke", BuiltinProcedure::direct(1, Draw(DK::Stroke)));
    define("drawLine", BuiltinProcedure::direct(4, Draw(DK::Line)));
    define("drawRect", BuiltinProcedure::direct(4, Draw(DK::Rect)));
    define("drawLineRect", BuiltinProcedure::direct(4, Draw(DK::LineRect)));
    define("drawPoly", BuiltinProcedure::direct(5, Draw(DK::Poly)));
    define("drawLinePoly", BuiltinProcedure::direct(5, Draw(DK::LinePoly)));
    define("drawTriangle", BuiltinProcedure::direct(6, Draw(DK::Triangle)));
    define("drawImage", BuiltinProcedure::direct(5, Draw(DK::Image)));
    define("drawFlush", BuiltinProcedure::direct(1, Draw(DK::Flush)));
    define("drawPackColor", BuiltinProcedure::direct(5, Draw(DK::PackColor)));

    define("print", BuiltinProcedure::direct(1, Print));
    define("printflush", BuiltinProcedure::direct(1, PrintFlush));
    define("getlink", BuiltinProcedure::direct(2, GetLink));

    define("controlEnabled", BuiltinProcedure::direct(2, Control(CK::Enabled)));
    define("controlShoot", BuiltinProcedure::direct(4, Control(CK::Shoot)));
    define("controlShootp", BuiltinProcedure::direct(3, Control(CK::ShootP)));
    define("controlConfig", BuiltinProcedure::direct(2, Control(CK::Config)));
    define("controlColor", BuiltinProcedure::direct(2, Control(CK::Color)));

    define("ucontrolIdle", BuiltinProcedure::direct(1, UnitControl(UK::Idle)));
    define("ucontrolStop", BuiltinProcedure::direct(1, UnitControl(UK::Stop)));
    define("ucontrolMove", BuiltinProcedure::direct(3, UnitControl(UK::Move)));
    define(
        "ucontrolApproach",
        BuiltinProcedure::direct(4, UnitControl(UK::Approach)),
    );
    define(
        "ucontrolPathfind",
        BuiltinProcedure::direct(3, UnitControl(UK::Pathfind)),
    );
    define(
        "ucontrolAutoPathfind",
        BuiltinProcedure::direct(1, UnitControl(UK::AutoPathfind)),
    );
    define("ucontrolBoost", BuiltinProcedure::direct(2, UnitControl(UK::Boost)));
    define("ucontrolTarget", BuiltinProcedure::direct(4, UnitControl(UK::Target)));
    define(
        "ucontrolTargetp",
        BuiltinProcedure::direct(3, UnitControl(UK::TargetP)),
    );
    define(
        "ucontrolItemDrop",
        BuiltinProcedure::direct(3, UnitControl(UK::ItemDrop)),
    );
    define(
        "ucontrolItemTake",
        BuiltinProcedure::direct(4, UnitControl(UK::ItemTake)),
    );
    define(
        "ucontrolPayDrop",
        BuiltinProcedure::direct(1, UnitControl(UK::PayDrop)),
    );
    define(
        "ucontrolPayTake",
        BuiltinProcedure::direct(2, UnitControl(UK::PayTake)),
    );
    define(
        "ucontrolPayEnter",
        BuiltinProcedure::direct(1, UnitControl(UK::PayEnter)),
    );
    define("ucontrolMine", BuiltinProcedure::direct(3, UnitControl(UK::Mine)));
    define("ucontrolFlag", BuiltinProcedure::direct(2, UnitControl(UK::Flag)));
    define("ucontrolBuild", BuiltinProcedure::direct(6, UnitControl(UK::Build)));
    define(
        "ucontrolGetBlock",
        BuiltinProcedure::direct(5, UnitControl(UK::GetBlock)),
    );
    define("ucontrolWithin", BuiltinProcedure::direct(4, UnitControl(UK::Within)));
    define("ucontrolUnbind", BuiltinProcedure::direct(1, UnitControl(UK::Unbind)));

    define("lookupBlock", BuiltinProcedure::direct(2, Lookup(LK::Block)));
    define("lookupUnit", BuiltinProcedure::direct(2, Lookup(LK::Unit)));
    define("lookupItem", BuiltinProcedure::direct(2, Lookup(LK::Item)));
    define("lookupLiquid", BuiltinProcedure::direct(2, Lookup(LK::Liquid)));

    define("wait", BuiltinProcedure::direct(1, Wait));
    define("stop", BuiltinProcedure::direct(0, Stop));

    Source {
        globals,
        entrypoint: None,
    }
}
