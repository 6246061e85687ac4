//! The Instruction IR (spec §3): a closed sum of instruction variants with
//! typed operand roles. Every operand is a [`Register`] — the emitter never
//! places literal syntax into an instruction field, which keeps printing
//! purely structural (spec §3, "Invariant (operand kinds)").
//!
//! Large families (radar, draw, unit control) are reified as single records
//! with a `kind` sub-enum and a fixed argument list rather than one variant
//! per mnemonic, per spec §4.5/§9's implementation guidance.

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::common::Name;
use crate::program::{Program, Waypoint};
use crate::register::Register;

/// Binary arithmetic/logic/comparison operator codes (spec §3 item 2).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Display, Serialize, Deserialize)]
pub enum BinaryOpKind {
    #[display("add")]
    Add,
    #[display("sub")]
    Sub,
    #[display("mul")]
    Mul,
    #[display("div")]
    Div,
    #[display("idiv")]
    IDiv,
    #[display("mod")]
    Mod,
    #[display("shl")]
    Shl,
    #[display("shr")]
    Shr,
    #[display("and")]
    And,
    #[display("or")]
    Or,
    #[display("xor")]
    Xor,
    #[display("equal")]
    Equal,
    #[display("notEqual")]
    NotEqual,
    #[display("strictEqual")]
    StrictEqual,
    #[display("lessThan")]
    LessThan,
    #[display("lessThanEq")]
    LessThanEq,
    #[display("greaterThan")]
    GreaterThan,
    #[display("greaterThanEq")]
    GreaterThanEq,
}

/// Unary operator codes (spec §3 item 2). Promotion/negation/logical-not are
/// expressed as [`BinaryOpKind`] against a literal zero (spec §4.4.2); this
/// is the one dedicated unary opcode.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Display)]
pub enum UnaryOpKind {
    #[display("not")]
    Not,
}

/// Jump variants (spec §3 item 3). `goal` is always a [`Waypoint`].
#[derive(Clone, Copy, Debug)]
pub enum Jump {
    Always(Waypoint),
    IfTrue(Waypoint, Register),
    IfFalse(Waypoint, Register),
}

/// Display-primitive sub-mnemonics (spec §3 item 7).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Display)]
pub enum DrawKind {
    #[display("clear")]
    Clear,
    #[display("color")]
    Color,
    #[display("col")]
    Col,
    #[display("stroke")]
    Stroke,
    #[display("line")]
    Line,
    #[display("rect")]
    Rect,
    #[display("linerect")]
    LineRect,
    #[display("poly")]
    Poly,
    #[display("linepoly")]
    LinePoly,
    #[display("triangle")]
    Triangle,
    #[display("image")]
    Image,
    #[display("flush")]
    Flush,
    #[display("packcolor")]
    PackColor,
}

/// A display-primitive instruction: `draw {kind} {args...}`.
#[derive(Clone, Debug)]
pub struct Draw {
    pub kind: DrawKind,
    pub args: Vec<Register>,
}

/// Control sub-mnemonics (spec §3 item 10).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Display)]
pub enum ControlKind {
    #[display("enabled")]
    Enabled,
    #[display("shoot")]
    Shoot,
    #[display("shootp")]
    ShootP,
    #[display("config")]
    Config,
    #[display("color")]
    Color,
}

/// A building-control instruction: `control {kind} {building} {args...}`.
#[derive(Clone, Debug)]
pub struct Control {
    pub kind: ControlKind,
    pub building: Register,
    pub args: Vec<Register>,
}

/// Unit-control sub-mnemonics (spec §3 item 11).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Display)]
pub enum UnitControlKind {
    #[display("idle")]
    Idle,
    #[display("stop")]
    Stop,
    #[display("move")]
    Move,
    #[display("approach")]
    Approach,
    #[display("pathfind")]
    Pathfind,
    #[display("autopathfind")]
    AutoPathfind,
    #[display("boost")]
    Boost,
    #[display("target")]
    Target,
    #[display("targetp")]
    TargetP,
    #[display("itemdrop")]
    ItemDrop,
    #[display("itemtake")]
    ItemTake,
    #[display("paydrop")]
    PayDrop,
    #[display("paytake")]
    PayTake,
    #[display("payenter")]
    PayEnter,
    #[display("mine")]
    Mine,
    #[display("flag")]
    Flag,
    #[display("build")]
    Build,
    #[display("getblock")]
    GetBlock,
    #[display("within")]
    Within,
    #[display("unbind")]
    Unbind,
}

/// A unit-control instruction: `ucontrol {kind} {args...}`.
#[derive(Clone, Debug)]
pub struct UnitControl {
    pub kind: UnitControlKind,
    pub args: Vec<Register>,
}

/// Lookup-table sub-mnemonics (spec §3 item 12).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Display)]
pub enum LookupKind {
    #[display("block")]
    Block,
    #[display("unit")]
    Unit,
    #[display("item")]
    Item,
    #[display("liquid")]
    Liquid,
}

/// Radar target filters (spec §4.5). Canonical ordering is mandatory:
/// `{enemy, ally, player, attacker, flying, boss, ground}`, padded with
/// `any`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Display, Serialize, Deserialize)]
pub enum Filter {
    #[display("any")]
    Any,
    #[display("enemy")]
    Enemy,
    #[display("ally")]
    Ally,
    #[display("player")]
    Player,
    #[display("attacker")]
    Attacker,
    #[display("flying")]
    Flying,
    #[display("boss")]
    Boss,
    #[display("ground")]
    Ground,
}

impl Filter {
    /// The canonical ordering rank (spec §4.5): lower sorts first. `Any`
    /// only ever appears in padding, so its rank is irrelevant to ordering
    /// real filters against each other.
    fn rank(self) -> u8 {
        match self {
            Filter::Any => u8::MAX,
            Filter::Enemy => 0,
            Filter::Ally => 1,
            Filter::Player => 2,
            Filter::Attacker => 3,
            Filter::Flying => 4,
            Filter::Boss => 5,
            Filter::Ground => 6,
        }
    }
}

/// Radar sort metrics (spec §4.5).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Display, Serialize, Deserialize)]
pub enum Metric {
    #[display("distance")]
    Distance,
    #[display("health")]
    Health,
    #[display("shield")]
    Shield,
    #[display("armor")]
    Armor,
    #[display("maxHealth")]
    MaxHealth,
}

/// A radar search instruction: `radar {f1} {f2} {f3} {metric} {building}
/// {order} {result}`. Always constructed through [`Radar::new`], which
/// enforces the canonical filter ordering and `any`-padding (spec §8
/// property 5).
#[derive(Clone, Copy, Debug)]
pub struct Radar {
    pub filters: [Filter; 3],
    pub metric: Metric,
    pub building: Register,
    pub order: Register,
    pub result: Register,
}

impl Radar {
    /// Builds a radar instruction from up to three *requested* filters,
    /// arranging them into canonical order and padding unused slots with
    /// `Any`. `requested` may contain fewer than three filters, or
    /// duplicates (a duplicate collapses to one canonical slot, with the
    /// rest padded as `Any`), but never more than three distinct filters.
    pub fn new(
        requested: &[Filter],
        metric: Metric,
        building: Register,
        order: Register,
        result: Register,
    ) -> Self {
        let mut distinct: Vec<Filter> = Vec::new();
        for f in requested {
            if *f != Filter::Any && !distinct.contains(f) {
                distinct.push(*f);
            }
        }
        assert!(
            distinct.len() <= 3,
            "radar filter set must contain at most 3 distinct non-any filters"
        );
        distinct.sort_by_key(|f| f.rank());
        let mut filters = [Filter::Any; 3];
        for (slot, f) in filters.iter_mut().zip(distinct.into_iter()) {
            *slot = f;
        }
        Radar {
            filters,
            metric,
            building,
            order,
            result,
        }
    }
}

/// The closed instruction sum (spec §3).
#[derive(Clone, Debug)]
pub enum Instruction {
    Set {
        target: Register,
        source: Register,
    },
    Binary {
        op: BinaryOpKind,
        target: Register,
        left: Register,
        right: Register,
    },
    Unary {
        op: UnaryOpKind,
        target: Register,
        operand: Register,
    },
    Jump(Jump),
    End,
    Sensor {
        result: Register,
        object: Register,
        property: Register,
    },
    Read {
        result: Register,
        cell: Register,
        address: Register,
    },
    Write {
        value: Register,
        cell: Register,
        address: Register,
    },
    Draw(Draw),
    Print {
        value: Register,
    },
    PrintFlush {
        target: Register,
    },
    GetLink {
        result: Register,
        index: Register,
    },
    Control(Control),
    UnitControl(UnitControl),
    Lookup {
        kind: LookupKind,
        result: Register,
        index: Register,
    },
    Wait {
        seconds: Register,
    },
    Stop,
    Radar(Radar),
}

impl Instruction {
    /// Convenience constructor for the common "write a return value then
    /// jump to the caller's return address" tail every procedure body
    /// implicitly gets (spec §4.3 step 7).
    pub fn implicit_return(procedure: Name) -> [Instruction; 2] {
        [
            Instruction::Set {
                target: Register::return_value(procedure),
                source: Register::Null,
            },
            Instruction::Set {
                target: Register::Counter,
                source: Register::return_location(procedure),
            },
        ]
    }

    /// Renders this instruction's assembly line, resolving any Waypoint
    /// operands against `program` (spec §4.1's serialization contract).
    pub fn render(&self, program: &Program) -> String {
        let r = |reg: &Register| reg.render(program);
        match self {
            Instruction::Set { target, source } => format!("set {} {}", r(target), r(source)),
            Instruction::Binary {
                op,
                target,
                left,
                right,
            } => format!("op {op} {} {} {}", r(target), r(left), r(right)),
            Instruction::Unary {
                op,
                target,
                operand,
            } => format!("op {op} {} {} 0", r(target), r(operand)),
            Instruction::Jump(jump) => match jump {
                Jump::Always(goal) => format!("jump {} always", program.resolve(*goal)),
                Jump::IfTrue(goal, cond) => {
                    format!("jump {} equal true {}", program.resolve(*goal), r(cond))
                }
                Jump::IfFalse(goal, cond) => {
                    format!("jump {} equal false {}", program.resolve(*goal), r(cond))
                }
            },
            Instruction::End => "end".to_string(),
            Instruction::Sensor {
                result,
                object,
                property,
            } => format!("sensor {} {} {}", r(result), r(object), r(property)),
            Instruction::Read {
                result,
                cell,
                address,
            } => format!("read {} {} {}", r(result), r(cell), r(address)),
            Instruction::Write {
                value,
                cell,
                address,
            } => format!("write {} {} {}", r(value), r(cell), r(address)),
            Instruction::Draw(draw) => {
                let args = draw.args.iter().map(r).collect::<Vec<_>>().join(" ");
                format!("draw {} {args}", draw.kind)
            }
            Instruction::Print { value } => format!("print {}", r(value)),
            Instruction::PrintFlush { target } => format!("printflush {}", r(target)),
            Instruction::GetLink { result, index } => format!("getlink {} {}", r(result), r(index)),
            Instruction::Control(control) => {
                let args = control.args.iter().map(r).collect::<Vec<_>>().join(" ");
                format!(
                    "control {} {} {args}",
                    control.kind,
                    r(&control.building)
                )
                .trim_end()
                .to_string()
            }
            Instruction::UnitControl(unit) => {
                let args = unit.args.iter().map(r).collect::<Vec<_>>().join(" ");
                format!("ucontrol {} {args}", unit.kind).trim_end().to_string()
            }
            Instruction::Lookup { kind, result, index } => {
                format!("lookup {kind} {} {}", r(result), r(index))
            }
            Instruction::Wait { seconds } => format!("wait {}", r(seconds)),
            Instruction::Stop => "stop".to_string(),
            Instruction::Radar(radar) => format!(
                "radar {} {} {} {} {} {} {}",
                radar.filters[0],
                radar.filters[1],
                radar.filters[2],
                radar.metric,
                r(&radar.building),
                r(&radar.order),
                r(&radar.result),
            ),
        }
    }
}
