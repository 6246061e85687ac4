//! The core driver (spec §4.3, §4.4): dependency-ordered emission of
//! globals, the entrypoint, and user procedures, plus the mutually recursive
//! statement/expression lowering walks and the stack-discipline call
//! convention (spec §4.4.2/§4.4.3, §9).

use std::path::{Path, PathBuf};

use crate::common::{Map, Name, Set};
use crate::error::Diagnostic;
use crate::instruction::{BinaryOpKind, Instruction, Jump, Radar, UnaryOpKind};
use crate::program::{Program, Waypoint};
use crate::register::Register;
use crate::semantic::{Definition, DefinitionKind, EntryPoint, Expression, Statement, Target};
use crate::stack::Stack;

/// A `continue`/`break` target pair for one lexically enclosing loop (spec
/// §3 "LoopFrame"). Indexed by the `break`/`continue` statement's resolved
/// loop-depth, innermost loop first.
#[derive(Clone, Copy, Debug)]
struct LoopFrame {
    begin: Waypoint,
    end: Waypoint,
}

/// Looks up `name` against the target's own sources (spec §6.1: builtin
/// procedures are ordinary [`Definition`]s under the synthetic `mlog`
/// source, merged in by the loader before the back-end ever sees the
/// target). Takes `target` as a plain argument (not `&self`) so the
/// returned reference's lifetime is independent of any emitter borrow —
/// the emitter needs to recurse mutably while holding onto a `Definition`
/// found this way.
fn resolve<'a>(target: &'a Target, name: Name) -> &'a Definition {
    target
        .sources
        .get(&name.source)
        .and_then(|source| source.globals.get(&name.identifier))
        .unwrap_or_else(|| unreachable!("unknown name {name} referenced by checker output"))
}

struct Emitter<'a> {
    target: &'a Target,
    program: Program,
    stack: Stack,
    built: Set<Name>,
    initialized: Set<Name>,
    addresses: Map<Name, Waypoint>,
    loop_frames: Vec<LoopFrame>,
    current: Name,
}

impl<'a> Emitter<'a> {
    fn new(target: &'a Target) -> Self {
        Emitter {
            target,
            program: Program::new(),
            stack: Stack::new(),
            built: Set::new(),
            initialized: Set::new(),
            addresses: Map::new(),
            loop_frames: Vec::new(),
            current: Name::new(target.name.as_str(), "entrypoint"),
        }
    }

    // ---- §4.3 top-level emission -----------------------------------

    /// Marker-then-recurse dependency closure (spec §4.3 step 3). Tolerates
    /// cycles: a name is marked `built` before its own dependencies are
    /// visited, so a cycle simply stops re-entering (spec §9 "Cyclic
    /// graphs").
    fn close_dependencies(&mut self, name: Name) {
        if self.built.contains(&name) {
            return;
        }
        self.built.insert(name);

        enum Disposition {
            UserProcedure,
            InitializedVariable,
            Other,
        }

        let def = resolve(self.target, name);
        let disposition = match &def.kind {
            DefinitionKind::UserProcedure { .. } => Disposition::UserProcedure,
            DefinitionKind::Variable {
                initializer: Some(_),
            } => Disposition::InitializedVariable,
            DefinitionKind::Variable { initializer: None } | DefinitionKind::Builtin(_) => Disposition::Other,
        };
        let deps = def.dependencies.clone();

        for dep in deps {
            self.close_dependencies(dep);
        }

        match disposition {
            Disposition::UserProcedure => {
                let waypoint = self.program.waypoint();
                log::debug!("emitter: allocated address for procedure {name}");
                self.addresses.insert(name, waypoint);
            }
            Disposition::InitializedVariable => {
                log::debug!("emitter: queued global {name} for initialization");
                self.initialized.insert(name);
            }
            Disposition::Other => {}
        }
    }

    fn run(&mut self, entrypoint: &'a EntryPoint) {
        for dep in &entrypoint.dependencies {
            self.close_dependencies(*dep);
        }

        // Step 4: initializers, in the deterministic (sorted) order of the
        // initialized-set.
        let queued: Vec<Name> = self.initialized.iter().copied().collect();
        for global in queued {
            self.current = global;
            let initializer = match resolve(self.target, global) {
                Definition {
                    kind: DefinitionKind::Variable {
                        initializer: Some(expr),
                    },
                    ..
                } => expr,
                _ => unreachable!("initialized-set entry {global} is not an initialized variable"),
            };
            let value = self.lower_expr(initializer);
            self.stack.pop(value);
            self.program.append(Instruction::Set {
                target: Register::Global(global),
                source: value,
            });
        }

        // Step 5: the entrypoint body, under the synthetic owner name.
        self.current = Name::new(self.target.name.as_str(), "entrypoint");
        self.lower_stmt(&entrypoint.body);

        // Step 6.
        self.program.append(Instruction::End);

        // Step 7: procedure bodies, in the deterministic order of `addresses`.
        let procedures: Vec<(Name, Waypoint)> = self.addresses.iter().map(|(n, w)| (*n, *w)).collect();
        for (name, waypoint) in procedures {
            self.current = name;
            self.program.define(waypoint);
            let body = match resolve(self.target, name) {
                Definition {
                    kind: DefinitionKind::UserProcedure { body, .. },
                    ..
                } => body,
                _ => unreachable!("address table entry {name} is not a user procedure"),
            };
            self.lower_stmt(body);
            for insn in Instruction::implicit_return(name) {
                self.program.append(insn);
            }
        }
    }

    // ---- §4.4.1 statements -------------------------------------------

    fn lower_stmt(&mut self, stmt: &'a Statement) {
        match stmt {
            Statement::Block(stmts) => {
                for s in stmts {
                    self.lower_stmt(s);
                }
            }
            Statement::LocalVar { id, initializer } => {
                if let Some(init) = initializer {
                    let value = self.lower_expr(init);
                    self.stack.pop(value);
                    self.program.append(Instruction::Set {
                        target: Register::Local {
                            owner: self.current,
                            local: *id,
                        },
                        source: value,
                    });
                }
            }
            Statement::If {
                hoisted,
                cond,
                then,
                r#else,
            } => {
                for id in hoisted {
                    log::trace!("emitter: hoisting local {id} ahead of if-condition");
                }
                let cond_reg = self.lower_expr(cond);
                let w_else = self.program.waypoint();
                self.program.append(Instruction::Jump(Jump::IfFalse(w_else, cond_reg)));
                self.stack.pop(cond_reg);
                self.lower_stmt(then);
                let w_end = self.program.waypoint();
                self.program.append(Instruction::Jump(Jump::Always(w_end)));
                self.program.define(w_else);
                if let Some(else_branch) = r#else {
                    self.lower_stmt(else_branch);
                }
                self.program.define(w_end);
            }
            Statement::While {
                hoisted,
                cond,
                zero_branch,
                body,
                interleaved,
            } => {
                for id in hoisted {
                    log::trace!("emitter: hoisting local {id} ahead of while-condition");
                }
                let cond1 = self.lower_expr(cond);
                let w_loop = self.program.waypoint();
                self.program.append(Instruction::Jump(Jump::IfTrue(w_loop, cond1)));
                self.stack.pop(cond1);
                if let Some(zero) = zero_branch {
                    self.lower_stmt(zero);
                }
                let w_end = self.program.waypoint();
                self.program.append(Instruction::Jump(Jump::Always(w_end)));

                self.program.define(w_loop);
                let w_begin = self.program.waypoint();
                self.loop_frames.push(LoopFrame {
                    begin: w_begin,
                    end: w_end,
                });
                self.lower_stmt(body);
                self.loop_frames.pop();

                self.program.define(w_begin);
                if let Some(step) = interleaved {
                    self.lower_stmt(step);
                }
                let cond2 = self.lower_expr(cond);
                self.program.append(Instruction::Jump(Jump::IfTrue(w_loop, cond2)));
                self.stack.pop(cond2);

                self.program.define(w_end);
            }
            Statement::Break(level) => {
                let frame = self.loop_frame(*level);
                self.program.append(Instruction::Jump(Jump::Always(frame.end)));
            }
            Statement::Continue(level) => {
                let frame = self.loop_frame(*level);
                self.program.append(Instruction::Jump(Jump::Always(frame.begin)));
            }
            Statement::Return(value) => {
                if let Some(expr) = value {
                    let v = self.lower_expr(expr);
                    self.stack.pop(v);
                    self.program.append(Instruction::Set {
                        target: Register::return_value(self.current),
                        source: v,
                    });
                }
                self.program.append(Instruction::Set {
                    target: Register::Counter,
                    source: Register::return_location(self.current),
                });
            }
            Statement::Increment(target) => {
                let reg = self.lower_expr(target);
                self.program.append(Instruction::Binary {
                    op: BinaryOpKind::Add,
                    target: reg,
                    left: reg,
                    right: Register::NumberConstant(1.0),
                });
            }
            Statement::Decrement(target) => {
                let reg = self.lower_expr(target);
                self.program.append(Instruction::Binary {
                    op: BinaryOpKind::Sub,
                    target: reg,
                    left: reg,
                    right: Register::NumberConstant(1.0),
                });
            }
            Statement::DirectlyAssign(t, s) => {
                let target_reg = self.lower_expr(t);
                let source_reg = self.lower_expr(s);
                self.program.append(Instruction::Set {
                    target: target_reg,
                    source: source_reg,
                });
                self.stack.pop(source_reg);
            }
            Statement::CompoundAssign { op, target, source } => {
                // spec §9 open question (a): the target is lowered exactly
                // once; its register serves as both the read operand and
                // the write destination.
                let target_reg = self.lower_expr(target);
                let source_reg = self.lower_expr(source);
                self.program.append(Instruction::Binary {
                    op: *op,
                    target: target_reg,
                    left: target_reg,
                    right: source_reg,
                });
                self.stack.pop(source_reg);
            }
            Statement::Discard(expr) => {
                let v = self.lower_expr(expr);
                self.stack.pop(v);
            }
        }
    }

    fn loop_frame(&self, level: usize) -> LoopFrame {
        let index = self
            .loop_frames
            .len()
            .checked_sub(1 + level)
            .unwrap_or_else(|| unreachable!("break/continue level {level} exceeds loop nesting"));
        self.loop_frames[index]
    }

    // ---- §4.4.2 expressions -------------------------------------------

    fn lower_expr(&mut self, expr: &'a Expression) -> Register {
        match expr {
            Expression::Or(left, right) => self.lower_short_circuit(left, right, true),
            Expression::And(left, right) => self.lower_short_circuit(left, right, false),
            Expression::Binary { op, left, right } => {
                let l = self.lower_expr(left);
                let r = self.lower_expr(right);
                let target = self.stack.push_reusing2(l, r);
                self.program.append(Instruction::Binary {
                    op: *op,
                    target,
                    left: l,
                    right: r,
                });
                target
            }
            Expression::Promote(x) => self.lower_unary_via_binary(x, BinaryOpKind::Add),
            Expression::Negate(x) => self.lower_unary_via_binary(x, BinaryOpKind::Sub),
            Expression::LogicalNot(x) => self.lower_unary_via_binary(x, BinaryOpKind::NotEqual),
            Expression::BitwiseNot(x) => {
                let v = self.lower_expr(x);
                let target = self.stack.push_reusing(v);
                self.program.append(Instruction::Unary {
                    op: UnaryOpKind::Not,
                    target,
                    operand: v,
                });
                target
            }
            Expression::NumberConstant(value) => Register::NumberConstant(*value),
            Expression::ColorConstant(argb) => Register::ColorConstant(*argb),
            Expression::StringConstant(text) => Register::StringConstant(*text),
            Expression::LinkConstant(building) => Register::Link(*building),
            Expression::GlobalVariableAccess(name) => Register::Global(*name),
            Expression::LocalVariableAccess(id) => Register::Local {
                owner: self.current,
                local: *id,
            },
            Expression::BuiltinAccess(id) => Register::Builtin(*id),
            Expression::MemberAccess { object, member } => {
                let obj = self.lower_expr(object);
                let prop = self.lower_expr(member);
                let target = self.stack.push_reusing2(obj, prop);
                self.program.append(Instruction::Sensor {
                    result: target,
                    object: obj,
                    property: prop,
                });
                target
            }
            Expression::Call { procedure, args } => self.lower_call(*procedure, args),
            Expression::RadarCall {
                filters,
                metric,
                building,
                order,
            } => {
                let building_reg = self.lower_expr(building);
                let order_reg = self.lower_expr(order);
                let target = self.stack.push_reusing2(building_reg, order_reg);
                self.program.append(Instruction::Radar(Radar::new(
                    filters,
                    *metric,
                    building_reg,
                    order_reg,
                    target,
                )));
                target
            }
        }
    }

    /// Promotion/negation/logical-not (spec §4.4.2): all three are a binary
    /// op against a literal zero left operand, differing only in `op`.
    fn lower_unary_via_binary(&mut self, operand: &'a Expression, op: BinaryOpKind) -> Register {
        let v = self.lower_expr(operand);
        let target = self.stack.push_reusing(v);
        self.program.append(Instruction::Binary {
            op,
            target,
            left: Register::NumberConstant(0.0),
            right: v,
        });
        target
    }

    /// Short-circuit OR (`or_is_true = true`) / AND (`false`) (spec §4.4.2,
    /// §9 "Stack discipline vs. short-circuit"). The Temporary is allocated
    /// *before* the left operand is evaluated so the result has a stable
    /// home regardless of whether short-circuit triggers.
    fn lower_short_circuit(&mut self, left: &'a Expression, right: &'a Expression, or_is_true: bool) -> Register {
        let t = self.stack.push();
        let l = self.lower_expr(left);
        self.program.append(Instruction::Set { target: t, source: l });
        self.stack.pop(l);
        let w_end = self.program.waypoint();
        let branch = if or_is_true {
            Jump::IfTrue(w_end, t)
        } else {
            Jump::IfFalse(w_end, t)
        };
        self.program.append(Instruction::Jump(branch));
        let r = self.lower_expr(right);
        self.stack.pop(r);
        self.program.append(Instruction::Set { target: t, source: r });
        self.program.define(w_end);
        t
    }

    fn lower_call(&mut self, procedure: Name, args: &'a [Expression]) -> Register {
        match resolve(self.target, procedure) {
            Definition {
                kind: DefinitionKind::Builtin(builtin),
                ..
            } => {
                let builtin = builtin.clone();
                let mut regs = Vec::with_capacity(args.len());
                for arg in args {
                    let r = self.lower_expr(arg);
                    self.stack.pop(r);
                    regs.push(r);
                }
                let insn = builtin.build(regs);
                self.program.append(insn);
                Register::Null
            }
            Definition {
                kind: DefinitionKind::UserProcedure { parameters, .. },
                ..
            } => {
                let parameter_count = parameters.len();
                let in_out: Vec<bool> = parameters.iter().map(|p| p.in_out).collect();

                let w_after = self.program.waypoint();
                self.program.append(Instruction::Set {
                    target: Register::return_location(procedure),
                    source: Register::InstructionAddress(w_after),
                });

                let mut arg_regs = Vec::with_capacity(args.len());
                for (index, arg) in args.iter().enumerate() {
                    let r = self.lower_expr(arg);
                    self.program.append(Instruction::Set {
                        target: Register::Parameter { procedure, index },
                        source: r,
                    });
                    self.stack.pop(r);
                    arg_regs.push(r);
                }
                for index in args.len()..parameter_count {
                    self.program.append(Instruction::Set {
                        target: Register::Parameter { procedure, index },
                        source: Register::Null,
                    });
                }

                let address = *self
                    .addresses
                    .get(&procedure)
                    .unwrap_or_else(|| unreachable!("call to procedure {procedure} with no allocated address"));
                self.program.append(Instruction::Jump(Jump::Always(address)));
                self.program.define(w_after);

                for (index, arg_reg) in arg_regs.iter().enumerate() {
                    if in_out.get(index).copied().unwrap_or(false) && arg_reg.is_volatile() {
                        self.program.append(Instruction::Set {
                            target: *arg_reg,
                            source: Register::Parameter { procedure, index },
                        });
                    }
                }

                Register::return_value(procedure)
            }
            Definition {
                kind: DefinitionKind::Variable { .. },
                ..
            } => unreachable!("call target {procedure} is not callable"),
        }
    }
}

/// The back-end's one entry point (spec §6.3): walks `target`, emits its
/// `.mlog` assembly to `{artifacts_dir}/{subject}.mlog`, and returns the
/// path written. The output file is created only after the whole program
/// has been built in memory (spec §5, §7: no partial output on failure).
pub fn build(subject: &str, artifacts_dir: &Path, target: &Target) -> Result<PathBuf, Diagnostic> {
    let entrypoint = target.entrypoint().ok_or_else(|| Diagnostic::MissingEntrypoint {
        target: target.name.to_string(),
    })?;

    let mut emitter = Emitter::new(target);
    emitter.run(entrypoint);

    let output_path = artifacts_dir.join(format!("{subject}.mlog"));
    let mut file = std::fs::File::create(&output_path).map_err(|source| Diagnostic::OutputWrite {
        path: output_path.clone(),
        source,
    })?;
    emitter
        .program
        .serialize(&mut file)
        .map_err(|source| Diagnostic::OutputWrite {
            path: output_path.clone(),
            source,
        })?;

    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Id;
    use crate::instruction::{Filter, Metric};
    use crate::semantic::{Parameter, Source};

    fn target_with_entrypoint(body: Statement) -> Target {
        let mut sources = Map::new();
        sources.insert(
            Id::new("x".to_owned()),
            Source {
                globals: Map::new(),
                entrypoint: Some(EntryPoint {
                    dependencies: Vec::new(),
                    body,
                }),
            },
        );
        Target {
            name: Id::new("x".to_owned()),
            sources,
        }
    }

    fn run_to_text(target: &Target) -> String {
        let mut emitter = Emitter::new(target);
        emitter.run(target.entrypoint().unwrap());
        emitter.program.to_text()
    }

    /// Merges the `mlog` standard library into a hand-built test target,
    /// the way a real loader would before handing the back-end its input
    /// (spec §6.1) — used only by tests that call a builtin by name.
    fn with_standard_library(mut target: Target) -> Target {
        target
            .sources
            .insert(Id::new(crate::builtins::STD_SOURCE.to_owned()), crate::builtins::standard_library());
        target
    }

    #[test]
    fn empty_entrypoint_emits_only_end() {
        let target = target_with_entrypoint(Statement::Block(Vec::new()));
        assert_eq!(run_to_text(&target), "end");
    }

    #[test]
    fn single_assignment_sets_local_then_ends() {
        let target = target_with_entrypoint(Statement::LocalVar {
            id: Id::new("a".to_owned()),
            initializer: Some(Expression::NumberConstant(3.0)),
        });
        assert_eq!(run_to_text(&target), "set x$entrypoint$a 3\nend");
    }

    #[test]
    fn if_else_jumps_past_the_else_branch() {
        let id_a = Id::new("a".to_owned());
        let stmt = Statement::If {
            hoisted: Vec::new(),
            cond: Expression::NumberConstant(0.0),
            then: Box::new(Statement::LocalVar {
                id: id_a,
                initializer: Some(Expression::NumberConstant(1.0)),
            }),
            r#else: Some(Box::new(Statement::LocalVar {
                id: id_a,
                initializer: Some(Expression::NumberConstant(2.0)),
            })),
        };
        let target = target_with_entrypoint(stmt);
        let text = run_to_text(&target);
        assert_eq!(
            text,
            "jump 3 equal false 0\nset x$entrypoint$a 1\njump 4 always\nset x$entrypoint$a 2\nend"
        );
    }

    #[test]
    fn compound_expression_reuses_one_temporary() {
        let id_a = Id::new("a".to_owned());
        let stmt = Statement::LocalVar {
            id: id_a,
            initializer: Some(Expression::Binary {
                op: BinaryOpKind::Add,
                left: Box::new(Expression::NumberConstant(1.0)),
                right: Box::new(Expression::Binary {
                    op: BinaryOpKind::Mul,
                    left: Box::new(Expression::NumberConstant(2.0)),
                    right: Box::new(Expression::NumberConstant(3.0)),
                }),
            }),
        };
        let target = target_with_entrypoint(stmt);
        let text = run_to_text(&target);
        assert_eq!(
            text,
            "op mul _0 2 3\nop add _0 1 _0\nset x$entrypoint$a _0\nend"
        );
    }

    #[test]
    fn call_with_in_out_parameter_copies_back_into_a_volatile_argument() {
        let proc_name = Name::new("m", "p");
        let param_b = Parameter {
            name: Id::new("b".to_owned()),
            in_out: true,
        };
        let mut globals = Map::new();
        globals.insert(
            Id::new("p".to_owned()),
            Definition {
                dependencies: Vec::new(),
                kind: DefinitionKind::UserProcedure {
                    parameters: vec![param_b],
                    body: Statement::Block(Vec::new()),
                },
            },
        );
        let mut sources = Map::new();
        sources.insert(
            Id::new("m".to_owned()),
            Source {
                globals,
                entrypoint: None,
            },
        );
        sources.insert(
            Id::new("x".to_owned()),
            Source {
                globals: Map::new(),
                entrypoint: Some(EntryPoint {
                    dependencies: vec![proc_name],
                    body: Statement::Discard(Expression::Call {
                        procedure: proc_name,
                        args: vec![Expression::LocalVariableAccess(Id::new("a".to_owned()))],
                    }),
                }),
            },
        );
        let target = Target {
            name: Id::new("x".to_owned()),
            sources,
        };

        let text = run_to_text(&target);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "set m$p$return$location 3");
        assert_eq!(lines[1], "set m$p$param$0 x$entrypoint$a");
        assert_eq!(lines[2], "jump 5 always");
        assert_eq!(lines[3], "set x$entrypoint$a m$p$param$0");
        assert_eq!(lines[4], "end");
        assert_eq!(lines[5], "set m$p$return$value null");
        assert_eq!(lines[6], "set @counter m$p$return$location");
    }

    #[test]
    fn radar_call_dispatches_to_the_radar_instruction() {
        let stmt = Statement::Discard(Expression::RadarCall {
            filters: vec![Filter::Enemy],
            metric: Metric::Distance,
            building: Box::new(Expression::LinkConstant(Id::new("building1".to_owned()))),
            order: Box::new(Expression::NumberConstant(1.0)),
        });
        let target = target_with_entrypoint(stmt);
        let text = run_to_text(&target);
        assert_eq!(text, "radar enemy any any distance building1 1 _0\nend");
    }

    #[test]
    fn calling_a_builtin_by_name_dispatches_through_its_definition() {
        let print_name = Name::new("mlog", "print");
        let target = with_standard_library(target_with_entrypoint(Statement::Discard(Expression::Call {
            procedure: print_name,
            args: vec![Expression::NumberConstant(1.0)],
        })));
        let text = run_to_text(&target);
        assert_eq!(text, "print 1\nend");
    }

    #[test]
    fn missing_entrypoint_is_a_diagnostic_not_a_panic() {
        let target = Target {
            name: Id::new("x".to_owned()),
            sources: Map::new(),
        };
        let dir = std::env::temp_dir();
        let result = build("x", &dir, &target);
        assert!(matches!(result, Err(Diagnostic::MissingEntrypoint { .. })));
    }

    #[test]
    fn directly_assign_sets_target_from_source_with_no_pops() {
        let stmt = Statement::DirectlyAssign(
            Expression::GlobalVariableAccess(Name::new("x", "a")),
            Expression::NumberConstant(5.0),
        );
        let target = target_with_entrypoint(stmt);
        assert_eq!(run_to_text(&target), "set x$a 5\nend");
    }

    #[test]
    fn compound_assign_emits_a_single_binary_op_against_the_target() {
        let stmt = Statement::CompoundAssign {
            op: BinaryOpKind::Add,
            target: Expression::GlobalVariableAccess(Name::new("x", "a")),
            source: Expression::NumberConstant(2.0),
        };
        let target = target_with_entrypoint(stmt);
        assert_eq!(run_to_text(&target), "op add x$a x$a 2\nend");
    }

    #[test]
    fn compound_assign_with_a_member_access_target_evaluates_it_exactly_once() {
        // Spec §9 open question (a): a single evaluation of the target, even
        // though it is a side-effecting Sensor read rather than a plain
        // local/global slot.
        let target_expr = Expression::MemberAccess {
            object: Box::new(Expression::LinkConstant(Id::new("block1".to_owned()))),
            member: Box::new(Expression::BuiltinAccess(Id::new("copper".to_owned()))),
        };
        let stmt = Statement::CompoundAssign {
            op: BinaryOpKind::Add,
            target: target_expr,
            source: Expression::NumberConstant(1.0),
        };
        let target = target_with_entrypoint(stmt);
        let text = run_to_text(&target);
        let sensor_lines = text.lines().filter(|line| line.starts_with("sensor")).count();
        assert_eq!(sensor_lines, 1, "the member-access target must be read once, not re-sensed for the write");
        assert_eq!(text, "sensor _0 block1 @copper\nop add _0 _0 1\nend");
    }

    #[test]
    fn increment_emits_an_add_against_the_lowered_target() {
        let stmt = Statement::Increment(Expression::LocalVariableAccess(Id::new("a".to_owned())));
        let target = target_with_entrypoint(stmt);
        assert_eq!(run_to_text(&target), "op add x$entrypoint$a x$entrypoint$a 1\nend");
    }

    #[test]
    fn decrement_emits_a_subtract_against_the_lowered_target() {
        let stmt = Statement::Decrement(Expression::LocalVariableAccess(Id::new("a".to_owned())));
        let target = target_with_entrypoint(stmt);
        assert_eq!(run_to_text(&target), "op sub x$entrypoint$a x$entrypoint$a 1\nend");
    }

    #[test]
    fn increment_with_a_member_access_target_evaluates_it_exactly_once() {
        let target_expr = Expression::MemberAccess {
            object: Box::new(Expression::LinkConstant(Id::new("block1".to_owned()))),
            member: Box::new(Expression::BuiltinAccess(Id::new("copper".to_owned()))),
        };
        let target = target_with_entrypoint(Statement::Increment(target_expr));
        let text = run_to_text(&target);
        let sensor_lines = text.lines().filter(|line| line.starts_with("sensor")).count();
        assert_eq!(sensor_lines, 1, "the member-access target must be read once, not re-sensed for the write");
        assert_eq!(text, "sensor _0 block1 @copper\nop add _0 _0 1\nend");
    }

    #[test]
    fn member_access_lowers_to_a_single_sensor_instruction() {
        let stmt = Statement::Discard(Expression::MemberAccess {
            object: Box::new(Expression::LinkConstant(Id::new("block1".to_owned()))),
            member: Box::new(Expression::BuiltinAccess(Id::new("copper".to_owned()))),
        });
        let target = target_with_entrypoint(stmt);
        assert_eq!(run_to_text(&target), "sensor _0 block1 @copper\nend");
    }

    #[test]
    fn break_jumps_to_the_enclosing_loops_end_waypoint() {
        let body = Statement::While {
            hoisted: Vec::new(),
            cond: Expression::NumberConstant(1.0),
            zero_branch: None,
            body: Box::new(Statement::Break(0)),
            interleaved: None,
        };
        let target = target_with_entrypoint(body);
        assert_eq!(
            run_to_text(&target),
            "jump 2 equal true 1\njump 4 always\njump 4 always\njump 2 equal true 1\nend"
        );
    }

    #[test]
    fn continue_jumps_to_the_enclosing_loops_begin_waypoint() {
        let body = Statement::While {
            hoisted: Vec::new(),
            cond: Expression::NumberConstant(1.0),
            zero_branch: None,
            body: Box::new(Statement::Continue(0)),
            interleaved: None,
        };
        let target = target_with_entrypoint(body);
        assert_eq!(
            run_to_text(&target),
            "jump 2 equal true 1\njump 4 always\njump 3 always\njump 2 equal true 1\nend"
        );
    }

    #[test]
    fn logical_or_short_circuits_through_a_stable_temporary() {
        let stmt = Statement::LocalVar {
            id: Id::new("a".to_owned()),
            initializer: Some(Expression::Or(
                Box::new(Expression::NumberConstant(1.0)),
                Box::new(Expression::NumberConstant(0.0)),
            )),
        };
        let target = target_with_entrypoint(stmt);
        assert_eq!(
            run_to_text(&target),
            "set _0 1\njump 3 equal true _0\nset _0 0\nset x$entrypoint$a _0\nend"
        );
    }

    #[test]
    fn logical_and_short_circuits_through_a_stable_temporary() {
        let stmt = Statement::LocalVar {
            id: Id::new("a".to_owned()),
            initializer: Some(Expression::And(
                Box::new(Expression::NumberConstant(1.0)),
                Box::new(Expression::NumberConstant(0.0)),
            )),
        };
        let target = target_with_entrypoint(stmt);
        assert_eq!(
            run_to_text(&target),
            "set _0 1\njump 3 equal false _0\nset _0 0\nset x$entrypoint$a _0\nend"
        );
    }

    #[test]
    fn promote_lowers_to_addition_against_zero() {
        let stmt = Statement::LocalVar {
            id: Id::new("a".to_owned()),
            initializer: Some(Expression::Promote(Box::new(Expression::NumberConstant(5.0)))),
        };
        let target = target_with_entrypoint(stmt);
        assert_eq!(run_to_text(&target), "op add _0 0 5\nset x$entrypoint$a _0\nend");
    }

    #[test]
    fn negate_lowers_to_subtraction_from_zero() {
        let stmt = Statement::LocalVar {
            id: Id::new("a".to_owned()),
            initializer: Some(Expression::Negate(Box::new(Expression::NumberConstant(5.0)))),
        };
        let target = target_with_entrypoint(stmt);
        assert_eq!(run_to_text(&target), "op sub _0 0 5\nset x$entrypoint$a _0\nend");
    }

    #[test]
    fn logical_not_lowers_to_not_equal_against_zero() {
        let stmt = Statement::LocalVar {
            id: Id::new("a".to_owned()),
            initializer: Some(Expression::LogicalNot(Box::new(Expression::NumberConstant(5.0)))),
        };
        let target = target_with_entrypoint(stmt);
        assert_eq!(
            run_to_text(&target),
            "op notEqual _0 0 5\nset x$entrypoint$a _0\nend"
        );
    }

    #[test]
    fn bitwise_not_lowers_to_the_dedicated_unary_opcode() {
        let stmt = Statement::LocalVar {
            id: Id::new("a".to_owned()),
            initializer: Some(Expression::BitwiseNot(Box::new(Expression::NumberConstant(5.0)))),
        };
        let target = target_with_entrypoint(stmt);
        assert_eq!(run_to_text(&target), "op not _0 5 0\nset x$entrypoint$a _0\nend");
    }
}
