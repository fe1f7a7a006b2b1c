//! Compilation of clause bodies and their control constructs.
//!
//! ```text
//! (A ; B)          try_me_else L; A; jump End; L: trust_me; B; End:
//! (C -> T ; E)     mark_choice R; try_me_else L; C; cut_to R; T; jump End;
//!                  L: trust_me; E; End:
//! \+ G             mark_choice R; try_me_else L; G; cut_to R; fail;
//!                  L: trust_me
//! ```
//!
//! A cut inside the condition of an if-then-else or inside `\+` is local to
//! that goal: it cuts to a register marked after the alternative was pushed.

use super::ClauseCompiler;
use crate::backend::bytecode::opcodes::Opcode;
use crate::backend::errors::EngineResult;
use crate::backend::models::{Tag, Term};
use crate::backend::symbol::atoms;

/// What `!` cuts back to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum CutTarget {
    /// The entry height of the clause activation
    Activation,
    /// The height saved in a cut register
    Register(u16),
}

impl ClauseCompiler<'_> {
    pub(super) fn compile_body(&mut self, body: &Term, cut: CutTarget) -> EngineResult<()> {
        let a = atoms();
        let mut conjuncts = vec![body];
        while let Some(goal) = conjuncts.pop() {
            match goal {
                Term::Var(id) => {
                    self.builder.emit_u16(Opcode::PushEnv, id.0 as u16);
                    self.builder.emit_call(Tag::new(a.call, 1));
                }
                Term::Atom(name) if *name == a.true_ => {}
                Term::Atom(name) if *name == a.fail || *name == a.false_ => {
                    self.builder.emit(Opcode::Fail);
                }
                Term::Atom(name) if *name == a.cut => match cut {
                    CutTarget::Activation => self.builder.emit(Opcode::Cut),
                    CutTarget::Register(r) => self.builder.emit_u16(Opcode::CutTo, r),
                },
                Term::Compound(c) if c.arity() == 2 && c.functor() == a.comma => {
                    conjuncts.push(&c.args()[1]);
                    conjuncts.push(&c.args()[0]);
                }
                Term::Compound(c) if c.arity() == 2 && c.functor() == a.semicolon => {
                    match if_then(&c.args()[0]) {
                        Some((cond, then)) => {
                            self.compile_if_then_else(cond, then, Some(&c.args()[1]), cut)?
                        }
                        None => self.compile_disjunction(&c.args()[0], &c.args()[1], cut)?,
                    }
                }
                Term::Compound(c) if c.arity() == 2 && c.functor() == a.arrow => {
                    self.compile_if_then_else(&c.args()[0], &c.args()[1], None, cut)?;
                }
                Term::Compound(c) if c.arity() == 1 && c.functor() == a.not_provable => {
                    self.compile_negation(&c.args()[0])?;
                }
                Term::Compound(c) => {
                    for arg in c.args() {
                        self.emit_term(arg);
                    }
                    self.builder.emit_call(c.tag());
                }
                Term::Atom(name) => self.builder.emit_call(Tag::new(*name, 0)),
                // Rejected when the clause template was built.
                _ => self.builder.emit(Opcode::Fail),
            }
        }
        Ok(())
    }

    fn compile_disjunction(&mut self, left: &Term, right: &Term, cut: CutTarget) -> EngineResult<()> {
        let else_label = self.builder.emit_jump(Opcode::TryMeElse);
        self.compile_body(left, cut)?;
        let end_label = self.builder.emit_jump(Opcode::Jump);
        self.builder.patch_jump(else_label);
        self.builder.emit(Opcode::TrustMe);
        self.compile_body(right, cut)?;
        self.builder.patch_jump(end_label);
        Ok(())
    }

    fn compile_if_then_else(
        &mut self,
        cond: &Term,
        then: &Term,
        otherwise: Option<&Term>,
        cut: CutTarget,
    ) -> EngineResult<()> {
        let register = self.builder.new_register();
        self.builder.emit_u16(Opcode::MarkChoice, register);
        let else_label = self.builder.emit_jump(Opcode::TryMeElse);
        let cond_cut = self.local_cut_target(cond);
        self.compile_body(cond, cond_cut)?;
        self.builder.emit_u16(Opcode::CutTo, register);
        self.compile_body(then, cut)?;
        let end_label = self.builder.emit_jump(Opcode::Jump);
        self.builder.patch_jump(else_label);
        self.builder.emit(Opcode::TrustMe);
        match otherwise {
            Some(goal) => self.compile_body(goal, cut)?,
            None => self.builder.emit(Opcode::Fail),
        }
        self.builder.patch_jump(end_label);
        Ok(())
    }

    fn compile_negation(&mut self, goal: &Term) -> EngineResult<()> {
        let register = self.builder.new_register();
        self.builder.emit_u16(Opcode::MarkChoice, register);
        let else_label = self.builder.emit_jump(Opcode::TryMeElse);
        let goal_cut = self.local_cut_target(goal);
        self.compile_body(goal, goal_cut)?;
        self.builder.emit_u16(Opcode::CutTo, register);
        self.builder.emit(Opcode::Fail);
        self.builder.patch_jump(else_label);
        self.builder.emit(Opcode::TrustMe);
        Ok(())
    }

    /// Register for cuts local to `goal`, marked right after the enclosing
    /// alternative was pushed. Goals without a cut need none.
    fn local_cut_target(&mut self, goal: &Term) -> CutTarget {
        if !contains_cut(goal) {
            return CutTarget::Activation;
        }
        let register = self.builder.new_register();
        self.builder.emit_u16(Opcode::MarkChoice, register);
        CutTarget::Register(register)
    }
}

/// Split `(C -> T)`
fn if_then(term: &Term) -> Option<(&Term, &Term)> {
    match term {
        Term::Compound(c) if c.arity() == 2 && c.functor() == atoms().arrow => {
            Some((&c.args()[0], &c.args()[1]))
        }
        _ => None,
    }
}

/// Does `goal` contain a cut that is transparent to it?
fn contains_cut(goal: &Term) -> bool {
    let a = atoms();
    let mut work = vec![goal];
    while let Some(g) = work.pop() {
        match g {
            Term::Atom(name) if *name == a.cut => return true,
            Term::Compound(c)
                if c.arity() == 2
                    && (c.functor() == a.comma
                        || c.functor() == a.semicolon
                        || c.functor() == a.arrow) =>
            {
                work.extend(c.args().iter());
            }
            _ => {}
        }
    }
    false
}
