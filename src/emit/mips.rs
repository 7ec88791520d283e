//! The register-allocating MIPS emitter.
//!
//! Holds the register file and register descriptor described in
//! [`crate::regalloc`] and walks a function's instructions, picking
//! registers for operands on demand, filling them from memory or moving
//! them from another register, and spilling everything dirty back to its
//! frame slot before any label, jump, call or return so every basic block
//! boundary starts with an empty descriptor.

use crate::error::CodegenResult;
use crate::ir::{BinaryOpcode, Inst, Instruction, Location, Program, Segment};
use crate::regalloc::register_file::{Register, SCRATCH_REGISTERS};
use crate::regalloc::{RegisterDescriptor, RegisterFile};
use log::warn;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::io::Write;

fn mips_mnemonic(op: BinaryOpcode) -> &'static str {
    match op {
        BinaryOpcode::Add => "add",
        BinaryOpcode::Sub => "sub",
        BinaryOpcode::Mul => "mul",
        BinaryOpcode::Div => "div",
        BinaryOpcode::Mod => "rem",
        BinaryOpcode::Eq => "seq",
        BinaryOpcode::Less => "slt",
        BinaryOpcode::And => "and",
        BinaryOpcode::Or => "or",
    }
}

/// Emits MIPS assembly for one program, given the per-function liveness
/// information the driver has already computed.
pub struct MipsEmitter<W> {
    out: W,
    regs: RegisterFile,
    descriptor: RegisterDescriptor,
    rng: StdRng,
    next_string_label: u32,
    locked: Vec<Register>,
}

impl<W: Write> MipsEmitter<W> {
    /// Build an emitter writing to `out`. `rng_seed` controls the random
    /// spill-victim search so a caller can make test output reproducible;
    /// `None` falls back to a fixed default seed rather than true
    /// randomness, keeping the whole backend deterministic by default.
    pub fn new(out: W, rng_seed: Option<u64>) -> Self {
        MipsEmitter {
            out,
            regs: RegisterFile::new(),
            descriptor: RegisterDescriptor::new(),
            rng: StdRng::seed_from_u64(rng_seed.unwrap_or(0)),
            next_string_label: 0,
            locked: Vec::new(),
        }
    }

    /// The preamble every emitted program opens with.
    pub fn emit_preamble(&mut self) -> CodegenResult<()> {
        writeln!(self.out, "\t.text")?;
        writeln!(self.out, "\t.align 2")?;
        writeln!(self.out, "\t.globl main")?;
        Ok(())
    }

    fn emit_line(&mut self, text: &str) -> CodegenResult<()> {
        writeln!(self.out, "\t{}", text)?;
        Ok(())
    }

    fn emit_label_line(&mut self, name: &str) -> CodegenResult<()> {
        writeln!(self.out, "{}:", name)?;
        Ok(())
    }

    fn emit_comment(&mut self, text: &str) -> CodegenResult<()> {
        writeln!(self.out, "\t# {}", text)?;
        Ok(())
    }

    // -- register management ------------------------------------------

    fn lock(&mut self, reg: Register) {
        self.regs.get_mut(reg).mutex_locked = true;
        self.locked.push(reg);
    }

    fn unlock_all(&mut self) {
        for reg in self.locked.drain(..) {
            self.regs.get_mut(reg).mutex_locked = false;
        }
    }

    fn next_clean_scratch(&self) -> Option<Register> {
        SCRATCH_REGISTERS
            .iter()
            .copied()
            .find(|&r| !self.regs.get(r).is_dirty)
    }

    fn select_spill_victim(&mut self) -> Register {
        for _ in 0..100 {
            let idx = (self.rng.next_u32() as usize) % SCRATCH_REGISTERS.len();
            let candidate = SCRATCH_REGISTERS[idx];
            let state = self.regs.get(candidate);
            if state.is_dirty && !state.mutex_locked {
                return candidate;
            }
        }
        unreachable!("no spillable scratch register found; every $t* is locked by one instruction")
    }

    /// Choose a register to hold `loc`. If `copy_required` is false and
    /// `loc` is already resident, its current register is reused with no
    /// move. Otherwise a clean `$t*` is used, spilling a random dirty one
    /// if none is clean.
    fn pick_reg_for(&mut self, loc: &Location, copy_required: bool) -> CodegenResult<Register> {
        if !copy_required {
            if let Some(reg) = self.descriptor.lookup(loc) {
                self.lock(reg);
                return Ok(reg);
            }
        }
        let reg = match self.next_clean_scratch() {
            Some(reg) => reg,
            None => {
                let victim = self.select_spill_victim();
                self.spill(victim)?;
                victim
            }
        };
        self.lock(reg);
        Ok(reg)
    }

    /// Materialize `loc`'s value into `reg`, via a register-to-register
    /// move/convert if already resident elsewhere, otherwise a cold load
    /// from its frame or global slot.
    fn fill(&mut self, loc: &Location, reg: Register) -> CodegenResult<()> {
        if self.descriptor.lookup(loc) == Some(reg) {
            return Ok(());
        }
        if let Some(src_reg) = self.descriptor.lookup(loc) {
            let line = match (reg.is_fpu(), src_reg.is_fpu()) {
                (true, true) => format!("mov.s {}, {}", reg, src_reg),
                (true, false) => format!("mtc1 {}, {}", src_reg, reg),
                (false, true) => format!("mfc1 {}, {}", src_reg, reg),
                (false, false) => format!("move {}, {}", reg, src_reg),
            };
            self.emit_line(&line)?;
        } else {
            let op = if reg.is_fpu() { "l.s" } else { "lw" };
            let base_reg = match &loc.segment {
                Segment::Frame => "$fp",
                Segment::Global => "$gp",
                Segment::Indirect { .. } => {
                    unreachable!(
                        "indirect locations are produced by arithmetic and are always \
                         already resident by the time they're filled"
                    )
                }
            };
            self.emit_line(&format!("{} {}, {}({})", op, reg, loc.offset, base_reg))?;
        }
        self.bind(reg, loc.clone());
        Ok(())
    }

    fn bind(&mut self, reg: Register, loc: Location) {
        self.descriptor.insert(reg, loc);
        self.regs.get_mut(reg).is_dirty = true;
    }

    /// Reclaim a dirty register: if a prior `DiscardValue` marked its
    /// resident value discardable, just drop the binding; otherwise write
    /// it back to its home slot first.
    fn spill(&mut self, reg: Register) -> CodegenResult<()> {
        if let Some(loc) = self.descriptor.resident(reg).cloned() {
            if self.regs.get(reg).can_discard {
                // Already announced by the `DiscardValue` that set this
                // flag; nothing left to write back.
            } else {
                let op = if reg.is_fpu() { "s.s" } else { "sw" };
                match &loc.segment {
                    Segment::Frame => {
                        self.emit_line(&format!("{} {}, {}($fp)", op, reg, loc.offset))?
                    }
                    Segment::Global => {
                        self.emit_line(&format!("{} {}, {}($gp)", op, reg, loc.offset))?
                    }
                    Segment::Indirect { .. } => {
                        warn!("attempted to spill indirect location {}; dropping", loc);
                    }
                }
            }
            self.descriptor.remove(reg);
        }
        self.regs.get_mut(reg).is_dirty = false;
        self.regs.get_mut(reg).can_discard = false;
        Ok(())
    }

    /// Spill every dirty scratch register and clear the descriptor. Run
    /// before every label, jump, call and return so control-flow merges
    /// always start from an empty register state.
    fn clean_for_branch(&mut self) -> CodegenResult<()> {
        let dirty: Vec<Register> = SCRATCH_REGISTERS
            .iter()
            .copied()
            .filter(|&r| self.regs.get(r).is_dirty)
            .collect();
        for reg in dirty {
            self.spill(reg)?;
        }
        self.descriptor.clear();
        self.regs.clear_scratch();
        Ok(())
    }

    fn fresh_string_label(&mut self) -> String {
        let label = format!("_string{}", self.next_string_label);
        self.next_string_label += 1;
        label
    }

    // -- per-opcode emission --------------------------------------------

    /// Emit one instruction. `program` is needed to resolve `DiscardValue`
    /// targets against their current register and for diagnostics.
    pub fn emit_instruction(&mut self, program: &Program, inst: Inst, data: &Instruction) -> CodegenResult<()> {
        match data {
            Instruction::LoadConstant { dst, value } => {
                let r = self.pick_reg_for(dst, true)?;
                self.emit_line(&format!("li {}, {}", r, value))?;
                self.bind(r, dst.clone());
            }
            Instruction::LoadStringConstant { dst, value } => {
                let label = self.fresh_string_label();
                writeln!(self.out, "\t.data")?;
                writeln!(self.out, "\t.align 2")?;
                self.emit_label_line(&label)?;
                self.emit_line(&format!(".asciiz \"{}\"", value))?;
                writeln!(self.out, "\t.text")?;
                let r = self.pick_reg_for(dst, true)?;
                self.emit_line(&format!("la {}, {}", r, label))?;
                self.bind(r, dst.clone());
            }
            Instruction::LoadLabel { dst, label } => {
                let r = self.pick_reg_for(dst, true)?;
                self.emit_line(&format!("la {}, {}", r, label))?;
                self.bind(r, dst.clone());
            }
            Instruction::Assign { dst, src } => {
                let src_reg = self.pick_reg_for(src, false)?;
                self.fill(src, src_reg)?;
                let dst_reg = self.pick_reg_for(dst, true)?;
                self.emit_line(&format!("move {}, {}", dst_reg, src_reg))?;
                self.bind(dst_reg, dst.clone());
            }
            Instruction::Load { dst, base, offset } => {
                let base_reg = self.pick_reg_for(base, false)?;
                self.fill(base, base_reg)?;
                let dst_reg = self.pick_reg_for(dst, true)?;
                self.emit_line(&format!("lw {}, {}({})", dst_reg, offset, base_reg))?;
                self.bind(dst_reg, dst.clone());
            }
            Instruction::Store { base, src, offset } => {
                let src_reg = self.pick_reg_for(src, false)?;
                self.fill(src, src_reg)?;
                let base_reg = self.pick_reg_for(base, false)?;
                self.fill(base, base_reg)?;
                self.emit_line(&format!("sw {}, {}({})", src_reg, offset, base_reg))?;
            }
            Instruction::BinaryOp { op, dst, a, b } => {
                let a_reg = self.pick_reg_for(a, false)?;
                self.fill(a, a_reg)?;
                let b_reg = self.pick_reg_for(b, false)?;
                self.fill(b, b_reg)?;
                let dst_reg = self.pick_reg_for(dst, true)?;
                self.emit_line(&format!(
                    "{} {}, {}, {}",
                    mips_mnemonic(*op),
                    dst_reg,
                    a_reg,
                    b_reg
                ))?;
                self.bind(dst_reg, dst.clone());
            }
            Instruction::Label { name } => {
                self.clean_for_branch()?;
                self.emit_label_line(name)?;
            }
            Instruction::Goto { label } => {
                self.clean_for_branch()?;
                self.emit_line(&format!("b {}", label))?;
            }
            Instruction::IfZ { test, label } => {
                self.fill(test, Register::V0)?;
                self.clean_for_branch()?;
                self.emit_line(&format!("beqz $v0, {}", label))?;
            }
            Instruction::PushParam { arg } => {
                let r = self.pick_reg_for(arg, false)?;
                self.fill(arg, r)?;
                self.emit_line("subu $sp, $sp, 4")?;
                self.emit_line(&format!("sw {}, 4($sp)", r))?;
            }
            Instruction::PopParams { bytes } => {
                if *bytes > 0 {
                    self.emit_line(&format!("add $sp, $sp, {}", bytes))?;
                }
            }
            Instruction::LCall { label, dst } => {
                self.clean_for_branch()?;
                self.emit_line(&format!("jal {}", label))?;
                if let Some(dst) = dst {
                    let r = self.pick_reg_for(dst, true)?;
                    self.emit_line(&format!("move {}, $v0", r))?;
                    self.bind(r, dst.clone());
                }
            }
            Instruction::ACall { target, dst } => {
                self.fill(target, Register::V0)?;
                self.clean_for_branch()?;
                self.emit_line("jalr $v0")?;
                if let Some(dst) = dst {
                    let r = self.pick_reg_for(dst, true)?;
                    self.emit_line(&format!("move {}, $v0", r))?;
                    self.bind(r, dst.clone());
                }
            }
            Instruction::Return { value } => {
                if let Some(value) = value {
                    let r = self.pick_reg_for(value, false)?;
                    self.fill(value, r)?;
                    self.emit_line(&format!("move $v0, {}", r))?;
                }
                self.clean_for_branch()?;
                self.emit_line("move $sp, $fp")?;
                self.emit_line("lw $ra, -4($fp)")?;
                self.emit_line("lw $fp, 0($fp)")?;
                self.emit_line("jr $ra")?;
            }
            Instruction::BeginFunc { frame_size } => {
                self.emit_line("subu $sp, $sp, 8")?;
                self.emit_line("sw $fp, 8($sp)")?;
                self.emit_line("sw $ra, 4($sp)")?;
                self.emit_line("addiu $fp, $sp, 8")?;
                if *frame_size > 0 {
                    self.emit_line(&format!("subu $sp, $sp, {}", frame_size))?;
                }
            }
            Instruction::EndFunc => {
                self.emit_instruction(program, inst, &Instruction::Return { value: None })?;
            }
            Instruction::VTable { class_name, methods } => {
                writeln!(self.out, "\t.data")?;
                writeln!(self.out, "\t.align 2")?;
                self.emit_label_line(class_name)?;
                for method in methods {
                    self.emit_line(&format!(".word {}", method))?;
                }
                writeln!(self.out, "\t.text")?;
            }
            Instruction::DiscardValue { loc } => {
                // Marks the register discardable; the actual unbind happens
                // the next time this register is reclaimed (`spill`) or the
                // next branch boundary (`clean_for_branch`), whichever
                // comes first, so a value already in its final resting
                // register doesn't need an immediate store.
                if let Some(reg) = self.descriptor.lookup(loc) {
                    self.regs.get_mut(reg).can_discard = true;
                }
            }
        }
        self.unlock_all();
        Ok(())
    }

    /// Consume the emitter, returning the underlying sink.
    pub fn into_inner(self) -> W {
        self.out
    }
}
