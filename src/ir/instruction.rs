//! The closed set of three-address-code instruction kinds.

use crate::ir::Location;
use smallvec::SmallVec;

/// Binary operators available to [`Instruction::BinaryOp`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOpcode {
    /// Integer addition.
    Add,
    /// Integer subtraction.
    Sub,
    /// Integer multiplication.
    Mul,
    /// Integer division.
    Div,
    /// Integer remainder.
    Mod,
    /// Equality comparison, result is 0 or 1.
    Eq,
    /// Less-than comparison, result is 0 or 1.
    Less,
    /// Logical and.
    And,
    /// Logical or.
    Or,
}

/// One three-address-code instruction.
///
/// Operand counts (`numVars` in the original description) are exposed
/// through [`Instruction::operands`], which the last-use pass and the
/// register-descriptor diagnostics walk generically; the emitter itself
/// matches on the concrete variant.
#[derive(Clone, Debug)]
pub enum Instruction {
    /// Load a small integer constant into `dst`.
    LoadConstant {
        /// Destination.
        dst: Location,
        /// Constant value.
        value: i32,
    },
    /// Load the address of a freshly interned string literal into `dst`.
    LoadStringConstant {
        /// Destination.
        dst: Location,
        /// String contents (without surrounding quotes).
        value: String,
    },
    /// Load the address of a code label into `dst`.
    LoadLabel {
        /// Destination.
        dst: Location,
        /// Target label name.
        label: String,
    },
    /// Copy `src` into `dst`.
    Assign {
        /// Destination.
        dst: Location,
        /// Source.
        src: Location,
    },
    /// Load the word at `base + offset` into `dst`.
    Load {
        /// Destination.
        dst: Location,
        /// Base address operand.
        base: Location,
        /// Constant byte offset.
        offset: i32,
    },
    /// Store `src` at `base + offset`.
    Store {
        /// Base address operand.
        base: Location,
        /// Value to store.
        src: Location,
        /// Constant byte offset.
        offset: i32,
    },
    /// Evaluate `dst = a op b`.
    BinaryOp {
        /// Operator.
        op: BinaryOpcode,
        /// Destination.
        dst: Location,
        /// Left operand.
        a: Location,
        /// Right operand.
        b: Location,
    },
    /// Define a jump target.
    Label {
        /// Label name, unique within its function.
        name: String,
    },
    /// Unconditional jump.
    Goto {
        /// Target label name.
        label: String,
    },
    /// Jump to `label` if `test` is zero.
    IfZ {
        /// Condition operand.
        test: Location,
        /// Target label name.
        label: String,
    },
    /// Push one actual argument for the next call.
    PushParam {
        /// Argument value.
        arg: Location,
    },
    /// Pop `bytes` of previously pushed arguments after a call returns.
    PopParams {
        /// Byte count, a multiple of [`crate::ir::location::VAR_SIZE`].
        bytes: i32,
    },
    /// Direct call to a statically known label.
    LCall {
        /// Callee label.
        label: String,
        /// Where to store the return value, if any.
        dst: Option<Location>,
    },
    /// Indirect call through a function-pointer value (dynamic dispatch).
    ACall {
        /// Location holding the function pointer.
        target: Location,
        /// Where to store the return value, if any.
        dst: Option<Location>,
    },
    /// Return from the enclosing function.
    Return {
        /// Value to return, if any.
        value: Option<Location>,
    },
    /// Function entry marker. `frame_size` is backfilled by the driver once
    /// the matching `EndFunc` is reached.
    BeginFunc {
        /// Total frame size in bytes, filled in after all locals in this
        /// function have been allocated.
        frame_size: i32,
    },
    /// Function exit marker.
    EndFunc,
    /// A class's virtual dispatch table: method labels in declaration
    /// order.
    VTable {
        /// Class name, used as the table's label.
        class_name: String,
        /// Method labels, in vtable slot order.
        methods: Vec<String>,
    },
    /// Synthetic instruction inserted by the driver immediately after a
    /// temporary's last use, telling the emitter its register may be
    /// reclaimed without a spill. Never appears in front-end-produced
    /// input.
    DiscardValue {
        /// The temporary being discarded.
        loc: Location,
    },
}

impl Instruction {
    /// The operand locations this instruction reads or writes, in the
    /// order used to detect last-use (`varA`, `varB`, `varC`).
    pub fn operands(&self) -> SmallVec<[&Location; 3]> {
        match self {
            Instruction::LoadConstant { dst, .. } => smallvec::smallvec![dst],
            Instruction::LoadStringConstant { dst, .. } => smallvec::smallvec![dst],
            Instruction::LoadLabel { dst, .. } => smallvec::smallvec![dst],
            Instruction::Assign { dst, src } => smallvec::smallvec![dst, src],
            Instruction::Load { dst, base, .. } => smallvec::smallvec![dst, base],
            Instruction::Store { base, src, .. } => smallvec::smallvec![base, src],
            Instruction::BinaryOp { dst, a, b, .. } => smallvec::smallvec![dst, a, b],
            Instruction::Label { .. } => SmallVec::new(),
            Instruction::Goto { .. } => SmallVec::new(),
            Instruction::IfZ { test, .. } => smallvec::smallvec![test],
            Instruction::PushParam { arg } => smallvec::smallvec![arg],
            Instruction::PopParams { .. } => SmallVec::new(),
            Instruction::LCall { dst, .. } => dst.iter().collect(),
            Instruction::ACall { target, dst } => {
                let mut v: SmallVec<[&Location; 3]> = smallvec::smallvec![target];
                v.extend(dst.iter());
                v
            }
            Instruction::Return { value } => value.iter().collect(),
            Instruction::BeginFunc { .. } => SmallVec::new(),
            Instruction::EndFunc => SmallVec::new(),
            Instruction::VTable { .. } => SmallVec::new(),
            Instruction::DiscardValue { loc } => smallvec::smallvec![loc],
        }
    }

    /// The label this instruction transfers control to, if it is a
    /// control-transfer instruction that names one directly. `LCall`'s
    /// label is a callee, not a same-function jump target, and the CFG
    /// builder treats it the same way as `Goto`/`IfZ`.
    pub fn jump_target(&self) -> Option<&str> {
        match self {
            Instruction::Goto { label } => Some(label),
            Instruction::IfZ { label, .. } => Some(label),
            Instruction::LCall { label, .. } => Some(label),
            _ => None,
        }
    }

    /// True for `Goto`, `IfZ`, `LCall`, `ACall` and `Return`: the
    /// instructions that force every dirty scratch register to be spilled
    /// before they execute.
    pub fn is_branch_boundary(&self) -> bool {
        matches!(
            self,
            Instruction::Label { .. }
                | Instruction::Goto { .. }
                | Instruction::IfZ { .. }
                | Instruction::LCall { .. }
                | Instruction::ACall { .. }
                | Instruction::Return { .. }
        )
    }
}
