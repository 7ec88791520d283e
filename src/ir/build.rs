//! Construction helpers over [`Program`].
//!
//! `FunctionBuilder` tracks the frame-offset bookkeeping a front-end would
//! otherwise have to repeat at every call site (`GenTempVar`,
//! `GenLocalVariable`, `GenBeginFunc`/`GenEndFunc` in the originating
//! design), and a handful of derived operations
//! (`gen_new`/`gen_dynamic_dispatch`/`gen_subscript`/`gen_new_array`/
//! `gen_array_len`/`gen_halt_with_message`) that expand into the primitive
//! instruction set the same way the originating `CodeGenerator` expanded
//! higher-level constructs. These are IR-construction convenience, not
//! part of the emitter: they only ever push primitive instructions.

use crate::ir::location::VAR_SIZE;
use crate::ir::{BinaryOpcode, Inst, Instruction, Location, Program};

/// First byte offset (relative to `$fp`) available to a function's locals
/// and temporaries. Offset 0 holds the saved `$fp`, offset -4 the saved
/// `$ra`.
pub const OFFSET_TO_FIRST_LOCAL: i32 = -8;

/// First byte offset (relative to `$fp`) of a function's incoming
/// parameters.
pub const OFFSET_TO_FIRST_PARAM: i32 = 4;

/// Well-known runtime labels and their calling convention, mirroring the
/// fixed built-ins table a SPIM runtime stub provides.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Builtin {
    /// `_Alloc(size) -> ptr`
    Alloc,
    /// `_ReadLine() -> ptr`
    ReadLine,
    /// `_ReadInteger() -> int`
    ReadInteger,
    /// `_StringEqual(a, b) -> bool`
    StringEqual,
    /// `_PrintInt(i)`
    PrintInt,
    /// `_PrintString(s)`
    PrintString,
    /// `_PrintBool(b)`
    PrintBool,
    /// `_Halt()`
    Halt,
}

impl Builtin {
    /// The label the runtime stub must define.
    pub fn label(self) -> &'static str {
        match self {
            Builtin::Alloc => "_Alloc",
            Builtin::ReadLine => "_ReadLine",
            Builtin::ReadInteger => "_ReadInteger",
            Builtin::StringEqual => "_StringEqual",
            Builtin::PrintInt => "_PrintInt",
            Builtin::PrintString => "_PrintString",
            Builtin::PrintBool => "_PrintBool",
            Builtin::Halt => "_Halt",
        }
    }

    /// Number of arguments the builtin consumes.
    pub fn num_args(self) -> usize {
        match self {
            Builtin::Alloc
            | Builtin::PrintInt
            | Builtin::PrintString
            | Builtin::PrintBool => 1,
            Builtin::StringEqual => 2,
            Builtin::ReadLine | Builtin::ReadInteger | Builtin::Halt => 0,
        }
    }

    /// Whether a call to this builtin produces a value.
    pub fn has_return(self) -> bool {
        matches!(
            self,
            Builtin::Alloc | Builtin::ReadLine | Builtin::ReadInteger | Builtin::StringEqual
        )
    }
}

/// Builds one function's instructions into a [`Program`], tracking local
/// frame-slot allocation so `BeginFunc`'s frame size can be backfilled once
/// the function is closed.
pub struct FunctionBuilder<'p> {
    program: &'p mut Program,
    begin_func: Inst,
    cur_stack_offset: i32,
    next_temp: u32,
    next_label: u32,
}

impl<'p> FunctionBuilder<'p> {
    /// Open a new function, pushing its `BeginFunc` marker.
    pub fn new(program: &'p mut Program) -> Self {
        let begin_func = program.push(Instruction::BeginFunc { frame_size: 0 });
        FunctionBuilder {
            program,
            begin_func,
            cur_stack_offset: OFFSET_TO_FIRST_LOCAL,
            next_temp: 0,
            next_label: 0,
        }
    }

    /// Allocate a new frame slot and return a fresh compiler temporary
    /// bound to it.
    pub fn gen_temp_var(&mut self) -> Location {
        let name = format!("{}{}", Location::TEMP_PREFIX, self.next_temp);
        self.next_temp += 1;
        let offset = self.cur_stack_offset;
        self.cur_stack_offset -= VAR_SIZE;
        Location::frame(name, offset)
    }

    /// Allocate a new frame slot for a named local variable.
    pub fn gen_local_variable(&mut self, name: impl Into<String>) -> Location {
        let offset = self.cur_stack_offset;
        self.cur_stack_offset -= VAR_SIZE;
        Location::frame(name, offset)
    }

    /// A fresh label name scoped to this function, used by the derived
    /// operations below for bounds-check fallthrough points.
    pub fn fresh_label(&mut self, hint: &str) -> String {
        let n = self.next_label;
        self.next_label += 1;
        format!("_{}{}", hint, n)
    }

    /// Append an instruction, for cases not covered by a named helper.
    pub fn push(&mut self, inst: Instruction) -> Inst {
        self.program.push(inst)
    }

    /// Push a constant load into a fresh temporary.
    pub fn gen_load_constant(&mut self, value: i32) -> Location {
        let dst = self.gen_temp_var();
        self.push(Instruction::LoadConstant {
            dst: dst.clone(),
            value,
        });
        dst
    }

    /// `dst = a op b`, `dst` a fresh temporary.
    pub fn gen_binary_op(&mut self, op: BinaryOpcode, a: Location, b: Location) -> Location {
        let dst = self.gen_temp_var();
        self.push(Instruction::BinaryOp {
            op,
            dst: dst.clone(),
            a,
            b,
        });
        dst
    }

    /// Push one actual argument, right-to-left, for the call that follows.
    pub fn gen_push_param(&mut self, arg: Location) {
        self.push(Instruction::PushParam { arg });
    }

    /// Pop `count` previously pushed arguments (`count * VAR_SIZE` bytes).
    pub fn gen_pop_params(&mut self, count: usize) {
        if count > 0 {
            self.push(Instruction::PopParams {
                bytes: count as i32 * VAR_SIZE,
            });
        }
    }

    /// Direct call. Returns the destination temporary when the callee
    /// produces a value.
    pub fn gen_lcall(&mut self, label: impl Into<String>, has_return: bool) -> Option<Location> {
        let dst = if has_return {
            Some(self.gen_temp_var())
        } else {
            None
        };
        self.push(Instruction::LCall {
            label: label.into(),
            dst: dst.clone(),
        });
        dst
    }

    /// Indirect call through a function-pointer value.
    pub fn gen_acall(&mut self, target: Location, has_return: bool) -> Option<Location> {
        let dst = if has_return {
            Some(self.gen_temp_var())
        } else {
            None
        };
        self.push(Instruction::ACall {
            target,
            dst: dst.clone(),
        });
        dst
    }

    /// Call a well-known runtime builtin with the given arguments, pushed
    /// right-to-left, and pop them afterwards.
    pub fn gen_builtin_call(&mut self, builtin: Builtin, args: &[Location]) -> Option<Location> {
        assert_eq!(args.len(), builtin.num_args(), "builtin arity mismatch");
        for arg in args.iter().rev() {
            self.gen_push_param(arg.clone());
        }
        let dst = self.gen_lcall(builtin.label(), builtin.has_return());
        self.gen_pop_params(args.len());
        dst
    }

    /// A method call: user arguments pushed right-to-left, then the hidden
    /// receiver pushed last.
    pub fn gen_method_call(
        &mut self,
        target: Location,
        receiver: Location,
        args: &[Location],
        has_return: bool,
    ) -> Option<Location> {
        for arg in args.iter().rev() {
            self.gen_push_param(arg.clone());
        }
        self.gen_push_param(receiver);
        let dst = self.gen_acall(target, has_return);
        self.gen_pop_params(args.len() + 1);
        dst
    }

    /// Virtual dispatch: load the receiver's vtable pointer from offset 0,
    /// load the `vtable_offset`th method out of it, and call through that
    /// function pointer. `vtable_offset` is a slot index, scaled here by
    /// [`VAR_SIZE`] to a byte offset.
    pub fn gen_dynamic_dispatch(
        &mut self,
        receiver: Location,
        vtable_offset: i32,
        args: &[Location],
        has_return: bool,
    ) -> Option<Location> {
        let vptr = self.gen_temp_var();
        self.push(Instruction::Load {
            dst: vptr.clone(),
            base: receiver.clone(),
            offset: 0,
        });
        let method = self.gen_temp_var();
        self.push(Instruction::Load {
            dst: method.clone(),
            base: vptr,
            offset: vtable_offset * VAR_SIZE,
        });
        self.gen_method_call(method, receiver, args, has_return)
    }

    /// Allocate a `size_bytes` object and install its vtable pointer at
    /// offset 0. `vtable_label` names the matching `VTable` instruction's
    /// `class_name`.
    pub fn gen_new(&mut self, vtable_label: &str, size_bytes: i32) -> Location {
        let size = self.gen_load_constant(size_bytes);
        let obj = self
            .gen_builtin_call(Builtin::Alloc, &[size])
            .expect("_Alloc returns a value");
        let vtable_ptr = self.gen_temp_var();
        self.push(Instruction::LoadLabel {
            dst: vtable_ptr.clone(),
            label: vtable_label.to_string(),
        });
        self.push(Instruction::Store {
            base: obj.clone(),
            src: vtable_ptr,
            offset: 0,
        });
        obj
    }

    /// Allocate a length-prefixed array of `len` elements (length stored in
    /// the header word at offset 0 of the allocation, with the returned
    /// pointer advanced past it so element 0 sits at the returned address;
    /// [`gen_array_len`] and [`gen_subscript`] then read the header back via
    /// offset -4), after checking `len >= 0`.
    pub fn gen_new_array(&mut self, len: Location, halt_label: &str) -> Location {
        let zero = self.gen_load_constant(0);
        let negative = self.gen_binary_op(BinaryOpcode::Less, len.clone(), zero);
        let zero_again = self.gen_load_constant(0);
        let ok = self.gen_binary_op(BinaryOpcode::Eq, negative, zero_again);
        let cont = self.fresh_label("arrayLenOk");
        self.push(Instruction::IfZ {
            test: ok,
            label: halt_label.to_string(),
        });
        self.push(Instruction::Label { name: cont });

        let four = self.gen_load_constant(VAR_SIZE);
        let data_bytes = self.gen_binary_op(BinaryOpcode::Mul, len.clone(), four);
        let header = self.gen_load_constant(VAR_SIZE);
        let total_bytes = self.gen_binary_op(BinaryOpcode::Add, data_bytes, header);
        let base = self
            .gen_builtin_call(Builtin::Alloc, &[total_bytes])
            .expect("_Alloc returns a value");
        self.push(Instruction::Store {
            base: base.clone(),
            src: len,
            offset: 0,
        });
        let header_size = self.gen_load_constant(VAR_SIZE);
        self.gen_binary_op(BinaryOpcode::Add, base, header_size)
    }

    /// The element count of an array allocated by [`gen_new_array`].
    pub fn gen_array_len(&mut self, array: Location) -> Location {
        let dst = self.gen_temp_var();
        self.push(Instruction::Load {
            dst: dst.clone(),
            base: array,
            offset: -4,
        });
        dst
    }

    /// A bounds-checked element reference: `array[index]`. On an
    /// out-of-range index, jumps to `halt_label` instead of returning.
    /// Returns the frame temporary holding the element's address; callers
    /// issue `Load`/`Store` against it with offset 0.
    pub fn gen_subscript(&mut self, array: Location, index: Location, halt_label: &str) -> Location {
        let len = self.gen_array_len(array.clone());
        let zero = self.gen_load_constant(0);
        let too_small = self.gen_binary_op(BinaryOpcode::Less, index.clone(), zero);
        let zero_again = self.gen_load_constant(0);
        let not_negative = self.gen_binary_op(BinaryOpcode::Eq, too_small, zero_again);
        let in_range = self.gen_binary_op(BinaryOpcode::Less, index.clone(), len);
        let valid = self.gen_binary_op(BinaryOpcode::And, not_negative, in_range);
        self.push(Instruction::IfZ {
            test: valid,
            label: halt_label.to_string(),
        });
        let cont = self.fresh_label("subscriptOk");
        self.push(Instruction::Label { name: cont });

        let four = self.gen_load_constant(VAR_SIZE);
        let scaled = self.gen_binary_op(BinaryOpcode::Mul, index, four);
        let elem_addr = self.gen_binary_op(BinaryOpcode::Add, array, scaled);
        elem_addr
    }

    /// Print `message` then halt, the fixed error-path idiom for a failed
    /// bounds check.
    pub fn gen_halt_with_message(&mut self, message: &str) {
        let dst = self.gen_temp_var();
        self.push(Instruction::LoadStringConstant {
            dst: dst.clone(),
            value: message.to_string(),
        });
        self.gen_builtin_call(Builtin::PrintString, &[dst]);
        self.gen_builtin_call(Builtin::Halt, &[]);
    }

    /// Close the function: backfill `BeginFunc`'s frame size and push
    /// `EndFunc`.
    pub fn end_func(mut self) {
        let frame_size = OFFSET_TO_FIRST_LOCAL - self.cur_stack_offset;
        if let Instruction::BeginFunc { frame_size: slot } = self.program.get_mut(self.begin_func) {
            *slot = frame_size;
        }
        self.push(Instruction::EndFunc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_size_counts_temps_and_locals() {
        let mut program = Program::new();
        {
            let mut f = FunctionBuilder::new(&mut program);
            let _a = f.gen_local_variable("x");
            let _b = f.gen_temp_var();
            let _c = f.gen_temp_var();
            f.end_func();
        }
        let begin = program.iter().next().unwrap();
        match program.get(begin) {
            Instruction::BeginFunc { frame_size } => assert_eq!(*frame_size, 12),
            _ => panic!("expected BeginFunc"),
        }
    }

    #[test]
    fn builtin_call_pushes_and_pops_its_arguments() {
        let mut program = Program::new();
        let mut f = FunctionBuilder::new(&mut program);
        let one = f.gen_load_constant(1);
        f.gen_builtin_call(Builtin::PrintInt, &[one]);
        f.end_func();

        let kinds: Vec<&str> = program
            .iter()
            .map(|i| match program.get(i) {
                Instruction::BeginFunc { .. } => "begin",
                Instruction::LoadConstant { .. } => "loadconst",
                Instruction::PushParam { .. } => "push",
                Instruction::LCall { .. } => "lcall",
                Instruction::PopParams { .. } => "pop",
                Instruction::EndFunc => "end",
                _ => "other",
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["begin", "loadconst", "push", "lcall", "pop", "end"]
        );
    }

    #[test]
    fn new_array_returns_a_pointer_past_its_length_header() {
        let mut program = Program::new();
        let mut f = FunctionBuilder::new(&mut program);
        let len = f.gen_load_constant(3);
        let _array = f.gen_new_array(len, "Lhalt");
        f.end_func();

        let last_is_add_of_var_size = program
            .iter()
            .filter_map(|i| match program.get(i) {
                Instruction::BinaryOp { op: BinaryOpcode::Add, b, .. } => Some(b.clone()),
                _ => None,
            })
            .last()
            .expect("gen_new_array emits an Add to skip past the header");
        // The final Add's right-hand operand is the header-size constant
        // (VAR_SIZE), meaning the base allocation pointer is advanced past
        // the length word rather than having the length written behind it.
        assert!(last_is_add_of_var_size.is_temporary());
    }

    #[test]
    fn dynamic_dispatch_loads_vptr_then_method_before_calling() {
        let mut program = Program::new();
        let mut f = FunctionBuilder::new(&mut program);
        let receiver = f.gen_load_constant(0);
        f.gen_dynamic_dispatch(receiver, 2, &[], false);
        f.end_func();

        let loads: Vec<i32> = program
            .iter()
            .filter_map(|i| match program.get(i) {
                Instruction::Load { offset, .. } => Some(*offset),
                _ => None,
            })
            .collect();
        assert_eq!(loads, vec![0, 2 * VAR_SIZE]);
    }
}
