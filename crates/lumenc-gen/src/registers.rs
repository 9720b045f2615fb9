//! The two disjoint register pools used during expression lowering.
//!
//! Each physical register has a name per operand width; `ValueType::size`
//! picks the width. `Str` values (8-byte pointers) and `I64` share the
//! 64-bit names; everything 4 bytes or smaller uses the 32-bit name, since
//! the language never emits byte- or word-sized arithmetic directly (`Bool`
//! and `Char` are loaded and compared via their 32-bit alias, matching how
//! `movzx` widens them on load).

use lumenc_util::ValueType;

/// `rax, rdi, rsi, rdx, rcx, r8, r9`, index 0 is the return-value register.
/// Index 3 (`rdx`) is skipped by the allocator for ordinary arithmetic so it
/// stays free for `idiv`'s remainder.
pub const CALLER_SAVED: [Physical; 7] = [
    Physical::Rax,
    Physical::Rdi,
    Physical::Rsi,
    Physical::Rdx,
    Physical::Rcx,
    Physical::R8,
    Physical::R9,
];

/// `CALLER_SAVED` with `rdx` skipped, in allocation order — the pool the
/// emitter actually draws from for ordinary (non-`idiv`) arithmetic.
pub const CALLER_SAVED_NO_RDX: [Physical; 6] = [
    Physical::Rax,
    Physical::Rdi,
    Physical::Rsi,
    Physical::Rcx,
    Physical::R8,
    Physical::R9,
];

/// `rbx, r12, r13, r14, r15` — preserved across `call`.
pub const CALLEE_SAVED: [Physical; 5] = [
    Physical::Rbx,
    Physical::R12,
    Physical::R13,
    Physical::R14,
    Physical::R15,
];

/// The SysV argument-passing order, used at call sites.
pub const ARG_REGISTERS: [Physical; 6] = [
    Physical::Rdi,
    Physical::Rsi,
    Physical::Rdx,
    Physical::Rcx,
    Physical::R8,
    Physical::R9,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Physical {
    Rax,
    Rdi,
    Rsi,
    Rdx,
    Rcx,
    R8,
    R9,
    Rbx,
    R12,
    R13,
    R14,
    R15,
}

impl Physical {
    /// The assembler mnemonic for this register at the width `ty` requires.
    pub fn name(self, ty: ValueType) -> &'static str {
        let wide = ty.size() > 4;
        match (self, wide) {
            (Physical::Rax, false) => "eax",
            (Physical::Rax, true) => "rax",
            (Physical::Rdi, false) => "edi",
            (Physical::Rdi, true) => "rdi",
            (Physical::Rsi, false) => "esi",
            (Physical::Rsi, true) => "rsi",
            (Physical::Rdx, false) => "edx",
            (Physical::Rdx, true) => "rdx",
            (Physical::Rcx, false) => "ecx",
            (Physical::Rcx, true) => "rcx",
            (Physical::R8, false) => "r8d",
            (Physical::R8, true) => "r8",
            (Physical::R9, false) => "r9d",
            (Physical::R9, true) => "r9",
            (Physical::Rbx, false) => "ebx",
            (Physical::Rbx, true) => "rbx",
            (Physical::R12, false) => "r12d",
            (Physical::R12, true) => "r12",
            (Physical::R13, false) => "r13d",
            (Physical::R13, true) => "r13",
            (Physical::R14, false) => "r14d",
            (Physical::R14, true) => "r14",
            (Physical::R15, false) => "r15d",
            (Physical::R15, true) => "r15",
        }
    }

    /// The 8-bit alias used to receive `setCC` output before `movzx`.
    pub fn byte_name(self) -> &'static str {
        match self {
            Physical::Rax => "al",
            Physical::Rdi => "dil",
            Physical::Rsi => "sil",
            Physical::Rdx => "dl",
            Physical::Rcx => "cl",
            Physical::R8 => "r8b",
            Physical::R9 => "r9b",
            Physical::Rbx => "bl",
            Physical::R12 => "r12b",
            Physical::R13 => "r13b",
            Physical::R14 => "r14b",
            Physical::R15 => "r15b",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rdx_is_the_fourth_caller_saved_slot() {
        assert_eq!(CALLER_SAVED[3], Physical::Rdx);
    }

    #[test]
    fn register_names_widen_for_eight_byte_types() {
        assert_eq!(Physical::Rax.name(ValueType::I32), "eax");
        assert_eq!(Physical::Rax.name(ValueType::I64), "rax");
    }
}
