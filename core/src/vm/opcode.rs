use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use std::fmt;

/// Inline operand layout following an opcode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operands {
    None,
    /// 16-bit absolute branch target at an even offset.
    Target,
    /// One count or index byte.
    Byte,
    /// 32-bit immediate at a multiple-of-4 offset.
    Word,
    /// Count byte followed by that many offset bytes.
    ByteList,
    /// Source count, destination count, then destination-count index bytes.
    Swizzle,
    /// Lane count, sub-opcode, then the sub-opcode's own operands.
    Vector,
}

macro_rules! opcodes {
    ($($variant:ident = $byte:literal, $name:literal, $operands:ident;)*) => {
        /// Byte-code instruction set.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum Opcode {
            $($variant = $byte,)*
        }

        impl Opcode {
            pub const ALL: &'static [Opcode] = &[$(Opcode::$variant,)*];

            #[inline]
            pub fn from_byte(byte: u8) -> Option<Opcode> {
                match byte {
                    $($byte => Some(Opcode::$variant),)*
                    _ => None,
                }
            }

            pub fn mnemonic(self) -> &'static str {
                match self {
                    $(Opcode::$variant => $name,)*
                }
            }

            pub fn operands(self) -> Operands {
                match self {
                    $(Opcode::$variant => Operands::$operands,)*
                }
            }
        }
    };
}

opcodes! {
    AddF = 0x00, "addf", None;
    AddI = 0x01, "addi", None;
    AndB = 0x02, "andb", None;
    AndI = 0x03, "andi", None;
    Branch = 0x04, "branch", Target;
    CompareIEq = 0x05, "compareieq", None;
    CompareINeq = 0x06, "compareineq", None;
    CompareFEq = 0x07, "comparefeq", None;
    CompareFGt = 0x08, "comparefgt", None;
    CompareFGtEq = 0x09, "comparefgteq", None;
    CompareFLt = 0x0A, "compareflt", None;
    CompareFLtEq = 0x0B, "compareflteq", None;
    CompareFNeq = 0x0C, "comparefneq", None;
    CompareSGt = 0x0D, "comparesgt", None;
    CompareSGtEq = 0x0E, "comparesgteq", None;
    CompareSLt = 0x0F, "compareslt", None;
    CompareSLtEq = 0x10, "compareslteq", None;
    CompareUGt = 0x11, "compareugt", None;
    CompareUGtEq = 0x12, "compareugteq", None;
    CompareULt = 0x13, "compareult", None;
    CompareULtEq = 0x14, "compareulteq", None;
    ConditionalBranch = 0x15, "conditionalbranch", Target;
    DebugPrint = 0x16, "debugprint", None;
    DivideF = 0x17, "dividef", None;
    DivideS = 0x18, "divides", None;
    DivideU = 0x19, "divideu", None;
    Dup = 0x1A, "dup", None;
    DupDown = 0x1B, "dupdown", Byte;
    FloatToInt = 0x1C, "floattoint", None;
    Load = 0x1D, "load", None;
    LoadGlobal = 0x1E, "loadglobal", Byte;
    LoadSwizzle = 0x1F, "loadswizzle", ByteList;
    MultiplyF = 0x20, "multiplyf", None;
    MultiplyS = 0x21, "multiplys", None;
    MultiplyU = 0x22, "multiplyu", None;
    NegateF = 0x23, "negatef", None;
    NegateS = 0x24, "negates", None;
    Nop = 0x25, "nop", None;
    Not = 0x26, "not", None;
    OrB = 0x27, "orb", None;
    OrI = 0x28, "ori", None;
    Parameter = 0x29, "parameter", None;
    Pop = 0x2A, "pop", Byte;
    PushImmediate = 0x2B, "pushimmediate", Word;
    RemainderS = 0x2C, "remainders", None;
    RemainderU = 0x2D, "remainderu", None;
    Return = 0x2E, "return", Byte;
    SignedToFloat = 0x2F, "signedtofloat", None;
    Store = 0x30, "store", None;
    StoreGlobal = 0x31, "storeglobal", None;
    StoreSwizzle = 0x32, "storeswizzle", ByteList;
    SubtractF = 0x33, "subtractf", None;
    SubtractI = 0x34, "subtracti", None;
    Swizzle = 0x35, "swizzle", Swizzle;
    UnsignedToFloat = 0x36, "unsignedtofloat", None;
    Vector = 0x37, "vector", Vector;
}

static BY_MNEMONIC: Lazy<FxHashMap<&'static str, Opcode>> =
    Lazy::new(|| Opcode::ALL.iter().map(|op| (op.mnemonic(), *op)).collect());

impl Opcode {
    #[inline]
    pub fn byte(self) -> u8 {
        self as u8
    }

    pub fn from_mnemonic(name: &str) -> Option<Opcode> {
        BY_MNEMONIC.get(name).copied()
    }

    /// Two-operand arithmetic or comparison: pops the right operand and
    /// replaces the left one with the result.
    pub fn is_binary(self) -> bool {
        use Opcode::*;
        matches!(
            self,
            AddF | AddI
                | CompareIEq
                | CompareINeq
                | CompareFEq
                | CompareFGt
                | CompareFGtEq
                | CompareFLt
                | CompareFLtEq
                | CompareFNeq
                | CompareSGt
                | CompareSGtEq
                | CompareSLt
                | CompareSLtEq
                | CompareUGt
                | CompareUGtEq
                | CompareULt
                | CompareULtEq
                | DivideF
                | DivideS
                | DivideU
                | MultiplyF
                | MultiplyS
                | MultiplyU
                | RemainderS
                | RemainderU
                | SubtractF
                | SubtractI
        )
    }

    /// Rewrites the top slot in place.
    pub fn is_unary(self) -> bool {
        matches!(
            self,
            Opcode::FloatToInt
                | Opcode::SignedToFloat
                | Opcode::UnsignedToFloat
                | Opcode::NegateF
                | Opcode::NegateS
                | Opcode::Not
        )
    }

    /// Listed in the instruction set but never executed by the interpreter.
    pub fn is_reserved(self) -> bool {
        matches!(self, Opcode::AndB | Opcode::AndI | Opcode::OrB | Opcode::OrI | Opcode::Parameter)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
