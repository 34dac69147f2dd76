//! CPU configuration.

/// Which opcode table the CPU decodes with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InstructionSet {
    /// Documented opcodes only. Every undocumented opcode locks the CPU.
    Legal,
    /// Documented plus undocumented opcodes, as NMOS silicon executes them.
    #[default]
    Full,
}

/// Configuration for constructing a CPU instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CpuConfig {
    /// Opcode table selection.
    pub instruction_set: InstructionSet,
    /// Floating-bus constant ORed into A by the unstable ANE and LXA opcodes.
    pub unstable_magic: u8,
    /// Instruction trace ring capacity in entries. Zero disables tracing.
    pub trace_capacity: usize,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            instruction_set: InstructionSet::Full,
            unstable_magic: 0xEE,
            trace_capacity: 256,
        }
    }
}
