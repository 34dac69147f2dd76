//! Register writes by name, for monitors and scripted test setups.

use std::fmt;
use std::str::FromStr;

use crate::cpu::Mos6502;
use crate::flags::{C, D, I, N, V, Z};

/// Register or flag addressable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterName {
    Pc,
    A,
    X,
    Y,
    Sp,
    Sr,
    /// Single status flag, by mask.
    Flag(u8),
}

impl FromStr for RegisterName {
    type Err = PokeError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let lower = name.trim().to_ascii_lowercase();
        let flag = lower.strip_prefix("flags.").unwrap_or(&lower);
        Ok(match flag {
            "pc" => Self::Pc,
            "a" => Self::A,
            "x" => Self::X,
            "y" => Self::Y,
            "sp" | "s" => Self::Sp,
            "sr" | "p" => Self::Sr,
            "c" => Self::Flag(C),
            "z" => Self::Flag(Z),
            "i" => Self::Flag(I),
            "d" => Self::Flag(D),
            "v" => Self::Flag(V),
            "n" => Self::Flag(N),
            _ => return Err(PokeError::UnknownRegister(name.to_string())),
        })
    }
}

/// Error from a register poke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PokeError {
    UnknownRegister(String),
    InvalidValue(String),
}

impl fmt::Display for PokeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownRegister(name) => write!(f, "unknown register: {name}"),
            Self::InvalidValue(value) => write!(f, "invalid value: {value}"),
        }
    }
}

impl std::error::Error for PokeError {}

/// Parse `$FF`, `0xFF`, `%1010` or decimal.
///
/// Only the low 32 bits are kept, so an over-long value is masked to the
/// register width like any other.
pub fn parse_value(text: &str) -> Result<u32, PokeError> {
    let t = text.trim();
    let (digits, radix) = if let Some(hex) = t.strip_prefix('$') {
        (hex, 16)
    } else if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        (hex, 16)
    } else if let Some(bin) = t.strip_prefix('%') {
        (bin, 2)
    } else {
        (t, 10)
    };
    let invalid = || PokeError::InvalidValue(text.to_string());
    if digits.is_empty() {
        return Err(invalid());
    }
    digits.chars().try_fold(0u32, |value, c| -> Result<u32, PokeError> {
        let digit = c.to_digit(radix).ok_or_else(invalid)?;
        Ok(value.wrapping_mul(radix).wrapping_add(digit))
    })
}

impl Mos6502 {
    /// Write a register. Values are masked to the register width; flags
    /// are set by any non-zero value.
    pub fn set_register(&mut self, register: RegisterName, value: u32) {
        match register {
            RegisterName::Pc => self.set_pc(value as u16),
            RegisterName::A => self.set_a(value as u8),
            RegisterName::X => self.set_x(value as u8),
            RegisterName::Y => self.set_y(value as u8),
            RegisterName::Sp => self.set_sp(value as u8),
            RegisterName::Sr => self.set_sr(value as u8),
            RegisterName::Flag(mask) => self.set_flag(mask, value != 0),
        }
    }

    /// Parse a register name and value and write it.
    pub fn poke(&mut self, name: &str, value: &str) -> Result<(), PokeError> {
        let register: RegisterName = name.parse()?;
        let value = parse_value(value)?;
        self.set_register(register, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_formats() {
        assert_eq!(parse_value("$1F"), Ok(0x1F));
        assert_eq!(parse_value("0xC000"), Ok(0xC000));
        assert_eq!(parse_value("%101"), Ok(5));
        assert_eq!(parse_value(" 42 "), Ok(42));
        assert!(matches!(parse_value("zz"), Err(PokeError::InvalidValue(_))));
        assert!(matches!(parse_value("$"), Err(PokeError::InvalidValue(_))));
    }

    #[test]
    fn wide_values_keep_low_bits() {
        assert_eq!(parse_value("$1FFFFFFFF"), Ok(0xFFFF_FFFF));
        assert_eq!(parse_value("4294967297"), Ok(1));

        let mut cpu = Mos6502::new();
        cpu.poke("a", "$1FFFFFFFF").expect("poke a");
        assert_eq!(cpu.a(), 0xFF);
        cpu.poke("pc", "0x1234567890").expect("poke pc");
        assert_eq!(cpu.pc(), 0x7890);
    }

    #[test]
    fn poke_masks_to_width() {
        let mut cpu = Mos6502::new();
        cpu.poke("a", "$1FF").expect("poke a");
        assert_eq!(cpu.a(), 0xFF);
        cpu.poke("PC", "0x12345").expect("poke pc");
        assert_eq!(cpu.pc(), 0x2345);
    }

    #[test]
    fn poke_flag_and_status() {
        let mut cpu = Mos6502::new();
        cpu.poke("flags.c", "1").expect("poke carry");
        assert!(cpu.flag(C));
        cpu.poke("sr", "$00").expect("poke sr");
        assert_eq!(cpu.sr(), 0x30);
    }

    #[test]
    fn unknown_register_is_reported() {
        let mut cpu = Mos6502::new();
        let err = cpu.poke("q", "1").expect_err("q is not a register");
        assert_eq!(err.to_string(), "unknown register: q");
    }
}
