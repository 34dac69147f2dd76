//! Arithmetic and shift helpers shared by documented and undocumented
//! opcodes.

use crate::cpu::Mos6502;
use crate::flags::{C, D, N, V, Z};

impl Mos6502 {
    pub(crate) fn adc(&mut self, value: u8) {
        if self.regs.p.is_set(D) {
            self.adc_decimal(value);
        } else {
            self.adc_binary(value);
        }
    }

    fn adc_binary(&mut self, value: u8) {
        let a = self.regs.a;
        let carry = u16::from(self.regs.p.is_set(C));
        let sum = u16::from(a) + u16::from(value) + carry;
        let result = sum as u8;

        self.regs.p.set_if(C, sum > 0xFF);
        self.regs.p.set_if(V, (a ^ result) & (value ^ result) & 0x80 != 0);
        self.regs.a = result;
        self.regs.p.update_nz(result);
    }

    /// NMOS decimal add. Z reflects the binary sum; N and V come from the
    /// high nibble before its decimal adjust.
    fn adc_decimal(&mut self, value: u8) {
        let a = self.regs.a;
        let carry = u16::from(self.regs.p.is_set(C));

        let binary = (u16::from(a) + u16::from(value) + carry) as u8;
        self.regs.p.set_if(Z, binary == 0);

        let mut lo = u16::from(a & 0x0F) + u16::from(value & 0x0F) + carry;
        if lo > 0x09 {
            lo += 0x06;
        }
        let mut hi = u16::from(a >> 4) + u16::from(value >> 4) + u16::from(lo > 0x0F);

        let intermediate = (hi << 4) as u8;
        self.regs.p.set_if(N, intermediate & 0x80 != 0);
        self.regs
            .p
            .set_if(V, (a ^ intermediate) & !(a ^ value) & 0x80 != 0);

        if hi > 0x09 {
            hi += 0x06;
        }
        self.regs.p.set_if(C, hi > 0x0F);
        self.regs.a = ((hi << 4) as u8) | (lo as u8 & 0x0F);
    }

    pub(crate) fn sbc(&mut self, value: u8) {
        let a = self.regs.a;
        let borrow = u16::from(!self.regs.p.is_set(C));
        let diff = u16::from(a)
            .wrapping_sub(u16::from(value))
            .wrapping_sub(borrow);
        let binary = diff as u8;

        // NMOS: every flag comes from the binary subtraction, decimal mode
        // only changes the value written to A.
        self.regs.p.set_if(C, diff < 0x100);
        self.regs.p.set_if(V, (a ^ value) & (a ^ binary) & 0x80 != 0);
        self.regs.p.update_nz(binary);

        if self.regs.p.is_set(D) {
            let borrow = borrow as i16;
            let mut lo = i16::from(a & 0x0F) - i16::from(value & 0x0F) - borrow;
            let mut hi = i16::from(a >> 4) - i16::from(value >> 4);
            if lo < 0 {
                lo -= 6;
                hi -= 1;
            }
            if hi < 0 {
                hi -= 6;
            }
            self.regs.a = ((hi << 4) as u8) | (lo as u8 & 0x0F);
        } else {
            self.regs.a = binary;
        }
    }

    pub(crate) fn compare(&mut self, register: u8, value: u8) {
        let result = register.wrapping_sub(value);
        self.regs.p.set_if(C, register >= value);
        self.regs.p.update_nz(result);
    }

    pub(crate) fn bit(&mut self, value: u8) {
        self.regs.p.set_if(Z, self.regs.a & value == 0);
        self.regs.p.set_if(N, value & 0x80 != 0);
        self.regs.p.set_if(V, value & 0x40 != 0);
    }

    pub(crate) fn asl(&mut self, value: u8) -> u8 {
        self.regs.p.set_if(C, value & 0x80 != 0);
        let result = value << 1;
        self.regs.p.update_nz(result);
        result
    }

    pub(crate) fn lsr(&mut self, value: u8) -> u8 {
        self.regs.p.set_if(C, value & 0x01 != 0);
        let result = value >> 1;
        self.regs.p.update_nz(result);
        result
    }

    pub(crate) fn rol(&mut self, value: u8) -> u8 {
        let carry_in = u8::from(self.regs.p.is_set(C));
        self.regs.p.set_if(C, value & 0x80 != 0);
        let result = (value << 1) | carry_in;
        self.regs.p.update_nz(result);
        result
    }

    pub(crate) fn ror(&mut self, value: u8) -> u8 {
        let carry_in = if self.regs.p.is_set(C) { 0x80 } else { 0 };
        self.regs.p.set_if(C, value & 0x01 != 0);
        let result = (value >> 1) | carry_in;
        self.regs.p.update_nz(result);
        result
    }

    /// ARR: AND then rotate right, with adder-derived C and V. In decimal
    /// mode each nibble is then fixed up separately.
    pub(crate) fn arr(&mut self, value: u8) {
        let and = self.regs.a & value;
        let carry_in = if self.regs.p.is_set(C) { 0x80 } else { 0 };
        let mut result = (and >> 1) | carry_in;

        if self.regs.p.is_set(D) {
            self.regs.p.set_if(N, carry_in != 0);
            self.regs.p.set_if(Z, result == 0);
            self.regs.p.set_if(V, (result ^ and) & 0x40 != 0);

            if (and & 0x0F) + (and & 0x01) > 0x05 {
                result = (result & 0xF0) | (result.wrapping_add(0x06) & 0x0F);
            }
            let carry = u16::from(and & 0xF0) + u16::from(and & 0x10) > 0x50;
            if carry {
                result = result.wrapping_add(0x60);
            }
            self.regs.p.set_if(C, carry);
        } else {
            self.regs.p.update_nz(result);
            self.regs.p.set_if(C, result & 0x40 != 0);
            self.regs
                .p
                .set_if(V, ((result >> 6) ^ (result >> 5)) & 0x01 != 0);
        }
        self.regs.a = result;
    }
}
