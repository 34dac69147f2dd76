//! Opcode decode tables.
//!
//! Two 256-entry tables are built at compile time: the full NMOS table with
//! every undocumented opcode, and a legal-only table derived from it where
//! each undocumented row decodes as a lock-up.

use crate::config::InstructionSet;

/// Instruction mnemonics, documented and undocumented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    Adc,
    And,
    Asl,
    Bcc,
    Bcs,
    Beq,
    Bit,
    Bmi,
    Bne,
    Bpl,
    Brk,
    Bvc,
    Bvs,
    Clc,
    Cld,
    Cli,
    Clv,
    Cmp,
    Cpx,
    Cpy,
    Dec,
    Dex,
    Dey,
    Eor,
    Inc,
    Inx,
    Iny,
    Jmp,
    Jsr,
    Lda,
    Ldx,
    Ldy,
    Lsr,
    Nop,
    Ora,
    Pha,
    Php,
    Pla,
    Plp,
    Rol,
    Ror,
    Rti,
    Rts,
    Sbc,
    Sec,
    Sed,
    Sei,
    Sta,
    Stx,
    Sty,
    Tax,
    Tay,
    Tsx,
    Txa,
    Txs,
    Tya,
    // Undocumented
    Alr,
    Anc,
    Ane,
    Arr,
    Dcp,
    Isc,
    Las,
    Lax,
    Lxa,
    Rla,
    Rra,
    Sax,
    Sbx,
    Sha,
    Shx,
    Shy,
    Slo,
    Sre,
    Tas,
}

/// The 13 NMOS addressing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddrMode {
    /// No operand.
    Implied,
    /// Operates on A.
    Accumulator,
    /// #$nn
    Immediate,
    /// $nn
    ZeroPage,
    /// $nn,X (wraps within page zero)
    ZeroPageX,
    /// $nn,Y (wraps within page zero)
    ZeroPageY,
    /// $nnnn
    Absolute,
    /// $nnnn,X
    AbsoluteX,
    /// $nnnn,Y
    AbsoluteY,
    /// ($nnnn), JMP only. The high byte never carries out of the page.
    Indirect,
    /// ($nn,X)
    IndexedIndirect,
    /// ($nn),Y
    IndirectIndexed,
    /// Signed 8-bit branch offset.
    Relative,
}

/// One row of the decode table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    /// Decoded instruction. `None` locks the CPU up.
    pub instruction: Option<Instruction>,
    pub mode: AddrMode,
    /// Base cycle count.
    pub cycles: u8,
    /// One extra cycle when indexing crosses a page.
    pub page_penalty: bool,
    /// Memory read-modify-write: the modify and write happen on the last
    /// two cycles instead of at decode.
    pub deferred: bool,
    /// Not part of the documented instruction set.
    pub undocumented: bool,
}

const IMP: AddrMode = AddrMode::Implied;
const ACC: AddrMode = AddrMode::Accumulator;
const IMM: AddrMode = AddrMode::Immediate;
const ZP: AddrMode = AddrMode::ZeroPage;
const ZPX: AddrMode = AddrMode::ZeroPageX;
const ZPY: AddrMode = AddrMode::ZeroPageY;
const ABS: AddrMode = AddrMode::Absolute;
const ABX: AddrMode = AddrMode::AbsoluteX;
const ABY: AddrMode = AddrMode::AbsoluteY;
const IND: AddrMode = AddrMode::Indirect;
const IZX: AddrMode = AddrMode::IndexedIndirect;
const IZY: AddrMode = AddrMode::IndirectIndexed;
const REL: AddrMode = AddrMode::Relative;

const fn row(
    instruction: Instruction,
    mode: AddrMode,
    cycles: u8,
    page_penalty: bool,
    deferred: bool,
    undocumented: bool,
) -> Opcode {
    Opcode {
        instruction: Some(instruction),
        mode,
        cycles,
        page_penalty,
        deferred,
        undocumented,
    }
}

const fn op(i: Instruction, m: AddrMode, c: u8) -> Opcode {
    row(i, m, c, false, false, false)
}

const fn page(i: Instruction, m: AddrMode, c: u8) -> Opcode {
    row(i, m, c, true, false, false)
}

const fn rmw(i: Instruction, m: AddrMode, c: u8) -> Opcode {
    row(i, m, c, false, true, false)
}

const fn undoc(i: Instruction, m: AddrMode, c: u8) -> Opcode {
    row(i, m, c, false, false, true)
}

const fn upage(i: Instruction, m: AddrMode, c: u8) -> Opcode {
    row(i, m, c, true, false, true)
}

const fn urmw(i: Instruction, m: AddrMode, c: u8) -> Opcode {
    row(i, m, c, false, true, true)
}

const fn jam() -> Opcode {
    Opcode {
        instruction: None,
        mode: IMP,
        cycles: 0,
        page_penalty: false,
        deferred: false,
        undocumented: true,
    }
}

#[allow(clippy::enum_glob_use)]
use Instruction::*;

#[rustfmt::skip]
const FULL_TABLE: [Opcode; 256] = [
    op(Brk, IMP, 7),                   // $00 BRK imp
    op(Ora, IZX, 6),                   // $01 ORA izx
    jam(),                             // $02 JAM
    urmw(Slo, IZX, 8),                 // $03 SLO izx
    undoc(Nop, ZP, 3),                 // $04 NOP zp
    op(Ora, ZP, 3),                    // $05 ORA zp
    rmw(Asl, ZP, 5),                   // $06 ASL zp
    urmw(Slo, ZP, 5),                  // $07 SLO zp
    op(Php, IMP, 3),                   // $08 PHP imp
    op(Ora, IMM, 2),                   // $09 ORA imm
    op(Asl, ACC, 2),                   // $0A ASL acc
    undoc(Anc, IMM, 2),                // $0B ANC imm
    undoc(Nop, ABS, 4),                // $0C NOP abs
    op(Ora, ABS, 4),                   // $0D ORA abs
    rmw(Asl, ABS, 6),                  // $0E ASL abs
    urmw(Slo, ABS, 6),                 // $0F SLO abs
    op(Bpl, REL, 2),                   // $10 BPL rel
    page(Ora, IZY, 5),                 // $11 ORA izy
    jam(),                             // $12 JAM
    urmw(Slo, IZY, 8),                 // $13 SLO izy
    undoc(Nop, ZPX, 4),                // $14 NOP zpx
    op(Ora, ZPX, 4),                   // $15 ORA zpx
    rmw(Asl, ZPX, 6),                  // $16 ASL zpx
    urmw(Slo, ZPX, 6),                 // $17 SLO zpx
    op(Clc, IMP, 2),                   // $18 CLC imp
    page(Ora, ABY, 4),                 // $19 ORA aby
    undoc(Nop, IMP, 2),                // $1A NOP imp
    urmw(Slo, ABY, 7),                 // $1B SLO aby
    upage(Nop, ABX, 4),                // $1C NOP abx
    page(Ora, ABX, 4),                 // $1D ORA abx
    rmw(Asl, ABX, 7),                  // $1E ASL abx
    urmw(Slo, ABX, 7),                 // $1F SLO abx
    op(Jsr, ABS, 6),                   // $20 JSR abs
    op(And, IZX, 6),                   // $21 AND izx
    jam(),                             // $22 JAM
    urmw(Rla, IZX, 8),                 // $23 RLA izx
    op(Bit, ZP, 3),                    // $24 BIT zp
    op(And, ZP, 3),                    // $25 AND zp
    rmw(Rol, ZP, 5),                   // $26 ROL zp
    urmw(Rla, ZP, 5),                  // $27 RLA zp
    op(Plp, IMP, 4),                   // $28 PLP imp
    op(And, IMM, 2),                   // $29 AND imm
    op(Rol, ACC, 2),                   // $2A ROL acc
    undoc(Anc, IMM, 2),                // $2B ANC imm
    op(Bit, ABS, 4),                   // $2C BIT abs
    op(And, ABS, 4),                   // $2D AND abs
    rmw(Rol, ABS, 6),                  // $2E ROL abs
    urmw(Rla, ABS, 6),                 // $2F RLA abs
    op(Bmi, REL, 2),                   // $30 BMI rel
    page(And, IZY, 5),                 // $31 AND izy
    jam(),                             // $32 JAM
    urmw(Rla, IZY, 8),                 // $33 RLA izy
    undoc(Nop, ZPX, 4),                // $34 NOP zpx
    op(And, ZPX, 4),                   // $35 AND zpx
    rmw(Rol, ZPX, 6),                  // $36 ROL zpx
    urmw(Rla, ZPX, 6),                 // $37 RLA zpx
    op(Sec, IMP, 2),                   // $38 SEC imp
    page(And, ABY, 4),                 // $39 AND aby
    undoc(Nop, IMP, 2),                // $3A NOP imp
    urmw(Rla, ABY, 7),                 // $3B RLA aby
    upage(Nop, ABX, 4),                // $3C NOP abx
    page(And, ABX, 4),                 // $3D AND abx
    rmw(Rol, ABX, 7),                  // $3E ROL abx
    urmw(Rla, ABX, 7),                 // $3F RLA abx
    op(Rti, IMP, 6),                   // $40 RTI imp
    op(Eor, IZX, 6),                   // $41 EOR izx
    jam(),                             // $42 JAM
    urmw(Sre, IZX, 8),                 // $43 SRE izx
    undoc(Nop, ZP, 3),                 // $44 NOP zp
    op(Eor, ZP, 3),                    // $45 EOR zp
    rmw(Lsr, ZP, 5),                   // $46 LSR zp
    urmw(Sre, ZP, 5),                  // $47 SRE zp
    op(Pha, IMP, 3),                   // $48 PHA imp
    op(Eor, IMM, 2),                   // $49 EOR imm
    op(Lsr, ACC, 2),                   // $4A LSR acc
    undoc(Alr, IMM, 2),                // $4B ALR imm
    op(Jmp, ABS, 3),                   // $4C JMP abs
    op(Eor, ABS, 4),                   // $4D EOR abs
    rmw(Lsr, ABS, 6),                  // $4E LSR abs
    urmw(Sre, ABS, 6),                 // $4F SRE abs
    op(Bvc, REL, 2),                   // $50 BVC rel
    page(Eor, IZY, 5),                 // $51 EOR izy
    jam(),                             // $52 JAM
    urmw(Sre, IZY, 8),                 // $53 SRE izy
    undoc(Nop, ZPX, 4),                // $54 NOP zpx
    op(Eor, ZPX, 4),                   // $55 EOR zpx
    rmw(Lsr, ZPX, 6),                  // $56 LSR zpx
    urmw(Sre, ZPX, 6),                 // $57 SRE zpx
    op(Cli, IMP, 2),                   // $58 CLI imp
    page(Eor, ABY, 4),                 // $59 EOR aby
    undoc(Nop, IMP, 2),                // $5A NOP imp
    urmw(Sre, ABY, 7),                 // $5B SRE aby
    upage(Nop, ABX, 4),                // $5C NOP abx
    page(Eor, ABX, 4),                 // $5D EOR abx
    rmw(Lsr, ABX, 7),                  // $5E LSR abx
    urmw(Sre, ABX, 7),                 // $5F SRE abx
    op(Rts, IMP, 6),                   // $60 RTS imp
    op(Adc, IZX, 6),                   // $61 ADC izx
    jam(),                             // $62 JAM
    urmw(Rra, IZX, 8),                 // $63 RRA izx
    undoc(Nop, ZP, 3),                 // $64 NOP zp
    op(Adc, ZP, 3),                    // $65 ADC zp
    rmw(Ror, ZP, 5),                   // $66 ROR zp
    urmw(Rra, ZP, 5),                  // $67 RRA zp
    op(Pla, IMP, 4),                   // $68 PLA imp
    op(Adc, IMM, 2),                   // $69 ADC imm
    op(Ror, ACC, 2),                   // $6A ROR acc
    undoc(Arr, IMM, 2),                // $6B ARR imm
    op(Jmp, IND, 5),                   // $6C JMP ind
    op(Adc, ABS, 4),                   // $6D ADC abs
    rmw(Ror, ABS, 6),                  // $6E ROR abs
    urmw(Rra, ABS, 6),                 // $6F RRA abs
    op(Bvs, REL, 2),                   // $70 BVS rel
    page(Adc, IZY, 5),                 // $71 ADC izy
    jam(),                             // $72 JAM
    urmw(Rra, IZY, 8),                 // $73 RRA izy
    undoc(Nop, ZPX, 4),                // $74 NOP zpx
    op(Adc, ZPX, 4),                   // $75 ADC zpx
    rmw(Ror, ZPX, 6),                  // $76 ROR zpx
    urmw(Rra, ZPX, 6),                 // $77 RRA zpx
    op(Sei, IMP, 2),                   // $78 SEI imp
    page(Adc, ABY, 4),                 // $79 ADC aby
    undoc(Nop, IMP, 2),                // $7A NOP imp
    urmw(Rra, ABY, 7),                 // $7B RRA aby
    upage(Nop, ABX, 4),                // $7C NOP abx
    page(Adc, ABX, 4),                 // $7D ADC abx
    rmw(Ror, ABX, 7),                  // $7E ROR abx
    urmw(Rra, ABX, 7),                 // $7F RRA abx
    undoc(Nop, IMM, 2),                // $80 NOP imm
    op(Sta, IZX, 6),                   // $81 STA izx
    undoc(Nop, IMM, 2),                // $82 NOP imm
    undoc(Sax, IZX, 6),                // $83 SAX izx
    op(Sty, ZP, 3),                    // $84 STY zp
    op(Sta, ZP, 3),                    // $85 STA zp
    op(Stx, ZP, 3),                    // $86 STX zp
    undoc(Sax, ZP, 3),                 // $87 SAX zp
    op(Dey, IMP, 2),                   // $88 DEY imp
    undoc(Nop, IMM, 2),                // $89 NOP imm
    op(Txa, IMP, 2),                   // $8A TXA imp
    undoc(Ane, IMM, 2),                // $8B ANE imm
    op(Sty, ABS, 4),                   // $8C STY abs
    op(Sta, ABS, 4),                   // $8D STA abs
    op(Stx, ABS, 4),                   // $8E STX abs
    undoc(Sax, ABS, 4),                // $8F SAX abs
    op(Bcc, REL, 2),                   // $90 BCC rel
    op(Sta, IZY, 6),                   // $91 STA izy
    jam(),                             // $92 JAM
    undoc(Sha, IZY, 6),                // $93 SHA izy
    op(Sty, ZPX, 4),                   // $94 STY zpx
    op(Sta, ZPX, 4),                   // $95 STA zpx
    op(Stx, ZPY, 4),                   // $96 STX zpy
    undoc(Sax, ZPY, 4),                // $97 SAX zpy
    op(Tya, IMP, 2),                   // $98 TYA imp
    op(Sta, ABY, 5),                   // $99 STA aby
    op(Txs, IMP, 2),                   // $9A TXS imp
    undoc(Tas, ABY, 5),                // $9B TAS aby
    undoc(Shy, ABX, 5),                // $9C SHY abx
    op(Sta, ABX, 5),                   // $9D STA abx
    undoc(Shx, ABY, 5),                // $9E SHX aby
    undoc(Sha, ABY, 5),                // $9F SHA aby
    op(Ldy, IMM, 2),                   // $A0 LDY imm
    op(Lda, IZX, 6),                   // $A1 LDA izx
    op(Ldx, IMM, 2),                   // $A2 LDX imm
    undoc(Lax, IZX, 6),                // $A3 LAX izx
    op(Ldy, ZP, 3),                    // $A4 LDY zp
    op(Lda, ZP, 3),                    // $A5 LDA zp
    op(Ldx, ZP, 3),                    // $A6 LDX zp
    undoc(Lax, ZP, 3),                 // $A7 LAX zp
    op(Tay, IMP, 2),                   // $A8 TAY imp
    op(Lda, IMM, 2),                   // $A9 LDA imm
    op(Tax, IMP, 2),                   // $AA TAX imp
    undoc(Lxa, IMM, 2),                // $AB LXA imm
    op(Ldy, ABS, 4),                   // $AC LDY abs
    op(Lda, ABS, 4),                   // $AD LDA abs
    op(Ldx, ABS, 4),                   // $AE LDX abs
    undoc(Lax, ABS, 4),                // $AF LAX abs
    op(Bcs, REL, 2),                   // $B0 BCS rel
    page(Lda, IZY, 5),                 // $B1 LDA izy
    jam(),                             // $B2 JAM
    upage(Lax, IZY, 5),                // $B3 LAX izy
    op(Ldy, ZPX, 4),                   // $B4 LDY zpx
    op(Lda, ZPX, 4),                   // $B5 LDA zpx
    op(Ldx, ZPY, 4),                   // $B6 LDX zpy
    undoc(Lax, ZPY, 4),                // $B7 LAX zpy
    op(Clv, IMP, 2),                   // $B8 CLV imp
    page(Lda, ABY, 4),                 // $B9 LDA aby
    op(Tsx, IMP, 2),                   // $BA TSX imp
    upage(Las, ABY, 4),                // $BB LAS aby
    page(Ldy, ABX, 4),                 // $BC LDY abx
    page(Lda, ABX, 4),                 // $BD LDA abx
    page(Ldx, ABY, 4),                 // $BE LDX aby
    upage(Lax, ABY, 4),                // $BF LAX aby
    op(Cpy, IMM, 2),                   // $C0 CPY imm
    op(Cmp, IZX, 6),                   // $C1 CMP izx
    undoc(Nop, IMM, 2),                // $C2 NOP imm
    urmw(Dcp, IZX, 8),                 // $C3 DCP izx
    op(Cpy, ZP, 3),                    // $C4 CPY zp
    op(Cmp, ZP, 3),                    // $C5 CMP zp
    rmw(Dec, ZP, 5),                   // $C6 DEC zp
    urmw(Dcp, ZP, 5),                  // $C7 DCP zp
    op(Iny, IMP, 2),                   // $C8 INY imp
    op(Cmp, IMM, 2),                   // $C9 CMP imm
    op(Dex, IMP, 2),                   // $CA DEX imp
    undoc(Sbx, IMM, 2),                // $CB SBX imm
    op(Cpy, ABS, 4),                   // $CC CPY abs
    op(Cmp, ABS, 4),                   // $CD CMP abs
    rmw(Dec, ABS, 6),                  // $CE DEC abs
    urmw(Dcp, ABS, 6),                 // $CF DCP abs
    op(Bne, REL, 2),                   // $D0 BNE rel
    page(Cmp, IZY, 5),                 // $D1 CMP izy
    jam(),                             // $D2 JAM
    urmw(Dcp, IZY, 8),                 // $D3 DCP izy
    undoc(Nop, ZPX, 4),                // $D4 NOP zpx
    op(Cmp, ZPX, 4),                   // $D5 CMP zpx
    rmw(Dec, ZPX, 6),                  // $D6 DEC zpx
    urmw(Dcp, ZPX, 6),                 // $D7 DCP zpx
    op(Cld, IMP, 2),                   // $D8 CLD imp
    page(Cmp, ABY, 4),                 // $D9 CMP aby
    undoc(Nop, IMP, 2),                // $DA NOP imp
    urmw(Dcp, ABY, 7),                 // $DB DCP aby
    upage(Nop, ABX, 4),                // $DC NOP abx
    page(Cmp, ABX, 4),                 // $DD CMP abx
    rmw(Dec, ABX, 7),                  // $DE DEC abx
    urmw(Dcp, ABX, 7),                 // $DF DCP abx
    op(Cpx, IMM, 2),                   // $E0 CPX imm
    op(Sbc, IZX, 6),                   // $E1 SBC izx
    undoc(Nop, IMM, 2),                // $E2 NOP imm
    urmw(Isc, IZX, 8),                 // $E3 ISC izx
    op(Cpx, ZP, 3),                    // $E4 CPX zp
    op(Sbc, ZP, 3),                    // $E5 SBC zp
    rmw(Inc, ZP, 5),                   // $E6 INC zp
    urmw(Isc, ZP, 5),                  // $E7 ISC zp
    op(Inx, IMP, 2),                   // $E8 INX imp
    op(Sbc, IMM, 2),                   // $E9 SBC imm
    op(Nop, IMP, 2),                   // $EA NOP imp
    undoc(Sbc, IMM, 2),                // $EB SBC imm
    op(Cpx, ABS, 4),                   // $EC CPX abs
    op(Sbc, ABS, 4),                   // $ED SBC abs
    rmw(Inc, ABS, 6),                  // $EE INC abs
    urmw(Isc, ABS, 6),                 // $EF ISC abs
    op(Beq, REL, 2),                   // $F0 BEQ rel
    page(Sbc, IZY, 5),                 // $F1 SBC izy
    jam(),                             // $F2 JAM
    urmw(Isc, IZY, 8),                 // $F3 ISC izy
    undoc(Nop, ZPX, 4),                // $F4 NOP zpx
    op(Sbc, ZPX, 4),                   // $F5 SBC zpx
    rmw(Inc, ZPX, 6),                  // $F6 INC zpx
    urmw(Isc, ZPX, 6),                 // $F7 ISC zpx
    op(Sed, IMP, 2),                   // $F8 SED imp
    page(Sbc, ABY, 4),                 // $F9 SBC aby
    undoc(Nop, IMP, 2),                // $FA NOP imp
    urmw(Isc, ABY, 7),                 // $FB ISC aby
    upage(Nop, ABX, 4),                // $FC NOP abx
    page(Sbc, ABX, 4),                 // $FD SBC abx
    rmw(Inc, ABX, 7),                  // $FE INC abx
    urmw(Isc, ABX, 7),                 // $FF ISC abx
];

const fn legal_only(mut table: [Opcode; 256]) -> [Opcode; 256] {
    let mut i = 0;
    while i < 256 {
        if table[i].undocumented {
            table[i] = jam();
        }
        i += 1;
    }
    table
}

/// Documented and undocumented NMOS opcodes.
pub static FULL: [Opcode; 256] = FULL_TABLE;

/// Documented opcodes only; every other row locks up.
pub static LEGAL: [Opcode; 256] = legal_only(FULL_TABLE);

/// Decode table for an instruction set.
#[must_use]
pub fn table(set: InstructionSet) -> &'static [Opcode; 256] {
    match set {
        InstructionSet::Legal => &LEGAL,
        InstructionSet::Full => &FULL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_count() {
        let documented = FULL.iter().filter(|op| !op.undocumented).count();
        assert_eq!(documented, 151);
        let decodable = LEGAL.iter().filter(|op| op.instruction.is_some()).count();
        assert_eq!(decodable, 151);
    }

    #[test]
    fn twelve_lock_up_opcodes() {
        let jams: Vec<usize> = FULL
            .iter()
            .enumerate()
            .filter(|(_, op)| op.instruction.is_none())
            .map(|(code, _)| code)
            .collect();
        assert_eq!(
            jams,
            vec![0x02, 0x12, 0x22, 0x32, 0x42, 0x52, 0x62, 0x72, 0x92, 0xB2, 0xD2, 0xF2]
        );
    }

    #[test]
    fn accumulator_shifts_are_not_deferred() {
        assert!(!FULL[0x0A].deferred);
        assert!(FULL[0x0E].deferred);
        assert!(FULL[0xFF].deferred);
    }

    #[test]
    fn eb_is_sbc_immediate() {
        assert_eq!(FULL[0xEB].instruction, Some(Instruction::Sbc));
        assert_eq!(FULL[0xEB].mode, AddrMode::Immediate);
        assert!(LEGAL[0xEB].instruction.is_none());
    }
}
