//! Reset, IRQ, NMI and lock-up behavior.

use emu_core::{Bus, Cpu, SimpleBus};
use mos_6502::{CpuConfig, InstructionSet, Jam, Mos6502, flags};

fn run_instruction(cpu: &mut Mos6502, bus: &mut SimpleBus) -> u32 {
    for cycle in 1..=20 {
        if cpu.step_cycle(bus) {
            return cycle;
        }
    }
    panic!("Instruction did not complete within 20 cycles");
}

/// Bus with IRQ and NMI vectors pointing at RTI handlers.
fn bus_with_handlers() -> SimpleBus {
    let mut bus = SimpleBus::new();
    bus.load(0xFFFA, &[0x00, 0x05]); // NMI -> $0500
    bus.load(0xFFFE, &[0x00, 0x04]); // IRQ -> $0400
    bus.write(0x0400, 0x40); // RTI
    bus.write(0x0500, 0x40); // RTI
    bus
}

#[test]
fn reset_state() {
    let mut bus = SimpleBus::new();
    bus.set_reset_vector(0xC000);
    let mut cpu = Mos6502::new();
    cpu.regs.a = 0x12;
    cpu.regs.s = 0x20;

    Cpu::reset(&mut cpu, &mut bus);

    assert_eq!(cpu.pc(), 0xC000);
    assert_eq!(cpu.sp(), 0xFF);
    assert_eq!(cpu.sr(), 0x34);
    assert_eq!((cpu.a(), cpu.x(), cpu.y()), (0, 0, 0));
    assert!(cpu.is_instruction_complete());
}

#[test]
fn irq_waits_for_cli() {
    let mut bus = bus_with_handlers();
    let mut cpu = Mos6502::new();
    bus.load(0x0200, &[0xEA, 0x58, 0xEA]); // NOP; CLI; NOP
    cpu.regs.pc = 0x0200;
    bus.irq = true;

    run_instruction(&mut cpu, &mut bus); // NOP, I still set
    assert_eq!(cpu.pc(), 0x0201);
    run_instruction(&mut cpu, &mut bus); // CLI
    assert_eq!(cpu.pc(), 0x0202);

    let cycles = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles, 7, "interrupt sequence length");
    assert_eq!(cpu.pc(), 0x0400);
    assert!(cpu.flag(flags::I));
    assert_eq!(bus.peek(0x01FD) & flags::B, 0, "IRQ pushes B clear");
    assert_eq!(bus.peek(0x01FE), 0x02);
    assert_eq!(bus.peek(0x01FF), 0x02);
}

#[test]
fn sei_masks_irq_until_cli() {
    let mut bus = bus_with_handlers();
    let mut cpu = Mos6502::new();
    // SEI; NOP; NOP; CLI; NOP
    bus.load(0x0200, &[0x78, 0xEA, 0xEA, 0x58, 0xEA]);
    cpu.regs.pc = 0x0200;
    cpu.regs.p.clear(flags::I);

    run_instruction(&mut cpu, &mut bus); // SEI
    assert!(cpu.flag(flags::I));
    bus.irq = true;

    run_instruction(&mut cpu, &mut bus); // NOP
    run_instruction(&mut cpu, &mut bus); // NOP
    assert_eq!(cpu.pc(), 0x0203, "no entry while masked");

    run_instruction(&mut cpu, &mut bus); // CLI
    assert_eq!(cpu.pc(), 0x0204);

    let cycles = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles, 7);
    assert_eq!(cpu.pc(), 0x0400);
    assert_eq!(bus.peek(0x01FE), 0x04, "returns to the NOP after CLI");
    assert_eq!(bus.peek(0x01FF), 0x02);

    run_instruction(&mut cpu, &mut bus); // RTI
    assert_eq!(cpu.pc(), 0x0204);
}

#[test]
fn irq_is_level_triggered() {
    let mut bus = bus_with_handlers();
    let mut cpu = Mos6502::new();
    bus.load(0x0200, &[0xEA]);
    cpu.regs.pc = 0x0200;
    cpu.regs.p.clear(flags::I);
    bus.irq = true;

    run_instruction(&mut cpu, &mut bus); // IRQ
    run_instruction(&mut cpu, &mut bus); // RTI
    assert_eq!(cpu.pc(), 0x0200);
    // Line still asserted: taken again before the NOP.
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.pc(), 0x0400);
}

#[test]
fn nmi_is_edge_triggered() {
    let mut bus = bus_with_handlers();
    let mut cpu = Mos6502::new();
    bus.load(0x0200, &[0xEA, 0xEA, 0xEA]);
    cpu.regs.pc = 0x0200;

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.pc(), 0x0201);

    bus.nmi = true;
    run_instruction(&mut cpu, &mut bus); // NMI, ignores I
    assert_eq!(cpu.pc(), 0x0500);
    assert_eq!(bus.peek(0x01FD) & flags::B, 0);
    run_instruction(&mut cpu, &mut bus); // RTI
    assert_eq!(cpu.pc(), 0x0201);

    // Held high: no second NMI.
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.pc(), 0x0202);

    // Released and raised again: a new edge.
    bus.nmi = false;
    run_instruction(&mut cpu, &mut bus);
    bus.nmi = true;
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.pc(), 0x0500);
}

#[test]
fn nmi_outranks_irq() {
    let mut bus = bus_with_handlers();
    let mut cpu = Mos6502::new();
    bus.load(0x0200, &[0xEA, 0xEA]);
    cpu.regs.pc = 0x0200;
    cpu.regs.p.clear(flags::I);

    run_instruction(&mut cpu, &mut bus);
    bus.irq = true;
    bus.nmi = true;
    // The NMI edge is sampled on this dispatch cycle and wins.
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.pc(), 0x0500);
}

#[test]
fn taken_branch_without_page_cross_shortens_interrupt() {
    let mut bus = bus_with_handlers();
    let mut cpu = Mos6502::new();
    bus.load(0x0200, &[0xD0, 0x00]); // BNE +0, taken, same page
    cpu.regs.pc = 0x0200;
    cpu.regs.p.clear(flags::I);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 3);
    bus.irq = true;
    assert_eq!(run_instruction(&mut cpu, &mut bus), 6);
    assert_eq!(cpu.pc(), 0x0400);
}

#[test]
fn other_instructions_keep_full_interrupt_length() {
    // Taken branch that crosses a page.
    let mut bus = bus_with_handlers();
    let mut cpu = Mos6502::new();
    bus.load(0x02F0, &[0xD0, 0x7F]);
    cpu.regs.pc = 0x02F0;
    cpu.regs.p.clear(flags::I);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 4);
    bus.irq = true;
    assert_eq!(run_instruction(&mut cpu, &mut bus), 7);

    // Branch not taken.
    let mut bus = bus_with_handlers();
    let mut cpu = Mos6502::new();
    bus.load(0x0200, &[0xF0, 0x00]); // BEQ with Z clear
    cpu.regs.pc = 0x0200;
    cpu.regs.p.clear(flags::I);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 2);
    bus.irq = true;
    assert_eq!(run_instruction(&mut cpu, &mut bus), 7);
}

#[test]
fn jam_freezes_until_reset() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut bus = bus_with_handlers();
    bus.set_reset_vector(0x0300);
    let mut cpu = Mos6502::new();
    bus.load(0x0200, &[0x02]);
    cpu.regs.pc = 0x0200;

    for _ in 0..10 {
        assert!(!cpu.step_cycle(&mut bus));
    }
    assert!(cpu.is_jammed());
    assert!(bus.jammed);
    assert_eq!(
        cpu.jam(),
        Some(Jam {
            address: 0x0200,
            opcode: 0x02
        })
    );
    assert_eq!(cpu.pc(), 0x0200, "PC stays on the lock-up opcode");

    // Interrupts cannot wake it.
    bus.nmi = true;
    bus.irq = true;
    for _ in 0..10 {
        assert!(!cpu.step_cycle(&mut bus));
    }
    assert_eq!(cpu.pc(), 0x0200);

    bus.nmi = false;
    bus.irq = false;
    cpu.reset(&mut bus);
    assert!(!cpu.is_jammed());
    assert!(!bus.jammed);
    assert_eq!(cpu.pc(), 0x0300);
}

#[test]
fn legal_set_jams_on_undocumented_opcode() {
    let config = CpuConfig {
        instruction_set: InstructionSet::Legal,
        ..CpuConfig::default()
    };
    let mut bus = SimpleBus::new();
    let mut cpu = Mos6502::with_config(config);
    bus.load(0x0200, &[0xEA, 0xA7, 0x10]); // NOP; LAX $10
    cpu.regs.pc = 0x0200;

    run_instruction(&mut cpu, &mut bus);
    cpu.step_cycle(&mut bus);
    assert_eq!(cpu.jam().map(|j| j.opcode), Some(0xA7));
}
