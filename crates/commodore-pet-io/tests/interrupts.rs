//! The chip bank driving a 6502 through its IRQ line.

use commodore_pet_io::{PetIo, PetIoConfig};
use emu_core::{Bus, Cpu, SimpleBus};
use mos_6502::Mos6502;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// RAM everywhere except the I/O block.
struct PetBus {
    ram: SimpleBus,
    io: PetIo,
}

impl PetBus {
    fn new(config: PetIoConfig) -> Self {
        let mut io = PetIo::with_config(config);
        io.reset(&mut StdRng::seed_from_u64(42));
        Self {
            ram: SimpleBus::new(),
            io,
        }
    }
}

fn is_io(address: u16) -> bool {
    (0xE800..=0xE87F).contains(&address)
}

impl Bus for PetBus {
    fn read(&mut self, address: u16) -> u8 {
        if is_io(address) {
            self.io.read(address)
        } else {
            self.ram.read(address)
        }
    }

    fn write(&mut self, address: u16, value: u8) {
        if is_io(address) {
            self.io.write(address, value);
        } else {
            self.ram.write(address, value);
        }
    }

    fn peek(&self, address: u16) -> u8 {
        if is_io(address) {
            self.io.dump(address)
        } else {
            self.ram.peek(address)
        }
    }

    fn irq_signal(&self) -> bool {
        self.io.irq()
    }
}

/// Load `program` at $0200 and `handler` at $0300, reset, then run.
fn run(config: PetIoConfig, program: &[u8], handler: &[u8], cycles: u32) -> PetBus {
    let mut bus = PetBus::new(config);
    bus.ram.load(0x0200, program);
    bus.ram.load(0x0300, handler);
    bus.ram.set_reset_vector(0x0200);
    bus.ram.load(0xFFFE, &[0x00, 0x03]);

    let mut cpu = Mos6502::new();
    Cpu::reset(&mut cpu, &mut bus);
    for _ in 0..cycles {
        bus.io.tick();
        cpu.step_cycle(&mut bus);
    }
    bus
}

#[test]
fn via_timer1_one_shot_interrupts_once() {
    let program = [
        0xA9, 0xC0, // LDA #$C0
        0x8D, 0x4E, 0xE8, // STA $E84E   IER: T1
        0xA9, 0x20, // LDA #$20
        0x8D, 0x44, 0xE8, // STA $E844
        0xA9, 0x00, // LDA #$00
        0x8D, 0x45, 0xE8, // STA $E845   start one-shot
        0x58, // CLI
        0x4C, 0x10, 0x02, // JMP $0210
    ];
    let handler = [
        0xAD, 0x44, 0xE8, // LDA $E844   acknowledge T1
        0xE6, 0x10, // INC $10
        0x40, // RTI
    ];

    let bus = run(PetIoConfig::default(), &program, &handler, 2_000);
    assert_eq!(bus.ram.peek(0x0010), 1);
    assert!(!bus.io.irq());
}

#[test]
fn retrace_interrupt_every_frame() {
    let config = PetIoConfig {
        cycles_per_frame: 1_000,
        display_cycles: 800,
    };
    let program = [
        0xA9, 0x05, // LDA #$05
        0x8D, 0x13, 0xE8, // STA $E813   CRB: data, CB1 falling, IRQ on
        0x58, // CLI
        0x4C, 0x06, 0x02, // JMP $0206
    ];
    let handler = [
        0xAD, 0x12, 0xE8, // LDA $E812   acknowledge CB1
        0xE6, 0x10, // INC $10
        0x40, // RTI
    ];

    let bus = run(config, &program, &handler, 3_500);
    assert_eq!(bus.ram.peek(0x0010), 3);
}
