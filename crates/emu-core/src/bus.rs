//! Memory and I/O bus interface.

/// Memory and I/O bus interface.
///
/// The CPU performs every memory effect through this trait and samples the
/// two interrupt request lines from it at instruction boundaries. The bus
/// owner decides how addresses decode and which chips drive the lines.
pub trait Bus {
    /// Read a byte from the given address. May have side effects on I/O.
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte to the given address.
    fn write(&mut self, address: u16, value: u8);

    /// Read a byte without side effects, for trace and debugger inspection.
    fn peek(&self, address: u16) -> u8;

    /// Level of the maskable interrupt request line (true = asserted).
    fn irq_signal(&self) -> bool {
        false
    }

    /// Level of the non-maskable interrupt line (true = asserted).
    ///
    /// The CPU latches the rising edge of this line.
    fn nmi_signal(&self) -> bool {
        false
    }

    /// Told by the CPU when it enters or leaves the jammed state.
    fn set_cpu_jammed(&mut self, _jammed: bool) {}
}

/// Flat 64 KiB RAM bus with directly settable interrupt lines.
///
/// Used by tests and tools that need a bus without any address decoding.
pub struct SimpleBus {
    ram: Box<[u8; 0x10000]>,
    /// IRQ line level.
    pub irq: bool,
    /// NMI line level.
    pub nmi: bool,
    /// Set while the CPU reports itself jammed.
    pub jammed: bool,
}

impl SimpleBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ram: Box::new([0; 0x10000]),
            irq: false,
            nmi: false,
            jammed: false,
        }
    }

    /// Copy `data` into RAM starting at `address`, wrapping at the top.
    pub fn load(&mut self, address: u16, data: &[u8]) {
        let mut addr = address;
        for &byte in data {
            self.ram[addr as usize] = byte;
            addr = addr.wrapping_add(1);
        }
    }

    /// Point the reset vector at `address`.
    pub fn set_reset_vector(&mut self, address: u16) {
        self.load(0xFFFC, &address.to_le_bytes());
    }

    #[must_use]
    pub fn peek(&self, address: u16) -> u8 {
        self.ram[address as usize]
    }
}

impl Default for SimpleBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for SimpleBus {
    fn read(&mut self, address: u16) -> u8 {
        self.ram[address as usize]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.ram[address as usize] = value;
    }

    fn peek(&self, address: u16) -> u8 {
        self.ram[address as usize]
    }

    fn irq_signal(&self) -> bool {
        self.irq
    }

    fn nmi_signal(&self) -> bool {
        self.nmi
    }

    fn set_cpu_jammed(&mut self, jammed: bool) {
        self.jammed = jammed;
    }
}
