use embassy_rp::pac;
use embassy_rp::pac::dma::regs::CtrlTrig;
use embassy_rp::pac::dma::vals::{DataSize, TreqSel};
use transfer_interface::{Descriptor, DmaEngine, Pacing, TriggerRegister};

/// DMA interrupt line the rings report completions on. The HAL's own DMA
/// driver keeps line 0.
pub const COMPLETION_IRQ: usize = 1;

/// The RP2040 DMA block, driven through its registers.
///
/// Channels 0 to 9 belong to the audio rings. Nothing else in the firmware
/// starts a DMA transfer; the Ethernet SPI runs blocking.
pub struct RpDma {
    _private: (),
}

impl RpDma {
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl DmaEngine for RpDma {
    const CHANNELS: u8 = 12;

    fn program(&mut self, channel: u8, descriptor: &Descriptor) {
        let ch = pac::DMA.ch(channel as usize);
        ch.read_addr().write_value(descriptor.read_address);
        ch.write_addr().write_value(descriptor.write_address);
        ch.trans_count().write_value(descriptor.count);

        let mut ctrl = CtrlTrig(0);
        ctrl.set_en(true);
        ctrl.set_data_size(DataSize::SIZE_WORD);
        ctrl.set_incr_read(descriptor.read_increment);
        ctrl.set_incr_write(descriptor.write_increment);
        if let Some(wrap) = descriptor.wrap {
            ctrl.set_ring_size(wrap.size_bits);
            ctrl.set_ring_sel(wrap.on_write);
        }
        // Chaining to itself disables chaining
        ctrl.set_chain_to(descriptor.chain_to.unwrap_or(channel));
        ctrl.set_treq_sel(match descriptor.pacing {
            Pacing::Peripheral(dreq) => TreqSel::from_bits(dreq),
            Pacing::Unpaced => TreqSel::PERMANENT,
        });
        ctrl.set_irq_quiet(!descriptor.raise_completion);

        // The non-triggering alias, so the channel stays idle until started
        ch.al1_ctrl().write_value(ctrl.0);

        let flag = 1 << channel;
        pac::DMA.inte(COMPLETION_IRQ).modify(|enabled| {
            if descriptor.raise_completion {
                *enabled |= flag;
            } else {
                *enabled &= !flag;
            }
        });
    }

    fn trigger_register(&self, channel: u8, target: TriggerRegister) -> u32 {
        let ch = pac::DMA.ch(channel as usize);
        let register = match target {
            TriggerRegister::ReadAddress => ch.al3_read_addr_trig().as_ptr(),
            TriggerRegister::WriteAddress => ch.al2_write_addr_trig().as_ptr(),
            TriggerRegister::TransferCount => ch.al1_trans_count_trig().as_ptr(),
        };
        register as u32
    }

    fn read_address(&self, channel: u8) -> u32 {
        pac::DMA.ch(channel as usize).read_addr().read()
    }

    fn write_address(&self, channel: u8) -> u32 {
        pac::DMA.ch(channel as usize).write_addr().read()
    }

    fn store_word(&mut self, address: u32, value: u32) {
        // SAFETY: callers hand in reload tables owned by the audio rings
        unsafe { (address as *mut u32).write_volatile(value) }
    }

    fn start(&mut self, mask: u32) {
        // SAFETY: MULTI_CHAN_TRIGGER is a plain 32-bit write-only register
        unsafe {
            pac::DMA
                .multi_chan_trigger()
                .as_ptr()
                .cast::<u32>()
                .write_volatile(mask)
        }
    }

    fn acknowledge(&mut self, channel: u8) -> bool {
        let flag = 1 << channel;
        let raised = pac::DMA.ints(COMPLETION_IRQ).read() & flag != 0;
        if raised {
            pac::DMA.ints(COMPLETION_IRQ).write_value(flag);
        }
        raised
    }
}
