use defmt::info;

#[cfg(feature = "capture-serial")]
use crate::audio_task::hardware::SerialHardware;
use crate::network_task::hardware::EthernetHardware;

pub struct Hardware<'a> {
    #[cfg(feature = "capture-serial")]
    pub serial: SerialHardware<'a>,
    pub ethernet: EthernetHardware<'a>,
}

impl<'a> Hardware<'a> {
    pub fn get() -> Hardware<'a> {
        info!("Initializing");
        let peripherals = embassy_rp::init(Default::default());

        #[cfg(feature = "capture-serial")]
        let serial = crate::get_serial_hardware!(peripherals);

        let ethernet = crate::get_ethernet_hardware!(peripherals);

        Hardware {
            #[cfg(feature = "capture-serial")]
            serial,
            ethernet,
        }
    }
}
