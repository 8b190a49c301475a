// This example demonstrates how to use the TSL2561 sensor with a Raspberry Pi.
// It should be a good reference for any kind of embedded system running Linux.

use embedded_hal::blocking::delay::DelayMs;
use linux_embedded_hal as hal;
use tsl2561::{Gain, IntegrationTime, TSL2561, TSL2561_ADDR_FLOAT};

fn main() {
    let mut i2c = hal::I2cdev::new("/dev/i2c-1").unwrap();
    let mut delay = hal::Delay;

    // Create a new TSL2561 instance, this reads back package type and timing configuration
    let mut tsl2561 = TSL2561::new(TSL2561_ADDR_FLOAT, &mut i2c);
    log::info!(
        "Package: {:?}, gain: {:?}, integration time: {:?}",
        tsl2561.package_type(),
        tsl2561.gain(),
        tsl2561.integration_time(),
    );

    // Read the device ID
    match tsl2561.read_id(&mut i2c) {
        Ok((part_number, revision)) => log::info!(
            "Device ID: (Part Number: 0x{:02X}, Revision ID: 0x{:02X})",
            part_number,
            revision,
        ),
        Err(e) => log::error!("Error reading device id: {:?}", e),
    }

    // Indoor light: 16x gain, medium integration time
    if let Err(e) = tsl2561.set_gain(Gain::High, &mut i2c) {
        log::error!("Error setting gain: {:?}", e);
    }
    if let Err(e) = tsl2561.set_integration_time(IntegrationTime::Ms101, &mut i2c) {
        log::error!("Error setting integration time: {:?}", e);
    }

    // Measure once per second for 5 minutes
    for _ in 0..300 {
        match tsl2561.try_read_lux(&mut delay, &mut i2c) {
            Ok(lux) => log::info!("Lux Value: {}", lux),
            Err(e) => log::error!("Error reading sensor: {:?}", e),
        }
        delay.delay_ms(1000u32);
    }
}
