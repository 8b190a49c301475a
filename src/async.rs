//! Async API
//!
//! This module contains the async API for the TSL2561 sensor. It follows the blocking API
//! step for step; methods carry an `_async` suffix.

use crate::{
    Diagnostic, DiagnosticSink, Gain, IntegrationTime, LogSink, PackageType, Register, Result,
    TSL2561Error, POWER_OFF, POWER_ON, TSL2561,
};

impl<I2C, D> TSL2561<I2C, D, LogSink>
where
    D: embedded_hal_async::delay::DelayNs,
    I2C: embedded_hal_async::i2c::I2c<embedded_hal_async::i2c::SevenBitAddress>,
{
    /// Creates a connection with a TSL2561 sensor via I2C, reporting problems to the `log`
    /// facade.
    pub async fn new_async(address: u8, i2c: &mut I2C) -> Self {
        Self::with_diagnostics_async(address, LogSink, i2c).await
    }
}

impl<I2C, D, S> TSL2561<I2C, D, S>
where
    D: embedded_hal_async::delay::DelayNs,
    I2C: embedded_hal_async::i2c::I2c<embedded_hal_async::i2c::SevenBitAddress>,
    S: DiagnosticSink,
{
    /// Creates a connection with a TSL2561 sensor via I2C.
    ///
    /// This method powers the sensor up, checks that it reports being powered, reads the
    /// package type and the current gain and integration time, and powers it down again.
    pub async fn with_diagnostics_async(address: u8, diagnostics: S, i2c: &mut I2C) -> Self {
        let mut sensor = Self {
            _delay: core::marker::PhantomData,
            _i2c: core::marker::PhantomData,
            address,
            gain: Gain::Low,
            integration_time: IntegrationTime::Ms402,
            package_type: PackageType::Unknown(0),
            diagnostics,
        };

        if sensor.enable_async(i2c).await.is_err() {
            sensor.diagnostics.report(Diagnostic::InitializationFailed);
        }

        let control = sensor.read_register_async(Register::Control, i2c).await;
        if control & POWER_ON != POWER_ON {
            sensor
                .diagnostics
                .report(Diagnostic::PowerOnMismatch { control });
        }

        let id = sensor.read_register_async(Register::Id, i2c).await;
        sensor.package_type = PackageType::from_id(id);

        let timing = sensor.read_register_async(Register::Timing, i2c).await;
        sensor.gain = Gain::from_timing(timing);
        sensor.integration_time = IntegrationTime::from_timing(timing);

        sensor.disable_async(i2c).await.ok();

        log::debug!(
            "TSL2561 at 0x{:02X}: package {:?}, timing 0x{:02X}",
            address,
            sensor.package_type,
            sensor.timing_value()
        );

        sensor
    }

    /// Powers the sensor up.
    pub async fn enable_async(&mut self, i2c: &mut I2C) -> Result<()> {
        self.write_register_async(Register::Control, POWER_ON, i2c)
            .await
    }

    /// Powers the sensor down.
    pub async fn disable_async(&mut self, i2c: &mut I2C) -> Result<()> {
        self.write_register_async(Register::Control, POWER_OFF, i2c)
            .await
    }

    /// Write the integration time to the sensor, keeping the current gain.
    pub async fn set_integration_time_async(
        &mut self,
        integration_time: IntegrationTime,
        i2c: &mut I2C,
    ) -> Result<()> {
        self.enable_async(i2c).await.ok();
        let value = integration_time.into_reg_value() | self.gain.into_reg_value();
        let result = self.write_register_async(Register::Timing, value, i2c).await;
        self.disable_async(i2c).await.ok();

        self.integration_time = integration_time;
        result
    }

    /// Set the gain of the sensor, keeping the current integration time.
    pub async fn set_gain_async(&mut self, gain: Gain, i2c: &mut I2C) -> Result<()> {
        self.enable_async(i2c).await.ok();
        let value = gain.into_reg_value() | self.integration_time.into_reg_value();
        let result = self.write_register_async(Register::Timing, value, i2c).await;
        self.disable_async(i2c).await.ok();

        self.gain = gain;
        result
    }

    /// Reads both photodiode channels, waiting one integration period.
    pub async fn read_channels_async(&mut self, delay: &mut D, i2c: &mut I2C) -> (u16, u16) {
        self.enable_async(i2c).await.ok();

        delay.delay_ms(self.integration_time.wait_ms()).await;

        let channel0 = self
            .read_register_16_async(Register::Channel0Low, i2c)
            .await;
        let channel1 = self
            .read_register_16_async(Register::Channel1Low, i2c)
            .await;

        self.disable_async(i2c).await.ok();

        log::debug!("Read raw values: ({}, {})", channel0, channel1);

        (channel0, channel1)
    }

    /// Reads both photodiode channels, returning the first bus error.
    pub async fn try_read_channels_async(
        &mut self,
        delay: &mut D,
        i2c: &mut I2C,
    ) -> Result<(u16, u16)> {
        self.try_write_register_async(Register::Control, POWER_ON, i2c)
            .await?;

        delay.delay_ms(self.integration_time.wait_ms()).await;

        let channels = match self
            .try_read_register_16_async(Register::Channel0Low, i2c)
            .await
        {
            Ok(channel0) => self
                .try_read_register_16_async(Register::Channel1Low, i2c)
                .await
                .map(|channel1| (channel0, channel1)),
            Err(e) => Err(e),
        };
        let powered_down = self
            .try_write_register_async(Register::Control, POWER_OFF, i2c)
            .await;

        let channels = channels?;
        powered_down?;

        log::debug!("Read raw values: {:?}", channels);

        Ok(channels)
    }

    /// Perform a measurement of the ambient light intensity in lux.
    pub async fn read_lux_async(&mut self, delay: &mut D, i2c: &mut I2C) -> u32 {
        let (channel0, channel1) = self.read_channels_async(delay, i2c).await;
        self.compute_lux(channel0, channel1)
    }

    /// Perform a measurement of the ambient light intensity in lux, returning bus errors.
    pub async fn try_read_lux_async(&mut self, delay: &mut D, i2c: &mut I2C) -> Result<u32> {
        let (channel0, channel1) = self.try_read_channels_async(delay, i2c).await?;
        Ok(self.compute_lux(channel0, channel1))
    }

    /// Reads the part number and the revision id of the sensor.
    pub async fn read_id_async(&mut self, i2c: &mut I2C) -> Result<(u8, u8)> {
        let id_raw = self.try_read_register_async(Register::Id, i2c).await?;

        Ok((id_raw >> 4, id_raw & 0x0F))
    }

    /// Writes a new value to a specific register, reporting a failed write.
    pub async fn write_register_async(
        &mut self,
        register: Register,
        data: u8,
        i2c: &mut I2C,
    ) -> Result<()> {
        let result = self.try_write_register_async(register, data, i2c).await;
        if result.is_err() {
            self.diagnostics.report(Diagnostic::WriteFailed(register));
        }
        result
    }

    /// Reads the value of a specific register, reporting a failed read and returning 0.
    pub async fn read_register_async(&mut self, register: Register, i2c: &mut I2C) -> u8 {
        match self.try_read_register_async(register, i2c).await {
            Ok(value) => value,
            Err(_) => {
                self.diagnostics.report(Diagnostic::ReadFailed(register));
                0
            }
        }
    }

    /// Reads a 16-bit register pair, reporting a failed read and returning 0.
    pub async fn read_register_16_async(&mut self, register: Register, i2c: &mut I2C) -> u16 {
        match self.try_read_register_16_async(register, i2c).await {
            Ok(value) => value,
            Err(_) => {
                self.diagnostics.report(Diagnostic::ReadFailed(register));
                0
            }
        }
    }

    /// Writes a new value to a specific register
    pub async fn try_write_register_async(
        &mut self,
        register: Register,
        data: u8,
        i2c: &mut I2C,
    ) -> Result<()> {
        let write_data = [register.command(), data];

        i2c.write(self.address, &write_data)
            .await
            .map_err(|_| TSL2561Error::WriteI2CError)?;

        Ok(())
    }

    /// Reads the value of a specific register
    pub async fn try_read_register_async(
        &mut self,
        register: Register,
        i2c: &mut I2C,
    ) -> Result<u8> {
        let mut read_data = [0; 1];

        i2c.write_read(self.address, &[register.command()], &mut read_data)
            .await
            .map_err(|_| TSL2561Error::ReadI2CError)?;

        Ok(read_data[0])
    }

    /// Reads a 16-bit register pair in one write-then-read operation
    pub async fn try_read_register_16_async(
        &mut self,
        register: Register,
        i2c: &mut I2C,
    ) -> Result<u16> {
        let mut read_data = [0; 2];

        i2c.write_read(self.address, &[register.word_command()], &mut read_data)
            .await
            .map_err(|_| TSL2561Error::ReadI2CError)?;

        Ok(u16::from_le_bytes(read_data))
    }
}

// async mocking of I2C is not supported by embedded-hal-mock 0.8, the shared pieces (command
// bytes, timing fields, lux conversion) are covered by the blocking tests
