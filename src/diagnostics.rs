//! Diagnostics
//!
//! The driver never aborts on a bus error or an unexpected hardware state. Instead it hands a
//! [`Diagnostic`] to a [`DiagnosticSink`] and keeps going with whatever it could read. The
//! default sink, [`LogSink`], forwards everything to the [`log`](https://crates.io/crates/log)
//! facade.

use core::fmt;

use crate::Register;

/// A problem noticed by the driver that did not stop the current operation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Diagnostic {
    /// Powering up the sensor during initialization failed.
    InitializationFailed,
    /// The control register did not report the ADC as powered after enabling it.
    PowerOnMismatch {
        /// Raw value read back from the control register.
        control: u8,
    },
    /// A register write was rejected by the bus.
    WriteFailed(Register),
    /// A register read was rejected by the bus; the value was replaced by 0.
    ReadFailed(Register),
    /// The package code from the ID register has no coefficient table, lux is reported as 0.
    UnsupportedPackage(u8),
}

/// Severity attached to a [`Diagnostic`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Severity {
    /// The result is degraded but the bus and sensor behave.
    Warning,
    /// A bus transaction failed or the sensor is in an unexpected state.
    Error,
}

impl Diagnostic {
    /// How serious the problem is, [`LogSink`] picks the log level from it.
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::UnsupportedPackage(_) => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::InitializationFailed => write!(f, "error initializing tsl2561"),
            Diagnostic::PowerOnMismatch { control } => write!(
                f,
                "error initializing tsl2561, control register wasn't set to ON (read 0x{:02X})",
                control
            ),
            Diagnostic::WriteFailed(register) => {
                write!(f, "i2c write to {:?} register failed", register)
            }
            Diagnostic::ReadFailed(register) => {
                write!(f, "i2c read of {:?} register failed", register)
            }
            Diagnostic::UnsupportedPackage(code) => {
                write!(f, "invalid package type 0b{:02b} in lux calculation", code)
            }
        }
    }
}

/// Receiver for driver diagnostics.
///
/// Implementations must not panic; reporting never influences what the driver does next.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn report(&mut self, diagnostic: Diagnostic) {
        (**self).report(diagnostic)
    }
}

/// Sink forwarding diagnostics to the `log` facade.
#[derive(Copy, Clone, Debug, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity() {
            Severity::Warning => log::warn!("{}", diagnostic),
            Severity::Error => log::error!("{}", diagnostic),
        }
    }
}
