//! Process-wide pen pressure.
//!
//! The host's input subsystem writes the latest tablet pressure here and
//! brush code reads a snapshot per stroke. Until something is written the
//! pressure is 1.0, so mouse input paints at full strength.

use std::sync::atomic::{AtomicU32, Ordering};

use tracing::trace;

use crate::math::clamp01;

const FULL_PRESSURE: f32 = 1.0;

/// f32 bits of the current pressure
static PEN_PRESSURE: AtomicU32 = AtomicU32::new(FULL_PRESSURE.to_bits());

/// Latest pen pressure in [0, 1].
pub fn pen_pressure() -> f32 {
    f32::from_bits(PEN_PRESSURE.load(Ordering::Relaxed))
}

/// Store a new pressure reading, clamped to [0, 1]. NaN readings are ignored.
pub fn set_pen_pressure(pressure: f32) {
    if pressure.is_nan() {
        return;
    }
    let pressure = clamp01(pressure);
    trace!("pen pressure: {}", pressure);
    PEN_PRESSURE.store(pressure.to_bits(), Ordering::Relaxed);
}

/// Back to full pressure, e.g. when the pen leaves the tablet.
pub fn reset_pen_pressure() {
    PEN_PRESSURE.store(FULL_PRESSURE.to_bits(), Ordering::Relaxed);
}
