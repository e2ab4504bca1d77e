//! Unit Conversions
//!
//! Wavelength medium and unit conversions plus the eV/cm⁻¹ energy bridge.
//! Stored wavelengths are vacuum Å; stored energies are normalized to cm⁻¹
//! before they reach the formatter.

use crate::error::ConversionError;

/// 1 eV in cm⁻¹
pub const EV_TO_INV_CM: f64 = 8065.544;

/// Conversions only apply above this wavelength; shorter wavelengths pass
/// through unchanged
const AIR_CONVERSION_FLOOR: f64 = 2000.0;

/// IAU standard refractive index of air at wavelength `wl` in Å
fn refractive_index(wl: f64) -> f64 {
    let s2 = 1e8 / (wl * wl);
    1.0 + 8.34254e-5 + 2.406147e-2 / (130.0 - s2) + 1.5998e-4 / (38.9 - s2)
}

/// Vacuum wavelength in Å to air wavelength in Å
pub fn vacuum_to_air(wl_vacuum: f64) -> f64 {
    if wl_vacuum > AIR_CONVERSION_FLOOR {
        wl_vacuum / refractive_index(wl_vacuum)
    } else {
        wl_vacuum
    }
}

/// Air wavelength in Å to vacuum wavelength in Å.
///
/// Solves `air = vacuum / n(vacuum)` by fixed-point iteration so the
/// round trip through [`vacuum_to_air`] closes to well under 1e-6 Å.
pub fn air_to_vacuum(wl_air: f64) -> f64 {
    if wl_air <= AIR_CONVERSION_FLOOR {
        return wl_air;
    }
    let mut wl = wl_air;
    for _ in 0..3 {
        wl = wl_air * refractive_index(wl);
    }
    wl
}

/// Vacuum wavelength in Å to wavenumber in cm⁻¹
pub fn angstrom_to_wavenumber(wl: f64) -> Result<f64, ConversionError> {
    if wl <= 0.0 {
        return Err(ConversionError::NonPhysicalWavelength(wl));
    }
    Ok(1e8 / wl)
}

pub fn angstrom_to_nanometer(wl: f64) -> f64 {
    wl / 10.0
}

pub fn inv_cm_to_ev(energy: f64) -> f64 {
    energy / EV_TO_INV_CM
}

pub fn ev_to_inv_cm(energy: f64) -> f64 {
    energy * EV_TO_INV_CM
}

// ============================================================================
// Tests
// ============================================================================
