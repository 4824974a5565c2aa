/// Molar gas constant in kJ/(mol·K).
pub const MOLAR_GAS_CONSTANT: f64 = 8.314_462_618e-3;

pub const LN_10: f64 = std::f64::consts::LN_10;

/// Temperature used when a model is allocated without an explicit one.
pub const DEFAULT_TEMPERATURE: f64 = 300.0;

/// Thermal energy `RT` in kJ/mol.
#[inline]
pub fn thermal_energy(temperature: f64) -> f64 {
    MOLAR_GAS_CONSTANT * temperature
}

/// Free energy of one proton per pH unit, `RT ln 10`.
#[inline]
pub fn nernst_factor(temperature: f64) -> f64 {
    thermal_energy(temperature) * LN_10
}
