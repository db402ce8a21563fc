pub(crate) fn to_u16(a: u8, b: u8) -> u16 {
    ((a as u16) << 8) + (b as u16)
}

/// TF-Luna reports temperature in 1/8 degree steps offset by 256.
pub(crate) fn to_temperature(low: u8, high: u8) -> f64 {
    (to_u16(high, low) as f64) / 8. - 256.
}

pub(crate) fn to_string(data: &[u8]) -> String {
    data.iter()
        .map(|e| format!("{:02X}", e))
        .collect::<Vec<_>>()
        .join(" ")
}
