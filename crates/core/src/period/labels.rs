//! Month names used for bucket labels.

const MONTHS_TR: [&str; 12] = [
    "Ocak", "Şubat", "Mart", "Nisan", "Mayıs", "Haziran", "Temmuz", "Ağustos", "Eylül", "Ekim",
    "Kasım", "Aralık",
];

/// Long Turkish month name for a zero-based month index.
///
/// Out-of-range indexes wrap around the year.
#[must_use]
pub fn month_name(month_index: u32) -> &'static str {
    MONTHS_TR[(month_index % 12) as usize]
}
