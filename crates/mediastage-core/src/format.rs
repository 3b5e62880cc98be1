//! Human-readable sizes for rejection reasons and progress output.

pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Convert whole megabytes to bytes.
pub fn mb_to_bytes(mb: u64) -> u64 {
    mb.saturating_mul(BYTES_PER_MB)
}

/// Ceiling label such as `50MB`. Non-whole values keep one decimal.
pub fn size_limit_label(bytes: u64) -> String {
    if bytes % BYTES_PER_MB == 0 {
        format!("{}MB", bytes / BYTES_PER_MB)
    } else {
        format!("{:.1}MB", bytes as f64 / BYTES_PER_MB as f64)
    }
}

/// Format a byte count as `B`, `KB`, `MB` or `GB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{:.1} {}", value, UNITS[unit])
}
