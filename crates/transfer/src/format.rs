const KIB: u64 = 1024;
const MIB: u64 = 1024 * 1024;

/// Formats a byte count for status lines: `B` below 1 KiB, rounded `KB`
/// below 1 MiB, rounded `MB` above.
pub fn format_size(bytes: u64) -> String {
    if bytes < KIB {
        format!("{bytes} B")
    } else if bytes < MIB {
        format!("{} KB", (bytes as f64 / KIB as f64).round() as u64)
    } else {
        format!("{} MB", (bytes as f64 / MIB as f64).round() as u64)
    }
}
