const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

/// Converts a raw byte count to megabytes (`bytes / 1024 / 1024`).
/// Small files come out as fractions of a megabyte, never rounded up.
pub fn bytes_to_megabytes(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MEGABYTE
}
