/// Binary (1024 based) unit suffixes after plain bytes.
static UNITS: [&str; 8] = ["KiB", "MiB", "GiB", "TiB", "PiB", "EiB", "ZiB", "YiB"];

/// Renders a byte count like `512 B`, `1.5 KiB` or `100.0 MiB`.
pub fn human_readable_size(bytes: u64) -> String {
    const THRESH: f64 = 1024.0;
    if bytes < 1024 {
        return format!("{bytes} B");
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    value /= THRESH;
    while value >= THRESH && unit < UNITS.len() - 1 {
        value /= THRESH;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}
