use std::fmt::Write;

use super::{FILL_BYTE, flatten};
use crate::Segment;

#[derive(Debug, Clone)]
pub struct CSourceWriteOptions {
    pub array_name: String,
    pub size_name: String,
    pub bytes_per_line: usize,
    /// First address emitted; defaults to the lowest stored address.
    pub origin: Option<u32>,
}

impl Default for CSourceWriteOptions {
    fn default() -> Self {
        Self {
            array_name: "romImage".to_string(),
            size_name: "romImageSize".to_string(),
            bytes_per_line: 16,
            origin: None,
        }
    }
}

/// Render segments as a C `uint8_t` array plus a `size_t` length constant.
pub fn write_c_source(segments: &[Segment], options: &CSourceWriteOptions) -> Vec<u8> {
    let origin = options.origin.unwrap_or_else(|| {
        segments
            .iter()
            .filter(|s| !s.is_empty())
            .map(|s| s.start_address)
            .min()
            .unwrap_or(0)
    });
    let data = flatten(segments, origin, FILL_BYTE);
    let per_line = options.bytes_per_line.max(1);

    let mut out = String::new();
    out.push_str("// Generated by eprom-image\n\n");
    out.push_str("#include <stddef.h>\n#include <stdint.h>\n\n");
    let _ = writeln!(out, "// Data size 0x{:X} bytes ({})\n", data.len(), data.len());
    let _ = writeln!(out, "const size_t {} = 0x{:X};\n", options.size_name, data.len());
    let _ = writeln!(out, "const uint8_t {}[{}] = {{", options.array_name, data.len());

    let lines: Vec<String> = data
        .chunks(per_line)
        .map(|line| {
            let values: Vec<String> = line.iter().map(|b| format!("0x{b:02X}")).collect();
            format!("\t{}", values.join(", "))
        })
        .collect();
    if !lines.is_empty() {
        out.push_str(&lines.join(",\n"));
        out.push('\n');
    }
    out.push_str("};\n");

    out.into_bytes()
}
