//! Library sources compiled into the binary.
//!
//! Each entry is keyed by its bare file name, which is how `daslib/...`
//! requests are looked up.

pub const SOURCES: &[(&str, &[u8])] = &[
    (
        "sandbox_paths.das",
        include_bytes!("../resources/daslib/sandbox_paths.das"),
    ),
    ("clamp.das", include_bytes!("../resources/daslib/clamp.das")),
];
