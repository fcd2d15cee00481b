//! Output filename sanitization and collision-free allocation.

use std::path::Path;

/// Characters that are illegal in filenames on at least one supported platform.
const ILLEGAL: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Replace every illegal filename character with `_`.
///
/// The substitution is 1:1 so the output has the same length as the input,
/// which keeps extension splitting and uniqueness probing predictable.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if ILLEGAL.contains(&c) { '_' } else { c })
        .collect()
}

/// Return a filename that does not collide with any entry in `dir`.
///
/// If `desired` is free it is returned unchanged; otherwise `stem_1.ext`,
/// `stem_2.ext`, ... are probed in order and the first free name wins.
/// This is a pure query against the directory state at call time; the
/// caller must perform the write before allocating the next name.
pub fn allocate_unique(desired: &str, dir: &Path) -> String {
    if !dir.join(desired).exists() {
        return desired.to_string();
    }

    let desired_path = Path::new(desired);
    let stem = desired_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(desired);
    let ext = desired_path.extension().and_then(|e| e.to_str());

    for n in 1u64.. {
        let candidate = match ext {
            Some(ext) => format!("{stem}_{n}.{ext}"),
            None => format!("{stem}_{n}"),
        };
        if !dir.join(&candidate).exists() {
            return candidate;
        }
    }
    unreachable!("ran out of candidate names");
}
