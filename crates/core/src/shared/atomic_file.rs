use std::fs;
use std::io::Write;
use std::path::Path;

/// Writes `bytes` to `dest` through a `.part` sibling and a rename, so
/// readers never observe a half-written file.
pub fn write(dest: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let temp_path = dest.with_extension("part");
    let result = (|| {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(bytes)?;
        file.flush()?;
        drop(file);
        fs::rename(&temp_path, dest)
    })();
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}
