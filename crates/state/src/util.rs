use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

/// Writes `data` to a temporary sibling, flushes it, then renames it over `path`.
/// 先寫入同目錄暫存檔並同步到磁碟，再以 rename 取代 `path`。
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let tmp_path = path.with_extension("tmp");
    {
        let mut file = File::create(&tmp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)
}
