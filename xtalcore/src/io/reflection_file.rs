use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use serde::{Serialize, Deserialize};

use crate::config::StorageParams;
use crate::data::reflection_list::{ReflectionList, REFLECTION_LIST_FORMAT_VERSION};
use crate::error::{Result, XtalError};

const ZSTD_MAGIC: [u8; 4] = [0x28, 0xb5, 0x2f, 0xfd];

#[derive(Serialize)]
struct ReflectionFileRef<'a> {
    version: u32,
    reflections: &'a ReflectionList,
}

#[derive(Deserialize)]
struct ReflectionFile {
    version: u32,
    reflections: ReflectionList,
}

// --- JSON (human-readable) ---
pub fn save_json(path: &str, reflections: &ReflectionList) -> Result<()> {
    let f = BufWriter::new(File::create(path).map_err(|e| XtalError::io(path, e))?);
    let file = ReflectionFileRef { version: REFLECTION_LIST_FORMAT_VERSION, reflections };
    serde_json::to_writer_pretty(f, &file)?;
    log::debug!("wrote {} reflections to {} as JSON", reflections.len(), path);
    Ok(())
}

pub fn load_json(path: &str) -> Result<ReflectionList> {
    let f = BufReader::new(File::open(path).map_err(|e| XtalError::io(path, e))?);
    let file: ReflectionFile = serde_json::from_reader(f)?;
    if file.version != REFLECTION_LIST_FORMAT_VERSION {
        return Err(XtalError::UnsupportedVersion { found: file.version, expected: REFLECTION_LIST_FORMAT_VERSION });
    }
    file.reflections.validate()?;
    log::debug!("read {} reflections from {}", file.reflections.len(), path);
    Ok(file.reflections)
}

// --- Bincode + optional zstd compression ---
pub fn save_bincode(path: &str, reflections: &ReflectionList, params: &StorageParams) -> Result<()> {
    params.validate()?;
    let bytes = reflections.to_bytes()?;
    let f = File::create(path).map_err(|e| XtalError::io(path, e))?;
    if params.compress {
        let mut zw = zstd::Encoder::new(f, params.compression_level).map_err(|e| XtalError::io(path, e))?;
        zw.write_all(&bytes).map_err(|e| XtalError::io(path, e))?;
        zw.finish().map_err(|e| XtalError::io(path, e))?;
    } else {
        let mut bw = BufWriter::new(f);
        bw.write_all(&bytes).map_err(|e| XtalError::io(path, e))?;
        bw.flush().map_err(|e| XtalError::io(path, e))?;
    }
    log::debug!(
        "wrote {} reflections to {} (compressed: {})",
        reflections.len(), path, params.compress
    );
    Ok(())
}

/// Reads a file written by `save_bincode`, compressed or not.
pub fn load_bincode(path: &str) -> Result<ReflectionList> {
    let mut bytes = Vec::new();
    File::open(path)
        .and_then(|mut f| f.read_to_end(&mut bytes))
        .map_err(|e| XtalError::io(path, e))?;

    let reflections = if bytes.starts_with(&ZSTD_MAGIC) {
        let raw = zstd::decode_all(bytes.as_slice()).map_err(|e| XtalError::io(path, e))?;
        ReflectionList::from_bytes(&raw)?
    } else {
        ReflectionList::from_bytes(&bytes)?
    };
    log::debug!("read {} reflections from {}", reflections.len(), path);
    Ok(reflections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::geometry::{BoundingBox, Vec2};
    use crate::data::miller::MillerIndex;
    use crate::data::reflection::Reflection;
    use crate::data::shoebox::Shoebox;

    fn sample_list() -> ReflectionList {
        (0..5)
            .map(|i| {
                let mut r = Reflection::new(MillerIndex::new(i, i + 1, -i));
                r.set_frame_number(i as f64 + 0.5);
                r.set_image_coord_px(Vec2::new(10.0 * i as f64, 3.0));
                r.set_bounding_box(BoundingBox::new(0, 2, 0, 1, 0, 1));
                r.set_shoebox(Shoebox::new([1, 1, 2], vec![i, 2 * i]).unwrap());
                r
            })
            .collect()
    }

    fn temp_path(dir: &tempfile::TempDir, name: &str) -> String {
        dir.path().join(name).to_string_lossy().into_owned()
    }

    #[test]
    fn test_bincode_compressed() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir, "refl.bin.zst");
        let list = sample_list();
        save_bincode(&path, &list, &StorageParams::default()).unwrap();

        let on_disk = std::fs::read(&path).unwrap();
        assert!(on_disk.starts_with(&ZSTD_MAGIC));
        assert_eq!(load_bincode(&path).unwrap(), list);
    }

    #[test]
    fn test_bincode_plain() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir, "refl.bin");
        let list = sample_list();
        let params = StorageParams::new(false, 3).unwrap();
        save_bincode(&path, &list, &params).unwrap();

        let on_disk = std::fs::read(&path).unwrap();
        assert!(!on_disk.starts_with(&ZSTD_MAGIC));
        assert_eq!(load_bincode(&path).unwrap(), list);
    }

    #[test]
    fn test_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir, "refl.json");
        let list = sample_list();
        save_json(&path, &list).unwrap();
        assert_eq!(load_json(&path).unwrap(), list);
    }

    #[test]
    fn test_json_rejects_inconsistent_shoebox() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir, "broken.json");
        let mut value = serde_json::to_value(ReflectionFileRef {
            version: REFLECTION_LIST_FORMAT_VERSION,
            reflections: &sample_list(),
        }).unwrap();
        value["reflections"]["reflections"][0]["shoebox"]["shape"] = serde_json::json!([4, 4, 4]);
        std::fs::write(&path, value.to_string()).unwrap();

        assert!(matches!(load_json(&path), Err(XtalError::InvalidShape { .. })));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir, "absent.bin");
        assert!(matches!(load_bincode(&path), Err(XtalError::Io { .. })));
        assert!(matches!(load_json(&path), Err(XtalError::Io { .. })));
    }

    #[test]
    fn test_invalid_params_write_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir, "never.bin");
        let params = StorageParams { compress: true, compression_level: 40 };
        assert!(matches!(save_bincode(&path, &sample_list(), &params), Err(XtalError::Config(_))));
        assert!(!std::path::Path::new(&path).exists());
    }
}
