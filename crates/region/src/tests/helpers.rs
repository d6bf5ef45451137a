use config::RegionConfig;
use std::fs;
use std::path::Path;

pub fn region_config(dir: &Path, families: &[&str], flush_threshold: usize) -> RegionConfig {
    RegionConfig {
        dir: dir.to_path_buf(),
        name: "test-region".to_string(),
        start_key: Vec::new(),
        end_key: Vec::new(),
        families: families.iter().map(|f| f.to_string()).collect(),
        flush_threshold,
    }
}

pub fn count_sst_files(dir: &Path) -> usize {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|s| s.to_str())
                .map(|ext| ext == "sst")
                .unwrap_or(false)
        })
        .count()
}
