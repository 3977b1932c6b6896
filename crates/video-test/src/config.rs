use crate::FrameConfig;
use anyhow::Context;
use std::fs;
use std::path::Path;

/// Load and validate a [`FrameConfig`] from a YAML file.
///
/// ```yaml
/// width: 1280
/// height: 720
/// frame_rate: 30
/// ```
pub fn load_frame_config(path: impl AsRef<Path>) -> anyhow::Result<FrameConfig> {
    let path = path.as_ref();
    let raw =
        fs::read_to_string(path).with_context(|| format!("reading config: {}", path.display()))?;
    let config: FrameConfig = serde_yaml::from_str(&raw)
        .with_context(|| format!("parsing yaml: {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("validating config: {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn write_temp(name: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("vt-{}-{name}.yaml", std::process::id()));
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_valid_file() {
        let path = write_temp("ok", "width: 1280\nheight: 720\nframe_rate: 60\n");
        let cfg = load_frame_config(&path).unwrap();
        assert_eq!(cfg, FrameConfig::new(1280, 720, 60.0));
        fs::remove_file(path).ok();
    }

    #[test]
    fn invalid_values_name_the_file() {
        let path = write_temp("odd", "width: 641\nheight: 480\nframe_rate: 30\n");
        let err = load_frame_config(&path).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("validating config"), "{msg}");
        assert!(msg.contains("width must be even"), "{msg}");
        fs::remove_file(path).ok();
    }

    #[test]
    fn missing_file() {
        let err = load_frame_config("/nonexistent/vt.yaml").unwrap_err();
        assert!(format!("{err}").contains("reading config"));
    }
}
