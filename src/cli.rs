// cli.rs - Command-line interface configuration
use clap::Parser;
use std::path::PathBuf;

use crate::config::{BloomMode, ViewerConfig};

#[derive(Parser, Debug, Clone)]
#[command(name = "glow-viewer")]
#[command(about = "Animated glTF viewer with bloom", long_about = None)]
pub struct Cli {
    /// glTF asset to display
    #[arg(long)]
    pub asset: Option<PathBuf>,

    /// JSON file overriding the viewer defaults
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Initial window width in physical pixels
    #[arg(long, default_value = "800")]
    pub width: u32,

    /// Initial window height in physical pixels
    #[arg(long, default_value = "600")]
    pub height: u32,

    /// Blend the bloom pass into the visible frame
    #[arg(long = "composite-bloom", default_value = "false")]
    pub composite_bloom: bool,
}

impl Cli {
    /// Resolve the effective viewer config: file (if any), then flags
    pub fn viewer_config(&self) -> anyhow::Result<ViewerConfig> {
        let mut config = match &self.config {
            Some(path) => ViewerConfig::from_json_file(path)?,
            None => ViewerConfig::default(),
        };
        if let Some(asset) = &self.asset {
            config.asset_path = asset.clone();
        }
        if self.composite_bloom {
            config.bloom.mode = BloomMode::Composited;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["glow-viewer"]);
        assert_eq!(cli.width, 800);
        assert_eq!(cli.height, 600);
        assert!(!cli.composite_bloom);
        assert_eq!(cli.viewer_config().unwrap(), ViewerConfig::default());
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from(["glow-viewer", "--asset", "a/b.glb", "--composite-bloom"]);
        let cfg = cli.viewer_config().unwrap();
        assert_eq!(cfg.asset_path, PathBuf::from("a/b.glb"));
        assert_eq!(cfg.bloom.mode, BloomMode::Composited);
    }
}
