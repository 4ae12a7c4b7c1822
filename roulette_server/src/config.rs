use std::path::PathBuf;

use clap::Parser;

use crate::resize::ResizeSettings;

#[derive(Parser, Debug, Clone)]
#[command(name = "roulette-server", about = "Folder and image store for the roulette game")]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "BIND", default_value = "0.0.0.0:8080")]
    pub bind: String,
    /// Database URL, default sqlite://<data-dir>/roulette.db
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
    /// Root for the database and uploaded images
    #[arg(long, env = "DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,
    /// Static files served for every non-API path
    #[arg(long, env = "PUBLIC_DIR", default_value = "public")]
    pub public_dir: PathBuf,
    /// Longest side of stored uploads in pixels, 0 keeps originals
    #[arg(long, default_value_t = 600)]
    pub resize_max_dimension: u32,
    /// JPEG quality of resized uploads
    #[arg(long, default_value_t = 85, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub resize_quality: u8,
}

impl Config {
    pub fn database_url(&self) -> String {
        self.database_url.clone().unwrap_or_else(|| {
            format!("sqlite://{}?mode=rwc", self.data_dir.join("roulette.db").display())
        })
    }

    pub fn images_dir(&self) -> PathBuf {
        self.data_dir.join("roulette")
    }

    pub fn resize_settings(&self) -> ResizeSettings {
        ResizeSettings {
            max_dimension: self.resize_max_dimension,
            quality: self.resize_quality,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::parse_from(["roulette-server"]);
        assert_eq!(config.bind, "0.0.0.0:8080");
        assert_eq!(config.images_dir(), PathBuf::from("data").join("roulette"));
        assert!(config.database_url().starts_with("sqlite://"));
        assert!(config.database_url().ends_with("roulette.db?mode=rwc"));
        assert_eq!(config.resize_settings(), ResizeSettings::default());
    }

    #[test]
    fn rejects_out_of_range_quality() {
        assert!(Config::try_parse_from(["roulette-server", "--resize-quality", "0"]).is_err());
        let config = Config::parse_from(["roulette-server", "--resize-max-dimension", "0"]);
        assert_eq!(config.resize_settings().max_dimension, 0);
    }
}
