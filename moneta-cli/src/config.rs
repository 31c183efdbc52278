use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub user: UserSection,
    #[serde(default)]
    pub data: DataSection,
    #[serde(default)]
    pub year: YearSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSection {
    pub id: String,
    pub currency: Currency,
    /// Day of month on which the user's budget period starts
    pub start_day: u32,
}

impl Default for UserSection {
    fn default() -> Self {
        Self {
            id: String::new(),
            currency: Currency::Eur,
            start_day: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataSection {
    /// JSON or CSV export used as the transaction source
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct YearSection {
    /// Days skipped at the start of every year window
    pub delay_days: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "EUR")]
    Eur,
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "GBP")]
    Gbp,
}

impl Currency {
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Eur => "€",
            Currency::Usd => "$",
            Currency::Gbp => "£",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
            Currency::Gbp => "GBP",
        };
        f.write_str(code)
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if !(1..=31).contains(&self.user.start_day) {
            bail!("[user] start_day must be 1..=31, got {}", self.user.start_day);
        }
        Ok(())
    }
}

/// `$MONETA_HOME`, or `~/.moneta`
pub fn moneta_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("MONETA_HOME") {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".moneta"))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(moneta_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

/// Missing file yields the defaults
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: Config = toml::from_str(&s).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate().with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config_to(&p, &Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.user.start_day, 1);
        assert_eq!(cfg.user.currency, Currency::Eur);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let cfg = Config {
            user: UserSection {
                id: "u1".into(),
                currency: Currency::Gbp,
                start_day: 25,
            },
            data: DataSection {
                path: Some(PathBuf::from("/tmp/export.json")),
            },
            year: YearSection { delay_days: 3 },
        };

        save_config_to(&path, &cfg).unwrap();
        assert_eq!(load_config_from(&path).unwrap(), cfg);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[user]\nid = \"abc\"\ncurrency = \"USD\"\nstart_day = 10\n").unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.user.id, "abc");
        assert_eq!(cfg.user.currency.symbol(), "$");
        assert_eq!(cfg.data.path, None);
        assert_eq!(cfg.year.delay_days, 0);
    }

    #[test]
    fn test_start_day_outside_month_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        for day in [0, 32] {
            fs::write(&path, format!("[user]\nid = \"abc\"\ncurrency = \"EUR\"\nstart_day = {day}\n"))
                .unwrap();
            let err = load_config_from(&path).unwrap_err();
            assert!(format!("{err:#}").contains("start_day"), "{err:#}");
        }

        fs::write(&path, "[user]\nid = \"abc\"\ncurrency = \"EUR\"\nstart_day = 31\n").unwrap();
        assert_eq!(load_config_from(&path).unwrap().user.start_day, 31);
    }
}
