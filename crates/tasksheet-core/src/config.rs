use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tracing::{debug, info, trace, warn};

const DEFAULT_STATUS_VALUES: &str = "pending,in-progress,done";

/// Flat `key=value` configuration: built-in defaults, then the rc file
/// (`~/.tasksheetrc` or `$TASKSHEETRC`), then `--rc` overrides.
#[derive(Debug, Clone)]
pub struct Config {
    map: HashMap<String, String>,
    pub loaded_file: Option<PathBuf>,
}

impl Config {
    #[tracing::instrument(skip(rcfile_override))]
    pub fn load(rcfile_override: Option<&Path>) -> anyhow::Result<Self> {
        let mut cfg = Config {
            map: HashMap::new(),
            loaded_file: None,
        };

        cfg.map.insert("data.location".to_string(), "~/.tasksheet".to_string());
        cfg.map.insert("color".to_string(), "on".to_string());
        cfg.map.insert("status.values".to_string(), DEFAULT_STATUS_VALUES.to_string());
        cfg.map.insert("status.default".to_string(), "pending".to_string());
        cfg.map.insert("notice.delay.ms".to_string(), "1800".to_string());
        cfg.map.insert("sync.mode".to_string(), "off".to_string());
        cfg.map.insert("sync.timeout.ms".to_string(), "10000".to_string());
        cfg.map.insert("sync.assume.ms".to_string(), "1500".to_string());
        cfg.map.insert("sync.field.title".to_string(), "title".to_string());
        cfg.map.insert("sync.field.status".to_string(), "status".to_string());
        cfg.map.insert("sync.field.created".to_string(), "createdAt".to_string());

        let rcfile = resolve_rcfile_path(rcfile_override)?;
        if let Some(path) = rcfile {
            info!(rcfile = %path.display(), "loading rc file");
            cfg.load_file(&path)?;
        } else {
            debug!("no rc file found; using defaults");
        }

        Ok(cfg)
    }

    #[tracing::instrument(skip(self, overrides))]
    pub fn apply_overrides<I>(&mut self, overrides: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (k, v) in overrides {
            let key = k.strip_prefix("rc.").unwrap_or(&k).to_string();
            debug!(key = %key, value = %v, "applying override");
            self.map.insert(key, v);
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.map.get(key).map(|v| parse_bool(v))
    }

    pub fn get_u64(&self, key: &str) -> anyhow::Result<Option<u64>> {
        match self.map.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Some)
                .with_context(|| format!("invalid numeric value for {key}: {raw}")),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.map.iter()
    }

    /// The allowed status labels, in configured order.
    pub fn status_values(&self) -> Vec<String> {
        self.get("status.values")
            .unwrap_or_else(|| DEFAULT_STATUS_VALUES.to_string())
            .split(',')
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .collect()
    }

    pub fn default_status(&self) -> String {
        self.get("status.default")
            .unwrap_or_else(|| "pending".to_string())
    }

    #[tracing::instrument(skip(self))]
    fn load_file(&mut self, path: &Path) -> anyhow::Result<()> {
        let path = expand_tilde(path);
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        self.loaded_file = Some(path.clone());

        for (line_num, raw_line) in text.lines().enumerate() {
            let mut line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((before, _)) = line.split_once('#') {
                line = before.trim();
            }

            if line.is_empty() {
                continue;
            }

            let (k, v) = line.split_once('=').ok_or_else(|| {
                anyhow!(
                    "invalid config line {}:{}: {}",
                    path.display(),
                    line_num + 1,
                    raw_line
                )
            })?;

            let key = k.trim().to_string();
            let value = v.trim().to_string();
            trace!(key = %key, value = %value, "loaded config key");
            self.map.insert(key, value);
        }

        Ok(())
    }
}

#[tracing::instrument(skip(cfg, override_dir))]
pub fn resolve_data_dir(cfg: &Config, override_dir: Option<&Path>) -> anyhow::Result<PathBuf> {
    let dir = if let Some(path) = override_dir {
        path.to_path_buf()
    } else if let Some(cfg_value) = cfg.get("data.location") {
        expand_tilde(Path::new(&cfg_value))
    } else {
        default_data_dir()?
    };

    if !dir.exists() {
        info!(dir = %dir.display(), "creating data directory");
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    Ok(dir)
}

#[tracing::instrument(skip(override_path))]
fn resolve_rcfile_path(override_path: Option<&Path>) -> anyhow::Result<Option<PathBuf>> {
    if let Some(path) = override_path {
        return Ok(Some(path.to_path_buf()));
    }

    if let Ok(rc_env) = std::env::var("TASKSHEETRC") {
        if rc_env == "/dev/null" {
            return Ok(None);
        }
        return Ok(Some(PathBuf::from(rc_env)));
    }

    let home = dirs::home_dir().ok_or_else(|| anyhow!("cannot determine home directory"))?;
    let candidate = home.join(".tasksheetrc");
    if candidate.exists() {
        return Ok(Some(candidate));
    }

    warn!("no ~/.tasksheetrc present");
    Ok(None)
}

fn default_data_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("cannot determine home directory"))?;
    Ok(home.join(".tasksheet"))
}

fn expand_tilde(path: &Path) -> PathBuf {
    let text = path.to_string_lossy();
    if let Some(rest) = text.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_ascii_lowercase().as_str(),
        "1" | "y" | "yes" | "on" | "true"
    )
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn empty_config() -> Config {
        Config::load(Some(Path::new("/dev/null"))).expect("load config")
    }

    #[test]
    fn rc_file_keys_override_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp rc file");
        writeln!(file, "# comment").expect("write");
        writeln!(file, "sync.mode = json   # trailing comment").expect("write");
        writeln!(file, "sync.url = https://example.test/exec").expect("write");
        file.flush().expect("flush");

        let cfg = Config::load(Some(file.path())).expect("load config");
        assert_eq!(cfg.get("sync.mode").as_deref(), Some("json"));
        assert_eq!(cfg.get("sync.url").as_deref(), Some("https://example.test/exec"));
        assert_eq!(cfg.get("color").as_deref(), Some("on"));
    }

    #[test]
    fn overrides_strip_rc_prefix_and_win() {
        let mut cfg = empty_config();
        cfg.apply_overrides([("rc.sync.mode".to_string(), "form".to_string())]);
        assert_eq!(cfg.get("sync.mode").as_deref(), Some("form"));
    }

    #[test]
    fn status_values_split_and_trim() {
        let mut cfg = empty_config();
        cfg.apply_overrides([("status.values".to_string(), " todo , doing ,, done ".to_string())]);
        assert_eq!(cfg.status_values(), vec!["todo", "doing", "done"]);
    }

    #[test]
    fn booleans_accept_the_usual_spellings() {
        let mut cfg = empty_config();
        assert_eq!(cfg.get_bool("color"), Some(true));
        assert_eq!(cfg.get_bool("no.such.key"), None);

        cfg.apply_overrides([("color".to_string(), "off".to_string())]);
        assert_eq!(cfg.get_bool("color"), Some(false));
    }

    #[test]
    fn numeric_values_parse_or_fail_loud() {
        let mut cfg = empty_config();
        assert_eq!(cfg.get_u64("notice.delay.ms").expect("parse"), Some(1800));
        cfg.apply_overrides([("notice.delay.ms".to_string(), "soon".to_string())]);
        assert!(cfg.get_u64("notice.delay.ms").is_err());
    }
}
