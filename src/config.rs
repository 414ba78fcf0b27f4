use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// The flavor of Markdown to parse.
/// Each flavor has a different set of default extensions enabled.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Flavor {
    /// GitHub Flavored Markdown (default)
    #[default]
    Gfm,
    /// Plain CommonMark, no extensions
    #[serde(alias = "common-mark")]
    Commonmark,
}

/// Optional grammars layered on top of CommonMark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extensions {
    /// Pipe tables
    pub tables: bool,
    /// `~one~` and `~~two~~` strikethrough
    pub strikethrough: bool,
    /// `[ ]` / `[x]` markers on list items
    pub task_lists: bool,
    /// `[^label]` references and definitions
    pub footnotes: bool,
    /// Literal `www.`, `http(s)://` and email autolinks
    pub autolinks: bool,
}

impl Extensions {
    /// Get the default extension set for a given flavor.
    pub fn for_flavor(flavor: Flavor) -> Self {
        match flavor {
            Flavor::Gfm => Self::gfm_defaults(),
            Flavor::Commonmark => Self::commonmark_defaults(),
        }
    }

    fn gfm_defaults() -> Self {
        Self {
            tables: true,
            strikethrough: true,
            task_lists: true,
            footnotes: true,
            autolinks: true,
        }
    }

    fn commonmark_defaults() -> Self {
        Self {
            tables: false,
            strikethrough: false,
            task_lists: false,
            footnotes: false,
            autolinks: false,
        }
    }
}

impl Default for Extensions {
    fn default() -> Self {
        Self::for_flavor(Flavor::default())
    }
}

/// Per-extension overrides as written in a config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ExtensionOverrides {
    tables: Option<bool>,
    strikethrough: Option<bool>,
    task_lists: Option<bool>,
    footnotes: Option<bool>,
    autolinks: Option<bool>,
}

impl ExtensionOverrides {
    fn apply(&self, base: Extensions) -> Extensions {
        Extensions {
            tables: self.tables.unwrap_or(base.tables),
            strikethrough: self.strikethrough.unwrap_or(base.strikethrough),
            task_lists: self.task_lists.unwrap_or(base.task_lists),
            footnotes: self.footnotes.unwrap_or(base.footnotes),
            autolinks: self.autolinks.unwrap_or(base.autolinks),
        }
    }
}

/// Options forwarded to every parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    /// Attach source positions to every node.
    pub reserve_positions: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    flavor: Flavor,
    extensions: ExtensionOverrides,
    options: Options,
}

/// Parser configuration. Extensions not set explicitly follow the flavor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawConfig")]
pub struct Config {
    pub flavor: Flavor,
    pub extensions: Extensions,
    pub options: Options,
}

impl From<RawConfig> for Config {
    fn from(raw: RawConfig) -> Self {
        Self {
            flavor: raw.flavor,
            extensions: raw.extensions.apply(Extensions::for_flavor(raw.flavor)),
            options: raw.options,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let flavor = Flavor::default();
        Self {
            flavor,
            extensions: Extensions::for_flavor(flavor),
            options: Options::default(),
        }
    }
}

#[derive(Default, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Switch flavor, resetting extensions to that flavor's defaults.
    pub fn flavor(mut self, flavor: Flavor) -> Self {
        self.config.flavor = flavor;
        self.config.extensions = Extensions::for_flavor(flavor);
        self
    }

    pub fn extensions(mut self, extensions: Extensions) -> Self {
        self.config.extensions = extensions;
        self
    }

    pub fn reserve_positions(mut self, reserve: bool) -> Self {
        self.config.options.reserve_positions = reserve;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

const CANDIDATE_NAMES: &[&str] = &[".markmatch.toml", "markmatch.toml"];

fn parse_config_str(s: &str, path: &Path) -> io::Result<Config> {
    toml::from_str::<Config>(s).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("invalid config {}: {e}", path.display()),
        )
    })
}

fn read_config(path: &Path) -> io::Result<Config> {
    log::debug!("Reading config from: {}", path.display());
    let s = fs::read_to_string(path)?;
    let config = parse_config_str(&s, path)?;
    log::info!("Loaded config from: {}", path.display());
    Ok(config)
}

fn find_in_tree(start_dir: &Path) -> Option<PathBuf> {
    start_dir.ancestors().find_map(|dir| {
        CANDIDATE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|p| p.is_file())
    })
}

fn xdg_config_path() -> Option<PathBuf> {
    let from_xdg = env::var_os("XDG_CONFIG_HOME").map(PathBuf::from);
    let from_home = env::var_os("HOME").map(|home| Path::new(&home).join(".config"));
    [from_xdg, from_home]
        .into_iter()
        .flatten()
        .map(|base| base.join("markmatch").join("config.toml"))
        .find(|p| p.is_file())
}

/// Load configuration with precedence:
/// 1) explicit path (error if unreadable/invalid)
/// 2) walk up from start_dir: .markmatch.toml, markmatch.toml
/// 3) XDG: $XDG_CONFIG_HOME/markmatch/config.toml or ~/.config/markmatch/config.toml
/// 4) default config
pub fn load(explicit: Option<&Path>, start_dir: &Path) -> io::Result<(Config, Option<PathBuf>)> {
    if let Some(path) = explicit {
        let cfg = read_config(path)?;
        return Ok((cfg, Some(path.to_path_buf())));
    }

    if let Some(p) = find_in_tree(start_dir) {
        match read_config(&p) {
            Ok(cfg) => return Ok((cfg, Some(p))),
            Err(e) => log::warn!("Ignoring {}: {}", p.display(), e),
        }
    }

    if let Some(p) = xdg_config_path()
        && let Ok(cfg) = read_config(&p)
    {
        return Ok((cfg, Some(p)));
    }

    log::debug!("No config file found, using defaults");
    Ok((Config::default(), None))
}
