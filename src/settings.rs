//! Game settings and configuration store
//!
//! Configuration is a nested JSON document: built-in defaults overlaid with
//! the user's settings file. Only values that differ from the defaults are
//! written back. Sessions never read the JSON directly; they get a validated
//! [`Settings`] assembled once when the game starts.

use std::fs;
use std::path::Path;

use glam::Vec2;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use crate::consts::*;
use crate::error::ConfigError;

/// Difficulty levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "EASY",
            Difficulty::Medium => "MEDIUM",
            Difficulty::Hard => "HARD",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" | "med" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

/// Default enemies: center x, center y, width, height, speed x, speed y
const DEFAULT_ENEMIES: [(f32, f32, f32, f32, f32, f32); 4] = [
    (100.0, 100.0, 60.0, 60.0, 3.0, 2.0),
    (300.0, 85.0, 60.0, 50.0, -3.0, 2.0),
    (85.0, 350.0, 30.0, 60.0, 3.0, -2.0),
    (355.0, 340.0, 100.0, 20.0, -2.0, -3.0),
];

const DEFAULT_PLAYER_COLOR: &str = "red";
const DEFAULT_ENEMY_COLOR: &str = "blue";

/// Built-in default configuration document
pub fn default_values() -> Value {
    let enemies: Vec<Value> = DEFAULT_ENEMIES
        .iter()
        .map(|&(x, y, w, h, sx, sy)| {
            json!({
                "Position": { "X": x, "Y": y },
                "Size": { "Width": w, "Height": h },
                "Speed": { "X": sx, "Y": sy },
                "Color": DEFAULT_ENEMY_COLOR,
            })
        })
        .collect();

    json!({
        "Game": {
            "Size": { "Width": ARENA_WIDTH, "Height": ARENA_HEIGHT },
            "Difficulty": Difficulty::default().as_str(),
            "TickMs": ENEMY_TICK_MS,
            "Color": { "Fill": "white", "Outline": "black" },
        },
        "Player": {
            "Size": { "Width": PLAYER_SIZE, "Height": PLAYER_SIZE },
            "Color": DEFAULT_PLAYER_COLOR,
            "Border": PLAYER_BORDER,
        },
        "Enemies": enemies,
    })
}

fn path_string(path: &[&str]) -> String {
    path.join(".")
}

/// Follow `path` through nested objects (numeric keys index arrays)
fn lookup<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(root, |v, key| match v {
        Value::Object(map) => map.get(*key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Recursive `update`: objects are merged key by key, anything else replaces
pub fn deep_update(dst: &mut Value, src: &Value) {
    match (dst, src) {
        (Value::Object(dst), Value::Object(src)) => {
            for (key, val) in src {
                let merge = val.is_object() && dst.get(key).is_some_and(Value::is_object);
                match dst.get_mut(key) {
                    Some(existing) if merge => deep_update(existing, val),
                    _ => {
                        dst.insert(key.clone(), val.clone());
                    }
                }
            }
        }
        (dst, src) => *dst = src.clone(),
    }
}

/// Values of `current` that differ from `defaults`, keeping the nesting.
///
/// `deep_update(defaults, deep_diff(current, defaults))` reproduces `current`
/// as long as `current` has every key `defaults` has.
pub fn deep_diff(current: &Value, defaults: &Value) -> Value {
    let mut diffs = Map::new();
    if let Value::Object(map) = current {
        for (key, val) in map {
            match defaults.get(key) {
                Some(default) if val.is_object() && default.is_object() => {
                    let sub = deep_diff(val, default);
                    if sub.as_object().is_some_and(|m| !m.is_empty()) {
                        diffs.insert(key.clone(), sub);
                    }
                }
                Some(default) if default == val => {}
                _ => {
                    diffs.insert(key.clone(), val.clone());
                }
            }
        }
    }
    Value::Object(diffs)
}

/// Replace a non-object node with an empty object
fn ensure_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced with an object"),
    }
}

/// Layered key-value configuration
#[derive(Debug, Clone)]
pub struct ConfigStore {
    defaults: Value,
    merged: Value,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore {
    /// Built-in defaults only
    pub fn new() -> Self {
        Self::with_defaults(default_values())
    }

    pub fn with_defaults(defaults: Value) -> Self {
        Self {
            merged: defaults.clone(),
            defaults,
        }
    }

    /// Defaults overlaid with `overrides`
    pub fn from_overrides(overrides: &Value) -> Self {
        let mut store = Self::new();
        deep_update(&mut store.merged, overrides);
        store
    }

    /// Read a settings file on top of the defaults
    pub fn try_load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let overrides: Value = serde_json::from_str(&text)?;
        Ok(Self::from_overrides(&overrides))
    }

    /// Like [`ConfigStore::try_load`], falling back to defaults if the file is
    /// missing or unreadable
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(store) => {
                log::info!("Loaded settings from {}", path.display());
                store
            }
            Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No settings at {}, using defaults", path.display());
                Self::new()
            }
            Err(e) => {
                log::warn!("Ignoring settings at {}: {}", path.display(), e);
                Self::new()
            }
        }
    }

    /// Write the values that differ from the defaults
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(&self.diff())?;
        fs::write(path, text)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }

    pub fn diff(&self) -> Value {
        deep_diff(&self.merged, &self.defaults)
    }

    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        lookup(&self.merged, path)
    }

    pub fn require(&self, path: &[&str]) -> Result<&Value, ConfigError> {
        self.get(path)
            .ok_or_else(|| ConfigError::MissingKey(path_string(path)))
    }

    /// Typed lookup falling back to `default` when missing or mistyped
    pub fn get_or<T: DeserializeOwned>(&self, path: &[&str], default: T) -> T {
        self.get(path)
            .and_then(|v| T::deserialize(v).ok())
            .unwrap_or(default)
    }

    /// Set a value, creating intermediate objects as needed
    pub fn set(&mut self, path: &[&str], value: Value) {
        let Some((last, parents)) = path.split_last() else {
            self.merged = value;
            return;
        };
        let mut node = &mut self.merged;
        for key in parents {
            node = ensure_object(node)
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        ensure_object(node).insert(last.to_string(), value);
    }

    pub fn difficulty(&self) -> Difficulty {
        self.get(&["Game", "Difficulty"])
            .and_then(Value::as_str)
            .and_then(Difficulty::from_str)
            .unwrap_or_default()
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.set(&["Game", "Difficulty"], json!(difficulty.as_str()));
    }
}

/// Required finite number at `prefix` + `path` inside `root`
fn number(root: &Value, prefix: &[&str], path: &[&str]) -> Result<f32, ConfigError> {
    let full: Vec<&str> = prefix.iter().chain(path).copied().collect();
    let value = lookup(root, path).ok_or_else(|| ConfigError::MissingKey(path_string(&full)))?;
    let n = value.as_f64().map(|n| n as f32).ok_or_else(|| {
        invalid(&path_string(&full), format!("expected a number, found {value}"))
    })?;
    if !n.is_finite() {
        return Err(invalid(&path_string(&full), format!("{value} is out of range")));
    }
    Ok(n)
}

/// Optional typed value: absent means `default`, present but mistyped is an error
fn optional<T: DeserializeOwned>(
    store: &ConfigStore,
    path: &[&str],
    default: T,
) -> Result<T, ConfigError> {
    match store.get(path) {
        None => Ok(default),
        Some(value) => {
            T::deserialize(value).map_err(|e| invalid(&path_string(path), e.to_string()))
        }
    }
}

fn invalid(path: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        path: path.to_string(),
        reason: reason.into(),
    }
}

/// Player size, color and border inset
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSettings {
    pub width: f32,
    pub height: f32,
    pub color: String,
    pub border: f32,
}

/// Per-session replacements for the configured player
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerOverrides {
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub color: Option<String>,
    pub border: Option<f32>,
}

impl PlayerSettings {
    pub fn with_overrides(&self, overrides: &PlayerOverrides) -> Self {
        Self {
            width: overrides.width.unwrap_or(self.width),
            height: overrides.height.unwrap_or(self.height),
            color: overrides.color.clone().unwrap_or_else(|| self.color.clone()),
            border: overrides.border.unwrap_or(self.border),
        }
    }
}

/// Initial placement of one enemy
#[derive(Debug, Clone, PartialEq)]
pub struct EnemySettings {
    /// Center
    pub position: Vec2,
    pub width: f32,
    pub height: f32,
    /// Displacement per tick
    pub speed: Vec2,
    pub color: String,
}

/// Everything a session needs, validated
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub arena_width: f32,
    pub arena_height: f32,
    pub difficulty: Difficulty,
    /// Enemy tick period (milliseconds)
    pub tick_ms: u64,
    pub player: PlayerSettings,
    pub enemies: Vec<EnemySettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            arena_width: ARENA_WIDTH,
            arena_height: ARENA_HEIGHT,
            difficulty: Difficulty::default(),
            tick_ms: ENEMY_TICK_MS,
            player: PlayerSettings {
                width: PLAYER_SIZE,
                height: PLAYER_SIZE,
                color: DEFAULT_PLAYER_COLOR.to_string(),
                border: PLAYER_BORDER,
            },
            enemies: DEFAULT_ENEMIES
                .iter()
                .map(|&(x, y, w, h, sx, sy)| EnemySettings {
                    position: Vec2::new(x, y),
                    width: w,
                    height: h,
                    speed: Vec2::new(sx, sy),
                    color: DEFAULT_ENEMY_COLOR.to_string(),
                })
                .collect(),
        }
    }
}

impl Settings {
    /// Assemble from the store and validate. Fails before any entity exists.
    pub fn from_store(store: &ConfigStore) -> Result<Self, ConfigError> {
        let game = store.require(&["Game"])?;
        let player = store.require(&["Player"])?;

        let enemies = store
            .require(&["Enemies"])?
            .as_array()
            .ok_or_else(|| invalid("Enemies", "expected a list"))?
            .iter()
            .enumerate()
            .map(|(i, e)| {
                let index = i.to_string();
                let prefix = ["Enemies", index.as_str()];
                Ok(EnemySettings {
                    position: Vec2::new(
                        number(e, &prefix, &["Position", "X"])?,
                        number(e, &prefix, &["Position", "Y"])?,
                    ),
                    width: number(e, &prefix, &["Size", "Width"])?,
                    height: number(e, &prefix, &["Size", "Height"])?,
                    speed: Vec2::new(
                        number(e, &prefix, &["Speed", "X"])?,
                        number(e, &prefix, &["Speed", "Y"])?,
                    ),
                    color: match lookup(e, &["Color"]) {
                        None => DEFAULT_ENEMY_COLOR.to_string(),
                        Some(Value::String(color)) => color.clone(),
                        Some(other) => {
                            let path = format!("Enemies.{i}.Color");
                            return Err(invalid(&path, format!("expected a string, found {other}")));
                        }
                    },
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let settings = Self {
            arena_width: number(game, &["Game"], &["Size", "Width"])?,
            arena_height: number(game, &["Game"], &["Size", "Height"])?,
            difficulty: store.difficulty(),
            tick_ms: optional(store, &["Game", "TickMs"], ENEMY_TICK_MS)?,
            player: PlayerSettings {
                width: number(player, &["Player"], &["Size", "Width"])?,
                height: number(player, &["Player"], &["Size", "Height"])?,
                color: optional(store, &["Player", "Color"], DEFAULT_PLAYER_COLOR.to_string())?,
                border: optional(store, &["Player", "Border"], PLAYER_BORDER)?,
            },
            enemies,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Geometry must be usable: finite values, positive sizes, everything inside the arena
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = |path: &str, values: &[f32]| {
            if values.iter().all(|v| v.is_finite()) {
                Ok(())
            } else {
                Err(invalid(path, "values must be finite"))
            }
        };
        finite("Game.Size", &[self.arena_width, self.arena_height])?;
        if !(self.arena_width > 0.0 && self.arena_height > 0.0) {
            return Err(invalid("Game.Size", "arena must have a positive size"));
        }
        if self.tick_ms == 0 {
            return Err(invalid("Game.TickMs", "tick period must be at least 1ms"));
        }

        let p = &self.player;
        finite("Player", &[p.width, p.height, p.border])?;
        if !(p.width > 0.0 && p.height > 0.0) {
            return Err(invalid("Player.Size", "player must have a positive size"));
        }
        if !(p.border >= 0.0) {
            return Err(invalid("Player.Border", "border cannot be negative"));
        }
        if p.width + 2.0 * p.border > self.arena_width
            || p.height + 2.0 * p.border > self.arena_height
        {
            return Err(invalid("Player", "player does not fit inside the border"));
        }

        for (i, e) in self.enemies.iter().enumerate() {
            let path = format!("Enemies.{i}");
            finite(
                &path,
                &[e.position.x, e.position.y, e.width, e.height, e.speed.x, e.speed.y],
            )?;
            if !(e.width > 0.0 && e.height > 0.0) {
                return Err(invalid(&path, "enemy must have a positive size"));
            }
            let left = e.position.x - e.width / 2.0;
            let top = e.position.y - e.height / 2.0;
            let inside = left > 0.0
                && top > 0.0
                && left + e.width < self.arena_width
                && top + e.height < self.arena_height;
            if !inside {
                return Err(invalid(&path, "enemy starts outside the arena"));
            }
        }
        Ok(())
    }

    pub fn with_player_overrides(
        mut self,
        overrides: &PlayerOverrides,
    ) -> Result<Self, ConfigError> {
        self.player = self.player.with_overrides(overrides);
        self.validate()?;
        Ok(self)
    }
}
