use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Highest value a bank-select or program-change data byte can carry.
const MIDI_DATA_MAX: u8 = 127;

/// One synthesizer preset as it appears in the catalog file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Preset {
    pub pack: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub cc0: u8,
    pub pgm: u8,
    #[serde(rename = "preset")]
    pub name: String,
    #[serde(default)]
    pub characters: Vec<String>,
}

impl Preset {
    /// Display form of the character tags.
    pub fn character_list(&self) -> String {
        self.characters.join(", ")
    }
}

/// Columns of the preset grid, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Pack,
    Type,
    Cc0,
    Pgm,
    Name,
    Characters,
}

impl Field {
    pub const COUNT: usize = 6;

    pub const ALL: [Field; Field::COUNT] = [
        Field::Pack,
        Field::Type,
        Field::Cc0,
        Field::Pgm,
        Field::Name,
        Field::Characters,
    ];

    /// Header label, which is also the key used in the catalog file.
    pub fn name(self) -> &'static str {
        match self {
            Field::Pack => "pack",
            Field::Type => "type",
            Field::Cc0 => "cc0",
            Field::Pgm => "pgm",
            Field::Name => "preset",
            Field::Characters => "characters",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Field::Cc0 | Field::Pgm)
    }

    /// Render this field of `preset` the way the grid shows it.
    pub fn render(self, preset: &Preset) -> String {
        match self {
            Field::Pack => preset.pack.clone(),
            Field::Type => preset.kind.clone(),
            Field::Cc0 => preset.cc0.to_string(),
            Field::Pgm => preset.pgm.to_string(),
            Field::Name => preset.name.clone(),
            Field::Characters => preset.character_list(),
        }
    }
}

impl std::str::FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pack" => Ok(Field::Pack),
            "type" => Ok(Field::Type),
            "cc0" | "bank" => Ok(Field::Cc0),
            "pgm" | "program" => Ok(Field::Pgm),
            "preset" | "name" => Ok(Field::Name),
            "characters" | "chars" => Ok(Field::Characters),
            other => Err(format!(
                "unknown field '{other}' (expected one of: pack, type, cc0, pgm, preset, characters)"
            )),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot read preset catalog {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed preset catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("preset #{index} '{name}': {field} = {value} is outside 0-127")]
    OutOfRange {
        index: usize,
        name: String,
        field: &'static str,
        value: u8,
    },
}

/// The full, read-only list of presets.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    presets: Vec<Preset>,
}

impl Catalog {
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json(&content)?;
        log::info!("Loaded {} presets from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let presets: Vec<Preset> = serde_json::from_str(json)?;
        for (index, preset) in presets.iter().enumerate() {
            for (field, value) in [("cc0", preset.cc0), ("pgm", preset.pgm)] {
                if value > MIDI_DATA_MAX {
                    return Err(LoadError::OutOfRange {
                        index,
                        name: preset.name.clone(),
                        field,
                        value,
                    });
                }
            }
        }
        Ok(Self::from_presets(presets))
    }

    pub fn from_presets(presets: Vec<Preset>) -> Self {
        Self { presets }
    }

    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Pack names in first-seen order.
    pub fn distinct_packs(&self) -> Vec<&str> {
        first_seen(self.presets.iter().map(|p| p.pack.as_str()))
    }

    /// Type names in first-seen order, optionally limited to one pack.
    pub fn distinct_types(&self, pack: Option<&str>) -> Vec<&str> {
        first_seen(
            self.presets
                .iter()
                .filter(|p| pack.is_none_or(|pack| p.pack == pack))
                .map(|p| p.kind.as_str()),
        )
    }

    /// Widest rendered value of each field, indexed by `Field::index`.
    pub fn max_field_widths(&self) -> [usize; Field::COUNT] {
        let mut widths = [0; Field::COUNT];
        for preset in &self.presets {
            for field in Field::ALL {
                let w = field.render(preset).chars().count();
                widths[field.index()] = widths[field.index()].max(w);
            }
        }
        widths
    }

    pub fn find_by_name(&self, name: &str, pack: Option<&str>) -> Option<&Preset> {
        self.presets.iter().find(|p| {
            p.name.eq_ignore_ascii_case(name) && pack.is_none_or(|pack| p.pack == pack)
        })
    }

    /// Groups of presets that share a bank/program address. Only groups
    /// with more than one member are returned, in first-seen order.
    pub fn duplicate_addresses(&self) -> Vec<((u8, u8), Vec<&Preset>)> {
        let mut groups: Vec<((u8, u8), Vec<&Preset>)> = Vec::new();
        for preset in &self.presets {
            let addr = (preset.cc0, preset.pgm);
            match groups.iter_mut().find(|(a, _)| *a == addr) {
                Some((_, members)) => members.push(preset),
                None => groups.push((addr, vec![preset])),
            }
        }
        groups.retain(|(_, members)| members.len() > 1);
        groups
    }
}

fn first_seen<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut out: Vec<&str> = Vec::new();
    for v in values {
        if !out.contains(&v) {
            out.push(v);
        }
    }
    out
}

#[cfg(test)]
pub(crate) fn preset(pack: &str, kind: &str, cc0: u8, pgm: u8, name: &str) -> Preset {
    Preset {
        pack: pack.into(),
        kind: kind.into(),
        cc0,
        pgm,
        name: name.into(),
        characters: Vec::new(),
    }
}
