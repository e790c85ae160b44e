//! Glyph and colour table used by the terminal backend.

use std::{collections::HashMap, fs, path::Path};

use anyhow::{bail, Context, Result};
use mirkwood_rendering::{Cell, CellIdentity, Color};
use once_cell::sync::OnceCell;

const SUPPORTED_PALETTE_VERSION: u32 = 1;
const SHADE_COUNT: usize = 4;
const GLYPH_COUNT: usize = 8;
const STYLE_COUNT: usize = 4;

static ACTIVE: OnceCell<Palette> = OnceCell::new();
static FALLBACK: Palette = Palette::MIRKWOOD;

/// Glyphs and colours for every packed cell value.
///
/// Walls pick a shade by decoration level. Every other cell picks its glyph
/// by the low three bits (identity and marked) and its colours by the
/// marked and visited bits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    wall_shades: [char; SHADE_COUNT],
    path_glyphs: [char; GLYPH_COUNT],
    wall_fg: Color,
    wall_bg: Color,
    backgrounds: [Color; STYLE_COUNT],
    foregrounds: [Color; STYLE_COUNT],
}

/// Foreground and background pair applied to one glyph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Style {
    /// Glyph colour.
    pub foreground: Color,
    /// Cell colour.
    pub background: Color,
}

impl Palette {
    const WALL_FG: Color = Color::from_rgb(0x38, 0x58, 0x31);
    const WALL_BG: Color = Color::from_rgb(0x1b, 0x3a, 0x1b);
    const PATH_BG: Color = Color::from_rgb(0x5b, 0x46, 0x34);
    const VISITED_PATH_BG: Color = Color::from_rgb(0x63, 0x4e, 0x3a);
    const PLAYER_FG: Color = Color::from_rgb(0x72, 0x2d, 0x4f);
    const MARK_FG: Color = Color::from_rgb(0x90, 0xee, 0x90);
    const VISITED_MARK_FG: Color = Color::from_rgb(0x8e, 0xb1, 0x73);

    /// The forest theme.
    pub const MIRKWOOD: Self = Self {
        wall_shades: ['█', '▓', '▒', '░'],
        path_glyphs: [' ', '█', '●', ' ', '░', ' ', '✪', ' '],
        wall_fg: Self::WALL_FG,
        wall_bg: Self::WALL_BG,
        backgrounds: [
            Self::PATH_BG,
            Self::PATH_BG,
            Self::VISITED_PATH_BG,
            Self::VISITED_PATH_BG,
        ],
        foregrounds: [
            Self::PLAYER_FG,
            Self::MARK_FG,
            Self::PLAYER_FG,
            Self::VISITED_MARK_FG,
        ],
    };

    /// Loads a palette from a TOML file, starting from [`Palette::MIRKWOOD`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read palette at {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("invalid palette at {}", path.display()))
    }

    /// Parses a palette from TOML contents, starting from [`Palette::MIRKWOOD`].
    pub fn from_toml(contents: &str) -> Result<Self> {
        let manifest: PaletteManifest =
            toml::from_str(contents).context("failed to parse palette toml contents")?;
        if manifest.version != SUPPORTED_PALETTE_VERSION {
            bail!(
                "unsupported palette version {}; expected {}",
                manifest.version,
                SUPPORTED_PALETTE_VERSION
            );
        }

        let mut palette = Self::MIRKWOOD;
        if let Some(shades) = manifest.wall_shades {
            palette.wall_shades = parse_glyphs("wall_shades", &shades)?;
        }
        if let Some(glyphs) = manifest.path_glyphs {
            palette.path_glyphs = parse_glyphs("path_glyphs", &glyphs)?;
        }

        for (name, value) in manifest.colors {
            let color = Color::from_hex(&value)
                .with_context(|| format!("invalid value for color `{name}`"))?;
            match name.as_str() {
                "wall_fg" => palette.wall_fg = color,
                "wall_bg" => palette.wall_bg = color,
                "path_bg" => {
                    palette.backgrounds[0] = color;
                    palette.backgrounds[1] = color;
                }
                "visited_path_bg" => {
                    palette.backgrounds[2] = color;
                    palette.backgrounds[3] = color;
                }
                "player_fg" => {
                    palette.foregrounds[0] = color;
                    palette.foregrounds[2] = color;
                }
                "mark_fg" => palette.foregrounds[1] = color,
                "visited_mark_fg" => palette.foregrounds[3] = color,
                _ => bail!("unknown color key `{name}` in palette"),
            }
        }

        Ok(palette)
    }

    /// Glyph drawn for `cell`.
    #[must_use]
    pub fn glyph(&self, cell: Cell) -> char {
        if cell.identity() == CellIdentity::Wall {
            return self.wall_shades[usize::from(cell.decoration()) % SHADE_COUNT];
        }
        self.path_glyphs[usize::from(cell.flags() & 0b111)]
    }

    /// Colours applied to `cell`.
    #[must_use]
    pub fn style(&self, cell: Cell) -> Style {
        if cell.identity() == CellIdentity::Wall {
            return Style {
                foreground: self.wall_fg,
                background: self.wall_bg,
            };
        }
        let index = usize::from(cell.flags() >> 2);
        Style {
            foreground: self.foregrounds[index],
            background: self.backgrounds[index],
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::MIRKWOOD
    }
}

/// Installs `palette` as the process-wide palette.
///
/// Only the first installation takes effect.
pub fn install(palette: Palette) -> Result<&'static Palette> {
    if ACTIVE.set(palette).is_err() {
        bail!("a palette has already been installed");
    }
    log::debug!("installed terminal palette");
    Ok(active())
}

/// The installed palette, or [`Palette::MIRKWOOD`] when none was installed.
#[must_use]
pub fn active() -> &'static Palette {
    ACTIVE.get().unwrap_or(&FALLBACK)
}

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct PaletteManifest {
    version: u32,
    #[serde(default)]
    wall_shades: Option<Vec<String>>,
    #[serde(default)]
    path_glyphs: Option<Vec<String>>,
    #[serde(default)]
    colors: HashMap<String, String>,
}

fn parse_glyphs<const N: usize>(field: &str, entries: &[String]) -> Result<[char; N]> {
    if entries.len() != N {
        bail!(
            "`{field}` must list exactly {N} glyphs (found {})",
            entries.len()
        );
    }

    let mut glyphs = [' '; N];
    for (slot, entry) in glyphs.iter_mut().zip(entries) {
        let mut chars = entry.chars();
        *slot = match (chars.next(), chars.next()) {
            (None, _) => ' ',
            (Some(glyph), None) => glyph,
            (Some(_), Some(_)) => bail!("`{field}` entry `{entry}` is not a single glyph"),
        };
    }
    Ok(glyphs)
}
