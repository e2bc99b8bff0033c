//! Bitmap font loading (AngelCode text format).
//!
//! ```text
//! info face="Default" size=16
//! common lineHeight=18 base=14 pages=1
//! page id=0 file="default.png"
//! chars count=1
//! char id=65 x=0 y=0 width=8 height=12 xoffset=0 yoffset=2 xadvance=9 page=0 chnl=0
//! ```

use std::sync::Arc;

use image::RgbaImage;
use nuiview_core::alloc::HashMap;

use crate::error::AssetResult;
use crate::loader::{AssetLoader, LoadContext};
use crate::texture::decode_rgba;
use crate::urn::Urn;

const CHAR_KEYS: [&str; 10] = [
    "id", "x", "y", "width", "height", "xoffset", "yoffset", "xadvance", "page", "chnl",
];

/// Glyph metrics of one character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontCharacter {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub x_offset: i32,
    pub y_offset: i32,
    pub x_advance: i32,
    pub page: i32,
}

/// One glyph atlas page.
#[derive(Debug, Clone)]
pub struct FontPage {
    pub id: i32,
    pub file: String,
    pub image: Arc<RgbaImage>,
}

#[derive(Debug, Clone)]
pub struct BitmapFont {
    urn: Urn,
    line_height: i32,
    base_height: i32,
    underline_offset: i32,
    underline_thickness: i32,
    pages: Vec<FontPage>,
    characters: HashMap<u32, FontCharacter>,
}

impl BitmapFont {
    pub fn urn(&self) -> &Urn {
        &self.urn
    }

    pub fn line_height(&self) -> i32 {
        self.line_height
    }

    pub fn base_height(&self) -> i32 {
        self.base_height
    }

    pub fn underline_offset(&self) -> i32 {
        self.underline_offset
    }

    pub fn underline_thickness(&self) -> i32 {
        self.underline_thickness
    }

    pub fn pages(&self) -> &[FontPage] {
        &self.pages
    }

    pub fn character(&self, c: char) -> Option<&FontCharacter> {
        self.characters.get(&(c as u32))
    }

    pub fn character_count(&self) -> usize {
        self.characters.len()
    }

    /// Horizontal advance of `text` on one line; unknown glyphs advance by zero.
    pub fn width(&self, text: &str) -> i32 {
        text.chars()
            .filter_map(|c| self.character(c))
            .map(|c| c.x_advance)
            .sum()
    }
}

/// Loads `.fnt` and `.font` files plus the page images they reference.
#[derive(Debug, Default, Clone, Copy)]
pub struct FontLoader;

impl AssetLoader for FontLoader {
    type Asset = BitmapFont;
    type Env = ();

    fn extensions(&self) -> &[&str] {
        &["fnt", "font"]
    }

    fn load(&self, ctx: LoadContext<'_>, _env: &()) -> AssetResult<BitmapFont> {
        let text = std::str::from_utf8(ctx.bytes).map_err(|e| ctx.error(e.to_string()))?;
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());
        let mut next_line = |what: &str| {
            lines
                .next()
                .ok_or_else(|| ctx.error(format!("unexpected end of font, expected {} line", what)))
        };

        let info = next_line("info")?;
        if !info.starts_with("info ") {
            return Err(ctx.error("missing info line"));
        }

        let common = next_line("common")?;
        let Some(common_fields) = common.strip_prefix("common ") else {
            return Err(ctx.error("missing common line"));
        };
        let common_fields = parse_fields(common_fields);
        let line_height = lookup_int(&common_fields, "lineHeight").unwrap_or(0);
        let base_height = lookup_int(&common_fields, "base").unwrap_or(0);
        let page_count = lookup_int(&common_fields, "pages").unwrap_or(0);

        let mut pages = Vec::new();
        for _ in 0..page_count {
            let line = next_line("page")?;
            let page = line
                .strip_prefix("page ")
                .map(parse_fields)
                .and_then(|fields| {
                    let id = lookup_int(&fields, "id")?;
                    let file = lookup(&fields, "file")?.to_string();
                    Some((id, file))
                });
            let Some((id, file)) = page else {
                return Err(ctx.error(format!("invalid page line '{}'", line)));
            };

            let page_path = ctx.directory().join(&file);
            let bytes = ctx.project.read(&page_path)?;
            let image = decode_rgba(&ctx, &bytes)?;
            pages.push(FontPage {
                id,
                file,
                image: Arc::new(image),
            });
        }

        let chars_line = next_line("chars")?;
        let char_count = chars_line
            .strip_prefix("chars ")
            .map(parse_fields)
            .and_then(|fields| lookup_int(&fields, "count"))
            .ok_or_else(|| ctx.error(format!("invalid chars line '{}'", chars_line)))?;

        let mut characters = HashMap::default();
        for _ in 0..char_count {
            let line = next_line("char")?;
            let (id, character) = parse_character(line)
                .ok_or_else(|| ctx.error(format!("invalid char line '{}'", line)))?;
            characters.insert(id, character);
        }

        Ok(BitmapFont {
            urn: ctx.urn.clone(),
            line_height,
            base_height,
            underline_offset: 2,
            underline_thickness: 1,
            pages,
            characters,
        })
    }

    fn name(&self) -> &'static str {
        "font"
    }
}

/// Split `key=value` pairs; values may be double-quoted and contain spaces.
fn parse_fields(line: &str) -> Vec<(&str, &str)> {
    let mut fields = Vec::new();
    let mut rest = line.trim_start();
    while let Some(eq) = rest.find('=') {
        let key = rest[..eq].trim();
        let after = &rest[eq + 1..];
        let (value, tail) = if let Some(quoted) = after.strip_prefix('"') {
            match quoted.find('"') {
                Some(end) => (&quoted[..end], &quoted[end + 1..]),
                None => (quoted, ""),
            }
        } else {
            let end = after.find(char::is_whitespace).unwrap_or(after.len());
            (&after[..end], &after[end..])
        };
        fields.push((key, value));
        rest = tail.trim_start();
    }
    fields
}

fn lookup<'a>(fields: &[(&str, &'a str)], key: &str) -> Option<&'a str> {
    fields.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

fn lookup_int(fields: &[(&str, &str)], key: &str) -> Option<i32> {
    lookup(fields, key).and_then(|v| v.parse().ok())
}

fn parse_character(line: &str) -> Option<(u32, FontCharacter)> {
    let fields = parse_fields(line.strip_prefix("char")?);
    if fields.len() != CHAR_KEYS.len() {
        return None;
    }
    let mut values = [0i32; 10];
    for (slot, ((key, value), expected)) in values.iter_mut().zip(fields.iter().zip(CHAR_KEYS)) {
        if *key != expected {
            return None;
        }
        *slot = value.parse().ok()?;
    }

    let id = u32::try_from(values[0]).ok()?;
    Some((
        id,
        FontCharacter {
            x: values[1],
            y: values[2],
            width: values[3],
            height: values[4],
            x_offset: values[5],
            y_offset: values[6],
            x_advance: values[7],
            page: values[8],
        },
    ))
}
