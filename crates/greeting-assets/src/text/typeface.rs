//! Typeface JSON fonts: parsing and glyph layout.
//!
//! Glyph outlines are strings of drawing commands in font units:
//! `m x y` (move), `l x y` (line), `q x y cx cy` (quadratic, end point
//! first), and `b x y c1x c1y c2x c2y` (cubic, end point first). Curves are
//! flattened into polylines at layout time.

use std::collections::HashMap;

use glam::Vec2;
use serde::Deserialize;

/// Glyph used when a character is missing from the font.
const FALLBACK_GLYPH: &str = "?";

/// A parsed typeface font.
#[derive(Debug, Clone, Deserialize)]
pub struct Typeface {
    pub glyphs: HashMap<String, Glyph>,
    #[serde(rename = "familyName", default)]
    pub family_name: String,
    /// Font units per em.
    pub resolution: f32,
    #[serde(rename = "boundingBox")]
    pub bounding_box: BoundingBox,
    #[serde(rename = "underlineThickness", default)]
    pub underline_thickness: f32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BoundingBox {
    #[serde(rename = "yMin")]
    pub y_min: f32,
    #[serde(rename = "yMax")]
    pub y_max: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Glyph {
    /// Horizontal advance in font units.
    pub ha: f32,
    /// Outline commands; absent for blank glyphs such as space.
    #[serde(default)]
    pub o: Option<String>,
}

/// A closed polyline. The closing edge from last to first is implicit.
pub type Contour = Vec<Vec2>;

/// One laid-out character: its contours in text space.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphOutline {
    pub character: char,
    pub contours: Vec<Contour>,
}

impl Typeface {
    /// Parse typeface JSON.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, String> {
        let face: Typeface = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
        if face.resolution.is_nan() || face.resolution <= 0.0 {
            return Err(format!("resolution must be positive, got {}", face.resolution));
        }
        Ok(face)
    }

    /// Distance between baselines for glyphs of height `size`.
    pub fn line_height(&self, size: f32) -> f32 {
        let scale = size / self.resolution;
        (self.bounding_box.y_max - self.bounding_box.y_min + self.underline_thickness) * scale
    }

    /// Lay out `text` at glyph height `size`, flattening each curve into
    /// `curve_segments` line segments.
    ///
    /// Characters missing from the font use the `?` glyph; if that is
    /// missing too they are skipped with a warning. `\n` starts a new line.
    pub fn layout(
        &self,
        text: &str,
        size: f32,
        curve_segments: u32,
    ) -> Result<Vec<GlyphOutline>, String> {
        let scale = size / self.resolution;
        let line_height = self.line_height(size);
        let segments = curve_segments.max(1);
        let mut offset = Vec2::ZERO;
        let mut outlines = Vec::new();

        for character in text.chars() {
            if character == '\n' {
                offset.x = 0.0;
                offset.y -= line_height;
                continue;
            }

            let key = character.to_string();
            let glyph = self
                .glyphs
                .get(key.as_str())
                .or_else(|| self.glyphs.get(FALLBACK_GLYPH));
            let Some(glyph) = glyph else {
                tracing::warn!(
                    %character,
                    family = %self.family_name,
                    "Character missing from font"
                );
                continue;
            };

            let contours = match &glyph.o {
                Some(outline) => parse_outline(outline, scale, offset, segments)
                    .map_err(|e| format!("glyph {character:?}: {e}"))?,
                None => Vec::new(),
            };
            outlines.push(GlyphOutline {
                character,
                contours,
            });
            offset.x += glyph.ha * scale;
        }

        Ok(outlines)
    }
}

/// Parse and flatten one outline string.
fn parse_outline(
    outline: &str,
    scale: f32,
    offset: Vec2,
    segments: u32,
) -> Result<Vec<Contour>, String> {
    let mut tokens = outline.split_whitespace();
    let next_point = |tokens: &mut std::str::SplitWhitespace<'_>| -> Result<Vec2, String> {
        let mut coord = || -> Result<f32, String> {
            let token = tokens.next().ok_or("outline ends mid-command")?;
            token
                .parse::<f32>()
                .map_err(|_| format!("invalid coordinate {token:?}"))
        };
        let x = coord()?;
        let y = coord()?;
        Ok(Vec2::new(x, y) * scale + offset)
    };

    let mut contours: Vec<Contour> = Vec::new();
    let mut current: Contour = Vec::new();
    let mut pen = Vec2::ZERO;

    while let Some(command) = tokens.next() {
        match command {
            "m" => {
                finish_contour(&mut current, &mut contours);
                pen = next_point(&mut tokens)?;
                current.push(pen);
            }
            "l" => {
                pen = next_point(&mut tokens)?;
                current.push(pen);
            }
            "q" => {
                let end = next_point(&mut tokens)?;
                let control = next_point(&mut tokens)?;
                for step in 1..=segments {
                    let t = step as f32 / segments as f32;
                    current.push(quadratic(pen, control, end, t));
                }
                pen = end;
            }
            "b" => {
                let end = next_point(&mut tokens)?;
                let c1 = next_point(&mut tokens)?;
                let c2 = next_point(&mut tokens)?;
                for step in 1..=segments {
                    let t = step as f32 / segments as f32;
                    current.push(cubic(pen, c1, c2, end, t));
                }
                pen = end;
            }
            "z" => finish_contour(&mut current, &mut contours),
            other => return Err(format!("unknown outline command {other:?}")),
        }
    }
    finish_contour(&mut current, &mut contours);
    Ok(contours)
}

/// Close `current` and keep it if it still encloses an area.
fn finish_contour(current: &mut Contour, contours: &mut Vec<Contour>) {
    let mut contour = std::mem::take(current);
    contour.dedup_by(|a, b| a.distance_squared(*b) < 1e-12);
    let closed = matches!(
        (contour.first(), contour.last()),
        (Some(first), Some(last)) if contour.len() > 1 && first.distance_squared(*last) < 1e-12
    );
    if closed {
        contour.pop();
    }
    if contour.len() >= 3 {
        contours.push(contour);
    }
}

fn quadratic(p0: Vec2, c: Vec2, p1: Vec2, t: f32) -> Vec2 {
    let u = 1.0 - t;
    p0 * (u * u) + c * (2.0 * u * t) + p1 * (t * t)
}

fn cubic(p0: Vec2, c1: Vec2, c2: Vec2, p1: Vec2, t: f32) -> Vec2 {
    let u = 1.0 - t;
    p0 * (u * u * u) + c1 * (3.0 * u * u * t) + c2 * (3.0 * u * t * t) + p1 * (t * t * t)
}

/// Signed area of a closed polyline; positive when counter-clockwise.
pub fn signed_area(contour: &[Vec2]) -> f32 {
    let n = contour.len();
    (0..n)
        .map(|i| contour[i].perp_dot(contour[(i + 1) % n]))
        .sum::<f32>()
        * 0.5
}
