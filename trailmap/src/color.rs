use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// RGBA color of a map layer.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Color {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

impl Color {
    /// White color: `#FFFFFF`
    pub const WHITE: Color = Color::rgba(255, 255, 255, 255);
    /// Black color: `#000000`
    pub const BLACK: Color = Color::rgba(0, 0, 0, 255);

    /// Constructs color from its RGBA channels.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Constructs color from a `#RRGGBB` or `#RRGGBBAA` literal at compile time.
    ///
    /// # Panics
    ///
    /// Panics on malformed literals, which fails the build when used in a constant.
    pub const fn from_hex(hex: &'static str) -> Self {
        match parse_hex(hex.as_bytes()) {
            Some(color) => color,
            None => panic!("invalid color literal"),
        }
    }

    /// SVG paint value of the color without the alpha channel.
    pub fn to_svg(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Opacity in the `0.0..=1.0` range.
    pub fn opacity(&self) -> f64 {
        f64::from(self.a) / 255.0
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_svg())?;
        if self.a != 255 {
            write!(f, "{:02X}", self.a)?;
        }

        Ok(())
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex(s.as_bytes()).ok_or_else(|| format!("invalid color '{s}'"))
    }
}

const fn parse_hex(bytes: &[u8]) -> Option<Color> {
    if (bytes.len() != 7 && bytes.len() != 9) || bytes[0] != b'#' {
        return None;
    }

    let mut channels = [255u8; 4];
    let mut i = 0;
    while i < (bytes.len() - 1) / 2 {
        let (Some(high), Some(low)) = (nibble(bytes[1 + 2 * i]), nibble(bytes[2 + 2 * i])) else {
            return None;
        };
        channels[i] = high << 4 | low;
        i += 1;
    }

    Some(Color::rgba(channels[0], channels[1], channels[2], channels[3]))
}

const fn nibble(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
