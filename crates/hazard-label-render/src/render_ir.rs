use serde::Serialize;

/// 8-bit RGB colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const GHS_RED: Rgb = Rgb::new(0xe3, 0x06, 0x13);
    pub const SELECTION: Rgb = Rgb::new(0x3b, 0x82, 0xf6);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn from_array(rgb: [u8; 3]) -> Self {
        Self::new(rgb[0], rgb[1], rgb[2])
    }

    /// `#rrggbb` form for CSS consumers.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Black or white, whichever reads better on top of `self`.
    pub fn contrasting_ink(self) -> Rgb {
        let luma = 30 * u32::from(self.r) + 59 * u32::from(self.g) + 11 * u32::from(self.b);
        if luma < 128 * 100 {
            Rgb::WHITE
        } else {
            Rgb::BLACK
        }
    }
}

/// Semantic role of a text run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextRole {
    Title,
    Subtitle,
    SignalWord,
    RatingValue,
    RatingCaption,
    Statement,
    PictogramGlyph,
    Footer,
}

/// Resolved style passed to renderer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ResolvedTextStyle {
    /// Size in pixels.
    pub size_px: f32,
    pub bold: bool,
    pub color: Rgb,
    /// Semantic role.
    pub role: TextRole,
}

impl ResolvedTextStyle {
    pub fn new(role: TextRole, size_px: u32) -> Self {
        Self {
            size_px: size_px as f32,
            bold: false,
            color: Rgb::BLACK,
            role,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }
}

/// Text draw command.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TextCommand {
    /// Left x.
    pub x: i32,
    /// Top y of the text box.
    pub y: i32,
    /// Content.
    pub text: String,
    /// Resolved style.
    pub style: ResolvedTextStyle,
}

/// Rule draw command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RuleCommand {
    /// Start x.
    pub x: i32,
    /// Start y.
    pub y: i32,
    /// Length.
    pub length: u32,
    /// Thickness.
    pub thickness: u32,
    /// Horizontal if true; vertical if false.
    pub horizontal: bool,
    pub color: Rgb,
}

/// Rectangle command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RectCommand {
    /// Left x.
    pub x: i32,
    /// Top y.
    pub y: i32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
    pub fill: Option<Rgb>,
    pub stroke: Option<Rgb>,
    pub stroke_width: u32,
    /// Fill is decorative background colour. Renderers drop it when the
    /// surface is not reproducing exact colours.
    pub background: bool,
}

/// GHS pictogram frame: a square rotated 45 degrees.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DiamondCommand {
    /// Left x of the bounding square.
    pub x: i32,
    /// Top y of the bounding square.
    pub y: i32,
    /// Side of the bounding square.
    pub size: u32,
    pub border: Rgb,
    pub border_width: u32,
    pub fill: Rgb,
}

impl DiamondCommand {
    /// Corner points clockwise from the top.
    pub fn corners(&self) -> [(i32, i32); 4] {
        let half = (self.size / 2) as i32;
        let size = self.size as i32;
        [
            (self.x + half, self.y),
            (self.x + size, self.y + half),
            (self.x + half, self.y + size),
            (self.x, self.y + half),
        ]
    }
}

/// Draw command in page coordinates.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DrawCommand {
    /// Draw text.
    Text(TextCommand),
    /// Draw a line rule.
    Rule(RuleCommand),
    /// Draw rectangle.
    Rect(RectCommand),
    /// Draw pictogram frame.
    Diamond(DiamondCommand),
}

/// Per-page content metrics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PageMetrics {
    pub statements_shown: usize,
    pub statements_dropped: usize,
    pub pictograms_shown: usize,
    pub pictograms_dropped: usize,
    /// Text runs shortened to fit their box.
    pub truncated_runs: usize,
}

/// Composed label represented as backend-agnostic draw commands.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LabelPage {
    pub width: u32,
    pub height: u32,
    /// Label artwork.
    pub content_commands: Vec<DrawCommand>,
    /// Editing decorations (selection outline, handles). Never printed.
    pub chrome_commands: Vec<DrawCommand>,
    pub metrics: PageMetrics,
}

impl LabelPage {
    const INITIAL_CONTENT_COMMAND_CAPACITY: usize = 32;

    /// Create an empty page.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            content_commands: Vec::with_capacity(Self::INITIAL_CONTENT_COMMAND_CAPACITY),
            chrome_commands: Vec::with_capacity(0),
            metrics: PageMetrics::default(),
        }
    }

    /// Push a content-layer command.
    pub fn push_content_command(&mut self, cmd: DrawCommand) {
        self.content_commands.push(cmd);
    }

    /// Push a chrome-layer command.
    pub fn push_chrome_command(&mut self, cmd: DrawCommand) {
        self.chrome_commands.push(cmd);
    }

    /// Iterate content then chrome commands without allocating.
    pub fn merged_commands_iter(
        &self,
    ) -> core::iter::Chain<core::slice::Iter<'_, DrawCommand>, core::slice::Iter<'_, DrawCommand>>
    {
        self.content_commands
            .iter()
            .chain(self.chrome_commands.iter())
    }

    pub fn texts(&self) -> impl Iterator<Item = &TextCommand> {
        self.content_commands.iter().filter_map(|cmd| match cmd {
            DrawCommand::Text(text) => Some(text),
            _ => None,
        })
    }

    pub fn texts_with_role(&self, role: TextRole) -> impl Iterator<Item = &TextCommand> {
        self.texts().filter(move |text| text.style.role == role)
    }

    /// Serialize the page for preview tooling.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
