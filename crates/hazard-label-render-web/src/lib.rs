//! HTML documents for `hazard-label`: the desktop print page, the thermal
//! simulation page, and the interactive label preview.

use std::borrow::Cow;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hazard_label::{PhysicalSize, ThermalPrint};
use hazard_label_render::LabelPage;
use quick_xml::escape::escape;
use serde::Serialize;

/// Delay between document load and the print dialog.
pub const DEFAULT_SETTLE_MS: u32 = 300;

/// Web preview crate metadata.
pub mod preview {
    /// Current crate version.
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
}

/// `data:` URI for PNG bytes.
pub fn png_data_uri(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", BASE64.encode(png))
}

/// Inch length for CSS without trailing zeros (`3in`, `1.33in`).
pub fn css_inches(value: f64) -> String {
    let fixed = format!("{:.4}", value);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    format!("{}in", trimmed)
}

/// Full-bleed print page sized to `physical`.
///
/// The page prints itself after `settle_ms` and closes once the dialog
/// returns.
pub fn desktop_print_document(
    title: &str,
    png: &[u8],
    physical: PhysicalSize,
    settle_ms: u32,
) -> String {
    let width = css_inches(physical.width_in);
    let height = css_inches(physical.height_in);
    let title = escape(title);
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
@page {{ size: {width} {height}; margin: 0 }}
html, body {{ margin: 0; padding: 0; }}
img {{ display: block; width: {width}; height: {height}; }}
</style>
</head>
<body>
<img src="{src}" alt="{title}">
<script>
window.addEventListener("load", function () {{
  setTimeout(function () {{ window.print(); window.close(); }}, {settle_ms});
}});
</script>
</body>
</html>
"#,
        src = png_data_uri(png),
    )
}

/// What the simulation page shows in place of a physical print.
#[derive(Clone, Debug)]
pub struct SimulationView<'a> {
    pub title: &'a str,
    pub preview_png: &'a [u8],
    pub script_text: &'a str,
    pub script_crc32: u32,
    pub config: &'a ThermalPrint,
    pub width_dots: u32,
    pub height_dots: u32,
}

/// Stand-in document for a thermal print when no print agent is reachable.
pub fn simulation_document(view: &SimulationView<'_>) -> String {
    let title = escape(view.title);
    let model = escape(&view.config.printer_model);
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Thermal print simulation: {title}</title>
<style>
body {{ font-family: system-ui, sans-serif; margin: 24px; color: #111827; }}
.preview {{ image-rendering: pixelated; border: 1px solid #9ca3af; max-width: 100%; }}
dl {{ display: grid; grid-template-columns: max-content auto; gap: 4px 16px; }}
dt {{ font-weight: 600; }}
pre {{ background: #f3f4f6; padding: 12px; white-space: pre-wrap; word-break: break-all; font-size: 11px; }}
</style>
</head>
<body>
<h1>Thermal print simulation</h1>
<p>No print agent was detected. This is what would have been sent to the printer.</p>
<dl>
<dt>Label</dt><dd>{title}</dd>
<dt>Printer</dt><dd>{model}</dd>
<dt>Resolution</dt><dd>{dpi} dpi</dd>
<dt>Size</dt><dd>{width_dots} x {height_dots} dots</dd>
<dt>Copies</dt><dd>{copies}</dd>
<dt>Script bytes</dt><dd>{script_len}</dd>
<dt>CRC-32</dt><dd><code>{crc:08x}</code></dd>
</dl>
<img class="preview" src="{src}" width="{width_dots}" height="{height_dots}" alt="monochrome preview">
<h2>Command script</h2>
<pre>{script}</pre>
</body>
</html>
"#,
        dpi = view.config.dpi,
        width_dots = view.width_dots,
        height_dots = view.height_dots,
        copies = view.config.copies,
        script_len = view.script_text.len(),
        crc = view.script_crc32,
        src = png_data_uri(view.preview_png),
        script = escape(view.script_text),
    )
}

#[derive(Serialize)]
struct PreviewPayload<'a> {
    meta: PreviewMeta<'a>,
    page: &'a LabelPage,
    capture: Option<String>,
    warnings: &'a [String],
}

#[derive(Serialize)]
struct PreviewMeta<'a> {
    title: &'a str,
    width: u32,
    height: u32,
    version: &'static str,
}

/// Interactive preview of a composed page.
///
/// The page's draw commands are embedded as JSON and painted on a canvas
/// next to the captured raster, so layout and capture can be compared.
pub fn preview_document(
    title: &str,
    page: &LabelPage,
    capture_png: Option<&[u8]>,
    warnings: &[String],
) -> Result<String, serde_json::Error> {
    let payload = PreviewPayload {
        meta: PreviewMeta {
            title,
            width: page.width,
            height: page.height,
            version: preview::VERSION,
        },
        page,
        capture: capture_png.map(png_data_uri),
        warnings,
    };
    let json = serde_json::to_string(&payload)?;
    Ok(build_preview_html(&escape(title), &script_safe_json(&json)))
}

fn script_safe_json(json: &str) -> Cow<'_, str> {
    if json.contains("</") {
        Cow::Owned(json.replace("</", "<\\/"))
    } else {
        Cow::Borrowed(json)
    }
}

fn build_preview_html(title: &str, payload_json: &str) -> String {
    format!(
        r##"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Label preview: {title}</title>
<style>
body {{ font-family: system-ui, sans-serif; margin: 24px; background: #f9fafb; color: #111827; }}
.panes {{ display: flex; gap: 24px; flex-wrap: wrap; align-items: flex-start; }}
.pane {{ background: #fff; padding: 12px; border: 1px solid #d1d5db; }}
.pane h2 {{ font-size: 14px; margin: 0 0 8px; }}
canvas, img {{ image-rendering: pixelated; }}
.warnings {{ color: #b45309; }}
label {{ font-size: 13px; }}
</style>
</head>
<body>
<h1>{title}</h1>
<div class="panes">
  <div class="pane">
    <h2>Layout</h2>
    <canvas id="layout"></canvas>
    <div><label><input type="checkbox" id="chrome" checked> editing chrome</label></div>
  </div>
  <div class="pane" id="capture-pane">
    <h2>Capture</h2>
    <img id="capture" alt="captured label">
  </div>
</div>
<ul class="warnings" id="warnings"></ul>
<script type="application/json" id="label-data">{payload_json}</script>
<script>
(function () {{
  const data = JSON.parse(document.getElementById("label-data").textContent);
  const canvas = document.getElementById("layout");
  const ctx = canvas.getContext("2d");
  const rgb = (c) => `rgb(${{c.r}},${{c.g}},${{c.b}})`;
  canvas.width = data.meta.width;
  canvas.height = data.meta.height;

  function draw(cmd) {{
    switch (cmd.kind) {{
      case "rect":
        if (cmd.fill) {{ ctx.fillStyle = rgb(cmd.fill); ctx.fillRect(cmd.x, cmd.y, cmd.width, cmd.height); }}
        if (cmd.stroke && cmd.stroke_width > 0) {{
          const w = cmd.stroke_width;
          ctx.strokeStyle = rgb(cmd.stroke);
          ctx.lineWidth = w;
          ctx.strokeRect(cmd.x + w / 2, cmd.y + w / 2, cmd.width - w, cmd.height - w);
        }}
        break;
      case "rule":
        ctx.fillStyle = rgb(cmd.color);
        if (cmd.horizontal) ctx.fillRect(cmd.x, cmd.y, cmd.length, cmd.thickness);
        else ctx.fillRect(cmd.x, cmd.y, cmd.thickness, cmd.length);
        break;
      case "diamond": {{
        const h = cmd.size / 2;
        ctx.beginPath();
        ctx.moveTo(cmd.x + h, cmd.y);
        ctx.lineTo(cmd.x + cmd.size, cmd.y + h);
        ctx.lineTo(cmd.x + h, cmd.y + cmd.size);
        ctx.lineTo(cmd.x, cmd.y + h);
        ctx.closePath();
        ctx.fillStyle = rgb(cmd.fill);
        ctx.fill();
        ctx.strokeStyle = rgb(cmd.border);
        ctx.lineWidth = cmd.border_width;
        ctx.stroke();
        break;
      }}
      case "text":
        ctx.fillStyle = rgb(cmd.style.color);
        ctx.font = `${{cmd.style.bold ? "bold " : ""}}${{cmd.style.size_px}}px monospace`;
        ctx.textBaseline = "top";
        ctx.fillText(cmd.text, cmd.x, cmd.y);
        break;
    }}
  }}

  function render() {{
    ctx.fillStyle = "#fff";
    ctx.fillRect(0, 0, canvas.width, canvas.height);
    data.page.content_commands.forEach(draw);
    if (document.getElementById("chrome").checked) data.page.chrome_commands.forEach(draw);
  }}

  document.getElementById("chrome").addEventListener("change", render);
  render();

  if (data.capture) document.getElementById("capture").src = data.capture;
  else document.getElementById("capture-pane").remove();

  const list = document.getElementById("warnings");
  data.warnings.forEach((w) => {{
    const li = document.createElement("li");
    li.textContent = w;
    list.appendChild(li);
  }});
}})();
</script>
</body>
</html>
"##
    )
}
