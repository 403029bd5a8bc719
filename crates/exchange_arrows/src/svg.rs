use crate::constants::ARROW_HALF_EXTENT_PX;
use crate::error::{ArrowError, Result};
use crate::layer::{Frame, RenderInstruction};

use chrono::Local;
use log::info;
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Output format of a rendered frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Svg,
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Svg => "svg",
            OutputFormat::Json => "json",
        }
    }
}

/// HTML encode (for SVG text and attributes)
pub fn html_encode(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn arrow_element(inst: &RenderInstruction) -> String {
    let t = &inst.transform;
    let size = ARROW_HALF_EXTENT_PX * 2.0;
    let mut s = String::new();
    let _ = writeln!(
        s,
        r#"  <g class="exchange-arrow" data-key="{}" data-tooltip="{}" transform="translate({:.3} {:.3}) rotate({:.3}) scale({:.4})">"#,
        html_encode(&inst.identity),
        inst.tooltip.side,
        t.x,
        t.y,
        t.rotation_degrees,
        t.scale,
    );
    let _ = writeln!(
        s,
        r#"    <title>{}: {:.0} MW, {:.0} gCO2eq/kWh</title>"#,
        html_encode(&inst.tooltip.identity),
        inst.tooltip.net_flow,
        inst.tooltip.carbon_intensity,
    );
    let _ = writeln!(
        s,
        r#"    <image href="{}" x="{}" y="{}" width="{}" height="{}"/>"#,
        html_encode(&inst.image_source),
        -ARROW_HALF_EXTENT_PX,
        -ARROW_HALF_EXTENT_PX,
        size,
        size,
    );
    s.push_str("  </g>\n");
    s
}

/// Renders a frame as an SVG document
pub fn render_svg(frame: &Frame, width: f64, height: f64) -> String {
    let mut s = String::new();
    let _ = writeln!(
        s,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = width,
        h = height,
    );
    for inst in &frame.instructions {
        s.push_str(&arrow_element(inst));
    }
    s.push_str("</svg>\n");
    s
}

fn create_output(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).map_err(|e| ArrowError::CreateFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(BufWriter::new(file))
}

pub fn write_svg<P: AsRef<Path>>(frame: &Frame, width: f64, height: f64, path: P) -> Result<()> {
    let mut w = create_output(path.as_ref())?;
    w.write_all(render_svg(frame, width, height).as_bytes())?;
    w.flush()?;
    Ok(())
}

pub fn write_json<P: AsRef<Path>>(frame: &Frame, path: P) -> Result<()> {
    let mut w = create_output(path.as_ref())?;
    serde_json::to_writer_pretty(&mut w, frame)?;
    w.write_all(b"\n")?;
    w.flush()?;
    Ok(())
}

/// Saves the frame as `arrows_<timestamp>.<ext>` inside `dir`
pub fn save_frame_to_dir(
    frame: &Frame,
    width: f64,
    height: f64,
    dir: &Path,
    format: OutputFormat,
) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| ArrowError::CreateDir {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    let path = dir.join(format!("arrows_{}.{}", timestamp, format.extension()));

    match format {
        OutputFormat::Svg => write_svg(frame, width, height, &path)?,
        OutputFormat::Json => write_json(frame, &path)?,
    }
    info!("Frame saved to: {}", path.display());
    Ok(path)
}
