use crate::error::{Error, Result};
use std::io::Write;
use std::path::Path;

/// Rasterizes an SVG document onto a white canvas and encodes it as PNG.
///
/// The canvas takes the pixel size of the document's own `width`/`height`
/// (or view box). Any parse or encode failure is returned as
/// [`Error::Rasterization`].
#[cfg(feature = "png")]
pub fn render_png(svg: &str) -> Result<Vec<u8>> {
    use once_cell::sync::Lazy;
    use std::sync::Arc;

    static RASTER_FONTS: Lazy<Arc<usvg::fontdb::Database>> = Lazy::new(|| {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        Arc::new(db)
    });

    let opt = usvg::Options {
        font_family: "Tahoma".to_string(),
        fontdb: RASTER_FONTS.clone(),
        ..usvg::Options::default()
    };

    let tree = usvg::Tree::from_str(svg, &opt).map_err(|err| Error::Rasterization(err.to_string()))?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height()).ok_or_else(|| {
        Error::Rasterization(format!(
            "cannot allocate a {}x{} canvas",
            size.width(),
            size.height()
        ))
    })?;
    pixmap.fill(resvg::tiny_skia::Color::WHITE);

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap
        .encode_png()
        .map_err(|err| Error::Rasterization(err.to_string()))
}

#[cfg(not(feature = "png"))]
pub fn render_png(_svg: &str) -> Result<Vec<u8>> {
    Err(Error::Rasterization(
        "built without the `png` feature".to_string(),
    ))
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(svg.as_bytes())?;
        }
    }
    Ok(())
}

pub fn write_output_png(png: &[u8], output: &Path) -> Result<()> {
    std::fs::write(output, png)?;
    Ok(())
}

#[cfg(all(test, feature = "png"))]
mod tests {
    use super::*;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

    #[test]
    fn render_png_produces_png_bytes() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="20" viewBox="0 0 40 20"><rect x="5" y="5" width="30" height="10" fill="#C2E7EF"/></svg>"##;
        let png = render_png(svg).unwrap();
        assert_eq!(&png[..8], &PNG_SIGNATURE);
    }

    #[test]
    fn malformed_svg_is_a_rasterization_error() {
        let err = render_png("<svg").unwrap_err();
        assert!(matches!(err, Error::Rasterization(_)));
    }
}
