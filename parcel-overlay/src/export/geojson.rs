//! Export des couches de superposition en GeoJSON (geozero, en flux)

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use geozero::geojson::GeoJsonWriter;
use geozero::GeozeroGeometry;

use crate::overlay::OverlayLayer;

/// Écrit les couches dans une FeatureCollection EPSG:4326
pub fn export_layers(layers: &[OverlayLayer], output_path: &Path) -> Result<()> {
    let file = File::create(output_path)
        .with_context(|| format!("Failed to create file: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);

    write!(
        writer,
        r#"{{"type":"FeatureCollection","crs":{{"type":"name","properties":{{"name":"urn:ogc:def:crs:EPSG::4326"}}}},"features":["#
    )?;

    for (i, layer) in layers.iter().enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        write_layer(&mut writer, layer)?;
    }

    write!(writer, "]}}")?;
    writer.flush()?;

    Ok(())
}

/// Écrit une couche comme une feature GeoJSON
fn write_layer<W: Write>(writer: &mut W, layer: &OverlayLayer) -> Result<()> {
    write!(writer, r#"{{"type":"Feature","geometry":"#)?;

    let mut geom_buf = Vec::new();
    let mut geom_writer = GeoJsonWriter::new(&mut geom_buf);
    layer.geometry.process_geom(&mut geom_writer)?;
    writer.write_all(&geom_buf)?;

    write!(
        writer,
        r#","properties":{{"name":{},"kind":{},"color":{}}}}}"#,
        serde_json::to_string(&layer.name)?,
        serde_json::to_string(&layer.kind)?,
        serde_json::to_string(&layer.color)?
    )?;

    Ok(())
}
