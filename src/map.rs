use crate::colors::{to_hex, Scale};
use crate::config::output_stem;
use crate::error::Result;
use crate::grid::{Cell, Grid, Metric};
use crate::traits::Render;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue};
use log::{debug, info};
use std::fs;
use std::path::Path;

pub const FILL_OPACITY: f64 = 0.3;

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{{title}}</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<style>html, body, #map { width: 100%; height: 100%; margin: 0; padding: 0; }</style>
</head>
<body>
<div id="map"></div>
<script>
const cells = {{cells}};
const map = L.map("map", { preferCanvas: true });
L.tileLayer("https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png", {
  attribution: "&copy; OpenStreetMap contributors",
  maxZoom: 18,
}).addTo(map);
L.control.scale().addTo(map);
L.geoJSON(cells, {
  style: (feature) => ({
    stroke: false,
    fill: true,
    fillColor: feature.properties.fill,
    fillOpacity: feature.properties.fill_opacity,
  }),
  onEachFeature: (feature, layer) => layer.bindTooltip(feature.properties.tooltip),
}).addTo(map);
map.fitBounds({{bounds}});
</script>
</body>
</html>
"#;

/// The interactive map: one translucent rectangle per cell with data
#[derive(Debug, Clone, Copy)]
pub struct LeafletMap {
    pub metric: Metric,
    pub divider: Option<Metric>,
}

impl LeafletMap {
    pub fn new(metric: Metric, divider: Option<Metric>) -> Self {
        Self { metric, divider }
    }

    pub fn scale(&self) -> Scale {
        Scale::for_metrics(self.metric, self.divider)
    }

    fn feature(&self, cell: &Cell, value: f64) -> Feature {
        let scale = self.scale();
        // geojson wants (lon, lat)
        let rect = geo::Rect::new((cell.lon.left, cell.lat.left), (cell.lon.right, cell.lat.right));
        let geometry = Geometry::new(geojson::Value::from(&rect.to_polygon()));

        let mut properties = JsonObject::new();
        properties.insert("fill".into(), to_hex(&scale.color(value)).into());
        properties.insert("fill_opacity".into(), FILL_OPACITY.into());
        properties.insert("tooltip".into(), scale.tooltip(value).into());
        properties.insert("value".into(), value.into());
        properties.insert("count".into(), JsonValue::from(cell.count));

        Feature {
            bbox: None,
            geometry: Some(geometry),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }

    /// Suppressed cells are left out entirely
    pub fn feature_collection(&self, grid: &Grid) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: grid
                .rendered_cells()
                .map(|(cell, value)| self.feature(cell, value))
                .collect(),
            foreign_members: None,
        }
    }

    pub fn to_html(&self, grid: &Grid) -> Result<String> {
        let collection = self.feature_collection(grid);
        debug!("{} rectangles on the map", collection.features.len());

        // keep the embedded json from closing the script tag
        let cells = serde_json::to_string(&collection)?.replace("</", "<\\/");
        let (south, west, north, east) = grid.bounds();
        let bounds = serde_json::to_string(&[[south, west], [north, east]])?;

        Ok(TEMPLATE
            .replace("{{title}}", &output_stem(self.metric, self.divider))
            .replace("{{cells}}", &cells)
            .replace("{{bounds}}", &bounds))
    }
}

impl Render for LeafletMap {
    fn file_name(&self) -> String {
        format!("{}.html", output_stem(self.metric, self.divider))
    }

    fn render_to_file(&self, grid: &Grid, path: &Path) -> Result<()> {
        let html = self.to_html(grid)?;
        fs::write(path, html)?;
        info!("map saved to {}", path.display());
        Ok(())
    }
}
