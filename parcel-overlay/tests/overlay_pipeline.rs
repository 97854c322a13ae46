//! Tests de bout en bout du moteur de superposition avec un fetcher simulé

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use geo::{LineString, MultiPolygon, Polygon};
use geofeature::{GeometryKind, RawCollection};
use serde_json::{json, Value};

use parcel_overlay::config::{Protocol, SourceDescriptor};
use parcel_overlay::overlay::{OverlayOptions, OverlayRun, RunState};
use parcel_overlay::parcel::Parcel;
use parcel_overlay::query::{FeatureFetcher, QueryError};

/// Réponses fixes par nom de source; une source absente échoue
struct FakeFetcher {
    responses: HashMap<String, Value>,
    delays: HashMap<String, Duration>,
}

impl FakeFetcher {
    fn new() -> Self {
        Self {
            responses: HashMap::new(),
            delays: HashMap::new(),
        }
    }

    fn respond(mut self, source: &str, body: Value) -> Self {
        self.responses.insert(source.to_string(), body);
        self
    }

    fn delay(mut self, source: &str, delay: Duration) -> Self {
        self.delays.insert(source.to_string(), delay);
        self
    }
}

impl FeatureFetcher for FakeFetcher {
    fn fetch<'a>(
        &'a self,
        source: &'a SourceDescriptor,
        _parcel: &'a Parcel,
    ) -> BoxFuture<'a, Result<RawCollection, QueryError>> {
        Box::pin(async move {
            if let Some(delay) = self.delays.get(&source.name) {
                tokio::time::sleep(*delay).await;
            }
            match self.responses.get(&source.name) {
                Some(body) => Ok(RawCollection::from_value(body.clone())?),
                None => Err(QueryError::Status {
                    status: 503,
                    url: source.url.clone(),
                }),
            }
        })
    }
}

/// Lot de 100 m × 100 m (1 ha) en SIRGAS 2000 / UTM 21S
fn parcel() -> Arc<Parcel> {
    let square = MultiPolygon::new(vec![Polygon::new(
        LineString::from(vec![
            (500000.0, 7700000.0),
            (500100.0, 7700000.0),
            (500100.0, 7700100.0),
            (500000.0, 7700100.0),
            (500000.0, 7700000.0),
        ]),
        vec![],
    )]);
    Arc::new(Parcel::new(square, 31981).unwrap())
}

fn source(name: &str, kind: GeometryKind) -> SourceDescriptor {
    SourceDescriptor {
        name: name.to_string(),
        protocol: Protocol::Rest,
        url: format!("https://example.org/{}/MapServer/0", name),
        layer: None,
        kind,
        identity_columns: vec!["nome".to_string()],
        details: vec![],
        category: None,
    }
}

/// Rectangle ArcGIS couvrant la bande x ∈ [x0, x0 + 100] sur toute la hauteur du lot
fn esri_band(name: &str, x0: f64) -> Value {
    json!({
        "attributes": {"nome": name},
        "geometry": {"rings": [[
            [x0, 7700000.0], [x0, 7700100.0], [x0 + 100.0, 7700100.0],
            [x0 + 100.0, 7700000.0], [x0, 7700000.0]
        ]]}
    })
}

fn esri_point(name: &str, x: f64, y: f64) -> Value {
    json!({"attributes": {"nome": name}, "geometry": {"x": x, "y": y}})
}

fn collection(features: Vec<Value>) -> Value {
    json!({"features": features})
}

/// Pourcentage numérique depuis le texte `12,34%`
fn parse_percent(status: &str) -> f64 {
    status.trim_end_matches('%').replace('.', "").replace(',', ".").parse().unwrap()
}

#[tokio::test]
async fn test_min_area_threshold() {
    let fetcher = FakeFetcher::new()
        .respond("Pequena", collection(vec![esri_band("0,4 ha", 500060.0)]))
        .respond("Grande", collection(vec![esri_band("0,6 ha", 500040.0)]));
    let sources = vec![
        source("Pequena", GeometryKind::Polygon),
        source("Grande", GeometryKind::Polygon),
    ];

    let mut run = OverlayRun::new(&fetcher, parcel(), OverlayOptions::default());
    let result = run.execute(&sources).await;

    assert_eq!(result.findings.len(), 1);
    let finding = &result.findings[0];
    assert_eq!(finding.source, "Grande");
    assert_eq!(finding.identity, "0,6 ha");
    assert_eq!(finding.area, "0,6000");
    assert_eq!(finding.status, "60,00%");
    assert_eq!(result.layers.len(), 1);
    assert_eq!(result.layers[0].name, "Grande: 0,6 ha");
}

#[tokio::test]
async fn test_failing_source_isolated() {
    let fetcher = FakeFetcher::new()
        .respond("A", collection(vec![esri_band("UC A", 500000.0)]))
        .respond("C", collection(vec![esri_band("UC C", 500000.0)]));
    let sources = vec![
        source("A", GeometryKind::Polygon),
        source("B", GeometryKind::Polygon),
        source("C", GeometryKind::Polygon),
    ];

    let mut run = OverlayRun::new(&fetcher, parcel(), OverlayOptions { jobs: 3 });
    let result = run.execute(&sources).await;

    assert_eq!(run.state(), RunState::Done);
    assert_eq!(result.sources_total, 3);
    assert_eq!(result.sources_failed, 1);

    let mut names: Vec<&str> = result.findings.iter().map(|f| f.source.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["A", "C"]);
}

#[tokio::test]
async fn test_service_error_payload_is_source_failure() {
    let fetcher = FakeFetcher::new()
        .respond("Quebrada", json!({"error": {"code": 500, "message": "Error performing query"}}))
        .respond("Ok", collection(vec![esri_band("UC", 500000.0)]));
    let sources = vec![
        source("Quebrada", GeometryKind::Polygon),
        source("Ok", GeometryKind::Polygon),
    ];

    let mut run = OverlayRun::new(&fetcher, parcel(), OverlayOptions::default());
    let result = run.execute(&sources).await;

    assert_eq!(result.sources_failed, 1);
    assert_eq!(result.findings.len(), 1);
    assert_eq!(result.findings[0].source, "Ok");
}

#[tokio::test]
async fn test_findings_independent_of_pool_size() {
    let mut fetcher = FakeFetcher::new();
    let mut sources = Vec::new();
    for i in 0..10 {
        let name = format!("Fonte {}", i);
        fetcher = fetcher
            .respond(&name, collection(vec![esri_band(&format!("UC {}", i), 500000.0)]))
            .delay(&name, Duration::from_millis((10 - i) as u64 * 2));
        sources.push(source(&name, GeometryKind::Polygon));
    }

    for jobs in [1, 2, 5, 16] {
        let mut run = OverlayRun::new(&fetcher, parcel(), OverlayOptions { jobs });
        let result = run.execute(&sources).await;

        assert_eq!(result.findings.len(), 10, "jobs = {}", jobs);
        assert_eq!(result.layers.len(), 10, "jobs = {}", jobs);

        let mut names: Vec<String> = result.findings.iter().map(|f| f.source.clone()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 10, "jobs = {}", jobs);
    }
}

#[tokio::test]
async fn test_points_never_merged() {
    let fetcher = FakeFetcher::new().respond(
        "Focos",
        collection(vec![
            esri_point("Foco", 500010.0, 7700010.0),
            esri_point("Foco", 500020.0, 7700020.0),
            esri_point("", 500030.0, 7700030.0),
            esri_point("", 500040.0, 7700040.0),
            esri_point("Fora", 600000.0, 7700040.0),
        ]),
    );
    let sources = vec![source("Focos", GeometryKind::Point)];

    let mut run = OverlayRun::new(&fetcher, parcel(), OverlayOptions::default());
    let result = run.execute(&sources).await;

    assert_eq!(result.findings.len(), 4);
    assert!(result
        .findings
        .iter()
        .all(|f| f.area == "Ponto no Imóvel" && f.status == "Foco/Ponto"));
}

#[tokio::test]
async fn test_same_identity_unioned() {
    let fetcher = FakeFetcher::new().respond(
        "UCs",
        collection(vec![
            esri_band("Parque", 499980.0),
            esri_band("Parque", 500050.0),
        ]),
    );
    let sources = vec![source("UCs", GeometryKind::Polygon)];

    let mut run = OverlayRun::new(&fetcher, parcel(), OverlayOptions::default());
    let result = run.execute(&sources).await;

    // Deux parties d'une même UC: une seule ligne, surface de l'union
    assert_eq!(result.findings.len(), 1);
    assert_eq!(result.findings[0].area, "1,0000");
    assert_eq!(result.findings[0].status, "100,00%");
}

#[tokio::test]
async fn test_percentage_bounds() {
    let fetcher = FakeFetcher::new()
        .respond("Parcial", collection(vec![esri_band("P", 500025.0)]))
        .respond("Total", collection(vec![esri_band("T", 500000.0)]));
    let sources = vec![
        source("Parcial", GeometryKind::Polygon),
        source("Total", GeometryKind::Polygon),
    ];

    let parcel = parcel();
    let mut run = OverlayRun::new(&fetcher, Arc::clone(&parcel), OverlayOptions::default());
    let result = run.execute(&sources).await;

    assert_eq!(result.findings.len(), 2);
    for finding in &result.findings {
        let percent = parse_percent(&finding.status);
        let area: f64 = finding.area.replace('.', "").replace(',', ".").parse().unwrap();
        assert!((0.0..=100.0).contains(&percent));
        assert!((percent - area / parcel.area_ha() * 100.0).abs() < 0.01);
    }
}

#[tokio::test]
async fn test_line_crossing() {
    let fetcher = FakeFetcher::new().respond(
        "Hidrografia",
        collection(vec![json!({
            "attributes": {"nome": "Córrego Prosa", "regime": "Perene"},
            "geometry": {"paths": [[[499950.0, 7700050.0], [500150.0, 7700050.0]]]}
        })]),
    );
    let sources = vec![source("Hidrografia", GeometryKind::Line)];

    let mut run = OverlayRun::new(&fetcher, parcel(), OverlayOptions::default());
    let result = run.execute(&sources).await;

    assert_eq!(result.findings.len(), 1);
    let finding = &result.findings[0];
    assert_eq!(finding.area, "Sim");
    assert_eq!(finding.status, "Cruzamento");
    assert_eq!(finding.extra["Regime"], "Perene");
    assert_eq!(result.layers[0].kind, GeometryKind::Line);
}

#[tokio::test]
async fn test_line_source_returning_polygons() {
    // 20 m × 100 m = 0,2 ha: une surface sous le seuil, mais un croisement
    let band = json!({
        "attributes": {"nome": "Faixa"},
        "geometry": {"rings": [[
            [500010.0, 7700000.0], [500010.0, 7700100.0], [500030.0, 7700100.0],
            [500030.0, 7700000.0], [500010.0, 7700000.0]
        ]]}
    });
    let fetcher = FakeFetcher::new().respond("Rios", collection(vec![band]));
    let sources = vec![source("Rios", GeometryKind::Line)];

    let mut run = OverlayRun::new(&fetcher, parcel(), OverlayOptions::default());
    let result = run.execute(&sources).await;

    assert_eq!(result.findings.len(), 1);
    assert_eq!(result.findings[0].area, "Sim");
    assert_eq!(result.findings[0].status, "Cruzamento");
    assert_eq!(result.layers[0].kind, GeometryKind::Line);
}

#[tokio::test]
async fn test_point_source_returning_polygons() {
    let fetcher = FakeFetcher::new().respond(
        "Focos",
        collection(vec![esri_band("Foco", 499950.0), esri_band("Foco", 500050.0)]),
    );
    let sources = vec![source("Focos", GeometryKind::Point)];

    let mut run = OverlayRun::new(&fetcher, parcel(), OverlayOptions::default());
    let result = run.execute(&sources).await;

    assert_eq!(result.findings.len(), 2);
    for finding in &result.findings {
        assert_eq!(finding.area, "Ponto no Imóvel");
        assert_eq!(finding.status, "Foco/Ponto");
    }
    assert!(result.layers.iter().all(|l| l.kind == GeometryKind::Point));
}

#[tokio::test]
async fn test_line_touching_parcel_boundary() {
    let paths = |name: &str, coords: Value| json!({"attributes": {"nome": name}, "geometry": {"paths": [coords]}});
    let fetcher = FakeFetcher::new().respond(
        "Hidrografia",
        collection(vec![
            paths("Divisa", json!([[500000.0, 7699900.0], [500000.0, 7700200.0]])),
            paths("Toque", json!([[499900.0, 7700050.0], [500000.0, 7700050.0]])),
            paths("Longe", json!([[499000.0, 7700050.0], [499500.0, 7700050.0]])),
        ]),
    );
    let sources = vec![source("Hidrografia", GeometryKind::Line)];

    let mut run = OverlayRun::new(&fetcher, parcel(), OverlayOptions::default());
    let result = run.execute(&sources).await;

    let mut names: Vec<&str> = result.findings.iter().map(|f| f.identity.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["Divisa", "Toque"]);
    assert!(result.findings.iter().all(|f| f.area == "Sim"));
}

#[tokio::test]
async fn test_geographic_parcel_and_wfs_source() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/imovel.geojson");
    let parcel = Arc::new(Parcel::from_geojson_file(&path, None).unwrap());
    assert_eq!(parcel.epsg(), 31981);

    let fetcher = FakeFetcher::new().respond(
        "MapBiomas Alerta",
        json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"alert_code": "1234567", "year": 2024},
                "geometry": {"type": "Polygon", "coordinates": [[
                    [-54.63, -20.48], [-54.61, -20.48], [-54.61, -20.46], [-54.63, -20.46], [-54.63, -20.48]
                ]]}
            }]
        }),
    );
    let mut alerts = source("MapBiomas Alerta", GeometryKind::Polygon);
    alerts.protocol = Protocol::Wfs;
    alerts.layer = Some("mapbiomas-alertas:alert_report".to_string());
    alerts.identity_columns = vec!["alert_code".to_string()];

    let mut run = OverlayRun::new(&fetcher, Arc::clone(&parcel), OverlayOptions::default());
    let result = run.execute(&[alerts]).await;

    assert_eq!(result.findings.len(), 1);
    let finding = &result.findings[0];
    assert_eq!(finding.identity, "1234567");
    assert_eq!(finding.status, "100,00%");
    assert_eq!(finding.extra["Ano"], "2024");
    assert_eq!(
        finding.extra["url_laudo"],
        "https://plataforma.alerta.mapbiomas.org/alerta/1234567"
    );

    // Couche en longitude/latitude
    let layer = &result.layers[0];
    match &layer.geometry {
        geo::Geometry::MultiPolygon(mp) => {
            let c = mp.0[0].exterior().0[0];
            assert!((c.x + 54.62).abs() < 0.01);
            assert!((c.y + 20.47).abs() < 0.01);
        }
        other => panic!("Expected multipolygon, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_registry() {
    let fetcher = FakeFetcher::new();
    let mut run = OverlayRun::new(&fetcher, parcel(), OverlayOptions::default());
    let result = run.execute(&[]).await;

    assert_eq!(run.state(), RunState::Done);
    assert!(result.findings.is_empty());
    assert_eq!(result.sources_total, 0);
}
