//! Fermeture des rings et organisation en polygones avec trous

use geo::{Contains, Coord, LineString, Point, Polygon};

/// Ferme un ring si nécessaire. Retourne `None` s'il a moins de 3 sommets distincts.
pub fn close_ring(mut coords: Vec<Coord>) -> Option<LineString> {
    coords.dedup_by(|a, b| coords_equal(*a, *b));

    let first = *coords.first()?;
    let last = *coords.last()?;
    if !coords_equal(first, last) {
        coords.push(first);
    }

    // 3 sommets distincts + fermeture
    if coords.len() < 4 {
        return None;
    }

    Some(LineString::new(coords))
}

/// Organise les rings en polygones avec trous.
///
/// Un ring dont le premier sommet est contenu dans un autre ring devient un
/// trou de ce dernier; les rings restants sont des extérieurs.
pub fn organize_rings(rings: Vec<LineString>) -> Vec<Polygon> {
    if rings.len() <= 1 {
        return rings
            .into_iter()
            .map(|r| Polygon::new(r, vec![]))
            .collect();
    }

    let shells: Vec<Polygon> = rings
        .iter()
        .map(|r| Polygon::new(r.clone(), vec![]))
        .collect();

    // Parent direct: le plus petit ring contenant le premier sommet
    let mut parent: Vec<Option<usize>> = vec![None; rings.len()];
    for i in 0..rings.len() {
        let Some(first) = rings[i].0.first() else {
            continue;
        };
        let point = Point::new(first.x, first.y);

        let mut best: Option<(usize, f64)> = None;
        for (j, shell) in shells.iter().enumerate() {
            if i == j || !shell.contains(&point) {
                continue;
            }
            let area = geo::Area::unsigned_area(shell);
            if best.map_or(true, |(_, a)| area < a) {
                best = Some((j, area));
            }
        }
        parent[i] = best.map(|(j, _)| j);
    }

    // Profondeur paire = extérieur, impaire = trou (îles dans les trous)
    let depth = |mut i: usize| {
        let mut d = 0usize;
        while let Some(p) = parent[i] {
            d += 1;
            i = p;
            if d > rings.len() {
                break;
            }
        }
        d
    };

    let depths: Vec<usize> = (0..rings.len()).map(depth).collect();
    let mut holes: std::collections::HashMap<usize, Vec<LineString>> =
        std::collections::HashMap::new();
    for (i, d) in depths.iter().enumerate() {
        if d % 2 == 1 {
            if let Some(p) = parent[i] {
                holes.entry(p).or_default().push(rings[i].clone());
            }
        }
    }

    rings
        .iter()
        .enumerate()
        .filter(|(i, _)| depths[*i] % 2 == 0)
        .map(|(i, ring)| Polygon::new(ring.clone(), holes.remove(&i).unwrap_or_default()))
        .collect()
}

/// Compare deux coordonnées avec tolérance
fn coords_equal(a: Coord, b: Coord) -> bool {
    const TOLERANCE: f64 = 1e-9;
    (a.x - b.x).abs() < TOLERANCE && (a.y - b.y).abs() < TOLERANCE
}
