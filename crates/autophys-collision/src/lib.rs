use autophys_geom::Aabb;

/// Deterministic 1D SAP along X with full AABB overlap, NaN-safe and stable.
pub fn pairs_sap(aabbs: &[Aabb]) -> Vec<(usize, usize)> {
    #[derive(Copy, Clone)]
    struct Elem { min: f32, max: f32, idx: usize }

    // Build projections; skip invalid boxes deterministically
    let mut elems: Vec<Elem> = Vec::with_capacity(aabbs.len());
    for (i, a) in aabbs.iter().enumerate() {
        let mut mn = a.min.x;
        let mut mx = a.max.x;
        if !mn.is_finite() || !mx.is_finite() { continue; }
        if mn > mx { core::mem::swap(&mut mn, &mut mx); }
        elems.push(Elem { min: mn, max: mx, idx: i });
    }

    elems.sort_by(|a, b| a.min.total_cmp(&b.min).then(a.idx.cmp(&b.idx)));

    let mut active: Vec<usize> = Vec::new();
    let mut out: Vec<(usize, usize)> = Vec::new();

    for e in elems {
        active.retain(|&j| aabbs[j].max.x >= e.min);
        for &j in &active {
            let (i, k) = if j < e.idx { (j, e.idx) } else { (e.idx, j) };
            let aa = &aabbs[i]; let bb = &aabbs[k];
            if aa.overlaps(bb) { out.push((i, k)); }
        }
        active.push(e.idx);
    }

    out.sort_unstable();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use autophys_core::vec3;

    fn boxed(cx: f32, cy: f32, cz: f32, h: f32) -> Aabb {
        Aabb::from_center_half_extents(vec3(cx, cy, cz), vec3(h, h, h))
    }

    #[test] fn matches_brute_force() {
        let aabbs = vec![
            boxed(0.0, 0.0, 0.0, 1.0),
            boxed(1.5, 0.0, 0.0, 1.0),
            boxed(10.0, 0.0, 0.0, 1.0),
            boxed(1.5, 0.5, 0.0, 1.0),
            boxed(-0.5, 5.0, 0.0, 1.0), // overlaps in x only
        ];
        let mut brute = Vec::new();
        for i in 0..aabbs.len() {
            for j in (i + 1)..aabbs.len() {
                if aabbs[i].overlaps(&aabbs[j]) { brute.push((i, j)); }
            }
        }
        brute.sort_unstable();
        assert_eq!(pairs_sap(&aabbs), brute);
    }

    #[test] fn output_is_stable() {
        let aabbs = vec![boxed(0.0, 0.0, 0.0, 1.0), boxed(0.5, 0.0, 0.0, 1.0), boxed(1.0, 0.0, 0.0, 1.0)];
        assert_eq!(pairs_sap(&aabbs), pairs_sap(&aabbs));
    }

    #[test] fn non_finite_boxes_skipped() {
        let mut bad = boxed(0.0, 0.0, 0.0, 1.0);
        bad.min.x = f32::NAN;
        let aabbs = vec![bad, boxed(0.0, 0.0, 0.0, 1.0)];
        assert!(pairs_sap(&aabbs).is_empty());
    }
}
