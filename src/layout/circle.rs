//! Front-chain circle packing and minimal enclosing circles.
//!
//! Sibling circles are placed one at a time tangent to two circles on the
//! current front chain, choosing the pair closest to the origin. The enclosing
//! circle uses Welzl's move-to-front algorithm over a shuffled input; the
//! shuffle draws from a fixed-seed LCG so packings are reproducible.

const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub x: f64,
    pub y: f64,
    pub r: f64,
}

impl Circle {
    pub const fn new(x: f64, y: f64, r: f64) -> Self {
        Self { x, y, r }
    }
}

/// Linear congruential generator with a fixed seed.
#[derive(Debug, Clone)]
pub(crate) struct Lcg(u64);

impl Lcg {
    const A: u64 = 1_664_525;
    const C: u64 = 1_013_904_223;
    const M: u64 = 1 << 32;

    pub(crate) fn new() -> Self {
        Self(1)
    }

    /// Next value in `[0, 1)`.
    pub(crate) fn next_f64(&mut self) -> f64 {
        self.0 = (Self::A * self.0 + Self::C) % Self::M;
        self.0 as f64 / Self::M as f64
    }
}

/// Pack circles of the given radii into a `size` x `size` square.
///
/// Returns one circle per input radius, in input order, with centres in
/// `[0, size]` and radii scaled to fit. `padding` is the gap between
/// neighbouring circles in output units.
pub fn pack(radii: &[f64], size: f64, padding: f64) -> Vec<Circle> {
    if radii.is_empty() {
        return Vec::new();
    }

    let mut random = Lcg::new();
    let mut circles: Vec<Circle> = radii.iter().map(|&r| Circle::new(0.0, 0.0, r)).collect();

    // Pack once without padding to learn the scale, then again with the
    // padding expressed in unscaled units.
    let mut root_r = pack_siblings(&mut circles, &mut random);
    let k = root_r / size;
    let pad = padding * k;
    if pad > 0.0 {
        for c in &mut circles {
            c.r += pad;
        }
        let e = pack_siblings(&mut circles, &mut random);
        for c in &mut circles {
            c.r -= pad;
        }
        root_r = e + pad;
    }

    let half = size / 2.0;
    let scale = if root_r > 0.0 { half / root_r } else { 1.0 };
    for c in &mut circles {
        c.x = half + scale * c.x;
        c.y = half + scale * c.y;
        c.r *= scale;
    }
    circles
}

/// Place circles so none overlap, centred on their enclosing circle.
///
/// Only the radii are read; positions are overwritten. Returns the radius of
/// the enclosing circle.
pub(crate) fn pack_siblings(circles: &mut [Circle], random: &mut Lcg) -> f64 {
    let n = circles.len();
    if n == 0 {
        return 0.0;
    }

    circles[0].x = 0.0;
    circles[0].y = 0.0;
    if n == 1 {
        return circles[0].r;
    }

    circles[0].x = -circles[1].r;
    circles[1].x = circles[0].r;
    circles[1].y = 0.0;
    if n == 2 {
        return circles[0].r + circles[1].r;
    }

    circles[2] = place(circles[1], circles[0], circles[2]);

    // Front chain as a ring of indices
    let mut next = vec![0usize; n];
    let mut prev = vec![0usize; n];
    next[0] = 1;
    prev[1] = 0;
    next[1] = 2;
    prev[2] = 1;
    next[2] = 0;
    prev[0] = 2;

    let (mut a, mut b) = (0usize, 1usize);
    let mut i = 3;

    'pack: while i < n {
        let c = i;
        circles[c] = place(circles[a], circles[b], circles[c]);

        // Find the closest intersecting circle on the front chain, if any
        let mut j = next[b];
        let mut k = prev[a];
        let mut sj = circles[b].r;
        let mut sk = circles[a].r;
        loop {
            if sj <= sk {
                if intersects(circles[j], circles[c]) {
                    b = j;
                    next[a] = b;
                    prev[b] = a;
                    continue 'pack;
                }
                sj += circles[j].r;
                j = next[j];
            } else {
                if intersects(circles[k], circles[c]) {
                    a = k;
                    next[a] = b;
                    prev[b] = a;
                    continue 'pack;
                }
                sk += circles[k].r;
                k = prev[k];
            }
            if j == next[k] {
                break;
            }
        }

        // Insert c between a and b
        prev[c] = a;
        next[c] = b;
        next[a] = c;
        prev[b] = c;
        b = c;

        // Pick the new closest pair
        let mut best = score(circles, a, next[a]);
        let mut node = next[c];
        while node != b {
            let s = score(circles, node, next[node]);
            if s < best {
                a = node;
                best = s;
            }
            node = next[node];
        }
        b = next[a];
        i += 1;
    }

    // Centre everything on the enclosing circle of the front chain
    let mut chain = vec![circles[b]];
    let mut node = next[b];
    while node != b {
        chain.push(circles[node]);
        node = next[node];
    }

    let Some(e) = enclose(&chain, random) else {
        return 0.0;
    };
    for c in circles.iter_mut() {
        c.x -= e.x;
        c.y -= e.y;
    }
    e.r
}

/// Smallest circle enclosing all `circles`.
pub(crate) fn enclose(circles: &[Circle], random: &mut Lcg) -> Option<Circle> {
    let mut order = circles.to_vec();
    shuffle(&mut order, random);

    let n = order.len();
    let mut i = 0;
    let mut basis: Vec<Circle> = Vec::new();
    let mut e: Option<Circle> = None;

    while i < n {
        let p = order[i];
        if e.is_some_and(|e| encloses_weak(e, p)) {
            i += 1;
            continue;
        }
        match extend_basis(&basis, p) {
            Some(extended) => {
                basis = extended;
                e = enclose_basis(&basis);
                i = 0;
            }
            None => {
                log::warn!(
                    "enclosing circle did not converge over {} circles, using bounding circle",
                    n
                );
                return bounding_circle(circles);
            }
        }
    }
    e
}

fn shuffle(array: &mut [Circle], random: &mut Lcg) {
    let mut m = array.len();
    while m > 0 {
        let i = (random.next_f64() * m as f64) as usize;
        m -= 1;
        array.swap(m, i);
    }
}

fn extend_basis(basis: &[Circle], p: Circle) -> Option<Vec<Circle>> {
    if encloses_weak_all(p, basis) {
        return Some(vec![p]);
    }

    // A basis of two circles including p
    for &b in basis {
        if encloses_not(p, b) && encloses_weak_all(enclose_basis2(b, p), basis) {
            return Some(vec![b, p]);
        }
    }

    // A basis of three circles including p
    for (i, &bi) in basis.iter().enumerate() {
        for &bj in &basis[i + 1..] {
            if encloses_not(enclose_basis2(bi, bj), p)
                && encloses_not(enclose_basis2(bi, p), bj)
                && encloses_not(enclose_basis2(bj, p), bi)
                && enclose_basis3(bi, bj, p).is_some_and(|e| encloses_weak_all(e, basis))
            {
                return Some(vec![bi, bj, p]);
            }
        }
    }

    None
}

fn encloses_not(a: Circle, b: Circle) -> bool {
    let dr = a.r - b.r;
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dr < 0.0 || dr * dr < dx * dx + dy * dy
}

fn encloses_weak(a: Circle, b: Circle) -> bool {
    let dr = a.r - b.r + a.r.max(b.r).max(1.0) * EPSILON;
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dr > 0.0 && dr * dr > dx * dx + dy * dy
}

fn encloses_weak_all(a: Circle, basis: &[Circle]) -> bool {
    basis.iter().all(|&b| encloses_weak(a, b))
}

fn enclose_basis(basis: &[Circle]) -> Option<Circle> {
    match *basis {
        [a] => Some(a),
        [a, b] => Some(enclose_basis2(a, b)),
        [a, b, c] => enclose_basis3(a, b, c),
        _ => None,
    }
}

fn enclose_basis2(a: Circle, b: Circle) -> Circle {
    let x21 = b.x - a.x;
    let y21 = b.y - a.y;
    let r21 = b.r - a.r;
    let l = (x21 * x21 + y21 * y21).sqrt();
    if l == 0.0 {
        return if a.r >= b.r { a } else { b };
    }
    Circle::new(
        (a.x + b.x + x21 / l * r21) / 2.0,
        (a.y + b.y + y21 / l * r21) / 2.0,
        (l + a.r + b.r) / 2.0,
    )
}

fn enclose_basis3(a: Circle, b: Circle, c: Circle) -> Option<Circle> {
    let (x1, y1, r1) = (a.x, a.y, a.r);
    let (x2, y2, r2) = (b.x, b.y, b.r);
    let (x3, y3, r3) = (c.x, c.y, c.r);
    let a2 = x1 - x2;
    let a3 = x1 - x3;
    let b2 = y1 - y2;
    let b3 = y1 - y3;
    let c2 = r2 - r1;
    let c3 = r3 - r1;
    let d1 = x1 * x1 + y1 * y1 - r1 * r1;
    let d2 = d1 - x2 * x2 - y2 * y2 + r2 * r2;
    let d3 = d1 - x3 * x3 - y3 * y3 + r3 * r3;
    let ab = a3 * b2 - a2 * b3;
    if ab == 0.0 {
        return None;
    }
    let xa = (b2 * d3 - b3 * d2) / (ab * 2.0) - x1;
    let xb = (b3 * c2 - b2 * c3) / ab;
    let ya = (a3 * d2 - a2 * d3) / (ab * 2.0) - y1;
    let yb = (a2 * c3 - a3 * c2) / ab;
    let qa = xb * xb + yb * yb - 1.0;
    let qb = 2.0 * (r1 + xa * xb + ya * yb);
    let qc = xa * xa + ya * ya - r1 * r1;
    let r = -if qa.abs() > 1e-6 {
        (qb + (qb * qb - 4.0 * qa * qc).sqrt()) / (2.0 * qa)
    } else {
        qc / qb
    };
    if !r.is_finite() {
        return None;
    }
    Some(Circle::new(x1 + xa + xb * r, y1 + ya + yb * r, r))
}

fn bounding_circle(circles: &[Circle]) -> Option<Circle> {
    if circles.is_empty() {
        return None;
    }
    let n = circles.len() as f64;
    let cx = circles.iter().map(|c| c.x).sum::<f64>() / n;
    let cy = circles.iter().map(|c| c.y).sum::<f64>() / n;
    let r = circles
        .iter()
        .map(|c| ((c.x - cx).powi(2) + (c.y - cy).powi(2)).sqrt() + c.r)
        .fold(0.0, f64::max);
    Some(Circle::new(cx, cy, r))
}

/// Position `c` tangent to both `a` and `b`.
fn place(b: Circle, a: Circle, c: Circle) -> Circle {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let d2 = dx * dx + dy * dy;
    let mut out = c;

    if d2 > 0.0 {
        let a2 = (a.r + c.r).powi(2);
        let b2 = (b.r + c.r).powi(2);
        if a2 > b2 {
            let x = (d2 + b2 - a2) / (2.0 * d2);
            let y = (b2 / d2 - x * x).max(0.0).sqrt();
            out.x = b.x - x * dx - y * dy;
            out.y = b.y - x * dy + y * dx;
        } else {
            let x = (d2 + a2 - b2) / (2.0 * d2);
            let y = (a2 / d2 - x * x).max(0.0).sqrt();
            out.x = a.x + x * dx - y * dy;
            out.y = a.y + x * dy + y * dx;
        }
    } else {
        out.x = a.x + c.r;
        out.y = a.y;
    }
    out
}

fn intersects(a: Circle, b: Circle) -> bool {
    let dr = a.r + b.r - 1e-6;
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dr > 0.0 && dr * dr > dx * dx + dy * dy
}

/// Squared distance from the origin to the weighted midpoint of `a` and `b`.
fn score(circles: &[Circle], a: usize, b: usize) -> f64 {
    let (a, b) = (circles[a], circles[b]);
    let ab = a.r + b.r;
    if ab == 0.0 {
        return f64::INFINITY;
    }
    let dx = (a.x * b.r + b.x * a.r) / ab;
    let dy = (a.y * b.r + b.y * a.r) / ab;
    dx * dx + dy * dy
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlaps(a: Circle, b: Circle) -> bool {
        let d = ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt();
        d < a.r + b.r - 1e-6
    }

    #[test]
    fn test_lcg_sequence_is_fixed() {
        let mut a = Lcg::new();
        let mut b = Lcg::new();
        let first = a.next_f64();
        assert_eq!(first, (1_664_525.0 + 1_013_904_223.0) / 4_294_967_296.0);
        assert_eq!(first, b.next_f64());
        for _ in 0..100 {
            let v = a.next_f64();
            assert!((0.0..1.0).contains(&v));
            assert_eq!(v, b.next_f64());
        }
    }

    #[test]
    fn test_single_circle_fills_square() {
        let out = pack(&[3.0], 12.0, 0.0);
        assert_eq!(out, vec![Circle::new(6.0, 6.0, 6.0)]);
    }

    #[test]
    fn test_two_circles_are_tangent() {
        let out = pack(&[2.0, 2.0], 10.0, 0.0);
        let d = ((out[0].x - out[1].x).powi(2) + (out[0].y - out[1].y).powi(2)).sqrt();
        assert!((d - (out[0].r + out[1].r)).abs() < 1e-9);
        assert!((out[0].r - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_packing_has_no_overlaps_and_fits() {
        let radii: Vec<f64> = (1..=30).map(|i| (i as f64).sqrt()).rev().collect();
        let size = 72.0;
        let out = pack(&radii, size, 3.0);
        assert_eq!(out.len(), radii.len());

        for (i, a) in out.iter().enumerate() {
            assert!(a.x - a.r >= -1e-6 && a.x + a.r <= size + 1e-6);
            assert!(a.y - a.r >= -1e-6 && a.y + a.r <= size + 1e-6);
            for b in &out[i + 1..] {
                assert!(!overlaps(*a, *b), "{a:?} overlaps {b:?}");
            }
        }

        // Radius order is preserved through scaling
        for w in out.windows(2) {
            assert!(w[0].r >= w[1].r - 1e-9);
        }
    }

    #[test]
    fn test_packing_is_reproducible() {
        let radii: Vec<f64> = (0..50).map(|i| 1.0 + (i % 7) as f64).collect();
        assert_eq!(pack(&radii, 100.0, 3.0), pack(&radii, 100.0, 3.0));
    }

    #[test]
    fn test_enclose_contains_all() {
        let circles = vec![
            Circle::new(0.0, 0.0, 1.0),
            Circle::new(5.0, 0.0, 2.0),
            Circle::new(2.0, 4.0, 1.5),
            Circle::new(1.0, 1.0, 0.5),
        ];
        let e = enclose(&circles, &mut Lcg::new()).unwrap();
        for c in &circles {
            let d = ((c.x - e.x).powi(2) + (c.y - e.y).powi(2)).sqrt();
            assert!(d + c.r <= e.r + 1e-6);
        }
    }
}
