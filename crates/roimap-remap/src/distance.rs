//! Exact squared Euclidean distance transforms on pixel grids.
//!
//! Two 1D lower-envelope passes (columns, then rows) in the manner of
//! Felzenszwalb and Huttenlocher. Distances are in pixel units.

/// Stand-in for "no feature yet"; keeps the envelope arithmetic finite.
const FAR: f64 = 1.0e20;

/// Squared distance from every sample to the nearest zero-cost sample of
/// `f`, with `f` giving the squared distance already accumulated on the
/// other axis.
fn transform_1d(f: &[f64], d: &mut [f64], v: &mut [usize], z: &mut [f64]) {
    let n = f.len();
    if n == 0 {
        return;
    }
    let parabola = |q: usize| f[q] + (q * q) as f64;

    let mut k = 0usize;
    v[0] = 0;
    z[0] = f64::NEG_INFINITY;
    z[1] = f64::INFINITY;
    for q in 1..n {
        let mut s = (parabola(q) - parabola(v[k])) / (2.0 * (q - v[k]) as f64);
        while s <= z[k] {
            k -= 1;
            s = (parabola(q) - parabola(v[k])) / (2.0 * (q - v[k]) as f64);
        }
        k += 1;
        v[k] = q;
        z[k] = s;
        z[k + 1] = f64::INFINITY;
    }

    k = 0;
    for (q, out) in d.iter_mut().enumerate().take(n) {
        while z[k + 1] < q as f64 {
            k += 1;
        }
        let dq = q as f64 - v[k] as f64;
        *out = dq * dq + f[v[k]];
    }
}

/// Squared distance from every pixel to the nearest pixel where `feature`
/// is true. Row-major, `width * height` values; infinite when there are no
/// features at all.
pub fn squared_distance_transform(feature: &[bool], width: usize, height: usize) -> Vec<f64> {
    debug_assert_eq!(feature.len(), width * height);
    let mut grid: Vec<f64> = feature.iter().map(|&f| if f { 0.0 } else { FAR }).collect();

    let longest = width.max(height);
    let mut f = vec![0.0; longest];
    let mut d = vec![0.0; longest];
    let mut v = vec![0usize; longest];
    let mut z = vec![0.0; longest + 1];

    // Columns
    for x in 0..width {
        for y in 0..height {
            f[y] = grid[y * width + x];
        }
        transform_1d(&f[..height], &mut d[..height], &mut v, &mut z);
        for y in 0..height {
            grid[y * width + x] = d[y];
        }
    }

    // Rows
    for y in 0..height {
        let row = &mut grid[y * width..(y + 1) * width];
        f[..width].copy_from_slice(row);
        transform_1d(&f[..width], &mut d[..width], &mut v, &mut z);
        row.copy_from_slice(&d[..width]);
    }

    for value in grid.iter_mut() {
        if *value >= FAR / 2.0 {
            *value = f64::INFINITY;
        }
    }
    grid
}

/// Squared signed distance map of a binary region, outside positive.
///
/// Outside pixels hold the squared distance to the nearest region pixel.
/// Region pixels hold minus the squared distance to the nearest pixel
/// outside the region, so they are always negative (`-inf` when the region
/// covers the whole raster).
pub fn signed_squared_distance(region: &[bool], width: usize, height: usize) -> Vec<f64> {
    let outside: Vec<bool> = region.iter().map(|&r| !r).collect();
    let to_region = squared_distance_transform(region, width, height);
    let to_outside = squared_distance_transform(&outside, width, height);
    region
        .iter()
        .zip(to_region.into_iter().zip(to_outside))
        .map(|(&inside, (dr, dout))| if inside { -dout } else { dr })
        .collect()
}
