//! NIfTI reading and writing for 2D rasters.
//!
//! NIfTI stores world coordinates in RAS. Everything in roimap is LPS, so the
//! first two rows of the header affine are negated on read and on write, and
//! so are the x/y components of displacement vectors.

use anyhow::{anyhow, bail, Context, Result};
use burn::tensor::backend::Backend;
use burn::tensor::{Shape, Tensor, TensorData};
use nalgebra::{Matrix2, Vector2 as NaVector2};
use ndarray::{ArrayD, IxDyn};
use nifti::writer::WriterOptions;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
use roimap_core::image::{ImageMetadata, LabelImage, BACKGROUND};
use roimap_core::spatial::{Direction, Point, Spacing};
use roimap_core::transform::DisplacementField2D;
use std::path::Path;
use tracing::debug;

/// `intent_code` for displacement vector fields.
const NIFTI_INTENT_DISPVECT: i16 = 1006;

/// Rows of the header's voxel-to-world affine (RAS), `[3][4]`.
fn header_affine(header: &NiftiHeader) -> [[f64; 4]; 3] {
    if header.sform_code > 0 {
        [header.srow_x, header.srow_y, header.srow_z].map(|row| row.map(f64::from))
    } else if header.qform_code > 0 {
        let b = header.quatern_b as f64;
        let c = header.quatern_c as f64;
        let d = header.quatern_d as f64;
        let a = (1.0 - (b * b + c * c + d * d).min(1.0)).sqrt();

        let qfac = if header.pixdim[0] == 0.0 { 1.0 } else { header.pixdim[0] as f64 };

        let r11 = a * a + b * b - c * c - d * d;
        let r12 = 2.0 * b * c - 2.0 * a * d;
        let r13 = 2.0 * b * d + 2.0 * a * c;
        let r21 = 2.0 * b * c + 2.0 * a * d;
        let r22 = a * a + c * c - b * b - d * d;
        let r23 = 2.0 * c * d - 2.0 * a * b;
        let r31 = 2.0 * b * d - 2.0 * a * c;
        let r32 = 2.0 * c * d + 2.0 * a * b;
        let r33 = a * a + d * d - c * c - b * b;

        let dx = header.pixdim[1] as f64;
        let dy = header.pixdim[2] as f64;
        let dz = header.pixdim[3] as f64 * qfac;

        [
            [r11 * dx, r12 * dy, r13 * dz, header.quatern_x as f64],
            [r21 * dx, r22 * dy, r23 * dz, header.quatern_y as f64],
            [r31 * dx, r32 * dy, r33 * dz, header.quatern_z as f64],
        ]
    } else {
        // Fallback: use pixdim scaling only
        let dx = header.pixdim[1] as f64;
        let dy = header.pixdim[2] as f64;
        let dz = header.pixdim[3] as f64;
        [
            [dx, 0.0, 0.0, 0.0],
            [0.0, dy, 0.0, 0.0],
            [0.0, 0.0, dz, 0.0],
        ]
    }
}

/// In-plane LPS geometry of a NIfTI header.
pub fn metadata_from_header(header: &NiftiHeader) -> Result<ImageMetadata<2>> {
    let ndim = header.dim[0] as usize;
    if !(1..=7).contains(&ndim) {
        bail!("Invalid NIfTI dimension count {}", ndim);
    }
    let width = header.dim[1] as usize;
    let height = if ndim >= 2 { header.dim[2] as usize } else { 1 };

    let affine = header_affine(header);
    // RAS -> LPS: negate the x and y rows
    let linear = Matrix2::new(
        -affine[0][0], -affine[0][1],
        -affine[1][0], -affine[1][1],
    );
    let origin = Point::new([-affine[0][3], -affine[1][3]]);

    let col0 = linear.column(0).into_owned();
    let col1 = linear.column(1).into_owned();
    let sp0 = col0.norm();
    let sp1 = col1.norm();
    let d0 = if sp0 > 1e-9 { col0 / sp0 } else { -NaVector2::x() };
    let d1 = if sp1 > 1e-9 { col1 / sp1 } else { -NaVector2::y() };
    let spacing = Spacing::new([
        if sp0 > 1e-9 { sp0 } else { 1.0 },
        if sp1 > 1e-9 { sp1 } else { 1.0 },
    ]);
    let direction = Direction(Matrix2::from_columns(&[d0, d1]));

    ImageMetadata::new([width, height], origin, spacing, direction)
        .map_err(|e| anyhow!("Invalid NIfTI geometry: {}", e))
}

/// Header carrying `metadata` as an RAS sform.
pub fn header_for_metadata(metadata: &ImageMetadata<2>) -> NiftiHeader {
    let spacing = metadata.spacing();
    let direction = metadata.direction();
    let origin = metadata.origin();

    let mut header = NiftiHeader::default();
    header.sform_code = 1;
    header.qform_code = 0;
    header.pixdim[0] = 1.0;
    header.pixdim[1] = spacing[0] as f32;
    header.pixdim[2] = spacing[1] as f32;
    header.pixdim[3] = 1.0;
    header.srow_x = [
        -(direction[(0, 0)] * spacing[0]) as f32,
        -(direction[(0, 1)] * spacing[1]) as f32,
        0.0,
        -origin[0] as f32,
    ];
    header.srow_y = [
        -(direction[(1, 0)] * spacing[0]) as f32,
        -(direction[(1, 1)] * spacing[1]) as f32,
        0.0,
        -origin[1] as f32,
    ];
    header.srow_z = [0.0, 0.0, 1.0, 0.0];
    header
}

/// Read only the geometry of a NIfTI image.
pub fn read_image_geometry<P: AsRef<Path>>(path: P) -> Result<ImageMetadata<2>> {
    let path = path.as_ref();
    let header = NiftiHeader::from_file(path)
        .with_context(|| format!("Failed to read NIfTI header {}", path.display()))?;
    metadata_from_header(&header)
}

fn read_volume(path: &Path) -> Result<(NiftiHeader, ArrayD<f32>)> {
    let obj = ReaderOptions::new()
        .read_file(path)
        .with_context(|| format!("Failed to read NIfTI file {}", path.display()))?;
    let header = obj.header().clone();
    let array = obj
        .into_volume()
        .into_ndarray::<f32>()
        .context("Failed to convert volume to ndarray")?;
    Ok((header, array))
}

/// Read a 2D integer label raster.
///
/// Trailing axes of length one are accepted, so `x, y, 1` volumes written by
/// 2D pipelines load as well. Values are rounded; non-positive values are
/// background.
pub fn read_label_image<P: AsRef<Path>>(path: P) -> Result<LabelImage> {
    let path = path.as_ref();
    let (header, array) = read_volume(path)?;
    let shape = array.shape().to_vec();
    if shape.len() < 2 || shape[2..].iter().any(|&s| s != 1) {
        bail!("Expected a 2D label image, found shape {:?}", shape);
    }
    let (width, height) = (shape[0], shape[1]);
    let metadata = metadata_from_header(&header)?.with_size([width, height])
        .map_err(|e| anyhow!("Invalid label image geometry: {}", e))?;

    let mut index = vec![0usize; shape.len()];
    let mut labels = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            index[0] = x;
            index[1] = y;
            let v = array[IxDyn(&index)];
            labels.push(if v.is_finite() && v > 0.0 { v.round() as u32 } else { BACKGROUND });
        }
    }
    debug!(path = %path.display(), width, height, "read label image");
    LabelImage::new(labels, metadata).map_err(|e| anyhow!("{}", e))
}

/// Write a label raster as a 2D NIfTI volume.
pub fn write_label_image<P: AsRef<Path>>(path: P, image: &LabelImage) -> Result<()> {
    let path = path.as_ref();
    let (width, height) = (image.width(), image.height());
    let mut array = ArrayD::<f32>::zeros(IxDyn(&[width, height]));
    for y in 0..height {
        for x in 0..width {
            array[IxDyn(&[x, y])] = image.labels()[y * width + x] as f32;
        }
    }
    let header = header_for_metadata(image.metadata());
    WriterOptions::new(path)
        .reference_header(&header)
        .write_nifti(&array)
        .with_context(|| format!("Failed to write NIfTI file {}", path.display()))?;
    Ok(())
}

/// Read a 2D displacement field.
///
/// The volume must hold two vector components on its last axis, with any
/// axes between the in-plane ones and the components of length one
/// (`x, y, 2`, `x, y, 1, 2` or `x, y, 1, 1, 2`).
pub fn read_displacement_field<B: Backend, P: AsRef<Path>>(
    path: P,
    device: &B::Device,
) -> Result<DisplacementField2D<B>> {
    let path = path.as_ref();
    let (header, array) = read_volume(path)?;
    let shape = array.shape().to_vec();
    let n = shape.len();
    if n < 3 || shape[n - 1] != 2 || shape[2..n - 1].iter().any(|&s| s != 1) {
        bail!("Expected a 2D displacement field with 2 components, found shape {:?}", shape);
    }
    let (width, height) = (shape[0], shape[1]);
    let metadata = metadata_from_header(&header)?.with_size([width, height])
        .map_err(|e| anyhow!("Invalid displacement field geometry: {}", e))?;

    // [2, H, W], RAS -> LPS on both components
    let mut values = Vec::with_capacity(2 * width * height);
    let mut index = vec![0usize; n];
    for c in 0..2 {
        index[n - 1] = c;
        for y in 0..height {
            for x in 0..width {
                index[0] = x;
                index[1] = y;
                values.push(-array[IxDyn(&index)]);
            }
        }
    }
    let tensor = Tensor::<B, 3>::from_data(
        TensorData::new(values, Shape::new([2, height, width])),
        device,
    );
    debug!(path = %path.display(), width, height, "read displacement field");
    DisplacementField2D::new(tensor, metadata).map_err(|e| anyhow!("{}", e))
}

/// Write a displacement field as an `x, y, 1, 1, 2` vector volume.
pub fn write_displacement_field<B: Backend, P: AsRef<Path>>(
    path: P,
    field: &DisplacementField2D<B>,
) -> Result<()> {
    let path = path.as_ref();
    let [width, height] = field.metadata().size();
    let data = field.displacement().to_data().convert::<f32>();
    let values = data
        .as_slice::<f32>()
        .map_err(|e| anyhow!("Failed to get tensor data: {:?}", e))?;

    let mut array = ArrayD::<f32>::zeros(IxDyn(&[width, height, 1, 1, 2]));
    for c in 0..2 {
        for y in 0..height {
            for x in 0..width {
                array[IxDyn(&[x, y, 0, 0, c])] = -values[(c * height + y) * width + x];
            }
        }
    }
    let mut header = header_for_metadata(field.metadata());
    header.intent_code = NIFTI_INTENT_DISPVECT;
    WriterOptions::new(path)
        .reference_header(&header)
        .write_nifti(&array)
        .with_context(|| format!("Failed to write NIfTI file {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use roimap_core::transform::Transform;
    use tempfile::tempdir;

    type TestBackend = NdArray<f32>;

    fn lps_metadata(size: [usize; 2]) -> ImageMetadata<2> {
        ImageMetadata::new(
            size,
            Point::new([12.5, -4.0]),
            Spacing::new([0.5, 0.25]),
            Direction::from_row_major([[-1.0, 0.0], [0.0, -1.0]]),
        )
        .unwrap()
    }

    #[test]
    fn test_sform_is_converted_to_lps() {
        let mut header = NiftiHeader::default();
        header.dim = [2, 4, 3, 1, 1, 1, 1, 1];
        header.sform_code = 1;
        header.srow_x = [0.5, 0.0, 0.0, 10.0];
        header.srow_y = [0.0, 2.0, 0.0, -3.0];
        header.srow_z = [0.0, 0.0, 1.0, 0.0];

        let metadata = metadata_from_header(&header).unwrap();
        assert_eq!(metadata.size(), [4, 3]);
        assert_eq!(metadata.origin().to_array(), [-10.0, 3.0]);
        assert_eq!(metadata.spacing().to_vec(), vec![0.5, 2.0]);
        assert_eq!(metadata.direction()[(0, 0)], -1.0);
        assert_eq!(metadata.direction()[(1, 1)], -1.0);
    }

    #[test]
    fn test_header_round_trip() {
        let metadata = lps_metadata([7, 5]);
        let mut header = header_for_metadata(&metadata);
        header.dim = [2, 7, 5, 1, 1, 1, 1, 1];
        let back = metadata_from_header(&header).unwrap();
        assert_eq!(back.size(), [7, 5]);
        for i in 0..2 {
            assert!((back.origin()[i] - metadata.origin()[i]).abs() < 1e-6);
            assert!((back.spacing()[i] - metadata.spacing()[i]).abs() < 1e-6);
        }
        assert!((back.direction()[(0, 0)] + 1.0).abs() < 1e-6);
        assert!((back.direction()[(1, 1)] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_label_image_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("mask.nii");

        let rows = vec![vec![0, 1, 1, 2], vec![0, 1, 2, 2], vec![3, 3, 0, 0]];
        let plain = LabelImage::from_rows(&rows).map_err(|e| anyhow!("{}", e))?;
        let image = LabelImage::new(plain.labels().to_vec(), lps_metadata([4, 3]))
            .map_err(|e| anyhow!("{}", e))?;

        write_label_image(&path, &image)?;
        let back = read_label_image(&path)?;

        assert_eq!(back.width(), 4);
        assert_eq!(back.height(), 3);
        assert_eq!(back.labels(), image.labels());
        assert_eq!(back.get(3, 0), Some(2));
        assert_eq!(back.get(0, 2), Some(3));
        assert!((back.metadata().origin()[0] - 12.5).abs() < 1e-6);

        let geometry = read_image_geometry(&path)?;
        assert_eq!(geometry.size(), [4, 3]);
        Ok(())
    }

    #[test]
    fn test_displacement_field_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("warp.nii");
        let device = Default::default();

        let metadata = lps_metadata([3, 2]);
        // x component = 1..6, y component = -(1..6)
        let mut values: Vec<f32> = (1..=6).map(|v| v as f32).collect();
        values.extend((1..=6).map(|v| -(v as f32)));
        let tensor = Tensor::<TestBackend, 3>::from_data(
            TensorData::new(values.clone(), Shape::new([2, 2, 3])),
            &device,
        );
        let field = DisplacementField2D::new(tensor, metadata).map_err(|e| anyhow!("{}", e))?;

        write_displacement_field(&path, &field)?;
        let back = read_displacement_field::<TestBackend, _>(&path, &device)?;

        assert_eq!(back.metadata().size(), [3, 2]);
        let data = back.displacement().to_data();
        assert_eq!(data.as_slice::<f32>().unwrap(), values.as_slice());
        Ok(())
    }

    #[test]
    fn test_displacement_vectors_are_flipped_to_lps() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("ras_warp.nii");
        let device = Default::default();

        // RAS file: every vector is (+1, +2)
        let mut array = ArrayD::<f32>::zeros(IxDyn(&[2, 2, 1, 1, 2]));
        for x in 0..2 {
            for y in 0..2 {
                array[IxDyn(&[x, y, 0, 0, 0])] = 1.0;
                array[IxDyn(&[x, y, 0, 0, 1])] = 2.0;
            }
        }
        let mut header = NiftiHeader::default();
        header.sform_code = 1;
        header.srow_x = [1.0, 0.0, 0.0, 0.0];
        header.srow_y = [0.0, 1.0, 0.0, 0.0];
        header.srow_z = [0.0, 0.0, 1.0, 0.0];
        header.intent_code = NIFTI_INTENT_DISPVECT;
        WriterOptions::new(&path).reference_header(&header).write_nifti(&array)?;

        let field = read_displacement_field::<TestBackend, _>(&path, &device)?;
        let warped = field
            .transform_points(Tensor::<TestBackend, 2>::from_floats([[-0.5, -0.5]], &device))
            .into_data();
        let slice = warped.as_slice::<f32>().unwrap();
        assert!((slice[0] + 1.5).abs() < 1e-6);
        assert!((slice[1] + 2.5).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_rejects_multi_slice_masks() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("stack.nii");
        let array = ArrayD::<f32>::zeros(IxDyn(&[4, 4, 2]));
        WriterOptions::new(&path).write_nifti(&array)?;
        assert!(read_label_image(&path).is_err());
        Ok(())
    }
}
