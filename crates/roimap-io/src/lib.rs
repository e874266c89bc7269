//! File formats consumed by the remapper: NIfTI rasters and displacement
//! fields, rigid matrix text files and ROI JSON records.

pub mod nifti_io;
pub mod matrix_io;
pub mod roi_io;

pub use nifti_io::{
    read_displacement_field, read_image_geometry, read_label_image, write_displacement_field,
    write_label_image,
};
pub use matrix_io::{read_rigid_matrix, write_rigid_matrix};
pub use roi_io::{read_roi_records, write_roi_records};
