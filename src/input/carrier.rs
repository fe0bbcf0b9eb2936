//! Code for reading carriers from a CSV file.
use super::*;
use crate::carrier::Carrier;
use std::path::Path;

const CARRIERS_FILE_NAME: &str = "carriers.csv";

/// Read carriers from a CSV file.
///
/// Validation and checking for duplicate IDs happens when the carriers are added to the network.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// The carriers, in the order they appear in the file, or an error
pub fn read_carriers(model_dir: &Path) -> Result<Vec<Carrier>> {
    let file_path = model_dir.join(CARRIERS_FILE_NAME);
    Ok(read_csv(&file_path)?.collect())
}
