//! Optimization result persistence port trait.

use crate::domain::error::TrendscopeError;
use crate::domain::optimizer::OptimizationResult;
use std::path::Path;

pub trait ResultPort {
    fn write(&self, result: &OptimizationResult, output_path: &Path) -> Result<(), TrendscopeError>;
}
