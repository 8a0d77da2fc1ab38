pub mod agnostic;
pub mod guidance;
pub mod label_io;
pub mod labels;
pub mod mask;
pub mod morphology;
pub mod surface;
