/// Camera frames and sensor orientation
pub mod frame;
/// Binarized image matrix
pub mod matrix;
/// 2-D points
pub mod point;
/// Rectangles in frame coordinates
pub mod region;
/// Decode results and symbologies
pub mod result;

pub use frame::{Frame, Rotation};
pub use matrix::BitMatrix;
pub use point::Point;
pub use region::Region;
pub use result::{DecodeResult, Symbology};
