/// Conversion of points from one coordinate system into another.
///
/// Both directions return `None` if the input point is outside of the domain of the projection.
pub trait Projection {
    /// Type of the input point.
    type InPoint;
    /// Type of the output point.
    type OutPoint;

    /// Converts an input point into the output coordinate system.
    fn project(&self, input: &Self::InPoint) -> Option<Self::OutPoint>;
    /// Converts an output point back into the input coordinate system.
    fn unproject(&self, input: &Self::OutPoint) -> Option<Self::InPoint>;
}
