/// The error type that crosses the `ControlSurface` seam. The controller never inspects these
/// beyond logging them and folding them into a unit status, so implementations box whatever
/// concrete type fits their transport.
pub type Error = Box<dyn std::error::Error + Send + Sync>;
