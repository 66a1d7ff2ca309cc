//! Sensor subscription control

/// Commands the session issues to the host's location/heading source.
///
/// Calls are made from the session task and must not block; results come
/// back later as `HostEvent`s.
pub trait SensorControl: Send + 'static {
    /// Ask for a single location fix
    fn request_location(&mut self);

    /// Start delivering heading samples
    fn start_heading(&mut self);

    /// Stop delivering heading samples
    fn stop_heading(&mut self);
}
