/// Environment-side collaborator the agent polls once per round.
///
/// How tokens are perceived is not the agent's concern; it only counts the
/// fresh sightings reported here.
pub trait Sensor: Send {
    /// Advances the body one step and reports whether a token not seen
    /// before was sighted.
    fn sense_tokens(&mut self) -> bool;

    fn position(&self) -> (f64, f64);

    /// Left, front and right proximity in `[0, 1]`; 1 means touching.
    fn proximity_readings(&self) -> [f64; 3];

    /// Remaining charge in `[0, 1]`.
    fn battery_level(&self) -> f64;
}
