/// Route listing served at `/`. Plain text keeps the `<start>`/`<end>` placeholders visible.
pub const WELCOME: &str = "Welcome to the Hawaii Climate App!
Available Routes:
/api/v1.0/precipitation
/api/v1.0/stations
/api/v1.0/tobs
/api/v1.0/<start>
/api/v1.0/<start>/<end>
";

/// Handler for the route listing (GET /)
pub async fn welcome() -> &'static str {
    WELCOME
}
