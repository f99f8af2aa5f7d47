/// Knobs for tracing initialization, filled from the loaded settings.
pub struct TracingConfig {
    pub environment: String,
    pub json_format: bool,
}
