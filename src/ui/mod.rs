pub mod panels;
pub mod plot;
pub mod tables;
pub mod tabs;

/// `-` for an undefined value, otherwise fixed precision.
pub fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.precision$}"))
}
