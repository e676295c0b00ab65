#![deny(warnings)]
pub mod belief;
pub mod game;
pub mod model;
pub mod probability;

pub struct AppInfo;

impl AppInfo {
    pub const fn name() -> &'static str {
        "swindlestones"
    }

    pub const fn codename() -> &'static str {
        "Liar's Table"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::AppInfo;

    #[test]
    fn exposes_static_metadata() {
        assert_eq!(AppInfo::name(), "swindlestones");
        assert_eq!(AppInfo::codename(), "Liar's Table");
        assert!(!AppInfo::version().is_empty());
    }
}
