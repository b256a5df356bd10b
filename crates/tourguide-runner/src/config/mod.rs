pub mod params;
pub mod schema;

pub use params::{ParamDef, Params};
pub use schema::{BrowserConfig, OnFailure, TargetUrl, TourConfig, Viewport};
