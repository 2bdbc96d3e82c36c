pub mod site;

pub use site::{
    BriefingCfg, BuildCfg, IngestCfg, Paths, RelatedCfg, SiteConfig, SiteMeta,
    DEFAULT_NOISE_PATTERNS,
};
