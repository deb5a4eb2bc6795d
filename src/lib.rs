#![forbid(unsafe_code)]

pub mod api;
pub mod client;
pub mod composite;
pub mod config;
pub mod error;
pub mod model;
pub mod normalize;
pub mod session;

pub use api::{GenerateRequest, GeneratedImage, PayloadKind, PricingPack, PrintPrice, SalesSettings};
pub use client::ApiClient;
pub use composite::{CompositeResult, OverlayFont, composite, subtitle_line};
pub use config::PipelineConfig;
pub use error::{PortraitError, PortraitResult};
pub use model::{CreditState, PlayerMetadata, Sport};
pub use normalize::{NormalizeOptions, NormalizedImage, data_uri_len, normalize, target_dimensions};
pub use session::{GateDecision, Session};
