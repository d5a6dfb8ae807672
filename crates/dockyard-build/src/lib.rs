//! Image variant planning for dockyard.
//!
//! # Publish plan
//!
//! ```text
//! dockyard publish 5.1.0
//!   debian ── Dockerfile         ── naskio/strapi:5.1.0         (+ latest)
//!   alpine ── Dockerfile.alpine  ── naskio/strapi:5.1.0-alpine  (+ latest-alpine)
//! ```
//!
//! Every plan carries `STRAPI_VERSION` (the release version, verbatim) and
//! `NODE_VERSION` build args. The versioned tag is the primary reference
//! pushed by `docker buildx build --push`; `latest` tags are aliases created
//! with `docker buildx imagetools create`.

pub mod plan;
pub mod variant;

pub use plan::{
    ImagePlan, NODE_VERSION_ARG, PlanError, STRAPI_VERSION_ARG, image_name, plan_release,
};
pub use variant::Variant;
